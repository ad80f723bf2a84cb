pub mod acquisition;
pub mod config;
pub mod decoder;
pub mod models;
pub mod sinks;
pub mod store;
pub mod transport;

mod dashboard;
mod renderer;

use crate::acquisition::{shutdown_channel, Acquisition};
use crate::config::AppConfig;
use crate::decoder::LineDecoder;
use crate::sinks::{ChartImage, CsvLog, Presenters, TableView};
use crate::transport::SerialLineSource;
use anyhow::Context;
use log::{error, info, warn};
use std::sync::Arc;

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    info!("Starting application");

    match main_loop(config).await {
        Ok(_) => info!("Application completed successfully"),
        Err(e) => {
            error!("Application error: {e:#}");
            // Print chain of error causes
            let mut source = e.source();
            while let Some(e) = source {
                error!("Caused by: {e}");
                source = e.source();
            }
            return Err(e).context("Application failed to run");
        }
    }

    Ok(())
}

async fn main_loop(config: AppConfig) -> anyhow::Result<()> {
    let sensors = Arc::new(config.sensor_table()?);
    let names: Vec<&str> = sensors.names().collect();
    info!("Tracking {} sensors: {}", sensors.len(), names.join(", "));

    let decoder = LineDecoder::with_min_fields(sensors.clone(), config.acquisition.min_sensor_fields);

    let log = CsvLog::create(&config.storage.file, &sensors)
        .context(format!("Failed to create log file {}", config.storage.file))?;

    let mut source = SerialLineSource::new(&config.serial);
    if let Err(e) = source.connect() {
        warn!("{}; retrying on every tick", e);
    }

    let mut presenters = Presenters::new();
    if config.table.enabled {
        presenters.push(TableView::stdout(config.table.header_every));
    }
    if config.chart.enabled {
        presenters.push(ChartImage::new(&config.chart));
        info!("Rendering chart to {}", config.chart.file);
    }

    let mut acquisition = Acquisition::new(
        decoder,
        source,
        log,
        presenters,
        config.acquisition.poll_interval(),
    );

    let (shutdown, signal) = shutdown_channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => shutdown.trigger(),
            Err(e) => error!("Unable to listen for Ctrl-C: {}", e),
        }
    });

    acquisition.run(signal).await;
    Ok(())
}
