use log::{debug, warn};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Instant;

use super::{PresentationSink, RenderError};
use crate::config::ChartConfig;
use crate::dashboard;
use crate::models::Row;
use crate::renderer::fonts::Fonts;
use crate::store::SampleStore;

/// Live chart written to a PNG file on every render.
pub struct ChartImage {
    config: ChartConfig,
    path: PathBuf,
    fonts: Option<Fonts>,
    recent: VecDeque<Row>,
    cursor: usize,
}

impl ChartImage {
    pub fn new(config: &ChartConfig) -> Self {
        let fonts = config.font.as_ref().and_then(|path| match Fonts::load(path) {
            Ok(fonts) => Some(fonts),
            Err(e) => {
                warn!("Chart text disabled, cannot load font {}: {}", path, e);
                None
            }
        });

        Self {
            config: config.clone(),
            path: PathBuf::from(&config.file),
            fonts,
            recent: VecDeque::with_capacity(config.table_rows + 1),
            cursor: 0,
        }
    }

    fn remember(&mut self, store: &SampleStore) {
        self.recent.extend(store.rows_since(self.cursor));
        self.cursor = store.len();
        while self.recent.len() > self.config.table_rows {
            self.recent.pop_front();
        }
    }
}

impl PresentationSink for ChartImage {
    fn render(&mut self, store: &SampleStore) -> Result<(), RenderError> {
        let start = Instant::now();
        self.remember(store);

        let rows: Vec<Row> = self.recent.iter().cloned().collect();
        let image = dashboard::create_image(&self.config, store, &rows, self.fonts.as_ref());
        dashboard::save_image(&image, &self.path)?;

        debug!("Chart render took: {} ms", start.elapsed().as_millis());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Reading, SensorId, SensorTable};
    use chrono::{Local, TimeZone};
    use image::GenericImageView;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn store() -> SampleStore {
        let table = SensorTable::new([("28AA", "Sensor 1"), ("28BB", "Sensor 2")]).unwrap();
        SampleStore::new(Arc::new(table))
    }

    fn chart_config(file: PathBuf) -> ChartConfig {
        ChartConfig {
            file: file.to_string_lossy().into_owned(),
            width: 320,
            height: 200,
            ..ChartConfig::default()
        }
    }

    #[test]
    fn test_renders_empty_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chart.png");
        let mut chart = ChartImage::new(&chart_config(path.clone()));

        chart.render(&store()).unwrap();

        let image = image::open(&path).unwrap();
        assert_eq!(image.dimensions(), (320, 200));
    }

    #[test]
    fn test_renders_series_and_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("chart.png");
        let mut chart = ChartImage::new(&chart_config(path.clone()));
        let mut store = store();

        for (secs, sensor, value) in [(0, "28AA", 20.0), (1, "28BB", 22.0), (2, "28AA", 21.0)] {
            let ts = Local.timestamp_opt(1_700_000_000 + secs, 0).unwrap();
            store.append(&Reading::new(ts, SensorId::new(sensor), value)).unwrap();
            chart.render(&store).unwrap();
        }

        let image = image::open(&path).unwrap().to_rgba8();
        // Some pixel carries a series colour, not just background and grid.
        assert!(image.pixels().any(|p| p.0 == [87, 174, 36, 255]));
        assert!(!dir.path().join("out").join("chart.png.tmp").exists());
    }

    #[test]
    fn test_missing_font_disables_text_only() {
        let dir = tempdir().unwrap();
        let mut config = chart_config(dir.path().join("chart.png"));
        config.font = Some("/nonexistent/font.ttf".to_string());
        config.table_rows = 2;

        let mut chart = ChartImage::new(&config);
        assert!(chart.fonts.is_none());

        let mut store = store();
        for secs in 0..4 {
            let ts = Local.timestamp_opt(1_700_000_000 + secs, 0).unwrap();
            store.append(&Reading::new(ts, SensorId::new("28AA"), secs as f64)).unwrap();
            chart.render(&store).unwrap();
        }
        assert_eq!(chart.recent.len(), 2);
        assert_eq!(chart.recent.back().unwrap().timestamp.timestamp(), 1_700_000_003);
    }
}
