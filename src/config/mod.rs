use anyhow::{Context, Result};
use config::{Config, File};
use indexmap::IndexMap;
use log::{debug, info, LevelFilter};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::decoder::DEFAULT_MIN_SENSOR_FIELDS;
use crate::models::SensorTable;

pub const DEFAULT_CONFIG_FILE: &str = "config.ini";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AcquisitionConfig {
    pub poll_interval_ms: u64,
    pub min_sensor_fields: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub file: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartConfig {
    pub enabled: bool,
    pub file: String,
    pub width: u32,
    pub height: u32,
    pub font: Option<String>,
    pub table_rows: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TableConfig {
    pub enabled: bool,
    pub header_every: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_sensors() -> IndexMap<String, String> {
    let mut sensors = IndexMap::new();
    sensors.insert("28C49A5C0000009D".to_string(), "Sensor 1".to_string());
    sensors.insert("28FD486000000061".to_string(), "Sensor 2".to_string());
    sensors.insert("281B176000000000".to_string(), "Sensor 3".to_string());
    sensors
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(rename = "SERIAL", alias = "serial", default)]
    pub serial: SerialConfig,
    #[serde(rename = "ACQUISITION", alias = "acquisition", default)]
    pub acquisition: AcquisitionConfig,
    #[serde(rename = "STORAGE", alias = "storage", default)]
    pub storage: StorageConfig,
    #[serde(rename = "CHART", alias = "chart", default)]
    pub chart: ChartConfig,
    #[serde(rename = "TABLE", alias = "table", default)]
    pub table: TableConfig,
    /// Sensor address to display name, in column order.
    #[serde(rename = "SENSORS", alias = "sensors", default = "default_sensors")]
    pub sensors: IndexMap<String, String>,
    #[serde(rename = "LOGGING", alias = "logging", default)]
    pub logging: LoggingConfig,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB1".to_string(),
            baud_rate: 115_200,
            read_timeout_ms: 1000,
        }
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            min_sensor_fields: DEFAULT_MIN_SENSOR_FIELDS,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            file: "sensor_data.csv".to_string(),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: "sensor_chart.png".to_string(),
            width: 800,
            height: 480,
            font: None,
            table_rows: 5,
        }
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            header_every: 20,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            acquisition: AcquisitionConfig::default(),
            storage: StorageConfig::default(),
            chart: ChartConfig::default(),
            table: TableConfig::default(),
            sensors: default_sensors(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AcquisitionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl AppConfig {
    /// Load `path`, or write the defaults there when it does not exist yet.
    pub fn load_or_init<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref();
        if config_path.exists() {
            return Self::from_file(config_path);
        }

        let config = Self::default();
        config.save(config_path)?;
        Ok(config)
    }

    pub fn get_log_level(&self) -> LevelFilter {
        match self.logging.level.to_lowercase().as_str() {
            "trace" => LevelFilter::Trace,
            "debug" => LevelFilter::Debug,
            "info" => LevelFilter::Info,
            "warn" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            "off" => LevelFilter::Off,
            _ => LevelFilter::Info, // Default to Info if invalid
        }
    }

    pub fn sensor_table(&self) -> Result<SensorTable> {
        SensorTable::new(&self.sensors).context("Invalid [SENSORS] table")
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref();
        debug!("Loading configuration from {}", config_path.display());

        let config = Config::builder()
            .add_source(File::from(config_path).format(config::FileFormat::Ini))
            .build()
            .context(format!("Failed to load config from {}", config_path.display()))?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize config")?;

        Ok(app_config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config_path = path.as_ref();

        let mut config_str = String::new();

        config_str.push_str(&format!(
            "[SERIAL]\nport = {}\nbaud_rate = {}\nread_timeout_ms = {}\n\n",
            self.serial.port, self.serial.baud_rate, self.serial.read_timeout_ms
        ));

        config_str.push_str(&format!(
            "[ACQUISITION]\npoll_interval_ms = {}\nmin_sensor_fields = {}\n\n",
            self.acquisition.poll_interval_ms, self.acquisition.min_sensor_fields
        ));

        config_str.push_str(&format!("[STORAGE]\nfile = {}\n\n", self.storage.file));

        config_str.push_str(&format!(
            "[CHART]\nenabled = {}\nfile = {}\nwidth = {}\nheight = {}\ntable_rows = {}\n",
            self.chart.enabled,
            self.chart.file,
            self.chart.width,
            self.chart.height,
            self.chart.table_rows
        ));
        if let Some(font) = &self.chart.font {
            config_str.push_str(&format!("font = {}\n", font));
        }
        config_str.push('\n');

        config_str.push_str(&format!(
            "[TABLE]\nenabled = {}\nheader_every = {}\n\n",
            self.table.enabled, self.table.header_every
        ));

        config_str.push_str(&format!("[LOGGING]\nlevel = {}\n\n", self.logging.level));

        config_str.push_str("[SENSORS]\n");
        for (address, name) in &self.sensors {
            config_str.push_str(&format!("{} = \"{}\"\n", address, name));
        }

        fs::write(config_path, config_str)
            .context(format!("Failed to save config to {}", config_path.display()))?;

        info!("Configuration saved to {}", config_path.display());
        Ok(())
    }
}
