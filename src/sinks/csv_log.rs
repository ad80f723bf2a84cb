use log::info;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use super::{PersistenceError, PersistenceSink};
use crate::models::{Row, SensorTable};

/// CSV log of snapshot rows: `Timestamp,<name>,<name>,...`
///
/// The file is recreated for every session.
pub struct CsvLog {
    path: PathBuf,
    writer: Option<csv::Writer<File>>,
}

impl CsvLog {
    pub fn create<P: AsRef<Path>>(path: P, sensors: &SensorTable) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_writer(File::create(&path)?);
        let header = std::iter::once("Timestamp").chain(sensors.names());
        writer.write_record(header)?;
        writer.flush()?;

        info!("Logging readings to '{}'", path.display());
        Ok(Self {
            path,
            writer: Some(writer),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistenceSink for CsvLog {
    fn write(&mut self, row: &Row) -> Result<(), PersistenceError> {
        let writer = self.writer.as_mut().ok_or(PersistenceError::Closed)?;
        writer.write_record(row.to_record())?;
        writer.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), PersistenceError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            info!("Closed log '{}'", self.path.display());
        }
        Ok(())
    }
}

impl Drop for CsvLog {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
