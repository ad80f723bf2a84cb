pub mod reading;
pub mod sensor;

pub use reading::{Reading, Row, Sample, TIMESTAMP_FORMAT};
pub use sensor::{SensorId, SensorTable, SensorTableError};
