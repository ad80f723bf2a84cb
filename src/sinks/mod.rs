use log::error;
use thiserror::Error;

use crate::models::Row;
use crate::store::SampleStore;

pub mod chart;
pub mod csv_log;
pub mod table;

pub use chart::ChartImage;
pub use csv_log::CsvLog;
pub use table::TableView;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("log is closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Durable, append-only destination for snapshot rows.
pub trait PersistenceSink: Send {
    /// Append `row` and flush it before returning.
    fn write(&mut self, row: &Row) -> Result<(), PersistenceError>;

    /// Flush and release the destination. Safe to call more than once.
    fn close(&mut self) -> Result<(), PersistenceError>;
}

/// Something that redraws from the store after each accepted line.
///
/// Implementations must accept an empty store.
pub trait PresentationSink: Send {
    fn render(&mut self, store: &SampleStore) -> Result<(), RenderError>;
}

/// Fans a render out to several sinks. A failing sink does not stop the
/// others.
#[derive(Default)]
pub struct Presenters {
    sinks: Vec<Box<dyn PresentationSink>>,
}

impl Presenters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sink: impl PresentationSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl PresentationSink for Presenters {
    fn render(&mut self, store: &SampleStore) -> Result<(), RenderError> {
        let mut first_error = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.render(store) {
                error!("Presentation sink failed: {}", e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
