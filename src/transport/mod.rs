use async_trait::async_trait;
use thiserror::Error;

pub mod serial;

pub use serial::SerialLineSource;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: tokio_serial::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("device disconnected")]
    Disconnected,

    #[error("transport is closed")]
    Closed,
}

/// A newline-delimited text source.
#[async_trait]
pub trait LineSource: Send {
    /// Wait a bounded time for one complete line.
    ///
    /// `Ok(None)` means nothing complete arrived before the timeout.
    async fn read_line(&mut self) -> Result<Option<String>, TransportError>;

    /// Release the underlying handle. Calling it again is a no-op.
    async fn close(&mut self) -> Result<(), TransportError>;
}
