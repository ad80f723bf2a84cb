use async_trait::async_trait;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use super::{LineSource, TransportError};
use crate::config::SerialConfig;

/// Longest partial line kept between reads.
const MAX_PENDING_BYTES: usize = 4096;

/// Serial port reader for the sensor board (8N1, no flow control).
///
/// After an I/O failure the port is dropped and reopened on the next read.
pub struct SerialLineSource {
    path: String,
    baud_rate: u32,
    timeout: Duration,
    port: Option<BufReader<SerialStream>>,
    // Bytes of a line that has not seen its newline yet.
    pending: Vec<u8>,
    closed: bool,
}

impl SerialLineSource {
    /// Not connected yet; the first read opens the port.
    pub fn new(config: &SerialConfig) -> Self {
        Self {
            path: config.port.clone(),
            baud_rate: config.baud_rate,
            timeout: Duration::from_millis(config.read_timeout_ms),
            port: None,
            pending: Vec::with_capacity(256),
            closed: false,
        }
    }

    pub fn open(config: &SerialConfig) -> Result<Self, TransportError> {
        let mut source = Self::new(config);
        source.connect()?;
        Ok(source)
    }

    pub fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    pub fn connect(&mut self) -> Result<(), TransportError> {
        let port = tokio_serial::new(&self.path, self.baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|source| TransportError::Open {
                path: self.path.clone(),
                source,
            })?;

        info!("Opened {} at {} baud", self.path, self.baud_rate);
        self.port = Some(BufReader::new(port));
        self.pending.clear();
        Ok(())
    }
}

#[async_trait]
impl LineSource for SerialLineSource {
    async fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        if self.port.is_none() {
            debug!("Reconnecting to {}", self.path);
            self.connect()?;
        }
        let Some(port) = self.port.as_mut() else {
            return Err(TransportError::Closed);
        };

        let result = read_line_within(port, &mut self.pending, self.timeout).await;
        match &result {
            Err(TransportError::Disconnected) => {
                warn!("{} reached end of stream", self.path);
                self.port = None;
            }
            Err(TransportError::Io(e)) => {
                warn!("Read from {} failed: {}", self.path, e);
                self.port = None;
            }
            _ => {}
        }
        result
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if !self.closed {
            self.closed = true;
            self.pending.clear();
            if self.port.take().is_some() {
                info!("Closed {}", self.path);
            }
        }
        Ok(())
    }
}

/// Read one newline-terminated line from `reader` within `timeout`.
///
/// `read_until` leaves partial bytes in `pending` when the timeout fires, so
/// the rest of the line is picked up by the next call. A partial line longer
/// than `MAX_PENDING_BYTES` is discarded.
async fn read_line_within<R>(
    reader: &mut R,
    pending: &mut Vec<u8>,
    timeout: Duration,
) -> Result<Option<String>, TransportError>
where
    R: AsyncBufRead + Unpin,
{
    match tokio::time::timeout(timeout, reader.read_until(b'\n', pending)).await {
        Err(_) => {
            if pending.len() > MAX_PENDING_BYTES {
                warn!("Discarding {} bytes without a line ending", pending.len());
                pending.clear();
            }
            Ok(None)
        }
        Ok(Ok(0)) => Err(TransportError::Disconnected),
        Ok(Ok(_)) => {
            let line = String::from_utf8_lossy(pending).trim().to_string();
            pending.clear();
            Ok(Some(line))
        }
        Ok(Err(e)) => Err(TransportError::Io(e)),
    }
}
