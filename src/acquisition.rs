use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::decoder::{DecodeError, LineDecoder};
use crate::sinks::{PersistenceSink, PresentationSink};
use crate::store::SampleStore;
use crate::transport::LineSource;

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timed out or read an empty line.
    NoData,
    /// Line decoded; this many readings were stored.
    Accepted(usize),
    /// Whole line rejected by the decoder.
    Dropped(DecodeError),
    TransportFailed,
    /// The loop has been shut down.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Reading,
    Stopped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcquisitionStats {
    pub ticks: u64,
    pub lines: u64,
    pub readings: u64,
    pub dropped_lines: u64,
    pub transport_errors: u64,
    pub persistence_errors: u64,
    pub render_errors: u64,
}

/// Requests shutdown of a running loop. Cloneable; triggering twice is harmless.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolves once shutdown is requested, or when every handle is gone.
    pub async fn wait(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

pub fn shutdown_channel() -> (ShutdownHandle, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx: Arc::new(tx) }, ShutdownSignal { rx })
}

/// Polls the transport on a fixed cadence and feeds the store and sinks.
///
/// Each tick reads at most one line. Failures are logged and counted, never
/// returned: the next tick simply tries again.
pub struct Acquisition<S, P, R> {
    decoder: LineDecoder,
    store: SampleStore,
    source: Option<S>,
    persistence: Option<P>,
    presentation: R,
    poll_interval: Duration,
    state: LoopState,
    stats: AcquisitionStats,
}

impl<S, P, R> Acquisition<S, P, R>
where
    S: LineSource,
    P: PersistenceSink,
    R: PresentationSink,
{
    pub fn new(
        decoder: LineDecoder,
        source: S,
        persistence: P,
        presentation: R,
        poll_interval: Duration,
    ) -> Self {
        let store = SampleStore::new(decoder.sensors().clone());
        Self {
            decoder,
            store,
            source: Some(source),
            persistence: Some(persistence),
            presentation,
            poll_interval,
            state: LoopState::Idle,
            stats: AcquisitionStats::default(),
        }
    }

    pub fn store(&self) -> &SampleStore {
        &self.store
    }

    pub fn stats(&self) -> AcquisitionStats {
        self.stats
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Run one Idle → Reading → Idle cycle.
    pub async fn tick(&mut self) -> TickOutcome {
        let Some(source) = self.source.as_mut() else {
            return TickOutcome::Stopped;
        };

        self.state = LoopState::Reading;
        self.stats.ticks += 1;

        let read = source.read_line().await;
        let outcome = match read {
            Ok(Some(line)) if !line.trim().is_empty() => self.process_line(&line),
            Ok(_) => TickOutcome::NoData,
            Err(e) => {
                error!("Error reading serial data: {}", e);
                self.stats.transport_errors += 1;
                TickOutcome::TransportFailed
            }
        };

        self.state = LoopState::Idle;
        outcome
    }

    fn process_line(&mut self, line: &str) -> TickOutcome {
        self.stats.lines += 1;
        debug!("Received line: {}", line);

        let readings = match self.decoder.decode(line) {
            Ok(readings) => readings,
            Err(e) => {
                warn!("Ignored line {:?}: {}", line, e);
                self.stats.dropped_lines += 1;
                return TickOutcome::Dropped(e);
            }
        };

        let mut accepted = 0;
        for reading in &readings {
            if let Err(e) = self.store.append(reading) {
                error!("Rejected reading: {}", e);
                continue;
            }
            accepted += 1;
            // One log row per accepted reading, carrying forward the other
            // sensors' last values.
            self.persist_latest();
        }
        self.stats.readings += accepted as u64;

        if let Err(e) = self.presentation.render(&self.store) {
            error!("Failed to render: {}", e);
            self.stats.render_errors += 1;
        }

        TickOutcome::Accepted(accepted)
    }

    fn persist_latest(&mut self) {
        let (Some(sink), Some(row)) = (self.persistence.as_mut(), self.store.latest_row()) else {
            return;
        };
        if let Err(e) = sink.write(&row) {
            error!("Failed to write log row: {}", e);
            self.stats.persistence_errors += 1;
        }
    }

    /// Tick every `poll_interval` until `shutdown` fires, then shut down.
    pub async fn run(&mut self, mut shutdown: ShutdownSignal) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Polling every {} ms", self.poll_interval.as_millis());

        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait() => {
                    info!("Shutdown requested");
                    break;
                }
                _ = interval.tick() => {
                    if self.tick().await == TickOutcome::Stopped {
                        break;
                    }
                }
            }
        }

        self.shutdown().await;
    }

    /// Flush and close the log and release the transport. Idempotent.
    pub async fn shutdown(&mut self) {
        if let Some(mut sink) = self.persistence.take() {
            if let Err(e) = sink.close() {
                error!("Failed to close log: {}", e);
            }
        }
        if let Some(mut source) = self.source.take() {
            if let Err(e) = source.close().await {
                error!("Failed to close transport: {}", e);
            }
        }

        if self.state != LoopState::Stopped {
            self.state = LoopState::Stopped;
            info!(
                "Stopped after {} ticks: {} lines, {} readings, {} dropped, {} transport errors, {} log errors, {} render errors",
                self.stats.ticks,
                self.stats.lines,
                self.stats.readings,
                self.stats.dropped_lines,
                self.stats.transport_errors,
                self.stats.persistence_errors,
                self.stats.render_errors
            );
        }
    }
}
