mod collector;

pub use collector::Collector;

use crate::error::SettingsError;
use crate::metrics::{MetricKind, Sample, SystemSnapshot};
use crate::settings::SamplerSettings;
use crate::source::MetricSource;
use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use log::{debug, error, info};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    Idle,
    Running,
    /// Terminal; a stopped sampler cannot be restarted.
    Stopped,
}

/// Read-only handle on the most recently published snapshot.
///
/// Cloning is cheap and every clone sees the same slot.
#[derive(Debug, Clone, Default)]
pub struct SnapshotReader {
    slot: Arc<RwLock<Option<Arc<SystemSnapshot>>>>,
}

impl SnapshotReader {
    /// The latest complete snapshot, or `None` before the first tick.
    pub fn latest(&self) -> Option<Arc<SystemSnapshot>> {
        let slot = self.slot.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.clone()
    }

    /// Chart history for `kind` as of the latest snapshot.
    pub fn series(&self, kind: MetricKind) -> Vec<Sample> {
        self.latest()
            .map(|snapshot| snapshot.series(kind).to_vec())
            .unwrap_or_default()
    }

    fn publish(&self, snapshot: SystemSnapshot) {
        let snapshot = Arc::new(snapshot);
        let mut slot = self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(snapshot);
    }
}

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Drives a [`Collector`] on its own thread at a fixed interval and
/// publishes every snapshot it produces.
pub struct Sampler<S> {
    state: SamplerState,
    collector: Option<Collector<S>>,
    worker: Option<Worker>,
    reader: SnapshotReader,
    interval: Duration,
}

impl<S: MetricSource + Send + 'static> Sampler<S> {
    pub fn new(source: S, settings: SamplerSettings) -> Result<Self, SettingsError> {
        let interval = settings.update_interval();
        let collector = Collector::new(source, settings)?;
        Ok(Self {
            state: SamplerState::Idle,
            collector: Some(collector),
            worker: None,
            reader: SnapshotReader::default(),
            interval,
        })
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn reader(&self) -> SnapshotReader {
        self.reader.clone()
    }

    pub fn latest(&self) -> Option<Arc<SystemSnapshot>> {
        self.reader.latest()
    }

    pub fn series(&self, kind: MetricKind) -> Vec<Sample> {
        self.reader.series(kind)
    }

    /// Starts ticking. Only an idle sampler starts; any other state is left
    /// alone.
    pub fn start(&mut self) -> std::io::Result<()> {
        // Only an idle sampler still owns its collector.
        let Some(collector) = self.collector.take() else {
            debug!("Ignoring start, sampler is {:?}", self.state);
            return Ok(());
        };

        let (stop_tx, stop_rx) = channel::bounded(1);
        let reader = self.reader.clone();
        let interval = self.interval;
        let spawned = thread::Builder::new()
            .name("sysmon-sampler".into())
            .spawn(move || Self::run(collector, reader, stop_rx, interval));

        match spawned {
            Ok(handle) => {
                self.worker = Some(Worker { stop_tx, handle });
                self.state = SamplerState::Running;
                info!("Sampler started, ticking every {:?}", interval);
                Ok(())
            }
            Err(err) => {
                self.state = SamplerState::Stopped;
                Err(err)
            }
        }
    }

    /// Stops scheduling ticks and waits for an in-flight tick to finish.
    /// Does nothing unless the sampler is running.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            debug!("Ignoring stop, sampler is {:?}", self.state);
            return;
        };
        self.state = SamplerState::Stopped;
        // Disconnecting wakes the worker even if it is waiting on the ticker.
        drop(worker.stop_tx);
        if worker.handle.join().is_err() {
            error!("Sampler thread panicked");
        }
        info!("Sampler stopped");
    }

    fn run(mut collector: Collector<S>, reader: SnapshotReader, stop_rx: Receiver<()>, interval: Duration) {
        // The ticker's first delivery is one interval after `origin`, so every
        // tick time comes from the same clock.
        let origin = Instant::now();
        let ticker = channel::tick(interval);
        if let Some(snapshot) = collector.tick(origin) {
            reader.publish(snapshot);
        }
        let mut busy_until = Instant::now();
        loop {
            crossbeam::select! {
                recv(stop_rx) -> _ => break,
                recv(ticker) -> due => {
                    // Both may be ready at once; stopping wins.
                    if !matches!(stop_rx.try_recv(), Err(TryRecvError::Empty)) {
                        break;
                    }
                    let Ok(due) = due else { break };
                    if missed(due, busy_until) {
                        debug!(
                            "Dropping tick, previous one overran it by {:?}",
                            busy_until.saturating_duration_since(due)
                        );
                        continue;
                    }
                    if let Some(snapshot) = collector.tick(due) {
                        reader.publish(snapshot);
                    }
                    busy_until = Instant::now();
                }
            }
        }
    }
}

/// A tick that fell due while the previous one was still running is dropped;
/// the next one runs on the following slot.
fn missed(due: Instant, busy_until: Instant) -> bool {
    due < busy_until
}

impl<S> Drop for Sampler<S> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            drop(worker.stop_tx);
            let _ = worker.handle.join();
        }
    }
}
