//! Where raw readings come from.
//!
//! Every OS-specific failure is folded into [`SensorError`](crate::error::SensorError); the sampler only
//! ever sees "got a value" or "sensor unavailable".

mod scripted;
mod sysfs;
mod system;

pub use scripted::{ReadCounts, ScriptedSource, ScriptedTick};
pub use system::{is_user_volume, volume_display_name, SysinfoSource};

use crate::error::SensorResult;
use crate::metrics::{BatteryStatus, DiskSnapshot, MemoryUsage, ProcessSnapshot};

/// Cumulative byte counters summed over all non-loopback interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkTotals {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
}

/// One raw reading per capability. Each read may fail on its own.
pub trait MetricSource {
    /// Called once at the start of every tick, before any read.
    fn refresh(&mut self) {}

    fn cpu_percent(&mut self) -> SensorResult<f64>;

    fn memory(&mut self) -> SensorResult<MemoryUsage>;

    /// Best-effort; most platforms report [`SensorError::Unsupported`](crate::error::SensorError::Unsupported).
    fn gpu_percent(&mut self) -> SensorResult<f64>;

    fn battery(&mut self) -> SensorResult<BatteryStatus>;

    fn processes(&mut self) -> SensorResult<Vec<ProcessSnapshot>>;

    fn disks(&mut self) -> SensorResult<Vec<DiskSnapshot>>;

    fn network(&mut self) -> SensorResult<NetworkTotals>;
}

impl<S: MetricSource + ?Sized> MetricSource for Box<S> {
    fn refresh(&mut self) {
        (**self).refresh()
    }

    fn cpu_percent(&mut self) -> SensorResult<f64> {
        (**self).cpu_percent()
    }

    fn memory(&mut self) -> SensorResult<MemoryUsage> {
        (**self).memory()
    }

    fn gpu_percent(&mut self) -> SensorResult<f64> {
        (**self).gpu_percent()
    }

    fn battery(&mut self) -> SensorResult<BatteryStatus> {
        (**self).battery()
    }

    fn processes(&mut self) -> SensorResult<Vec<ProcessSnapshot>> {
        (**self).processes()
    }

    fn disks(&mut self) -> SensorResult<Vec<DiskSnapshot>> {
        (**self).disks()
    }

    fn network(&mut self) -> SensorResult<NetworkTotals> {
        (**self).network()
    }
}
