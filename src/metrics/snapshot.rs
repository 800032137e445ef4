use super::{MetricKind, NetworkRate, Sample, Zone};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// A field of a snapshot together with its staleness flag.
///
/// A stale reading carries the last value that was read successfully, or
/// `None` if the sensor never produced one.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading<T> {
    pub value: Option<T>,
    pub stale: bool,
}

impl<T> Default for Reading<T> {
    fn default() -> Self {
        Self {
            value: None,
            stale: true,
        }
    }
}

impl<T> Reading<T> {
    pub fn fresh(value: T) -> Self {
        Self {
            value: Some(value),
            stale: false,
        }
    }

    pub fn is_fresh(&self) -> bool {
        !self.stale
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Same value, flagged stale.
    pub fn into_stale(self) -> Self {
        Self {
            value: self.value,
            stale: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryUsage {
    pub used_bytes: u64,
    pub total_bytes: u64,
}

impl MemoryUsage {
    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.used_bytes as f64 / self.total_bytes as f64 * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryStatus {
    pub percent: f64,
    pub charging: bool,
    /// Only known while discharging.
    pub time_left: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskSnapshot {
    pub volume_name: String,
    pub mount_point: String,
    pub total_bytes: u64,
    pub used_bytes: u64,
}

impl DiskSnapshot {
    pub fn available_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.used_bytes)
    }

    pub fn used_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.used_bytes as f64 / self.total_bytes as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSnapshot {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f32,
    /// `None` when the platform has no energy accounting for this process.
    pub energy_score: Option<f32>,
}

impl ProcessSnapshot {
    /// The value processes are ranked by: energy when known, else CPU%.
    pub fn score(&self) -> f32 {
        let score = self.energy_score.unwrap_or(self.cpu_percent);
        if score.is_nan() {
            0.0
        } else {
            score
        }
    }
}

/// All processes sharing one name, as listed in the activity view.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessGroup {
    pub name: String,
    pub cpu_percent: f32,
    pub energy_score: Option<f32>,
    /// Ascending.
    pub pids: Vec<u32>,
    pub zone: Zone,
}

impl ProcessGroup {
    pub fn score(&self) -> f32 {
        let score = self.energy_score.unwrap_or(self.cpu_percent);
        if score.is_nan() {
            0.0
        } else {
            score
        }
    }

    pub fn lowest_pid(&self) -> u32 {
        self.pids.first().copied().unwrap_or(u32::MAX)
    }
}

/// Per-field zones, computed before the snapshot is published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Zones {
    pub cpu: Zone,
    pub memory: Zone,
    pub gpu: Zone,
    pub battery: Zone,
}

/// Everything the presentation layer needs for one tick. Never mutated
/// after it is published; the next tick replaces it.
#[derive(Debug, Clone)]
pub struct SystemSnapshot {
    /// Ticks completed so far, starting at 1.
    pub sequence: u64,
    pub taken_at: Instant,
    pub cpu_percent: Reading<f64>,
    pub memory: Reading<MemoryUsage>,
    pub gpu_percent: Reading<f64>,
    pub battery: Reading<BatteryStatus>,
    pub network: Reading<NetworkRate>,
    /// Received rate as a percentage of the busiest recent tick.
    pub network_load: f64,
    pub disks: Reading<Vec<DiskSnapshot>>,
    /// Every process, ranked.
    pub processes: Reading<Vec<ProcessSnapshot>>,
    /// The leading `top_k` ranked processes with a non-zero score.
    pub top_processes: Vec<ProcessSnapshot>,
    /// Donut fractions for `top_processes`, same order.
    pub top_shares: Vec<f32>,
    pub activity: Vec<ProcessGroup>,
    pub zones: Zones,
    pub(crate) history: BTreeMap<MetricKind, Vec<Sample>>,
}

impl SystemSnapshot {
    /// Chart history for `kind` as of this snapshot, oldest first.
    pub fn series(&self, kind: MetricKind) -> &[Sample] {
        self.history.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn memory_percent(&self) -> Option<f64> {
        self.memory.get().map(MemoryUsage::percent)
    }

    /// True when any field is carried over from an earlier tick.
    pub fn has_stale(&self) -> bool {
        self.cpu_percent.stale
            || self.memory.stale
            || self.gpu_percent.stale
            || self.battery.stale
            || self.network.stale
            || self.disks.stale
            || self.processes.stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_defaults_to_stale_and_empty() {
        let reading: Reading<f64> = Reading::default();
        assert!(reading.stale);
        assert_eq!(reading.get(), None);
    }

    #[test]
    fn stale_reading_keeps_value() {
        let reading = Reading::fresh(42.0).into_stale();
        assert!(reading.stale);
        assert_eq!(reading.get(), Some(&42.0));
    }

    #[test]
    fn disk_and_memory_percentages() {
        let disk = DiskSnapshot {
            volume_name: "/".into(),
            mount_point: "/".into(),
            total_bytes: 400,
            used_bytes: 100,
        };
        assert_eq!(disk.used_percent(), 25.0);
        assert_eq!(disk.available_bytes(), 300);

        let empty = MemoryUsage {
            used_bytes: 0,
            total_bytes: 0,
        };
        assert_eq!(empty.percent(), 0.0);
    }

    #[test]
    fn score_falls_back_to_cpu() {
        let mut process = ProcessSnapshot {
            pid: 1,
            name: "a".into(),
            cpu_percent: 12.5,
            energy_score: None,
        };
        assert_eq!(process.score(), 12.5);
        process.energy_score = Some(3.0);
        assert_eq!(process.score(), 3.0);
        process.energy_score = Some(f32::NAN);
        assert_eq!(process.score(), 0.0);
    }
}
