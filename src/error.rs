use std::fmt;
use thiserror::Error;

/// Every OS facility a [`MetricSource`](crate::source::MetricSource) can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Sensor {
    Cpu,
    Memory,
    Gpu,
    Battery,
    Processes,
    Disks,
    Network,
}

impl Sensor {
    pub const ALL: [Sensor; 7] = [
        Sensor::Cpu,
        Sensor::Memory,
        Sensor::Gpu,
        Sensor::Battery,
        Sensor::Processes,
        Sensor::Disks,
        Sensor::Network,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Sensor::Cpu => "cpu",
            Sensor::Memory => "memory",
            Sensor::Gpu => "gpu",
            Sensor::Battery => "battery",
            Sensor::Processes => "processes",
            Sensor::Disks => "disks",
            Sensor::Network => "network",
        }
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single failed read. Never fatal: the sampler keeps the last known value
/// and flags it stale.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    #[error("{sensor} sensor unavailable: {reason}")]
    Unavailable { sensor: Sensor, reason: String },

    #[error("{sensor} sensor is not supported on this platform")]
    Unsupported { sensor: Sensor },
}

impl SensorError {
    pub fn unavailable(sensor: Sensor, reason: impl Into<String>) -> Self {
        SensorError::Unavailable {
            sensor,
            reason: reason.into(),
        }
    }

    pub fn sensor(&self) -> Sensor {
        match self {
            SensorError::Unavailable { sensor, .. } | SensorError::Unsupported { sensor } => *sensor,
        }
    }
}

/// Rejected construction-time configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("update interval must be greater than zero")]
    ZeroInterval,

    #[error("history length must be greater than zero")]
    ZeroCapacity,

    #[error("top-k size must be greater than zero")]
    ZeroTopK,
}

pub type SensorResult<T> = std::result::Result<T, SensorError>;
