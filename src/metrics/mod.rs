pub mod circular_buffer;
pub mod rank;
pub mod rate;
pub mod snapshot;
pub mod store;
pub mod units;
pub mod zone;

pub use circular_buffer::CircularBuffer;
pub use rank::{group_by_name, rank_all, shares, top_k};
pub use rate::{rate, NetworkCounter, NetworkRate, RateCalculator};
pub use snapshot::*;
pub use store::MetricStore;
pub use zone::{battery_zone, classify, zone, Classification, Zone};

use std::fmt;
use std::time::Instant;

/// One chartable stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Deserialize, serde::Serialize)]
pub enum MetricKind {
    Cpu,
    Memory,
    Gpu,
    Battery,
    NetworkSent,
    NetworkRecv,
}

impl MetricKind {
    pub const ALL: [MetricKind; 6] = [
        MetricKind::Cpu,
        MetricKind::Memory,
        MetricKind::Gpu,
        MetricKind::Battery,
        MetricKind::NetworkSent,
        MetricKind::NetworkRecv,
    ];

    /// Whether values are percentages in `[0, 100]` rather than bytes per second.
    pub fn is_percent(&self) -> bool {
        !matches!(self, MetricKind::NetworkSent | MetricKind::NetworkRecv)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricKind::Cpu => "cpu",
            MetricKind::Memory => "memory",
            MetricKind::Gpu => "gpu",
            MetricKind::Battery => "battery",
            MetricKind::NetworkSent => "net-sent",
            MetricKind::NetworkRecv => "net-recv",
        };
        f.write_str(name)
    }
}

/// A single chart point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: Instant,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: Instant, value: f64) -> Self {
        Self { timestamp, value }
    }
}
