use super::MetricKind;
use std::collections::HashMap;
use std::time::Instant;

/// Per-second rate between two readings of a cumulative counter.
///
/// A counter that went backwards (interface reset, sleep/wake, overflow)
/// yields zero for that interval. Non-positive or non-finite elapsed time
/// also yields zero.
pub fn rate(previous: u64, current: u64, elapsed_secs: f64) -> f64 {
    if !elapsed_secs.is_finite() || elapsed_secs <= 0.0 {
        return 0.0;
    }
    current.saturating_sub(previous) as f64 / elapsed_secs
}

/// Cumulative interface byte counters at one point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkCounter {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub observed_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NetworkRate {
    pub sent_bps: f64,
    pub recv_bps: f64,
}

impl NetworkRate {
    /// Rate between two counters, timed by when each was actually observed.
    pub fn between(previous: &NetworkCounter, current: &NetworkCounter) -> Self {
        let elapsed = current
            .observed_at
            .saturating_duration_since(previous.observed_at)
            .as_secs_f64();
        Self {
            sent_bps: rate(previous.bytes_sent, current.bytes_sent, elapsed),
            recv_bps: rate(previous.bytes_recv, current.bytes_recv, elapsed),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Baseline {
    value: u64,
    at: Instant,
}

/// Turns successive cumulative counter readings into rates, keeping one
/// baseline per counter.
#[derive(Debug, Clone, Default)]
pub struct RateCalculator {
    baselines: HashMap<MetricKind, Baseline>,
}

impl RateCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value` as the new baseline for `kind` and returns the rate
    /// since the previous baseline, or `None` on the first observation.
    pub fn observe(&mut self, kind: MetricKind, value: u64, at: Instant) -> Option<f64> {
        let previous = self.baselines.insert(kind, Baseline { value, at })?;
        if value < previous.value {
            log::debug!(
                "{} counter went backwards ({} -> {}), treating as reset",
                kind,
                previous.value,
                value
            );
        }
        let elapsed = at.saturating_duration_since(previous.at).as_secs_f64();
        Some(rate(previous.value, value, elapsed))
    }

    /// Feeds both directions of a network counter.
    pub fn observe_network(&mut self, counter: &NetworkCounter) -> Option<NetworkRate> {
        let sent = self.observe(MetricKind::NetworkSent, counter.bytes_sent, counter.observed_at);
        let recv = self.observe(MetricKind::NetworkRecv, counter.bytes_recv, counter.observed_at);
        match (sent, recv) {
            (Some(sent_bps), Some(recv_bps)) => Some(NetworkRate { sent_bps, recv_bps }),
            _ => None,
        }
    }

    pub fn reset(&mut self, kind: MetricKind) {
        self.baselines.remove(&kind);
    }
}
