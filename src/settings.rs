use crate::error::SettingsError;
use std::time::Duration;

/// Construction-time sampler configuration. Nothing here can change once a
/// [`Sampler`](crate::sampler::Sampler) has been built.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old settings
pub struct SamplerSettings {
    pub update_interval_ms: u64,
    /// Points kept per chart series.
    pub history_length: usize,
    /// Size of the ranking that feeds the energy donut.
    pub top_k: usize,
    pub max_process_rows: usize,
    /// Process groups at or below this CPU% are left out of the activity list.
    pub min_activity_cpu: f32,
    pub max_volumes: usize,
    /// The GPU is only queried every Nth tick.
    pub gpu_poll_every: u32,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            update_interval_ms: 2000,
            history_length: 30,
            top_k: 5,
            max_process_rows: 30,
            min_activity_cpu: 0.05,
            max_volumes: 6,
            gpu_poll_every: 2,
        }
    }
}

impl SamplerSettings {
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.update_interval_ms == 0 {
            return Err(SettingsError::ZeroInterval);
        }
        if self.history_length == 0 {
            return Err(SettingsError::ZeroCapacity);
        }
        if self.top_k == 0 {
            return Err(SettingsError::ZeroTopK);
        }
        Ok(())
    }

    /// Whole milliseconds only; anything under 1ms becomes zero and fails
    /// [`validate`](Self::validate).
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.update_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_history_length(mut self, history_length: usize) -> Self {
        self.history_length = history_length;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}
