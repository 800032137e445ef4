#![warn(clippy::all, rust_2018_idioms)]

pub mod error;
pub mod metrics;
pub mod sampler;
pub mod settings;
pub mod source;

pub use error::{Sensor, SensorError, SettingsError};
pub use metrics::{MetricKind, Sample, SystemSnapshot, Zone};
pub use sampler::{Collector, Sampler, SamplerState, SnapshotReader};
pub use settings::SamplerSettings;
pub use source::{MetricSource, ScriptedSource, ScriptedTick, SysinfoSource};
