use super::{MetricSource, NetworkTotals};
use crate::error::{Sensor, SensorError, SensorResult};
use crate::metrics::{BatteryStatus, DiskSnapshot, MemoryUsage, ProcessSnapshot};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

/// What every sensor returns during one tick.
#[derive(Debug, Clone)]
pub struct ScriptedTick {
    pub cpu: SensorResult<f64>,
    pub memory: SensorResult<MemoryUsage>,
    pub gpu: SensorResult<f64>,
    pub battery: SensorResult<BatteryStatus>,
    pub processes: SensorResult<Vec<ProcessSnapshot>>,
    pub disks: SensorResult<Vec<DiskSnapshot>>,
    pub network: SensorResult<NetworkTotals>,
}

impl Default for ScriptedTick {
    fn default() -> Self {
        Self {
            cpu: Ok(10.0),
            memory: Ok(MemoryUsage {
                used_bytes: 4 << 30,
                total_bytes: 16 << 30,
            }),
            gpu: Ok(5.0),
            battery: Ok(BatteryStatus {
                percent: 80.0,
                charging: false,
                time_left: None,
            }),
            processes: Ok(Vec::new()),
            disks: Ok(Vec::new()),
            network: Ok(NetworkTotals::default()),
        }
    }
}

impl ScriptedTick {
    pub fn cpu(mut self, percent: f64) -> Self {
        self.cpu = Ok(percent);
        self
    }

    pub fn memory(mut self, used_bytes: u64, total_bytes: u64) -> Self {
        self.memory = Ok(MemoryUsage {
            used_bytes,
            total_bytes,
        });
        self
    }

    pub fn gpu(mut self, percent: f64) -> Self {
        self.gpu = Ok(percent);
        self
    }

    pub fn battery(mut self, percent: f64, charging: bool) -> Self {
        self.battery = Ok(BatteryStatus {
            percent,
            charging,
            time_left: None,
        });
        self
    }

    pub fn processes(mut self, processes: Vec<ProcessSnapshot>) -> Self {
        self.processes = Ok(processes);
        self
    }

    pub fn disks(mut self, disks: Vec<DiskSnapshot>) -> Self {
        self.disks = Ok(disks);
        self
    }

    pub fn network(mut self, bytes_sent: u64, bytes_recv: u64) -> Self {
        self.network = Ok(NetworkTotals {
            bytes_sent,
            bytes_recv,
        });
        self
    }

    /// Makes `sensor` fail for this tick.
    pub fn fail(mut self, sensor: Sensor) -> Self {
        let err = SensorError::unavailable(sensor, "scripted failure");
        match sensor {
            Sensor::Cpu => self.cpu = Err(err),
            Sensor::Memory => self.memory = Err(err),
            Sensor::Gpu => self.gpu = Err(err),
            Sensor::Battery => self.battery = Err(err),
            Sensor::Processes => self.processes = Err(err),
            Sensor::Disks => self.disks = Err(err),
            Sensor::Network => self.network = Err(err),
        }
        self
    }
}

/// Shared view of how often each sensor was read.
#[derive(Debug, Clone, Default)]
pub struct ReadCounts(Arc<Mutex<BTreeMap<Sensor, usize>>>);

impl ReadCounts {
    fn record(&self, sensor: Sensor) {
        let mut counts = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *counts.entry(sensor).or_default() += 1;
    }

    pub fn get(&self, sensor: Sensor) -> usize {
        let counts = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        counts.get(&sensor).copied().unwrap_or(0)
    }
}

/// Deterministic source that replays one [`ScriptedTick`] per refresh. Once
/// the script runs out the last tick repeats.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: VecDeque<ScriptedTick>,
    current: ScriptedTick,
    reads: ReadCounts,
}

impl ScriptedSource {
    pub fn new(script: Vec<ScriptedTick>) -> Self {
        Self {
            script: script.into(),
            current: ScriptedTick::default(),
            reads: ReadCounts::default(),
        }
    }

    /// Every tick reads the same values.
    pub fn steady(tick: ScriptedTick) -> Self {
        Self::new(vec![tick])
    }

    pub fn read_counts(&self) -> ReadCounts {
        self.reads.clone()
    }

    fn read<T: Clone>(&self, sensor: Sensor, value: &SensorResult<T>) -> SensorResult<T> {
        self.reads.record(sensor);
        value.clone()
    }
}

impl MetricSource for ScriptedSource {
    fn refresh(&mut self) {
        if let Some(next) = self.script.pop_front() {
            self.current = next;
        }
    }

    fn cpu_percent(&mut self) -> SensorResult<f64> {
        self.read(Sensor::Cpu, &self.current.cpu)
    }

    fn memory(&mut self) -> SensorResult<MemoryUsage> {
        self.read(Sensor::Memory, &self.current.memory)
    }

    fn gpu_percent(&mut self) -> SensorResult<f64> {
        self.read(Sensor::Gpu, &self.current.gpu)
    }

    fn battery(&mut self) -> SensorResult<BatteryStatus> {
        self.read(Sensor::Battery, &self.current.battery)
    }

    fn processes(&mut self) -> SensorResult<Vec<ProcessSnapshot>> {
        self.read(Sensor::Processes, &self.current.processes)
    }

    fn disks(&mut self) -> SensorResult<Vec<DiskSnapshot>> {
        self.read(Sensor::Disks, &self.current.disks)
    }

    fn network(&mut self) -> SensorResult<NetworkTotals> {
        self.read(Sensor::Network, &self.current.network)
    }
}
