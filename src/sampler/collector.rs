use crate::error::{Sensor, SensorError, SensorResult, SettingsError};
use crate::metrics::{
    battery_zone, classify, group_by_name, rank_all, shares, top_k, BatteryStatus, DiskSnapshot, MemoryUsage,
    MetricKind, MetricStore, NetworkCounter, NetworkRate, ProcessSnapshot, RateCalculator, Reading,
    Sample, SystemSnapshot, Zones,
};
use crate::settings::SamplerSettings;
use crate::source::MetricSource;
use log::{debug, info, trace, warn};
use std::collections::BTreeSet;
use std::time::Instant;

/// Received rates below this never count as a busy link.
const NETWORK_LOAD_FLOOR_BPS: f64 = 1024.0;

/// Last value seen for every snapshot field.
#[derive(Debug, Default)]
struct LastKnown {
    cpu: Reading<f64>,
    memory: Reading<MemoryUsage>,
    gpu: Reading<f64>,
    battery: Reading<BatteryStatus>,
    network: Reading<NetworkRate>,
    disks: Reading<Vec<DiskSnapshot>>,
    processes: Reading<Vec<ProcessSnapshot>>,
}

/// Sensors whose last read failed. Logs each transition once.
#[derive(Debug, Default)]
struct StaleSensors(BTreeSet<Sensor>);

impl StaleSensors {
    /// Stores a fresh value in `slot`, or keeps its old value flagged stale.
    fn settle<T>(&mut self, sensor: Sensor, result: SensorResult<T>, slot: &mut Reading<T>) {
        match result {
            Ok(value) => {
                self.recovered(sensor);
                *slot = Reading::fresh(value);
            }
            Err(err) => {
                self.failed(&err);
                slot.stale = true;
            }
        }
    }

    fn failed(&mut self, err: &SensorError) {
        if !self.0.insert(err.sensor()) {
            debug!("{}", err);
            return;
        }
        match err {
            SensorError::Unsupported { .. } => info!("{}", err),
            SensorError::Unavailable { .. } => warn!("{}, keeping last known value", err),
        }
    }

    fn recovered(&mut self, sensor: Sensor) {
        if self.0.remove(&sensor) {
            info!("{} sensor recovered", sensor);
        }
    }
}

/// Runs one sampling cycle at a time. Owns the chart history; nothing else
/// mutates it.
pub struct Collector<S> {
    source: S,
    settings: SamplerSettings,
    store: MetricStore,
    rates: RateCalculator,
    last: LastKnown,
    stale: StaleSensors,
    last_tick: Option<Instant>,
    sequence: u64,
    gpu_polls: u32,
    gpu_cache: Option<SensorResult<f64>>,
}

impl<S: MetricSource> Collector<S> {
    pub fn new(source: S, settings: SamplerSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            source,
            store: MetricStore::with_all_kinds(settings.history_length),
            settings,
            rates: RateCalculator::new(),
            last: LastKnown::default(),
            stale: StaleSensors::default(),
            last_tick: None,
            sequence: 0,
            gpu_polls: 0,
            gpu_cache: None,
        })
    }

    pub fn settings(&self) -> &SamplerSettings {
        &self.settings
    }

    pub fn store(&self) -> &MetricStore {
        &self.store
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Runs one tick at `now` and returns the new snapshot, or `None` if less
    /// than one interval passed since the previous accepted tick.
    pub fn tick(&mut self, now: Instant) -> Option<SystemSnapshot> {
        if let Some(previous) = self.last_tick {
            let elapsed = now.saturating_duration_since(previous);
            if elapsed < self.settings.update_interval() {
                debug!("Skipping tick, only {:?} since the previous one", elapsed);
                return None;
            }
        }
        self.last_tick = Some(now);
        self.sequence += 1;
        self.source.refresh();

        let cpu = self.source.cpu_percent().and_then(|pct| finite(Sensor::Cpu, pct));
        self.stale.settle(Sensor::Cpu, cpu, &mut self.last.cpu);
        if let Some(pct) = fresh_value(&self.last.cpu) {
            self.store.append(MetricKind::Cpu, Sample::new(now, *pct));
        }

        let memory = self.source.memory();
        self.stale.settle(Sensor::Memory, memory, &mut self.last.memory);
        if let Some(memory) = fresh_value(&self.last.memory) {
            self.store.append(MetricKind::Memory, Sample::new(now, memory.percent()));
        }

        let gpu = self.poll_gpu();
        self.stale.settle(Sensor::Gpu, gpu, &mut self.last.gpu);
        if let Some(pct) = fresh_value(&self.last.gpu) {
            self.store.append(MetricKind::Gpu, Sample::new(now, *pct));
        }

        let battery = self
            .source
            .battery()
            .and_then(|status| finite(Sensor::Battery, status.percent).map(|_| status));
        self.stale.settle(Sensor::Battery, battery, &mut self.last.battery);
        if let Some(status) = fresh_value(&self.last.battery) {
            self.store.append(MetricKind::Battery, Sample::new(now, status.percent));
        }

        self.sample_network(now);

        let disks = self.source.disks().map(|mut disks| {
            disks.truncate(self.settings.max_volumes);
            disks
        });
        self.stale.settle(Sensor::Disks, disks, &mut self.last.disks);

        let processes = self.source.processes().map(|list| rank_all(&list));
        self.stale.settle(Sensor::Processes, processes, &mut self.last.processes);

        let snapshot = self.assemble(now);
        trace!(
            "Tick {}: cpu {:?} mem {:?} net {:?} stale {:?}",
            snapshot.sequence,
            snapshot.cpu_percent.value,
            snapshot.memory_percent(),
            snapshot.network.value,
            self.stale
        );
        Some(snapshot)
    }

    fn poll_gpu(&mut self) -> SensorResult<f64> {
        let every = self.settings.gpu_poll_every.max(1);
        if self.gpu_cache.is_none() || self.gpu_polls % every == 0 {
            let reading = self.source.gpu_percent().and_then(|pct| finite(Sensor::Gpu, pct));
            self.gpu_cache = Some(reading);
        }
        self.gpu_polls = self.gpu_polls.wrapping_add(1);
        match &self.gpu_cache {
            Some(reading) => reading.clone(),
            None => Err(SensorError::Unsupported { sensor: Sensor::Gpu }),
        }
    }

    fn sample_network(&mut self, now: Instant) {
        match self.source.network() {
            Ok(totals) => {
                self.stale.recovered(Sensor::Network);
                let counter = NetworkCounter {
                    bytes_sent: totals.bytes_sent,
                    bytes_recv: totals.bytes_recv,
                    observed_at: now,
                };
                let rate = self.rates.observe_network(&counter);
                if let Some(rate) = rate {
                    self.store.append(MetricKind::NetworkSent, Sample::new(now, rate.sent_bps));
                    self.store.append(MetricKind::NetworkRecv, Sample::new(now, rate.recv_bps));
                }
                // The first reading only sets the baseline, so there is no rate yet.
                self.last.network = Reading {
                    value: rate,
                    stale: false,
                };
            }
            Err(err) => {
                self.stale.failed(&err);
                self.last.network.stale = true;
            }
        }
    }

    fn network_load(&self) -> f64 {
        let Some(rate) = fresh_value(&self.last.network) else {
            return 0.0;
        };
        let peak = self
            .store
            .peak(MetricKind::NetworkRecv)
            .unwrap_or(0.0)
            .max(NETWORK_LOAD_FLOOR_BPS);
        (rate.recv_bps / peak * 100.0).min(100.0)
    }

    fn assemble(&self, now: Instant) -> SystemSnapshot {
        let processes = self.last.processes.get().map(Vec::as_slice).unwrap_or(&[]);
        let active: Vec<_> = processes
            .iter()
            .filter(|process| process.score() > 0.0)
            .cloned()
            .collect();
        let top_processes = top_k(&active, self.settings.top_k);
        let top_shares = shares(&top_processes);
        let activity = group_by_name(
            processes,
            self.settings.min_activity_cpu,
            self.settings.max_process_rows,
        );

        let zones = Zones {
            cpu: classify(self.last.cpu.get().copied().unwrap_or(f64::NAN)).zone,
            memory: classify(
                self.last
                    .memory
                    .get()
                    .map(|memory| memory.percent())
                    .unwrap_or(f64::NAN),
            )
            .zone,
            gpu: classify(self.last.gpu.get().copied().unwrap_or(f64::NAN)).zone,
            battery: battery_zone(
                self.last
                    .battery
                    .get()
                    .map(|status| status.percent)
                    .unwrap_or(f64::NAN),
            )
            .zone,
        };

        SystemSnapshot {
            sequence: self.sequence,
            taken_at: now,
            cpu_percent: self.last.cpu.clone(),
            memory: self.last.memory.clone(),
            gpu_percent: self.last.gpu.clone(),
            battery: self.last.battery.clone(),
            network: self.last.network.clone(),
            network_load: self.network_load(),
            disks: self.last.disks.clone(),
            processes: self.last.processes.clone(),
            top_processes,
            top_shares,
            activity,
            zones,
            history: self
                .store
                .kinds()
                .map(|kind| (kind, self.store.to_vec(kind)))
                .collect(),
        }
    }
}

/// NaN or infinite percentages count as a failed read.
fn finite(sensor: Sensor, value: f64) -> SensorResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SensorError::unavailable(sensor, format!("non-finite reading {value}")))
    }
}

fn fresh_value<T>(reading: &Reading<T>) -> Option<&T> {
    if reading.stale {
        None
    } else {
        reading.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Zone;
    use crate::source::{ScriptedSource, ScriptedTick};
    use std::time::Duration;

    fn settings() -> SamplerSettings {
        SamplerSettings::default()
            .with_interval(Duration::from_secs(1))
            .with_history_length(5)
    }

    fn collector(script: Vec<ScriptedTick>) -> Collector<ScriptedSource> {
        Collector::new(ScriptedSource::new(script), settings()).unwrap()
    }

    fn at(start: Instant, secs: u64) -> Instant {
        start + Duration::from_secs(secs)
    }

    #[test]
    fn rejects_invalid_settings() {
        let result = Collector::new(
            ScriptedSource::default(),
            SamplerSettings::default().with_history_length(0),
        );
        assert!(matches!(result, Err(SettingsError::ZeroCapacity)));
    }

    #[test]
    fn failed_battery_keeps_last_value_others_stay_fresh() {
        let mut collector = collector(vec![
            ScriptedTick::default().cpu(20.0).battery(55.0, false).network(0, 0),
            ScriptedTick::default()
                .cpu(30.0)
                .fail(Sensor::Battery)
                .network(1000, 2000),
        ]);
        let start = Instant::now();
        collector.tick(start).unwrap();
        let snapshot = collector.tick(at(start, 1)).unwrap();

        assert!(snapshot.battery.stale);
        assert_eq!(snapshot.battery.get().map(|b| b.percent), Some(55.0));
        assert!(!snapshot.cpu_percent.stale);
        assert_eq!(snapshot.cpu_percent.get(), Some(&30.0));
        assert!(!snapshot.memory.stale);
        assert!(!snapshot.network.stale);
        assert_eq!(
            snapshot.network.get(),
            Some(&NetworkRate {
                sent_bps: 1000.0,
                recv_bps: 2000.0
            })
        );
        // The stale battery value is not charted twice.
        assert_eq!(snapshot.series(MetricKind::Battery).len(), 1);
        assert_eq!(snapshot.series(MetricKind::Cpu).len(), 2);
    }

    #[test]
    fn sensor_that_never_worked_is_stale_and_empty() {
        let mut collector = collector(vec![ScriptedTick::default().fail(Sensor::Gpu)]);
        let snapshot = collector.tick(Instant::now()).unwrap();
        assert!(snapshot.gpu_percent.stale);
        assert_eq!(snapshot.gpu_percent.get(), None);
        assert_eq!(snapshot.zones.gpu, Zone::Normal);
        assert!(snapshot.has_stale());
    }

    #[test]
    fn recovered_sensor_is_fresh_again() {
        let mut collector = collector(vec![
            ScriptedTick::default().cpu(10.0),
            ScriptedTick::default().fail(Sensor::Cpu),
            ScriptedTick::default().cpu(70.0),
        ]);
        let start = Instant::now();
        collector.tick(start);
        assert!(collector.tick(at(start, 1)).unwrap().cpu_percent.stale);
        let snapshot = collector.tick(at(start, 2)).unwrap();
        assert!(!snapshot.cpu_percent.stale);
        assert_eq!(snapshot.zones.cpu, Zone::Warning);
    }

    #[test]
    fn nan_reading_is_treated_as_failure() {
        let mut collector = collector(vec![
            ScriptedTick::default().cpu(42.0),
            ScriptedTick::default().cpu(f64::NAN),
        ]);
        let start = Instant::now();
        collector.tick(start);
        let snapshot = collector.tick(at(start, 1)).unwrap();
        assert!(snapshot.cpu_percent.stale);
        assert_eq!(snapshot.cpu_percent.get(), Some(&42.0));
        assert_eq!(collector.store().len(MetricKind::Cpu), 1);
    }

    #[test]
    fn early_tick_is_skipped() {
        let mut collector = collector(vec![ScriptedTick::default()]);
        let start = Instant::now();
        assert!(collector.tick(start).is_some());
        assert!(collector.tick(start + Duration::from_millis(10)).is_none());
        assert_eq!(collector.store().len(MetricKind::Cpu), 1);
        assert_eq!(collector.source().read_counts().get(Sensor::Cpu), 1);

        let snapshot = collector.tick(at(start, 1)).unwrap();
        assert_eq!(snapshot.sequence, 2);
        assert_eq!(collector.store().len(MetricKind::Cpu), 2);
    }

    #[test]
    fn at_most_one_tick_per_interval() {
        let mut collector = collector(vec![ScriptedTick::default()]);
        let start = Instant::now();
        assert!(collector.tick(start).is_some());
        assert!(collector.tick(start + Duration::from_millis(760)).is_none());
        assert!(collector.tick(start + Duration::from_millis(900)).is_none());
        assert!(collector.tick(start + Duration::from_millis(1000)).is_some());
        // The gate counts from the last accepted tick, not the last attempt.
        assert!(collector.tick(start + Duration::from_millis(1520)).is_none());
        assert!(collector.tick(at(start, 2)).is_some());
        assert_eq!(collector.store().len(MetricKind::Cpu), 3);
    }

    #[test]
    fn history_is_bounded() {
        let script = (0..8).map(|i| ScriptedTick::default().cpu(i as f64)).collect();
        let mut collector = collector(script);
        let start = Instant::now();
        let mut last = None;
        for i in 0..8 {
            last = collector.tick(at(start, i));
        }
        let snapshot = last.unwrap();
        let values: Vec<_> = snapshot.series(MetricKind::Cpu).iter().map(|s| s.value).collect();
        assert_eq!(values, vec![3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn first_network_reading_has_no_rate() {
        let mut collector = collector(vec![
            ScriptedTick::default().network(500, 500),
            ScriptedTick::default().network(100, 100),
        ]);
        let start = Instant::now();
        let first = collector.tick(start).unwrap();
        assert_eq!(first.network.get(), None);
        assert!(!first.network.stale);
        assert!(first.series(MetricKind::NetworkRecv).is_empty());

        // Counter went backwards: zero, not negative.
        let second = collector.tick(at(start, 2)).unwrap();
        assert_eq!(second.network.get(), Some(&NetworkRate::default()));
        assert_eq!(second.network_load, 0.0);
    }

    #[test]
    fn network_load_is_relative_to_recent_peak() {
        let mut collector = collector(vec![
            ScriptedTick::default().network(0, 0),
            ScriptedTick::default().network(0, 10_000),
            ScriptedTick::default().network(0, 15_000),
        ]);
        let start = Instant::now();
        collector.tick(start);
        assert_eq!(collector.tick(at(start, 1)).unwrap().network_load, 100.0);
        assert_eq!(collector.tick(at(start, 2)).unwrap().network_load, 50.0);
    }

    #[test]
    fn gpu_is_polled_every_other_tick() {
        let mut collector = collector(vec![
            ScriptedTick::default().gpu(10.0),
            ScriptedTick::default().gpu(20.0),
            ScriptedTick::default().gpu(30.0),
        ]);
        let start = Instant::now();
        assert_eq!(collector.tick(start).unwrap().gpu_percent.get(), Some(&10.0));
        assert_eq!(collector.tick(at(start, 1)).unwrap().gpu_percent.get(), Some(&10.0));
        assert_eq!(collector.tick(at(start, 2)).unwrap().gpu_percent.get(), Some(&30.0));
        assert_eq!(collector.source().read_counts().get(Sensor::Gpu), 2);
    }

    #[test]
    fn processes_are_ranked_grouped_and_shared() {
        let process = |pid, name: &str, cpu| ProcessSnapshot {
            pid,
            name: name.to_string(),
            cpu_percent: cpu,
            energy_score: None,
        };
        let mut collector = collector(vec![ScriptedTick::default().processes(vec![
            process(30, "idle", 0.0),
            process(12, "worker", 10.0),
            process(11, "worker", 20.0),
            process(5, "ui", 60.0),
        ])]);
        let snapshot = collector.tick(Instant::now()).unwrap();

        let ranked: Vec<_> = snapshot.processes.get().unwrap().iter().map(|p| p.pid).collect();
        assert_eq!(ranked, vec![5, 11, 12, 30]);
        let top: Vec<_> = snapshot.top_processes.iter().map(|p| p.pid).collect();
        assert_eq!(top, vec![5, 11, 12]);
        assert_eq!(snapshot.top_shares, vec![60.0 / 90.0, 20.0 / 90.0, 10.0 / 90.0]);

        let names: Vec<_> = snapshot.activity.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["ui", "worker"]);
        assert_eq!(snapshot.activity[0].zone, Zone::Warning);
        assert_eq!(snapshot.activity[1].pids, vec![11, 12]);
    }

    #[test]
    fn top_processes_are_capped_by_settings() {
        let processes = (1..=8)
            .map(|pid| ProcessSnapshot {
                pid,
                name: format!("p{pid}"),
                cpu_percent: pid as f32,
                energy_score: None,
            })
            .collect();
        let mut collector = Collector::new(
            ScriptedSource::new(vec![ScriptedTick::default().processes(processes)]),
            settings().with_top_k(3),
        )
        .unwrap();
        let snapshot = collector.tick(Instant::now()).unwrap();
        let top: Vec<_> = snapshot.top_processes.iter().map(|p| p.pid).collect();
        assert_eq!(top, vec![8, 7, 6]);
        assert_eq!(snapshot.top_shares.len(), 3);
        assert_eq!(snapshot.processes.get().map(Vec::len), Some(8));
    }

    #[test]
    fn zones_follow_readings() {
        let mut collector = collector(vec![ScriptedTick::default()
            .cpu(90.0)
            .memory(7, 10)
            .gpu(10.0)
            .battery(12.0, false)]);
        let snapshot = collector.tick(Instant::now()).unwrap();
        assert_eq!(
            snapshot.zones,
            Zones {
                cpu: Zone::Critical,
                memory: Zone::Warning,
                gpu: Zone::Normal,
                battery: Zone::Critical,
            }
        );
    }

    #[test]
    fn volumes_are_capped() {
        let disk = |n: usize| DiskSnapshot {
            volume_name: format!("v{n}"),
            mount_point: format!("/Volumes/v{n}"),
            total_bytes: 100,
            used_bytes: 10,
        };
        let mut collector = collector(vec![ScriptedTick::default().disks((0..10).map(disk).collect())]);
        let snapshot = collector.tick(Instant::now()).unwrap();
        assert_eq!(snapshot.disks.get().unwrap().len(), 6);
    }
}
