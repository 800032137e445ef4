use super::{sysfs, MetricSource, NetworkTotals};
use crate::error::{Sensor, SensorError, SensorResult};
use crate::metrics::{BatteryStatus, DiskSnapshot, MemoryUsage, ProcessSnapshot};
use log::debug;
use std::path::Path;
use sysinfo::{Disks, Networks, Process, ProcessesToUpdate, System};

/// Mount points a user would recognise as their own volumes.
const VOLUME_PREFIXES: [&str; 4] = ["/Volumes/", "/media/", "/run/media/", "/mnt/"];

pub fn is_user_volume(mount_point: &Path) -> bool {
    let mount = mount_point.to_string_lossy();
    mount == "/" || VOLUME_PREFIXES.iter().any(|prefix| mount.starts_with(prefix))
}

/// `/` for the root volume, otherwise the last path component.
pub fn volume_display_name(mount_point: &Path) -> String {
    match mount_point.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => mount_point.to_string_lossy().into_owned(),
    }
}

/// Reads the live machine through `sysinfo`, with sysfs for battery and GPU.
pub struct SysinfoSource {
    system: System,
    disks: Disks,
    networks: Networks,
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoSource {
    pub fn new() -> Self {
        let mut system = System::new();
        // CPU usage is a delta; prime it so the first tick has a baseline.
        system.refresh_cpu_usage();
        system.refresh_processes(ProcessesToUpdate::All, true);
        Self {
            system,
            disks: Disks::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
        }
    }

    fn collect_process_info(process: &Process) -> ProcessSnapshot {
        ProcessSnapshot {
            pid: process.pid().as_u32(),
            name: process.name().to_string_lossy().into_owned(),
            cpu_percent: process.cpu_usage(),
            energy_score: None,
        }
    }
}

impl MetricSource for SysinfoSource {
    fn refresh(&mut self) {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();
        let updated = self.system.refresh_processes(ProcessesToUpdate::All, true);
        self.disks.refresh(true);
        self.networks.refresh(true);
        debug!("Refreshed {} processes", updated);
    }

    fn cpu_percent(&mut self) -> SensorResult<f64> {
        if self.system.cpus().is_empty() {
            return Err(SensorError::unavailable(Sensor::Cpu, "no CPUs reported"));
        }
        Ok(self.system.global_cpu_usage() as f64)
    }

    fn memory(&mut self) -> SensorResult<MemoryUsage> {
        let total_bytes = self.system.total_memory();
        if total_bytes == 0 {
            return Err(SensorError::unavailable(Sensor::Memory, "total memory reported as zero"));
        }
        Ok(MemoryUsage {
            used_bytes: self.system.used_memory(),
            total_bytes,
        })
    }

    fn gpu_percent(&mut self) -> SensorResult<f64> {
        sysfs::gpu_percent()
    }

    fn battery(&mut self) -> SensorResult<BatteryStatus> {
        sysfs::battery()
    }

    fn processes(&mut self) -> SensorResult<Vec<ProcessSnapshot>> {
        let processes: Vec<_> = self
            .system
            .processes()
            .values()
            .filter(|process| process.thread_kind().is_none())
            .map(Self::collect_process_info)
            .collect();
        if processes.is_empty() {
            return Err(SensorError::unavailable(Sensor::Processes, "process table is empty"));
        }
        Ok(processes)
    }

    fn disks(&mut self) -> SensorResult<Vec<DiskSnapshot>> {
        let mut volumes: Vec<_> = self
            .disks
            .list()
            .iter()
            .filter(|disk| is_user_volume(disk.mount_point()))
            .map(|disk| {
                let total_bytes = disk.total_space();
                DiskSnapshot {
                    volume_name: volume_display_name(disk.mount_point()),
                    mount_point: disk.mount_point().to_string_lossy().into_owned(),
                    total_bytes,
                    used_bytes: total_bytes.saturating_sub(disk.available_space()),
                }
            })
            .collect();
        // The same device can be mounted more than once.
        volumes.sort_by(|a, b| a.mount_point.cmp(&b.mount_point));
        volumes.dedup_by(|a, b| a.mount_point == b.mount_point);
        Ok(volumes)
    }

    fn network(&mut self) -> SensorResult<NetworkTotals> {
        let interfaces = self.networks.list();
        if interfaces.is_empty() {
            return Err(SensorError::unavailable(Sensor::Network, "no network interfaces"));
        }
        Ok(interfaces
            .iter()
            .filter(|(name, _)| !matches!(name.as_str(), "lo" | "lo0"))
            .fold(NetworkTotals::default(), |totals, (_, data)| NetworkTotals {
                bytes_sent: totals.bytes_sent.saturating_add(data.total_transmitted()),
                bytes_recv: totals.bytes_recv.saturating_add(data.total_received()),
            }))
    }
}
