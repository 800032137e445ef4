#![warn(clippy::all, rust_2018_idioms)]

use log::{error, info};
use std::thread;
use sysmon::metrics::units::{format_gib, format_rate, format_time_left};
use sysmon::{SamplerSettings, Sampler, SysinfoSource, SystemSnapshot};

// Headless stand-in for the widget: logs every snapshot.
// Usage: sysmon [TICKS]  (runs forever without TICKS)
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let ticks = match std::env::args().nth(1).map(|arg| arg.parse::<u64>()) {
        None => None,
        Some(Ok(ticks)) => Some(ticks),
        Some(Err(err)) => {
            error!("Invalid tick count: {}", err);
            std::process::exit(2);
        }
    };

    let settings = SamplerSettings::default();
    let interval = settings.update_interval();
    let mut sampler = match Sampler::new(SysinfoSource::new(), settings) {
        Ok(sampler) => sampler,
        Err(err) => {
            error!("Invalid settings: {}", err);
            std::process::exit(2);
        }
    };
    if let Err(err) = sampler.start() {
        error!("Failed to start sampler: {}", err);
        std::process::exit(1);
    }

    let reader = sampler.reader();
    let mut seen = 0;
    while ticks.map_or(true, |ticks| seen < ticks) {
        thread::sleep(interval / 4);
        let Some(snapshot) = reader.latest() else {
            continue;
        };
        if snapshot.sequence == seen {
            continue;
        }
        seen = snapshot.sequence;
        log_snapshot(&snapshot);
    }

    sampler.stop();
}

fn stale_marker(stale: bool) -> &'static str {
    if stale {
        " (stale)"
    } else {
        ""
    }
}

fn log_snapshot(snapshot: &SystemSnapshot) {
    let zones = &snapshot.zones;
    match snapshot.cpu_percent.get() {
        Some(cpu) => info!(
            "CPU {:5.1}% [{:?}]{}",
            cpu,
            zones.cpu,
            stale_marker(snapshot.cpu_percent.stale)
        ),
        None => info!("CPU N/A"),
    }
    match snapshot.memory.get() {
        Some(memory) => info!(
            "RAM {}/{} ({:.1}%) [{:?}]{}",
            format_gib(memory.used_bytes),
            format_gib(memory.total_bytes),
            memory.percent(),
            zones.memory,
            stale_marker(snapshot.memory.stale)
        ),
        None => info!("RAM N/A"),
    }
    match snapshot.gpu_percent.get() {
        Some(gpu) => info!("GPU {:5.1}% [{:?}]{}", gpu, zones.gpu, stale_marker(snapshot.gpu_percent.stale)),
        None => info!("GPU N/A"),
    }
    match snapshot.battery.get() {
        Some(battery) => {
            let status = match (battery.charging, battery.time_left) {
                (true, _) => "Charging".to_string(),
                (false, Some(left)) => format_time_left(left),
                (false, None) => "On Battery".to_string(),
            };
            info!(
                "Battery {:.0}% {} [{:?}]{}",
                battery.percent,
                status,
                zones.battery,
                stale_marker(snapshot.battery.stale)
            );
        }
        None => info!("Battery N/A"),
    }
    match snapshot.network.get() {
        Some(rate) => info!(
            "NET \u{2193}{} \u{2191}{} (load {:.0}%){}",
            format_rate(rate.recv_bps),
            format_rate(rate.sent_bps),
            snapshot.network_load,
            stale_marker(snapshot.network.stale)
        ),
        None => info!("NET --"),
    }
    for disk in snapshot.disks.get().into_iter().flatten() {
        info!(
            "Disk {} used {} / {} ({:.1}%), avail {}",
            disk.volume_name,
            format_gib(disk.used_bytes),
            format_gib(disk.total_bytes),
            disk.used_percent(),
            format_gib(disk.available_bytes())
        );
    }
    for (process, share) in snapshot.top_processes.iter().zip(&snapshot.top_shares) {
        info!(
            "  {:<16} pid {:>7} {:5.1}% ({:.0}% of top)",
            process.name,
            process.pid,
            process.cpu_percent,
            share * 100.0
        );
    }
}
