use super::{zone, ProcessGroup, ProcessSnapshot};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Higher score first; ties go to the lower pid.
fn by_score_then_pid(a_score: f32, a_pid: u32, b_score: f32, b_pid: u32) -> Ordering {
    b_score.total_cmp(&a_score).then_with(|| a_pid.cmp(&b_pid))
}

/// Every process, ranked by energy score (CPU% where energy is unknown),
/// ties broken by ascending pid.
pub fn rank_all(snapshots: &[ProcessSnapshot]) -> Vec<ProcessSnapshot> {
    let mut ranked = snapshots.to_vec();
    ranked.sort_by(|a, b| by_score_then_pid(a.score(), a.pid, b.score(), b.pid));
    ranked
}

/// The `k` highest ranked processes. `k` larger than the input is fine.
pub fn top_k(snapshots: &[ProcessSnapshot], k: usize) -> Vec<ProcessSnapshot> {
    let mut ranked = rank_all(snapshots);
    ranked.truncate(k);
    ranked
}

/// Merges processes by name, ranks the groups, and keeps at most
/// `max_rows` whose summed CPU% is above `min_cpu`.
pub fn group_by_name(
    snapshots: &[ProcessSnapshot],
    min_cpu: f32,
    max_rows: usize,
) -> Vec<ProcessGroup> {
    let mut groups: HashMap<&str, ProcessGroup> = HashMap::new();
    for process in snapshots {
        let group = groups
            .entry(process.name.as_str())
            .or_insert_with(|| ProcessGroup {
                name: process.name.clone(),
                cpu_percent: 0.0,
                energy_score: None,
                pids: Vec::new(),
                zone: Default::default(),
            });
        group.cpu_percent += process.cpu_percent;
        if let Some(energy) = process.energy_score {
            *group.energy_score.get_or_insert(0.0) += energy;
        }
        group.pids.push(process.pid);
    }

    let mut groups: Vec<_> = groups
        .into_values()
        .filter(|group| group.cpu_percent > min_cpu)
        .map(|mut group| {
            group.pids.sort_unstable();
            group.zone = zone(group.cpu_percent as f64);
            group
        })
        .collect();
    groups.sort_by(|a, b| by_score_then_pid(a.score(), a.lowest_pid(), b.score(), b.lowest_pid()));
    groups.truncate(max_rows);
    groups
}

/// Each entry's fraction of the summed score, for the donut chart. Empty if
/// the total is zero.
pub fn shares(ranked: &[ProcessSnapshot]) -> Vec<f32> {
    let total: f32 = ranked.iter().map(ProcessSnapshot::score).sum();
    if total <= 0.0 {
        return Vec::new();
    }
    ranked.iter().map(|p| p.score() / total).collect()
}
