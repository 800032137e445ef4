//! Battery and GPU readers backed by Linux sysfs. Other platforms report the
//! sensors as unsupported.
#![cfg_attr(not(target_os = "linux"), allow(dead_code))]

use crate::error::{Sensor, SensorError, SensorResult};
use crate::metrics::BatteryStatus;
use std::time::Duration;

#[cfg(target_os = "linux")]
const POWER_SUPPLY: &str = "/sys/class/power_supply";
#[cfg(target_os = "linux")]
const DRM: &str = "/sys/class/drm";

/// Raw attribute values of one `BAT*` power supply.
#[derive(Debug, Default)]
pub(super) struct BatteryAttributes {
    pub capacity: String,
    pub status: String,
    /// `energy_now` (µWh) or `charge_now` (µAh).
    pub remaining: Option<String>,
    /// `power_now` (µW) or `current_now` (µA), matching `remaining`.
    pub drain: Option<String>,
}

pub(super) fn parse_battery(attrs: &BatteryAttributes) -> SensorResult<BatteryStatus> {
    let percent: f64 = attrs
        .capacity
        .trim()
        .parse()
        .map_err(|_| SensorError::unavailable(Sensor::Battery, format!("bad capacity {:?}", attrs.capacity)))?;
    let status = attrs.status.trim();
    let charging = matches!(status, "Charging" | "Full");

    let time_left = if charging {
        None
    } else {
        let remaining = attrs.remaining.as_deref().and_then(|s| s.trim().parse::<f64>().ok());
        let drain = attrs.drain.as_deref().and_then(|s| s.trim().parse::<f64>().ok());
        match (remaining, drain) {
            (Some(remaining), Some(drain)) if drain > 0.0 => {
                Duration::try_from_secs_f64(remaining / drain * 3600.0).ok()
            }
            _ => None,
        }
    };

    Ok(BatteryStatus {
        percent,
        charging,
        time_left,
    })
}

/// `gpu_busy_percent` as exposed by amdgpu.
pub(super) fn parse_gpu_busy(raw: &str) -> SensorResult<f64> {
    raw.trim()
        .parse::<f64>()
        .map(|pct| pct.min(100.0))
        .map_err(|_| SensorError::unavailable(Sensor::Gpu, format!("bad gpu_busy_percent {raw:?}")))
}

#[cfg(target_os = "linux")]
pub(super) fn battery() -> SensorResult<BatteryStatus> {
    use std::fs;

    let unavailable = |err: std::io::Error| SensorError::unavailable(Sensor::Battery, err.to_string());
    for entry in fs::read_dir(POWER_SUPPLY).map_err(unavailable)? {
        let path = entry.map_err(unavailable)?.path();
        let is_battery = path
            .file_name()
            .map(|name| name.to_string_lossy().starts_with("BAT"))
            .unwrap_or(false);
        if !is_battery {
            continue;
        }

        let read = |attr: &str| fs::read_to_string(path.join(attr)).ok();
        let (remaining, drain) = match read("energy_now") {
            Some(energy) => (Some(energy), read("power_now")),
            None => (read("charge_now"), read("current_now")),
        };
        let attrs = BatteryAttributes {
            capacity: fs::read_to_string(path.join("capacity")).map_err(unavailable)?,
            status: read("status").unwrap_or_default(),
            remaining,
            drain,
        };
        return parse_battery(&attrs);
    }
    Err(SensorError::Unsupported {
        sensor: Sensor::Battery,
    })
}

#[cfg(not(target_os = "linux"))]
pub(super) fn battery() -> SensorResult<BatteryStatus> {
    Err(SensorError::Unsupported {
        sensor: Sensor::Battery,
    })
}

#[cfg(target_os = "linux")]
pub(super) fn gpu_percent() -> SensorResult<f64> {
    use std::fs;

    let entries = fs::read_dir(DRM).map_err(|_| SensorError::Unsupported { sensor: Sensor::Gpu })?;
    for entry in entries.flatten() {
        let busy = entry.path().join("device").join("gpu_busy_percent");
        if let Ok(raw) = fs::read_to_string(&busy) {
            return parse_gpu_busy(&raw);
        }
    }
    Err(SensorError::Unsupported { sensor: Sensor::Gpu })
}

#[cfg(not(target_os = "linux"))]
pub(super) fn gpu_percent() -> SensorResult<f64> {
    Err(SensorError::Unsupported { sensor: Sensor::Gpu })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discharging_battery_estimates_time_left() {
        let attrs = BatteryAttributes {
            capacity: "57\n".into(),
            status: "Discharging\n".into(),
            remaining: Some("30000000\n".into()),
            drain: Some("15000000\n".into()),
        };
        let status = parse_battery(&attrs).unwrap();
        assert_eq!(status.percent, 57.0);
        assert!(!status.charging);
        assert_eq!(status.time_left, Some(Duration::from_secs(2 * 3600)));
    }

    #[test]
    fn charging_battery_has_no_time_left() {
        let attrs = BatteryAttributes {
            capacity: "80".into(),
            status: "Charging".into(),
            remaining: Some("1".into()),
            drain: Some("1".into()),
        };
        let status = parse_battery(&attrs).unwrap();
        assert!(status.charging);
        assert_eq!(status.time_left, None);
    }

    #[test]
    fn zero_drain_means_unknown_time_left() {
        let attrs = BatteryAttributes {
            capacity: "80".into(),
            status: "Discharging".into(),
            remaining: Some("100".into()),
            drain: Some("0".into()),
        };
        assert_eq!(parse_battery(&attrs).unwrap().time_left, None);
    }

    #[test]
    fn unrepresentable_time_left_is_unknown() {
        let attrs = BatteryAttributes {
            capacity: "50".into(),
            status: "Discharging".into(),
            remaining: Some("inf".into()),
            drain: Some("1".into()),
        };
        assert_eq!(parse_battery(&attrs).unwrap().time_left, None);

        let attrs = BatteryAttributes {
            remaining: Some("1e300".into()),
            drain: Some("1e-300".into()),
            ..attrs
        };
        assert_eq!(parse_battery(&attrs).unwrap().time_left, None);
    }

    #[test]
    fn garbage_capacity_is_unavailable() {
        let attrs = BatteryAttributes {
            capacity: "n/a".into(),
            ..Default::default()
        };
        let err = parse_battery(&attrs).unwrap_err();
        assert_eq!(err.sensor(), Sensor::Battery);
    }

    #[test]
    fn gpu_busy_is_capped() {
        assert_eq!(parse_gpu_busy("42\n").unwrap(), 42.0);
        assert_eq!(parse_gpu_busy("130").unwrap(), 100.0);
        assert!(parse_gpu_busy("").is_err());
    }
}
