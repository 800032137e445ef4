//! Severity zones for color-coded display.
//!
//! Load percentages (CPU, RAM, GPU, per-process CPU) go green → yellow → red
//! as they rise. Battery charge uses the inverted scale.

/// Upper bound (exclusive) of the normal zone for load metrics.
pub const WARNING_THRESHOLD: f64 = 60.0;
/// Lower bound (inclusive) of the critical zone for load metrics.
pub const CRITICAL_THRESHOLD: f64 = 85.0;

/// Battery charge strictly above this is normal.
pub const BATTERY_NORMAL_ABOVE: f64 = 40.0;
/// Battery charge strictly above this (and not normal) is a warning.
pub const BATTERY_WARNING_ABOVE: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, serde::Deserialize, serde::Serialize)]
pub enum Zone {
    #[default]
    Normal,
    Warning,
    Critical,
}

/// Zone plus whether the input was unusable (NaN from a failed sensor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub zone: Zone,
    pub stale: bool,
}

/// Clamps into `[0, 100]`; NaN becomes 0.
fn normalize(percent: f64) -> (f64, bool) {
    if percent.is_nan() {
        (0.0, true)
    } else {
        (percent.clamp(0.0, 100.0), false)
    }
}

/// Zone for a load percentage. Lower edges are inclusive.
pub fn zone(percent: f64) -> Zone {
    classify(percent).zone
}

pub fn classify(percent: f64) -> Classification {
    let (percent, stale) = normalize(percent);
    let zone = if percent < WARNING_THRESHOLD {
        Zone::Normal
    } else if percent < CRITICAL_THRESHOLD {
        Zone::Warning
    } else {
        Zone::Critical
    };
    Classification { zone, stale }
}

/// Zone for a battery charge percentage, where low is bad.
pub fn battery_zone(percent: f64) -> Classification {
    let (percent, stale) = normalize(percent);
    if stale {
        return Classification {
            zone: Zone::Normal,
            stale,
        };
    }
    let zone = if percent > BATTERY_NORMAL_ABOVE {
        Zone::Normal
    } else if percent > BATTERY_WARNING_ABOVE {
        Zone::Warning
    } else {
        Zone::Critical
    };
    Classification { zone, stale }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_boundaries() {
        assert_eq!(zone(0.0), Zone::Normal);
        assert_eq!(zone(59.9), Zone::Normal);
        assert_eq!(zone(60.0), Zone::Warning);
        assert_eq!(zone(84.9), Zone::Warning);
        assert_eq!(zone(85.0), Zone::Critical);
        assert_eq!(zone(100.0), Zone::Critical);
    }

    #[test]
    fn out_of_range_is_clamped() {
        assert_eq!(zone(150.0), Zone::Critical);
        assert_eq!(zone(-20.0), Zone::Normal);
        assert!(!classify(150.0).stale);
    }

    #[test]
    fn nan_is_normal_and_stale() {
        let class = classify(f64::NAN);
        assert_eq!(class.zone, Zone::Normal);
        assert!(class.stale);
    }

    #[test]
    fn battery_scale_is_inverted() {
        assert_eq!(battery_zone(100.0).zone, Zone::Normal);
        assert_eq!(battery_zone(40.1).zone, Zone::Normal);
        assert_eq!(battery_zone(40.0).zone, Zone::Warning);
        assert_eq!(battery_zone(15.1).zone, Zone::Warning);
        assert_eq!(battery_zone(15.0).zone, Zone::Critical);
        assert_eq!(battery_zone(-5.0).zone, Zone::Critical);
        assert!(battery_zone(f64::NAN).stale);
    }
}
