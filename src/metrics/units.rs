use std::time::Duration;

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Copy, PartialEq)]
pub enum RateUnit {
    Bytes,
    Kilobytes,
    Megabytes,
}

impl RateUnit {
    /// Largest unit that keeps the value at or above one.
    pub fn for_rate(bytes_per_sec: f64) -> Self {
        if bytes_per_sec >= MIB {
            RateUnit::Megabytes
        } else if bytes_per_sec >= KIB {
            RateUnit::Kilobytes
        } else {
            RateUnit::Bytes
        }
    }

    pub fn format_value(&self, bytes: f64) -> (f64, &'static str) {
        match self {
            RateUnit::Bytes => (bytes, "B/s"),
            RateUnit::Kilobytes => (bytes / KIB, "KB/s"),
            RateUnit::Megabytes => (bytes / MIB, "MB/s"),
        }
    }
}

pub fn format_rate(bytes_per_sec: f64) -> String {
    let unit = RateUnit::for_rate(bytes_per_sec);
    let (value, suffix) = unit.format_value(bytes_per_sec);
    match unit {
        RateUnit::Bytes => format!("{value:.0} {suffix}"),
        _ => format!("{value:.1} {suffix}"),
    }
}

pub fn format_gib(bytes: u64) -> String {
    format!("{:.1} GB", bytes as f64 / GIB)
}

/// `~H:MM left`
pub fn format_time_left(time_left: Duration) -> String {
    let secs = time_left.as_secs();
    format!("~{}:{:02} left", secs / 3600, (secs % 3600) / 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates() {
        assert_eq!(format_rate(0.0), "0 B/s");
        assert_eq!(format_rate(1023.0), "1023 B/s");
        assert_eq!(format_rate(1024.0), "1.0 KB/s");
        assert_eq!(format_rate(1536.0), "1.5 KB/s");
        assert_eq!(format_rate(3.0 * 1048576.0), "3.0 MB/s");
    }

    #[test]
    fn gib_and_time_left() {
        assert_eq!(format_gib(8 * 1024 * 1024 * 1024), "8.0 GB");
        assert_eq!(format_time_left(Duration::from_secs(2 * 3600 + 5 * 60 + 59)), "~2:05 left");
    }
}
