// ── Human-facing formatters ──
//
// Pure functions behind the derived progress strings. Each returns an empty
// string for "nothing to show" so views can render the result unconditionally.

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// Transfer rate, e.g. `"1.5 KB/s"`. Empty for zero, negative or
/// non-finite rates.
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
pub fn format_speed(bytes_per_second: f64) -> String {
    let b = bytes_per_second;
    if !b.is_finite() || b <= 0.0 {
        return String::new();
    }
    if b >= MIB {
        format!("{:.1} MB/s", b / MIB)
    } else if b >= KIB {
        format!("{:.1} KB/s", b / KIB)
    } else {
        format!("{} B/s", b.round() as i64)
    }
}

/// Remaining time, e.g. `"2:05 remaining"`. Negative means unknown.
pub fn format_eta(secs: i64) -> String {
    match secs {
        s if s < 0 => String::new(),
        s if s < 60 => format!("{s}s remaining"),
        s if s < 3600 => format!("{}:{:02} remaining", s / 60, s % 60),
        s => format!("{}h {}m remaining", s / 3600, (s % 3600) / 60),
    }
}

/// `"3 of 10 files"`, or empty when there is nothing to count.
pub fn format_file_count(completed: u64, total: u64) -> String {
    if total == 0 {
        return String::new();
    }
    format!("{completed} of {total} files")
}

/// Byte count with binary units: `"512 B"`, `"1.5 KB"`, `"2.0 MB"`.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["KB", "MB", "GB", "TB", "PB", "EB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / KIB;
    let mut unit = UNITS[0];
    for &next in &UNITS[1..] {
        if value < KIB {
            break;
        }
        value /= KIB;
        unit = next;
    }
    format!("{value:.1} {unit}")
}

/// `"4.0 MB of 10.0 MB"`, or empty when the total is unknown.
pub fn format_transfer(transferred: u64, total: u64) -> String {
    if total == 0 {
        return String::new();
    }
    format!("{} of {}", format_bytes(transferred), format_bytes(total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_is_blank_without_throughput() {
        assert_eq!(format_speed(0.0), "");
        assert_eq!(format_speed(-5.0), "");
        assert_eq!(format_speed(f64::NAN), "");
        assert_eq!(format_speed(f64::INFINITY), "");
    }

    #[test]
    fn speed_picks_unit_by_magnitude() {
        assert_eq!(format_speed(512.0), "512 B/s");
        assert_eq!(format_speed(1023.4), "1023 B/s");
        assert_eq!(format_speed(1024.0), "1.0 KB/s");
        assert_eq!(format_speed(1536.0), "1.5 KB/s");
        assert_eq!(format_speed(1_048_576.0), "1.0 MB/s");
        assert_eq!(format_speed(2_097_152.0), "2.0 MB/s");
    }

    #[test]
    fn eta_formats() {
        assert_eq!(format_eta(-1), "");
        assert_eq!(format_eta(0), "0s remaining");
        assert_eq!(format_eta(45), "45s remaining");
        assert_eq!(format_eta(60), "1:00 remaining");
        assert_eq!(format_eta(125), "2:05 remaining");
        assert_eq!(format_eta(3599), "59:59 remaining");
        assert_eq!(format_eta(3600), "1h 0m remaining");
        assert_eq!(format_eta(7260), "2h 1m remaining");
    }

    #[test]
    fn file_count() {
        assert_eq!(format_file_count(0, 0), "");
        assert_eq!(format_file_count(3, 10), "3 of 10 files");
    }

    #[test]
    fn bytes_use_binary_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(2 * 1024 * 1024), "2.0 MB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5.0 GB");
        assert_eq!(format_bytes(u64::MAX), "16.0 EB");
    }

    #[test]
    fn transfer() {
        assert_eq!(format_transfer(10, 0), "");
        assert_eq!(
            format_transfer(4 * 1024 * 1024, 10 * 1024 * 1024),
            "4.0 MB of 10.0 MB"
        );
    }
}
