//! Display helpers shared by the timer panel and step controls

/// `MM:SS`, minutes unbounded
pub fn format_mm_ss(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Elapsed share of the duration as a whole percentage in `0..=100`
pub fn progress_pct(duration: u64, remaining: u64) -> u8 {
    if duration == 0 {
        return 0;
    }
    let elapsed = duration.saturating_sub(remaining) as f64;
    (elapsed / duration as f64 * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Server uptime as `1h 2m 3s`, dropping leading zero units
pub fn format_uptime(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_mm_ss(0), "00:00");
        assert_eq!(format_mm_ss(65), "01:05");
        assert_eq!(format_mm_ss(6000), "100:00");
    }

    #[test]
    fn progress_is_bounded() {
        assert_eq!(progress_pct(0, 0), 0);
        assert_eq!(progress_pct(60, 60), 0);
        assert_eq!(progress_pct(60, 15), 75);
        assert_eq!(progress_pct(60, 0), 100);
        // Snoozed past the original duration
        assert_eq!(progress_pct(60, 120), 0);
    }

    #[test]
    fn uptime_drops_leading_units() {
        assert_eq!(format_uptime(5), "5s");
        assert_eq!(format_uptime(125), "2m 5s");
        assert_eq!(format_uptime(3725), "1h 2m 5s");
    }
}
