//! Time formatting helpers

use std::time::Duration;

/// Format a number of seconds as a zero-padded `MM:SS` clock.
///
/// Minutes are not wrapped into hours, so 3600 seconds renders as `60:00`.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Format an uptime duration as a short human readable string
pub fn format_uptime(duration: Duration) -> String {
    let hours = duration.as_secs() / 3600;
    let minutes = (duration.as_secs() % 3600) / 60;
    let seconds = duration.as_secs() % 60;

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
    fn clock_is_zero_padded() {
        let cases = [
            (0, "00:00"),
            (9, "00:09"),
            (59, "00:59"),
            (60, "01:00"),
            (600, "10:00"),
            (3599, "59:59"),
        ];
        for (seconds, expected) in cases {
            assert_eq!(format_clock(seconds), expected, "{} seconds", seconds);
        }
    }

    #[test]
    fn clock_keeps_counting_minutes_past_an_hour() {
        assert_eq!(format_clock(5400), "90:00");
    }

    #[test]
    fn uptime_picks_largest_unit() {
        assert_eq!(format_uptime(Duration::from_secs(42)), "42s");
        assert_eq!(format_uptime(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_uptime(Duration::from_secs(3725)), "1h 2m 5s");
    }
}
