//! Display formatting for counters and clock times

/// Compact counter: `999`, `1.5K`, `2.3M`
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// `m:ss` clock time
pub fn format_clock(total_seconds: u64) -> String {
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Minutes listened, rounded for display
pub fn format_minutes(minutes: f64) -> String {
    if minutes < 1.0 {
        format!("{}s", (minutes * 60.0).round() as u64)
    } else {
        format!("{:.1} min", minutes)
    }
}
