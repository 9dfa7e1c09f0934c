//! Time parsing and formatting utilities for encoder I/O

/// Parse an encoder timemark (`HH:MM:SS.micro`, as in `out_time=` progress
/// lines) into seconds.
///
/// Returns `None` for `N/A`, negative marks emitted before the first frame,
/// and anything that is not three colon-separated numeric fields.
pub fn parse_timemark(mark: &str) -> Option<f64> {
    let mark = mark.trim();
    if mark.starts_with('-') {
        return None;
    }

    let mut parts = mark.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }

    let total = hours * 3600.0 + minutes * 60.0 + seconds;
    total.is_finite().then_some(total)
}

/// Elapsed seconds from one line of `-progress` output, if the line carries one
pub fn progress_elapsed(line: &str) -> Option<f64> {
    let (key, value) = line.trim().split_once('=')?;
    match key.trim() {
        "out_time" => parse_timemark(value),
        _ => None,
    }
}

/// Format seconds for `-ss`/`-t` arguments with millisecond precision
pub fn format_seconds_arg(seconds: f64) -> String {
    format!("{:.3}", seconds.max(0.0))
}
