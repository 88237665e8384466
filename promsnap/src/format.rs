use chrono::{DateTime, Utc};

/// What a caller sees instead of a panic when asked to render ±Inf or NaN.
const NOT_AVAILABLE: &str = "n/a";

const BYTE_UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];

/// Scales large counts into `K`/`M`/`B` notation with a fixed number of
/// decimals; below 1000 the raw value is printed with the same decimals.
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }

    let (scaled, suffix) = if value.abs() >= 1e9 {
        (value / 1e9, "B")
    } else if value.abs() >= 1e6 {
        (value / 1e6, "M")
    } else if value.abs() >= 1e3 {
        (value / 1e3, "K")
    } else {
        (value, "")
    };

    format!("{:.*}{}", decimals, scaled, suffix)
}

/// Base-1024 byte sizes, one decimal with trailing zeros trimmed.
pub fn format_bytes(bytes: f64) -> String {
    if !bytes.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    if bytes == 0. {
        return "0 B".to_string();
    }

    let exp = (bytes.abs().ln() / 1024f64.ln()).floor().max(0.) as usize;
    let exp = exp.min(BYTE_UNITS.len() - 1);
    let scaled = bytes / 1024f64.powi(exp as i32);

    format!("{} {}", trim_decimal(scaled, 1), BYTE_UNITS[exp])
}

/// Durations given in milliseconds, rendered in the most natural unit.
pub fn format_duration(ms: f64) -> String {
    if !ms.is_finite() {
        return NOT_AVAILABLE.to_string();
    }

    if ms < 1. {
        format!("{:.0}μs", ms * 1000.)
    } else if ms < 1_000. {
        format!("{:.1}ms", ms)
    } else if ms < 60_000. {
        format!("{:.2}s", ms / 1_000.)
    } else if ms < 3_600_000. {
        format!("{:.1}m", ms / 60_000.)
    } else {
        format!("{:.1}h", ms / 3_600_000.)
    }
}

pub fn format_percentage(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }

    format!("{:.*}%", decimals, value)
}

pub fn format_rate(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }

    format!("{:.*}/s", decimals, value)
}

/// Human phrasing of how long ago `then` was, relative to `now`.  `now` is
/// an explicit argument so the function stays pure.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);

    match seconds {
        s if s < 5 => "just now".to_string(),
        s if s < 60 => format!("{} seconds ago", s),
        s if s < 120 => "1 minute ago".to_string(),
        s if s < 3_600 => format!("{} minutes ago", s / 60),
        s if s < 7_200 => "1 hour ago".to_string(),
        s if s < 86_400 => format!("{} hours ago", s / 3_600),
        s => format!("{} days ago", s / 86_400),
    }
}

/// Fixed-decimal rendering with trailing zeros (and a bare point) removed.
fn trim_decimal(value: f64, decimals: usize) -> String {
    let rendered = format!("{:.*}", decimals, value);
    if rendered.contains('.') {
        rendered
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        rendered
    }
}
