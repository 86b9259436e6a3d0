use super::model::Track;

/// Build the listing label for a track: `"Artist - Name"`, or just the name
/// when no artist is known.
pub fn track_label(track: &Track) -> String {
    match track.artist().map(str::trim).filter(|a| !a.is_empty()) {
        Some(a) => format!("{} - {}", a, track.display_name()),
        None => track.display_name().to_string(),
    }
}

/// Format seconds as `H:MM:SS`, or `M:SS` below one hour. Fractions are truncated.
pub fn format_duration(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs as u64
    } else {
        0
    };
    let (h, m, s) = (total / 3600, (total / 60) % 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// `format_duration` for an optional duration; unknown renders as `--:--`.
pub fn format_optional_duration(secs: Option<f64>) -> String {
    secs.map(format_duration)
        .unwrap_or_else(|| "--:--".to_string())
}
