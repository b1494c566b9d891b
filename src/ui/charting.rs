use typlax::metrics::SAMPLE_INTERVAL_MS;

/// Chart points for consecutive WPM samples, each plotted at the end of
/// its window in seconds
pub fn sample_points(samples: &[u32]) -> Vec<(f64, f64)> {
    let step = SAMPLE_INTERVAL_MS as f64 / 1000.0;
    samples
        .iter()
        .enumerate()
        .map(|(i, &wpm)| ((i + 1) as f64 * step, f64::from(wpm)))
        .collect()
}

/// Compute X (seconds) and Y (WPM) bounds for the results chart
pub fn compute_chart_params(points: &[(f64, f64)], elapsed_secs: f64) -> (f64, f64) {
    let highest_wpm = points.iter().map(|&(_, wpm)| wpm).fold(0.0, f64::max);

    let overall_duration = match points.last() {
        Some(&(t, _)) => t,
        None => elapsed_secs,
    };

    (overall_duration.max(1.0), highest_wpm.round())
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
