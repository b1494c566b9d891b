/// Standard convention: five characters make one word.
pub const CHARS_PER_WORD: f64 = 5.0;

pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population standard deviation
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let variance = data
        .iter()
        .map(|value| {
            let diff = data_mean - value;
            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;

    Some(variance.sqrt())
}

/// Words per minute for `correct_chars` typed over `seconds`, rounded.
/// Returns 0 for a non-positive (or non-finite) duration.
pub fn calculate_wpm(correct_chars: usize, seconds: f64) -> u32 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    let minutes = seconds / 60.0;
    let words = correct_chars as f64 / CHARS_PER_WORD;
    (words / minutes).round() as u32
}

/// Accuracy percentage, rounded. No keystrokes counts as perfect.
pub fn calculate_accuracy(correct_chars: usize, total_chars: usize) -> u32 {
    if total_chars == 0 {
        return 100;
    }
    ((correct_chars as f64 / total_chars as f64) * 100.0).round() as u32
}

/// Whole-number progress through `total`, 0 when there is nothing to do.
pub fn progress_percent(current: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((current as f64 / total as f64) * 100.0).round() as u32
}

/// Formats seconds as `M:SS`
pub fn format_time(seconds: f64) -> String {
    let whole = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", whole / 60, whole % 60)
}
