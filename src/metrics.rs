use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::util::{calculate_accuracy, calculate_wpm, std_dev};

/// Trailing window for the smoothed live WPM
pub const ROLLING_WINDOW_MS: u64 = 3_000;
/// Width of a burst window anchored at a keystroke
pub const BURST_WINDOW_MS: u64 = 5_000;
/// Width of the consecutive windows sampled for consistency
pub const SAMPLE_INTERVAL_MS: u64 = 5_000;
pub const MIN_BURST_KEYSTROKES: usize = 10;
pub const MIN_CONSISTENCY_KEYSTROKES: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Keystroke {
    pub character: char,
    pub is_correct: bool,
    pub timestamp_ms: u64,
}

/// Snapshot handed to the HUD poll and to the end-of-session scorecard
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub wpm: u32,
    pub raw_wpm: u32,
    pub accuracy: u32,
    /// Seconds since the first keystroke
    pub elapsed_time: f64,
    pub correct_chars: usize,
    pub total_chars: usize,
    pub error_count: usize,
    pub fastest_burst: u32,
    pub consistency: u32,
}

/// Accumulates timestamped keystroke outcomes and derives speed and
/// accuracy figures from them.
///
/// Every query is total: before the first keystroke all rates are 0 and
/// accuracy is 100. Timestamps are trusted to be non-decreasing.
#[derive(Debug)]
pub struct MetricsEngine<C: Clock = SystemClock> {
    clock: C,
    keystrokes: Vec<Keystroke>,
    // correct_prefix[i] = correct keystrokes among the first i entries
    correct_prefix: Vec<usize>,
    start_time: Option<u64>,
    correct_chars: usize,
    total_chars: usize,
}

impl MetricsEngine<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock::new())
    }
}

impl Default for MetricsEngine<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MetricsEngine<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            keystrokes: Vec::new(),
            correct_prefix: vec![0],
            start_time: None,
            correct_chars: 0,
            total_chars: 0,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn record_keystroke(&mut self, character: char, is_correct: bool) {
        let timestamp_ms = self.clock.now_ms();

        if self.start_time.is_none() {
            self.start_time = Some(timestamp_ms);
        }

        self.keystrokes.push(Keystroke {
            character,
            is_correct,
            timestamp_ms,
        });
        self.total_chars += 1;
        if is_correct {
            self.correct_chars += 1;
        }
        self.correct_prefix.push(self.correct_chars);
    }

    /// WPM over the trailing rolling window, narrowed to the elapsed time
    /// near the start of a session
    pub fn current_wpm(&self) -> u32 {
        let Some(start) = self.start_time else {
            return 0;
        };
        if self.keystrokes.is_empty() {
            return 0;
        }

        let now = self.clock.now_ms();
        let window_start = now.saturating_sub(ROLLING_WINDOW_MS);
        let recent_correct = self
            .keystrokes
            .iter()
            .filter(|k| k.timestamp_ms >= window_start && k.is_correct)
            .count();

        let window_ms = now.saturating_sub(start).min(ROLLING_WINDOW_MS);
        calculate_wpm(recent_correct, window_ms as f64 / 1000.0)
    }

    /// All-time average WPM
    pub fn raw_wpm(&self) -> u32 {
        if self.start_time.is_none() {
            return 0;
        }
        calculate_wpm(self.correct_chars, self.elapsed_time())
    }

    pub fn accuracy(&self) -> u32 {
        calculate_accuracy(self.correct_chars, self.total_chars)
    }

    pub fn elapsed_time(&self) -> f64 {
        match self.start_time {
            Some(start) => self.clock.now_ms().saturating_sub(start) as f64 / 1000.0,
            None => 0.0,
        }
    }

    /// Highest WPM over any burst window `[t, t + 5s)` anchored at a
    /// logged keystroke
    pub fn fastest_burst(&self) -> u32 {
        if self.keystrokes.len() < MIN_BURST_KEYSTROKES {
            return 0;
        }

        let burst_secs = BURST_WINDOW_MS as f64 / 1000.0;
        self.keystrokes
            .iter()
            .map(|anchor| {
                let start = anchor.timestamp_ms;
                let end = start.saturating_add(BURST_WINDOW_MS);
                calculate_wpm(self.correct_between(start, end), burst_secs)
            })
            .max()
            .unwrap_or(0)
    }

    /// WPM of each consecutive sample window from the first keystroke up to
    /// the last one
    pub fn wpm_samples(&self) -> Vec<u32> {
        let (Some(start), Some(last)) = (self.start_time, self.keystrokes.last()) else {
            return Vec::new();
        };

        let sample_secs = SAMPLE_INTERVAL_MS as f64 / 1000.0;
        let mut samples = Vec::new();
        let mut window = start;
        while window < last.timestamp_ms {
            let end = window.saturating_add(SAMPLE_INTERVAL_MS);
            samples.push(calculate_wpm(self.correct_between(window, end), sample_secs));
            window = end;
        }
        samples
    }

    /// Rounded population standard deviation of the window samples; lower
    /// is steadier
    pub fn consistency(&self) -> u32 {
        if self.keystrokes.len() < MIN_CONSISTENCY_KEYSTROKES {
            return 0;
        }

        let samples = self
            .wpm_samples()
            .into_iter()
            .map(f64::from)
            .collect::<Vec<f64>>();
        if samples.len() < 2 {
            return 0;
        }

        std_dev(&samples).map_or(0, |sd| sd.round() as u32)
    }

    /// True if any of the last `n` keystrokes was wrong
    pub fn has_recent_errors(&self, n: usize) -> bool {
        let skip = self.keystrokes.len().saturating_sub(n);
        self.keystrokes[skip..].iter().any(|k| !k.is_correct)
    }

    // Correct keystrokes with timestamp in [start, end)
    fn correct_between(&self, start: u64, end: u64) -> usize {
        let lo = self.keystrokes.partition_point(|k| k.timestamp_ms < start);
        let hi = self.keystrokes.partition_point(|k| k.timestamp_ms < end);
        if hi <= lo {
            return 0;
        }
        self.correct_prefix[hi] - self.correct_prefix[lo]
    }

    pub fn keystrokes(&self) -> &[Keystroke] {
        &self.keystrokes
    }

    pub fn start_time(&self) -> Option<u64> {
        self.start_time
    }

    pub fn has_started(&self) -> bool {
        self.start_time.is_some()
    }

    pub fn correct_chars(&self) -> usize {
        self.correct_chars
    }

    pub fn total_chars(&self) -> usize {
        self.total_chars
    }

    pub fn error_count(&self) -> usize {
        self.total_chars - self.correct_chars
    }

    pub fn get_stats(&self) -> SessionStats {
        SessionStats {
            wpm: self.current_wpm(),
            raw_wpm: self.raw_wpm(),
            accuracy: self.accuracy(),
            elapsed_time: self.elapsed_time(),
            correct_chars: self.correct_chars,
            total_chars: self.total_chars,
            error_count: self.error_count(),
            fastest_burst: self.fastest_burst(),
            consistency: self.consistency(),
        }
    }

    pub fn reset(&mut self) {
        self.keystrokes.clear();
        self.correct_prefix.clear();
        self.correct_prefix.push(0);
        self.start_time = None;
        self.correct_chars = 0;
        self.total_chars = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const T0: u64 = 1_700_000_000_000;

    fn engine() -> (MetricsEngine<ManualClock>, ManualClock) {
        let clock = ManualClock::new(T0);
        (MetricsEngine::with_clock(clock.clone()), clock)
    }

    /// Records `n` keystrokes `step_ms` apart, starting at the clock's now
    fn type_run(
        engine: &mut MetricsEngine<ManualClock>,
        clock: &ManualClock,
        n: usize,
        step_ms: u64,
        correct: bool,
    ) {
        for i in 0..n {
            if i > 0 {
                clock.advance(step_ms);
            }
            engine.record_keystroke('a', correct);
        }
    }

    // Scans every anchor with a full filter pass
    fn naive_burst(log: &[Keystroke]) -> u32 {
        if log.len() < MIN_BURST_KEYSTROKES {
            return 0;
        }
        log.iter()
            .map(|anchor| {
                let start = anchor.timestamp_ms;
                let end = start + BURST_WINDOW_MS;
                let count = log
                    .iter()
                    .filter(|k| k.timestamp_ms >= start && k.timestamp_ms < end && k.is_correct)
                    .count();
                calculate_wpm(count, 5.0)
            })
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn test_fresh_engine_is_zeroed() {
        let (engine, _) = engine();
        let stats = engine.get_stats();

        assert_eq!(stats.wpm, 0);
        assert_eq!(stats.raw_wpm, 0);
        assert_eq!(stats.accuracy, 100);
        assert_eq!(stats.elapsed_time, 0.0);
        assert_eq!(stats.correct_chars, 0);
        assert_eq!(stats.total_chars, 0);
        assert_eq!(stats.error_count, 0);
        assert_eq!(stats.fastest_burst, 0);
        assert_eq!(stats.consistency, 0);
        assert!(!engine.has_started());
    }

    #[test]
    fn test_start_time_set_once() {
        let (mut engine, clock) = engine();
        engine.record_keystroke('a', true);
        clock.advance(500);
        engine.record_keystroke('b', true);

        assert_eq!(engine.start_time(), Some(T0));
        assert_eq!(engine.keystrokes()[1].timestamp_ms, T0 + 500);
    }

    #[test]
    fn test_raw_wpm_two_keys_100ms_apart() {
        let (mut engine, clock) = engine();
        engine.record_keystroke('h', true);
        clock.advance(100);
        engine.record_keystroke('i', true);

        // (2 / 5) / (0.1 / 60)
        assert_eq!(engine.raw_wpm(), 240);
        assert_eq!(engine.current_wpm(), 240);
    }

    #[test]
    fn test_single_keystroke_reports_zero_wpm() {
        let (mut engine, _) = engine();
        engine.record_keystroke('a', true);

        assert_eq!(engine.current_wpm(), 0);
        assert_eq!(engine.raw_wpm(), 0);
    }

    #[test]
    fn test_current_wpm_rolling_window() {
        let (mut engine, clock) = engine();
        type_run(&mut engine, &clock, 10, 100, true);

        // elapsed 900ms narrows the window
        assert_eq!(engine.current_wpm(), 133);

        clock.set(T0 + 3_000);
        assert_eq!(engine.current_wpm(), 40);

        // only the keystrokes at 500..=900 remain in the window
        clock.set(T0 + 3_500);
        assert_eq!(engine.current_wpm(), 20);
    }

    #[test]
    fn test_current_wpm_decays_after_pause() {
        let (mut engine, clock) = engine();
        type_run(&mut engine, &clock, 15, 200, true);
        let raw_before = engine.raw_wpm();

        clock.advance(5_000);

        assert_eq!(engine.current_wpm(), 0);
        assert!(engine.raw_wpm() > 0);
        assert!(engine.raw_wpm() < raw_before);
    }

    #[test]
    fn test_wrong_keystrokes_do_not_count_towards_wpm() {
        let (mut engine, clock) = engine();
        type_run(&mut engine, &clock, 10, 100, false);

        assert_eq!(engine.current_wpm(), 0);
        assert_eq!(engine.raw_wpm(), 0);
        assert_eq!(engine.accuracy(), 0);
    }

    #[test]
    fn test_clock_behind_start_is_total() {
        let (mut engine, clock) = engine();
        engine.record_keystroke('a', true);
        clock.set(T0 - 1_000);

        assert_eq!(engine.current_wpm(), 0);
        assert_eq!(engine.raw_wpm(), 0);
        assert_eq!(engine.elapsed_time(), 0.0);
    }

    #[test]
    fn test_accuracy() {
        let (mut engine, _) = engine();
        for ok in [true, false, true, false, true] {
            engine.record_keystroke('a', ok);
        }

        assert_eq!(engine.accuracy(), 60);
        assert_eq!(engine.correct_chars(), 3);
        assert_eq!(engine.total_chars(), 5);
        assert_eq!(engine.error_count(), 2);
    }

    #[test]
    fn test_elapsed_time() {
        let (mut engine, clock) = engine();
        engine.record_keystroke('a', true);
        clock.advance(2_500);

        assert_eq!(engine.elapsed_time(), 2.5);
    }

    #[test]
    fn test_fastest_burst_requires_ten_keystrokes() {
        let (mut engine, clock) = engine();
        type_run(&mut engine, &clock, 9, 100, true);
        assert_eq!(engine.fastest_burst(), 0);

        clock.advance(100);
        engine.record_keystroke('a', true);
        // 10 correct chars inside one 5s window: 2 words / (5 / 60)
        assert_eq!(engine.fastest_burst(), 24);
    }

    #[test]
    fn test_fastest_burst_picks_best_window() {
        let (mut engine, clock) = engine();
        type_run(&mut engine, &clock, 10, 1_000, true);
        clock.advance(1_000);
        type_run(&mut engine, &clock, 20, 100, true);

        // anchored at 7s: three sparse keys plus the whole dense run
        assert_eq!(engine.fastest_burst(), 55);
        assert_eq!(engine.fastest_burst(), naive_burst(engine.keystrokes()));
    }

    #[test]
    fn test_fastest_burst_matches_full_scan() {
        let (mut engine, clock) = engine();
        let gaps = [
            0, 40, 40, 900, 10, 10, 3_000, 0, 0, 250, 5_000, 120, 4_999, 1, 60, 60, 700,
        ];
        for (i, gap) in gaps.iter().cycle().take(60).enumerate() {
            clock.advance(*gap);
            engine.record_keystroke('a', i % 4 != 0);
        }

        assert_eq!(engine.fastest_burst(), naive_burst(engine.keystrokes()));
    }

    #[test]
    fn test_consistency_requires_twenty_keystrokes() {
        let (mut engine, clock) = engine();
        type_run(&mut engine, &clock, 19, 600, true);
        assert_eq!(engine.consistency(), 0);
    }

    #[test]
    fn test_consistency_requires_two_samples() {
        let (mut engine, clock) = engine();
        type_run(&mut engine, &clock, 20, 100, true);

        assert_eq!(engine.wpm_samples().len(), 1);
        assert_eq!(engine.consistency(), 0);
    }

    #[test]
    fn test_consistency_std_dev_of_samples() {
        let (mut engine, clock) = engine();
        type_run(&mut engine, &clock, 15, 300, true);
        clock.set(T0 + 5_000);
        type_run(&mut engine, &clock, 10, 400, true);

        assert_eq!(engine.wpm_samples(), vec![36, 24]);
        assert_eq!(engine.consistency(), 6);
    }

    #[test]
    fn test_has_recent_errors() {
        let (mut engine, _) = engine();
        assert!(!engine.has_recent_errors(5));

        engine.record_keystroke('x', false);
        for _ in 0..5 {
            engine.record_keystroke('a', true);
        }

        assert!(!engine.has_recent_errors(5));
        assert!(engine.has_recent_errors(6));
        assert!(engine.has_recent_errors(100));
    }

    #[test]
    fn test_get_stats_bundles_metrics() {
        let (mut engine, clock) = engine();
        type_run(&mut engine, &clock, 12, 100, true);
        engine.record_keystroke('x', false);
        clock.advance(900);

        let stats = engine.get_stats();
        assert_eq!(stats.correct_chars, 12);
        assert_eq!(stats.total_chars, 13);
        assert_eq!(stats.error_count, 1);
        assert_eq!(stats.accuracy, 92);
        assert_eq!(stats.elapsed_time, 2.0);
        assert_eq!(stats.raw_wpm, engine.raw_wpm());
        assert_eq!(stats.wpm, engine.current_wpm());
        assert_eq!(stats.fastest_burst, 29);
    }

    #[test]
    fn test_reset() {
        let (mut engine, clock) = engine();
        type_run(&mut engine, &clock, 25, 300, true);

        engine.reset();

        assert!(engine.keystrokes().is_empty());
        assert_eq!(engine.start_time(), None);
        let stats = engine.get_stats();
        assert_eq!(stats.wpm, 0);
        assert_eq!(stats.raw_wpm, 0);
        assert_eq!(stats.accuracy, 100);
        assert_eq!(stats.total_chars, 0);
        assert_eq!(stats.fastest_burst, 0);

        engine.record_keystroke('a', true);
        assert_eq!(engine.start_time(), Some(clock.now_ms()));
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let (engine, _) = engine();
        let json = serde_json::to_string(&engine.get_stats()).unwrap();

        assert!(json.contains("\"rawWpm\":0"));
        assert!(json.contains("\"fastestBurst\":0"));
    }
}
