use serde::Serialize;
use std::io::Write;
use std::time::Duration;

/// Point-in-time copy of a pool's progress counters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ProgressState {
    /// Items whose callback returned successfully
    pub completed: usize,
    /// Items whose callback returned an error or panicked
    pub failed: usize,
    pub total: usize,
    /// Summed callback duration of completed items
    pub elapsed_secs: f64,
}

/// Progress counters and running-average ETA for one pool.
///
/// Not synchronized itself; the owning pool keeps it behind the same mutex
/// as its result store so one lock serializes every worker update.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    label: &'static str,
    workers: usize,
    state: ProgressState,
}

impl ProgressTracker {
    pub fn new(label: &'static str, total: usize, workers: usize) -> Self {
        Self {
            label,
            workers,
            state: ProgressState {
                total,
                ..ProgressState::default()
            },
        }
    }

    /// Count one completed item and return the formatted progress line
    pub fn record(&mut self, duration: Duration) -> String {
        let state = &mut self.state;
        debug_assert!(state.completed < state.total, "more completions than items");
        state.completed = (state.completed + 1).min(state.total);
        state.elapsed_secs += duration.as_secs_f64();
        self.line()
    }

    pub fn record_failure(&mut self) {
        self.state.failed += 1;
    }

    /// Estimated seconds until every remaining item completes
    pub fn eta_secs(&self) -> f64 {
        let state = &self.state;
        let average = state.elapsed_secs / state.completed.max(1) as f64;
        let remaining = state.total.saturating_sub(state.completed) as f64;
        average * remaining / self.workers.max(1) as f64
    }

    pub fn line(&self) -> String {
        format!(
            "  {} Progress Tracker: {}/{}, est: {:.2}s.",
            self.label,
            self.state.completed,
            self.state.total,
            self.eta_secs()
        )
    }

    pub fn state(&self) -> ProgressState {
        self.state
    }

    pub fn reset(&mut self, total: usize, workers: usize) {
        self.workers = workers;
        self.state = ProgressState {
            total,
            ..ProgressState::default()
        };
    }
}

/// Overwrite the current console line with `line`
pub(crate) fn print_in_place(line: &str) {
    print!("\r{line}");
    std::io::stdout().flush().ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_formats_line() {
        let mut tracker = ProgressTracker::new("StaticWorkerPool", 10, 2);

        let line = tracker.record(Duration::from_secs(2));
        // avg 2s, 9 remaining, 2 workers
        assert_eq!(line, "  StaticWorkerPool Progress Tracker: 1/10, est: 9.00s.");

        let line = tracker.record(Duration::from_secs(1));
        // avg 1.5s, 8 remaining, 2 workers
        assert_eq!(line, "  StaticWorkerPool Progress Tracker: 2/10, est: 6.00s.");
    }

    #[test]
    fn test_eta_before_any_completion() {
        let tracker = ProgressTracker::new("DynamicWorkerPool", 5, 4);
        assert_eq!(tracker.eta_secs(), 0.0);
        assert_eq!(
            tracker.line(),
            "  DynamicWorkerPool Progress Tracker: 0/5, est: 0.00s."
        );
    }

    #[test]
    fn test_completed_is_monotonic_and_bounded() {
        let mut tracker = ProgressTracker::new("StaticWorkerPool", 3, 1);
        let mut last = 0;
        for _ in 0..3 {
            tracker.record(Duration::from_millis(5));
            let state = tracker.state();
            assert!(state.completed > last);
            assert!(state.completed <= state.total);
            last = state.completed;
        }
        assert_eq!(tracker.eta_secs(), 0.0);
    }

    #[test]
    fn test_failures_do_not_count_as_completed() {
        let mut tracker = ProgressTracker::new("StaticWorkerPool", 3, 1);
        tracker.record_failure();
        let state = tracker.state();
        assert_eq!(state.completed, 0);
        assert_eq!(state.failed, 1);
    }

    #[test]
    fn test_reset() {
        let mut tracker = ProgressTracker::new("StaticWorkerPool", 3, 1);
        tracker.record(Duration::from_secs(1));
        tracker.reset(0, 0);
        assert_eq!(tracker.state(), ProgressState::default());
    }
}
