use colored::Colorize;
use std::time::{Duration, Instant};

/// Completion counters for one build run, with an elapsed-time based ETA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    pub completed: usize,
    pub total: usize,
    pub started: Instant,
}
impl ProgressState {
    pub fn new(total: usize) -> Self {
        Self::started_at(total, Instant::now())
    }

    pub fn started_at(total: usize, started: Instant) -> Self {
        Self {
            completed: 0,
            total,
            started,
        }
    }

    pub fn advance(&mut self) {
        self.completed = (self.completed + 1).min(self.total);
    }

    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }

    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }

        (self.completed * 100 / self.total) as u8
    }

    pub fn eta(&self) -> Duration {
        self.eta_at(Instant::now())
    }

    /// Remaining entries times the average time per completed entry so far.
    pub fn eta_at(&self, now: Instant) -> Duration {
        if self.completed == 0 {
            return Duration::ZERO;
        }

        let elapsed = now.saturating_duration_since(self.started);
        let remaining = (self.total - self.completed) as u32;

        elapsed / self.completed as u32 * remaining
    }

    pub fn eta_display(&self) -> String {
        format_eta(self.eta())
    }
}

/// `MM:SS`, minutes not capped at 59.
pub fn format_eta(eta: Duration) -> String {
    let secs = eta.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Receives progress after every processed entry.
pub trait ProgressSink {
    fn report(&mut self, state: &ProgressState);

    fn finished(&mut self, _state: &ProgressState) {}
}
impl<F> ProgressSink for F
where
    F: FnMut(&ProgressState),
{
    fn report(&mut self, state: &ProgressState) {
        self(state)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;
impl ProgressSink for NoProgress {
    fn report(&mut self, _state: &ProgressState) {}
}

/// Prints `Progress: 42% - ETA: 00:03` lines to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgress;
impl ProgressSink for ConsoleProgress {
    fn report(&mut self, state: &ProgressState) {
        println!(
            "{} {}% - ETA: {} ({}/{})",
            "Progress:".bright_blue(),
            state.percent(),
            state.eta_display(),
            state.completed,
            state.total
        );
    }

    fn finished(&mut self, _state: &ProgressState) {
        println!("{}", "Done! 100%".bright_green());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_rounds_down() {
        let mut state = ProgressState::new(3);
        state.advance();

        assert_eq!(state.percent(), 33);
        assert!(!state.is_done());
    }

    #[test]
    fn test_empty_run_is_complete() {
        let state = ProgressState::new(0);

        assert_eq!(state.percent(), 100);
        assert!(state.is_done());
    }

    #[test]
    fn test_eta_uses_average_step_time() {
        let started = Instant::now();
        let mut state = ProgressState::started_at(4, started);
        state.advance();

        let eta = state.eta_at(started + Duration::from_secs(2));

        assert_eq!(eta, Duration::from_secs(6));
    }

    #[test]
    fn test_eta_is_zero_before_first_step() {
        let state = ProgressState::new(10);

        assert_eq!(state.eta(), Duration::ZERO);
    }

    #[test]
    fn test_format_eta() {
        assert_eq!(format_eta(Duration::from_secs(75)), "01:15");
        assert_eq!(format_eta(Duration::from_secs(3)), "00:03");
    }

    #[test]
    fn test_advance_never_exceeds_total() {
        let mut state = ProgressState::new(1);
        state.advance();
        state.advance();

        assert_eq!(state.completed, 1);
    }
}
