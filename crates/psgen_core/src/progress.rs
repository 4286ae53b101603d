use std::time::Duration;

use crate::state::Epoch;

/// Delay between a progress response and the follow-up query.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Status label shown after a progress query fails.
pub const PROGRESS_ERROR_STATUS: &str = "Error fetching progress.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
    #[default]
    Idle,
    Polling,
    Complete,
    Failed,
}

impl PollPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, PollPhase::Complete | PollPhase::Failed)
    }
}

/// A backend generation job. Identity only; progress lives in the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: String,
    pub epoch: Epoch,
}

/// Progress state machine for the live job: `Idle -> Polling -> {Complete, Failed}`.
///
/// While `Polling`, exactly one query is outstanding (issued or scheduled).
/// A report is only accepted while that query is outstanding, so the loop
/// never overlaps itself and nothing is applied once a terminal phase is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressTracker {
    phase: PollPhase,
    percent: u8,
    status: String,
    interval: Duration,
    outstanding: bool,
    queries: u32,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl ProgressTracker {
    pub fn new(interval: Duration) -> Self {
        Self {
            phase: PollPhase::Idle,
            percent: 0,
            status: String::new(),
            interval,
            outstanding: false,
            queries: 0,
        }
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of queries requested since the last `start`.
    pub fn queries(&self) -> u32 {
        self.queries
    }

    pub fn is_polling(&self) -> bool {
        self.phase == PollPhase::Polling
    }

    /// Drops back to `Idle` with the given progress display.
    pub(crate) fn reset(&mut self, status: &str) {
        self.phase = PollPhase::Idle;
        self.percent = 0;
        self.status = status.to_string();
        self.outstanding = false;
        self.queries = 0;
    }

    /// `Idle -> Polling`. Returns the delay before the first query.
    pub(crate) fn start(&mut self) -> Duration {
        self.phase = PollPhase::Polling;
        self.outstanding = true;
        self.queries = 1;
        Duration::ZERO
    }

    /// Applies one progress payload. Returns the delay for the single
    /// follow-up query, or `None` when no query should be scheduled.
    pub(crate) fn on_report(&mut self, progress: Option<i64>, status: Option<String>) -> Option<Duration> {
        if !self.accepts_report() {
            return None;
        }
        self.outstanding = false;

        let raw = progress.unwrap_or(0);
        self.percent = raw.clamp(0, 100) as u8;
        self.status = status.unwrap_or_default();

        if raw >= 100 {
            self.phase = PollPhase::Complete;
            None
        } else {
            self.outstanding = true;
            self.queries += 1;
            Some(self.interval)
        }
    }

    /// Any query failure is terminal; there is no automatic retry.
    pub(crate) fn on_failure(&mut self) -> bool {
        if !self.accepts_report() {
            return false;
        }
        self.outstanding = false;
        self.percent = 0;
        self.status = PROGRESS_ERROR_STATUS.to_string();
        self.phase = PollPhase::Failed;
        true
    }

    /// Stops polling without touching the displayed progress.
    pub(crate) fn cancel(&mut self) -> bool {
        if self.phase != PollPhase::Polling {
            return false;
        }
        self.phase = PollPhase::Idle;
        self.outstanding = false;
        true
    }

    fn accepts_report(&self) -> bool {
        self.phase == PollPhase::Polling && self.outstanding
    }
}
