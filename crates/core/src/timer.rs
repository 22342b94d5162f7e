//! Per-question countdown timer.
//!
//! The timer itself is never persisted; only its two inputs are (the
//! question start instant and the configured limit), which makes it
//! fully reconstructible after a reload or crash. `remaining_from` is
//! the pure reconstruction function; `QuestionTimer` layers the running
//! state, thresholds and the one-shot time-up callback on top.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Seconds left at which the UI should warn.
pub const DEFAULT_WARNING_THRESHOLD: u32 = 20;

/// Remaining seconds given the persisted start instant and limit.
/// Saturates at zero once the limit has elapsed.
pub fn remaining_from(now: DateTime<Utc>, started_at: DateTime<Utc>, limit_seconds: u32) -> u32 {
    let elapsed = (now - started_at).num_seconds().max(0) as u64;
    (limit_seconds as u64).saturating_sub(elapsed) as u32
}

/// Read-only snapshot of the timer, suitable for a poll surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerState {
    pub remaining_seconds: u32,
    pub running: bool,
    pub warning: bool,
    pub danger: bool,
    /// `mm:ss` rendering of the remaining time.
    pub formatted: String,
}

type TimeUpCallback = Box<dyn FnMut() + Send>;

/// Countdown for the question currently awaiting an answer.
pub struct QuestionTimer {
    remaining: u32,
    limit: u32,
    running: bool,
    warning_threshold: u32,
    danger_threshold: u32,
    fired: bool,
    on_time_up: Option<TimeUpCallback>,
}

impl QuestionTimer {
    pub fn new(limit_seconds: u32) -> Self {
        Self {
            remaining: limit_seconds,
            limit: limit_seconds,
            running: false,
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
            danger_threshold: DEFAULT_WARNING_THRESHOLD / 2,
            fired: false,
            on_time_up: None,
        }
    }

    /// Reconstructs the timer from the persisted question start instant.
    /// A fully elapsed limit yields a stopped timer at zero.
    pub fn from_persisted(
        now: DateTime<Utc>,
        started_at: DateTime<Utc>,
        limit_seconds: u32,
    ) -> Self {
        let mut timer = Self::new(limit_seconds);
        timer.remaining = remaining_from(now, started_at, limit_seconds);
        timer
    }

    pub fn with_warning_threshold(mut self, warning_seconds: u32) -> Self {
        self.warning_threshold = warning_seconds;
        self.danger_threshold = warning_seconds / 2;
        self
    }

    /// Registers the callback fired once when the countdown reaches zero.
    /// The orchestrator wires this to a sentinel "no answer" submission.
    pub fn on_time_up(&mut self, callback: impl FnMut() + Send + 'static) {
        self.on_time_up = Some(Box::new(callback));
    }

    pub fn start(&mut self) {
        if self.remaining > 0 {
            self.running = true;
        }
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Stops the countdown and rearms it with a fresh limit.
    pub fn reset(&mut self, limit_seconds: u32) {
        self.remaining = limit_seconds;
        self.limit = limit_seconds;
        self.running = false;
        self.fired = false;
    }

    pub fn add_time(&mut self, seconds: u32) {
        self.remaining = self.remaining.saturating_add(seconds);
    }

    /// Advances the countdown by one second. Call on a steady cadence
    /// while running. The time-up callback fires exactly once per
    /// countdown cycle, no matter how many ticks arrive at zero.
    pub fn tick(&mut self) {
        if !self.running || self.remaining == 0 {
            return;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            self.running = false;
            if !self.fired {
                self.fired = true;
                if let Some(callback) = self.on_time_up.as_mut() {
                    callback();
                }
            }
        }
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn state(&self) -> TimerState {
        TimerState {
            remaining_seconds: self.remaining,
            running: self.running,
            warning: self.remaining <= self.warning_threshold
                && self.remaining > self.danger_threshold,
            danger: self.remaining <= self.danger_threshold && self.remaining > 0,
            formatted: format_mmss(self.remaining),
        }
    }
}

/// `mm:ss` rendering, zero-padded.
pub fn format_mmss(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
