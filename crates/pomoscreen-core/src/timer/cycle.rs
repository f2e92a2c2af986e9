//! Work/break cycle counting and rest-time carry-over.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakKind {
    Short,
    Long,
}

/// What the currently running break was planned as.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakPlan {
    pub kind: BreakKind,
    /// Nominal duration plus any carry consumed at break start.
    pub duration_secs: f64,
}

/// Counts finished work sessions and carries unused break time forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleTracker {
    completed_work_sessions: u32,
    long_break_every: u32,
    carried_secs: f64,
    accumulate_enabled: bool,
}

impl CycleTracker {
    /// `long_break_every` is clamped to at least 1.
    pub fn new(long_break_every: u32, accumulate_enabled: bool) -> Self {
        Self {
            completed_work_sessions: 0,
            long_break_every: long_break_every.max(1),
            carried_secs: 0.0,
            accumulate_enabled,
        }
    }

    pub fn completed_work_sessions(&self) -> u32 {
        self.completed_work_sessions
    }

    pub fn long_break_every(&self) -> u32 {
        self.long_break_every
    }

    pub fn carried_secs(&self) -> f64 {
        self.carried_secs
    }

    pub fn accumulate_enabled(&self) -> bool {
        self.accumulate_enabled
    }

    /// Apply new settings without losing the count or the carry.
    pub fn reconfigure(&mut self, long_break_every: u32, accumulate_enabled: bool) {
        self.long_break_every = long_break_every.max(1);
        self.accumulate_enabled = accumulate_enabled;
    }

    pub fn record_work_session_completed(&mut self) {
        self.completed_work_sessions = self.completed_work_sessions.saturating_add(1);
    }

    /// Pure query; the counter is not consumed.
    pub fn classify_next_break(&self) -> BreakKind {
        let n = self.completed_work_sessions;
        if n > 0 && n % self.long_break_every == 0 {
            BreakKind::Long
        } else {
            BreakKind::Short
        }
    }

    /// Only a cancelled short break carries over; a long break's leftover is dropped.
    pub fn on_break_cancelled(&mut self, kind: BreakKind, remaining_secs: f64) {
        if !self.accumulate_enabled || kind == BreakKind::Long {
            return;
        }
        if remaining_secs.is_finite() && remaining_secs > 0.0 {
            self.carried_secs += remaining_secs;
        }
    }

    /// Nominal duration plus the carry, which is consumed by this call.
    ///
    /// Call exactly once per break start; a second call sees no carry.
    pub fn resolve_break_duration(&mut self, nominal_secs: f64) -> f64 {
        let total = nominal_secs + self.carried_secs;
        self.carried_secs = 0.0;
        total
    }
}

impl Default for CycleTracker {
    fn default() -> Self {
        Self::new(2, false)
    }
}
