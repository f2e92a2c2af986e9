//! Screen-availability echo suppression.
//!
//! Some platforms report a single physical unlock twice: once as the
//! screensaver stopping and once as the screen unlocking. Whichever arrives
//! first resolves the interruption; the other, arriving from a different
//! source within the grace window, is dropped before the state machine
//! sees it.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::settings::{InterruptionSource, DEFAULT_DEBOUNCE_GRACE_MS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebounceGuard {
    last_resolved: Option<(InterruptionSource, NaiveDateTime)>,
    grace_ms: u64,
}

impl Default for DebounceGuard {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_GRACE_MS)
    }
}

impl DebounceGuard {
    pub fn new(grace_ms: u64) -> Self {
        Self {
            last_resolved: None,
            grace_ms,
        }
    }

    pub fn grace_window(&self) -> Duration {
        Duration::milliseconds(self.grace_ms.min(i64::MAX as u64) as i64)
    }

    pub fn set_grace_ms(&mut self, grace_ms: u64) {
        self.grace_ms = grace_ms;
    }

    pub fn last_resolved_at(&self) -> Option<NaiveDateTime> {
        self.last_resolved.map(|(_, at)| at)
    }

    /// True iff `event` resolves a screen interruption that a different
    /// source already resolved less than one grace window ago.
    ///
    /// An expired record is cleared as a side effect.
    pub fn should_suppress(&mut self, event: &Event, now: NaiveDateTime) -> bool {
        let Some(source) = event.interruption_resolve() else {
            return false;
        };
        if !source.is_screen() {
            return false;
        }
        let Some((resolved_by, resolved_at)) = self.last_resolved else {
            return false;
        };

        let elapsed = now - resolved_at;
        if elapsed < Duration::zero() || elapsed >= self.grace_window() {
            self.last_resolved = None;
            return false;
        }
        resolved_by != source
    }

    pub fn record_resolved(&mut self, source: InterruptionSource, now: NaiveDateTime) {
        if source.is_screen() {
            self.last_resolved = Some((source, now));
        }
    }

    /// Any new interruption starting invalidates the previous record.
    pub fn observe(&mut self, event: &Event) {
        if event.interruption_start().is_some() {
            self.clear();
        }
    }

    pub fn clear(&mut self) {
        self.last_resolved = None;
    }
}
