//! Settings snapshot consumed by the state machine.
//!
//! A `Settings` value is replaced wholesale on every user edit. Nothing in
//! the core mutates individual fields of a live snapshot.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::timer::CurfewWindow;

/// Default grace window for the screen-availability debouncer.
pub const DEFAULT_DEBOUNCE_GRACE_MS: u64 = 1_000;

/// Where an interruption comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptionSource {
    Idle,
    ScreenLock,
    Screensaver,
}

impl InterruptionSource {
    /// Lock and screensaver both mean "the system took the screen away".
    pub fn is_screen(self) -> bool {
        matches!(
            self,
            InterruptionSource::ScreenLock | InterruptionSource::Screensaver
        )
    }
}

/// What to do with the running timer when a source fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerAction {
    /// Pause on the start leg, resume where it left off on the stop leg.
    Pause,
    /// Keep running on the start leg, restart from full on the stop leg.
    #[default]
    Restart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InterruptionPolicy {
    pub enabled: bool,
    pub on_trigger: TriggerAction,
}

impl InterruptionPolicy {
    pub fn pause() -> Self {
        Self {
            enabled: true,
            on_trigger: TriggerAction::Pause,
        }
    }

    pub fn restart() -> Self {
        Self {
            enabled: true,
            on_trigger: TriggerAction::Restart,
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn restarts(&self) -> bool {
        self.on_trigger == TriggerAction::Restart
    }
}

/// One policy per interruption source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InterruptionPolicies {
    pub idle: InterruptionPolicy,
    pub screen_lock: InterruptionPolicy,
    pub screensaver: InterruptionPolicy,
}

impl InterruptionPolicies {
    pub fn get(&self, source: InterruptionSource) -> InterruptionPolicy {
        match source {
            InterruptionSource::Idle => self.idle,
            InterruptionSource::ScreenLock => self.screen_lock,
            InterruptionSource::Screensaver => self.screensaver,
        }
    }
}

/// Immutable settings snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub policies: InterruptionPolicies,
    pub idle_timeout_secs: u64,
    pub work_duration_secs: u64,
    pub short_break_secs: u64,
    /// A long break replaces the short one every N completed work sessions.
    pub long_break_every: u32,
    pub long_break_duration_secs: u64,
    pub accumulate_rest_time: bool,
    pub curfew: CurfewWindow,
    pub debounce_grace_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            policies: InterruptionPolicies::default(),
            idle_timeout_secs: 10 * 60,
            work_duration_secs: 25 * 60,
            short_break_secs: 3 * 60,
            long_break_every: 2,
            long_break_duration_secs: 5 * 60,
            accumulate_rest_time: false,
            curfew: CurfewWindow::default(),
            debounce_grace_ms: DEFAULT_DEBOUNCE_GRACE_MS,
        }
    }
}

impl Settings {
    /// Check the invariants the state machine relies on.
    ///
    /// A curfew window whose start equals its end is accepted; it is simply
    /// never active.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.long_break_every == 0 {
            return Err(ValidationError::invalid(
                "long_break_every",
                "must be at least 1",
            ));
        }
        if self.work_duration_secs == 0 {
            return Err(ValidationError::invalid(
                "work_duration_secs",
                "must be greater than zero",
            ));
        }
        if self.short_break_secs == 0 {
            return Err(ValidationError::invalid(
                "short_break_secs",
                "must be greater than zero",
            ));
        }
        if self.long_break_duration_secs == 0 {
            return Err(ValidationError::invalid(
                "long_break_duration_secs",
                "must be greater than zero",
            ));
        }
        if self.policies.idle.enabled && self.idle_timeout_secs == 0 {
            return Err(ValidationError::invalid(
                "idle_timeout_secs",
                "must be greater than zero when idle detection is enabled",
            ));
        }
        self.curfew.validate()
    }

    pub fn policy(&self, source: InterruptionSource) -> InterruptionPolicy {
        self.policies.get(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn zero_long_break_cycle_is_rejected() {
        let settings = Settings {
            long_break_every: 0,
            ..Settings::default()
        };
        let err = settings.validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::invalid("long_break_every", "must be at least 1")
        );
    }

    #[test]
    fn idle_timeout_only_matters_when_enabled() {
        let mut settings = Settings {
            idle_timeout_secs: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_ok());

        settings.policies.idle = InterruptionPolicy::pause();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn bad_curfew_minute_is_rejected() {
        let mut settings = Settings::default();
        settings.curfew.start_minute = 10;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn policy_lookup_by_source() {
        let settings = Settings {
            policies: InterruptionPolicies {
                idle: InterruptionPolicy::disabled(),
                screen_lock: InterruptionPolicy::pause(),
                screensaver: InterruptionPolicy::restart(),
            },
            ..Settings::default()
        };
        assert!(!settings.policy(InterruptionSource::Idle).enabled);
        assert!(!settings.policy(InterruptionSource::ScreenLock).restarts());
        assert!(settings.policy(InterruptionSource::Screensaver).restarts());
    }

    #[test]
    fn screen_sources() {
        assert!(InterruptionSource::ScreenLock.is_screen());
        assert!(InterruptionSource::Screensaver.is_screen());
        assert!(!InterruptionSource::Idle.is_screen());
    }
}
