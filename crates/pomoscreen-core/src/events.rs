use serde::{Deserialize, Serialize};

use crate::settings::InterruptionSource;

/// Every fact the state machine reacts to.
///
/// OS observers, the idle poller, the curfew monitor and the timer execution
/// layer all translate what they see into one of these and push it onto the
/// session queue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted,
    TimerStopped,
    TimerPaused,
    IdleTimeExceeded,
    UserActivityDetected,
    ScreenLocked,
    ScreenUnlocked,
    ScreensaverStarted,
    ScreensaverStopped,
    WorkFinished,
    RestStarted,
    /// The user cut the break short with this much of it left.
    RestCancelled {
        #[serde(default)]
        remaining_secs: f64,
    },
    /// The break ran to completion.
    RestFinished,
    ForcedSleepTriggered,
    ForcedSleepEnded,
}

impl Event {
    /// Every variant, with a zero payload where one is carried.
    pub const ALL: [Event; 15] = [
        Event::TimerStarted,
        Event::TimerStopped,
        Event::TimerPaused,
        Event::IdleTimeExceeded,
        Event::UserActivityDetected,
        Event::ScreenLocked,
        Event::ScreenUnlocked,
        Event::ScreensaverStarted,
        Event::ScreensaverStopped,
        Event::WorkFinished,
        Event::RestStarted,
        Event::RestCancelled { remaining_secs: 0.0 },
        Event::RestFinished,
        Event::ForcedSleepTriggered,
        Event::ForcedSleepEnded,
    ];

    /// The interruption source this event begins, if any.
    pub fn interruption_start(&self) -> Option<InterruptionSource> {
        match self {
            Event::IdleTimeExceeded => Some(InterruptionSource::Idle),
            Event::ScreenLocked => Some(InterruptionSource::ScreenLock),
            Event::ScreensaverStarted => Some(InterruptionSource::Screensaver),
            _ => None,
        }
    }

    /// The interruption source this event resolves, if any.
    pub fn interruption_resolve(&self) -> Option<InterruptionSource> {
        match self {
            Event::UserActivityDetected => Some(InterruptionSource::Idle),
            Event::ScreenUnlocked => Some(InterruptionSource::ScreenLock),
            Event::ScreensaverStopped => Some(InterruptionSource::Screensaver),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Event::TimerStarted => "timer_started",
            Event::TimerStopped => "timer_stopped",
            Event::TimerPaused => "timer_paused",
            Event::IdleTimeExceeded => "idle_time_exceeded",
            Event::UserActivityDetected => "user_activity_detected",
            Event::ScreenLocked => "screen_locked",
            Event::ScreenUnlocked => "screen_unlocked",
            Event::ScreensaverStarted => "screensaver_started",
            Event::ScreensaverStopped => "screensaver_stopped",
            Event::WorkFinished => "work_finished",
            Event::RestStarted => "rest_started",
            Event::RestCancelled { .. } => "rest_cancelled",
            Event::RestFinished => "rest_finished",
            Event::ForcedSleepTriggered => "forced_sleep_triggered",
            Event::ForcedSleepEnded => "forced_sleep_ended",
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_cancelled_parses_from_tagged_json() {
        let event: Event =
            serde_json::from_str(r#"{"type":"rest_cancelled","remaining_secs":20.0}"#).unwrap();
        assert_eq!(event, Event::RestCancelled { remaining_secs: 20.0 });
    }

    #[test]
    fn unit_events_parse_from_tag_only() {
        let event: Event = serde_json::from_str(r#"{"type":"screen_unlocked"}"#).unwrap();
        assert_eq!(event, Event::ScreenUnlocked);
    }

    #[test]
    fn start_and_resolve_sources_pair_up() {
        assert_eq!(
            Event::ScreenLocked.interruption_start(),
            Event::ScreenUnlocked.interruption_resolve()
        );
        assert_eq!(
            Event::ScreensaverStarted.interruption_start(),
            Event::ScreensaverStopped.interruption_resolve()
        );
        assert_eq!(
            Event::IdleTimeExceeded.interruption_start(),
            Event::UserActivityDetected.interruption_resolve()
        );
        assert!(Event::WorkFinished.interruption_start().is_none());
    }
}
