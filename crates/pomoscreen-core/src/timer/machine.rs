//! Interruption state machine.
//!
//! A synchronous reducer over `(phase, event, settings)`. It owns no timer
//! of its own: every call to [`InterruptionStateMachine::process_event`]
//! moves the phase and returns the single [`Action`] the timer execution
//! layer must apply.
//!
//! ## Phases
//!
//! ```text
//! Idle -> WorkRunning -> RestPending -> BreakRunning -> WorkRunning ...
//!            |  ^                          |  ^
//!            v  |                          v  |
//!   WorkPausedBy{System,Idle}     BreakPausedBy{System,Idle}
//!
//! any --ForcedSleepTriggered--> ForcedSleep --ForcedSleepEnded--> Idle
//! ```
//!
//! Every `(phase, event)` pair is defined. Anything not listed in
//! [`InterruptionStateMachine::transition`] keeps the phase and yields
//! [`Action::None`].

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::cycle::{BreakKind, BreakPlan, CycleTracker};
use crate::events::Event;
use crate::settings::{InterruptionSource, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    WorkRunning,
    WorkPausedBySystem,
    WorkPausedByIdle,
    /// Work finished; the break has not started yet.
    RestPending,
    BreakRunning,
    BreakPausedBySystem,
    BreakPausedByIdle,
    ForcedSleep,
}

impl Phase {
    pub const ALL: [Phase; 9] = [
        Phase::Idle,
        Phase::WorkRunning,
        Phase::WorkPausedBySystem,
        Phase::WorkPausedByIdle,
        Phase::RestPending,
        Phase::BreakRunning,
        Phase::BreakPausedBySystem,
        Phase::BreakPausedByIdle,
        Phase::ForcedSleep,
    ];

    pub fn is_running(self) -> bool {
        matches!(self, Phase::WorkRunning | Phase::BreakRunning)
    }

    pub fn is_paused(self) -> bool {
        self.is_system_paused() || self.is_idle_paused()
    }

    pub fn is_system_paused(self) -> bool {
        matches!(self, Phase::WorkPausedBySystem | Phase::BreakPausedBySystem)
    }

    pub fn is_idle_paused(self) -> bool {
        matches!(self, Phase::WorkPausedByIdle | Phase::BreakPausedByIdle)
    }

    /// A break is running or paused.
    pub fn is_break(self) -> bool {
        matches!(
            self,
            Phase::BreakRunning | Phase::BreakPausedBySystem | Phase::BreakPausedByIdle
        )
    }

    pub fn is_in_rest_period(self) -> bool {
        self == Phase::RestPending || self.is_break()
    }

    fn paused_by_system(self) -> Option<Phase> {
        match self {
            Phase::WorkRunning => Some(Phase::WorkPausedBySystem),
            Phase::BreakRunning => Some(Phase::BreakPausedBySystem),
            _ => None,
        }
    }

    fn paused_by_idle(self) -> Option<Phase> {
        match self {
            Phase::WorkRunning => Some(Phase::WorkPausedByIdle),
            Phase::BreakRunning => Some(Phase::BreakPausedByIdle),
            _ => None,
        }
    }

    fn resumed(self) -> Option<Phase> {
        match self {
            Phase::WorkPausedBySystem | Phase::WorkPausedByIdle => Some(Phase::WorkRunning),
            Phase::BreakPausedBySystem | Phase::BreakPausedByIdle => Some(Phase::BreakRunning),
            _ => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// What the timer execution layer must do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[default]
    None,
    PauseTimer,
    ResumeTimer,
    /// Reset elapsed time to the full duration and keep running.
    RestartTimer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    Work,
    ShortBreak,
    LongBreak,
}

impl From<BreakKind> for TimerKind {
    fn from(kind: BreakKind) -> Self {
        match kind {
            BreakKind::Short => TimerKind::ShortBreak,
            BreakKind::Long => TimerKind::LongBreak,
        }
    }
}

/// One processed event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from: Phase,
    pub event: Event,
    pub to: Phase,
    pub action: Action,
    pub at: NaiveDateTime,
}

impl Transition {
    pub fn changed_phase(&self) -> bool {
        self.from != self.to
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterruptionStateMachine {
    phase: Phase,
    timer_kind: TimerKind,
    settings: Settings,
    cycle: CycleTracker,
    current_break: Option<BreakPlan>,
}

impl InterruptionStateMachine {
    pub fn new(settings: Settings) -> Self {
        let cycle = CycleTracker::new(settings.long_break_every, settings.accumulate_rest_time);
        Self {
            phase: Phase::Idle,
            timer_kind: TimerKind::Work,
            settings,
            cycle,
            current_break: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn timer_kind(&self) -> TimerKind {
        self.timer_kind
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cycle(&self) -> &CycleTracker {
        &self.cycle
    }

    /// Plan of the break currently running or paused.
    pub fn current_break(&self) -> Option<BreakPlan> {
        self.current_break
    }

    /// Break time carried forward from cancelled breaks.
    pub fn pending_carry_secs(&self) -> f64 {
        self.cycle.carried_secs()
    }

    pub fn is_in_rest_period(&self) -> bool {
        self.phase.is_in_rest_period()
    }

    pub fn is_running(&self) -> bool {
        self.phase.is_running()
    }

    pub fn is_paused(&self) -> bool {
        self.phase.is_paused()
    }

    pub fn is_in_forced_sleep(&self) -> bool {
        self.phase == Phase::ForcedSleep
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Swap in a new settings snapshot. Phase, cycle count and carry survive.
    pub fn update_settings(&mut self, settings: Settings) {
        self.cycle
            .reconfigure(settings.long_break_every, settings.accumulate_rest_time);
        self.settings = settings;
    }

    pub fn process_event(&mut self, event: Event) -> Action {
        let from = self.phase;
        let (to, action) = self.transition(event);
        self.phase = to;

        if !to.is_break() {
            self.current_break = None;
            self.timer_kind = TimerKind::Work;
        }

        tracing::debug!(%from, %event, %to, ?action, "state machine transition");
        action
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn transition(&mut self, event: Event) -> (Phase, Action) {
        let phase = self.phase;
        let stay = (phase, Action::None);

        match event {
            Event::TimerStarted => match phase {
                Phase::Idle | Phase::RestPending => (Phase::WorkRunning, Action::None),
                p => p.resumed().map_or(stay, |to| (to, Action::None)),
            },

            Event::TimerStopped => {
                if phase.is_running() || phase.is_paused() || phase == Phase::RestPending {
                    (Phase::Idle, Action::None)
                } else {
                    stay
                }
            }

            // Manual pauses park in the system phase so user activity can not
            // resume them.
            Event::TimerPaused => phase
                .paused_by_system()
                .map_or(stay, |to| (to, Action::None)),

            Event::IdleTimeExceeded => {
                if !self.settings.policies.idle.enabled {
                    return stay;
                }
                phase
                    .paused_by_idle()
                    .map_or(stay, |to| (to, Action::PauseTimer))
            }

            Event::UserActivityDetected => match phase {
                Phase::WorkPausedByIdle => {
                    if self.settings.policies.idle.restarts() {
                        (Phase::WorkRunning, Action::RestartTimer)
                    } else {
                        (Phase::WorkRunning, Action::ResumeTimer)
                    }
                }
                Phase::BreakPausedByIdle => (Phase::BreakRunning, Action::ResumeTimer),
                _ => stay,
            },

            Event::ScreenLocked => self.screen_taken(InterruptionSource::ScreenLock),
            Event::ScreensaverStarted => self.screen_taken(InterruptionSource::Screensaver),
            Event::ScreenUnlocked => self.screen_returned(InterruptionSource::ScreenLock),
            Event::ScreensaverStopped => self.screen_returned(InterruptionSource::Screensaver),

            Event::WorkFinished => {
                if phase != Phase::WorkRunning {
                    return stay;
                }
                self.cycle.record_work_session_completed();
                (Phase::RestPending, Action::None)
            }

            Event::RestStarted => {
                if !matches!(phase, Phase::RestPending | Phase::Idle) {
                    return stay;
                }
                self.plan_break();
                (Phase::BreakRunning, Action::None)
            }

            Event::RestCancelled { remaining_secs } => {
                if phase.is_break() {
                    if let Some(plan) = self.current_break {
                        self.cycle.on_break_cancelled(plan.kind, remaining_secs);
                    }
                    (Phase::WorkRunning, Action::None)
                } else if phase == Phase::RestPending {
                    (Phase::WorkRunning, Action::None)
                } else {
                    stay
                }
            }

            Event::RestFinished => {
                if phase == Phase::BreakRunning {
                    (Phase::WorkRunning, Action::None)
                } else {
                    stay
                }
            }

            Event::ForcedSleepTriggered => {
                if !self.settings.curfew.enabled || phase == Phase::ForcedSleep {
                    return stay;
                }
                let action = if phase.is_running() {
                    Action::PauseTimer
                } else {
                    Action::None
                };
                (Phase::ForcedSleep, action)
            }

            Event::ForcedSleepEnded => {
                if phase == Phase::ForcedSleep {
                    (Phase::Idle, Action::None)
                } else {
                    stay
                }
            }
        }
    }

    /// Start leg of a lock or screensaver interruption.
    fn screen_taken(&self, source: InterruptionSource) -> (Phase, Action) {
        let stay = (self.phase, Action::None);
        let policy = self.settings.policy(source);
        if !policy.enabled || !self.phase.is_running() {
            return stay;
        }
        if policy.restarts() {
            // The restart happens on the stop leg.
            return stay;
        }
        self.phase
            .paused_by_system()
            .map_or(stay, |to| (to, Action::PauseTimer))
    }

    /// Stop leg of a lock or screensaver interruption.
    fn screen_returned(&self, source: InterruptionSource) -> (Phase, Action) {
        let stay = (self.phase, Action::None);
        let policy = self.settings.policy(source);
        if !policy.enabled {
            return stay;
        }
        match self.phase {
            Phase::WorkPausedBySystem if policy.restarts() => {
                (Phase::WorkRunning, Action::RestartTimer)
            }
            Phase::WorkPausedBySystem => (Phase::WorkRunning, Action::ResumeTimer),
            // Breaks are never restarted from full.
            Phase::BreakPausedBySystem => (Phase::BreakRunning, Action::ResumeTimer),
            Phase::WorkRunning if policy.restarts() => (Phase::WorkRunning, Action::RestartTimer),
            _ => stay,
        }
    }

    fn plan_break(&mut self) {
        debug_assert!(
            self.current_break.is_none(),
            "break duration resolved twice for one break start"
        );
        let kind = self.cycle.classify_next_break();
        let nominal = match kind {
            BreakKind::Short => self.settings.short_break_secs,
            BreakKind::Long => self.settings.long_break_duration_secs,
        };
        let duration_secs = self.cycle.resolve_break_duration(nominal as f64);
        self.current_break = Some(BreakPlan {
            kind,
            duration_secs,
        });
        self.timer_kind = kind.into();
    }
}
