//! Focus session orchestrator.
//!
//! [`FocusSession`] is the single owner of the interruption state. OS
//! observers and timers on other threads never touch it directly: they hold
//! an [`EventSender`] and push [`Command`]s, which the owning thread applies
//! in arrival order with [`FocusSession::drain`].
//!
//! ```text
//!  lock observer ──┐
//!  idle poller  ───┼─> EventSender ─> queue ─> drain() ─> dispatch() ─> TimerHost
//!  curfew timer ───┘
//! ```

use thiserror::Error;
use tokio::sync::mpsc;

use crate::clock::Clock;
use crate::error::ValidationError;
use crate::events::Event;
use crate::settings::Settings;
use crate::timer::{
    Action, BreakPlan, CurfewMonitor, CurfewSignal, DebounceGuard, IdleWatcher,
    InterruptionStateMachine, Phase, TimerKind, Transition,
};

/// The timer execution layer, as seen from the session.
///
/// Only [`on_action`](TimerHost::on_action) is required; the other hooks
/// exist for UI surfaces and default to doing nothing.
pub trait TimerHost {
    /// Delivered after every processed event, including `Action::None`.
    fn on_action(&mut self, action: Action);

    fn on_transition(&mut self, _transition: &Transition) {}

    fn on_countdown_warning(&mut self, _minutes_remaining: u32) {}

    fn on_forced_sleep_entered(&mut self) {}

    fn on_forced_sleep_ended(&mut self) {}
}

/// A unit of work on the session queue.
#[derive(Debug, Clone)]
pub enum Command {
    Event(Event),
    UpdateSettings(Box<Settings>),
    PollCurfew,
    /// Seconds since the last user input.
    IdleSample(f64),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("focus session has been dropped")]
pub struct SessionClosed;

/// Cloneable producer handle onto a session's queue.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<Command>,
}

impl EventSender {
    pub fn send(&self, event: Event) -> Result<(), SessionClosed> {
        self.command(Command::Event(event))
    }

    pub fn update_settings(&self, settings: Settings) -> Result<(), SessionClosed> {
        self.command(Command::UpdateSettings(Box::new(settings)))
    }

    pub fn poll_curfew(&self) -> Result<(), SessionClosed> {
        self.command(Command::PollCurfew)
    }

    pub fn idle_sample(&self, idle_secs: f64) -> Result<(), SessionClosed> {
        self.command(Command::IdleSample(idle_secs))
    }

    pub fn command(&self, command: Command) -> Result<(), SessionClosed> {
        self.tx.send(command).map_err(|_| SessionClosed)
    }
}

pub struct FocusSession<C: Clock, H: TimerHost> {
    clock: C,
    host: H,
    settings: Settings,
    machine: InterruptionStateMachine,
    debounce: DebounceGuard,
    curfew: CurfewMonitor,
    idle: IdleWatcher,
    tx: mpsc::UnboundedSender<Command>,
    rx: mpsc::UnboundedReceiver<Command>,
}

impl<C: Clock, H: TimerHost> FocusSession<C, H> {
    pub fn new(settings: Settings, clock: C, host: H) -> Result<Self, ValidationError> {
        settings.validate()?;
        let (tx, rx) = mpsc::unbounded_channel();
        Ok(Self {
            clock,
            host,
            machine: InterruptionStateMachine::new(settings.clone()),
            debounce: DebounceGuard::new(settings.debounce_grace_ms),
            curfew: CurfewMonitor::new(),
            idle: IdleWatcher::new(settings.idle_timeout_secs),
            settings,
            tx,
            rx,
        })
    }

    // ── Queue ────────────────────────────────────────────────────────

    pub fn sender(&self) -> EventSender {
        EventSender {
            tx: self.tx.clone(),
        }
    }

    /// Apply every queued command in arrival order. Returns how many ran.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(command) = self.rx.try_recv() {
            self.apply(command);
            applied += 1;
        }
        applied
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Event(event) => {
                self.dispatch(event);
            }
            Command::UpdateSettings(settings) => {
                // Rejection is already logged.
                let _ = self.update_settings(*settings);
            }
            Command::PollCurfew => {
                self.poll_curfew();
            }
            Command::IdleSample(idle_secs) => {
                self.report_idle_seconds(idle_secs);
            }
        }
    }

    // ── Event processing ─────────────────────────────────────────────

    /// Run one event through the debouncer and the state machine.
    ///
    /// A suppressed event produces no transition and no host callback.
    pub fn dispatch(&mut self, event: Event) -> Action {
        let now = self.clock.now();
        if self.debounce.should_suppress(&event, now) {
            tracing::debug!(%event, phase = %self.machine.phase(), "suppressed duplicate screen resolution");
            return Action::None;
        }
        self.debounce.observe(&event);

        let from = self.machine.phase();
        let action = self.machine.process_event(event);
        let to = self.machine.phase();

        // Recorded whatever the outcome, including a no-op resolution.
        if let Some(source) = event.interruption_resolve() {
            if source.is_screen()
                && self.settings.policy(source).enabled
                && (from.is_running() || from.is_system_paused())
            {
                self.debounce.record_resolved(source, now);
            }
        }

        let transition = Transition {
            from,
            event,
            to,
            action,
            at: now,
        };
        self.host.on_transition(&transition);
        self.host.on_action(action);

        if to == Phase::ForcedSleep && from != Phase::ForcedSleep {
            tracing::info!(%from, "forced sleep started");
            self.host.on_forced_sleep_entered();
        } else if from == Phase::ForcedSleep && to != Phase::ForcedSleep {
            tracing::info!("forced sleep ended");
            self.host.on_forced_sleep_ended();
        }

        action
    }

    /// Swap the whole settings snapshot. An invalid snapshot is rejected and
    /// the previous one stays in force.
    pub fn update_settings(&mut self, settings: Settings) -> Result<(), ValidationError> {
        if let Err(e) = settings.validate() {
            tracing::warn!(error = %e, "rejected settings update");
            return Err(e);
        }
        self.debounce.set_grace_ms(settings.debounce_grace_ms);
        self.idle.set_timeout(settings.idle_timeout_secs);
        self.machine.update_settings(settings.clone());
        self.settings = settings;
        Ok(())
    }

    /// Evaluate the curfew window at the current time.
    pub fn poll_curfew(&mut self) -> Vec<CurfewSignal> {
        let now = self.clock.now();
        let signals = self.curfew.poll(now, &self.settings.curfew);
        for signal in &signals {
            match *signal {
                CurfewSignal::Warning { minutes_remaining } => {
                    tracing::info!(minutes_remaining, "curfew approaching");
                    self.host.on_countdown_warning(minutes_remaining);
                }
                CurfewSignal::Trigger => {
                    self.dispatch(Event::ForcedSleepTriggered);
                }
                CurfewSignal::Lifted => {
                    if self.machine.is_in_forced_sleep() {
                        self.dispatch(Event::ForcedSleepEnded);
                    }
                }
            }
        }
        signals
    }

    /// Feed a "seconds since last input" sample.
    pub fn report_idle_seconds(&mut self, idle_secs: f64) -> Action {
        match self.idle.sample(idle_secs) {
            Some(event) => self.dispatch(event),
            None => Action::None,
        }
    }

    // ── Lifecycle feed ───────────────────────────────────────────────

    pub fn timer_started(&mut self) -> Action {
        self.dispatch(Event::TimerStarted)
    }

    pub fn timer_stopped(&mut self) -> Action {
        self.dispatch(Event::TimerStopped)
    }

    pub fn timer_paused(&mut self) -> Action {
        self.dispatch(Event::TimerPaused)
    }

    pub fn work_finished(&mut self) -> Action {
        self.dispatch(Event::WorkFinished)
    }

    pub fn rest_started(&mut self) -> Action {
        self.dispatch(Event::RestStarted)
    }

    pub fn rest_cancelled(&mut self, remaining_secs: f64) -> Action {
        self.dispatch(Event::RestCancelled { remaining_secs })
    }

    pub fn rest_finished(&mut self) -> Action {
        self.dispatch(Event::RestFinished)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    pub fn timer_kind(&self) -> TimerKind {
        self.machine.timer_kind()
    }

    pub fn current_break(&self) -> Option<BreakPlan> {
        self.machine.current_break()
    }

    pub fn pending_carry_secs(&self) -> f64 {
        self.machine.pending_carry_secs()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn machine(&self) -> &InterruptionStateMachine {
        &self.machine
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::settings::InterruptionPolicy;
    use crate::timer::CurfewWindow;
    use chrono::{NaiveDate, NaiveDateTime};

    #[derive(Default)]
    struct Recorder {
        actions: Vec<Action>,
        transitions: Vec<Transition>,
        warnings: Vec<u32>,
        sleeps: u32,
        wakes: u32,
    }

    impl TimerHost for Recorder {
        fn on_action(&mut self, action: Action) {
            self.actions.push(action);
        }

        fn on_transition(&mut self, transition: &Transition) {
            self.transitions.push(*transition);
        }

        fn on_countdown_warning(&mut self, minutes_remaining: u32) {
            self.warnings.push(minutes_remaining);
        }

        fn on_forced_sleep_entered(&mut self) {
            self.sleeps += 1;
        }

        fn on_forced_sleep_ended(&mut self) {
            self.wakes += 1;
        }
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn session(settings: Settings, clock: &ManualClock) -> FocusSession<ManualClock, Recorder> {
        FocusSession::new(settings, clock.clone(), Recorder::default()).unwrap()
    }

    #[test]
    fn rejects_invalid_initial_settings() {
        let settings = Settings {
            long_break_every: 0,
            ..Settings::default()
        };
        let result = FocusSession::new(settings, ManualClock::new(at(9, 0)), Recorder::default());
        assert!(result.is_err());
    }

    #[test]
    fn host_sees_every_transition() {
        let clock = ManualClock::new(at(9, 0));
        let mut s = session(Settings::default(), &clock);
        s.timer_started();
        clock.advance_ms(1_000);
        s.timer_stopped();

        let host = s.host();
        assert_eq!(host.actions, vec![Action::None, Action::None]);
        assert_eq!(host.transitions[0].from, Phase::Idle);
        assert_eq!(host.transitions[0].to, Phase::WorkRunning);
        assert_eq!(host.transitions[1].at, at(9, 0) + chrono::Duration::seconds(1));
    }

    #[test]
    fn double_unlock_is_debounced() {
        let clock = ManualClock::new(at(9, 0));
        let mut settings = Settings::default();
        settings.policies.screen_lock = InterruptionPolicy::restart();
        settings.policies.screensaver = InterruptionPolicy::restart();
        let mut s = session(settings, &clock);

        s.timer_started();
        s.dispatch(Event::ScreensaverStarted);
        s.dispatch(Event::ScreenLocked);
        assert_eq!(s.dispatch(Event::ScreensaverStopped), Action::RestartTimer);
        clock.advance_ms(400);
        assert_eq!(s.dispatch(Event::ScreenUnlocked), Action::None);
        // The suppressed event reached nobody.
        assert_eq!(s.host().transitions.len(), 4);
    }

    #[test]
    fn no_op_screensaver_stop_still_debounces_unlock() {
        let clock = ManualClock::new(at(9, 0));
        let mut settings = Settings::default();
        settings.policies.screensaver = InterruptionPolicy::pause();
        settings.policies.screen_lock = InterruptionPolicy::restart();
        let mut s = session(settings, &clock);

        s.timer_started();
        assert_eq!(s.dispatch(Event::ScreensaverStopped), Action::None);
        clock.advance_ms(500);
        assert_eq!(s.dispatch(Event::ScreenUnlocked), Action::None);
        assert_eq!(s.phase(), Phase::WorkRunning);
    }

    #[test]
    fn disabled_source_does_not_mark_resolution() {
        let clock = ManualClock::new(at(9, 0));
        let mut settings = Settings::default();
        settings.policies.screen_lock = InterruptionPolicy::restart();
        let mut s = session(settings, &clock);

        s.timer_started();
        s.dispatch(Event::ScreensaverStopped);
        clock.advance_ms(500);
        assert_eq!(s.dispatch(Event::ScreenUnlocked), Action::RestartTimer);
    }

    #[test]
    fn rejected_settings_keep_previous_snapshot() {
        let clock = ManualClock::new(at(9, 0));
        let mut s = session(Settings::default(), &clock);
        let mut bad = Settings::default();
        bad.curfew.start_minute = 10;
        assert!(s.update_settings(bad).is_err());
        assert_eq!(s.settings(), &Settings::default());
    }

    #[test]
    fn queue_preserves_arrival_order() {
        let clock = ManualClock::new(at(9, 0));
        let mut settings = Settings::default();
        settings.policies.screen_lock = InterruptionPolicy::pause();
        let mut s = session(settings, &clock);

        let tx = s.sender();
        tx.send(Event::TimerStarted).unwrap();
        tx.send(Event::ScreenLocked).unwrap();
        tx.send(Event::ScreenUnlocked).unwrap();
        assert_eq!(s.drain(), 3);
        assert_eq!(
            s.host().actions,
            vec![Action::None, Action::PauseTimer, Action::ResumeTimer]
        );
        assert_eq!(s.drain(), 0);
    }

    #[test]
    fn sender_from_another_thread() {
        let clock = ManualClock::new(at(9, 0));
        let mut s = session(Settings::default(), &clock);
        let tx = s.sender();
        std::thread::spawn(move || {
            tx.send(Event::TimerStarted).unwrap();
        })
        .join()
        .unwrap();
        s.drain();
        assert_eq!(s.phase(), Phase::WorkRunning);
    }

    #[test]
    fn sender_fails_after_session_dropped() {
        let clock = ManualClock::new(at(9, 0));
        let s = session(Settings::default(), &clock);
        let tx = s.sender();
        drop(s);
        assert_eq!(tx.send(Event::TimerStarted), Err(SessionClosed));
    }

    #[test]
    fn curfew_warns_then_sleeps_then_wakes() {
        let clock = ManualClock::new(at(22, 54));
        let mut settings = Settings::default();
        settings.curfew = CurfewWindow::new(23, 0, 6, 0);
        let mut s = session(settings, &clock);
        s.timer_started();

        assert!(s.poll_curfew().is_empty());
        clock.set(at(22, 55));
        s.poll_curfew();
        clock.set(at(22, 59));
        s.poll_curfew();
        s.poll_curfew();
        assert_eq!(s.host().warnings, vec![5, 1]);

        clock.set(at(23, 0));
        s.poll_curfew();
        assert_eq!(s.phase(), Phase::ForcedSleep);
        assert_eq!(s.host().actions.last(), Some(&Action::PauseTimer));
        assert_eq!(s.host().sleeps, 1);

        clock.set(at(23, 30));
        s.poll_curfew();
        assert_eq!(s.host().sleeps, 1);

        clock.set(at(6, 0) + chrono::Duration::days(1));
        s.poll_curfew();
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.host().wakes, 1);
    }

    #[test]
    fn idle_samples_drive_idle_pause() {
        let clock = ManualClock::new(at(9, 0));
        let mut settings = Settings::default();
        settings.policies.idle = InterruptionPolicy::pause();
        settings.idle_timeout_secs = 60;
        let mut s = session(settings, &clock);
        s.timer_started();

        assert_eq!(s.report_idle_seconds(30.0), Action::None);
        assert_eq!(s.report_idle_seconds(61.0), Action::PauseTimer);
        assert_eq!(s.phase(), Phase::WorkPausedByIdle);
        assert_eq!(s.report_idle_seconds(1.0), Action::ResumeTimer);
        assert_eq!(s.phase(), Phase::WorkRunning);
    }
}
