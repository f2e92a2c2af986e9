mod curfew;
mod cycle;
mod debounce;
mod idle;
mod machine;

pub use curfew::{
    is_within_curfew, schedule_countdown_warnings, CountdownWarning, CurfewMonitor, CurfewSignal,
    CurfewWindow, ALLOWED_MINUTES, COUNTDOWN_WARNING_MINUTES,
};
pub use cycle::{BreakKind, BreakPlan, CycleTracker};
pub use debounce::DebounceGuard;
pub use idle::IdleWatcher;
pub use machine::{Action, InterruptionStateMachine, Phase, TimerKind, Transition};
