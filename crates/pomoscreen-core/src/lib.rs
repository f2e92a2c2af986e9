//! # Pomoscreen Core Library
//!
//! Interruption handling for a focus timer. The core decides what a running
//! work or break timer should do when the user goes idle, the screen locks,
//! the screensaver starts, or a configured curfew window opens. It never owns
//! a timer itself: it is fed events and answers with an [`Action`].
//!
//! ## Architecture
//!
//! - **State machine**: a total, synchronous reducer over `(phase, event)`
//! - **Cycle tracker**: short/long break classification and rest carry-over
//! - **Curfew**: wall-clock window evaluation, countdown warnings and a
//!   once-per-occurrence trigger
//! - **Debounce**: drops the duplicate unlock some platforms deliver
//! - **Session**: owns all of the above behind a serialized command queue
//! - **Storage**: TOML configuration under the user's config directory
//!
//! ## Key Components
//!
//! - [`InterruptionStateMachine`]: phase transitions and actions
//! - [`FocusSession`]: the orchestrator a host application embeds
//! - [`Settings`]: immutable snapshot the machine reads
//! - [`Config`]: on-disk configuration

pub mod clock;
pub mod error;
pub mod events;
pub mod session;
pub mod settings;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, ValidationError};
pub use events::Event;
pub use session::{Command, EventSender, FocusSession, SessionClosed, TimerHost};
pub use settings::{
    InterruptionPolicies, InterruptionPolicy, InterruptionSource, Settings, TriggerAction,
};
pub use storage::Config;
pub use timer::{
    is_within_curfew, schedule_countdown_warnings, Action, BreakKind, BreakPlan, CurfewMonitor,
    CurfewSignal, CurfewWindow, CycleTracker, DebounceGuard, IdleWatcher,
    InterruptionStateMachine, Phase, TimerKind, Transition,
};
