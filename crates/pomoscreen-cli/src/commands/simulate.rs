//! Deterministic replay of an event timeline.
//!
//! A script is either a bare array of steps or an object:
//!
//! ```json
//! {
//!   "start": "2025-03-14T22:50:00",
//!   "config": { "curfew": { "enabled": true, "start": "23:00", "end": "06:00" } },
//!   "steps": [
//!     { "offset_ms": 0, "event": { "type": "timer_started" } },
//!     { "offset_ms": 600000, "poll_curfew": true },
//!     { "offset_ms": 601000, "idle_secs": 700 }
//!   ]
//! }
//! ```
//!
//! `offset_ms` is measured from `start`. Each transition is printed to stdout
//! as one JSON object per line.

use std::path::PathBuf;

use chrono::{Duration, Local, NaiveDateTime};
use clap::Args;
use pomoscreen_core::{
    Action, Command, Config, Event, FocusSession, ManualClock, TimerHost, Transition,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Args)]
pub struct SimulateArgs {
    /// Path to the JSON script
    script: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Step {
    Event { offset_ms: u64, event: Event },
    PollCurfew { offset_ms: u64, poll_curfew: bool },
    IdleSample { offset_ms: u64, idle_secs: f64 },
}

impl Step {
    fn offset_ms(&self) -> u64 {
        match self {
            Step::Event { offset_ms, .. }
            | Step::PollCurfew { offset_ms, .. }
            | Step::IdleSample { offset_ms, .. } => *offset_ms,
        }
    }

    fn command(&self) -> Option<Command> {
        match *self {
            Step::Event { event, .. } => Some(Command::Event(event)),
            Step::PollCurfew { poll_curfew, .. } => poll_curfew.then_some(Command::PollCurfew),
            Step::IdleSample { idle_secs, .. } => Some(Command::IdleSample(idle_secs)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Script {
    Steps(Vec<Step>),
    Full {
        #[serde(default)]
        start: Option<NaiveDateTime>,
        #[serde(default)]
        config: Option<Config>,
        steps: Vec<Step>,
    },
}

/// Prints everything the session reports as JSON lines.
struct JsonLines;

impl JsonLines {
    fn emit(value: &impl serde::Serialize) {
        match serde_json::to_string(value) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(error = %e, "could not serialize simulation output"),
        }
    }
}

impl TimerHost for JsonLines {
    fn on_action(&mut self, _action: Action) {}

    fn on_transition(&mut self, transition: &Transition) {
        Self::emit(transition);
    }

    fn on_countdown_warning(&mut self, minutes_remaining: u32) {
        Self::emit(&json!({ "countdown_warning": minutes_remaining }));
    }
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(&args.script)
        .map_err(|e| format!("cannot read {}: {e}", args.script.display()))?;
    let script: Script = serde_json::from_str(&content)?;

    let (start, config, steps) = match script {
        Script::Steps(steps) => (None, None, steps),
        Script::Full {
            start,
            config,
            steps,
        } => (start, config, steps),
    };
    let config = match config {
        Some(config) => config,
        None => Config::load()?,
    };
    let start = start.unwrap_or_else(|| Local::now().naive_local());

    let clock = ManualClock::new(start);
    let mut session = FocusSession::new(config.to_settings()?, clock.clone(), JsonLines)?;
    let sender = session.sender();

    for step in &steps {
        let offset = i64::try_from(step.offset_ms()).map_err(|_| "offset_ms out of range")?;
        let at = Duration::try_milliseconds(offset)
            .and_then(|delta| start.checked_add_signed(delta))
            .ok_or("offset_ms out of range")?;
        clock.set(at);
        if let Some(command) = step.command() {
            sender.command(command)?;
        }
        session.drain();
    }

    tracing::debug!(steps = steps.len(), phase = %session.phase(), "simulation finished");
    Ok(())
}
