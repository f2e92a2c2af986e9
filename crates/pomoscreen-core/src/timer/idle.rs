use serde::{Deserialize, Serialize};

use crate::events::Event;

/// Turns periodic "seconds since last input" samples into edge events.
///
/// Emits `IdleTimeExceeded` once when the sample first exceeds the timeout
/// and `UserActivityDetected` once when it drops back under it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdleWatcher {
    timeout_secs: u64,
    idle: bool,
}

impl IdleWatcher {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout_secs,
            idle: false,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.idle
    }

    pub fn set_timeout(&mut self, timeout_secs: u64) {
        self.timeout_secs = timeout_secs;
    }

    pub fn sample(&mut self, idle_secs: f64) -> Option<Event> {
        if self.timeout_secs == 0 {
            return None;
        }
        let exceeded = idle_secs > self.timeout_secs as f64;
        match (self.idle, exceeded) {
            (false, true) => {
                self.idle = true;
                Some(Event::IdleTimeExceeded)
            }
            (true, false) => {
                self.idle = false;
                Some(Event::UserActivityDetected)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_edges_only() {
        let mut watcher = IdleWatcher::new(600);
        assert_eq!(watcher.sample(30.0), None);
        assert_eq!(watcher.sample(601.0), Some(Event::IdleTimeExceeded));
        assert_eq!(watcher.sample(900.0), None);
        assert_eq!(watcher.sample(2.0), Some(Event::UserActivityDetected));
        assert_eq!(watcher.sample(3.0), None);
    }

    #[test]
    fn exactly_at_timeout_is_not_idle() {
        let mut watcher = IdleWatcher::new(600);
        assert_eq!(watcher.sample(600.0), None);
    }

    #[test]
    fn zero_timeout_disables() {
        let mut watcher = IdleWatcher::new(0);
        assert_eq!(watcher.sample(10_000.0), None);
        assert!(!watcher.is_idle());
    }
}
