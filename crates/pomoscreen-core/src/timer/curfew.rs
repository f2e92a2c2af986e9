//! Curfew ("stay-up limit") window evaluation.
//!
//! A curfew window is a wall-clock range during which work is forcibly
//! suspended. It may wrap past midnight (23:30 - 06:00).
//!
//! ## Countdown protocol
//!
//! Before each curfew start the caller is warned at fixed offsets
//! ([`COUNTDOWN_WARNING_MINUTES`]). Once the window opens the forced-sleep
//! trigger fires once per occurrence; when the window closes again the
//! monitor reports it as lifted.
//!
//! ```text
//! -5m warning -> -1m warning -> Trigger (start) ... Lifted (end)
//! ```

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Minutes before curfew start at which a warning is raised, most distant first.
pub const COUNTDOWN_WARNING_MINUTES: [u32; 2] = [5, 1];

/// Minute values a window boundary may take.
pub const ALLOWED_MINUTES: [u8; 4] = [0, 15, 30, 45];

const SECS_PER_DAY: u32 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurfewWindow {
    pub enabled: bool,
    pub start_hour: u8,
    pub start_minute: u8,
    pub end_hour: u8,
    pub end_minute: u8,
}

impl Default for CurfewWindow {
    fn default() -> Self {
        Self {
            enabled: false,
            start_hour: 23,
            start_minute: 0,
            end_hour: 6,
            end_minute: 0,
        }
    }
}

/// A pre-curfew warning the caller should arm a timer for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownWarning {
    pub at: NaiveDateTime,
    pub minutes_remaining: u32,
}

impl CurfewWindow {
    /// An enabled window.
    pub fn new(start_hour: u8, start_minute: u8, end_hour: u8, end_minute: u8) -> Self {
        Self {
            enabled: true,
            start_hour,
            start_minute,
            end_hour,
            end_minute,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, hour) in [("curfew.start_hour", self.start_hour), ("curfew.end_hour", self.end_hour)] {
            if hour > 23 {
                return Err(ValidationError::invalid(field, format!("{hour} is not an hour of the day")));
            }
        }
        for (field, minute) in [
            ("curfew.start_minute", self.start_minute),
            ("curfew.end_minute", self.end_minute),
        ] {
            if !ALLOWED_MINUTES.contains(&minute) {
                return Err(ValidationError::invalid(
                    field,
                    format!("{minute} must be one of 0, 15, 30, 45"),
                ));
            }
        }
        Ok(())
    }

    fn start_secs(&self) -> u32 {
        (self.start_hour as u32 * 60 + self.start_minute as u32) * 60
    }

    fn end_secs(&self) -> u32 {
        (self.end_hour as u32 * 60 + self.end_minute as u32) * 60
    }

    fn start_time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.start_hour as u32, self.start_minute as u32, 0)
    }

    /// Start equals end: the window never opens.
    pub fn is_degenerate(&self) -> bool {
        self.start_secs() == self.end_secs()
    }

    pub fn wraps_midnight(&self) -> bool {
        self.start_secs() > self.end_secs()
    }

    /// Whether the window can ever be active.
    pub fn is_effective(&self) -> bool {
        self.enabled
            && !self.is_degenerate()
            && self.start_secs() < SECS_PER_DAY
            && self.end_secs() < SECS_PER_DAY
    }

    /// Containment on the circular 24h range. Start inclusive, end exclusive.
    pub fn contains(&self, time: NaiveTime) -> bool {
        if !self.is_effective() {
            return false;
        }
        let t = time.num_seconds_from_midnight();
        let (start, end) = (self.start_secs(), self.end_secs());
        if self.wraps_midnight() {
            t >= start || t < end
        } else {
            t >= start && t < end
        }
    }

    /// Start instant of the occurrence that contains `now`.
    pub fn active_occurrence_start(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        if !self.contains(now.time()) {
            return None;
        }
        let start = self.start_time()?;
        let today = now.date().and_time(start);
        if today <= now {
            Some(today)
        } else {
            // Past midnight inside a wrapping window: it opened yesterday.
            Some(today - Duration::days(1))
        }
    }

    /// The first curfew start strictly after `now`.
    pub fn next_start(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        if !self.is_effective() {
            return None;
        }
        let today = now.date().and_time(self.start_time()?);
        if today > now {
            Some(today)
        } else {
            Some(today + Duration::days(1))
        }
    }
}

pub fn is_within_curfew(now: NaiveDateTime, window: &CurfewWindow) -> bool {
    window.contains(now.time())
}

/// Absolute warning instants before the next curfew start.
///
/// Warnings already in the past are dropped, and nothing is scheduled while
/// the curfew is active.
pub fn schedule_countdown_warnings(
    now: NaiveDateTime,
    window: &CurfewWindow,
) -> Vec<CountdownWarning> {
    if is_within_curfew(now, window) {
        return Vec::new();
    }
    let Some(start) = window.next_start(now) else {
        return Vec::new();
    };
    COUNTDOWN_WARNING_MINUTES
        .iter()
        .map(|&minutes| CountdownWarning {
            at: start - Duration::minutes(minutes as i64),
            minutes_remaining: minutes,
        })
        .filter(|w| w.at >= now)
        .collect()
}

/// Output of one [`CurfewMonitor::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CurfewSignal {
    Warning { minutes_remaining: u32 },
    /// The window opened; forced sleep must begin.
    Trigger,
    /// The window closed (or was disabled) after having been active.
    Lifted,
}

/// Stateful poller over a [`CurfewWindow`].
///
/// Repeated polls never re-deliver a warning or a trigger for the same
/// curfew occurrence. An occurrence is keyed by the date it started on, so a
/// window that wraps midnight counts as one occurrence on both sides of it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurfewMonitor {
    triggered_on: Option<NaiveDate>,
    /// Occurrence start and the smallest warning already delivered for it.
    warned: Option<(NaiveDateTime, u32)>,
    active: bool,
}

impl CurfewMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn triggered_on(&self) -> Option<NaiveDate> {
        self.triggered_on
    }

    pub fn poll(&mut self, now: NaiveDateTime, window: &CurfewWindow) -> Vec<CurfewSignal> {
        let mut signals = Vec::new();

        if let Some(occurrence) = window.active_occurrence_start(now) {
            self.active = true;
            if self.triggered_on != Some(occurrence.date()) {
                self.triggered_on = Some(occurrence.date());
                signals.push(CurfewSignal::Trigger);
            }
            return signals;
        }

        if self.active {
            self.active = false;
            signals.push(CurfewSignal::Lifted);
        }

        if let Some(start) = window.next_start(now) {
            let remaining = start - now;
            let due = COUNTDOWN_WARNING_MINUTES
                .iter()
                .copied()
                .filter(|&m| remaining <= Duration::minutes(m as i64))
                .min();
            if let Some(minutes) = due {
                let already = matches!(self.warned, Some((s, m)) if s == start && m <= minutes);
                if !already {
                    self.warned = Some((start, minutes));
                    signals.push(CurfewSignal::Warning {
                        minutes_remaining: minutes,
                    });
                }
            }
        }

        signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn next_day(h: u32, m: u32) -> NaiveDateTime {
        at(h, m) + Duration::days(1)
    }

    #[test]
    fn midnight_wrap() {
        let window = CurfewWindow::new(23, 30, 1, 0);
        assert!(is_within_curfew(at(23, 45), &window));
        assert!(is_within_curfew(at(0, 15), &window));
        assert!(!is_within_curfew(at(12, 0), &window));
        assert!(!is_within_curfew(at(1, 0), &window));
        assert!(is_within_curfew(at(23, 30), &window));
    }

    #[test]
    fn same_day_window() {
        let window = CurfewWindow::new(13, 0, 14, 30);
        assert!(!window.wraps_midnight());
        assert!(is_within_curfew(at(13, 59), &window));
        assert!(!is_within_curfew(at(14, 30), &window));
        assert!(!is_within_curfew(at(12, 59), &window));
    }

    #[test]
    fn equal_hours_with_later_start_minute_wraps() {
        let window = CurfewWindow::new(5, 45, 5, 15);
        assert!(window.wraps_midnight());
        assert!(is_within_curfew(at(12, 0), &window));
        assert!(!is_within_curfew(at(5, 30), &window));
    }

    #[test]
    fn degenerate_window_is_never_active() {
        let window = CurfewWindow::new(22, 0, 22, 0);
        assert!(!is_within_curfew(at(22, 0), &window));
        assert!(!is_within_curfew(at(3, 0), &window));
        assert!(schedule_countdown_warnings(at(21, 0), &window).is_empty());
    }

    #[test]
    fn disabled_window_is_never_active() {
        let window = CurfewWindow {
            enabled: false,
            ..CurfewWindow::new(0, 0, 23, 45)
        };
        assert!(!is_within_curfew(at(12, 0), &window));
    }

    #[test]
    fn validation() {
        assert!(CurfewWindow::new(23, 30, 1, 0).validate().is_ok());
        assert!(CurfewWindow::new(24, 0, 1, 0).validate().is_err());
        assert!(CurfewWindow::new(23, 20, 1, 0).validate().is_err());
        assert!(CurfewWindow::new(23, 0, 23, 0).validate().is_ok());
    }

    #[test]
    fn warnings_before_start() {
        let window = CurfewWindow::new(23, 0, 6, 0);
        let warnings = schedule_countdown_warnings(at(12, 0), &window);
        assert_eq!(
            warnings,
            vec![
                CountdownWarning {
                    at: at(22, 55),
                    minutes_remaining: 5
                },
                CountdownWarning {
                    at: at(22, 59),
                    minutes_remaining: 1
                },
            ]
        );
    }

    #[test]
    fn past_warnings_are_dropped() {
        let window = CurfewWindow::new(23, 0, 6, 0);
        let warnings = schedule_countdown_warnings(at(22, 57), &window);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].minutes_remaining, 1);
    }

    #[test]
    fn warnings_roll_to_tomorrow_after_window() {
        let window = CurfewWindow::new(0, 30, 6, 0);
        let warnings = schedule_countdown_warnings(at(7, 0), &window);
        assert_eq!(warnings[0].at, next_day(0, 25));
    }

    #[test]
    fn no_warnings_inside_curfew() {
        let window = CurfewWindow::new(23, 0, 6, 0);
        assert!(schedule_countdown_warnings(at(23, 10), &window).is_empty());
    }

    #[test]
    fn occurrence_start_after_midnight_is_previous_day() {
        let window = CurfewWindow::new(23, 30, 1, 0);
        assert_eq!(
            window.active_occurrence_start(next_day(0, 15)),
            Some(at(23, 30))
        );
        assert_eq!(window.active_occurrence_start(at(23, 45)), Some(at(23, 30)));
    }

    #[test]
    fn monitor_triggers_once_per_occurrence() {
        let window = CurfewWindow::new(23, 30, 1, 0);
        let mut monitor = CurfewMonitor::new();

        assert_eq!(monitor.poll(at(23, 31), &window), vec![CurfewSignal::Trigger]);
        assert!(monitor.poll(at(23, 45), &window).is_empty());
        assert!(monitor.poll(next_day(0, 15), &window).is_empty());
        assert_eq!(monitor.poll(next_day(1, 0), &window), vec![CurfewSignal::Lifted]);
        assert!(monitor.poll(next_day(2, 0), &window).is_empty());

        // Next night is a new occurrence.
        let second_night = next_day(23, 40);
        assert_eq!(monitor.poll(second_night, &window), vec![CurfewSignal::Trigger]);
    }

    #[test]
    fn monitor_warns_five_then_one() {
        let window = CurfewWindow::new(23, 0, 6, 0);
        let mut monitor = CurfewMonitor::new();

        assert!(monitor.poll(at(22, 50), &window).is_empty());
        assert_eq!(
            monitor.poll(at(22, 55), &window),
            vec![CurfewSignal::Warning { minutes_remaining: 5 }]
        );
        assert!(monitor.poll(at(22, 56), &window).is_empty());
        assert_eq!(
            monitor.poll(at(22, 59), &window),
            vec![CurfewSignal::Warning { minutes_remaining: 1 }]
        );
        assert!(monitor.poll(at(22, 59) + Duration::seconds(30), &window).is_empty());
        assert_eq!(monitor.poll(at(23, 0), &window), vec![CurfewSignal::Trigger]);
    }

    #[test]
    fn late_poll_skips_straight_to_nearest_warning() {
        let window = CurfewWindow::new(23, 0, 6, 0);
        let mut monitor = CurfewMonitor::new();
        assert_eq!(
            monitor.poll(at(22, 59) + Duration::seconds(20), &window),
            vec![CurfewSignal::Warning { minutes_remaining: 1 }]
        );
        assert!(monitor.poll(at(22, 59) + Duration::seconds(40), &window).is_empty());
    }

    #[test]
    fn disabling_during_curfew_lifts() {
        let mut window = CurfewWindow::new(23, 0, 6, 0);
        let mut monitor = CurfewMonitor::new();
        assert_eq!(monitor.poll(at(23, 5), &window), vec![CurfewSignal::Trigger]);

        window.enabled = false;
        assert_eq!(monitor.poll(at(23, 6), &window), vec![CurfewSignal::Lifted]);
        assert!(!monitor.is_active());
    }
}
