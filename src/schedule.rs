//! Schedule records, time-of-day slots and the due predicate.
//!
//! A schedule entry owns an ordered list of `HH:MM` strings.  Each
//! `(schedule id, time)` pair is a *slot*; on a given calendar day a slot
//! is identified by an [`ExecutionKey`].

use core::fmt;

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Minutes after a slot's time during which it is still due.
pub const DEFAULT_DUE_WINDOW_MINUTES: u16 = 2;

/// One feeding schedule as returned by the schedule source.
///
/// `pet`, `dispenser` and `owner` are opaque references; the engine never
/// dereferences them, and `None` is kept when the source sent none usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: u32,
    pub pet: Option<u32>,
    pub dispenser: Option<u32>,
    pub owner: Option<u32>,
    /// Time-of-day strings, display order only.
    pub times: Vec<String>,
}

impl ScheduleEntry {
    /// Parsed slots of this entry.  Unparsable strings are skipped.
    pub fn slots(&self) -> impl Iterator<Item = TimeOfDay> + '_ {
        self.times.iter().filter_map(|t| TimeOfDay::parse(t))
    }
}

/// A wall-clock minute of the day (00:00 – 23:59).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    minutes: u16,
}

impl TimeOfDay {
    pub const fn from_hm(hour: u8, minute: u8) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self {
            minutes: hour as u16 * 60 + minute as u16,
        })
    }

    /// Parse `HH:MM` (or `HH:MM:SS`, seconds ignored).  Single-digit hours
    /// are accepted; anything else yields `None`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().split(':');
        let hour = parse_component(parts.next()?)?;
        let minute = parse_component(parts.next()?)?;
        if let Some(sec) = parts.next() {
            if parse_component(sec)? > 59 {
                return None;
            }
        }
        if parts.next().is_some() {
            return None;
        }
        Self::from_hm(hour, minute)
    }

    /// Truncate a wall-clock time to its minute.
    pub fn from_time(t: NaiveTime) -> Self {
        Self {
            minutes: (t.hour() * 60 + t.minute()) as u16,
        }
    }

    /// Minutes since midnight.
    pub const fn minutes(self) -> u16 {
        self.minutes
    }

    /// Due iff `0 <= now - self <= window_minutes`.  No wrap past midnight.
    pub fn is_due_at(self, now: TimeOfDay, window_minutes: u16) -> bool {
        let diff = i32::from(now.minutes) - i32::from(self.minutes);
        (0..=i32::from(window_minutes)).contains(&diff)
    }
}

fn parse_component(s: &str) -> Option<u8> {
    if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes / 60, self.minutes % 60)
    }
}

/// String form of the due predicate with the default window.
///
/// Returns `false` when either time does not parse.
pub fn is_time_to_execute(current_time: &str, scheduled_time: &str) -> bool {
    match (TimeOfDay::parse(current_time), TimeOfDay::parse(scheduled_time)) {
        (Some(now), Some(slot)) => slot.is_due_at(now, DEFAULT_DUE_WINDOW_MINUTES),
        _ => false,
    }
}

/// "This slot, on this day."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExecutionKey {
    pub schedule_id: u32,
    pub time: TimeOfDay,
    pub date: NaiveDate,
}

impl ExecutionKey {
    pub fn new(schedule_id: u32, time: TimeOfDay, date: NaiveDate) -> Self {
        Self {
            schedule_id,
            time,
            date,
        }
    }

    /// Stable ledger encoding, e.g. `12_08:00_2026-10-19`.
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ExecutionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.schedule_id,
            self.time,
            self.date.format("%Y-%m-%d")
        )
    }
}
