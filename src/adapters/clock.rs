//! Wall-clock adapters.
//!
//! - [`SystemClock`] reads the host clock in local time or UTC, depending
//!   on the configured [`DayBoundary`].
//! - [`ManualClock`] is a settable clock for tests and simulations.

use std::cell::Cell;

use chrono::{Local, NaiveDateTime, TimeDelta, Utc};

use crate::app::ports::Clock;
use crate::config::DayBoundary;

/// Host clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    boundary: DayBoundary,
}

impl SystemClock {
    pub fn new(boundary: DayBoundary) -> Self {
        Self { boundary }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(DayBoundary::Local)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        match self.boundary {
            DayBoundary::Local => Local::now().naive_local(),
            DayBoundary::Utc => Utc::now().naive_utc(),
        }
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, t: NaiveDateTime) {
        self.now.set(t);
    }

    pub fn advance(&self, by: TimeDelta) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        self.now.get()
    }
}
