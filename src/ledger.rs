//! Execution ledger: the persisted per-day set of slots that already fired.
//!
//! Stored under [`LEDGER_KEY`] as
//! `{ "date": "YYYY-MM-DD", "executed": ["<id>_<HH:MM>_<date>", …] }`.
//!
//! ## Reset policy
//!
//! A ledger whose `date` differs from today is discarded whole; stale
//! entries are never merged forward.  This is the only reset mechanism.
//!
//! ## Failure policy
//!
//! [`LedgerStore::load`] fails open to an empty ledger and
//! [`LedgerStore::save`] is best-effort.  Both log and never propagate.
//! The fallible variants ([`LedgerStore::try_load`], [`LedgerStore::try_save`])
//! expose the underlying [`PersistenceError`].

use std::collections::BTreeSet;

use chrono::NaiveDate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::StoragePort;
use crate::error::PersistenceError;
use crate::schedule::ExecutionKey;

/// Storage key of the ledger record.
pub const LEDGER_KEY: &str = "executed_schedules_today";

/// The ledger for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionLedger {
    date: NaiveDate,
    executed: BTreeSet<String>,
}

impl ExecutionLedger {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            executed: BTreeSet::new(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn contains(&self, key: &ExecutionKey) -> bool {
        self.executed.contains(&key.encode())
    }

    /// Record `key`.  Returns `false` if it was already present.
    ///
    /// Keys dated for another day are rejected; they can never be
    /// looked up under this ledger.
    pub fn insert(&mut self, key: &ExecutionKey) -> bool {
        if key.date != self.date {
            warn!(
                "Ledger: refusing key {} for ledger dated {}",
                key, self.date
            );
            return false;
        }
        self.executed.insert(key.encode())
    }

    pub fn len(&self) -> usize {
        self.executed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executed.is_empty()
    }

    /// Encoded keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.executed.iter().map(String::as_str)
    }

    /// Apply the day-rollover rule.
    fn for_day(self, today: NaiveDate) -> Self {
        if self.date == today {
            self
        } else {
            debug!(
                "Ledger: dated {} with {} entries, today is {}, reset",
                self.date,
                self.executed.len(),
                today
            );
            Self::empty(today)
        }
    }
}

/// Loads and persists the [`ExecutionLedger`] through a [`StoragePort`].
pub struct LedgerStore<S> {
    storage: S,
}

impl<S: StoragePort> LedgerStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Load today's ledger; empty on missing, stale or unreadable data.
    pub fn load(&self, today: NaiveDate) -> ExecutionLedger {
        match self.try_load(today) {
            Ok(ledger) => ledger,
            Err(e) => {
                warn!("Ledger: load failed ({}), starting empty", e);
                ExecutionLedger::empty(today)
            }
        }
    }

    /// Load today's ledger, surfacing storage and decode errors.
    pub fn try_load(&self, today: NaiveDate) -> Result<ExecutionLedger, PersistenceError> {
        let Some(text) = self.storage.get(LEDGER_KEY)? else {
            return Ok(ExecutionLedger::empty(today));
        };
        let stored: ExecutionLedger = serde_json::from_str(&text)?;
        Ok(stored.for_day(today))
    }

    /// Persist the ledger; failure is logged and dropped.
    pub fn save(&self, ledger: &ExecutionLedger) {
        if let Err(e) = self.try_save(ledger) {
            warn!("Ledger: save failed ({}), continuing", e);
        }
    }

    pub fn try_save(&self, ledger: &ExecutionLedger) -> Result<(), PersistenceError> {
        let text = serde_json::to_string(ledger)?;
        self.storage.set(LEDGER_KEY, &text)?;
        Ok(())
    }

    /// Remove the persisted ledger entirely.
    pub fn clear(&self) -> Result<(), PersistenceError> {
        self.storage.remove(LEDGER_KEY)?;
        Ok(())
    }
}
