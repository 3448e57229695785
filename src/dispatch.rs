//! Dispatch evaluator: decides, once per poll, whether a feeding slot fires.
//!
//! ```text
//!   fetch schedules ──▶ load ledger (day rollover) ──▶ scan slots ──▶ first due, unexecuted slot
//!                                                                        │
//!                                     insert key ──▶ persist ledger ◀────┘
//!                                                        │
//!                                                        ▼
//!                                              food DispenseRoutine
//! ```
//!
//! ## Guarantees
//!
//! - At most one slot is dispatched per [`DispatchEvaluator::evaluate`].
//! - A slot's key is written to the ledger *before* the routine runs, so a
//!   slow or failing actuation can never cause a second dispatch of the
//!   same slot on the same day.
//! - Ledger read, insert and persist happen in one synchronous step with
//!   no suspension point in between.
//! - A failed fetch writes nothing.
//! - Slots are scanned in `(schedule id, time)` order, so the same input
//!   always selects the same slot.

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info, warn};

use crate::app::ports::{Reporter, ScheduleSource, SensorGateway, StoragePort};
use crate::error::PersistenceError;
use crate::ledger::{ExecutionLedger, LedgerStore};
use crate::routine::{DispenseKind, DispenseRoutine};
use crate::schedule::{DEFAULT_DUE_WINDOW_MINUTES, ExecutionKey, ScheduleEntry, TimeOfDay};

pub struct DispatchEvaluator<Src, G, S> {
    source: Src,
    routine: DispenseRoutine<G>,
    ledger: LedgerStore<S>,
    window_minutes: u16,
}

impl<Src, G, S> DispatchEvaluator<Src, G, S>
where
    Src: ScheduleSource,
    G: SensorGateway,
    S: StoragePort,
{
    pub fn new(source: Src, routine: DispenseRoutine<G>, storage: S) -> Self {
        Self {
            source,
            routine,
            ledger: LedgerStore::new(storage),
            window_minutes: DEFAULT_DUE_WINDOW_MINUTES,
        }
    }

    pub fn with_window(mut self, minutes: u16) -> Self {
        self.window_minutes = minutes;
        self
    }

    /// One poll cycle for `user_id` at wall-clock `now`.
    ///
    /// Returns `true` when a slot was dispatched.  The food routine's own
    /// outcome does not change the return value: once decided, a slot
    /// stays decided.  Never fails; errors are logged and absorbed.
    pub async fn evaluate(
        &self,
        user_id: u32,
        now: NaiveDateTime,
        reporter: &impl Reporter,
    ) -> bool {
        let schedules = match self.source.fetch_schedules(user_id).await {
            Ok(s) => s,
            Err(e) => {
                warn!("Dispatch: schedule fetch for user {} failed ({})", user_id, e);
                return false;
            }
        };

        let Some(key) = self.claim_due_slot(&schedules, now) else {
            return false;
        };

        info!("Dispatch: slot {} claimed, dispensing food", key);
        if let Err(failure) = self.routine.run(DispenseKind::Food, reporter).await {
            warn!("Dispatch: slot {} stays executed despite: {}", key, failure);
        }
        true
    }

    /// Find the first due slot not yet executed today, record it and
    /// persist the ledger.  Synchronous on purpose.
    pub fn claim_due_slot(
        &self,
        schedules: &[ScheduleEntry],
        now: NaiveDateTime,
    ) -> Option<ExecutionKey> {
        let today = now.date();
        let mut ledger = self.ledger.load(today);
        let key = find_due_slot(schedules, now, &ledger, self.window_minutes)?;
        ledger.insert(&key);
        self.ledger.save(&ledger);
        Some(key)
    }

    /// Encoded keys already executed on `today`.
    pub fn executed_on(&self, today: NaiveDate) -> Vec<String> {
        self.ledger
            .load(today)
            .keys()
            .map(str::to_string)
            .collect()
    }

    /// Forget every executed slot.
    pub fn clear_ledger(&self) -> Result<(), PersistenceError> {
        self.ledger.clear()
    }
}

/// Pure slot selection: the lowest `(schedule id, time)` that is due at
/// `now` and absent from `ledger`.
pub fn find_due_slot(
    schedules: &[ScheduleEntry],
    now: NaiveDateTime,
    ledger: &ExecutionLedger,
    window_minutes: u16,
) -> Option<ExecutionKey> {
    let today = now.date();
    let current = TimeOfDay::from_time(now.time());

    let mut slots: Vec<(u32, TimeOfDay)> = schedules
        .iter()
        .flat_map(|entry| {
            if entry.slots().count() != entry.times.len() {
                warn!("Dispatch: schedule {} has unparsable times {:?}", entry.id, entry.times);
            }
            entry.slots().map(move |t| (entry.id, t))
        })
        .collect();
    slots.sort_unstable();
    slots.dedup();

    slots
        .into_iter()
        .map(|(id, time)| ExecutionKey::new(id, time, today))
        .filter(|key| {
            if ledger.contains(key) {
                debug!("Dispatch: {} already executed", key);
                return false;
            }
            true
        })
        .find(|key| key.time.is_due_at(current, window_minutes))
}
