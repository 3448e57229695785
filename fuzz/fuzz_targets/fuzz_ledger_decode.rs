//! Fuzz target: persisted execution ledger
//!
//! Stores arbitrary bytes under the ledger key and verifies:
//! - `load` never panics and always yields a ledger for the requested day
//! - a slot inserted into that ledger survives a save/load cycle
//!
//! cargo fuzz run fuzz_ledger_decode

#![no_main]

use chrono::NaiveDate;
use libfuzzer_sys::fuzz_target;
use petfeeder::adapters::memory_store::MemoryStore;
use petfeeder::ledger::{LEDGER_KEY, LedgerStore};
use petfeeder::schedule::{ExecutionKey, TimeOfDay};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Some(today) = NaiveDate::from_ymd_opt(2026, 10, 19) else {
        return;
    };

    let store = MemoryStore::new();
    store.insert_raw(LEDGER_KEY, text);
    let ledger_store = LedgerStore::new(store);

    let mut ledger = ledger_store.load(today);
    assert_eq!(ledger.date(), today);

    let Some(time) = TimeOfDay::from_hm(8, 0) else {
        return;
    };
    let key = ExecutionKey::new(1, time, today);
    ledger.insert(&key);
    ledger_store.save(&ledger);

    let reloaded = ledger_store.load(today);
    assert!(reloaded.contains(&key), "saved slot lost on reload");
});
