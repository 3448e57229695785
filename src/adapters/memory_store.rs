//! In-memory storage adapter.
//!
//! Implements [`StoragePort`] over a `RefCell<HashMap>`.  Used by tests
//! and anywhere persistence across restarts is not needed.
//!
//! A failure can be injected with [`MemoryStore::fail_with`] so callers'
//! fail-open paths can be exercised.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::app::ports::{StorageError, StoragePort};

#[derive(Debug, Default)]
pub struct MemoryStore {
    store: RefCell<HashMap<String, String>>,
    failure: RefCell<Option<StorageError>>,
    writes: RefCell<u32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with `err` (or succeed again with `None`).
    pub fn fail_with(&self, err: Option<StorageError>) {
        *self.failure.borrow_mut() = err;
    }

    /// Write bypassing failure injection and the write counter.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.store
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> u32 {
        *self.writes.borrow()
    }

    fn check(&self) -> Result<(), StorageError> {
        match &*self.failure.borrow() {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

impl StoragePort for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(self.store.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        self.store
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        *self.writes.borrow_mut() += 1;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        self.store.borrow_mut().remove(key);
        Ok(())
    }
}
