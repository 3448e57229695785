//! Log-based reporter adapter.
//!
//! Implements [`Reporter`] by writing user-facing feedback to the `log`
//! facade.  Used by the headless runner, where there is no UI to update.

use std::cell::Cell;

use log::{error, info};

use crate::app::ports::{MessageKind, Reporter};

/// Adapter that logs every message at a level matching the last status.
#[derive(Debug)]
pub struct LogReporter {
    tag: &'static str,
    kind: Cell<MessageKind>,
}

impl LogReporter {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            kind: Cell::new(MessageKind::Info),
        }
    }
}

impl Reporter for LogReporter {
    fn on_message(&self, text: &str) {
        match self.kind.get() {
            MessageKind::Error => error!("{} | {}", self.tag, text),
            MessageKind::Info | MessageKind::Success => info!("{} | {}", self.tag, text),
        }
    }

    fn on_status(&self, kind: MessageKind) {
        self.kind.set(kind);
    }

    fn on_busy(&self, _busy: bool) {}
}
