//! Fuzz target: schedule time parsing
//!
//! Arbitrary strings fed to `TimeOfDay::parse` must never panic, and any
//! accepted value must be a real minute of the day that re-parses from
//! its own `HH:MM` rendering.
//!
//! cargo fuzz run fuzz_time_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use petfeeder::schedule::{TimeOfDay, is_time_to_execute};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };

    if let Some(t) = TimeOfDay::parse(text) {
        assert!(t.minutes() < 24 * 60);
        let rendered = t.to_string();
        assert_eq!(rendered.len(), 5);
        assert_eq!(TimeOfDay::parse(&rendered), Some(t));
        assert!(is_time_to_execute(&rendered, &rendered));
    }

    // Split the input into two halves and check the predicate does not panic.
    let mid = text.char_indices().nth(text.chars().count() / 2).map_or(0, |(i, _)| i);
    let (a, b) = text.split_at(mid);
    let _ = is_time_to_execute(a, b);
});
