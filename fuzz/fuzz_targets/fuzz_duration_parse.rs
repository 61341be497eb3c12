#![no_main]

//! Fuzz target for duration parsing.
//!
//! Any accepted input must be positive and must survive formatting and
//! re-parsing without panicking.

use libfuzzer_sys::fuzz_target;

use jiratime::duration::{format_duration, parse_duration};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(duration) = parse_duration(text) {
        assert!(duration > chrono::Duration::zero());

        let formatted = format_duration(duration);
        let reparsed = parse_duration(&formatted).expect("formatted duration must parse");
        assert!(reparsed > chrono::Duration::zero());
    }
});
