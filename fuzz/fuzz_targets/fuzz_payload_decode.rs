#![no_main]

//! Fuzz target for tracker response decoding.
//!
//! Bodies come straight off the network, so every decoder must return an
//! error rather than panic on arbitrary input.

use libfuzzer_sys::fuzz_target;

use jiratime::client::{
    decode_recent_issues, decode_status, decode_summary, decode_transitions, RemoteErrors,
};
use jiratime::transitions::annotate;

fuzz_target!(|data: &[u8]| {
    let Ok(body) = std::str::from_utf8(data) else {
        return;
    };

    let status = decode_status(body);
    if let Ok(status) = &status {
        assert!(!status.id.is_empty());
    }

    if let (Ok(current), Ok(raw)) = (status, decode_transitions(body)) {
        let count = raw.len();
        assert_eq!(annotate(&current, raw).len(), count);
    }

    let _ = decode_summary(body);
    let _ = decode_recent_issues(body);

    if let Some(errors) = RemoteErrors::parse(body) {
        let _ = errors.first_message();
    }
});
