#![no_main]

//! Fuzz target for the session lifecycle.
//!
//! Drives a session through arbitrary user actions, persisting after each
//! one, and checks that the stored snapshot always matches memory.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tempfile::tempdir;

use jiratime::db::Database;
use jiratime::session::{Session, SessionState};

#[derive(Arbitrary, Debug)]
enum Action {
    Select(u8),
    Start,
    Stop,
    Reset,
    Manual(String),
}

fuzz_target!(|actions: Vec<Action>| {
    let dir = match tempdir() {
        Ok(d) => d,
        Err(_) => return,
    };
    let db = match Database::open(&dir.path().join("session.db")) {
        Ok(d) => d,
        Err(_) => return,
    };

    let mut session = Session::new();
    for action in actions.into_iter().take(64) {
        let before = session.state();
        match action {
            Action::Select(n) => {
                let key = format!("PROJ-{}", n % 4);
                let result = session.select(&key, None);
                if before == SessionState::Running && result.is_ok() {
                    assert_eq!(session.state(), SessionState::Running);
                }
            }
            Action::Start => {
                let result = session.start();
                assert_eq!(result.is_err(), before == SessionState::Running);
                assert_eq!(session.state(), SessionState::Running);
            }
            Action::Stop => {
                let result = session.stop();
                assert_eq!(result.is_ok(), before == SessionState::Running);
                if result.is_err() {
                    assert_eq!(session.state(), before);
                }
            }
            Action::Reset => {
                session.reset();
                assert_eq!(session.state(), SessionState::Idle);
            }
            Action::Manual(text) => {
                let _ = session.set_manual_duration(&text);
            }
        }

        db.save_session(&session).expect("save session");
        assert_eq!(db.load_session().expect("load session"), session);
    }
});
