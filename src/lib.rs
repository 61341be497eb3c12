//! Time work sessions against Jira issues and push the result back as
//! worklogs.
//!
//! The core is the transition direction inference in [`transitions`] and the
//! session lifecycle in [`session`]. The tracker is reached through the
//! [`tracker::IssueTracker`] trait, implemented over HTTP by
//! [`client::JiraClient`].

pub mod classify;
pub mod client;
pub mod commands;
pub mod config;
pub mod db;
pub mod duration;
pub mod error;
pub mod models;
pub mod session;
pub mod tracker;
pub mod transitions;
pub mod worklog;

pub use error::{Error, Result};
