//! StudyHub backend library.
//!
//! Tracks study goals and Pomodoro practice sessions, and derives the
//! rolling weekly study summary served to the web frontend.

pub mod database;
pub mod error;
pub mod server;
pub mod store;

pub use error::StoreError;
