//! Route handlers module.

pub mod health;
pub mod sessions;
pub mod stats;
pub mod tasks;
