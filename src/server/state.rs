//! Shared application state for the HTTP server.

use std::sync::Arc;

use crate::database::Database;

/// Application state shared across all handlers.
///
/// Stores are passed in explicitly rather than held in module globals
/// so handlers and the aggregator stay independently testable.
#[derive(Clone)]
pub struct AppState {
    /// Session and task storage; also the aggregator's collaborators.
    pub db: Arc<Database>,
}

impl AppState {
    /// Creates new app state over the given database.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}
