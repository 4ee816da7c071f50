//! Study data storage and aggregation module.
//!
//! Defines the collaborator traits the analytics depend on (session
//! log and task catalog reads) and the pure aggregation built on top
//! of them. The SQLite implementation lives in [`crate::database`];
//! handlers receive stores through shared state rather than globals so
//! the aggregator stays independently testable.

pub mod aggregator;
pub mod types;

pub use aggregator::*;
pub use types::*;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;

/// Read access to the practice session log.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Lists sessions for a user recorded at or after `since`.
    ///
    /// Rows whose timestamp fields are all absent must still be
    /// returned; they can't be bucketed by day but contribute to
    /// totals. Over-fetching is acceptable; the aggregator filters by
    /// calendar day itself.
    async fn sessions_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<RawSession>, StoreError>;
}

/// Read access to study goal display names.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Resolves titles for the given task ids.
    ///
    /// Ids with no matching task are simply absent from the result,
    /// not an error.
    async fn task_titles(&self, ids: &[String]) -> Result<HashMap<String, String>, StoreError>;
}
