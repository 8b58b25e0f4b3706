//! Append-only audit trail of every successful mutation.
//!
//! Entries are written by the repositories inside the transaction of the
//! mutation they describe; this service only reads them back.

use crate::db::Store;
use crate::domain::ObjectId;
use crate::models::Edit;
use crate::services::ServiceError;
use crate::services::error::infra;

#[derive(Clone)]
pub struct AuditLog {
    store: Store,
}

impl AuditLog {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Every recorded edit of one document, oldest first.
    pub async fn history(&self, target_id: ObjectId) -> Result<Vec<Edit>, ServiceError> {
        self.store
            .edits()
            .history(target_id)
            .await
            .map_err(infra("Failed to read audit history"))
    }
}
