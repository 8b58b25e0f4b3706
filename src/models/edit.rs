use serde::Serialize;

use crate::domain::ObjectId;

/// One entry of the append-only audit log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Edit {
    pub id: ObjectId,
    pub timestamp: String,
    pub collection: String,
    pub op: String,
    pub target_id: ObjectId,
    pub changes: serde_json::Value,
    pub auth_user_id: Option<ObjectId>,
}
