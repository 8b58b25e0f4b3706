use serde::Serialize;

use crate::domain::ObjectId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: ObjectId,
    pub bug_id: ObjectId,
    pub author_id: ObjectId,
    pub author_name: String,
    pub content: String,
    pub created_on: String,
}
