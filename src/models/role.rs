use serde::Serialize;
use std::collections::BTreeSet;

use crate::domain::Permission;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Role {
    pub name: String,
    pub permissions: BTreeSet<Permission>,
}
