use super::common::{MultiMap, StringSet};
use serde::{Deserialize, Serialize};

/// A realm user with role assignments, group memberships and attributes.
///
/// Identity across realms is `username`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserDetail {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub enabled: bool,
    pub realm_roles: StringSet,
    /// clientId -> role names
    pub client_roles: MultiMap,
    /// Group paths.
    pub groups: StringSet,
    pub attributes: MultiMap,
    pub required_actions: StringSet,
}

impl UserDetail {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            enabled: true,
            ..Self::default()
        }
    }
}
