use serde::{Deserialize, Serialize};

/// An authorization-services scope defined on a client's resource server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthzScope {
    pub id: String,
    pub name: String,
}

/// A resource- or scope-based permission on a client's resource server.
///
/// `scopes` holds scope names; `policies` holds the policy ids the permission references
/// when the server supplies them inline (empty otherwise).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Permission {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub permission_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub scopes: Vec<String>,
    pub policies: Vec<String>,
}

impl Permission {
    pub fn references_scope(&self, scope_name: &str) -> bool {
        self.scopes.iter().any(|s| s == scope_name)
    }

    pub fn is_scopeless(&self) -> bool {
        self.scopes.is_empty()
    }
}

/// A policy deciding access for one or more permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Policy {
    pub id: String,
    pub name: String,
    /// Declared policy type: `role`, `time`, `group`, `client`, `js`, ...
    #[serde(rename = "type")]
    pub policy_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
