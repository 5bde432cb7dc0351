use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};

/// A Keycloak role, either realm-level or owned by a client.
///
/// Roles are matched across realms by `name`; `id` is realm-local and never compared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Role {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub composite: bool,
    pub client_role: bool,
    /// Realm id for realm roles, client uuid for client roles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
}

impl Role {
    pub fn new_realm_role(name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        Self::validate_role_name(&name)?;

        Ok(Self {
            name,
            ..Self::default()
        })
    }

    pub fn new_client_role(
        name: impl Into<String>,
        client_uuid: impl Into<String>,
    ) -> DomainResult<Self> {
        let name = name.into();
        Self::validate_role_name(&name)?;

        Ok(Self {
            name,
            client_role: true,
            container_id: Some(client_uuid.into()),
            ..Self::default()
        })
    }

    pub fn validate_role_name(name: &str) -> DomainResult<()> {
        if name.trim().is_empty() {
            return Err(DomainError::Validation {
                field: "name".to_string(),
                message: "Role name cannot be empty".to_string(),
            });
        }

        if name.len() > 255 {
            return Err(DomainError::Validation {
                field: "name".to_string(),
                message: "Role name cannot exceed 255 characters".to_string(),
            });
        }

        Ok(())
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn as_composite(mut self) -> Self {
        self.composite = true;
        self
    }

    /// The representation sent when replicating this role into another realm.
    ///
    /// Realm-local fields (`id`, `containerId`) are dropped and composites are never
    /// carried over: only the named role object itself is replicated.
    pub fn to_replica(&self) -> Role {
        Role {
            id: None,
            name: self.name.clone(),
            description: self.description.clone(),
            composite: false,
            client_role: self.client_role,
            container_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_role_names_are_rejected() {
        assert!(Role::new_realm_role("  ").is_err());
        assert!(Role::new_realm_role("invoices:write").is_ok());
    }

    #[test]
    fn replica_drops_realm_local_fields() {
        let role = Role {
            id: Some("9f1c".to_string()),
            name: "billing-admin".to_string(),
            description: Some("Billing".to_string()),
            composite: true,
            client_role: false,
            container_id: Some("realm-a".to_string()),
        };

        let replica = role.to_replica();
        assert_eq!(replica.id, None);
        assert_eq!(replica.container_id, None);
        assert!(!replica.composite);
        assert_eq!(replica.description.as_deref(), Some("Billing"));
    }

    #[test]
    fn deserializes_keycloak_representation() {
        let role: Role = serde_json::from_value(serde_json::json!({
            "id": "r1",
            "name": "write",
            "composite": false,
            "clientRole": true,
            "containerId": "c-uuid",
            "attributes": {}
        }))
        .unwrap();
        assert!(role.client_role);
        assert_eq!(role.container_id.as_deref(), Some("c-uuid"));
    }
}
