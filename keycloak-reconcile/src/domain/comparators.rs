//! Field-level comparison of same-kind entities taken from two realms.

use crate::domain::entities::*;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Result of comparing two entities that share an identity key.
///
/// Every recorded field appears once in `differences` and once in each value map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldDiff {
    pub differences: Vec<String>,
    pub source_values: BTreeMap<String, Value>,
    pub destination_values: BTreeMap<String, Value>,
}

impl FieldDiff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    /// Record `field` as differing. A field already recorded is left as is.
    pub fn record(
        &mut self,
        field: impl Into<String>,
        source: impl Serialize,
        destination: impl Serialize,
    ) {
        let field = field.into();
        if self.source_values.contains_key(&field) {
            return;
        }
        self.source_values
            .insert(field.clone(), serde_json::to_value(source).unwrap_or(Value::Null));
        self.destination_values
            .insert(field.clone(), serde_json::to_value(destination).unwrap_or(Value::Null));
        self.differences.push(field);
    }

    pub fn record_if_differs<T: PartialEq + Serialize>(
        &mut self,
        field: &str,
        source: &T,
        destination: &T,
    ) {
        if source != destination {
            self.record(field, source, destination);
        }
    }

    pub fn into_parts(self) -> (Vec<String>, BTreeMap<String, Value>, BTreeMap<String, Value>) {
        (self.differences, self.source_values, self.destination_values)
    }
}

/// An entity that can be matched across realms and compared field by field.
pub trait Reconcilable {
    const KIND: EntityKind;

    /// Realm-independent identity (name, clientId, path or username).
    fn identity_key(&self) -> &str;

    fn compare_config(&self, destination: &Self) -> FieldDiff;
}

impl Reconcilable for Role {
    const KIND: EntityKind = EntityKind::Role;

    fn identity_key(&self) -> &str {
        &self.name
    }

    // Roles are diffed by presence only.
    fn compare_config(&self, _destination: &Self) -> FieldDiff {
        FieldDiff::new()
    }
}

impl Reconcilable for ClientDetail {
    const KIND: EntityKind = EntityKind::Client;

    fn identity_key(&self) -> &str {
        &self.client_id
    }

    fn compare_config(&self, dst: &Self) -> FieldDiff {
        let mut diff = FieldDiff::new();

        diff.record_if_differs("protocol", &self.protocol, &dst.protocol);
        diff.record_if_differs("redirectUris", &self.redirect_uris, &dst.redirect_uris);
        diff.record_if_differs("webOrigins", &self.web_origins, &dst.web_origins);

        if self.public_client != dst.public_client || self.bearer_only != dst.bearer_only {
            diff.record("accessType", access_type(self), access_type(dst));
        }

        diff.record_if_differs(
            "directAccessGrantsEnabled",
            &self.direct_access_grants_enabled,
            &dst.direct_access_grants_enabled,
        );
        diff.record_if_differs(
            "serviceAccountsEnabled",
            &self.service_accounts_enabled,
            &dst.service_accounts_enabled,
        );
        diff.record_if_differs(
            "defaultClientScopes",
            &self.default_client_scopes,
            &dst.default_client_scopes,
        );
        diff.record_if_differs(
            "optionalClientScopes",
            &self.optional_client_scopes,
            &dst.optional_client_scopes,
        );
        diff.record_if_differs("clientRoles", &self.client_roles, &dst.client_roles);

        diff
    }
}

fn access_type(client: &ClientDetail) -> Value {
    json!({
        "publicClient": client.public_client,
        "bearerOnly": client.bearer_only,
    })
}

impl Reconcilable for GroupDetail {
    const KIND: EntityKind = EntityKind::Group;

    fn identity_key(&self) -> &str {
        &self.path
    }

    fn compare_config(&self, dst: &Self) -> FieldDiff {
        let mut diff = FieldDiff::new();
        diff.record_if_differs("realmRoles", &self.realm_roles, &dst.realm_roles);
        diff.record_if_differs("clientRoles", &self.client_roles, &dst.client_roles);
        diff.record_if_differs("attributes", &self.attributes, &dst.attributes);
        diff
    }
}

impl Reconcilable for UserDetail {
    const KIND: EntityKind = EntityKind::User;

    fn identity_key(&self) -> &str {
        &self.username
    }

    fn compare_config(&self, dst: &Self) -> FieldDiff {
        let mut diff = FieldDiff::new();
        diff.record_if_differs("realmRoles", &self.realm_roles, &dst.realm_roles);
        diff.record_if_differs("clientRoles", &self.client_roles, &dst.client_roles);
        diff.record_if_differs("groups", &self.groups, &dst.groups);
        diff.record_if_differs("attributes", &self.attributes, &dst.attributes);
        diff.record_if_differs("requiredActions", &self.required_actions, &dst.required_actions);
        diff
    }
}
