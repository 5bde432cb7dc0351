use crate::domain::{entities::*, errors::DomainResult};
use async_trait::async_trait;
use serde_json::Value;

/// Remote directory port: the admin API of one realm.
///
/// An implementation is bound to a single realm handle for its whole lifetime. Every
/// operation is one or more sequential request/response pairs; no caching is done.
/// Lookups by identity fail with the matching not-found error when the entity is absent.
#[async_trait]
pub trait RemoteDirectory: Send + Sync {
    /// Name of the realm this directory talks to
    fn realm(&self) -> &str;

    // Realm
    /// Raw admin representation of the realm itself
    async fn export_realm(&self) -> DomainResult<Value>;
    /// Create a new realm from a full representation; the realm it names, not this one
    async fn import_realm(&self, representation: &Value) -> DomainResult<()>;

    // Realm roles
    async fn list_realm_roles(&self) -> DomainResult<Vec<Role>>;
    async fn get_realm_role(&self, name: &str) -> DomainResult<Role>;
    async fn create_realm_role(&self, role: &Role) -> DomainResult<()>;
    /// Members of a composite role, realm and client roles alike
    async fn list_composite_roles(&self, role: &Role) -> DomainResult<Vec<Role>>;

    // Clients
    /// All clients, each with its scope lists and role names filled in
    async fn list_clients(&self) -> DomainResult<Vec<ClientDetail>>;
    async fn get_client(&self, client_id: &str) -> DomainResult<ClientDetail>;
    /// Raw admin representation of a client, suitable for create/update elsewhere
    async fn export_client(&self, client_uuid: &str) -> DomainResult<Value>;
    async fn create_client(&self, representation: &Value) -> DomainResult<()>;
    async fn update_client(&self, client_uuid: &str, representation: &Value) -> DomainResult<()>;
    async fn list_client_roles(&self, client_uuid: &str) -> DomainResult<Vec<Role>>;
    async fn get_client_role(&self, client_uuid: &str, name: &str) -> DomainResult<Role>;
    async fn create_client_role(&self, client_uuid: &str, role: &Role) -> DomainResult<()>;
    /// Names of the scopes in one of the client's scope lists
    async fn list_client_scopes(
        &self,
        client_uuid: &str,
        bucket: ScopeBucket,
    ) -> DomainResult<Vec<String>>;
    /// Attach each named realm scope to the client's list
    async fn assign_client_scopes(
        &self,
        client_uuid: &str,
        bucket: ScopeBucket,
        names: &[String],
    ) -> DomainResult<()>;

    // Client scopes
    async fn list_realm_client_scopes(&self) -> DomainResult<Vec<ClientScope>>;
    async fn get_client_scope(&self, name: &str) -> DomainResult<ClientScope>;
    async fn list_scope_mappers(&self, scope_id: &str) -> DomainResult<Vec<ProtocolMapper>>;
    async fn create_client_scope(&self, scope: &ClientScope) -> DomainResult<()>;
    async fn create_scope_mapper(
        &self,
        scope_id: &str,
        mapper: &ProtocolMapper,
    ) -> DomainResult<()>;

    // Groups
    /// Top-level groups with their full sub-group hierarchy and role mappings
    async fn list_groups(&self) -> DomainResult<Vec<GroupDetail>>;
    async fn get_group(&self, path: &str) -> DomainResult<GroupDetail>;
    /// Create a group, under `parent_id` when given; returns the new id
    async fn create_group(
        &self,
        group: &GroupDetail,
        parent_id: Option<&str>,
    ) -> DomainResult<String>;
    async fn assign_group_realm_roles(&self, group_id: &str, roles: &[Role]) -> DomainResult<()>;
    async fn assign_group_client_roles(
        &self,
        group_id: &str,
        client_uuid: &str,
        roles: &[Role],
    ) -> DomainResult<()>;

    // Users
    async fn list_users(&self) -> DomainResult<Vec<UserDetail>>;
    async fn get_user(&self, username: &str) -> DomainResult<UserDetail>;
    /// Create a user; returns the new id
    async fn create_user(&self, user: &UserDetail) -> DomainResult<String>;
    async fn assign_user_realm_roles(&self, user_id: &str, roles: &[Role]) -> DomainResult<()>;
    async fn assign_user_client_roles(
        &self,
        user_id: &str,
        client_uuid: &str,
        roles: &[Role],
    ) -> DomainResult<()>;
    async fn add_user_to_group(&self, user_id: &str, group_id: &str) -> DomainResult<()>;
    /// Raw admin representations of every user
    async fn export_users(&self) -> DomainResult<Vec<Value>>;
    async fn create_user_representation(&self, representation: &Value) -> DomainResult<()>;
    async fn update_user(&self, user_id: &str, representation: &Value) -> DomainResult<()>;

    // Authorization services
    async fn list_authz_scopes(&self, client_uuid: &str) -> DomainResult<Vec<AuthzScope>>;
    async fn list_resource_permissions(&self, client_uuid: &str) -> DomainResult<Vec<Permission>>;
    async fn list_scope_permissions(&self, client_uuid: &str) -> DomainResult<Vec<Permission>>;
    async fn list_policies_for_permission(
        &self,
        client_uuid: &str,
        permission_id: &str,
    ) -> DomainResult<Vec<Policy>>;
    async fn get_policy(&self, client_uuid: &str, policy_id: &str) -> DomainResult<Policy>;
}
