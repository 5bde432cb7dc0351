#![allow(dead_code)]

use async_trait::async_trait;
use keycloak_reconcile::{
    application::ports::RemoteDirectory,
    domain::{
        entities::*,
        errors::{DomainError, DomainResult},
    },
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Failure to inject on a named operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    NotFound,
    Conflict,
    Rejected,
    Unauthorized,
    Unreachable,
}

impl Failure {
    fn into_error(self, op: &str, realm: &str) -> DomainError {
        match self {
            Failure::NotFound => DomainError::ResourceNotFound {
                resource: op.to_string(),
                realm: realm.to_string(),
            },
            Failure::Conflict => DomainError::AlreadyExists {
                entity_type: op.to_string(),
                identifier: "injected".to_string(),
            },
            Failure::Rejected => DomainError::RemoteRejected {
                status: 500,
                operation: op.to_string(),
                body: "injected failure".to_string(),
            },
            Failure::Unauthorized => DomainError::AuthenticationFailed {
                reason: format!("{op}: injected"),
            },
            Failure::Unreachable => DomainError::Connectivity {
                url: format!("http://fake/{realm}"),
                message: "connection refused".to_string(),
            },
        }
    }
}

/// Contents of one fake realm
#[derive(Debug, Clone, Default)]
pub struct RealmState {
    /// Served by `export_realm`
    pub representation: Option<Value>,
    /// Realms created through `import_realm`
    pub imported_realms: Vec<Value>,
    pub roles: Vec<Role>,
    /// role name -> composite members
    pub composites: HashMap<String, Vec<Role>>,
    /// Client scope lists live here; `client_roles` is derived from `client_role_defs`
    pub clients: Vec<ClientDetail>,
    /// client uuid -> raw representation
    pub exports: HashMap<String, Value>,
    /// client uuid -> roles
    pub client_role_defs: HashMap<String, Vec<Role>>,
    pub scopes: Vec<ClientScope>,
    /// Top-level groups with their hierarchy
    pub groups: Vec<GroupDetail>,
    pub users: Vec<UserDetail>,
    /// client uuid -> authorization scopes
    pub authz_scopes: HashMap<String, Vec<AuthzScope>>,
    pub resource_permissions: HashMap<String, Vec<Permission>>,
    pub scope_permissions: HashMap<String, Vec<Permission>>,
    /// permission id -> associated policies
    pub associated_policies: HashMap<String, Vec<Policy>>,
    /// policy id -> policy
    pub policies: HashMap<String, Policy>,
}

impl RealmState {
    pub fn all_groups(&self) -> Vec<&GroupDetail> {
        self.groups.iter().flat_map(GroupDetail::flatten).collect()
    }

    fn find_group_mut(
        &mut self,
        predicate: &dyn Fn(&GroupDetail) -> bool,
    ) -> Option<&mut GroupDetail> {
        fn walk<'a>(
            groups: &'a mut [GroupDetail],
            predicate: &dyn Fn(&GroupDetail) -> bool,
        ) -> Option<&'a mut GroupDetail> {
            for group in groups {
                if predicate(group) {
                    return Some(group);
                }
                if let Some(found) = walk(&mut group.sub_groups, predicate) {
                    return Some(found);
                }
            }
            None
        }
        walk(&mut self.groups, predicate)
    }

    fn client_id_for(&self, client_uuid: &str) -> Option<String> {
        self.clients
            .iter()
            .find(|c| c.id == client_uuid)
            .map(|c| c.client_id.clone())
    }

    fn with_roles(&self, client: &ClientDetail) -> ClientDetail {
        let mut client = client.clone();
        client.client_roles = self
            .client_role_defs
            .get(&client.id)
            .map(|roles| roles.iter().map(|r| r.name.as_str()).collect())
            .unwrap_or_default();
        client
    }
}

/// In-memory RemoteDirectory with per-operation failure injection
pub struct FakeDirectory {
    realm: String,
    state: Mutex<RealmState>,
    failures: Mutex<HashMap<String, Failure>>,
    /// op -> (first failing call, 1-based)
    late_failures: Mutex<HashMap<String, (usize, Failure)>>,
    calls: Mutex<Vec<String>>,
    counter: AtomicU32,
}

impl FakeDirectory {
    pub fn new(realm: &str) -> Self {
        Self {
            realm: realm.to_string(),
            state: Mutex::new(RealmState::default()),
            failures: Mutex::new(HashMap::new()),
            late_failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            counter: AtomicU32::new(0),
        }
    }

    /// Make every call to `op` (a RemoteDirectory method name) fail
    pub fn fail_on(&self, op: &str, failure: Failure) {
        self.failures.lock().unwrap().insert(op.to_string(), failure);
    }

    /// Let the first `from_call - 1` calls to `op` through, then fail every later one
    pub fn fail_from_call(&self, op: &str, from_call: usize, failure: Failure) {
        self.late_failures.lock().unwrap().insert(op.to_string(), (from_call, failure));
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
        self.late_failures.lock().unwrap().clear();
    }

    pub fn calls(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.as_str() == op).count()
    }

    pub fn seed(&self, f: impl FnOnce(&mut RealmState)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn snapshot(&self) -> RealmState {
        self.state.lock().unwrap().clone()
    }

    pub fn add_role(&self, role: Role) {
        self.seed(|s| s.roles.push(role));
    }

    pub fn add_composite(&self, role_name: &str, members: Vec<Role>) {
        self.seed(|s| {
            if let Some(role) = s.roles.iter_mut().find(|r| r.name == role_name) {
                role.composite = true;
            }
            s.composites.insert(role_name.to_string(), members);
        });
    }

    pub fn add_client(&self, client: ClientDetail) {
        self.seed(|s| s.clients.push(client));
    }

    pub fn add_client_role(&self, client_uuid: &str, name: &str) -> Role {
        let role = Role::new_client_role(name, client_uuid).unwrap();
        let mut stored = role.clone();
        stored.id = Some(format!("{client_uuid}-{name}"));
        self.seed(|s| {
            s.client_role_defs
                .entry(client_uuid.to_string())
                .or_default()
                .push(stored.clone())
        });
        stored
    }

    pub fn add_scope(&self, scope: ClientScope) {
        self.seed(|s| s.scopes.push(scope));
    }

    pub fn add_group(&self, group: GroupDetail) {
        self.seed(|s| s.groups.push(group));
    }

    pub fn add_user(&self, user: UserDetail) {
        self.seed(|s| s.users.push(user));
    }

    fn check(&self, op: &str) -> DomainResult<()> {
        self.calls.lock().unwrap().push(op.to_string());
        if let Some(failure) = self.failures.lock().unwrap().get(op) {
            return Err(failure.into_error(op, &self.realm));
        }
        match self.late_failures.lock().unwrap().get(op) {
            Some((from_call, failure)) if self.calls(op) >= *from_call => {
                Err(failure.into_error(op, &self.realm))
            }
            _ => Ok(()),
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{}-{}", self.realm, prefix, n)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RealmState> {
        self.state.lock().unwrap()
    }

    fn conflict(kind: &str, identity: &str) -> DomainError {
        DomainError::AlreadyExists {
            entity_type: kind.to_string(),
            identifier: identity.to_string(),
        }
    }

    fn missing(&self, resource: String) -> DomainError {
        DomainError::ResourceNotFound {
            resource,
            realm: self.realm.clone(),
        }
    }
}

#[async_trait]
impl RemoteDirectory for FakeDirectory {
    fn realm(&self) -> &str {
        &self.realm
    }

    async fn export_realm(&self) -> DomainResult<Value> {
        self.check("export_realm")?;
        self.lock()
            .representation
            .clone()
            .ok_or_else(|| self.missing(format!("realm {}", self.realm)))
    }

    async fn import_realm(&self, representation: &Value) -> DomainResult<()> {
        self.check("import_realm")?;
        let name = representation["realm"].as_str().unwrap_or_default().to_string();
        let mut state = self.lock();
        if name == self.realm || state.imported_realms.iter().any(|r| r["realm"] == name.as_str()) {
            return Err(Self::conflict("realm", &name));
        }
        state.imported_realms.push(representation.clone());
        Ok(())
    }

    async fn list_realm_roles(&self) -> DomainResult<Vec<Role>> {
        self.check("list_realm_roles")?;
        Ok(self.lock().roles.clone())
    }

    async fn get_realm_role(&self, name: &str) -> DomainResult<Role> {
        self.check("get_realm_role")?;
        self.lock()
            .roles
            .iter()
            .find(|r| r.name == name)
            .cloned()
            .ok_or_else(|| DomainError::RoleNotFound {
                role_name: name.to_string(),
                realm: self.realm.clone(),
            })
    }

    async fn create_realm_role(&self, role: &Role) -> DomainResult<()> {
        self.check("create_realm_role")?;
        let id = self.next_id("role");
        let mut state = self.lock();
        if state.roles.iter().any(|r| r.name == role.name) {
            return Err(Self::conflict("role", &role.name));
        }
        let mut stored = role.clone();
        stored.id = Some(id);
        state.roles.push(stored);
        Ok(())
    }

    async fn list_composite_roles(&self, role: &Role) -> DomainResult<Vec<Role>> {
        self.check("list_composite_roles")?;
        Ok(self.lock().composites.get(&role.name).cloned().unwrap_or_default())
    }

    async fn list_clients(&self) -> DomainResult<Vec<ClientDetail>> {
        self.check("list_clients")?;
        let state = self.lock();
        Ok(state.clients.iter().map(|c| state.with_roles(c)).collect())
    }

    async fn get_client(&self, client_id: &str) -> DomainResult<ClientDetail> {
        self.check("get_client")?;
        let state = self.lock();
        state
            .clients
            .iter()
            .find(|c| c.client_id == client_id)
            .map(|c| state.with_roles(c))
            .ok_or_else(|| DomainError::ClientNotFound {
                client_id: client_id.to_string(),
                realm: self.realm.clone(),
            })
    }

    async fn export_client(&self, client_uuid: &str) -> DomainResult<Value> {
        self.check("export_client")?;
        let state = self.lock();
        if let Some(raw) = state.exports.get(client_uuid) {
            return Ok(raw.clone());
        }
        let client = state
            .clients
            .iter()
            .find(|c| c.id == client_uuid)
            .ok_or_else(|| self.missing(format!("client {client_uuid}")))?;
        let mut raw = serde_json::to_value(client)?;
        if let Value::Object(fields) = &mut raw {
            fields.remove("clientRoles");
        }
        Ok(raw)
    }

    async fn create_client(&self, representation: &Value) -> DomainResult<()> {
        self.check("create_client")?;
        let mut client: ClientDetail = serde_json::from_value(representation.clone())?;
        let id = self.next_id("client");
        let mut state = self.lock();
        if state.clients.iter().any(|c| c.client_id == client.client_id) {
            return Err(Self::conflict("client", &client.client_id));
        }
        client.id = id.clone();
        client.client_roles = StringSet::new();
        state.exports.insert(id, representation.clone());
        state.clients.push(client);
        Ok(())
    }

    async fn update_client(&self, client_uuid: &str, representation: &Value) -> DomainResult<()> {
        self.check("update_client")?;
        let updated: ClientDetail = serde_json::from_value(representation.clone())?;
        let mut state = self.lock();
        let existing = state
            .clients
            .iter_mut()
            .find(|c| c.id == client_uuid)
            .ok_or_else(|| DomainError::ClientNotFound {
                client_id: client_uuid.to_string(),
                realm: self.realm.clone(),
            })?;
        *existing = ClientDetail {
            id: existing.id.clone(),
            default_client_scopes: existing.default_client_scopes.clone(),
            optional_client_scopes: existing.optional_client_scopes.clone(),
            client_roles: StringSet::new(),
            ..updated
        };
        state.exports.insert(client_uuid.to_string(), representation.clone());
        Ok(())
    }

    async fn list_client_roles(&self, client_uuid: &str) -> DomainResult<Vec<Role>> {
        self.check("list_client_roles")?;
        Ok(self.lock().client_role_defs.get(client_uuid).cloned().unwrap_or_default())
    }

    async fn get_client_role(&self, client_uuid: &str, name: &str) -> DomainResult<Role> {
        self.check("get_client_role")?;
        self.lock()
            .client_role_defs
            .get(client_uuid)
            .and_then(|roles| roles.iter().find(|r| r.name == name).cloned())
            .ok_or_else(|| DomainError::RoleNotFound {
                role_name: name.to_string(),
                realm: self.realm.clone(),
            })
    }

    async fn create_client_role(&self, client_uuid: &str, role: &Role) -> DomainResult<()> {
        self.check("create_client_role")?;
        let mut state = self.lock();
        let roles = state.client_role_defs.entry(client_uuid.to_string()).or_default();
        if roles.iter().any(|r| r.name == role.name) {
            return Err(Self::conflict("client role", &role.name));
        }
        let mut stored = role.clone();
        stored.id = Some(format!("{client_uuid}-{}", role.name));
        stored.client_role = true;
        stored.container_id = Some(client_uuid.to_string());
        roles.push(stored);
        Ok(())
    }

    async fn list_client_scopes(
        &self,
        client_uuid: &str,
        bucket: ScopeBucket,
    ) -> DomainResult<Vec<String>> {
        self.check("list_client_scopes")?;
        self.lock()
            .clients
            .iter()
            .find(|c| c.id == client_uuid)
            .map(|c| c.scopes(bucket).to_vec())
            .ok_or_else(|| self.missing(format!("client {client_uuid}")))
    }

    async fn assign_client_scopes(
        &self,
        client_uuid: &str,
        bucket: ScopeBucket,
        names: &[String],
    ) -> DomainResult<()> {
        self.check("assign_client_scopes")?;
        let mut state = self.lock();
        let missing: Vec<String> = names
            .iter()
            .filter(|n| !state.scopes.iter().any(|s| &s.name == *n))
            .cloned()
            .collect();
        let client = state
            .clients
            .iter_mut()
            .find(|c| c.id == client_uuid)
            .ok_or_else(|| DomainError::ResourceNotFound {
                resource: format!("client {client_uuid}"),
                realm: self.realm.clone(),
            })?;
        for name in names.iter().filter(|n| !missing.contains(*n)) {
            match bucket {
                ScopeBucket::Default => client.default_client_scopes.insert(name.clone()),
                ScopeBucket::Optional => client.optional_client_scopes.insert(name.clone()),
            };
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(self.missing(format!("client scopes {}", missing.join(", "))))
        }
    }

    async fn list_realm_client_scopes(&self) -> DomainResult<Vec<ClientScope>> {
        self.check("list_realm_client_scopes")?;
        Ok(self.lock().scopes.clone())
    }

    async fn get_client_scope(&self, name: &str) -> DomainResult<ClientScope> {
        self.check("get_client_scope")?;
        self.lock()
            .scopes
            .iter()
            .find(|s| s.name == name)
            .cloned()
            .ok_or_else(|| self.missing(format!("client scope {name}")))
    }

    async fn list_scope_mappers(&self, scope_id: &str) -> DomainResult<Vec<ProtocolMapper>> {
        self.check("list_scope_mappers")?;
        self.lock()
            .scopes
            .iter()
            .find(|s| s.id.as_deref() == Some(scope_id))
            .map(|s| s.protocol_mappers.clone())
            .ok_or_else(|| self.missing(format!("client scope {scope_id}")))
    }

    async fn create_client_scope(&self, scope: &ClientScope) -> DomainResult<()> {
        self.check("create_client_scope")?;
        let scope_id = self.next_id("scope");
        let mut state = self.lock();
        if state.scopes.iter().any(|s| s.name == scope.name) {
            return Err(Self::conflict("client scope", &scope.name));
        }
        let mut stored = scope.clone();
        stored.id = Some(scope_id.clone());
        for (i, mapper) in stored.protocol_mappers.iter_mut().enumerate() {
            mapper.id = Some(format!("{scope_id}-mapper-{i}"));
        }
        state.scopes.push(stored);
        Ok(())
    }

    async fn create_scope_mapper(
        &self,
        scope_id: &str,
        mapper: &ProtocolMapper,
    ) -> DomainResult<()> {
        self.check("create_scope_mapper")?;
        let mapper_id = self.next_id("mapper");
        let mut state = self.lock();
        let scope = state
            .scopes
            .iter_mut()
            .find(|s| s.id.as_deref() == Some(scope_id))
            .ok_or_else(|| DomainError::ResourceNotFound {
                resource: format!("client scope {scope_id}"),
                realm: self.realm.clone(),
            })?;
        if scope.protocol_mappers.iter().any(|m| m.name == mapper.name) {
            return Err(Self::conflict("protocol mapper", &mapper.name));
        }
        let mut stored = mapper.clone();
        stored.id = Some(mapper_id);
        scope.protocol_mappers.push(stored);
        Ok(())
    }

    async fn list_groups(&self) -> DomainResult<Vec<GroupDetail>> {
        self.check("list_groups")?;
        Ok(self.lock().groups.clone())
    }

    async fn get_group(&self, path: &str) -> DomainResult<GroupDetail> {
        self.check("get_group")?;
        self.lock()
            .all_groups()
            .into_iter()
            .find(|g| g.path == path)
            .cloned()
            .ok_or_else(|| DomainError::GroupNotFound {
                path: path.to_string(),
                realm: self.realm.clone(),
            })
    }

    async fn create_group(
        &self,
        group: &GroupDetail,
        parent_id: Option<&str>,
    ) -> DomainResult<String> {
        self.check("create_group")?;
        let id = self.next_id("group");
        let mut state = self.lock();

        let new_group = |parent_path: &str| GroupDetail {
            id: id.clone(),
            name: group.name.clone(),
            path: format!("{}/{}", parent_path, group.name),
            attributes: group.attributes.clone(),
            ..GroupDetail::default()
        };

        match parent_id {
            Some(parent_id) => {
                let parent = state
                    .find_group_mut(&|g: &GroupDetail| g.id == parent_id)
                    .ok_or_else(|| DomainError::ResourceNotFound {
                        resource: format!("group {parent_id}"),
                        realm: self.realm.clone(),
                    })?;
                if parent.sub_groups.iter().any(|g| g.name == group.name) {
                    return Err(Self::conflict("group", &group.path));
                }
                let child = new_group(&parent.path);
                parent.sub_groups.push(child);
            }
            None => {
                if state.groups.iter().any(|g| g.name == group.name) {
                    return Err(Self::conflict("group", &group.path));
                }
                state.groups.push(new_group(""));
            }
        }
        Ok(id)
    }

    async fn assign_group_realm_roles(&self, group_id: &str, roles: &[Role]) -> DomainResult<()> {
        self.check("assign_group_realm_roles")?;
        let mut state = self.lock();
        let group = state
            .find_group_mut(&|g: &GroupDetail| g.id == group_id)
            .ok_or_else(|| self.missing(format!("group {group_id}")))?;
        for role in roles {
            group.realm_roles.insert(role.name.clone());
        }
        Ok(())
    }

    async fn assign_group_client_roles(
        &self,
        group_id: &str,
        client_uuid: &str,
        roles: &[Role],
    ) -> DomainResult<()> {
        self.check("assign_group_client_roles")?;
        let mut state = self.lock();
        let client_id = state
            .client_id_for(client_uuid)
            .ok_or_else(|| self.missing(format!("client {client_uuid}")))?;
        let group = state
            .find_group_mut(&|g: &GroupDetail| g.id == group_id)
            .ok_or_else(|| self.missing(format!("group {group_id}")))?;
        for role in roles {
            group.client_roles.push(client_id.clone(), role.name.clone());
        }
        Ok(())
    }

    async fn list_users(&self) -> DomainResult<Vec<UserDetail>> {
        self.check("list_users")?;
        Ok(self.lock().users.clone())
    }

    async fn get_user(&self, username: &str) -> DomainResult<UserDetail> {
        self.check("get_user")?;
        self.lock()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| DomainError::UserNotFound {
                username: username.to_string(),
                realm: self.realm.clone(),
            })
    }

    async fn create_user(&self, user: &UserDetail) -> DomainResult<String> {
        self.check("create_user")?;
        let id = self.next_id("user");
        let mut state = self.lock();
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(Self::conflict("user", &user.username));
        }
        state.users.push(UserDetail {
            id: id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            enabled: user.enabled,
            attributes: user.attributes.clone(),
            required_actions: user.required_actions.clone(),
            ..UserDetail::default()
        });
        Ok(id)
    }

    async fn assign_user_realm_roles(&self, user_id: &str, roles: &[Role]) -> DomainResult<()> {
        self.check("assign_user_realm_roles")?;
        let mut state = self.lock();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| DomainError::ResourceNotFound {
                resource: format!("user {user_id}"),
                realm: self.realm.clone(),
            })?;
        for role in roles {
            user.realm_roles.insert(role.name.clone());
        }
        Ok(())
    }

    async fn assign_user_client_roles(
        &self,
        user_id: &str,
        client_uuid: &str,
        roles: &[Role],
    ) -> DomainResult<()> {
        self.check("assign_user_client_roles")?;
        let mut state = self.lock();
        let client_id = state
            .client_id_for(client_uuid)
            .ok_or_else(|| self.missing(format!("client {client_uuid}")))?;
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| DomainError::ResourceNotFound {
                resource: format!("user {user_id}"),
                realm: self.realm.clone(),
            })?;
        for role in roles {
            user.client_roles.push(client_id.clone(), role.name.clone());
        }
        Ok(())
    }

    async fn add_user_to_group(&self, user_id: &str, group_id: &str) -> DomainResult<()> {
        self.check("add_user_to_group")?;
        let mut state = self.lock();
        let path = state
            .all_groups()
            .into_iter()
            .find(|g| g.id == group_id)
            .map(|g| g.path.clone())
            .ok_or_else(|| self.missing(format!("group {group_id}")))?;
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| DomainError::ResourceNotFound {
                resource: format!("user {user_id}"),
                realm: self.realm.clone(),
            })?;
        user.groups.insert(path);
        Ok(())
    }

    async fn export_users(&self) -> DomainResult<Vec<Value>> {
        self.check("export_users")?;
        self.lock()
            .users
            .iter()
            .map(|u| serde_json::to_value(u).map_err(DomainError::from))
            .collect()
    }

    async fn create_user_representation(&self, representation: &Value) -> DomainResult<()> {
        self.check("create_user_representation")?;
        let mut user: UserDetail = serde_json::from_value(representation.clone())?;
        let id = self.next_id("user");
        let mut state = self.lock();
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(Self::conflict("user", &user.username));
        }
        user.id = id;
        state.users.push(user);
        Ok(())
    }

    async fn update_user(&self, user_id: &str, representation: &Value) -> DomainResult<()> {
        self.check("update_user")?;
        let updated: UserDetail = serde_json::from_value(representation.clone())?;
        let mut state = self.lock();
        let existing = state
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| DomainError::ResourceNotFound {
                resource: format!("user {user_id}"),
                realm: self.realm.clone(),
            })?;
        *existing = UserDetail {
            id: existing.id.clone(),
            ..updated
        };
        Ok(())
    }

    async fn list_authz_scopes(&self, client_uuid: &str) -> DomainResult<Vec<AuthzScope>> {
        self.check("list_authz_scopes")?;
        Ok(self.lock().authz_scopes.get(client_uuid).cloned().unwrap_or_default())
    }

    async fn list_resource_permissions(&self, client_uuid: &str) -> DomainResult<Vec<Permission>> {
        self.check("list_resource_permissions")?;
        Ok(self.lock().resource_permissions.get(client_uuid).cloned().unwrap_or_default())
    }

    async fn list_scope_permissions(&self, client_uuid: &str) -> DomainResult<Vec<Permission>> {
        self.check("list_scope_permissions")?;
        Ok(self.lock().scope_permissions.get(client_uuid).cloned().unwrap_or_default())
    }

    async fn list_policies_for_permission(
        &self,
        _client_uuid: &str,
        permission_id: &str,
    ) -> DomainResult<Vec<Policy>> {
        self.check("list_policies_for_permission")?;
        Ok(self.lock().associated_policies.get(permission_id).cloned().unwrap_or_default())
    }

    async fn get_policy(&self, _client_uuid: &str, policy_id: &str) -> DomainResult<Policy> {
        self.check("get_policy")?;
        self.lock()
            .policies
            .get(policy_id)
            .cloned()
            .ok_or_else(|| self.missing(format!("policy {policy_id}")))
    }
}

// Fixture builders

pub fn realm_role(name: &str) -> Role {
    let mut role = Role::new_realm_role(name).unwrap();
    role.id = Some(format!("id-{name}"));
    role
}

pub fn client(uuid: &str, client_id: &str) -> ClientDetail {
    let mut client = ClientDetail::new(uuid, client_id);
    client.name = client_id.to_string();
    client
}

pub fn mapper(name: &str, claim: &str) -> ProtocolMapper {
    ProtocolMapper {
        id: None,
        name: name.to_string(),
        protocol: "openid-connect".to_string(),
        protocol_mapper: "oidc-usermodel-attribute-mapper".to_string(),
        config: [("claim.name".to_string(), claim.to_string())].into_iter().collect(),
        ..ProtocolMapper::default()
    }
}

pub fn scope(id: &str, name: &str, mappers: Vec<ProtocolMapper>) -> ClientScope {
    ClientScope {
        id: Some(id.to_string()),
        name: name.to_string(),
        protocol: Some("openid-connect".to_string()),
        protocol_mappers: mappers,
        ..ClientScope::default()
    }
}

pub fn group(id: &str, path: &str) -> GroupDetail {
    let name = path.rsplit('/').next().unwrap_or(path);
    let mut group = GroupDetail::new(name, path).unwrap();
    group.id = id.to_string();
    group
}

pub fn user(id: &str, username: &str) -> UserDetail {
    UserDetail::new(id, username)
}
