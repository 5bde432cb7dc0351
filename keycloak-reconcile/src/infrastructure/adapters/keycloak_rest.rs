use async_trait::async_trait;
use reqwest::{header, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::keycloak_token_manager::KeycloakTokenManager;
use crate::application::ports::*;
use crate::domain::{entities::*, errors::*};

/// Page size used for every paged admin listing
pub const PAGE_SIZE: usize = 100;

/// Tokens are re-acquired this many seconds before they expire
pub const TOKEN_REFRESH_MARGIN_SECONDS: i64 = 30;

/// Keycloak admin REST adapter implementing the RemoteDirectory port for one realm
pub struct KeycloakRestDirectory {
    handle: RealmHandle,
    base_url: Url,
    client: reqwest::Client,
    token_manager: Arc<dyn TokenManager>,
    token: Mutex<Option<AuthToken>>,
}

impl KeycloakRestDirectory {
    pub fn new(handle: RealmHandle, http: &HttpConfig) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(http.get_timeout())
            .connect_timeout(http.get_connect_timeout())
            .user_agent(http.user_agent.as_str())
            .build()
            .map_err(|e| DomainError::Configuration {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        let token_manager = Arc::new(KeycloakTokenManager::new_with_client(client.clone()));
        Self::with_parts(handle, client, token_manager)
    }

    pub fn with_parts(
        handle: RealmHandle,
        client: reqwest::Client,
        token_manager: Arc<dyn TokenManager>,
    ) -> DomainResult<Self> {
        let base_url = Url::parse(&handle.base_url).map_err(|e| ConfigError::InvalidValue {
            key: "base_url".to_string(),
            message: format!("'{}': {}", handle.base_url, e),
        })?;

        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidValue {
                key: "base_url".to_string(),
                message: format!("'{}' cannot be used as a base URL", handle.base_url),
            }
            .into());
        }

        Ok(Self {
            handle,
            base_url,
            client,
            token_manager,
            token: Mutex::new(None),
        })
    }

    pub fn handle(&self) -> &RealmHandle {
        &self.handle
    }

    async fn bearer(&self) -> DomainResult<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if !token.is_expiring_soon(TOKEN_REFRESH_MARGIN_SECONDS) {
                return Ok(token.access_token.clone());
            }
        }

        let token = self.token_manager.acquire_token(&self.handle).await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    /// `{base}/admin/realms/{realm}/{segments...}` with each segment percent-encoded
    fn admin_url(&self, segments: &[&str]) -> DomainResult<Url> {
        self.url_under(&["admin", "realms", self.handle.realm.as_str()], segments)
    }

    /// `{base}/admin/realms`
    fn realms_url(&self) -> DomainResult<Url> {
        self.url_under(&["admin", "realms"], &[])
    }

    fn url_under(&self, prefix: &[&str], segments: &[&str]) -> DomainResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DomainError::Configuration {
                message: format!("'{}' cannot be used as a base URL", self.handle.base_url),
            })?
            .pop_if_empty()
            .extend(prefix)
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        op: &Op,
    ) -> DomainResult<reqwest::Response> {
        let token = self.bearer().await?;
        debug!(method = %method, url = %url, "Admin API request");

        let mut request = self.client.request(method, url.clone()).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| DomainError::Connectivity {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        self.check_status(response, op).await
    }

    async fn check_status(
        &self,
        response: reqwest::Response,
        op: &Op,
    ) -> DomainResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::NOT_FOUND => DomainError::ResourceNotFound {
                resource: op.to_string(),
                realm: self.handle.realm.clone(),
            },
            StatusCode::CONFLICT => DomainError::AlreadyExists {
                entity_type: op.kind.to_string(),
                identifier: op.identity.clone(),
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                if status == StatusCode::UNAUTHORIZED {
                    self.token.lock().await.take();
                }
                DomainError::AuthenticationFailed {
                    reason: format!("{op}: HTTP {status}"),
                }
            }
            _ => DomainError::RemoteRejected {
                status: status.as_u16(),
                operation: op.to_string(),
                body,
            },
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, op: &Op) -> DomainResult<T> {
        let response = self.send(Method::GET, url, None, op).await?;
        response.json::<T>().await.map_err(|e| DomainError::Serialization {
            message: format!("{op}: {e}"),
        })
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str], op: &Op) -> DomainResult<T> {
        self.get_json(self.admin_url(segments)?, op).await
    }

    /// Follow `first`/`max` paging until a short page comes back
    async fn get_paged<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
        op: &Op,
    ) -> DomainResult<Vec<T>> {
        let mut items = Vec::new();
        let mut first = 0usize;

        loop {
            let mut url = self.admin_url(segments)?;
            url.query_pairs_mut()
                .extend_pairs(query)
                .append_pair("first", &first.to_string())
                .append_pair("max", &PAGE_SIZE.to_string());

            let page: Vec<T> = self.get_json(url, op).await?;
            let len = page.len();
            items.extend(page);

            if len < PAGE_SIZE {
                break;
            }
            first += len;
        }

        Ok(items)
    }

    /// POST and return the id from the `Location` header, when the server sends one
    async fn post(&self, segments: &[&str], body: Value, op: &Op) -> DomainResult<Option<String>> {
        let response = self.send(Method::POST, self.admin_url(segments)?, Some(body), op).await?;
        Ok(created_id(&response))
    }

    async fn put(&self, segments: &[&str], body: Option<Value>, op: &Op) -> DomainResult<()> {
        self.send(Method::PUT, self.admin_url(segments)?, body, op).await?;
        Ok(())
    }

    fn not_found(
        &self,
        err: DomainError,
        typed: impl FnOnce(String) -> DomainError,
    ) -> DomainError {
        if err.is_not_found() {
            typed(self.handle.realm.clone())
        } else {
            err
        }
    }

    async fn find_client(&self, client_id: &str) -> DomainResult<ClientRepresentation> {
        let mut url = self.admin_url(&["clients"])?;
        url.query_pairs_mut().append_pair("clientId", client_id);

        let candidates: Vec<ClientRepresentation> =
            self.get_json(url, &Op::new("client", client_id)).await?;
        candidates
            .into_iter()
            .find(|c| c.client_id.as_deref() == Some(client_id))
            .ok_or_else(|| DomainError::ClientNotFound {
                client_id: client_id.to_string(),
                realm: self.handle.realm.clone(),
            })
    }

    async fn client_detail(
        &self,
        representation: ClientRepresentation,
    ) -> DomainResult<ClientDetail> {
        let mut client = representation.into_detail();

        client.default_client_scopes = self
            .list_client_scopes(&client.id, ScopeBucket::Default)
            .await?
            .into_iter()
            .collect();
        client.optional_client_scopes = self
            .list_client_scopes(&client.id, ScopeBucket::Optional)
            .await?
            .into_iter()
            .collect();
        client.client_roles = self
            .list_client_roles(&client.id)
            .await?
            .into_iter()
            .map(|r| r.name)
            .collect();

        Ok(client)
    }

    async fn role_mappings(&self, owner: &str, id: &str) -> DomainResult<(StringSet, MultiMap)> {
        let mappings: MappingsRepresentation = self
            .get(&[owner, id, "role-mappings"], &Op::new("role mappings", id))
            .await?;
        Ok(mappings.into_sets())
    }

    fn group_detail(
        &self,
        representation: GroupRepresentation,
    ) -> Pin<Box<dyn Future<Output = DomainResult<GroupDetail>> + Send + '_>> {
        Box::pin(async move {
            let id = representation.id.clone().unwrap_or_default();
            let (realm_roles, client_roles) = self.role_mappings("groups", &id).await?;

            let children = if !representation.sub_groups.is_empty() {
                representation.sub_groups
            } else if representation.sub_group_count.unwrap_or(0) > 0 {
                self.get_paged(
                    &["groups", id.as_str(), "children"],
                    &[("briefRepresentation", "false")],
                    &Op::new("group children", &id),
                )
                .await?
            } else {
                Vec::new()
            };

            let mut sub_groups = Vec::with_capacity(children.len());
            for child in children {
                sub_groups.push(self.group_detail(child).await?);
            }

            Ok(GroupDetail {
                id,
                name: representation.name.unwrap_or_default(),
                path: representation.path.unwrap_or_default(),
                sub_groups,
                realm_roles,
                client_roles,
                attributes: representation.attributes.into_iter().collect(),
            })
        })
    }

    async fn user_detail(&self, representation: UserRepresentation) -> DomainResult<UserDetail> {
        let id = representation.id.clone().unwrap_or_default();
        let (realm_roles, client_roles) = self.role_mappings("users", &id).await?;
        let groups: Vec<GroupRepresentation> = self
            .get_paged(&["users", id.as_str(), "groups"], &[], &Op::new("user groups", &id))
            .await?;

        Ok(UserDetail {
            id,
            username: representation.username.unwrap_or_default(),
            email: representation.email,
            first_name: representation.first_name,
            last_name: representation.last_name,
            enabled: representation.enabled.unwrap_or(true),
            realm_roles,
            client_roles,
            groups: groups.into_iter().filter_map(|g| g.path).collect(),
            attributes: representation.attributes.into_iter().collect(),
            required_actions: representation.required_actions.into_iter().collect(),
        })
    }

    fn authz_segments<'a>(client_uuid: &'a str, rest: &[&'a str]) -> Vec<&'a str> {
        let mut segments = vec!["clients", client_uuid, "authz", "resource-server"];
        segments.extend_from_slice(rest);
        segments
    }

    async fn list_permissions(
        &self,
        client_uuid: &str,
        kind: &str,
    ) -> DomainResult<Vec<Permission>> {
        let op = Op::new("permissions", client_uuid);
        let representations: Vec<PolicyRepresentation> = self
            .get(&Self::authz_segments(client_uuid, &["permission", kind]), &op)
            .await?;

        let mut permissions = Vec::with_capacity(representations.len());
        for representation in representations {
            let mut permission = representation.into_permission();
            if permission.scopes.is_empty() {
                permission.scopes = self.permission_scope_names(client_uuid, &permission.id).await?;
            }
            permissions.push(permission);
        }
        Ok(permissions)
    }

    async fn permission_scope_names(
        &self,
        client_uuid: &str,
        permission_id: &str,
    ) -> DomainResult<Vec<String>> {
        let segments = Self::authz_segments(client_uuid, &["policy", permission_id, "scopes"]);
        match self
            .get::<Vec<AuthzScope>>(&segments, &Op::new("permission scopes", permission_id))
            .await
        {
            Ok(scopes) => Ok(scopes.into_iter().map(|s| s.name).collect()),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                debug!(
                    permission = %permission_id,
                    error = %e,
                    "No scopes readable for permission"
                );
                Ok(Vec::new())
            }
        }
    }
}

#[async_trait]
impl RemoteDirectory for KeycloakRestDirectory {
    fn realm(&self) -> &str {
        &self.handle.realm
    }

    // Realm
    async fn export_realm(&self) -> DomainResult<Value> {
        self.get(&[], &Op::new("realm", &self.handle.realm)).await
    }

    async fn import_realm(&self, representation: &Value) -> DomainResult<()> {
        let realm = representation.get("realm").and_then(Value::as_str).unwrap_or_default();
        self.send(
            Method::POST,
            self.realms_url()?,
            Some(representation.clone()),
            &Op::new("realm", realm),
        )
        .await
            .map(|_| ())
    }

    // Realm roles
    async fn list_realm_roles(&self) -> DomainResult<Vec<Role>> {
        self.get_paged(&["roles"], &[], &Op::new("realm roles", "*")).await
    }

    async fn get_realm_role(&self, name: &str) -> DomainResult<Role> {
        self.get(&["roles", name], &Op::new("realm role", name))
            .await
            .map_err(|e| {
                self.not_found(e, |realm| DomainError::RoleNotFound {
                    role_name: name.to_string(),
                    realm,
                })
            })
    }

    async fn create_realm_role(&self, role: &Role) -> DomainResult<()> {
        self.post(&["roles"], serde_json::to_value(role)?, &Op::new("realm role", &role.name))
            .await
            .map(|_| ())
    }

    async fn list_composite_roles(&self, role: &Role) -> DomainResult<Vec<Role>> {
        let op = Op::new("composite roles", &role.name);
        match role.id.as_deref() {
            Some(id) => self.get(&["roles-by-id", id, "composites"], &op).await,
            None => self.get(&["roles", role.name.as_str(), "composites"], &op).await,
        }
    }

    // Clients
    async fn list_clients(&self) -> DomainResult<Vec<ClientDetail>> {
        let representations: Vec<ClientRepresentation> =
            self.get_paged(&["clients"], &[], &Op::new("clients", "*")).await?;

        let mut clients = Vec::with_capacity(representations.len());
        for representation in representations {
            clients.push(self.client_detail(representation).await?);
        }
        Ok(clients)
    }

    async fn get_client(&self, client_id: &str) -> DomainResult<ClientDetail> {
        let representation = self.find_client(client_id).await?;
        self.client_detail(representation).await
    }

    async fn export_client(&self, client_uuid: &str) -> DomainResult<Value> {
        self.get(&["clients", client_uuid], &Op::new("client", client_uuid))
            .await
            .map_err(|e| {
                self.not_found(e, |realm| DomainError::ClientNotFound {
                    client_id: client_uuid.to_string(),
                    realm,
                })
            })
    }

    async fn create_client(&self, representation: &Value) -> DomainResult<()> {
        let client_id = representation.get("clientId").and_then(Value::as_str).unwrap_or_default();
        self.post(&["clients"], representation.clone(), &Op::new("client", client_id))
            .await
            .map(|_| ())
    }

    async fn update_client(&self, client_uuid: &str, representation: &Value) -> DomainResult<()> {
        self.put(
            &["clients", client_uuid],
            Some(representation.clone()),
            &Op::new("client", client_uuid),
        )
        .await
    }

    async fn list_client_roles(&self, client_uuid: &str) -> DomainResult<Vec<Role>> {
        let op = Op::new("client roles", client_uuid);
        self.get_paged(&["clients", client_uuid, "roles"], &[], &op)
            .await
    }

    async fn get_client_role(&self, client_uuid: &str, name: &str) -> DomainResult<Role> {
        self.get(&["clients", client_uuid, "roles", name], &Op::new("client role", name))
            .await
            .map_err(|e| {
                self.not_found(e, |realm| DomainError::RoleNotFound {
                    role_name: name.to_string(),
                    realm,
                })
            })
    }

    async fn create_client_role(&self, client_uuid: &str, role: &Role) -> DomainResult<()> {
        self.post(
            &["clients", client_uuid, "roles"],
            serde_json::to_value(role)?,
            &Op::new("client role", &role.name),
        )
        .await
        .map(|_| ())
    }

    async fn list_client_scopes(
        &self,
        client_uuid: &str,
        bucket: ScopeBucket,
    ) -> DomainResult<Vec<String>> {
        let scopes: Vec<ScopeReference> = self
            .get(
                &["clients", client_uuid, bucket.path_segment()],
                &Op::new("client scopes", client_uuid),
            )
            .await?;
        Ok(scopes.into_iter().map(|s| s.name).collect())
    }

    async fn assign_client_scopes(
        &self,
        client_uuid: &str,
        bucket: ScopeBucket,
        names: &[String],
    ) -> DomainResult<()> {
        if names.is_empty() {
            return Ok(());
        }

        let realm_scopes: HashMap<String, String> = self
            .list_realm_client_scopes()
            .await?
            .into_iter()
            .filter_map(|s| s.id.map(|id| (s.name, id)))
            .collect();

        let mut missing = Vec::new();
        let mut failures = Vec::new();
        for name in names {
            let Some(scope_id) = realm_scopes.get(name) else {
                missing.push(name.as_str());
                continue;
            };
            let assigned = self
                .put(
                    &["clients", client_uuid, bucket.path_segment(), scope_id.as_str()],
                    None,
                    &Op::new("client scope assignment", name),
                )
                .await;
            match assigned {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    debug!(scope = %name, bucket = %bucket, error = %e, "Scope assignment failed");
                    failures.push(format!("{name}: {e}"));
                }
            }
        }

        if !failures.is_empty() {
            failures.extend(missing.iter().map(|name| format!("{name}: not found")));
            Err(DomainError::Incomplete {
                operation: format!("assign {bucket} client scopes"),
                failures,
            })
        } else if missing.is_empty() {
            Ok(())
        } else {
            Err(DomainError::ResourceNotFound {
                resource: format!("client scopes {}", missing.join(", ")),
                realm: self.handle.realm.clone(),
            })
        }
    }

    // Client scopes
    async fn list_realm_client_scopes(&self) -> DomainResult<Vec<ClientScope>> {
        self.get(&["client-scopes"], &Op::new("client scopes", "*")).await
    }

    async fn get_client_scope(&self, name: &str) -> DomainResult<ClientScope> {
        self.list_realm_client_scopes()
            .await?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| DomainError::ResourceNotFound {
                resource: format!("client scope '{name}'"),
                realm: self.handle.realm.clone(),
            })
    }

    async fn list_scope_mappers(&self, scope_id: &str) -> DomainResult<Vec<ProtocolMapper>> {
        self.get(
            &["client-scopes", scope_id, "protocol-mappers", "models"],
            &Op::new("protocol mappers", scope_id),
        )
        .await
    }

    async fn create_client_scope(&self, scope: &ClientScope) -> DomainResult<()> {
        let op = Op::new("client scope", &scope.name);
        self.post(&["client-scopes"], serde_json::to_value(scope)?, &op)
            .await
            .map(|_| ())
    }

    async fn create_scope_mapper(
        &self,
        scope_id: &str,
        mapper: &ProtocolMapper,
    ) -> DomainResult<()> {
        self.post(
            &["client-scopes", scope_id, "protocol-mappers", "models"],
            serde_json::to_value(mapper)?,
            &Op::new("protocol mapper", &mapper.name),
        )
        .await
        .map(|_| ())
    }

    // Groups
    async fn list_groups(&self) -> DomainResult<Vec<GroupDetail>> {
        let representations: Vec<GroupRepresentation> = self
            .get_paged(&["groups"], &[("briefRepresentation", "false")], &Op::new("groups", "*"))
            .await?;

        let mut groups = Vec::with_capacity(representations.len());
        for representation in representations {
            groups.push(self.group_detail(representation).await?);
        }
        Ok(groups)
    }

    async fn get_group(&self, path: &str) -> DomainResult<GroupDetail> {
        let mut segments = vec!["group-by-path"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));

        let representation: GroupRepresentation = self
            .get(&segments, &Op::new("group", path))
            .await
            .map_err(|e| {
                self.not_found(e, |realm| DomainError::GroupNotFound {
                    path: path.to_string(),
                    realm,
                })
            })?;
        self.group_detail(representation).await
    }

    async fn create_group(
        &self,
        group: &GroupDetail,
        parent_id: Option<&str>,
    ) -> DomainResult<String> {
        let body = serde_json::json!({
            "name": group.name,
            "attributes": group.attributes,
        });
        let op = Op::new("group", &group.path);

        let created = match parent_id {
            Some(parent) => self.post(&["groups", parent, "children"], body, &op).await?,
            None => self.post(&["groups"], body, &op).await?,
        };

        match created {
            Some(id) => Ok(id),
            None => Ok(self.get_group(&group.path).await?.id),
        }
    }

    async fn assign_group_realm_roles(&self, group_id: &str, roles: &[Role]) -> DomainResult<()> {
        self.post(
            &["groups", group_id, "role-mappings", "realm"],
            serde_json::to_value(roles)?,
            &Op::new("group realm roles", group_id),
        )
        .await
        .map(|_| ())
    }

    async fn assign_group_client_roles(
        &self,
        group_id: &str,
        client_uuid: &str,
        roles: &[Role],
    ) -> DomainResult<()> {
        self.post(
            &["groups", group_id, "role-mappings", "clients", client_uuid],
            serde_json::to_value(roles)?,
            &Op::new("group client roles", group_id),
        )
        .await
        .map(|_| ())
    }

    // Users
    async fn list_users(&self) -> DomainResult<Vec<UserDetail>> {
        let representations: Vec<UserRepresentation> = self
            .get_paged(&["users"], &[("briefRepresentation", "false")], &Op::new("users", "*"))
            .await?;

        let mut users = Vec::with_capacity(representations.len());
        for representation in representations {
            users.push(self.user_detail(representation).await?);
        }
        Ok(users)
    }

    async fn get_user(&self, username: &str) -> DomainResult<UserDetail> {
        let mut url = self.admin_url(&["users"])?;
        url.query_pairs_mut()
            .append_pair("username", username)
            .append_pair("exact", "true");

        let candidates: Vec<UserRepresentation> =
            self.get_json(url, &Op::new("user", username)).await?;
        let representation = candidates
            .into_iter()
            .find(|u| u.username.as_deref() == Some(username))
            .ok_or_else(|| DomainError::UserNotFound {
                username: username.to_string(),
                realm: self.handle.realm.clone(),
            })?;

        self.user_detail(representation).await
    }

    async fn create_user(&self, user: &UserDetail) -> DomainResult<String> {
        let body = serde_json::to_value(NewUserRepresentation::from(user))?;
        match self.post(&["users"], body, &Op::new("user", &user.username)).await? {
            Some(id) => Ok(id),
            None => Ok(self.get_user(&user.username).await?.id),
        }
    }

    async fn assign_user_realm_roles(&self, user_id: &str, roles: &[Role]) -> DomainResult<()> {
        self.post(
            &["users", user_id, "role-mappings", "realm"],
            serde_json::to_value(roles)?,
            &Op::new("user realm roles", user_id),
        )
        .await
        .map(|_| ())
    }

    async fn assign_user_client_roles(
        &self,
        user_id: &str,
        client_uuid: &str,
        roles: &[Role],
    ) -> DomainResult<()> {
        self.post(
            &["users", user_id, "role-mappings", "clients", client_uuid],
            serde_json::to_value(roles)?,
            &Op::new("user client roles", user_id),
        )
        .await
        .map(|_| ())
    }

    async fn add_user_to_group(&self, user_id: &str, group_id: &str) -> DomainResult<()> {
        let op = Op::new("group membership", group_id);
        self.put(&["users", user_id, "groups", group_id], None, &op)
            .await
    }

    async fn export_users(&self) -> DomainResult<Vec<Value>> {
        self.get_paged(&["users"], &[("briefRepresentation", "false")], &Op::new("users", "*"))
            .await
    }

    async fn create_user_representation(&self, representation: &Value) -> DomainResult<()> {
        let username = representation.get("username").and_then(Value::as_str).unwrap_or_default();
        self.post(&["users"], representation.clone(), &Op::new("user", username))
            .await
            .map(|_| ())
    }

    async fn update_user(&self, user_id: &str, representation: &Value) -> DomainResult<()> {
        self.put(&["users", user_id], Some(representation.clone()), &Op::new("user", user_id))
            .await
    }

    // Authorization services
    async fn list_authz_scopes(&self, client_uuid: &str) -> DomainResult<Vec<AuthzScope>> {
        self.get(
            &Self::authz_segments(client_uuid, &["scope"]),
            &Op::new("authorization scopes", client_uuid),
        )
        .await
    }

    async fn list_resource_permissions(&self, client_uuid: &str) -> DomainResult<Vec<Permission>> {
        self.list_permissions(client_uuid, "resource").await
    }

    async fn list_scope_permissions(&self, client_uuid: &str) -> DomainResult<Vec<Permission>> {
        self.list_permissions(client_uuid, "scope").await
    }

    async fn list_policies_for_permission(
        &self,
        client_uuid: &str,
        permission_id: &str,
    ) -> DomainResult<Vec<Policy>> {
        self.get(
            &Self::authz_segments(client_uuid, &["policy", permission_id, "associatedPolicies"]),
            &Op::new("associated policies", permission_id),
        )
        .await
    }

    async fn get_policy(&self, client_uuid: &str, policy_id: &str) -> DomainResult<Policy> {
        self.get(
            &Self::authz_segments(client_uuid, &["policy", policy_id]),
            &Op::new("policy", policy_id),
        )
        .await
    }
}

/// Kind and identity of the entity a request targets, for error reporting
struct Op {
    kind: &'static str,
    identity: String,
}

impl Op {
    fn new(kind: &'static str, identity: &str) -> Self {
        Self {
            kind,
            identity: identity.to_string(),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.identity)
    }
}

fn created_id(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|location| location.trim_end_matches('/').rsplit('/').next())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ClientRepresentation {
    id: Option<String>,
    client_id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    protocol: Option<String>,
    redirect_uris: Vec<String>,
    web_origins: Vec<String>,
    public_client: bool,
    bearer_only: bool,
    direct_access_grants_enabled: bool,
    service_accounts_enabled: bool,
    enabled: Option<bool>,
}

impl ClientRepresentation {
    fn into_detail(self) -> ClientDetail {
        ClientDetail {
            id: self.id.unwrap_or_default(),
            client_id: self.client_id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            description: self.description,
            protocol: self.protocol.unwrap_or_else(|| "openid-connect".to_string()),
            redirect_uris: self.redirect_uris.into_iter().collect(),
            web_origins: self.web_origins.into_iter().collect(),
            public_client: self.public_client,
            bearer_only: self.bearer_only,
            direct_access_grants_enabled: self.direct_access_grants_enabled,
            service_accounts_enabled: self.service_accounts_enabled,
            enabled: self.enabled.unwrap_or(true),
            ..ClientDetail::default()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScopeReference {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GroupRepresentation {
    id: Option<String>,
    name: Option<String>,
    path: Option<String>,
    sub_groups: Vec<GroupRepresentation>,
    sub_group_count: Option<u64>,
    attributes: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UserRepresentation {
    id: Option<String>,
    username: Option<String>,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    enabled: Option<bool>,
    attributes: BTreeMap<String, Vec<String>>,
    required_actions: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewUserRepresentation<'a> {
    username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_name: Option<&'a str>,
    enabled: bool,
    attributes: &'a MultiMap,
    required_actions: Vec<String>,
}

impl<'a> From<&'a UserDetail> for NewUserRepresentation<'a> {
    fn from(user: &'a UserDetail) -> Self {
        Self {
            username: &user.username,
            email: user.email.as_deref(),
            first_name: user.first_name.as_deref(),
            last_name: user.last_name.as_deref(),
            enabled: user.enabled,
            attributes: &user.attributes,
            required_actions: user.required_actions.to_vec(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MappingsRepresentation {
    realm_mappings: Vec<Role>,
    /// Keyed by clientId
    client_mappings: BTreeMap<String, ClientMappingsRepresentation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ClientMappingsRepresentation {
    mappings: Vec<Role>,
}

impl MappingsRepresentation {
    fn into_sets(self) -> (StringSet, MultiMap) {
        let realm_roles: StringSet = self.realm_mappings.into_iter().map(|r| r.name).collect();
        let client_roles: MultiMap = self
            .client_mappings
            .into_iter()
            .map(|(client_id, m)| {
                let names: Vec<String> = m.mappings.into_iter().map(|r| r.name).collect();
                (client_id, names)
            })
            .collect();
        (realm_roles, client_roles)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PolicyRepresentation {
    id: String,
    name: String,
    #[serde(rename = "type")]
    policy_type: String,
    description: Option<String>,
    scopes: Vec<String>,
    policies: Vec<String>,
}

impl PolicyRepresentation {
    fn into_permission(self) -> Permission {
        Permission {
            id: self.id,
            name: self.name,
            permission_type: self.policy_type,
            description: self.description,
            scopes: self.scopes,
            policies: self.policies,
        }
    }
}
