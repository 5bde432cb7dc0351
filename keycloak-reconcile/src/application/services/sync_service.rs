use crate::{
    application::ports::RemoteDirectory,
    domain::{
        entities::*,
        errors::{DomainError, DomainResult},
    },
};
use super::diff_service::scope_mappers;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// What happened to the top-level entity of a sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    Created,
    Updated,
    AlreadyPresent,
}

/// A best-effort step that failed during a sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncWarning {
    pub step: String,
    pub message: String,
}

/// How a failed step affects the sync it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    /// The failure aborts the sync
    Fatal,
    /// The failure is logged and collected as a warning
    BestEffort,
}

/// Outcome of syncing one entity.
///
/// A sync whose primary create/update succeeded is `Ok` even when dependent steps failed;
/// those failures are listed in `warnings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub kind: EntityKind,
    pub identity: String,
    pub action: SyncAction,
    pub warnings: Vec<SyncWarning>,
}

impl SyncReport {
    pub fn new(kind: EntityKind, identity: impl Into<String>, action: SyncAction) -> Self {
        Self {
            kind,
            identity: identity.into(),
            action,
            warnings: Vec::new(),
        }
    }

    /// True when every dependent step succeeded
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Apply `policy` to the outcome of one step.
    pub fn record<T>(
        &mut self,
        policy: StepPolicy,
        step: impl Into<String>,
        result: DomainResult<T>,
    ) -> DomainResult<Option<T>> {
        match (result, policy) {
            (Ok(value), _) => Ok(Some(value)),
            (Err(e), StepPolicy::Fatal) => Err(e),
            (Err(e), StepPolicy::BestEffort) => {
                let step = step.into();
                warn!(
                    kind = %self.kind,
                    identity = %self.identity,
                    step = %step,
                    error = %e,
                    "Sync step failed, continuing"
                );
                self.warnings.push(SyncWarning {
                    step,
                    message: e.to_string(),
                });
                Ok(None)
            }
        }
    }

    pub fn best_effort<T>(
        &mut self,
        step: impl Into<String>,
        result: DomainResult<T>,
    ) -> Option<T> {
        self.record(StepPolicy::BestEffort, step, result).unwrap_or_default()
    }

    pub fn warn(&mut self, step: impl Into<String>, message: impl Into<String>) {
        let (step, message) = (step.into(), message.into());
        warn!(kind = %self.kind, identity = %self.identity, step = %step, "{}", message);
        self.warnings.push(SyncWarning { step, message });
    }
}

/// Replicates single entities from a source realm into a destination realm
pub struct SyncService {
    source: Arc<dyn RemoteDirectory>,
    destination: Arc<dyn RemoteDirectory>,
}

impl SyncService {
    pub fn new(source: Arc<dyn RemoteDirectory>, destination: Arc<dyn RemoteDirectory>) -> Self {
        Self { source, destination }
    }

    pub async fn sync(&self, kind: EntityKind, identity: &str) -> DomainResult<SyncReport> {
        match kind {
            EntityKind::Role => self.sync_role(identity).await,
            EntityKind::Client => self.sync_client(identity).await,
            EntityKind::Group => self.sync_group(identity).await,
            EntityKind::User => self.sync_user(identity).await,
        }
    }

    /// Replicate a realm role by name. Composite members are not carried over.
    #[instrument(
        skip(self),
        fields(source = %self.source.realm(), destination = %self.destination.realm())
    )]
    pub async fn sync_role(&self, name: &str) -> DomainResult<SyncReport> {
        let role = self.source.get_realm_role(name).await?;

        let action = match self.destination.create_realm_role(&role.to_replica()).await {
            Ok(()) => SyncAction::Created,
            Err(e) if e.is_conflict() => SyncAction::AlreadyPresent,
            Err(e) => return Err(e),
        };

        info!("Role '{}' synced: {:?}", name, action);
        Ok(SyncReport::new(EntityKind::Role, name, action))
    }

    /// Replicate a user that the destination does not have yet, then its assignments.
    #[instrument(
        skip(self),
        fields(source = %self.source.realm(), destination = %self.destination.realm())
    )]
    pub async fn sync_user(&self, username: &str) -> DomainResult<SyncReport> {
        let user = self.source.get_user(username).await?;

        if exists(self.destination.get_user(username).await)? {
            debug!("User '{}' already present in destination", username);
            return Ok(SyncReport::new(EntityKind::User, username, SyncAction::AlreadyPresent));
        }

        let user_id = match self.destination.create_user(&user).await {
            Ok(id) => id,
            Err(e) if e.is_conflict() => {
                return Ok(SyncReport::new(EntityKind::User, username, SyncAction::AlreadyPresent));
            }
            Err(e) => return Err(e),
        };
        let mut report = SyncReport::new(EntityKind::User, username, SyncAction::Created);

        let realm_roles = self.resolve_realm_roles(&user.realm_roles, &mut report).await;
        if !realm_roles.is_empty() {
            report.best_effort(
                "assign realm roles",
                self.destination.assign_user_realm_roles(&user_id, &realm_roles).await,
            );
        }

        for (client_id, role_names) in user.client_roles.iter() {
            let resolved = self.resolve_client_roles(client_id, role_names, &mut report).await;
            if let Some((client_uuid, roles)) = resolved {
                report.best_effort(
                    format!("assign client roles of {client_id}"),
                    self.destination
                        .assign_user_client_roles(&user_id, &client_uuid, &roles)
                        .await,
                );
            }
        }

        for path in &user.groups {
            let Some(group) = report.best_effort(
                format!("resolve group {path}"),
                self.destination.get_group(path).await,
            ) else {
                continue;
            };
            report.best_effort(
                format!("join group {path}"),
                self.destination.add_user_to_group(&user_id, &group.id).await,
            );
        }

        info!("User '{}' created with {} warnings", username, report.warnings.len());
        Ok(report)
    }

    /// Replicate a group (without its sub-groups) under an existing parent, then its roles.
    #[instrument(
        skip(self),
        fields(source = %self.source.realm(), destination = %self.destination.realm())
    )]
    pub async fn sync_group(&self, path: &str) -> DomainResult<SyncReport> {
        let group = self.source.get_group(path).await?;

        if exists(self.destination.get_group(path).await)? {
            debug!("Group '{}' already present in destination", path);
            return Ok(SyncReport::new(EntityKind::Group, path, SyncAction::AlreadyPresent));
        }

        let parent_id = match group.parent_path() {
            Some(parent_path) => Some(self.destination.get_group(parent_path).await?.id),
            None => None,
        };

        let group_id = match self.destination.create_group(&group, parent_id.as_deref()).await {
            Ok(id) => id,
            Err(e) if e.is_conflict() => {
                return Ok(SyncReport::new(EntityKind::Group, path, SyncAction::AlreadyPresent));
            }
            Err(e) => return Err(e),
        };
        let mut report = SyncReport::new(EntityKind::Group, path, SyncAction::Created);

        let realm_roles = self.resolve_realm_roles(&group.realm_roles, &mut report).await;
        if !realm_roles.is_empty() {
            report.best_effort(
                "assign realm roles",
                self.destination.assign_group_realm_roles(&group_id, &realm_roles).await,
            );
        }

        for (client_id, role_names) in group.client_roles.iter() {
            let resolved = self.resolve_client_roles(client_id, role_names, &mut report).await;
            if let Some((client_uuid, roles)) = resolved {
                report.best_effort(
                    format!("assign client roles of {client_id}"),
                    self.destination
                        .assign_group_client_roles(&group_id, &client_uuid, &roles)
                        .await,
                );
            }
        }

        info!("Group '{}' created with {} warnings", path, report.warnings.len());
        Ok(report)
    }

    /// Replicate a client with its roles, scopes and scope mappers.
    ///
    /// Only the create/update of the client itself is fatal.
    #[instrument(
        skip(self),
        fields(source = %self.source.realm(), destination = %self.destination.realm())
    )]
    pub async fn sync_client(&self, client_id: &str) -> DomainResult<SyncReport> {
        let source_client = self.source.get_client(client_id).await?;
        let mut representation = self.source.export_client(&source_client.id).await?;
        if let Value::Object(fields) = &mut representation {
            fields.remove("id");
        }

        let (action, known_uuid) = self.upsert_client(client_id, &mut representation).await?;
        let mut report = SyncReport::new(EntityKind::Client, client_id, action);

        let destination_uuid = match known_uuid {
            Some(uuid) => uuid,
            None => match self.destination.get_client(client_id).await {
                Ok(client) => client.id,
                Err(e) => {
                    report.warn(
                        "resolve created client",
                        format!("{e}; roles and scopes were not synced"),
                    );
                    return Ok(report);
                }
            },
        };

        self.sync_client_roles(&source_client.id, &destination_uuid, &mut report).await;
        self.sync_client_scopes(&source_client, &mut report).await;

        for bucket in ScopeBucket::ALL {
            let names = source_client.scopes(bucket).to_vec();
            report.best_effort(
                format!("assign {bucket} client scopes"),
                self.destination.assign_client_scopes(&destination_uuid, bucket, &names).await,
            );
        }

        info!(
            "Client '{}' synced: {:?} with {} warnings",
            client_id,
            report.action,
            report.warnings.len()
        );
        Ok(report)
    }

    /// Update the client in place when the destination has it, create it otherwise.
    /// Returns the action and, when already known, the destination uuid.
    async fn upsert_client(
        &self,
        client_id: &str,
        representation: &mut Value,
    ) -> DomainResult<(SyncAction, Option<String>)> {
        match self.destination.get_client(client_id).await {
            Ok(existing) => {
                self.update_client(&existing.id, representation).await?;
                return Ok((SyncAction::Updated, Some(existing.id)));
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        match self.destination.create_client(representation).await {
            Ok(()) => Ok((SyncAction::Created, None)),
            Err(e) if e.is_conflict() => {
                debug!("Client '{}' appeared concurrently, updating instead", client_id);
                let existing = self.destination.get_client(client_id).await?;
                self.update_client(&existing.id, representation).await?;
                Ok((SyncAction::Updated, Some(existing.id)))
            }
            Err(e) => Err(e),
        }
    }

    async fn update_client(
        &self,
        destination_uuid: &str,
        representation: &mut Value,
    ) -> DomainResult<()> {
        if let Value::Object(fields) = representation {
            fields.insert("id".to_string(), Value::String(destination_uuid.to_string()));
        }
        self.destination.update_client(destination_uuid, representation).await
    }

    /// Create the client roles the destination lacks.
    async fn sync_client_roles(
        &self,
        source_uuid: &str,
        destination_uuid: &str,
        report: &mut SyncReport,
    ) {
        let Some(source_roles) = report.best_effort(
            "list source client roles",
            self.source.list_client_roles(source_uuid).await,
        ) else {
            return;
        };
        let Some(destination_roles) = report.best_effort(
            "list destination client roles",
            self.destination.list_client_roles(destination_uuid).await,
        ) else {
            return;
        };

        let present: StringSet = destination_roles.iter().map(|r| r.name.as_str()).collect();
        for role in source_roles.iter().filter(|r| !present.contains(&r.name)) {
            let step = format!("create client role {}", role.name);
            let Some(full) = report.best_effort(
                step.clone(),
                self.source.get_client_role(source_uuid, &role.name).await,
            ) else {
                continue;
            };
            report.best_effort(
                step,
                ignore_conflict(
                    self.destination
                        .create_client_role(destination_uuid, &full.to_replica())
                        .await,
                ),
            );
        }
    }

    /// Make every scope the source client references exist in the destination with at
    /// least the source's mappers. Existing mappers are never modified.
    async fn sync_client_scopes(&self, source_client: &ClientDetail, report: &mut SyncReport) {
        for scope_name in &source_client.all_scopes() {
            let Some(source_scope) = report.best_effort(
                format!("read scope {scope_name}"),
                self.source.get_client_scope(scope_name).await,
            ) else {
                continue;
            };
            let Some(source_mappers) = report.best_effort(
                format!("read mappers of scope {scope_name}"),
                scope_mappers(self.source.as_ref(), &source_scope).await,
            ) else {
                continue;
            };

            match self.destination.get_client_scope(scope_name).await {
                Err(e) if e.is_not_found() => {
                    let definition = ClientScope {
                        protocol_mappers: source_mappers,
                        ..source_scope
                    }
                    .to_replica();
                    report.best_effort(
                        format!("create scope {scope_name}"),
                        ignore_conflict(self.destination.create_client_scope(&definition).await),
                    );
                }
                Err(e) => {
                    let step = format!("read destination scope {scope_name}");
                    report.best_effort::<()>(step, Err(e));
                }
                Ok(destination_scope) => {
                    self.add_missing_mappers(
                        scope_name,
                        &source_mappers,
                        &destination_scope,
                        report,
                    )
                    .await;
                }
            }
        }
    }

    async fn add_missing_mappers(
        &self,
        scope_name: &str,
        source_mappers: &[ProtocolMapper],
        destination_scope: &ClientScope,
        report: &mut SyncReport,
    ) {
        let Some(scope_id) = destination_scope.id.as_deref() else {
            report.warn(
                format!("reconcile mappers of scope {scope_name}"),
                "Destination scope has no id",
            );
            return;
        };
        let Some(destination_mappers) = report.best_effort(
            format!("read destination mappers of scope {scope_name}"),
            scope_mappers(self.destination.as_ref(), destination_scope).await,
        ) else {
            return;
        };

        for mapper in source_mappers {
            match destination_mappers.iter().find(|m| m.name == mapper.name) {
                None => {
                    report.best_effort(
                        format!("create mapper {} in scope {scope_name}", mapper.name),
                        ignore_conflict(
                            self.destination
                                .create_scope_mapper(scope_id, &mapper.to_replica())
                                .await,
                        ),
                    );
                }
                Some(existing) if !existing.same_definition(mapper) => {
                    debug!(
                        scope = %scope_name,
                        mapper = %mapper.name,
                        "Mapper differs in destination, leaving it untouched"
                    );
                }
                Some(_) => {}
            }
        }
    }

    async fn resolve_realm_roles(&self, names: &StringSet, report: &mut SyncReport) -> Vec<Role> {
        let mut roles = Vec::with_capacity(names.len());
        for name in names {
            let step = format!("resolve realm role {name}");
            let resolved = self.destination.get_realm_role(name).await;
            if let Some(role) = report.best_effort(step, resolved) {
                roles.push(role);
            }
        }
        roles
    }

    /// Destination client uuid plus the named roles that exist on it.
    async fn resolve_client_roles(
        &self,
        client_id: &str,
        names: &[String],
        report: &mut SyncReport,
    ) -> Option<(String, Vec<Role>)> {
        let client = report.best_effort(
            format!("resolve client {client_id}"),
            self.destination.get_client(client_id).await,
        )?;

        let mut roles = Vec::with_capacity(names.len());
        for name in names {
            if let Some(role) = report.best_effort(
                format!("resolve client role {client_id}/{name}"),
                self.destination.get_client_role(&client.id, name).await,
            ) {
                roles.push(role);
            }
        }

        if roles.is_empty() {
            None
        } else {
            Some((client.id, roles))
        }
    }
}

/// `Ok(true)` when found, `Ok(false)` when not found, other failures propagate.
fn exists<T>(lookup: DomainResult<T>) -> DomainResult<bool> {
    match lookup {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

fn ignore_conflict(result: DomainResult<()>) -> DomainResult<()> {
    match result {
        Err(DomainError::AlreadyExists { .. }) => Ok(()),
        other => other,
    }
}
