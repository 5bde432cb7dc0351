use crate::{
    application::ports::RemoteDirectory,
    domain::errors::{DomainError, DomainResult},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// What an export or import covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferTarget {
    /// The realm representation itself
    Realm,
    Users,
    Clients,
}

impl fmt::Display for TransferTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferTarget::Realm => write!(f, "realm"),
            TransferTarget::Users => write!(f, "users"),
            TransferTarget::Clients => write!(f, "clients"),
        }
    }
}

impl FromStr for TransferTarget {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "realm" => Ok(TransferTarget::Realm),
            "user" | "users" => Ok(TransferTarget::Users),
            "client" | "clients" => Ok(TransferTarget::Clients),
            other => Err(DomainError::Validation {
                field: "target".to_string(),
                message: format!("Unknown export target '{other}'"),
            }),
        }
    }
}

/// One entry of an import document that could not be written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportFailure {
    pub identity: String,
    pub message: String,
}

/// Outcome of importing one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub target: TransferTarget,
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub failures: Vec<ImportFailure>,
}

impl ImportReport {
    pub fn new(target: TransferTarget) -> Self {
        Self {
            target,
            created: Vec::new(),
            updated: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Session-level errors abort the import; anything else is recorded against the entry.
    fn record(&mut self, identity: String, result: DomainResult<Written>) -> DomainResult<()> {
        match result {
            Ok(Written::Created) => self.created.push(identity),
            Ok(Written::Updated) => self.updated.push(identity),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(
                    target_kind = %self.target,
                    identity = %identity,
                    error = %e,
                    "Import entry failed, continuing"
                );
                self.failures.push(ImportFailure {
                    identity,
                    message: e.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Written {
    Created,
    Updated,
}

/// Reads and writes raw admin representations of one realm.
///
/// Users and clients are matched by `username` and `clientId`. An entry that already exists
/// is updated in place under the existing id.
pub struct ExportService {
    directory: Arc<dyn RemoteDirectory>,
}

impl ExportService {
    pub fn new(directory: Arc<dyn RemoteDirectory>) -> Self {
        Self { directory }
    }

    /// A single JSON document: the realm object, or an array of users or clients
    #[instrument(skip(self), fields(realm = %self.directory.realm()))]
    pub async fn export(&self, target: TransferTarget) -> DomainResult<Value> {
        let document = match target {
            TransferTarget::Realm => self.directory.export_realm().await?,
            TransferTarget::Users => Value::Array(self.export_users().await?),
            TransferTarget::Clients => Value::Array(self.export_clients().await?),
        };

        info!("Exported {} from realm '{}'", target, self.directory.realm());
        Ok(document)
    }

    pub async fn export_users(&self) -> DomainResult<Vec<Value>> {
        self.directory.export_users().await
    }

    pub async fn export_clients(&self) -> DomainResult<Vec<Value>> {
        let clients = self.directory.list_clients().await?;

        let mut exported = Vec::with_capacity(clients.len());
        for client in &clients {
            exported.push(self.directory.export_client(&client.id).await?);
        }
        Ok(exported)
    }

    #[instrument(skip(self, document), fields(realm = %self.directory.realm()))]
    pub async fn import(
        &self,
        target: TransferTarget,
        document: Value,
    ) -> DomainResult<ImportReport> {
        let report = match target {
            TransferTarget::Realm => self.import_realm(document).await?,
            TransferTarget::Users => self.import_users(entries(target, document)?).await?,
            TransferTarget::Clients => self.import_clients(entries(target, document)?).await?,
        };

        info!(
            created = report.created.len(),
            updated = report.updated.len(),
            failed = report.failures.len(),
            "Imported {} into realm '{}'",
            target,
            self.directory.realm()
        );
        Ok(report)
    }

    /// Create the realm the representation names. An existing realm is an error.
    pub async fn import_realm(&self, representation: Value) -> DomainResult<ImportReport> {
        let name = identity_of(&representation, "realm").ok_or_else(|| DomainError::Validation {
            field: "realm".to_string(),
            message: "Realm representation has no 'realm' name".to_string(),
        })?;

        self.directory.import_realm(&representation).await?;
        let mut report = ImportReport::new(TransferTarget::Realm);
        report.created.push(name);
        Ok(report)
    }

    pub async fn import_users(&self, users: Vec<Value>) -> DomainResult<ImportReport> {
        let mut report = ImportReport::new(TransferTarget::Users);

        for (index, mut user) in users.into_iter().enumerate() {
            let Some(username) = identity_of(&user, "username") else {
                report.record(format!("#{index}"), Err(missing_identity("username")))?;
                continue;
            };
            strip(&mut user, &["id", "createdTimestamp"]);

            let result = self.upsert_user(&username, &mut user).await;
            report.record(username, result)?;
        }

        Ok(report)
    }

    pub async fn import_clients(&self, clients: Vec<Value>) -> DomainResult<ImportReport> {
        let mut report = ImportReport::new(TransferTarget::Clients);

        for (index, mut client) in clients.into_iter().enumerate() {
            let Some(client_id) = identity_of(&client, "clientId") else {
                report.record(format!("#{index}"), Err(missing_identity("clientId")))?;
                continue;
            };
            strip(&mut client, &["id"]);

            let result = self.upsert_client(&client_id, &mut client).await;
            report.record(client_id, result)?;
        }

        Ok(report)
    }

    async fn upsert_user(
        &self,
        username: &str,
        representation: &mut Value,
    ) -> DomainResult<Written> {
        match self.directory.create_user_representation(representation).await {
            Ok(()) => Ok(Written::Created),
            Err(e) if e.is_conflict() => {
                let existing = self.directory.get_user(username).await?;
                set_id(representation, &existing.id);
                self.directory.update_user(&existing.id, representation).await?;
                Ok(Written::Updated)
            }
            Err(e) => Err(e),
        }
    }

    async fn upsert_client(
        &self,
        client_id: &str,
        representation: &mut Value,
    ) -> DomainResult<Written> {
        match self.directory.create_client(representation).await {
            Ok(()) => Ok(Written::Created),
            Err(e) if e.is_conflict() => {
                let existing = self.directory.get_client(client_id).await?;
                set_id(representation, &existing.id);
                self.directory.update_client(&existing.id, representation).await?;
                Ok(Written::Updated)
            }
            Err(e) => Err(e),
        }
    }
}

fn entries(target: TransferTarget, document: Value) -> DomainResult<Vec<Value>> {
    match document {
        Value::Array(items) => Ok(items),
        _ => Err(DomainError::Validation {
            field: target.to_string(),
            message: format!("Expected a JSON array of {target}"),
        }),
    }
}

fn identity_of(representation: &Value, key: &str) -> Option<String> {
    representation
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn missing_identity(key: &str) -> DomainError {
    DomainError::Validation {
        field: key.to_string(),
        message: format!("Entry has no '{key}'"),
    }
}

fn strip(representation: &mut Value, keys: &[&str]) {
    if let Value::Object(fields) = representation {
        for key in keys {
            fields.remove(*key);
        }
    }
}

fn set_id(representation: &mut Value, id: &str) {
    if let Value::Object(fields) = representation {
        fields.insert("id".to_string(), Value::String(id.to_string()));
    }
}
