use super::{ClientDetail, GroupDetail, Role, UserDetail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::errors::DomainError;

/// The four entity kinds that can be diffed and synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Role,
    Client,
    Group,
    User,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Role => "role",
            EntityKind::Client => "client",
            EntityKind::Group => "group",
            EntityKind::User => "user",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "role" | "roles" => Ok(EntityKind::Role),
            "client" | "clients" => Ok(EntityKind::Client),
            "group" | "groups" => Ok(EntityKind::Group),
            "user" | "users" => Ok(EntityKind::User),
            other => Err(DomainError::Validation {
                field: "kind".to_string(),
                message: format!("Unknown entity kind '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    MissingInDestination,
    MissingInSource,
    DifferentConfig,
}

/// Which realm(s) the entity in a diff record was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffSide {
    Source,
    Destination,
    Both,
}

/// One line of a diff between two realms.
///
/// `differences` is non-empty exactly when `status` is `DifferentConfig`, and the keys of
/// `source_value` / `destination_value` are exactly the entries of `differences`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffRecord<T> {
    pub entity: T,
    pub status: DiffStatus,
    pub side: DiffSide,
    pub differences: Vec<String>,
    pub source_value: BTreeMap<String, Value>,
    pub destination_value: BTreeMap<String, Value>,
}

impl<T> DiffRecord<T> {
    pub fn missing_in_destination(entity: T) -> Self {
        Self::presence(entity, DiffStatus::MissingInDestination, DiffSide::Source)
    }

    pub fn missing_in_source(entity: T) -> Self {
        Self::presence(entity, DiffStatus::MissingInSource, DiffSide::Destination)
    }

    /// A `different_config` record, or `None` when nothing differs.
    pub fn different_config(
        entity: T,
        differences: Vec<String>,
        source_value: BTreeMap<String, Value>,
        destination_value: BTreeMap<String, Value>,
    ) -> Option<Self> {
        if differences.is_empty() {
            return None;
        }
        Some(Self {
            entity,
            status: DiffStatus::DifferentConfig,
            side: DiffSide::Both,
            differences,
            source_value,
            destination_value,
        })
    }

    fn presence(entity: T, status: DiffStatus, side: DiffSide) -> Self {
        Self {
            entity,
            status,
            side,
            differences: Vec::new(),
            source_value: BTreeMap::new(),
            destination_value: BTreeMap::new(),
        }
    }
}

/// The result of diffing one entity kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "records", rename_all = "lowercase")]
pub enum DiffReport {
    Role(Vec<DiffRecord<Role>>),
    Client(Vec<DiffRecord<ClientDetail>>),
    Group(Vec<DiffRecord<GroupDetail>>),
    User(Vec<DiffRecord<UserDetail>>),
}

impl DiffReport {
    pub fn kind(&self) -> EntityKind {
        match self {
            DiffReport::Role(_) => EntityKind::Role,
            DiffReport::Client(_) => EntityKind::Client,
            DiffReport::Group(_) => EntityKind::Group,
            DiffReport::User(_) => EntityKind::User,
        }
    }

    pub fn len(&self) -> usize {
        self.statuses().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Status of every record, in report order.
    pub fn statuses(&self) -> Vec<DiffStatus> {
        fn collect<T>(records: &[DiffRecord<T>]) -> Vec<DiffStatus> {
            records.iter().map(|r| r.status).collect()
        }
        match self {
            DiffReport::Role(r) => collect(r),
            DiffReport::Client(r) => collect(r),
            DiffReport::Group(r) => collect(r),
            DiffReport::User(r) => collect(r),
        }
    }
}
