use super::common::{MultiMap, StringSet};
use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};

/// A group with its role assignments and attributes.
///
/// Group names repeat across the hierarchy, so identity across realms is the
/// slash-delimited `path` (`/engineering/platform`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupDetail {
    pub id: String,
    pub name: String,
    pub path: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub sub_groups: Vec<GroupDetail>,
    pub realm_roles: StringSet,
    /// clientId -> role names
    pub client_roles: MultiMap,
    pub attributes: MultiMap,
}

impl GroupDetail {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> DomainResult<Self> {
        let path = path.into();
        Self::validate_group_path(&path)?;

        Ok(Self {
            name: name.into(),
            path,
            ..Self::default()
        })
    }

    pub fn validate_group_path(path: &str) -> DomainResult<()> {
        if !path.starts_with('/') || path.len() < 2 {
            return Err(DomainError::Validation {
                field: "path".to_string(),
                message: format!("Group path must be absolute, got '{path}'"),
            });
        }
        Ok(())
    }

    /// Path of the parent group, or `None` for a top-level group.
    pub fn parent_path(&self) -> Option<&str> {
        let trimmed = self.path.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(0) | None => None,
            Some(idx) => Some(&trimmed[..idx]),
        }
    }

    /// This group followed by every descendant, depth first.
    pub fn flatten(&self) -> Vec<&GroupDetail> {
        let mut out = vec![self];
        for child in &self.sub_groups {
            out.extend(child.flatten());
        }
        out
    }
}
