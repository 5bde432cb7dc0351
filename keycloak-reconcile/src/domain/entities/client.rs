use super::common::StringSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// An OAuth/OIDC client registered in a realm, with the configuration that is reconciled
/// between realms.
///
/// Identity across realms is `client_id`; `id` is the realm-local uuid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientDetail {
    pub id: String,
    pub client_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub protocol: String,
    pub redirect_uris: StringSet,
    pub web_origins: StringSet,
    pub public_client: bool,
    pub bearer_only: bool,
    pub direct_access_grants_enabled: bool,
    pub service_accounts_enabled: bool,
    pub default_client_scopes: StringSet,
    pub optional_client_scopes: StringSet,
    /// Names of the roles defined on this client.
    pub client_roles: StringSet,
    pub enabled: bool,
}

impl ClientDetail {
    pub fn new(id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            client_id: client_id.into(),
            protocol: "openid-connect".to_string(),
            enabled: true,
            ..Self::default()
        }
    }

    /// Every scope name attached to the client, default or optional.
    pub fn all_scopes(&self) -> StringSet {
        self.default_client_scopes.union(&self.optional_client_scopes)
    }

    pub fn scopes(&self, bucket: ScopeBucket) -> &StringSet {
        match bucket {
            ScopeBucket::Default => &self.default_client_scopes,
            ScopeBucket::Optional => &self.optional_client_scopes,
        }
    }
}

/// Which of a client's two scope lists an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeBucket {
    Default,
    Optional,
}

impl ScopeBucket {
    pub const ALL: [ScopeBucket; 2] = [ScopeBucket::Default, ScopeBucket::Optional];

    /// Path segment used by the admin API (`default-client-scopes`, `optional-client-scopes`).
    pub fn path_segment(&self) -> &'static str {
        match self {
            ScopeBucket::Default => "default-client-scopes",
            ScopeBucket::Optional => "optional-client-scopes",
        }
    }
}

impl std::fmt::Display for ScopeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScopeBucket::Default => write!(f, "default"),
            ScopeBucket::Optional => write!(f, "optional"),
        }
    }
}

/// A realm-level client scope: a named bundle of protocol mappers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientScope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub protocol_mappers: Vec<ProtocolMapper>,
}

impl ClientScope {
    /// Definition suitable for creating the scope in another realm: ids stripped from the
    /// scope and from every mapper.
    pub fn to_replica(&self) -> ClientScope {
        ClientScope {
            id: None,
            protocol_mappers: self
                .protocol_mappers
                .iter()
                .map(ProtocolMapper::to_replica)
                .collect(),
            ..self.clone()
        }
    }
}

/// A rule shaping the claims a client scope contributes to issued tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProtocolMapper {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub protocol: String,
    pub protocol_mapper: String,
    pub consent_required: bool,
    pub config: BTreeMap<String, String>,
    /// Any other keys of the admin representation, kept so they take part in comparison
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ProtocolMapper {
    pub fn to_replica(&self) -> ProtocolMapper {
        ProtocolMapper {
            id: None,
            ..self.clone()
        }
    }

    /// Same mapper definition: every field but the realm-local id.
    pub fn same_definition(&self, other: &ProtocolMapper) -> bool {
        self.name == other.name
            && self.protocol == other.protocol
            && self.protocol_mapper == other.protocol_mapper
            && self.consent_required == other.consent_required
            && self.config == other.config
            && self.extra == other.extra
    }
}
