use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum expansion depth of an RBAC tree. Expansions requested below this depth
/// return [`RbacNode::truncated`].
pub const MAX_RBAC_DEPTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RbacNodeType {
    Role,
    Composite,
    Client,
    ClientRole,
    Scope,
    Permission,
    Policy,
    User,
    /// Sentinel produced when the depth bound stops expansion.
    Truncated,
}

impl RbacNodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RbacNodeType::Role => "role",
            RbacNodeType::Composite => "composite",
            RbacNodeType::Client => "client",
            RbacNodeType::ClientRole => "client-role",
            RbacNodeType::Scope => "scope",
            RbacNodeType::Permission => "permission",
            RbacNodeType::Policy => "policy",
            RbacNodeType::User => "user",
            RbacNodeType::Truncated => "truncated",
        }
    }
}

impl fmt::Display for RbacNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of an authorization graph expansion.
///
/// The structure is a tree: the same role or scope reached along two paths appears twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RbacNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: RbacNodeType,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub policy_type: Option<String>,
    #[serde(default)]
    pub children: Vec<RbacNode>,
}

impl RbacNode {
    /// Node with id `"{type}-{name}"` and no children.
    pub fn new(
        node_type: RbacNodeType,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            id: format!("{}-{}", node_type, name),
            name,
            node_type,
            description: description.into(),
            policy_type: None,
            children: Vec::new(),
        }
    }

    pub fn truncated() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            node_type: RbacNodeType::Truncated,
            description: String::new(),
            policy_type: None,
            children: Vec::new(),
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.node_type == RbacNodeType::Truncated
    }

    pub fn with_policy_type(mut self, policy_type: impl Into<String>) -> Self {
        self.policy_type = Some(policy_type.into());
        self
    }

    pub fn with_children(mut self, children: Vec<RbacNode>) -> Self {
        self.children = children;
        self
    }

    /// Longest root-to-leaf path, counting this node as 1.
    pub fn height(&self) -> usize {
        1 + self.children.iter().map(RbacNode::height).max().unwrap_or(0)
    }
}

/// Per-type node counts of an RBAC tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RbacStats {
    pub roles: usize,
    pub composites: usize,
    pub client_roles: usize,
    pub scopes: usize,
    pub permissions: usize,
    pub policies: usize,
}

impl RbacStats {
    pub fn from_tree(root: &RbacNode) -> Self {
        let mut stats = Self::default();
        stats.accumulate(root);
        stats
    }

    fn accumulate(&mut self, node: &RbacNode) {
        for child in &node.children {
            self.accumulate(child);
        }

        match node.node_type {
            RbacNodeType::Role => self.roles += 1,
            RbacNodeType::Composite => self.composites += 1,
            RbacNodeType::ClientRole => self.client_roles += 1,
            RbacNodeType::Scope => self.scopes += 1,
            RbacNodeType::Permission => self.permissions += 1,
            RbacNodeType::Policy => self.policies += 1,
            RbacNodeType::User | RbacNodeType::Client | RbacNodeType::Truncated => {}
        }
    }

    pub fn total(&self) -> usize {
        self.roles
            + self.composites
            + self.client_roles
            + self.scopes
            + self.permissions
            + self.policies
    }
}

/// Root entity an RBAC expansion starts from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "lowercase")]
pub enum RbacRoot {
    Role(String),
    User(String),
    Client(String),
}

impl RbacRoot {
    pub fn name(&self) -> &str {
        match self {
            RbacRoot::Role(name) | RbacRoot::User(name) | RbacRoot::Client(name) => name,
        }
    }
}

/// An expanded tree together with its statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RbacAnalysis {
    pub root: RbacNode,
    pub statistics: RbacStats,
}

impl RbacAnalysis {
    pub fn new(root: RbacNode) -> Self {
        let statistics = RbacStats::from_tree(&root);
        Self { root, statistics }
    }
}
