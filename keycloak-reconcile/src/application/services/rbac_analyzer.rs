use crate::{
    application::ports::RemoteDirectory,
    domain::{entities::*, errors::DomainResult},
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, info, instrument};

type NodeFuture<'a> = Pin<Box<dyn Future<Output = DomainResult<RbacNode>> + Send + 'a>>;

/// Expands roles, users and clients into trees of what they grant.
///
/// Every expansion re-fetches its sub-resources; nothing is memoized, so a role reached
/// along two paths is expanded twice. Recursion stops at [`MAX_RBAC_DEPTH`].
pub struct RbacAnalyzer {
    directory: Arc<dyn RemoteDirectory>,
}

impl RbacAnalyzer {
    pub fn new(directory: Arc<dyn RemoteDirectory>) -> Self {
        Self { directory }
    }

    pub async fn analyze(&self, root: &RbacRoot) -> DomainResult<RbacAnalysis> {
        let tree = self.build_tree(root).await?;
        let analysis = RbacAnalysis::new(tree);
        info!(
            root = %root.name(),
            total = analysis.statistics.total(),
            "RBAC analysis completed"
        );
        Ok(analysis)
    }

    pub async fn analyze_role(&self, name: &str) -> DomainResult<RbacAnalysis> {
        self.analyze(&RbacRoot::Role(name.to_string())).await
    }

    pub async fn analyze_user(&self, username: &str) -> DomainResult<RbacAnalysis> {
        self.analyze(&RbacRoot::User(username.to_string())).await
    }

    pub async fn analyze_client(&self, client_id: &str) -> DomainResult<RbacAnalysis> {
        self.analyze(&RbacRoot::Client(client_id.to_string())).await
    }

    /// Expand a root entity. A root that does not exist is an error.
    #[instrument(skip(self), fields(realm = %self.directory.realm()))]
    pub async fn build_tree(&self, root: &RbacRoot) -> DomainResult<RbacNode> {
        match root {
            RbacRoot::Role(name) => {
                let role = self.directory.get_realm_role(name).await?;
                self.expand_role(role, RbacNodeType::Role, 0).await
            }
            RbacRoot::User(username) => self.expand_user(username).await,
            RbacRoot::Client(client_id) => self.expand_client(client_id).await,
        }
    }

    fn expand_role(&self, role: Role, node_type: RbacNodeType, depth: usize) -> NodeFuture<'_> {
        Box::pin(async move {
            if depth > MAX_RBAC_DEPTH {
                debug!(role = %role.name, "Depth limit reached, truncating");
                return Ok(RbacNode::truncated());
            }

            let description = match node_type {
                RbacNodeType::Composite => format!("Composite: {}", role.name),
                _ => role.description.clone().unwrap_or_default(),
            };
            let mut node = RbacNode::new(node_type, &role.name, description);

            if role.composite {
                let members = lenient(
                    self.directory.list_composite_roles(&role).await,
                    "composite roles",
                )?;
                for member in members {
                    let child = if member.client_role {
                        self.expand_client_role(member, depth + 1).await?
                    } else {
                        self.expand_role(member, RbacNodeType::Composite, depth + 1).await?
                    };
                    node.children.push(child);
                }
            }

            Ok(node)
        })
    }

    async fn expand_client_role(&self, role: Role, depth: usize) -> DomainResult<RbacNode> {
        if depth > MAX_RBAC_DEPTH {
            return Ok(RbacNode::truncated());
        }

        let mut node = RbacNode::new(
            RbacNodeType::ClientRole,
            &role.name,
            format!("Client Role: {}", role.name),
        );

        if let Some(client_uuid) = role.container_id.as_deref() {
            node.children = self.authorization_children(client_uuid, depth + 1).await?;
        }

        Ok(node)
    }

    async fn expand_user(&self, username: &str) -> DomainResult<RbacNode> {
        let user = self.directory.get_user(username).await?;
        let label = format!("User: {}", user.username);
        let mut node = RbacNode::new(RbacNodeType::User, &user.username, label);

        for role_name in &user.realm_roles {
            let lookup = self.directory.get_realm_role(role_name).await.map(Some);
            if let Some(role) = lenient(lookup, "realm role")? {
                node.children.push(self.expand_role(role, RbacNodeType::Role, 1).await?);
            }
        }

        for (client_id, role_names) in user.client_roles.iter() {
            let lookup = self.directory.get_client(client_id).await.map(Some);
            let Some(client) = lenient(lookup, "client")? else {
                continue;
            };

            let mut client_node =
                RbacNode::new(RbacNodeType::Client, client_id, format!("Client: {client_id}"));
            for role_name in role_names {
                let lookup = self.directory.get_client_role(&client.id, role_name).await.map(Some);
                if let Some(mut role) = lenient(lookup, "client role")? {
                    role.container_id.get_or_insert_with(|| client.id.clone());
                    client_node.children.push(self.expand_client_role(role, 2).await?);
                }
            }
            node.children.push(client_node);
        }

        Ok(node)
    }

    async fn expand_client(&self, client_id: &str) -> DomainResult<RbacNode> {
        let client = self.directory.get_client(client_id).await?;
        let label = format!("Client: {}", client.client_id);
        let mut node = RbacNode::new(RbacNodeType::Client, &client.client_id, label);

        let roles = lenient(self.directory.list_client_roles(&client.id).await, "client roles")?;
        for mut role in roles {
            role.container_id.get_or_insert_with(|| client.id.clone());
            node.children.push(self.expand_client_role(role, 1).await?);
        }

        node.children.extend(self.authorization_children(&client.id, 1).await?);
        Ok(node)
    }

    /// Scope nodes with the permissions referencing them, followed by scopeless
    /// permissions that resolve to at least one policy.
    async fn authorization_children(
        &self,
        client_uuid: &str,
        depth: usize,
    ) -> DomainResult<Vec<RbacNode>> {
        if depth > MAX_RBAC_DEPTH {
            return Ok(vec![RbacNode::truncated()]);
        }

        let scopes = lenient(
            self.directory.list_authz_scopes(client_uuid).await,
            "authorization scopes",
        )?;
        let mut permissions = lenient(
            self.directory.list_resource_permissions(client_uuid).await,
            "resource permissions",
        )?;
        permissions.extend(lenient(
            self.directory.list_scope_permissions(client_uuid).await,
            "scope permissions",
        )?);

        let mut children = Vec::new();

        for scope in &scopes {
            let referencing: Vec<&Permission> = permissions
                .iter()
                .filter(|p| p.references_scope(&scope.name))
                .collect();
            if referencing.is_empty() {
                continue;
            }

            let label = format!("Scope: {}", scope.name);
            let mut scope_node = RbacNode::new(RbacNodeType::Scope, &scope.name, label);
            for permission in referencing {
                scope_node
                    .children
                    .push(self.expand_permission(client_uuid, permission, depth + 1).await?);
            }
            children.push(scope_node);
        }

        for permission in permissions.iter().filter(|p| p.is_scopeless()) {
            let permission_node = self.expand_permission(client_uuid, permission, depth).await?;
            if permission_node
                .children
                .iter()
                .any(|c| c.node_type == RbacNodeType::Policy)
            {
                children.push(permission_node);
            }
        }

        Ok(children)
    }

    async fn expand_permission(
        &self,
        client_uuid: &str,
        permission: &Permission,
        depth: usize,
    ) -> DomainResult<RbacNode> {
        if depth > MAX_RBAC_DEPTH {
            return Ok(RbacNode::truncated());
        }

        let policies = if permission.policies.is_empty() {
            lenient(
                self.directory.list_policies_for_permission(client_uuid, &permission.id).await,
                "permission policies",
            )?
        } else {
            let mut resolved = Vec::with_capacity(permission.policies.len());
            for policy_id in &permission.policies {
                let lookup = self.directory.get_policy(client_uuid, policy_id).await.map(Some);
                if let Some(policy) = lenient(lookup, "policy")? {
                    resolved.push(policy);
                }
            }
            resolved
        };

        let children = policies
            .into_iter()
            .map(|policy| {
                let label = format!("Policy: {}", policy.name);
                RbacNode::new(RbacNodeType::Policy, &policy.name, label)
                    .with_policy_type(policy.policy_type)
            })
            .collect();

        Ok(RbacNode::new(
            RbacNodeType::Permission,
            &permission.name,
            format!("Permission: {}", permission.name),
        )
        .with_children(children))
    }
}

/// Per-type counts of an already built tree
pub fn stats(tree: &RbacNode) -> RbacStats {
    RbacStats::from_tree(tree)
}

/// Sub-resources that cannot be read contribute nothing; a lost session still fails.
fn lenient<T: Default>(result: DomainResult<T>, what: &str) -> DomainResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            debug!(error = %e, "Treating unreadable {} as empty", what);
            Ok(T::default())
        }
    }
}
