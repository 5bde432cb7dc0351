mod mocks;

use keycloak_reconcile::{
    application::services::{SyncAction, SyncService},
    domain::{entities::*, errors::DomainError},
};
use mocks::{client, group, mapper, realm_role, scope, user, Failure, FakeDirectory};
use serde_json::json;
use std::sync::Arc;

fn realms() -> (Arc<FakeDirectory>, Arc<FakeDirectory>) {
    (Arc::new(FakeDirectory::new("staging")), Arc::new(FakeDirectory::new("production")))
}

fn service(source: &Arc<FakeDirectory>, destination: &Arc<FakeDirectory>) -> SyncService {
    SyncService::new(source.clone(), destination.clone())
}

mod role_sync {
    use super::*;

    #[tokio::test]
    async fn test_role_is_replicated_without_composites() {
        // Arrange
        let (source, destination) = realms();
        source.add_role(realm_role("billing-admin").with_description("Billing").as_composite());
        source.add_composite("billing-admin", vec![realm_role("invoices:write")]);

        // Act
        let report = service(&source, &destination).sync_role("billing-admin").await.unwrap();

        // Assert
        assert_eq!(report.action, SyncAction::Created);
        assert!(report.is_complete());
        let state = destination.snapshot();
        assert_eq!(state.roles.len(), 1);
        assert_eq!(state.roles[0].name, "billing-admin");
        assert_eq!(state.roles[0].description.as_deref(), Some("Billing"));
        assert!(!state.roles[0].composite);
        assert!(state.composites.is_empty());
    }

    #[tokio::test]
    async fn test_second_sync_reports_already_present() {
        let (source, destination) = realms();
        source.add_role(realm_role("viewer"));
        let sync = service(&source, &destination);

        sync.sync_role("viewer").await.unwrap();
        let second = sync.sync_role("viewer").await.unwrap();

        assert_eq!(second.action, SyncAction::AlreadyPresent);
        assert_eq!(destination.snapshot().roles.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_role_is_not_found() {
        let (source, destination) = realms();

        let result = service(&source, &destination).sync(EntityKind::Role, "ghost").await;

        assert!(matches!(result, Err(DomainError::RoleNotFound { .. })));
        assert_eq!(destination.calls("create_realm_role"), 0);
    }
}

mod user_sync {
    use super::*;

    fn seeded() -> (Arc<FakeDirectory>, Arc<FakeDirectory>) {
        let (source, destination) = realms();

        let mut alice = user("src-alice", "alice");
        alice.email = Some("alice@example.com".to_string());
        alice.realm_roles = ["admin", "ghost"].into_iter().collect();
        alice.client_roles.push("portal", "editor");
        alice.groups.insert("/engineering");
        source.add_user(alice);

        destination.add_role(realm_role("admin"));
        destination.add_client(client("dst-portal", "portal"));
        destination.add_client_role("dst-portal", "editor");
        destination.add_group(group("dst-eng", "/engineering"));

        (source, destination)
    }

    #[tokio::test]
    async fn test_user_is_created_with_assignments() {
        // Arrange
        let (source, destination) = seeded();

        // Act
        let report = service(&source, &destination).sync_user("alice").await.unwrap();

        // Assert
        assert_eq!(report.action, SyncAction::Created);
        let state = destination.snapshot();
        let created = state.users.iter().find(|u| u.username == "alice").unwrap();
        assert_eq!(created.email.as_deref(), Some("alice@example.com"));
        assert!(created.realm_roles.contains("admin"));
        assert_eq!(created.client_roles.get("portal"), Some(&vec!["editor".to_string()]));
        assert!(created.groups.contains("/engineering"));
    }

    #[tokio::test]
    async fn test_unresolvable_role_becomes_a_warning() {
        let (source, destination) = seeded();

        let report = service(&source, &destination).sync_user("alice").await.unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].step, "resolve realm role ghost");
    }

    #[tokio::test]
    async fn test_failed_assignment_does_not_fail_the_sync() {
        let (source, destination) = seeded();
        destination.fail_on("add_user_to_group", Failure::Rejected);

        let report = service(&source, &destination).sync_user("alice").await.unwrap();

        assert_eq!(report.action, SyncAction::Created);
        assert!(report.warnings.iter().any(|w| w.step == "join group /engineering"));
        assert_eq!(destination.calls("assign_user_realm_roles"), 1);
    }

    #[tokio::test]
    async fn test_existing_user_is_left_alone() {
        let (source, destination) = seeded();
        destination.add_user(user("dst-alice", "alice"));

        let report = service(&source, &destination).sync_user("alice").await.unwrap();

        assert_eq!(report.action, SyncAction::AlreadyPresent);
        assert_eq!(destination.calls("create_user"), 0);
        assert_eq!(destination.calls("assign_user_realm_roles"), 0);
    }

    #[tokio::test]
    async fn test_create_failure_is_fatal() {
        let (source, destination) = seeded();
        destination.fail_on("create_user", Failure::Rejected);

        let result = service(&source, &destination).sync_user("alice").await;

        assert!(matches!(result, Err(DomainError::RemoteRejected { status: 500, .. })));
    }
}

mod group_sync {
    use super::*;

    #[tokio::test]
    async fn test_nested_group_is_created_under_existing_parent() {
        // Arrange
        let (source, destination) = realms();
        let mut platform = group("src-platform", "/engineering/platform");
        platform.realm_roles.insert("deployer");
        platform.client_roles.push("portal", "editor");
        let mut engineering = group("src-eng", "/engineering");
        engineering.sub_groups.push(platform);
        source.add_group(engineering);

        destination.add_group(group("dst-eng", "/engineering"));
        destination.add_role(realm_role("deployer"));
        destination.add_client(client("dst-portal", "portal"));
        destination.add_client_role("dst-portal", "editor");

        // Act
        let report = service(&source, &destination)
            .sync_group("/engineering/platform")
            .await
            .unwrap();

        // Assert
        assert_eq!(report.action, SyncAction::Created);
        assert!(report.is_complete());
        let state = destination.snapshot();
        let created = state
            .all_groups()
            .into_iter()
            .find(|g| g.path == "/engineering/platform")
            .cloned()
            .unwrap();
        assert!(created.realm_roles.contains("deployer"));
        assert_eq!(created.client_roles.get("portal"), Some(&vec!["editor".to_string()]));
        assert_eq!(state.groups.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_parent_fails_the_sync() {
        let (source, destination) = realms();
        let mut engineering = group("src-eng", "/engineering");
        engineering.sub_groups.push(group("src-platform", "/engineering/platform"));
        source.add_group(engineering);

        let result = service(&source, &destination).sync_group("/engineering/platform").await;

        assert!(matches!(
            result,
            Err(DomainError::GroupNotFound { ref path, .. }) if path == "/engineering"
        ));
        assert_eq!(destination.calls("create_group"), 0);
    }

    #[tokio::test]
    async fn test_sub_groups_are_not_replicated() {
        let (source, destination) = realms();
        let mut engineering = group("src-eng", "/engineering");
        engineering.sub_groups.push(group("src-platform", "/engineering/platform"));
        source.add_group(engineering);

        service(&source, &destination).sync_group("/engineering").await.unwrap();

        let state = destination.snapshot();
        assert_eq!(state.groups.len(), 1);
        assert!(state.groups[0].sub_groups.is_empty());
    }
}

mod client_sync {
    use super::*;

    fn seeded() -> (Arc<FakeDirectory>, Arc<FakeDirectory>) {
        let (source, destination) = realms();

        let mut portal = client("src-portal", "portal");
        portal.redirect_uris.insert("https://portal.example.com/*");
        portal.default_client_scopes.insert("profile");
        portal.optional_client_scopes.insert("audit");
        source.add_client(portal);
        source.add_client_role("src-portal", "editor");
        source.add_client_role("src-portal", "viewer");
        source.seed(|s| {
            s.exports.insert(
                "src-portal".to_string(),
                json!({
                    "id": "src-portal",
                    "clientId": "portal",
                    "protocol": "openid-connect",
                    "redirectUris": ["https://portal.example.com/*"],
                    "publicClient": true,
                    "enabled": true
                }),
            );
        });
        source.add_scope(scope("s-profile", "profile", vec![mapper("email", "email")]));
        source.add_scope(scope("s-audit", "audit", vec![mapper("tenant", "tenant_id")]));

        destination.add_scope(scope("d-profile", "profile", vec![]));

        (source, destination)
    }

    #[tokio::test]
    async fn test_client_is_created_with_roles_and_scopes() {
        // Arrange
        let (source, destination) = seeded();

        // Act
        let report = service(&source, &destination).sync_client("portal").await.unwrap();

        // Assert
        assert_eq!(report.action, SyncAction::Created);
        assert!(report.is_complete(), "unexpected warnings: {:?}", report.warnings);

        let state = destination.snapshot();
        let created = state.clients.iter().find(|c| c.client_id == "portal").unwrap();
        assert_ne!(created.id, "src-portal");
        assert!(created.public_client);
        assert!(created.default_client_scopes.contains("profile"));
        assert!(created.optional_client_scopes.contains("audit"));

        let roles: Vec<&str> = state.client_role_defs[&created.id]
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(roles, vec!["editor", "viewer"]);
    }

    #[tokio::test]
    async fn test_missing_scopes_and_mappers_are_created() {
        let (source, destination) = seeded();

        service(&source, &destination).sync_client("portal").await.unwrap();

        let state = destination.snapshot();
        let audit = state.scopes.iter().find(|s| s.name == "audit").unwrap();
        assert_ne!(audit.id.as_deref(), Some("s-audit"));
        assert_eq!(audit.protocol_mappers.len(), 1);
        assert_eq!(audit.protocol_mappers[0].name, "tenant");

        let profile = state.scopes.iter().find(|s| s.name == "profile").unwrap();
        assert_eq!(profile.id.as_deref(), Some("d-profile"));
        assert_eq!(profile.protocol_mappers.len(), 1);
        assert_eq!(profile.protocol_mappers[0].name, "email");
    }

    #[tokio::test]
    async fn test_existing_client_is_updated_in_place() {
        let (source, destination) = seeded();
        let mut existing = client("dst-portal", "portal");
        existing.redirect_uris.insert("https://old.example.com/*");
        destination.add_client(existing);

        let report = service(&source, &destination).sync_client("portal").await.unwrap();

        assert_eq!(report.action, SyncAction::Updated);
        let state = destination.snapshot();
        assert_eq!(state.clients.len(), 1);
        assert_eq!(state.clients[0].id, "dst-portal");
        assert!(state.clients[0].redirect_uris.contains("https://portal.example.com/*"));
        assert!(!state.clients[0].redirect_uris.contains("https://old.example.com/*"));
        assert_eq!(state.exports["dst-portal"]["id"], "dst-portal");
    }

    #[tokio::test]
    async fn test_unresolvable_created_client_yields_one_warning() {
        let (source, destination) = seeded();
        // The upsert lookup is call 1; the post-create lookup fails.
        destination.fail_from_call("get_client", 2, Failure::Rejected);

        let report = service(&source, &destination).sync_client("portal").await.unwrap();

        assert_eq!(report.action, SyncAction::Created);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].step, "resolve created client");
        assert_eq!(destination.calls("create_client_role"), 0);
        assert_eq!(destination.calls("assign_client_scopes"), 0);
    }

    #[tokio::test]
    async fn test_differing_mapper_is_left_untouched() {
        let (source, destination) = seeded();
        destination.seed(|s| {
            s.scopes = vec![scope("d-profile", "profile", vec![mapper("email", "mail")])];
        });

        let report = service(&source, &destination).sync_client("portal").await.unwrap();

        assert!(report.is_complete());
        let state = destination.snapshot();
        let profile = state.scopes.iter().find(|s| s.name == "profile").unwrap();
        assert_eq!(profile.protocol_mappers.len(), 1);
        assert_eq!(profile.protocol_mappers[0].config["claim.name"], "mail");
        assert_eq!(destination.calls("create_scope_mapper"), 0);
    }

    #[tokio::test]
    async fn test_repeated_sync_converges() {
        let (source, destination) = seeded();
        let sync = service(&source, &destination);

        sync.sync_client("portal").await.unwrap();
        let before = destination.snapshot();
        let second = sync.sync_client("portal").await.unwrap();
        let after = destination.snapshot();

        assert_eq!(second.action, SyncAction::Updated);
        assert!(second.is_complete());
        assert_eq!(before.clients, after.clients);
        assert_eq!(before.scopes, after.scopes);
        assert_eq!(before.client_role_defs, after.client_role_defs);
    }

    #[tokio::test]
    async fn test_failed_role_creation_is_a_warning() {
        let (source, destination) = seeded();
        destination.fail_on("create_client_role", Failure::Rejected);

        let report = service(&source, &destination).sync_client("portal").await.unwrap();

        assert_eq!(report.action, SyncAction::Created);
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings.iter().all(|w| w.step.starts_with("create client role")));
        // scope assignment still ran
        assert_eq!(destination.calls("assign_client_scopes"), 2);
    }

    #[tokio::test]
    async fn test_rejected_create_is_fatal() {
        let (source, destination) = seeded();
        destination.fail_on("create_client", Failure::Rejected);

        let result = service(&source, &destination).sync_client("portal").await;

        assert!(matches!(result, Err(DomainError::RemoteRejected { .. })));
        assert_eq!(destination.calls("create_client_role"), 0);
    }

    #[tokio::test]
    async fn test_unknown_source_client_is_not_found() {
        let (source, destination) = seeded();

        let result = service(&source, &destination).sync(EntityKind::Client, "ghost").await;

        assert!(matches!(result, Err(DomainError::ClientNotFound { .. })));
    }
}
