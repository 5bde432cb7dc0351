/*!
# Keycloak Reconcile

Reconciliation engine for independently administered Keycloak realms, built on
hexagonal architecture principles.

This crate provides:
- Domain models for the reconciled entities (roles, clients, groups, users) and the
  authorization graph (scopes, permissions, policies)
- Entity comparators producing field-level diffs
- Application services: diff, sync and RBAC analysis over a source/destination realm pair,
  plus raw export/import of realms, users and clients
- A Keycloak admin REST adapter implementing the remote directory port

## Architecture

```text
┌─────────────────────────────────────────────────────────────┐
│                    Primary Adapters                         │
├─────────────────────────────────────────────────────────────┤
│              keycloak-reconcile CLI (clap)                  │
└─────────────────────────────────────────────────────────────┘
                              │
┌─────────────────────────────────────────────────────────────┐
│                Application Layer                            │
├─────────────────────────────────────────────────────────────┤
│  • ReconciliationService   • DiffService                    │
│  • SyncService             • RbacAnalyzer                   │
│  • ExportService                                            │
└─────────────────────────────────────────────────────────────┘
                              │
┌─────────────────────────────────────────────────────────────┐
│                 Domain Layer (Ports)                        │
├─────────────────────────────────────────────────────────────┤
│  • RemoteDirectory         • TokenManager                   │
│  • ConfigurationPort       • Reconcilable                   │
└─────────────────────────────────────────────────────────────┘
                              │
┌─────────────────────────────────────────────────────────────┐
│              Infrastructure Layer (Adapters)                │
├─────────────────────────────────────────────────────────────┤
│  • KeycloakRestDirectory   • EnvConfigurationAdapter        │
│  • KeycloakTokenManager                                     │
└─────────────────────────────────────────────────────────────┘
```

## Usage

```rust,no_run
use keycloak_reconcile::{
    AppConfig, EntityKind, KeycloakRestDirectory, ReconciliationService,
};
use std::sync::Arc;

# async fn run() -> keycloak_reconcile::DomainResult<()> {
let config = AppConfig::from_env()?;
let source = Arc::new(KeycloakRestDirectory::new(config.source.to_handle()?, &config.http)?);
let destination = match &config.destination {
    Some(realm) => Arc::new(KeycloakRestDirectory::new(realm.to_handle()?, &config.http)?),
    None => source.clone(),
};

let service = ReconciliationService::new(source, destination);
let report = service.diff(EntityKind::Client).await?;
println!("{} differences", report.len());
# Ok(())
# }
```
*/

pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use application::ports::*;
pub use application::services::*;
pub use domain::comparators::*;
pub use domain::entities::*;
pub use domain::errors::*;
pub use infrastructure::adapters::*;
