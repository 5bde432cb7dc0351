use crate::error::CliError;
use keycloak_reconcile::{
    ConfigurationPort, EnvConfigurationAdapter, KeycloakRestDirectory, ReconciliationService,
    RemoteDirectory,
};
use std::sync::Arc;
use tracing::info;

/// Wired services for one CLI invocation
pub struct AppState {
    pub service: ReconciliationService,
}

impl AppState {
    /// One directory per configured realm. Without a destination, the source realm
    /// stands in for both sides, which only RBAC analysis and export accept.
    pub fn new(
        config: &EnvConfigurationAdapter,
        command: &'static str,
        needs_destination: bool,
    ) -> Result<Self, CliError> {
        let http = config.get_http_config();
        let source_config = config.get_source_realm();

        let source: Arc<dyn RemoteDirectory> =
            Arc::new(KeycloakRestDirectory::new(source_config.to_handle()?, http)?);

        let destination: Arc<dyn RemoteDirectory> = match config.get_destination_realm() {
            Some(realm) => Arc::new(KeycloakRestDirectory::new(realm.to_handle()?, http)?),
            None if needs_destination => return Err(CliError::MissingDestination { command }),
            None => source.clone(),
        };

        info!(
            source = %source.realm(),
            destination = %destination.realm(),
            url = %source_config.url,
            "Realm handles ready"
        );

        Ok(Self {
            service: ReconciliationService::new(source, destination),
        })
    }
}
