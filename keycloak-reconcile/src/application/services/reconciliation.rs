use super::{
    rbac_analyzer, DiffService, ExportService, ImportReport, RbacAnalyzer, SyncReport, SyncService,
    TransferTarget,
};
use crate::{
    application::ports::RemoteDirectory,
    domain::{
        entities::*,
        errors::{DomainError, DomainResult},
    },
};
use serde_json::Value;
use std::sync::Arc;

/// Entry point for the reconciliation operation families over a realm pair.
///
/// RBAC analysis and exports run against the source realm; imports write to the destination.
pub struct ReconciliationService {
    diff: DiffService,
    sync: SyncService,
    rbac: RbacAnalyzer,
    exporter: ExportService,
    importer: ExportService,
}

impl ReconciliationService {
    pub fn new(source: Arc<dyn RemoteDirectory>, destination: Arc<dyn RemoteDirectory>) -> Self {
        Self {
            diff: DiffService::new(source.clone(), destination.clone()),
            sync: SyncService::new(source.clone(), destination.clone()),
            rbac: RbacAnalyzer::new(source.clone()),
            exporter: ExportService::new(source),
            importer: ExportService::new(destination),
        }
    }

    pub async fn diff(&self, kind: EntityKind) -> DomainResult<DiffReport> {
        self.diff.diff(kind).await
    }

    pub async fn sync(&self, kind: EntityKind, identity: &str) -> DomainResult<SyncReport> {
        self.sync.sync(kind, identity).await
    }

    pub async fn build_rbac_tree(
        &self,
        kind: EntityKind,
        identity: &str,
    ) -> DomainResult<RbacNode> {
        self.rbac.build_tree(&rbac_root(kind, identity)?).await
    }

    pub async fn analyze(&self, kind: EntityKind, identity: &str) -> DomainResult<RbacAnalysis> {
        self.rbac.analyze(&rbac_root(kind, identity)?).await
    }

    pub fn stats(&self, tree: &RbacNode) -> RbacStats {
        rbac_analyzer::stats(tree)
    }

    pub async fn export(&self, target: TransferTarget) -> DomainResult<Value> {
        self.exporter.export(target).await
    }

    pub async fn import(
        &self,
        target: TransferTarget,
        document: Value,
    ) -> DomainResult<ImportReport> {
        self.importer.import(target, document).await
    }
}

fn rbac_root(kind: EntityKind, identity: &str) -> DomainResult<RbacRoot> {
    match kind {
        EntityKind::Role => Ok(RbacRoot::Role(identity.to_string())),
        EntityKind::User => Ok(RbacRoot::User(identity.to_string())),
        EntityKind::Client => Ok(RbacRoot::Client(identity.to_string())),
        EntityKind::Group => Err(DomainError::Validation {
            field: "kind".to_string(),
            message: "RBAC trees can be built for roles, users and clients only".to_string(),
        }),
    }
}
