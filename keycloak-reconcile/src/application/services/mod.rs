pub mod diff_service;
pub mod export_service;
pub mod rbac_analyzer;
pub mod reconciliation;
pub mod sync_service;

pub use diff_service::{reconcile_collections, DiffService};
pub use export_service::*;
pub use rbac_analyzer::RbacAnalyzer;
pub use reconciliation::*;
pub use sync_service::*;
