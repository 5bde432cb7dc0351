use clap::{Parser, Subcommand};
use keycloak_reconcile::{EntityKind, TransferTarget};
use std::path::PathBuf;

/// Compare, replicate and analyze entities across two Keycloak realms.
///
/// Realms are configured through SOURCE_KEYCLOAK_* and DEST_KEYCLOAK_* environment
/// variables. Results are printed to stdout as JSON; logs go to stderr.
#[derive(Debug, Parser)]
#[command(name = "kc-reconcile", version, about)]
pub struct Cli {
    /// Print single-line JSON instead of pretty-printed output
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Diff every entity of one kind between the source and destination realms
    Diff {
        /// role, client, group or user
        kind: EntityKind,
    },

    /// Replicate one entity from the source realm into the destination realm
    Sync {
        /// role, client, group or user
        kind: EntityKind,
        /// Role name, clientId, group path or username
        key: String,
    },

    /// Expand what a role, user or client grants in the source realm
    Rbac {
        /// role, user or client
        kind: EntityKind,
        /// Role name, username or clientId
        key: String,
        /// Print only the per-type node counts
        #[arg(long)]
        stats_only: bool,
    },

    /// Print the raw admin representation of the source realm, its users or its clients
    Export {
        /// realm, users or clients
        target: TransferTarget,
    },

    /// Write an exported document into the destination realm
    Import {
        /// realm, users or clients
        target: TransferTarget,
        /// JSON document to import; `-` reads stdin
        #[arg(long, short, default_value = "-")]
        file: PathBuf,
    },
}

impl Command {
    pub fn needs_destination(&self) -> bool {
        !matches!(self, Command::Rbac { .. } | Command::Export { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Diff { .. } => "diff",
            Command::Sync { .. } => "sync",
            Command::Rbac { .. } => "rbac",
            Command::Export { .. } => "export",
            Command::Import { .. } => "import",
        }
    }
}
