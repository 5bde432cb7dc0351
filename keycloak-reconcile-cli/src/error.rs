use keycloak_reconcile::DomainError;
use std::process::ExitCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("'{command}' needs a destination realm: set DEST_KEYCLOAK_URL and its credentials")]
    MissingDestination { command: &'static str },

    #[error("Failed to write output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("Failed to read {path}: {message}")]
    Input { path: String, message: String },
}

impl CliError {
    /// 2 for configuration problems, 1 for everything else
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Domain(DomainError::Configuration { .. } | DomainError::Validation { .. })
            | CliError::MissingDestination { .. }
            | CliError::Input { .. } => ExitCode::from(2),
            _ => ExitCode::FAILURE,
        }
    }
}
