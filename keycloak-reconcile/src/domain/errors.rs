use thiserror::Error;

/// Domain-specific errors for reconciliation operations
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Role not found: {role_name} in realm {realm}")]
    RoleNotFound { role_name: String, realm: String },

    #[error("Client not found: {client_id} in realm {realm}")]
    ClientNotFound { client_id: String, realm: String },

    #[error("Group not found: {path} in realm {realm}")]
    GroupNotFound { path: String, realm: String },

    #[error("User not found: {username} in realm {realm}")]
    UserNotFound { username: String, realm: String },

    #[error("{resource} not found in realm {realm}")]
    ResourceNotFound { resource: String, realm: String },

    #[error("{entity_type} already exists: {identifier}")]
    AlreadyExists {
        entity_type: String,
        identifier: String,
    },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Connection to {url} failed: {message}")]
    Connectivity { url: String, message: String },

    #[error("{operation} rejected with status {status}: {body}")]
    RemoteRejected {
        status: u16,
        operation: String,
        body: String,
    },

    /// A batch where some items failed after every item was attempted
    #[error("{operation} incomplete: {}", .failures.join("; "))]
    Incomplete {
        operation: String,
        failures: Vec<String>,
    },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },
}

impl DomainError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::RoleNotFound { .. }
                | DomainError::ClientNotFound { .. }
                | DomainError::GroupNotFound { .. }
                | DomainError::UserNotFound { .. }
                | DomainError::ResourceNotFound { .. }
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, DomainError::AlreadyExists { .. })
    }

    /// Errors that mean no session with the realm exists; nothing downstream can proceed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DomainError::Connectivity { .. }
                | DomainError::AuthenticationFailed { .. }
                | DomainError::Configuration { .. }
        )
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Authentication-specific errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token acquisition failed: {reason}")]
    TokenAcquisitionFailed { reason: String },

    #[error("Token endpoint unreachable: {reason}")]
    EndpointUnreachable { url: String, reason: String },
}

impl From<AuthError> for DomainError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => DomainError::AuthenticationFailed {
                reason: "Invalid credentials".to_string(),
            },
            AuthError::TokenAcquisitionFailed { reason } => {
                DomainError::AuthenticationFailed { reason }
            }
            AuthError::EndpointUnreachable { url, reason } => DomainError::Connectivity {
                url,
                message: reason,
            },
        }
    }
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}")]
    MissingRequired { key: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl From<ConfigError> for DomainError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingRequired { key } => DomainError::Configuration {
                message: format!("Missing required configuration: {key}"),
            },
            ConfigError::InvalidValue { key, message } => DomainError::Configuration {
                message: format!("Invalid value for {key}: {message}"),
            },
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization {
            message: err.to_string(),
        }
    }
}
