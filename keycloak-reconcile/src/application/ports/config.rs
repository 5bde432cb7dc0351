use super::auth::{RealmCredentials, RealmHandle};
use crate::domain::errors::{ConfigError, DomainResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration port for accessing application configuration
pub trait ConfigurationPort: Send + Sync {
    /// Realm diffs and syncs read from
    fn get_source_realm(&self) -> &RealmConfig;

    /// Realm syncs write to, if configured
    fn get_destination_realm(&self) -> Option<&RealmConfig>;

    /// Get HTTP client configuration
    fn get_http_config(&self) -> &HttpConfig;

    /// Get logging configuration
    fn get_logging_config(&self) -> &LoggingConfig;

    /// Validate all configuration
    fn validate(&self) -> DomainResult<()>;
}

/// Connection settings for one realm, read with a `SOURCE_` or `DEST_` prefix
#[derive(Clone, Serialize, Deserialize)]
pub struct RealmConfig {
    /// Variable prefix the settings were read with, used in error messages
    #[serde(skip)]
    pub prefix: String,
    pub url: String,
    pub realm: String,
    pub token_realm: Option<String>,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_secret: Option<String>,
    pub token: Option<String>,
}

impl std::fmt::Debug for RealmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealmConfig")
            .field("url", &self.url)
            .field("realm", &self.realm)
            .field("token_realm", &self.token_realm)
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl RealmConfig {
    fn key(&self, name: &str) -> String {
        format!("{}KEYCLOAK_{}", self.prefix, name)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.url.is_empty() {
            return Err(ConfigError::MissingRequired { key: self.key("URL") }.into());
        }

        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: self.key("URL"),
                message: "Must start with http:// or https://".to_string(),
            }
            .into());
        }

        if self.realm.trim().is_empty() {
            return Err(ConfigError::MissingRequired { key: self.key("REALM") }.into());
        }

        self.credentials().map(|_| ())
    }

    /// Resolve credentials: a pre-issued token wins, then a client secret, then a password.
    pub fn credentials(&self) -> DomainResult<RealmCredentials> {
        if let Some(token) = self.token.as_ref().filter(|t| !t.is_empty()) {
            return Ok(RealmCredentials::BearerToken { token: token.clone() });
        }

        if let Some(secret) = self.client_secret.as_ref().filter(|s| !s.is_empty()) {
            return Ok(RealmCredentials::ClientCredentials {
                client_id: self.client_id.clone(),
                client_secret: secret.clone(),
            });
        }

        match (&self.username, &self.password) {
            (Some(username), Some(password)) if !username.is_empty() => {
                Ok(RealmCredentials::Password {
                    client_id: self.client_id.clone(),
                    username: username.clone(),
                    password: password.clone(),
                })
            }
            (Some(_), _) => Err(ConfigError::MissingRequired { key: self.key("PASSWORD") }.into()),
            _ => Err(ConfigError::MissingRequired {
                key: format!(
                    "{}, {} or {}",
                    self.key("USERNAME"),
                    self.key("CLIENT_SECRET"),
                    self.key("TOKEN")
                ),
            }
            .into()),
        }
    }

    pub fn to_handle(&self) -> DomainResult<RealmHandle> {
        let handle = RealmHandle::new(&self.url, &self.realm, self.credentials()?);
        Ok(match &self.token_realm {
            Some(token_realm) => handle.with_token_realm(token_realm),
            None => handle,
        })
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 15,
            connect_timeout_seconds: 5,
            user_agent: concat!("keycloak-reconcile/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    pub fn validate(&self) -> DomainResult<()> {
        if self.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                key: "HTTP_TIMEOUT_SECONDS".to_string(),
                message: "Must be greater than 0".to_string(),
            }
            .into());
        }

        if self.connect_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                key: "HTTP_CONNECT_TIMEOUT_SECONDS".to_string(),
                message: "Must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(())
    }

    pub fn get_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn get_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
        }
    }
}

/// Log level enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Log format enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub source: RealmConfig,
    pub destination: Option<RealmConfig>,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> DomainResult<()> {
        self.source.validate()?;
        if let Some(destination) = &self.destination {
            destination.validate()?;
        }
        self.http.validate()?;
        Ok(())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> DomainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = read_realm(&lookup, "SOURCE_")?.ok_or_else(|| ConfigError::MissingRequired {
            key: "SOURCE_KEYCLOAK_URL".to_string(),
        })?;
        let destination = read_realm(&lookup, "DEST_")?;

        let defaults = HttpConfig::default();
        let http = HttpConfig {
            timeout_seconds: parse_or(&lookup, "HTTP_TIMEOUT_SECONDS", defaults.timeout_seconds)?,
            connect_timeout_seconds: parse_or(
                &lookup,
                "HTTP_CONNECT_TIMEOUT_SECONDS",
                defaults.connect_timeout_seconds,
            )?,
            user_agent: lookup("HTTP_USER_AGENT").unwrap_or(defaults.user_agent),
        };

        let logging = LoggingConfig {
            level: lookup("LOG_LEVEL")
                .unwrap_or_else(|| "info".to_string())
                .parse()
                .unwrap_or(LogLevel::Info),
            format: lookup("LOG_FORMAT")
                .unwrap_or_else(|| "compact".to_string())
                .parse()
                .unwrap_or(LogFormat::Compact),
        };

        let config = AppConfig {
            source,
            destination,
            http,
            logging,
        };

        config.validate()?;
        Ok(config)
    }
}

/// A realm is configured when its URL variable is set.
fn read_realm<F>(lookup: &F, prefix: &str) -> DomainResult<Option<RealmConfig>>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(&format!("{prefix}KEYCLOAK_{name}"));

    let Some(url) = var("URL") else {
        return Ok(None);
    };

    let realm = var("REALM").ok_or_else(|| ConfigError::MissingRequired {
        key: format!("{prefix}KEYCLOAK_REALM"),
    })?;

    Ok(Some(RealmConfig {
        prefix: prefix.to_string(),
        url,
        realm,
        token_realm: var("TOKEN_REALM"),
        client_id: var("CLIENT_ID").unwrap_or_else(|| "admin-cli".to_string()),
        username: var("USERNAME"),
        password: var("PASSWORD"),
        client_secret: var("CLIENT_SECRET"),
        token: var("TOKEN"),
    }))
}

fn parse_or<F>(lookup: &F, key: &str, default: u64) -> DomainResult<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("Expected a number of seconds, got '{raw}'"),
            }
            .into()
        }),
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {s}")),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {s}")),
        }
    }
}
