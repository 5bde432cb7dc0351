use crate::domain::errors::AuthError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bearer token issued by a realm's token endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub token_type: String,
}

impl AuthToken {
    pub fn new(access_token: String, expires_in: i64, token_type: Option<String>) -> Self {
        Self {
            access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(expires_in),
            token_type: token_type.unwrap_or_else(|| "Bearer".to_string()),
        }
    }

    /// A token supplied by the caller. Its lifetime is unknown, so it never expires locally.
    pub fn pre_issued(access_token: String) -> Self {
        Self {
            access_token,
            expires_at: DateTime::<Utc>::MAX_UTC,
            token_type: "Bearer".to_string(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    pub fn is_expiring_soon(&self, seconds: i64) -> bool {
        Utc::now() + chrono::Duration::seconds(seconds) >= self.expires_at
    }
}

/// How a realm handle authenticates against the admin API
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "grant", rename_all = "snake_case")]
pub enum RealmCredentials {
    Password {
        client_id: String,
        username: String,
        password: String,
    },
    ClientCredentials {
        client_id: String,
        client_secret: String,
    },
    BearerToken {
        token: String,
    },
}

impl RealmCredentials {
    pub fn admin_password(username: impl Into<String>, password: impl Into<String>) -> Self {
        RealmCredentials::Password {
            client_id: "admin-cli".to_string(),
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn grant_type(&self) -> &'static str {
        match self {
            RealmCredentials::Password { .. } => "password",
            RealmCredentials::ClientCredentials { .. } => "client_credentials",
            RealmCredentials::BearerToken { .. } => "bearer",
        }
    }
}

impl fmt::Debug for RealmCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RealmCredentials::Password {
                client_id, username, ..
            } => f
                .debug_struct("Password")
                .field("client_id", client_id)
                .field("username", username)
                .field("password", &"***")
                .finish(),
            RealmCredentials::ClientCredentials { client_id, .. } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .field("client_secret", &"***")
                .finish(),
            RealmCredentials::BearerToken { .. } => f
                .debug_struct("BearerToken")
                .field("token", &"***")
                .finish(),
        }
    }
}

/// Connection details for one realm: where it lives and how to authenticate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealmHandle {
    pub base_url: String,
    pub realm: String,
    /// Realm the token is requested from. Admin users usually live in `master`.
    pub token_realm: String,
    pub credentials: RealmCredentials,
}

impl RealmHandle {
    pub fn new(
        base_url: impl Into<String>,
        realm: impl Into<String>,
        credentials: RealmCredentials,
    ) -> Self {
        let realm = realm.into();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token_realm: realm.clone(),
            realm,
            credentials,
        }
    }

    pub fn with_token_realm(mut self, token_realm: impl Into<String>) -> Self {
        self.token_realm = token_realm.into();
        self
    }

    pub fn token_endpoint(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.base_url, self.token_realm
        )
    }
}

/// Token management port
#[async_trait]
pub trait TokenManager: Send + Sync {
    /// Obtain a bearer token for the handle's credentials
    async fn acquire_token(&self, handle: &RealmHandle) -> Result<AuthToken, AuthError>;
}
