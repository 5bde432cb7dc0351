use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::application::ports::auth::*;
use crate::domain::errors::*;

/// Raw token response from Keycloak
#[derive(Debug, Clone, Deserialize)]
struct RawTokenResponse {
    access_token: String,
    expires_in: i64,
    token_type: Option<String>,
}

/// Obtains admin API tokens from a realm's OpenID Connect token endpoint
pub struct KeycloakTokenManager {
    client: reqwest::Client,
}

impl KeycloakTokenManager {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn new_with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Convert raw token response to our domain AuthToken
    fn convert_raw_token(&self, raw_token: RawTokenResponse) -> AuthToken {
        AuthToken::new(raw_token.access_token, raw_token.expires_in, raw_token.token_type)
    }
}

impl Default for KeycloakTokenManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenManager for KeycloakTokenManager {
    async fn acquire_token(&self, handle: &RealmHandle) -> Result<AuthToken, AuthError> {
        let form_data = match &handle.credentials {
            RealmCredentials::BearerToken { token } => {
                return Ok(AuthToken::pre_issued(token.clone()));
            }
            RealmCredentials::ClientCredentials {
                client_id,
                client_secret,
            } => vec![
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ],
            RealmCredentials::Password {
                client_id,
                username,
                password,
            } => vec![
                ("client_id", client_id.as_str()),
                ("username", username.as_str()),
                ("password", password.as_str()),
                ("grant_type", "password"),
            ],
        };

        let token_url = handle.token_endpoint();
        debug!(url = %token_url, grant = handle.credentials.grant_type(), "Requesting admin token");

        let response = self
            .client
            .post(&token_url)
            .form(&form_data)
            .send()
            .await
            .map_err(|e| AuthError::EndpointUnreachable {
                url: token_url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::BAD_REQUEST
        {
            return Err(AuthError::InvalidCredentials);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenAcquisitionFailed {
                reason: format!("HTTP error {}: {}", status, error_text),
            });
        }

        let raw_token: RawTokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::TokenAcquisitionFailed {
                reason: format!("Failed to parse token response: {}", e),
            })?;

        Ok(self.convert_raw_token(raw_token))
    }
}
