//! OAuth2 client credentials grant.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, error};

use crate::auth::TokenProvider;
use crate::bail;
use crate::error::{ErrorKind, SyncResult};

/// Timeout for token endpoint requests.
const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Exchanges a client id and secret for an access token at a token endpoint.
#[derive(Debug, Clone)]
pub struct ClientCredentialsTokenProvider {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: SecretString,
}

impl ClientCredentialsTokenProvider {
    pub fn new(
        token_url: String,
        client_id: String,
        client_secret: SecretString,
    ) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            token_url,
            client_id,
            client_secret,
        })
    }
}

impl TokenProvider for ClientCredentialsTokenProvider {
    fn name(&self) -> &'static str {
        "client_credentials"
    }

    async fn token(&self, scope: &str) -> SyncResult<SecretString> {
        debug!(token_url = %self.token_url, scope, "requesting access token");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret().as_str()),
            ("scope", scope),
        ];

        let response = match self.client.post(&self.token_url).form(&form).send().await {
            Ok(response) => response,
            Err(err) => bail!(
                ErrorKind::AuthenticationError,
                "Token endpoint could not be reached",
                err.to_string(),
                source: err
            ),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read body>".to_string());
            error!(status = %status, body = %body, "token request failed");

            bail!(
                ErrorKind::AuthenticationError,
                "Token endpoint rejected the credentials",
                format!("status {status}")
            );
        }

        let token_response: TokenResponse = match response.json().await {
            Ok(token_response) => token_response,
            Err(err) => bail!(
                ErrorKind::AuthenticationError,
                "Token endpoint returned an invalid body",
                err.to_string(),
                source: err
            ),
        };

        match token_response.access_token {
            Some(token) if !token.is_empty() => Ok(SecretString::new(token)),
            _ => bail!(
                ErrorKind::AuthenticationError,
                "Token endpoint response has no access token"
            ),
        }
    }
}
