use secrecy::SecretString;
use serde::Deserialize;

use crate::shared::ValidationError;

fn default_scope() -> String {
    AuthConfig::DEFAULT_SCOPE.to_string()
}

/// Authentication settings for the admin API.
///
/// This intentionally does not implement [`serde::Serialize`] to avoid accidentally
/// leaking secrets in the config into serialized forms.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Scope (audience) the bearer token is requested for.
    #[serde(default = "default_scope")]
    pub scope: String,
    /// Where the bearer token comes from.
    pub provider: TokenProviderConfig,
}

impl AuthConfig {
    pub const DEFAULT_SCOPE: &'static str = "https://api.fabric.microsoft.com/.default";

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.scope.trim().is_empty() {
            return Err(ValidationError::EmptyField("auth.scope"));
        }

        self.provider.validate()
    }
}

/// Supported token providers.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum TokenProviderConfig {
    /// A pre-issued token, usually injected from a secret store through `APP_` variables.
    Static { token: SecretString },
    /// OAuth2 client credentials grant against a token endpoint.
    ClientCredentials {
        token_url: String,
        client_id: String,
        client_secret: SecretString,
    },
}

impl TokenProviderConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            TokenProviderConfig::Static { .. } => Ok(()),
            TokenProviderConfig::ClientCredentials {
                token_url,
                client_id,
                ..
            } => {
                if token_url.trim().is_empty() {
                    return Err(ValidationError::EmptyField("auth.provider.token_url"));
                }
                if client_id.trim().is_empty() {
                    return Err(ValidationError::EmptyField("auth.provider.client_id"));
                }

                Ok(())
            }
        }
    }
}
