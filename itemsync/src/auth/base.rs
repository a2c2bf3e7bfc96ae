use std::future::Future;

use itemsync_config::shared::TokenProviderConfig;
use secrecy::SecretString;

use crate::auth::client_credentials::ClientCredentialsTokenProvider;
use crate::auth::static_token::StaticTokenProvider;
use crate::error::SyncResult;

/// Source of bearer tokens for a scope.
///
/// Implementations are opaque to the pipeline: it asks for one token per run and fails the
/// run with [`crate::error::ErrorKind::AuthenticationError`] when none can be produced.
pub trait TokenProvider {
    /// Returns the name of the provider, used in logs.
    fn name(&self) -> &'static str;

    /// Produces a bearer token valid for `scope`.
    fn token(&self, scope: &str) -> impl Future<Output = SyncResult<SecretString>> + Send;
}

/// Token provider selected from configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredTokenProvider {
    Static(StaticTokenProvider),
    ClientCredentials(ClientCredentialsTokenProvider),
}

impl ConfiguredTokenProvider {
    pub fn from_config(config: &TokenProviderConfig) -> SyncResult<Self> {
        let provider = match config {
            TokenProviderConfig::Static { token } => {
                ConfiguredTokenProvider::Static(StaticTokenProvider::new(token.clone()))
            }
            TokenProviderConfig::ClientCredentials {
                token_url,
                client_id,
                client_secret,
            } => ConfiguredTokenProvider::ClientCredentials(ClientCredentialsTokenProvider::new(
                token_url.clone(),
                client_id.clone(),
                client_secret.clone(),
            )?),
        };

        Ok(provider)
    }
}

impl TokenProvider for ConfiguredTokenProvider {
    fn name(&self) -> &'static str {
        match self {
            ConfiguredTokenProvider::Static(provider) => provider.name(),
            ConfiguredTokenProvider::ClientCredentials(provider) => provider.name(),
        }
    }

    async fn token(&self, scope: &str) -> SyncResult<SecretString> {
        match self {
            ConfiguredTokenProvider::Static(provider) => provider.token(scope).await,
            ConfiguredTokenProvider::ClientCredentials(provider) => provider.token(scope).await,
        }
    }
}
