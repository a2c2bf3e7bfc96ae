use secrecy::SecretString;

use crate::auth::TokenProvider;
use crate::error::SyncResult;

/// Returns a pre-issued token for every scope.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: SecretString,
}

impl StaticTokenProvider {
    pub fn new(token: SecretString) -> Self {
        Self { token }
    }
}

impl TokenProvider for StaticTokenProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn token(&self, _scope: &str) -> SyncResult<SecretString> {
        Ok(self.token.clone())
    }
}
