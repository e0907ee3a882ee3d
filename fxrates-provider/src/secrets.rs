//! Secret resolution from the process environment.

use async_trait::async_trait;

use fxrates_types::{SecretError, SecretStore};

/// Resolves secrets from environment variables.
///
/// Secrets are named in PascalCase (`ExchangeRateApiKey`); the
/// variable actually read is the SCREAMING_SNAKE form
/// (`EXCHANGE_RATE_API_KEY`). An empty value counts as missing so a
/// blank line in an env file cannot masquerade as a credential.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    pub fn new() -> Self {
        Self
    }

    /// Maps a logical secret name onto its environment variable name.
    pub fn env_key(name: &str) -> String {
        let mut key = String::with_capacity(name.len() + 4);
        for (i, ch) in name.chars().enumerate() {
            if ch.is_ascii_uppercase() && i > 0 {
                key.push('_');
            }
            key.push(ch.to_ascii_uppercase());
        }
        key
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get_secret(&self, name: &str) -> Result<String, SecretError> {
        let key = Self::env_key(name);
        match std::env::var(&key) {
            Ok(value) if !value.is_empty() => Ok(value),
            Ok(_) => Err(SecretError::NotFound(name.to_string())),
            Err(std::env::VarError::NotPresent) => Err(SecretError::NotFound(name.to_string())),
            Err(e) => Err(SecretError::Unavailable(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxrates_types::{SECRET_API_KEY, SECRET_DB_CONNECTION};

    #[test]
    fn test_env_key_mapping() {
        assert_eq!(EnvSecretStore::env_key(SECRET_API_KEY), "EXCHANGE_RATE_API_KEY");
        assert_eq!(
            EnvSecretStore::env_key(SECRET_DB_CONNECTION),
            "COSMOS_DB_CONNECTION_STRING"
        );
    }

    #[tokio::test]
    async fn test_get_secret_reads_mapped_variable() {
        unsafe { std::env::set_var("PROVIDER_TEST_TOKEN", "sk-123") };

        let store = EnvSecretStore::new();
        let value = store.get_secret("ProviderTestToken").await.unwrap();
        assert_eq!(value, "sk-123");
    }

    #[tokio::test]
    async fn test_missing_secret_is_not_found() {
        let store = EnvSecretStore::new();
        let result = store.get_secret("NoSuchSecretAnywhere").await;
        assert!(matches!(result, Err(SecretError::NotFound(name)) if name == "NoSuchSecretAnywhere"));
    }

    #[tokio::test]
    async fn test_empty_value_counts_as_missing() {
        unsafe { std::env::set_var("BLANK_TEST_SECRET", "") };

        let store = EnvSecretStore::new();
        let result = store.get_secret("BlankTestSecret").await;
        assert!(matches!(result, Err(SecretError::NotFound(_))));
    }
}
