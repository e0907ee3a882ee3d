//! Secret-resolution port.

use crate::error::SecretError;

/// Secret name for the rate-provider API credential.
///
/// The names are lookup keys into whatever vault the deployment provisions;
/// they must match the entries provisioned there.
pub const SECRET_API_KEY: &str = "ExchangeRateApiKey";

/// Secret name for the rate store's connection string.
pub const SECRET_DB_CONNECTION: &str = "CosmosDbConnectionString";

/// Port trait for resolving named secrets.
///
/// A failure here is fatal to the workflow instance that asked.
#[async_trait::async_trait]
pub trait SecretStore: Send + Sync + 'static {
    /// Resolves the secret registered under `name`.
    async fn get_secret(&self, name: &str) -> Result<String, SecretError>;
}
