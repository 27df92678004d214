use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::errors::SecretResult;

/// A remote store of versioned, named secrets
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Read the payload of the latest version of the secret `name`
    async fn access_latest(&self, name: &str) -> SecretResult<String>;
}
