//! Credential resolution from a remote secret store.
//!
//! [`SecretProvider::resolve`] is the only entry point the rest of the crate uses. It
//! turns every store failure into an absent value after logging it, so callers only
//! have to decide what an absent credential means for them.

pub mod google;
pub mod store;

use secrecy::{ExposeSecret, SecretString};
use tracing::{error, info};

use crate::errors::MissingSecretsError;
use store::SecretStore;

pub const BOT_TOKEN_SECRET: &str = "bot-token";
pub const SIGNING_SECRET_SECRET: &str = "client-signing-secret";
pub const API_KEY_SECRET: &str = "api-key";

/// A named secret value held in memory for the lifetime of the process
#[derive(Debug)]
pub struct Credential {
    name: String,
    value: SecretString,
}

impl Credential {
    pub fn new<S: Into<String>>(name: S, value: String) -> Self {
        Self {
            name: name.into(),
            value: SecretString::from(value),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn into_secret(self) -> SecretString {
        self.value
    }
}

/// Names of the secrets the relay needs, as stored in the secret store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretNames {
    pub bot_token: String,
    pub signing_secret: String,
    pub api_key: String,
}

impl Default for SecretNames {
    fn default() -> Self {
        Self {
            bot_token: BOT_TOKEN_SECRET.to_string(),
            signing_secret: SIGNING_SECRET_SECRET.to_string(),
            api_key: API_KEY_SECRET.to_string(),
        }
    }
}

/// The three credentials the relay cannot run without
#[derive(Debug)]
pub struct Credentials {
    pub bot_token: Credential,
    pub signing_secret: Credential,
    pub api_key: Credential,
}

pub struct SecretProvider<S> {
    store: S,
}

impl<S: SecretStore> SecretProvider<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Resolve the latest version of `name`, or `None` if it cannot be read or is empty
    pub async fn resolve(&self, name: &str) -> Option<Credential> {
        match self.store.access_latest(name).await {
            Ok(value) if value.is_empty() => {
                error!(secret = name, "Secret resolved to an empty value");
                None
            }
            Ok(value) => Some(Credential::new(name, value)),
            Err(e) => {
                error!(secret = name, "Error retrieving secret: {}", e);
                None
            }
        }
    }

    /// Resolve every required credential, reporting all names that came back absent
    pub async fn resolve_credentials(
        &self,
        names: &SecretNames,
    ) -> Result<Credentials, MissingSecretsError> {
        let bot_token = self.resolve(&names.bot_token).await;
        let signing_secret = self.resolve(&names.signing_secret).await;
        let api_key = self.resolve(&names.api_key).await;

        match (bot_token, signing_secret, api_key) {
            (Some(bot_token), Some(signing_secret), Some(api_key)) => {
                info!("Resolved all required secrets");
                Ok(Credentials {
                    bot_token,
                    signing_secret,
                    api_key,
                })
            }
            (bot_token, signing_secret, api_key) => {
                let missing = [
                    (bot_token.is_none(), &names.bot_token),
                    (signing_secret.is_none(), &names.signing_secret),
                    (api_key.is_none(), &names.api_key),
                ]
                .into_iter()
                .filter(|(absent, _)| *absent)
                .map(|(_, name)| name.clone())
                .collect();
                Err(MissingSecretsError(missing))
            }
        }
    }
}
