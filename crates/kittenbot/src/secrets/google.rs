//! Google Cloud Secret Manager over its REST API.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;

use super::store::SecretStore;
use crate::errors::{SecretError, SecretResult};

pub const SECRET_MANAGER_ENDPOINT: &str = "https://secretmanager.googleapis.com";
pub const METADATA_HOST: &str = "http://metadata.google.internal";

const METADATA_TOKEN_PATH: &str =
    "/computeMetadata/v1/instance/service-accounts/default/token";

/// Where the bearer token for Secret Manager calls comes from
#[derive(Debug)]
pub enum TokenSource {
    /// A pre-issued OAuth access token
    Static(SecretString),
    /// The GCE/Cloud Run metadata server for the attached service account
    MetadataServer { host: String },
}

#[derive(Debug)]
pub struct GoogleSecretManagerConfig {
    pub endpoint: String,
    pub project_id: String,
    pub token_source: TokenSource,
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
}

#[derive(Deserialize)]
struct AccessSecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Deserialize)]
struct SecretPayload {
    #[serde(default)]
    data: String,
}

pub struct GoogleSecretManager {
    client: Client,
    config: GoogleSecretManagerConfig,
    /// Metadata-server token, fetched on the first lookup and shared by the rest
    metadata_token: OnceCell<String>,
}

impl GoogleSecretManager {
    pub fn new(config: GoogleSecretManagerConfig) -> SecretResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            config,
            metadata_token: OnceCell::new(),
        })
    }

    /// Fully qualified resource name of the latest version of `name`
    pub fn resource_name(&self, name: &str) -> String {
        format!(
            "projects/{}/secrets/{}/versions/latest",
            self.config.project_id, name
        )
    }

    async fn access_token(&self) -> SecretResult<String> {
        match &self.config.token_source {
            TokenSource::Static(token) => Ok(token.expose_secret().to_string()),
            TokenSource::MetadataServer { host } => self
                .metadata_token
                .get_or_try_init(|| fetch_metadata_token(&self.client, host))
                .await
                .cloned(),
        }
    }
}

async fn fetch_metadata_token(client: &Client, host: &str) -> SecretResult<String> {
    let url = format!("{}{}", host.trim_end_matches('/'), METADATA_TOKEN_PATH);
    debug!("Fetching access token from the metadata server");
    let response = client
        .get(&url)
        .header("Metadata-Flavor", "Google")
        .send()
        .await
        .map_err(|e| SecretError::Token(e.to_string()))?;

    if !response.status().is_success() {
        return Err(SecretError::Token(format!(
            "metadata server returned {}",
            response.status()
        )));
    }

    let token: MetadataToken = response
        .json()
        .await
        .map_err(|e| SecretError::Token(e.to_string()))?;
    Ok(token.access_token)
}

fn decode_payload(name: &str, data: &str) -> SecretResult<String> {
    let bytes = STANDARD.decode(data).map_err(|e| SecretError::Decode {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| SecretError::Decode {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl SecretStore for GoogleSecretManager {
    async fn access_latest(&self, name: &str) -> SecretResult<String> {
        let resource = self.resource_name(name);
        let url = format!(
            "{}/v1/{}:access",
            self.config.endpoint.trim_end_matches('/'),
            resource
        );
        debug!(%resource, "Accessing secret version");

        let token = self.access_token().await?;
        let response = self.client.get(&url).bearer_auth(token).send().await?;

        match response.status() {
            status if status.is_success() => {
                let body: AccessSecretVersionResponse = response.json().await?;
                decode_payload(name, &body.payload.data)
            }
            StatusCode::NOT_FOUND => Err(SecretError::NotFound(resource)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(SecretError::PermissionDenied(resource))
            }
            status => Err(SecretError::Status {
                name: resource,
                status: status.as_u16(),
            }),
        }
    }
}
