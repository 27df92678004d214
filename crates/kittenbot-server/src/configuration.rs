use crate::error::{to_env_var, ConfigError, ENV_PREFIX};
use config::{Config, Environment, File};
use kittenbot::handler::INTERIM_MESSAGE;
use kittenbot::providers::configs::{
    OpenAiProviderConfig, SamplingParams, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, OPENAI_HOST,
    OPENAI_MODEL,
};
use kittenbot::secrets::google::{
    GoogleSecretManagerConfig, TokenSource, METADATA_HOST, SECRET_MANAGER_ENDPOINT,
};
use kittenbot::secrets::{SecretNames, API_KEY_SECRET, BOT_TOKEN_SECRET, SIGNING_SECRET_SECRET};
use kittenbot::slack::client::SLACK_API_BASE;
use secrecy::SecretString;
use serde::Deserialize;
use std::env;
use std::net::{AddrParseError, SocketAddr};
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[derive(Debug, Deserialize)]
pub struct SecretSettings {
    pub project_id: String,
    pub endpoint: String,
    pub metadata_host: String,
    #[serde(default)]
    pub access_token: Option<String>,
    pub bot_token_name: String,
    pub signing_secret_name: String,
    pub api_key_name: String,
}

impl SecretSettings {
    pub fn names(&self) -> SecretNames {
        SecretNames {
            bot_token: self.bot_token_name.clone(),
            signing_secret: self.signing_secret_name.clone(),
            api_key: self.api_key_name.clone(),
        }
    }

    pub fn store_config(&self) -> GoogleSecretManagerConfig {
        let token_source = match &self.access_token {
            Some(token) if !token.is_empty() => TokenSource::Static(SecretString::from(token.clone())),
            _ => TokenSource::MetadataServer {
                host: self.metadata_host.clone(),
            },
        };
        GoogleSecretManagerConfig {
            endpoint: self.endpoint.clone(),
            project_id: self.project_id.clone(),
            token_source,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CompletionSettings {
    pub host: String,
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<i32>,
    #[serde(default)]
    pub top_p: Option<f64>,
    #[serde(default)]
    pub frequency_penalty: Option<f64>,
    #[serde(default)]
    pub presence_penalty: Option<f64>,
    pub timeout_secs: u64,
}

impl CompletionSettings {
    pub fn provider_config(&self, api_key: SecretString) -> OpenAiProviderConfig {
        OpenAiProviderConfig {
            host: self.host.clone(),
            api_key,
            model: self.model.clone(),
            sampling: SamplingParams {
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                top_p: self.top_p,
                frequency_penalty: self.frequency_penalty,
                presence_penalty: self.presence_penalty,
            },
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SlackSettings {
    pub api_base: String,
    pub verify_signatures: bool,
    pub process_before_response: bool,
    pub interim_message: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub secrets: SecretSettings,
    pub completion: CompletionSettings,
    pub slack: SlackSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // Server defaults
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            // Secret store defaults
            .set_default("secrets.endpoint", SECRET_MANAGER_ENDPOINT)?
            .set_default("secrets.metadata_host", METADATA_HOST)?
            .set_default("secrets.bot_token_name", BOT_TOKEN_SECRET)?
            .set_default("secrets.signing_secret_name", SIGNING_SECRET_SECRET)?
            .set_default("secrets.api_key_name", API_KEY_SECRET)?
            // Completion defaults
            .set_default("completion.host", OPENAI_HOST)?
            .set_default("completion.model", OPENAI_MODEL)?
            .set_default("completion.temperature", DEFAULT_TEMPERATURE)?
            .set_default("completion.max_tokens", i64::from(DEFAULT_MAX_TOKENS))?
            .set_default("completion.timeout_secs", 60)?
            // Slack defaults
            .set_default("slack.api_base", SLACK_API_BASE)?
            .set_default("slack.verify_signatures", true)?
            .set_default("slack.process_before_response", true)?
            .set_default("slack.interim_message", INTERIM_MESSAGE)?;

        // Platform variables sit below the config file and prefixed variables
        for (var, key) in PLATFORM_ENV_VARS {
            if let Ok(value) = env::var(var) {
                builder = builder.set_default(*key, value)?;
            }
        }

        let config = builder
            // Optional kittenbot.toml next to the binary's working directory
            .add_source(File::with_name("kittenbot").required(false))
            // Layer on the environment variables
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        match result {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                if let config::ConfigError::NotFound(field) = &err {
                    return Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    });
                }
                match missing_field_path(&err.to_string()) {
                    Some(field) => Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(&field),
                    }),
                    None => Err(ConfigError::Other(err)),
                }
            }
        }
    }
}

/// Platform variables honoured without the `KITTENBOT_` prefix, as Cloud Run sets them
const PLATFORM_ENV_VARS: &[(&str, &str)] = &[
    ("PORT", "server.port"),
    ("PROJECT_ID", "secrets.project_id"),
];

/// Pull the settings path out of "missing field `x`" or
/// "missing field `x` for key `section`"
fn missing_field_path(message: &str) -> Option<String> {
    let rest = message.strip_prefix("missing field `")?;
    let (field, rest) = rest.split_once('`')?;
    let section = rest
        .strip_prefix(" for key `")
        .and_then(|key| key.split_once('`'))
        .map(|(key, _)| key);

    Some(match section {
        Some(section) if !section.is_empty() => format!("{}.{}", section, field),
        _ => field.to_string(),
    })
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}
