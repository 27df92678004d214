use thiserror::Error;

pub const ENV_PREFIX: &str = "KITTENBOT";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Map a dotted settings key to the environment variable that sets it,
/// e.g. `secrets.project_id` -> `KITTENBOT_SECRETS__PROJECT_ID`
pub fn to_env_var(field_path: &str) -> String {
    let nested = field_path
        .split('.')
        .map(|part| part.to_uppercase())
        .collect::<Vec<_>>()
        .join("__");
    format!("{}_{}", ENV_PREFIX, nested)
}
