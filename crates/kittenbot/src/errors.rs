use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SecretError {
    #[error("Secret not found: {0}")]
    NotFound(String),

    #[error("Permission denied for secret: {0}")]
    PermissionDenied(String),

    #[error("Secret store returned status {status} for {name}")]
    Status { name: String, status: u16 },

    #[error("Could not decode secret payload for {name}: {reason}")]
    Decode { name: String, reason: String },

    #[error("Could not obtain access token: {0}")]
    Token(String),

    #[error("Secret store request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

pub type SecretResult<T> = Result<T, SecretError>;

/// One or more required secrets could not be resolved at startup
#[derive(Error, Debug)]
#[error("Missing one or more required secrets: {}", .0.join(", "))]
pub struct MissingSecretsError(pub Vec<String>);

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SlackError {
    #[error("Slack API error: {0}")]
    Api(String),

    #[error("Slack API returned status {0}")]
    Status(u16),

    #[error("Slack request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

impl From<serde_json::Error> for SlackError {
    fn from(err: serde_json::Error) -> Self {
        SlackError::InvalidPayload(err.to_string())
    }
}

pub type SlackResult<T> = Result<T, SlackError>;

/// Reasons an inbound delivery fails request signature verification
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Missing header: {0}")]
    MissingHeader(&'static str),

    #[error("Invalid request timestamp")]
    InvalidTimestamp,

    #[error("Request timestamp is outside the allowed window")]
    Stale,

    #[error("Signature does not match")]
    Mismatch,
}
