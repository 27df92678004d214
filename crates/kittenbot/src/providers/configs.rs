use std::time::Duration;

use secrecy::SecretString;

pub const OPENAI_HOST: &str = "https://api.openai.com";
pub const OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: i32 = 500;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Sampling parameters sent with every completion request. Unset values are left
/// out of the payload so the backend applies its own defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: Option<f64>,
    pub max_tokens: Option<i32>,
    pub top_p: Option<f64>,
    pub frequency_penalty: Option<f64>,
    pub presence_penalty: Option<f64>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: Some(DEFAULT_TEMPERATURE),
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            top_p: None,
            frequency_penalty: None,
            presence_penalty: None,
        }
    }
}

#[derive(Debug)]
pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: SecretString,
    pub model: String,
    pub sampling: SamplingParams,
    pub timeout: Duration,
}

impl OpenAiProviderConfig {
    /// Config pointing at the public OpenAI API with the default model and sampling
    pub fn new(api_key: SecretString) -> Self {
        Self {
            host: OPENAI_HOST.to_string(),
            api_key,
            model: OPENAI_MODEL.to_string(),
            sampling: SamplingParams::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
