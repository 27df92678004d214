use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;

use crate::models::message::Message;
use crate::providers::base::{Provider, Usage};

/// A mock provider that returns pre-configured responses for testing
///
/// Each call pops the next scripted result and records the user text it was asked
/// to complete.
pub struct MockProvider {
    responses: Arc<Mutex<Vec<Result<String, String>>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of text responses
    pub fn new(responses: Vec<&str>) -> Self {
        Self::scripted(responses.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    /// Create a mock provider that fails every call
    pub fn failing() -> Self {
        Self::scripted(Vec::new())
    }

    pub fn scripted(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// User texts this provider was asked to complete, in call order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, _system: &str, messages: &[Message]) -> Result<(Message, Usage)> {
        let user_text = messages
            .last()
            .map(|m| m.text().to_string())
            .unwrap_or_default();
        self.requests.lock().unwrap().push(user_text);

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(anyhow!("mock provider has no scripted response"));
        }
        match responses.remove(0) {
            Ok(text) => Ok((Message::assistant().with_text(text), Usage::default())),
            Err(e) => Err(anyhow!(e)),
        }
    }
}
