//! The completion client: one user message in, one reply text out.
//!
//! Backend failures never escape this boundary. Whatever goes wrong on the way to the
//! model, the caller gets either the generated text or [`FALLBACK_REPLY`].

use std::sync::Arc;

use tracing::{debug, error};

use crate::models::message::Message;
use crate::providers::base::Provider;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant in a team-messaging workspace.";
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't generate a response.";

#[derive(Clone)]
pub struct CompletionClient {
    provider: Arc<dyn Provider>,
}

impl CompletionClient {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }

    /// Ask the backend to answer `user_text` under the fixed system prompt.
    pub async fn complete(&self, user_text: &str) -> String {
        let messages = [Message::user().with_text(user_text)];

        match self.provider.complete(SYSTEM_PROMPT, &messages).await {
            Ok((message, usage)) => {
                debug!(
                    input_tokens = ?usage.input_tokens,
                    output_tokens = ?usage.output_tokens,
                    "completion succeeded"
                );
                message.content
            }
            Err(e) => {
                error!("Error with completion backend: {:#}", e);
                FALLBACK_REPLY.to_string()
            }
        }
    }
}
