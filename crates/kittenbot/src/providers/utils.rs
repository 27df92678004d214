use anyhow::{anyhow, Result};
use serde_json::{json, Map, Value};

use super::configs::SamplingParams;
use crate::models::message::Message;
use crate::models::role::Role;

/// Convert internal Message format to OpenAI's API message specification
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            json!({
                "role": message.role,
                "content": message.content,
            })
        })
        .collect()
}

/// Insert the sampling parameters that are set into a chat completions payload
pub fn apply_sampling(payload: &mut Map<String, Value>, sampling: &SamplingParams) {
    if let Some(temperature) = sampling.temperature {
        payload.insert("temperature".to_string(), json!(temperature));
    }
    if let Some(max_tokens) = sampling.max_tokens {
        payload.insert("max_tokens".to_string(), json!(max_tokens));
    }
    if let Some(top_p) = sampling.top_p {
        payload.insert("top_p".to_string(), json!(top_p));
    }
    if let Some(penalty) = sampling.frequency_penalty {
        payload.insert("frequency_penalty".to_string(), json!(penalty));
    }
    if let Some(penalty) = sampling.presence_penalty {
        payload.insert("presence_penalty".to_string(), json!(penalty));
    }
}

/// Take the first choice of a chat completions response as the assistant message.
///
/// Only a string `content` counts as a result; a missing choice or a null content
/// is treated as a malformed response.
pub fn openai_response_to_message(response: &Value) -> Result<Message> {
    let first = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .ok_or_else(|| anyhow!("No choices in completion response"))?;

    let content = first
        .get("message")
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .ok_or_else(|| anyhow!("First choice has no text content"))?;

    Ok(Message {
        role: Role::Assistant,
        content: content.to_string(),
    })
}

#[derive(Debug, thiserror::Error)]
#[error("Context length exceeded. Message: {0}")]
pub struct ContextLengthExceededError(String);

pub fn check_openai_context_length_error(error: &Value) -> Option<ContextLengthExceededError> {
    let code = error.get("code")?.as_str()?;
    if code == "context_length_exceeded" || code == "string_above_max_length" {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Some(ContextLengthExceededError(message))
    } else {
        None
    }
}
