//! Inbound Events API payloads.
//!
//! Every HTTP delivery is first run through [`classify`], which separates the one-time
//! `url_verification` handshake from real deliveries. Real deliveries are then turned
//! into an [`InboundEvent`] by [`parse_event`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::{SlackError, SlackResult};

pub const URL_VERIFICATION: &str = "url_verification";
pub const EVENT_CALLBACK: &str = "event_callback";

/// Set by Slack on redeliveries of an event it already sent once
pub const RETRY_NUM_HEADER: &str = "x-slack-retry-num";
pub const RETRY_REASON_HEADER: &str = "x-slack-retry-reason";

/// Message subtypes that still carry a new message written by a person
const USER_SUBTYPES: &[&str] = &["thread_broadcast", "file_share"];

/// Result of inspecting a raw delivery
#[derive(Debug, Clone, PartialEq)]
pub enum Classification<'a> {
    /// Endpoint ownership check; the challenge must be echoed back verbatim
    Handshake { challenge: String },
    /// Anything else, passed through untouched
    Event(&'a Value),
}

impl Classification<'_> {
    pub fn is_handshake(&self) -> bool {
        matches!(self, Classification::Handshake { .. })
    }

    pub fn challenge_token(&self) -> Option<&str> {
        match self {
            Classification::Handshake { challenge } => Some(challenge.as_str()),
            Classification::Event(_) => None,
        }
    }
}

/// Decide whether a delivery is a handshake. Pure; the same payload always
/// classifies the same way.
pub fn classify(payload: &Value) -> SlackResult<Classification<'_>> {
    if payload.get("type").and_then(Value::as_str) != Some(URL_VERIFICATION) {
        return Ok(Classification::Event(payload));
    }

    payload
        .get("challenge")
        .and_then(Value::as_str)
        .map(|challenge| Classification::Handshake {
            challenge: challenge.to_string(),
        })
        .ok_or_else(|| {
            SlackError::InvalidPayload("url_verification without a challenge".to_string())
        })
}

/// Where a message lives, and so where its reply goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

/// A `message` event from the Events API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    /// User who sent the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default)]
    pub text: String,
    pub channel: String,
    /// Channel type (im, channel, group, mpim).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_type: Option<String>,
    #[serde(default)]
    pub ts: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    /// Subtype of message (e.g., "bot_message", "message_changed").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// Set when the message was posted by a bot, including this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
}

impl MessageEvent {
    /// Check if this message was posted by a bot (should be ignored).
    pub fn is_bot_message(&self) -> bool {
        self.bot_id.is_some() || self.subtype.as_deref() == Some("bot_message")
    }

    /// Edits, deletions, joins and the like carry no new user text
    pub fn is_system_subtype(&self) -> bool {
        match self.subtype.as_deref() {
            None => false,
            Some(subtype) => !USER_SUBTYPES.contains(&subtype),
        }
    }

    pub fn conversation(&self) -> Conversation {
        Conversation {
            channel: self.channel.clone(),
            thread_ts: self.thread_ts.clone(),
        }
    }
}

/// The event a delivery carries, as far as the relay cares
#[derive(Debug, Clone)]
pub enum InboundEvent {
    Message(MessageEvent),
    /// Any other delivery or event type, by name
    Other(String),
}

/// Extract the inner event from an `event_callback` delivery
pub fn parse_event(payload: &Value) -> SlackResult<InboundEvent> {
    let payload_type = payload
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    if payload_type != EVENT_CALLBACK {
        return Ok(InboundEvent::Other(payload_type.to_string()));
    }

    let event = payload
        .get("event")
        .ok_or_else(|| SlackError::InvalidPayload("Missing event field".to_string()))?;
    let event_type = event
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    debug!("Parsing event type: {}", event_type);

    match event_type {
        "message" => Ok(InboundEvent::Message(serde_json::from_value(event.clone())?)),
        other => Ok(InboundEvent::Other(other.to_string())),
    }
}
