//! Posting replies through the Slack Web API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::events::Conversation;
use crate::errors::{SlackError, SlackResult};

pub const SLACK_API_BASE: &str = "https://slack.com/api";

/// A reply addressed to the conversation its triggering message came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundReply {
    pub conversation: Conversation,
    pub text: String,
}

impl OutboundReply {
    pub fn new<S: Into<String>>(conversation: Conversation, text: S) -> Self {
        Self {
            conversation,
            text: text.into(),
        }
    }
}

/// The messaging side of the relay: something that can deliver a reply
#[async_trait]
pub trait ReplyTransport: Send + Sync {
    async fn send(&self, reply: &OutboundReply) -> SlackResult<()>;
}

#[derive(Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_ts: Option<&'a str>,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug)]
pub struct SlackClientConfig {
    pub api_base: String,
    pub bot_token: SecretString,
}

pub struct SlackClient {
    client: Client,
    config: SlackClientConfig,
}

impl SlackClient {
    pub fn new(config: SlackClientConfig) -> SlackResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self { client, config })
    }

    /// Call `chat.postMessage`
    pub async fn post_message(&self, reply: &OutboundReply) -> SlackResult<()> {
        let url = format!(
            "{}/chat.postMessage",
            self.config.api_base.trim_end_matches('/')
        );
        let request = PostMessageRequest {
            channel: &reply.conversation.channel,
            text: &reply.text,
            thread_ts: reply.conversation.thread_ts.as_deref(),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.bot_token.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SlackError::Status(response.status().as_u16()));
        }

        let body: ApiResponse = response.json().await?;
        if !body.ok {
            return Err(SlackError::Api(
                body.error.unwrap_or_else(|| "unknown".to_string()),
            ));
        }

        debug!(channel = %reply.conversation.channel, "Posted message");
        Ok(())
    }
}

#[async_trait]
impl ReplyTransport for SlackClient {
    async fn send(&self, reply: &OutboundReply) -> SlackResult<()> {
        self.post_message(reply).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(api_base: String) -> SlackClient {
        SlackClient::new(SlackClientConfig {
            api_base,
            bot_token: SecretString::from("xoxb-test".to_string()),
        })
        .unwrap()
    }

    fn reply(thread_ts: Option<&str>) -> OutboundReply {
        OutboundReply::new(
            Conversation {
                channel: "C123".to_string(),
                thread_ts: thread_ts.map(String::from),
            },
            "hi there",
        )
    }

    #[tokio::test]
    async fn test_post_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .and(header("Authorization", "Bearer xoxb-test"))
            .and(body_json(json!({"channel": "C123", "text": "hi there"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        client(server.uri()).send(&reply(None)).await.unwrap();
    }

    #[tokio::test]
    async fn test_post_message_in_thread() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .and(body_json(json!({
                "channel": "C123",
                "text": "hi there",
                "thread_ts": "111.222"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        client(server.uri())
            .send(&reply(Some("111.222")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_post_message_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": false, "error": "channel_not_found"})),
            )
            .mount(&server)
            .await;

        let err = client(server.uri()).send(&reply(None)).await.unwrap_err();
        assert!(matches!(err, SlackError::Api(ref e) if e == "channel_not_found"));
    }

    #[tokio::test]
    async fn test_post_message_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = client(server.uri()).send(&reply(None)).await.unwrap_err();
        assert!(matches!(err, SlackError::Status(502)));
    }
}
