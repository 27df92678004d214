//! The message handler ties an inbound Slack event to a completion and a reply.
//!
//! A handler owns no mutable state. Every call to [`MessageHandler::handle`] builds its
//! own request and result, so events for different conversations can be handled
//! concurrently from a single shared handler.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::completion::CompletionClient;
use crate::slack::client::{OutboundReply, ReplyTransport};
use crate::slack::events::{InboundEvent, MessageEvent};

pub const INTERIM_MESSAGE: &str = "Thinking... 🤔";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Posted by a bot, possibly ourselves; answering would loop
    BotMessage,
    /// An edit, deletion or other non-message subtype
    Subtype(String),
    NoUser,
    EmptyText,
    /// Not a message event at all
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    Ignored(IgnoreReason),
    Replied,
    ReplyFailed,
}

#[derive(Clone)]
pub struct MessageHandler {
    completion: CompletionClient,
    transport: Arc<dyn ReplyTransport>,
    interim_message: Option<String>,
}

impl MessageHandler {
    pub fn new(completion: CompletionClient, transport: Arc<dyn ReplyTransport>) -> Self {
        Self {
            completion,
            transport,
            interim_message: Some(INTERIM_MESSAGE.to_string()),
        }
    }

    /// Replace the interim acknowledgement; `None` or an empty string disables it
    pub fn with_interim_message(mut self, message: Option<String>) -> Self {
        self.interim_message = message.filter(|m| !m.is_empty());
        self
    }

    /// Process one event to completion. Never fails; the outcome is for logging.
    pub async fn handle(&self, event: InboundEvent) -> HandleOutcome {
        let message = match event {
            InboundEvent::Message(message) => message,
            InboundEvent::Other(kind) => {
                debug!(event_type = %kind, "Ignoring unsupported event");
                return HandleOutcome::Ignored(IgnoreReason::Unsupported(kind));
            }
        };

        if let Some(reason) = Self::ignore_reason(&message) {
            debug!(channel = %message.channel, ?reason, "Ignoring message");
            return HandleOutcome::Ignored(reason);
        }

        info!(channel = %message.channel, ts = %message.ts, "Received message");
        debug!(text = %message.text, "Message text");

        let conversation = message.conversation();

        if let Some(interim) = &self.interim_message {
            let ack = OutboundReply::new(conversation.clone(), interim.as_str());
            if let Err(e) = self.transport.send(&ack).await {
                error!(channel = %conversation.channel, "Failed to send interim reply: {}", e);
            }
        }

        let response = self.completion.complete(&message.text).await;
        debug!(response = %response, "Completion response");

        let reply = OutboundReply::new(conversation, response);
        match self.transport.send(&reply).await {
            Ok(()) => {
                info!(channel = %reply.conversation.channel, "Replied to message");
                HandleOutcome::Replied
            }
            Err(e) => {
                error!(channel = %reply.conversation.channel, "Failed to send reply: {}", e);
                HandleOutcome::ReplyFailed
            }
        }
    }

    fn ignore_reason(message: &MessageEvent) -> Option<IgnoreReason> {
        if message.is_bot_message() {
            return Some(IgnoreReason::BotMessage);
        }
        if message.is_system_subtype() {
            return Some(IgnoreReason::Subtype(
                message.subtype.clone().unwrap_or_default(),
            ));
        }
        if message.user.is_none() {
            return Some(IgnoreReason::NoUser);
        }
        if message.text.trim().is_empty() {
            return Some(IgnoreReason::EmptyText);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::FALLBACK_REPLY;
    use crate::errors::{SlackError, SlackResult};
    use crate::providers::mock::MockProvider;
    use crate::slack::events::Conversation;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every reply; fails the ones whose text is listed in `fail_on`
    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<OutboundReply>>,
        fail_on: Vec<String>,
    }

    impl RecordingTransport {
        fn sent(&self) -> Vec<OutboundReply> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReplyTransport for RecordingTransport {
        async fn send(&self, reply: &OutboundReply) -> SlackResult<()> {
            self.sent.lock().unwrap().push(reply.clone());
            if self.fail_on.contains(&reply.text) {
                return Err(SlackError::Api("channel_not_found".to_string()));
            }
            Ok(())
        }
    }

    fn message(text: &str) -> MessageEvent {
        MessageEvent {
            user: Some("U123".to_string()),
            text: text.to_string(),
            channel: "C123".to_string(),
            channel_type: Some("channel".to_string()),
            ts: "1700000000.000100".to_string(),
            thread_ts: None,
            subtype: None,
            bot_id: None,
        }
    }

    fn handler(
        provider: Arc<MockProvider>,
        transport: Arc<RecordingTransport>,
    ) -> MessageHandler {
        MessageHandler::new(CompletionClient::new(provider), transport)
    }

    fn channel() -> Conversation {
        Conversation {
            channel: "C123".to_string(),
            thread_ts: None,
        }
    }

    #[tokio::test]
    async fn test_hello_sends_interim_then_final() {
        let provider = Arc::new(MockProvider::new(vec!["Hi! How can I help?"]));
        let transport = Arc::new(RecordingTransport::default());

        let outcome = handler(provider.clone(), transport.clone())
            .handle(InboundEvent::Message(message("hello")))
            .await;

        assert_eq!(outcome, HandleOutcome::Replied);
        assert_eq!(provider.requests(), vec!["hello".to_string()]);
        assert_eq!(
            transport.sent(),
            vec![
                OutboundReply::new(channel(), INTERIM_MESSAGE),
                OutboundReply::new(channel(), "Hi! How can I help?"),
            ]
        );
    }

    #[tokio::test]
    async fn test_bot_messages_produce_no_replies() {
        let provider = Arc::new(MockProvider::new(vec!["never"]));
        let transport = Arc::new(RecordingTransport::default());
        let handler = handler(provider.clone(), transport.clone());

        let mut from_subtype = message("loop?");
        from_subtype.subtype = Some("bot_message".to_string());
        let mut from_bot_id = message("loop?");
        from_bot_id.bot_id = Some("B999".to_string());

        for event in [from_subtype, from_bot_id] {
            let outcome = handler.handle(InboundEvent::Message(event)).await;
            assert_eq!(outcome, HandleOutcome::Ignored(IgnoreReason::BotMessage));
        }

        assert!(transport.sent().is_empty());
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_ignores_edits_empty_text_and_other_events() {
        let provider = Arc::new(MockProvider::new(vec![]));
        let transport = Arc::new(RecordingTransport::default());
        let handler = handler(provider.clone(), transport.clone());

        let mut edited = message("");
        edited.subtype = Some("message_changed".to_string());
        edited.user = None;
        assert_eq!(
            handler.handle(InboundEvent::Message(edited)).await,
            HandleOutcome::Ignored(IgnoreReason::Subtype("message_changed".to_string()))
        );

        assert_eq!(
            handler.handle(InboundEvent::Message(message("   "))).await,
            HandleOutcome::Ignored(IgnoreReason::EmptyText)
        );

        let mut anonymous = message("hello");
        anonymous.user = None;
        assert_eq!(
            handler.handle(InboundEvent::Message(anonymous)).await,
            HandleOutcome::Ignored(IgnoreReason::NoUser)
        );

        assert_eq!(
            handler
                .handle(InboundEvent::Other("reaction_added".to_string()))
                .await,
            HandleOutcome::Ignored(IgnoreReason::Unsupported("reaction_added".to_string()))
        );

        assert!(transport.sent().is_empty());
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_sends_apology() {
        let provider = Arc::new(MockProvider::failing());
        let transport = Arc::new(RecordingTransport::default());

        let outcome = handler(provider, transport.clone())
            .handle(InboundEvent::Message(message("hello")))
            .await;

        assert_eq!(outcome, HandleOutcome::Replied);
        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].text, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_interim_failure_still_sends_final() {
        let provider = Arc::new(MockProvider::new(vec!["answer"]));
        let transport = Arc::new(RecordingTransport {
            fail_on: vec![INTERIM_MESSAGE.to_string()],
            ..Default::default()
        });

        let outcome = handler(provider, transport.clone())
            .handle(InboundEvent::Message(message("hello")))
            .await;

        assert_eq!(outcome, HandleOutcome::Replied);
        assert_eq!(transport.sent().last().unwrap().text, "answer");
    }

    #[tokio::test]
    async fn test_final_reply_failure_is_reported() {
        let provider = Arc::new(MockProvider::new(vec!["answer"]));
        let transport = Arc::new(RecordingTransport {
            fail_on: vec!["answer".to_string()],
            ..Default::default()
        });

        let outcome = handler(provider, transport)
            .handle(InboundEvent::Message(message("hello")))
            .await;
        assert_eq!(outcome, HandleOutcome::ReplyFailed);
    }

    #[tokio::test]
    async fn test_interim_can_be_disabled() {
        let provider = Arc::new(MockProvider::new(vec!["answer"]));
        let transport = Arc::new(RecordingTransport::default());

        handler(provider, transport.clone())
            .with_interim_message(Some(String::new()))
            .handle(InboundEvent::Message(message("hello")))
            .await;

        assert_eq!(transport.sent(), vec![OutboundReply::new(channel(), "answer")]);
    }

    #[tokio::test]
    async fn test_replies_stay_in_thread() {
        let provider = Arc::new(MockProvider::new(vec!["threaded"]));
        let transport = Arc::new(RecordingTransport::default());

        let mut threaded = message("hello");
        threaded.thread_ts = Some("1699999999.000001".to_string());
        handler(provider, transport.clone())
            .handle(InboundEvent::Message(threaded))
            .await;

        assert!(transport
            .sent()
            .iter()
            .all(|r| r.conversation.thread_ts.as_deref() == Some("1699999999.000001")));
    }

    #[tokio::test]
    async fn test_concurrent_events_are_independent() {
        let provider = Arc::new(MockProvider::new(vec!["one", "two"]));
        let transport = Arc::new(RecordingTransport::default());
        let handler = handler(provider, transport.clone()).with_interim_message(None);

        let mut other = message("second");
        other.channel = "C999".to_string();
        let (a, b) = tokio::join!(
            handler.handle(InboundEvent::Message(message("first"))),
            handler.handle(InboundEvent::Message(other)),
        );

        assert_eq!(a, HandleOutcome::Replied);
        assert_eq!(b, HandleOutcome::Replied);
        let mut channels: Vec<String> = transport
            .sent()
            .into_iter()
            .map(|r| r.conversation.channel)
            .collect();
        channels.sort();
        assert_eq!(channels, vec!["C123".to_string(), "C999".to_string()]);
    }
}
