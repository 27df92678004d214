//! Slack Events API plumbing: inbound payloads, request signatures and replies.
pub mod client;
pub mod events;
pub mod verify;
