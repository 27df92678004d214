//! These models represent the chat messages exchanged with the completion backend
//!
//! Messages are always built from a single inbound Slack message plus the fixed system
//! prompt, so the model is intentionally small: a role and a block of text. The OpenAI
//! wire format is produced from these in `providers::utils`.
pub mod message;
pub mod role;
