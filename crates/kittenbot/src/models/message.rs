use super::role::Role;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
/// A message to or from an LLM
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a new, empty system message
    pub fn system() -> Self {
        Message {
            role: Role::System,
            content: String::new(),
        }
    }

    /// Create a new, empty user message
    pub fn user() -> Self {
        Message {
            role: Role::User,
            content: String::new(),
        }
    }

    /// Create a new, empty assistant message
    pub fn assistant() -> Self {
        Message {
            role: Role::Assistant,
            content: String::new(),
        }
    }

    /// Append text content to the message
    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.content.push_str(&text.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.content
    }
}
