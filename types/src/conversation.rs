use crate::content::message::{Message, MessageRole};

/// Ordered dialogue history, serialized as a bare JSON array of messages.
///
/// The caller is the only persistence layer: a conversation is rebuilt from a
/// caller-supplied JSON string on every invocation and handed back serialized.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Replaces the system instruction. Any existing system message is
    /// dropped and the new one takes index 0, so a conversation holds at
    /// most one system message and it is always first.
    pub fn with_system(self, text: &str) -> Self {
        let mut messages: Vec<Message> = self
            .messages
            .into_iter()
            .filter(|m| m.role() != MessageRole::System)
            .collect();
        messages.insert(
            0,
            Message::builder()
                .with_role(MessageRole::System)
                .with_text(text)
                .build(),
        );
        Self { messages }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }
}
