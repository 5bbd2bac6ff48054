use crate::Base64EncodedAudioBytes;

/// A single turn in a conversation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct Message {
    /// The role of the message sender: "user", "assistant", "system"
    role: MessageRole,

    /// The content of the message
    content: Vec<Content>,
}

impl Message {
    pub fn builder() -> MessageBuilder {
        MessageBuilder::new()
    }

    pub fn role(&self) -> MessageRole {
        self.role.clone()
    }

    pub fn content(&self) -> &[Content] {
        &self.content
    }
}

pub struct MessageBuilder {
    message: Message,
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self {
            message: Message {
                role: MessageRole::User,
                content: Vec::new(),
            },
        }
    }

    pub fn with_role(mut self, role: MessageRole) -> Self {
        self.message.role = role;
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.message.content.push(Content::text(text));
        self
    }

    pub fn with_input_audio(mut self, data: Base64EncodedAudioBytes, format: &str) -> Self {
        self.message.content.push(Content::input_audio(data, format));
        self
    }

    pub fn build(self) -> Message {
        self.message
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub enum MessageRole {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "system")]
    System,
}

/// One typed unit of message content. Image and video parts are not
/// supported by this backend yet.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Content {
    #[serde(rename = "text")]
    Text(TextContent),
    #[serde(rename = "input_audio")]
    InputAudio(InputAudioContent),
}

impl Content {
    pub fn text(text: &str) -> Self {
        Content::Text(TextContent::new(text))
    }

    pub fn input_audio(data: Base64EncodedAudioBytes, format: &str) -> Self {
        Content::InputAudio(InputAudioContent::new(data, format))
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct TextContent {
    text: String,
}

impl TextContent {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct InputAudioContent {
    input_audio: InputAudioData,
}

impl InputAudioContent {
    pub fn new(data: Base64EncodedAudioBytes, format: &str) -> Self {
        Self {
            input_audio: InputAudioData {
                data,
                format: format.to_string(),
            },
        }
    }

    pub fn input_audio(&self) -> &InputAudioData {
        &self.input_audio
    }
}

/// The payload of an `input_audio` part: either a `data:;base64,` URI or a
/// plain URL, plus the container format the backend should assume.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct InputAudioData {
    data: String,
    format: String,
}

impl InputAudioData {
    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn format(&self) -> &str {
        &self.format
    }
}
