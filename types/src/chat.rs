use crate::content::message::Message;
use crate::conversation::Conversation;

/// A chat-completions request in the OpenAI-compatible wire shape the
/// DashScope backend accepts.
///
/// Streaming is always on: the omni backend rejects non-streaming requests
/// for audio-capable models.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct ChatRequest {
    model: String,

    messages: Vec<Message>,

    /// The set of modalities the model may respond with. To request spoken
    /// output, set this to ["text", "audio"].
    modalities: Vec<Modality>,

    /// Rendering parameters for audio output. Sent even for text-only
    /// responses; the backend ignores it when audio is not requested.
    audio: AudioSpec,

    stream: bool,

    stream_options: StreamOptions,
}

impl ChatRequest {
    pub fn builder() -> ChatRequestBuilder {
        ChatRequestBuilder::new()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn modalities(&self) -> &[Modality] {
        &self.modalities
    }

    pub fn audio(&self) -> &AudioSpec {
        &self.audio
    }
}

pub struct ChatRequestBuilder {
    request: ChatRequest,
}

impl Default for ChatRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatRequestBuilder {
    pub fn new() -> Self {
        Self {
            request: ChatRequest {
                model: String::new(),
                messages: Vec::new(),
                modalities: vec![Modality::Text],
                audio: AudioSpec::default(),
                stream: true,
                stream_options: StreamOptions {
                    include_usage: false,
                },
            },
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.request.model = model.to_string();
        self
    }

    pub fn with_conversation(mut self, conversation: &Conversation) -> Self {
        self.request.messages = conversation.messages().to_vec();
        self
    }

    pub fn with_modalities_enable_audio(mut self) -> Self {
        self.request.modalities = vec![Modality::Text, Modality::Audio];
        self
    }

    pub fn with_modalities_disable_audio(mut self) -> Self {
        self.request.modalities = vec![Modality::Text];
        self
    }

    pub fn with_audio(mut self, voice: &str, format: &str) -> Self {
        self.request.audio = AudioSpec {
            voice: voice.to_string(),
            format: format.to_string(),
        };
        self
    }

    pub fn build(self) -> ChatRequest {
        self.request
    }
}

/// The kind of content a message part or requested response carries.
/// Image and video are reserved by the backend but not implemented here.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub enum Modality {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "audio")]
    Audio,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct AudioSpec {
    voice: String,
    format: String,
}

impl AudioSpec {
    pub fn voice(&self) -> &str {
        &self.voice
    }

    pub fn format(&self) -> &str {
        &self.format
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct StreamOptions {
    include_usage: bool,
}

/// One incremental fragment of a streamed completion.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

impl ChatChunk {
    pub fn choices(&self) -> &[ChunkChoice] {
        &self.choices
    }

    /// The text delta of the first choice, if any.
    pub fn text_delta(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
    }

    /// The base64 audio delta of the first choice, if any.
    pub fn audio_delta(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.audio.as_ref())
            .and_then(|audio| audio.data.as_deref())
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

impl ChunkChoice {
    pub fn delta(&self) -> &Delta {
        &self.delta
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Delta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    audio: Option<AudioDelta>,
}

impl Delta {
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn audio(&self) -> Option<&AudioDelta> {
        self.audio.as_ref()
    }
}

/// Audio fragments arrive as base64 substrings whose boundaries the backend
/// aligns to 4-character base64 groups; concatenation alone yields a valid
/// final payload.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct AudioDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    transcript: Option<String>,
}

impl AudioDelta {
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::message::{Message, MessageRole};

    #[test]
    fn request_defaults_to_text_only_streaming() {
        let request = ChatRequest::builder().with_model("qwen3-omni-flash").build();
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["modalities"], serde_json::json!(["text"]));
        assert_eq!(json["stream"], true);
        assert_eq!(json["stream_options"]["include_usage"], false);
    }

    #[test]
    fn enabling_audio_extends_modalities() {
        let request = ChatRequest::builder()
            .with_modalities_enable_audio()
            .with_audio("Cherry", "wav")
            .build();

        assert_eq!(request.modalities(), &[Modality::Text, Modality::Audio]);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["modalities"], serde_json::json!(["text", "audio"]));
        assert_eq!(json["audio"]["voice"], "Cherry");
        assert_eq!(json["audio"]["format"], "wav");
    }

    #[test]
    fn conversation_messages_are_carried_in_order() {
        let mut conversation = Conversation::new().with_system("You are helpful");
        conversation.push(
            Message::builder()
                .with_role(MessageRole::User)
                .with_text("Hi")
                .build(),
        );

        let request = ChatRequest::builder()
            .with_conversation(&conversation)
            .build();
        assert_eq!(request.messages().len(), 2);
        assert_eq!(request.messages()[0].role(), MessageRole::System);
    }

    #[test]
    fn chunk_exposes_text_and_audio_deltas() {
        let chunk: ChatChunk = serde_json::from_str(
            r#"{"choices":[{"delta":{"content":"Hel","audio":{"data":"UklG"}}}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.text_delta(), Some("Hel"));
        assert_eq!(chunk.audio_delta(), Some("UklG"));
    }

    #[test]
    fn chunk_tolerates_sparse_deltas() {
        let chunk: ChatChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{}}],"usage":null}"#).unwrap();
        assert_eq!(chunk.text_delta(), None);
        assert_eq!(chunk.audio_delta(), None);

        let empty: ChatChunk = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(empty.choices().is_empty());
    }
}
