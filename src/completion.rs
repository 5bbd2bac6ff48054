use futures_util::StreamExt;
use serde::Deserialize;

use qwen_omni_types::chat::{ChatRequest, Modality};
use qwen_omni_types::{Base64EncodedAudioBytes, Conversation, Message, MessageRole};

use crate::client::consts::{AUDIO_FORMAT, AUDIO_VOICE};
use crate::client::{ChatBackend, ChunkStream};
use crate::context::{non_blank, parse_context};
use crate::error::{OmniError, OmniResult};
use crate::warning::ToolWarning;

/// How a caller-supplied payload should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadType {
    Base64,
    Url,
}

/// Flat invocation parameters of the multimodal chat tool.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatParams {
    pub modal_type: Modality,
    pub response_modal_type: Modality,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub user_query_text: Option<String>,
    #[serde(default)]
    pub modal_payload: Option<String>,
    #[serde(default)]
    pub modal_payload_type: Option<PayloadType>,
    #[serde(default)]
    pub audio_format: Option<String>,
}

impl ChatParams {
    pub fn new(modal_type: Modality, response_modal_type: Modality) -> Self {
        Self {
            modal_type,
            response_modal_type,
            context: None,
            system_prompt: None,
            user_query_text: None,
            modal_payload: None,
            modal_payload_type: None,
            audio_format: None,
        }
    }

    fn audio_payload(&self) -> Option<&str> {
        if self.modal_type == Modality::Audio {
            non_blank(self.modal_payload.as_deref())
        } else {
            None
        }
    }
}

/// Everything one chat invocation produces: the assistant reply in both
/// modalities, the updated conversation, and any soft failures on the way.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub text: String,
    pub audio_base64: Base64EncodedAudioBytes,
    pub context: Conversation,
    pub warnings: Vec<ToolWarning>,
}

/// Assembles the context, dispatches a streamed completion, accumulates the
/// reply, and re-appends the assistant turn.
pub async fn run_chat<B: ChatBackend + ?Sized>(
    backend: &B,
    model: &str,
    params: ChatParams,
) -> OmniResult<ChatOutcome> {
    let mut warnings = Vec::new();
    let mut context = assemble_conversation(&params, &mut warnings)?;

    let request = build_request(model, &params, &context);
    let stream = backend.stream_chat(request).await?;
    let reply = accumulate(stream).await?;

    // Only the text half of the reply is replayed as context; assistant
    // audio is returned to the caller but never stored.
    context.push(
        Message::builder()
            .with_role(MessageRole::Assistant)
            .with_text(&reply.text)
            .build(),
    );

    Ok(ChatOutcome {
        text: reply.text,
        audio_base64: reply.audio_base64,
        context,
        warnings,
    })
}

/// Builds the pre-dispatch message list: prior context, system upsert, then
/// the new user turn in [text, audio] part order.
///
/// Returns an error instead of dispatching when there is nothing to send, or
/// when an audio payload arrives without its required format.
pub(crate) fn assemble_conversation(
    params: &ChatParams,
    warnings: &mut Vec<ToolWarning>,
) -> OmniResult<Conversation> {
    let system_prompt = non_blank(params.system_prompt.as_deref());
    let user_text = non_blank(params.user_query_text.as_deref());
    let has_context = non_blank(params.context.as_deref()).is_some();
    let payload = params.audio_payload();

    if system_prompt.is_none() && user_text.is_none() && !has_context && payload.is_none() {
        return Err(OmniError::InvalidParams(
            "No valid message provided".to_string(),
        ));
    }

    if payload.is_some() && non_blank(params.audio_format.as_deref()).is_none() {
        return Err(OmniError::InvalidParams(
            "Audio modality format is required".to_string(),
        ));
    }

    let mut context = parse_context(params.context.as_deref(), warnings);

    if let Some(prompt) = system_prompt {
        context = context.with_system(prompt);
    }

    let mut user_turn = Message::builder().with_role(MessageRole::User);
    if let Some(text) = user_text {
        user_turn = user_turn.with_text(text);
    }
    if let Some(payload) = payload {
        let data = match params.modal_payload_type.unwrap_or(PayloadType::Base64) {
            PayloadType::Base64 => format!("data:;base64,{payload}"),
            PayloadType::Url => payload.to_string(),
        };
        // format presence was checked above
        let format = params.audio_format.as_deref().unwrap_or(AUDIO_FORMAT);
        user_turn = user_turn.with_input_audio(data, format);
    }

    let user_turn = user_turn.build();
    if !user_turn.content().is_empty() {
        context.push(user_turn);
    }

    Ok(context)
}

fn build_request(model: &str, params: &ChatParams, context: &Conversation) -> ChatRequest {
    let builder = ChatRequest::builder()
        .with_model(model)
        .with_conversation(context)
        .with_audio(AUDIO_VOICE, AUDIO_FORMAT);

    match params.response_modal_type {
        Modality::Audio => builder.with_modalities_enable_audio().build(),
        Modality::Text => builder.with_modalities_disable_audio().build(),
    }
}

/// The accumulated assistant reply.
#[derive(Debug, Clone, Default)]
pub(crate) struct Reply {
    pub text: String,
    pub audio_base64: Base64EncodedAudioBytes,
}

/// Folds the chunk stream into final strings. Text deltas and base64 audio
/// fragments are concatenated in arrival order; audio is never decoded here.
pub(crate) async fn accumulate(mut stream: ChunkStream) -> OmniResult<Reply> {
    let mut reply = Reply::default();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if let Some(text) = chunk.text_delta() {
            reply.text.push_str(text);
        }
        if let Some(audio) = chunk.audio_delta() {
            reply.audio_base64.push_str(audio);
        }
    }

    tracing::debug!(
        "accumulated reply: {} text chars, {} audio chars",
        reply.text.len(),
        reply.audio_base64.len()
    );
    Ok(reply)
}
