use serde::Deserialize;
use serde_json::json;

use qwen_omni_types::MessageRole;

use crate::client::{ChatBackend, Client, Config};
use crate::completion::{run_chat, ChatOutcome, ChatParams};
use crate::context::{append_message, AppendOutcome};
use crate::error::{OmniError, OmniResult};
use crate::warning::ToolWarning;

/// One host-visible emission of a tool invocation. The order of messages
/// within an invocation is part of the contract.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolMessage {
    Json(serde_json::Value),
    Text(String),
    Variable {
        name: String,
        value: serde_json::Value,
    },
}

/// A tool result both ways: the typed outcome for programmatic callers and
/// the rendered message sequence for the plugin host.
#[derive(Debug, Clone)]
pub struct ToolOutput<T> {
    pub outcome: T,
    pub messages: Vec<ToolMessage>,
}

fn warning_message(warning: ToolWarning) -> ToolMessage {
    ToolMessage::Json(json!({
        "status": "error",
        "error": warning.message(),
    }))
}

/// Credentials as the host hands them over. Validation only checks that the
/// API key is present; the URL has a documented default.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub qwen3_api_key: String,
    #[serde(default)]
    pub qwen3_api_url: Option<String>,
}

impl Credentials {
    pub fn validate(&self) -> OmniResult<()> {
        if self.qwen3_api_key.trim().is_empty() {
            return Err(OmniError::ConfigError(
                "Missing 'qwen3_api_key'".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_config(self) -> Config {
        let mut builder = Config::builder().with_api_key(&self.qwen3_api_key);
        if let Some(url) = self.qwen3_api_url.as_deref().filter(|u| !u.trim().is_empty()) {
            builder = builder.with_base_url(url);
        }
        builder.build()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppendContextParams {
    pub role: MessageRole,
    pub message: String,
    #[serde(default)]
    pub context: Option<String>,
}

/// Appends a text turn to a serialized conversation and re-emits it.
pub struct AppendContextTool;

impl AppendContextTool {
    pub fn invoke(params: serde_json::Value) -> OmniResult<ToolOutput<AppendOutcome>> {
        let params: AppendContextParams = serde_json::from_value(params)
            .map_err(|e| OmniError::InvalidParams(e.to_string()))?;

        let outcome = append_message(
            params.context.as_deref(),
            params.role,
            Some(params.message.as_str()),
        );

        let serialized = outcome.context.to_json()?;
        let mut messages: Vec<ToolMessage> =
            outcome.warnings.iter().copied().map(warning_message).collect();
        messages.push(ToolMessage::Text(serialized.clone()));
        messages.push(ToolMessage::Json(json!({
            "status": "success",
            "context": serialized,
        })));

        Ok(ToolOutput { outcome, messages })
    }
}

/// The multimodal chat tool: assembles the context, streams a completion,
/// and emits the reply plus the updated context.
pub struct ChatTool<B> {
    backend: B,
    model: String,
}

impl ChatTool<Client> {
    pub fn new(config: Config) -> OmniResult<Self> {
        let model = config.model().to_string();
        Ok(Self {
            backend: Client::new(config)?,
            model,
        })
    }
}

impl<B: ChatBackend> ChatTool<B> {
    pub fn with_backend(backend: B, model: &str) -> Self {
        Self {
            backend,
            model: model.to_string(),
        }
    }

    pub async fn invoke(&self, params: serde_json::Value) -> OmniResult<ToolOutput<ChatOutcome>> {
        let params: ChatParams = serde_json::from_value(params)
            .map_err(|e| OmniError::InvalidParams(e.to_string()))?;

        let outcome = run_chat(&self.backend, &self.model, params).await?;

        let mut messages: Vec<ToolMessage> =
            outcome.warnings.iter().copied().map(warning_message).collect();
        messages.push(ToolMessage::Text(outcome.text.clone()));
        messages.push(ToolMessage::Variable {
            name: "context".to_string(),
            value: serde_json::to_value(&outcome.context)?,
        });
        messages.push(ToolMessage::Json(json!({
            "status": "success",
            "response": {
                "text": outcome.text,
                "audio_base64": outcome.audio_base64,
            },
            "context": serde_json::to_value(&outcome.context)?,
        })));

        Ok(ToolOutput { outcome, messages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ChunkStream, MockChatBackend};
    use qwen_omni_types::chat::ChatChunk;

    fn text_stream(deltas: &[&str]) -> ChunkStream {
        let chunks: Vec<ChatChunk> = deltas
            .iter()
            .map(|d| {
                serde_json::from_str(&format!(
                    r#"{{"choices":[{{"delta":{{"content":"{d}"}}}}]}}"#
                ))
                .unwrap()
            })
            .collect();
        Box::pin(futures_util::stream::iter(
            chunks.into_iter().map(Ok::<_, OmniError>),
        ))
    }

    #[test]
    fn append_tool_emits_text_then_final_json() {
        let output = AppendContextTool::invoke(json!({
            "role": "user",
            "message": "Hi",
        }))
        .unwrap();

        assert_eq!(output.messages.len(), 2);
        let serialized = match &output.messages[0] {
            ToolMessage::Text(text) => text.clone(),
            other => panic!("expected text message, got {other:?}"),
        };
        assert_eq!(
            output.messages[1],
            ToolMessage::Json(json!({"status": "success", "context": serialized})),
        );
    }

    #[test]
    fn append_tool_reports_warnings_first() {
        let output = AppendContextTool::invoke(json!({
            "role": "assistant",
            "message": "",
            "context": "{not json",
        }))
        .unwrap();

        assert_eq!(
            output.outcome.warnings,
            vec![ToolWarning::InvalidContextJson, ToolWarning::EmptyMessage],
        );
        assert_eq!(
            output.messages[0],
            ToolMessage::Json(json!({
                "status": "error",
                "error": "Context is not a valid JSON string",
            })),
        );
        assert_eq!(
            output.messages[1],
            ToolMessage::Json(json!({
                "status": "error",
                "error": "Message is not a valid string",
            })),
        );
        // the (empty) conversation is still serialized and returned
        assert_eq!(output.messages[2], ToolMessage::Text("[]".to_string()));
    }

    #[test]
    fn append_tool_rejects_malformed_params() {
        let err = AppendContextTool::invoke(json!({"role": "narrator"})).unwrap_err();
        assert!(matches!(err, OmniError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn chat_tool_emits_in_contract_order() {
        let mut backend = MockChatBackend::new();
        backend
            .expect_stream_chat()
            .return_once(|_| Ok(text_stream(&["Hel", "lo"])));
        let tool = ChatTool::with_backend(backend, "qwen3-omni-flash");

        let output = tool
            .invoke(json!({
                "modal_type": "text",
                "response_modal_type": "text",
                "system_prompt": "You are helpful",
                "user_query_text": "Hi",
            }))
            .await
            .unwrap();

        assert_eq!(output.outcome.text, "Hello");
        assert_eq!(output.messages.len(), 3);
        assert_eq!(output.messages[0], ToolMessage::Text("Hello".to_string()));
        match &output.messages[1] {
            ToolMessage::Variable { name, value } => {
                assert_eq!(name, "context");
                assert_eq!(value.as_array().unwrap().len(), 3);
            }
            other => panic!("expected context variable, got {other:?}"),
        }
        match &output.messages[2] {
            ToolMessage::Json(value) => {
                assert_eq!(value["status"], "success");
                assert_eq!(value["response"]["text"], "Hello");
                assert_eq!(value["response"]["audio_base64"], "");
            }
            other => panic!("expected final json, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn chat_tool_rejects_empty_invocation() {
        let backend = MockChatBackend::new();
        let tool = ChatTool::with_backend(backend, "qwen3-omni-flash");

        let err = tool
            .invoke(json!({
                "modal_type": "text",
                "response_modal_type": "text",
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, OmniError::InvalidParams(m) if m == "No valid message provided"));
    }

    #[test]
    fn credentials_require_api_key() {
        let creds: Credentials =
            serde_json::from_value(json!({"qwen3_api_key": ""})).unwrap();
        assert!(matches!(creds.validate(), Err(OmniError::ConfigError(_))));

        let creds: Credentials =
            serde_json::from_value(json!({"qwen3_api_key": "sk-test"})).unwrap();
        assert!(creds.validate().is_ok());
    }

    #[test]
    fn credentials_url_overrides_default() {
        let creds: Credentials = serde_json::from_value(json!({
            "qwen3_api_key": "sk-test",
            "qwen3_api_url": "https://dashscope-intl.aliyuncs.com/compatible-mode/v1",
        }))
        .unwrap();
        let config = creds.into_config();
        assert_eq!(
            config.base_url(),
            "https://dashscope-intl.aliyuncs.com/compatible-mode/v1"
        );
        assert_eq!(config.model(), "qwen3-omni-flash");
    }
}
