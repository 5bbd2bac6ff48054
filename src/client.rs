use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
#[cfg(test)]
use mockall::automock;
use reqwest::StatusCode;
use secrecy::ExposeSecret;

use qwen_omni_types::chat::{ChatChunk, ChatRequest};

use crate::error::{OmniError, OmniResult};

pub mod config;
pub mod consts;
mod sse;

pub use config::Config;

/// A pull stream of completion chunks: finite, non-restartable, delivered in
/// arrival order.
pub type ChunkStream = Pin<Box<dyn Stream<Item = OmniResult<ChatChunk>> + Send>>;

/// The dispatch seam to the hosted completion service. Kept as a trait so the
/// accumulation logic can be exercised against a mock without a network.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChatBackend {
    async fn stream_chat(&self, request: ChatRequest) -> OmniResult<ChunkStream>;
}

/// Client for the DashScope compatible-mode chat-completions endpoint.
pub struct Client {
    http: reqwest::Client,
    config: Config,
}

impl Client {
    pub fn new(config: Config) -> OmniResult<Self> {
        if config.api_key().expose_secret().is_empty() {
            return Err(OmniError::ConfigError(
                "API key is required to initialize the chat client".to_string(),
            ));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            config,
        })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url().trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ChatBackend for Client {
    async fn stream_chat(&self, request: ChatRequest) -> OmniResult<ChunkStream> {
        let url = self.completions_url();
        tracing::debug!("dispatching streamed completion: model={}", request.model());

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.config.api_key().expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(http_error(status, message));
        }

        let mut decoder = sse::SseDecoder::new();
        let chunks = response
            .bytes_stream()
            .map(move |part| match part {
                Err(e) => vec![Err(OmniError::from(e))],
                Ok(bytes) => match std::str::from_utf8(&bytes) {
                    Err(e) => vec![Err(OmniError::StreamError(format!(
                        "non-UTF-8 transport chunk: {e}"
                    )))],
                    Ok(text) => decoder.feed(text).iter().filter_map(|d| parse_event(d)).collect(),
                },
            })
            .map(futures_util::stream::iter)
            .flatten();

        Ok(Box::pin(chunks))
    }
}

/// Parses one SSE data payload into a chunk. Events the wire types do not
/// understand are logged and dropped, matching the deserialization policy of
/// the receive loop rather than poisoning the whole stream.
fn parse_event(data: &str) -> Option<OmniResult<ChatChunk>> {
    match serde_json::from_str::<ChatChunk>(data) {
        Ok(chunk) => Some(Ok(chunk)),
        Err(e) => {
            tracing::error!("failed to deserialize chunk: {}, data=> {:?}", e, data);
            None
        }
    }
}

fn http_error(status: StatusCode, message: String) -> OmniError {
    OmniError::HttpError {
        status_code: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_api_key() {
        let config = Config::builder()
            .with_api_key("")
            .with_base_url("https://example.com/v1")
            .build();
        assert!(matches!(
            Client::new(config),
            Err(OmniError::ConfigError(_))
        ));
    }

    #[test]
    fn completions_url_joins_without_double_slash() {
        let config = Config::builder()
            .with_api_key("sk-test")
            .with_base_url("https://example.com/compatible-mode/v1/")
            .build();
        let client = Client::new(config).unwrap();
        assert_eq!(
            client.completions_url(),
            "https://example.com/compatible-mode/v1/chat/completions"
        );
    }

    #[test]
    fn unknown_events_are_dropped_not_fatal() {
        assert!(parse_event("not json").is_none());
        assert!(parse_event(r#"{"choices":[{"delta":{"content":"hi"}}]}"#)
            .unwrap()
            .is_ok());
    }
}
