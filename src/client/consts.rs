pub const QWEN3_API_KEY: &str = "QWEN3_API_KEY";
pub const QWEN3_API_URL: &str = "QWEN3_API_URL";

/// Beijing-region compatible-mode endpoint. The Singapore region uses
/// https://dashscope-intl.aliyuncs.com/compatible-mode/v1 instead.
pub const BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
pub const DEFAULT_MODEL: &str = "qwen3-omni-flash";

/// Fixed audio rendering hints for spoken replies.
pub const AUDIO_VOICE: &str = "Cherry";
pub const AUDIO_FORMAT: &str = "wav";
