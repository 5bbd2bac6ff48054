mod client;
pub mod completion;
pub mod context;
mod error;
pub mod tools;
mod warning;

pub use qwen_omni_types as types;

pub use client::{ChatBackend, ChunkStream, Client, Config};
pub use completion::{run_chat, ChatOutcome, ChatParams, PayloadType};
pub use context::{append_message, AppendOutcome};
pub use error::{OmniError, OmniResult};
pub use warning::ToolWarning;
