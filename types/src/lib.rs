pub mod chat;
pub mod conversation;
mod content;

pub use content::message::*;
pub use conversation::Conversation;

/// Audio data encoded as base64
pub type Base64EncodedAudioBytes = String;
