/// Soft failures: conditions the tools report without halting, collected in
/// emission order instead of being interleaved with the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolWarning {
    /// The caller-supplied context was not parseable JSON; processing
    /// continued with an empty conversation.
    InvalidContextJson,
    /// The message to append was missing or blank; the conversation was
    /// returned unchanged.
    EmptyMessage,
}

impl ToolWarning {
    /// The stable error string callers match on.
    pub fn message(&self) -> &'static str {
        match self {
            ToolWarning::InvalidContextJson => "Context is not a valid JSON string",
            ToolWarning::EmptyMessage => "Message is not a valid string",
        }
    }
}

impl std::fmt::Display for ToolWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}
