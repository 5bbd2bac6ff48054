use qwen_omni_types::{Conversation, Message, MessageRole};

use crate::warning::ToolWarning;

/// Result of reshaping a conversation: the updated value plus any soft
/// failures hit along the way, in the order they occurred.
#[derive(Debug, Clone)]
pub struct AppendOutcome {
    pub context: Conversation,
    pub warnings: Vec<ToolWarning>,
}

/// Appends one text turn to a serialized conversation.
///
/// Malformed prior context falls back to an empty conversation; a blank
/// message leaves the conversation unchanged. Both are soft: the (possibly
/// unchanged) conversation is always returned.
pub fn append_message(
    prior_context: Option<&str>,
    role: MessageRole,
    message: Option<&str>,
) -> AppendOutcome {
    let mut warnings = Vec::new();
    let mut context = parse_context(prior_context, &mut warnings);

    match non_blank(message) {
        Some(text) => {
            context.push(Message::builder().with_role(role).with_text(text).build());
        }
        None => warnings.push(ToolWarning::EmptyMessage),
    }

    AppendOutcome { context, warnings }
}

/// Rebuilds a conversation from caller-supplied JSON. Absent or blank input
/// means a fresh conversation; unparseable input is recorded as a warning and
/// also falls back to empty rather than aborting.
pub(crate) fn parse_context(
    prior_context: Option<&str>,
    warnings: &mut Vec<ToolWarning>,
) -> Conversation {
    match non_blank(prior_context) {
        None => Conversation::new(),
        Some(json) => match Conversation::from_json(json) {
            Ok(context) => context,
            Err(e) => {
                tracing::warn!("discarding unparseable context: {}", e);
                warnings.push(ToolWarning::InvalidContextJson);
                Conversation::new()
            }
        },
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qwen_omni_types::Content;

    #[test]
    fn appends_text_turn_to_empty_context() {
        let outcome = append_message(None, MessageRole::User, Some("Hi"));
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.context.len(), 1);

        let message = &outcome.context.messages()[0];
        assert_eq!(message.role(), MessageRole::User);
        match &message.content()[0] {
            Content::Text(text) => assert_eq!(text.text(), "Hi"),
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn appends_to_prior_context() {
        let prior = append_message(None, MessageRole::User, Some("Hi"))
            .context
            .to_json()
            .unwrap();

        let outcome = append_message(Some(&prior), MessageRole::Assistant, Some("Hello!"));
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.context.len(), 2);
        assert_eq!(outcome.context.messages()[1].role(), MessageRole::Assistant);
    }

    #[test]
    fn malformed_context_warns_and_starts_fresh() {
        let outcome = append_message(Some("{not json"), MessageRole::User, Some("Hi"));
        assert_eq!(outcome.warnings, vec![ToolWarning::InvalidContextJson]);
        // the new turn still lands in a fresh conversation
        assert_eq!(outcome.context.len(), 1);
    }

    #[test]
    fn blank_message_warns_but_returns_context() {
        let prior = append_message(None, MessageRole::User, Some("Hi"))
            .context
            .to_json()
            .unwrap();

        let outcome = append_message(Some(&prior), MessageRole::User, Some("   "));
        assert_eq!(outcome.warnings, vec![ToolWarning::EmptyMessage]);
        assert_eq!(outcome.context.len(), 1);
    }

    #[test]
    fn blank_context_is_treated_as_absent() {
        let outcome = append_message(Some("  "), MessageRole::User, Some("Hi"));
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.context.len(), 1);
    }
}
