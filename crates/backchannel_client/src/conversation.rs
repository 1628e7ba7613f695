//! Chat history replayed into every chat request.

use crate::messages::{ChatTurn, Role};

/// Append-only, chronologically ordered list of chat turns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    turns: Vec<ChatTurn>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_user(&mut self, text: impl Into<String>) {
        self.turns.push(ChatTurn::user(text));
    }

    pub fn append_assistant(&mut self, text: impl Into<String>) {
        self.turns.push(ChatTurn::assistant(text));
    }

    /// The stored turns in order, ready for the `messages` field.
    pub fn to_request_turns(&self) -> Vec<ChatTurn> {
        self.turns.clone()
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn last_role(&self) -> Option<Role> {
        self.turns.last().map(|t| t.role)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_turns_preserve_append_order() {
        let mut conversation = ConversationState::new();
        conversation.append_user("hi");
        conversation.append_assistant("hello");
        conversation.append_user("how are you");

        assert_eq!(
            conversation.to_request_turns(),
            vec![
                ChatTurn::user("hi"),
                ChatTurn::assistant("hello"),
                ChatTurn::user("how are you"),
            ]
        );
        assert_eq!(conversation.last_role(), Some(Role::User));
    }

    #[test]
    fn empty_conversation_projects_to_no_turns() {
        let conversation = ConversationState::new();
        assert!(conversation.is_empty());
        assert!(conversation.to_request_turns().is_empty());
        assert_eq!(conversation.last_role(), None);
    }
}
