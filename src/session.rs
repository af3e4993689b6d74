//! Per-connection conversation session.
//!
//! A [`Session`] is the ordered turn log forwarded to the remote service on
//! each call. It is owned exclusively by one connection's handler task:
//! created when the connection is accepted, dropped when the handler returns
//! (on every exit path), never shared across connections and never persisted.

use crate::llm::{Message, MessageRole};

/// One conversation, seeded with the system prompt.
#[derive(Debug)]
pub struct Session {
    turns: Vec<Message>,
}

impl Session {
    /// Create a fresh session whose first turn is the system prompt.
    #[must_use]
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![Message::system(system_prompt)],
        }
    }

    /// Append a user turn.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(Message::user(content));
    }

    /// Append an assistant turn.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Message::assistant(content));
    }

    /// Remove the trailing user turn, if any.
    ///
    /// Called when the remote call for that turn failed, so later calls
    /// carry only successful exchanges.
    pub fn pop_last_user(&mut self) {
        if self
            .turns
            .last()
            .is_some_and(|m| m.role == MessageRole::User)
        {
            self.turns.pop();
        }
    }

    /// The full turn history, system seed first.
    #[must_use]
    pub fn turns(&self) -> &[Message] {
        &self.turns
    }

    /// Number of turns, including the system seed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// A session is never empty: it always holds the system seed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_seeded_with_system_prompt() {
        let session = Session::new("You are a support assistant.");

        assert_eq!(session.len(), 1);
        assert_eq!(session.turns()[0].role, MessageRole::System);
        assert_eq!(session.turns()[0].content, "You are a support assistant.");
    }

    #[test]
    fn test_session_turn_order() {
        let mut session = Session::new("seed");

        session.push_user("Hello");
        session.push_assistant("Hi there!");
        session.push_user("Thanks");

        let roles: Vec<MessageRole> = session.turns().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::System,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
            ]
        );
    }

    #[test]
    fn test_pop_last_user_removes_failed_turn() {
        let mut session = Session::new("seed");

        session.push_user("first");
        session.push_assistant("reply");
        session.push_user("failed one");
        session.pop_last_user();

        assert_eq!(session.len(), 3);
        assert_eq!(session.turns().last().unwrap().role, MessageRole::Assistant);
    }

    #[test]
    fn test_pop_last_user_leaves_assistant_turn() {
        let mut session = Session::new("seed");

        session.push_user("hello");
        session.push_assistant("hi");
        session.pop_last_user();

        // Trailing turn is the assistant's; nothing is removed.
        assert_eq!(session.len(), 3);
    }
}
