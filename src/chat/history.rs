//! Conversation history.

use serde::{Deserialize, Serialize};

use crate::types::{Content, Role};
use crate::{Error, Result};

/// Who said it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// The person chatting.
    User,
    /// The persona's reply.
    Assistant,
}

impl TurnRole {
    fn wire_role(self) -> Role {
        match self {
            TurnRole::User => Role::User,
            TurnRole::Assistant => Role::Model,
        }
    }
}

/// One message in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// The speaker.
    pub role: TurnRole,
    /// What was said.
    pub text: String,
}

impl Turn {
    /// A user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    /// An assistant reply.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
        }
    }

    /// This turn as request content.
    pub fn to_content(&self) -> Content {
        Content::new(self.role.wire_role(), self.text.clone())
    }
}

/// Turns in strict user/assistant alternation, starting with the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    turns: Vec<Turn>,
}

impl History {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns true if nothing was said yet.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// All turns, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The role the next turn must have.
    pub fn next_role(&self) -> TurnRole {
        match self.turns.last() {
            Some(Turn {
                role: TurnRole::User,
                ..
            }) => TurnRole::Assistant,
            _ => TurnRole::User,
        }
    }

    /// Append a turn.  Out-of-order turns are rejected and leave the history
    /// unchanged.
    pub fn push(&mut self, turn: Turn) -> Result<()> {
        let expected = self.next_role();
        if turn.role != expected {
            return Err(Error::validation(format!(
                "expected a {expected:?} turn after {} turns, got {:?}",
                self.turns.len(),
                turn.role
            )));
        }
        self.turns.push(turn);
        Ok(())
    }

    /// Drop everything after the first `len` turns.
    pub(crate) fn rollback(&mut self, len: usize) {
        self.turns.truncate(len);
    }

    /// The history as request contents.
    pub fn to_contents(&self) -> Vec<Content> {
        self.turns.iter().map(Turn::to_content).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternation_is_enforced() {
        let mut history = History::new();
        assert_eq!(history.next_role(), TurnRole::User);
        assert!(history.push(Turn::assistant("hi")).is_err());
        assert!(history.is_empty());

        history.push(Turn::user("Hello")).unwrap();
        assert_eq!(history.next_role(), TurnRole::Assistant);
        assert!(history.push(Turn::user("again")).is_err());
        assert_eq!(history.len(), 1);

        history.push(Turn::assistant("Hi there!")).unwrap();
        assert_eq!(history.next_role(), TurnRole::User);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn rollback_restores_prior_length() {
        let mut history = History::new();
        history.push(Turn::user("one")).unwrap();
        history.push(Turn::assistant("two")).unwrap();
        history.push(Turn::user("three")).unwrap();
        history.rollback(2);
        assert_eq!(history.len(), 2);
        assert_eq!(history.next_role(), TurnRole::User);
    }

    #[test]
    fn contents_use_wire_roles() {
        let mut history = History::new();
        history.push(Turn::user("Hello")).unwrap();
        history.push(Turn::assistant("Hi there!")).unwrap();
        let contents = history.to_contents();
        assert_eq!(contents[0].role, Some(Role::User));
        assert_eq!(contents[1].role, Some(Role::Model));
        assert_eq!(contents[1].text(), "Hi there!");
    }

    #[test]
    fn turns_serialize_with_lowercase_roles() {
        let json = serde_json::to_value(Turn::assistant("hey")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "text": "hey"}));
    }
}
