//! Append-only conversation state.

use crate::llm::{Role, ToolCall, Turn};

/// The ordered turns of one run.
#[derive(Debug, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Start a conversation with the user's prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::user(prompt)],
        }
    }

    /// Add a turn at the end. Earlier turns are never touched.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Tool calls of the latest model turn that have no response yet.
    ///
    /// Tool turns after a model turn answer its calls in emission order.
    pub fn unanswered_calls(&self) -> Vec<&ToolCall> {
        let Some(model_idx) = self.turns.iter().rposition(|t| t.role == Role::Model) else {
            return Vec::new();
        };
        let answered: usize = self.turns[model_idx + 1..]
            .iter()
            .filter(|t| t.role == Role::Tool)
            .map(|t| t.tool_responses().count())
            .sum();

        self.turns[model_idx].tool_calls().skip(answered).collect()
    }

    /// Full ordered history, ready to send to the model.
    ///
    /// # Panics
    ///
    /// Panics if the latest model turn still has unanswered tool calls. The
    /// loop must append every response before asking for another turn.
    pub fn snapshot(&self) -> &[Turn] {
        let pending = self.unanswered_calls();
        assert!(
            pending.is_empty(),
            "conversation submitted with {} unanswered tool call(s)",
            pending.len()
        );
        &self.turns
    }
}
