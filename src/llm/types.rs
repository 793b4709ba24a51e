//! Conversation types exchanged with the model.

use serde_json::{Map, Value};

use crate::tools::ToolResult;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
    Tool,
}

/// A model-issued request to run a tool. Arguments are untrusted.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub args: Map<String, Value>,
}

/// The answer to one [`ToolCall`].
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResponse {
    pub name: String,
    pub result: ToolResult,
}

/// One piece of a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    ToolCall(ToolCall),
    ToolResponse(ToolResponse),
}

/// One message-sized unit of the conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn model(parts: Vec<Part>) -> Self {
        Self {
            role: Role::Model,
            parts,
        }
    }

    /// A tool turn bundling the responses to a model turn's calls.
    pub fn tool(responses: Vec<ToolResponse>) -> Self {
        Self {
            role: Role::Tool,
            parts: responses.into_iter().map(Part::ToolResponse).collect(),
        }
    }

    /// Concatenated text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCall> {
        self.parts.iter().filter_map(|p| match p {
            Part::ToolCall(call) => Some(call),
            _ => None,
        })
    }

    pub fn tool_responses(&self) -> impl Iterator<Item = &ToolResponse> {
        self.parts.iter().filter_map(|p| match p {
            Part::ToolResponse(response) => Some(response),
            _ => None,
        })
    }
}

/// Token accounting reported by the model, used for diagnostics only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub response_tokens: u64,
}

impl TokenUsage {
    pub fn add(&mut self, other: TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.response_tokens += other.response_tokens;
    }
}

/// A successful model reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResponse {
    /// Always has [`Role::Model`].
    pub turn: Turn,
    pub usage: Option<TokenUsage>,
}
