//! Model client boundary.
//!
//! The agent only depends on the [`ModelClient`] trait; [`GeminiClient`] is
//! the HTTP implementation used by the binary.

mod error;
mod gemini;
mod types;

use async_trait::async_trait;

pub use error::LlmError;
pub use gemini::{GeminiClient, DEFAULT_API_BASE};
pub use types::{ModelResponse, Part, Role, TokenUsage, ToolCall, ToolResponse, Turn};

use crate::tools::ToolDeclaration;

/// Something that can produce the next model turn for a conversation.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate the next turn.
    ///
    /// `system` is the fixed system instruction and `tools` the declarations
    /// advertised to the model.
    async fn generate(
        &self,
        system: &str,
        contents: &[Turn],
        tools: &[ToolDeclaration],
    ) -> Result<ModelResponse, LlmError>;
}
