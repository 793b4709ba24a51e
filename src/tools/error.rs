//! Tool execution errors.
//!
//! Every variant is recoverable: the dispatcher hands it back to the model as
//! the body of a tool response, so the `Display` text is written for the model.

use std::time::Duration;

use thiserror::Error;

/// Errors produced while validating or running a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// The resolved path lies outside the sandbox root.
    #[error("Cannot {action} \"{path}\" as it is outside the permitted working directory")]
    SandboxViolation {
        /// Verb describing the attempted operation ("read", "write to", ...).
        action: &'static str,
        /// Path exactly as the model supplied it.
        path: String,
    },

    /// Missing file or directory, or the wrong kind of filesystem entry.
    #[error("{0}")]
    NotFound(String),

    /// The target cannot be executed because of its extension.
    #[error("\"{path}\" is not a {language} file.")]
    WrongFileType { path: String, language: String },

    /// Arguments did not match the declared parameter schema.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// No tool is registered under the requested name.
    #[error("Unknown function: {0}")]
    UnknownTool(String),

    /// The script outlived the wall-clock timeout and was killed.
    #[error("Execution of \"{path}\" timed out after {} seconds", .timeout.as_secs())]
    ExecutionTimeout { path: String, timeout: Duration },

    /// The child process could not be started.
    #[error("executing script: {0}")]
    SpawnFailure(String),

    /// Any other filesystem failure.
    #[error("{0}")]
    IoFailure(String),
}

impl ToolError {
    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::SandboxViolation { .. } => "sandbox_violation",
            ToolError::NotFound(_) => "not_found",
            ToolError::WrongFileType { .. } => "wrong_file_type",
            ToolError::InvalidArguments(_) => "invalid_arguments",
            ToolError::UnknownTool(_) => "unknown_tool",
            ToolError::ExecutionTimeout { .. } => "execution_timeout",
            ToolError::SpawnFailure(_) => "spawn_failure",
            ToolError::IoFailure(_) => "io_failure",
        }
    }
}

/// Outcome of a single tool invocation: a model-readable payload or an error.
pub type ToolResult = Result<String, ToolError>;

/// Render a tool result the way the model sees it.
pub fn render_result(result: &ToolResult) -> String {
    match result {
        Ok(payload) => payload.clone(),
        Err(e) => format!("Error: {}", e),
    }
}
