//! Tool system for the agent.
//!
//! Tools are keyed by a closed [`ToolName`] enum. The [`ToolRegistry`] maps
//! each name to a handler, validates model-supplied arguments against the
//! handler's declared parameters, and hands the handler a [`ToolContext`]
//! carrying the sandbox root. The root never travels through the model's
//! arguments.

mod error;
mod files;
mod sandbox;
mod schema;
mod terminal;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;

pub use error::{render_result, ToolError, ToolResult};
pub use files::{ListDirectory, ReadFile, WriteFile, MAX_READ_CHARS};
pub use sandbox::{normalize_lexical, SandboxRoot};
pub use schema::{json_schema, ParamKind, ParamSpec, ToolArgs, RESERVED_ARGUMENT};
pub use terminal::{ExecutionOutcome, RunScript, ScriptConfig, DEFAULT_SCRIPT_TIMEOUT};

use crate::llm::ToolCall;

/// The closed set of tools the agent can offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ToolName {
    ListDirectory,
    ReadFile,
    WriteFile,
    RunScript,
}

impl ToolName {
    pub const ALL: [ToolName; 4] = [
        ToolName::ListDirectory,
        ToolName::ReadFile,
        ToolName::WriteFile,
        ToolName::RunScript,
    ];

    /// Function name advertised to the model.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::ListDirectory => "get_files_info",
            ToolName::ReadFile => "get_file_content",
            ToolName::WriteFile => "write_file",
            ToolName::RunScript => "run_python_file",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ToolError::UnknownTool(s.to_string()))
    }
}

/// Execution context handed to every tool invocation.
#[derive(Debug, Clone)]
pub struct ToolContext {
    root: SandboxRoot,
    verbose: bool,
}

impl ToolContext {
    pub fn new(root: SandboxRoot) -> Self {
        Self {
            root,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn root(&self) -> &SandboxRoot {
        &self.root
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// Declaration of a tool, as advertised to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDeclaration {
    pub name: ToolName,
    pub description: String,
    pub parameters: &'static [ParamSpec],
}

impl ToolDeclaration {
    /// JSON schema of the parameters.
    pub fn parameters_schema(&self) -> Value {
        json_schema(self.parameters)
    }
}

/// Trait for implementing tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Registry key of this tool.
    fn name(&self) -> ToolName;

    /// Description shown to the model.
    fn description(&self) -> &str;

    /// Declared parameters. Dispatch validates against these before `execute`.
    fn parameters(&self) -> &'static [ParamSpec];

    /// Run the tool with validated arguments.
    async fn execute(&self, args: &ToolArgs, ctx: &ToolContext) -> ToolResult;
}

/// Registry of available tools.
pub struct ToolRegistry {
    tools: BTreeMap<ToolName, Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Registry with the four built-in tools.
    pub fn new(script: ScriptConfig) -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(ListDirectory));
        registry.register(Box::new(ReadFile));
        registry.register(Box::new(WriteFile));
        registry.register(Box::new(RunScript::new(script)));
        registry
    }

    pub fn empty() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Add a tool, replacing any tool already registered under its name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name(), tool);
    }

    /// Declarations of every registered tool, in [`ToolName`] order.
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.tools
            .values()
            .map(|t| ToolDeclaration {
                name: t.name(),
                description: t.description().to_string(),
                parameters: t.parameters(),
            })
            .collect()
    }

    /// Validate and run a model-issued tool call.
    ///
    /// Unknown names and bad arguments are reported without running any
    /// handler. The result is meant to go back to the model as-is.
    pub async fn dispatch(&self, call: &ToolCall, ctx: &ToolContext) -> ToolResult {
        let tool = call
            .name
            .parse::<ToolName>()
            .ok()
            .and_then(|name| self.tools.get(&name))
            .ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;

        let args = ToolArgs::validate(tool.parameters(), &call.args)?;

        if ctx.verbose() {
            tracing::info!("Calling function: {}({})", call.name, args.as_json());
        } else {
            tracing::info!("Calling function: {}", call.name);
        }

        tool.execute(&args, ctx).await
    }
}
