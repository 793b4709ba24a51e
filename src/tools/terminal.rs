//! Script execution tool.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::error::{ToolError, ToolResult};
use super::schema::{ParamKind, ParamSpec, ToolArgs};
use super::{Tool, ToolContext, ToolName};

/// Default wall-clock limit for a script run.
pub const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_secs(30);

/// How scripts are recognized and launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptConfig {
    /// Program that runs the script, e.g. `python3`.
    pub interpreter: String,
    /// Required file suffix, including the dot.
    pub extension: String,
    /// Human name used in error messages, e.g. `Python`.
    pub language: String,
    pub timeout: Duration,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            extension: ".py".to_string(),
            language: "Python".to_string(),
            timeout: DEFAULT_SCRIPT_TIMEOUT,
        }
    }
}

/// Captured result of one finished child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl ExecutionOutcome {
    /// Render the outcome as a single model-readable string.
    pub fn render(&self) -> String {
        let mut parts = Vec::new();

        if !self.stdout.is_empty() {
            parts.push(format!("STDOUT:\n{}", self.stdout));
        }
        if !self.stderr.is_empty() {
            parts.push(format!("STDERR:\n{}", self.stderr));
        }
        match self.exit_code {
            Some(0) => {}
            Some(code) => parts.push(format!("Process exited with code {}", code)),
            None => parts.push("Process terminated by signal".to_string()),
        }

        if parts.is_empty() {
            return "No output produced.".to_string();
        }
        parts.join("\n")
    }
}

/// Run a script inside the sandbox root.
pub struct RunScript {
    config: ScriptConfig,
}

impl RunScript {
    pub fn new(config: ScriptConfig) -> Self {
        Self { config }
    }
}

const RUN_PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "file_path",
        kind: ParamKind::String,
        description: "The path to the script to execute, relative to the working directory.",
        required: true,
    },
    ParamSpec {
        name: "args",
        kind: ParamKind::StringArray,
        description: "Optional list of command-line arguments to pass to the script.",
        required: false,
    },
];

#[async_trait]
impl Tool for RunScript {
    fn name(&self) -> ToolName {
        ToolName::RunScript
    }

    fn description(&self) -> &str {
        "Executes a script with optional command-line arguments, constrained to the working directory. Returns stdout, stderr and the exit code."
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        RUN_PARAMS
    }

    async fn execute(&self, args: &ToolArgs, ctx: &ToolContext) -> ToolResult {
        let file_path = args.str("file_path")?;
        let script_args = args.string_list("args");
        let target = ctx.root().resolve(file_path, "execute")?;

        if !target.exists() {
            return Err(ToolError::NotFound(format!(
                "File \"{}\" not found.",
                file_path
            )));
        }
        if !file_path.ends_with(&self.config.extension) {
            return Err(ToolError::WrongFileType {
                path: file_path.to_string(),
                language: self.config.language.clone(),
            });
        }

        tracing::info!("Executing script: {} {:?}", file_path, script_args);

        let child = Command::new(&self.config.interpreter)
            .arg(&target)
            .args(&script_args)
            .current_dir(ctx.root().path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ToolError::SpawnFailure(format!(
                    "failed to start '{}': {}",
                    self.config.interpreter, e
                ))
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        // Only the direct child is killed: a backgrounded grandchild that keeps
        // the output pipes open holds the wait until the timeout and outlives it.
        let output = tokio::time::timeout(self.config.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                tracing::warn!("Script {} timed out", file_path);
                ToolError::ExecutionTimeout {
                    path: file_path.to_string(),
                    timeout: self.config.timeout,
                }
            })?
            .map_err(|e| ToolError::SpawnFailure(format!("waiting for script: {}", e)))?;

        let outcome = ExecutionOutcome {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };
        Ok(outcome.render())
    }
}
