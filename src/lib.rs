//! # Sandboxed Agent
//!
//! A tool-calling LLM agent confined to a single working directory.
//!
//! This library provides:
//! - A bounded agent loop that alternates model calls and tool calls
//! - Sandboxed tools: directory listing, file read/write, script execution
//! - A Gemini client behind the [`llm::ModelClient`] trait
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Start the conversation with the user's prompt
//! 2. Call the model, advertising the available tools
//! 3. Run any requested tool calls inside the sandbox root, in order
//! 4. Feed the results back and repeat until a text answer or the iteration cap
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sandboxed_agent::{agent::Agent, config::Config, tools::{SandboxRoot, ToolContext, ToolRegistry}};
//!
//! let config = Config::from_env()?;
//! let context = ToolContext::new(SandboxRoot::new(&config.workspace_path)?);
//! let agent = Agent::new(
//!     Arc::new(config.model_client()?),
//!     ToolRegistry::new(config.script.clone()),
//!     context,
//!     config.max_iterations,
//! );
//! let outcome = agent.run("Fix the bug in the calculator").await?;
//! ```

pub mod agent;
pub mod config;
pub mod llm;
pub mod tools;

pub use config::Config;
