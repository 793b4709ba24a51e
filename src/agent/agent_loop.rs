//! Core agent loop implementation.

use std::sync::Arc;

use thiserror::Error;

use crate::llm::{LlmError, ModelClient, TokenUsage, ToolCall, ToolResponse, Turn};
use crate::tools::{render_result, ToolContext, ToolRegistry};

use super::conversation::Conversation;
use super::prompt::build_system_prompt;

/// Default cap on model invocations per run.
pub const DEFAULT_MAX_ITERATIONS: usize = 20;

/// Fatal failures that abort a run.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model call itself failed. Not retried.
    #[error("model request failed on iteration {iteration}: {source}")]
    Transport {
        iteration: usize,
        #[source]
        source: LlmError,
    },

    /// The model returned neither text nor tool calls.
    #[error("model returned an empty response on iteration {iteration}")]
    MalformedResponse { iteration: usize },
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The model produced a final text answer.
    Completed {
        answer: String,
        iterations: usize,
        usage: TokenUsage,
    },
    /// The iteration cap ran out before a final answer. The task is left
    /// incomplete; this is not a pipeline error.
    IterationCapReached { iterations: usize, usage: TokenUsage },
}

/// The tool-calling agent.
pub struct Agent {
    client: Arc<dyn ModelClient>,
    tools: ToolRegistry,
    context: ToolContext,
    max_iterations: usize,
}

impl Agent {
    pub fn new(
        client: Arc<dyn ModelClient>,
        tools: ToolRegistry,
        context: ToolContext,
        max_iterations: usize,
    ) -> Self {
        Self {
            client,
            tools,
            context,
            max_iterations,
        }
    }

    /// Drive the conversation until a final answer, a fatal error, or the cap.
    pub async fn run(&self, prompt: &str) -> Result<RunOutcome, AgentError> {
        let declarations = self.tools.declarations();
        let system_prompt = build_system_prompt(&declarations);
        let mut conversation = Conversation::new(prompt);
        let mut usage = TokenUsage::default();

        if self.context.verbose() {
            tracing::info!("User prompt: {}", prompt);
        }

        for iteration in 1..=self.max_iterations {
            tracing::debug!("Agent iteration {}", iteration);

            let response = self
                .client
                .generate(&system_prompt, conversation.snapshot(), &declarations)
                .await
                .map_err(|source| AgentError::Transport { iteration, source })?;

            if let Some(turn_usage) = response.usage {
                usage.add(turn_usage);
                if self.context.verbose() {
                    tracing::info!(
                        "Prompt tokens: {}, response tokens: {}",
                        turn_usage.prompt_tokens,
                        turn_usage.response_tokens
                    );
                }
            }

            let turn = response.turn;
            let text = turn.text();
            let calls: Vec<ToolCall> = turn.tool_calls().cloned().collect();
            conversation.append(turn);

            if !calls.is_empty() {
                if !text.trim().is_empty() {
                    tracing::debug!("Model text alongside tool calls: {}", text);
                }
                let responses = self.run_tool_calls(&calls).await;
                conversation.append(Turn::tool(responses));
                continue;
            }

            if text.trim().is_empty() {
                return Err(AgentError::MalformedResponse { iteration });
            }

            return Ok(RunOutcome::Completed {
                answer: text,
                iterations: iteration,
                usage,
            });
        }

        tracing::warn!(
            "Max iterations ({}) reached without a final answer",
            self.max_iterations
        );
        Ok(RunOutcome::IterationCapReached {
            iterations: self.max_iterations,
            usage,
        })
    }

    /// Dispatch calls one at a time, in the order the model emitted them.
    async fn run_tool_calls(&self, calls: &[ToolCall]) -> Vec<ToolResponse> {
        let mut responses = Vec::with_capacity(calls.len());
        for call in calls {
            let result = self.tools.dispatch(call, &self.context).await;

            if let Err(e) = &result {
                tracing::warn!("Tool {} failed ({}): {}", call.name, e.kind(), e);
            }
            if self.context.verbose() {
                tracing::info!("-> {}", render_result(&result));
            }

            responses.push(ToolResponse {
                name: call.name.clone(),
                result,
            });
        }
        responses
    }
}
