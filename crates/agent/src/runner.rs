use crate::client::{ChatBackend, ChatError};
use crate::wire::{ChatMessage, ToolCall, ToolFunctionSpec, ToolSpec};
use brain_security::SecurityContext;
use brain_tools::{execute, ToolKind, ToolResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default system prompt for project exploration
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a code exploration assistant working inside a \
single project directory. You can read files, list directories, search code with syntax context, \
list definitions, and query git history through the provided tools. All tools are read-only and \
confined to the project; requests outside it will be refused. Prefer search_code and \
list_definitions over reading whole files. When you have enough information, answer in plain \
text without calling further tools.";

/// Flag checked at the top of every loop iteration so a long exploration can
/// be abandoned between tool calls.
pub type CancelFlag = Arc<AtomicBool>;

/// Configuration for one agent run
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Ollama model name (e.g. "qwen3:latest")
    pub model: String,
    /// Inference service address
    pub base_url: String,
    pub system_prompt: String,
    /// Hard bound on model invocations per run
    pub max_turns: usize,
    /// Budget for a single tool call
    pub tool_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "qwen3:latest".to_string(),
            base_url: "http://localhost:11434".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_turns: 10,
            tool_timeout: Duration::from_secs(30),
        }
    }
}

/// How a run ended. `BudgetExhausted` is a first-class outcome so callers can
/// tell "the model finished" from "the model was cut off".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentOutcome {
    Completed { answer: String, turns: usize },
    BudgetExhausted { turns: usize },
    Cancelled { turns: usize },
}

/// Setup-time and inference failures; everything tool-related is recovered
/// inside the loop instead.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("inference service error: {0}")]
    Backend(#[from] ChatError),
}

/// Declarations for the whole tool registry, in the shape Ollama expects.
pub fn tool_specs() -> Vec<ToolSpec> {
    ToolKind::ALL
        .into_iter()
        .map(|kind| ToolSpec {
            tool_type: "function".to_string(),
            function: ToolFunctionSpec {
                name: kind.name().to_string(),
                description: kind.description().to_string(),
                parameters: kind.parameters(),
            },
        })
        .collect()
}

/// The tool-calling conversation loop.
pub struct Agent<B: ChatBackend> {
    config: AgentConfig,
    backend: B,
    ctx: SecurityContext,
    cancel: CancelFlag,
}

impl<B: ChatBackend> Agent<B> {
    pub fn new(config: AgentConfig, backend: B, ctx: SecurityContext) -> Self {
        Self {
            config,
            backend,
            ctx,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for interrupting the run between tool calls.
    pub fn cancel_flag(&self) -> CancelFlag {
        Arc::clone(&self.cancel)
    }

    /// Drive the conversation to one of its terminal states.
    ///
    /// The turn counter is structural: the loop body runs at most
    /// `max_turns` times and each iteration makes exactly one model
    /// invocation.
    pub async fn run(&self, prompt: &str) -> Result<AgentOutcome, AgentError> {
        let tools = tool_specs();
        let mut messages = vec![
            ChatMessage::system(&self.config.system_prompt),
            ChatMessage::user(prompt),
        ];

        log::info!(
            "starting run: model={} tools={} max_turns={}",
            self.config.model,
            tools.len(),
            self.config.max_turns
        );

        for turn in 1..=self.config.max_turns {
            if self.cancel.load(Ordering::Relaxed) {
                log::info!("run cancelled before turn {turn}");
                return Ok(AgentOutcome::Cancelled { turns: turn - 1 });
            }

            let response = self
                .backend
                .chat(&self.config.model, &messages, &tools)
                .await?;

            let message = response.message;
            let tool_calls = message.tool_calls.clone().unwrap_or_default();
            let content = message.content.clone();
            messages.push(message);

            if tool_calls.is_empty() {
                log::info!("turn {turn}: final answer ({} chars)", content.len());
                return Ok(AgentOutcome::Completed {
                    answer: content,
                    turns: turn,
                });
            }

            log::info!("turn {turn}: {} tool call(s)", tool_calls.len());
            // Strictly sequential, in request order; one tool turn per call.
            for call in &tool_calls {
                if self.cancel.load(Ordering::Relaxed) {
                    log::info!("run cancelled between tool calls on turn {turn}");
                    return Ok(AgentOutcome::Cancelled { turns: turn });
                }
                let result = self.dispatch(call).await;
                let content = if result.is_error {
                    format!("Error: {}", result.content)
                } else {
                    result.content
                };
                messages.push(ChatMessage::tool_result(&call.function.name, content));
            }
        }

        log::warn!("turn budget exhausted after {} turns", self.config.max_turns);
        Ok(AgentOutcome::BudgetExhausted {
            turns: self.config.max_turns,
        })
    }

    /// Run one tool call in isolation: unknown names, tool errors, and
    /// timeouts all come back as error-flagged results, never as loop
    /// failures.
    async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let name = call.function.name.as_str();
        let Some(kind) = ToolKind::from_name(name) else {
            log::debug!("model requested unknown tool '{name}'");
            return ToolResult::error(format!("Unknown tool: {name}"));
        };

        log::debug!("dispatching {name}");
        match tokio::time::timeout(
            self.config.tool_timeout,
            execute(kind, &self.ctx, &call.function.arguments),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => ToolResult::error(format!(
                "Tool '{name}' timed out after {}s",
                self.config.tool_timeout.as_secs()
            )),
        }
    }
}
