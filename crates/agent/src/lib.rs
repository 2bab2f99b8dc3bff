//! # Brain Agent
//!
//! The bounded tool-calling conversation loop against a local Ollama model.
//!
//! The loop is an explicit state machine with an inspectable turn counter:
//! each turn sends the whole conversation plus the tool schemas, then either
//! finishes on a plain-text reply or dispatches the requested tool calls
//! strictly in order, one `tool` turn per call. A tool failure or timeout
//! becomes an error-flagged result the model can react to; only inference
//! failures and the turn budget end the run.

mod client;
mod runner;
mod wire;

pub use client::{ChatBackend, ChatError, OllamaClient};
pub use runner::{
    tool_specs, Agent, AgentConfig, AgentError, AgentOutcome, CancelFlag, DEFAULT_SYSTEM_PROMPT,
};
pub use wire::{ChatMessage, ChatResponse, FunctionCall, ToolCall, ToolFunctionSpec, ToolSpec};
