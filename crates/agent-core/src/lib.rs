//! # agent-core
//!
//! Provider-agnostic conversational agent: one decision pass that either
//! answers or selects a tool, one dispatch, one summarizing pass.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Agent                              │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐   │
//! │  │  Decision   │  │    Tool     │  │    LlmProvider      │   │
//! │  │  + Summary  │──│  Registry   │──│    (Strategy)       │   │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘   │
//! │         │                                                    │
//! │  ┌─────────────┐  ┌─────────────────────────────────────┐    │
//! │  │HistoryStore │  │ AssistantRunner ── ThreadBackend    │    │
//! │  └─────────────┘  └─────────────────────────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! `LlmProvider` and `ThreadBackend` keep the orchestration independent of
//! which hosted model answers.

pub mod assistant;
pub mod decision;
pub mod error;
pub mod history;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod retry;
pub mod tool;

pub use assistant::{AssistantConfig, AssistantRunner, RunStatus, ThreadBackend, ThreadRun, ToolOutput};
pub use decision::{Decision, parse_decision};
pub use error::{AgentError, Result};
pub use history::{HistoryStore, JsonFileHistoryStore, MemoryHistoryStore, SessionId};
pub use message::{Message, Role};
pub use provider::{Completion, FinishReason, GenerationOptions, LlmProvider, TokenUsage};
pub use reasoning::{Agent, AgentBuilder, AgentConfig, TurnResponse, TurnStage};
pub use retry::{Backoff, RetryPolicy};
pub use tool::{ParameterSchema, Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema};
