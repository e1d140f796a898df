//! # agent-runtime
//!
//! Hosted LLM backends for agent-core.
//!
//! ## Providers
//!
//! - **OpenAI-compatible** chat completions: OpenAI (native function
//!   calling) and Perplexity
//! - **Abacus.AI** deployment chat
//! - **Assistants v2** threads and runs, for the polling variant
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::OpenAiProvider;
//!
//! let provider = OpenAiProvider::from_env()?;
//! let agent = AgentBuilder::new()
//!     .provider(Arc::new(provider))
//!     .build()?;
//! ```

pub mod abacus;
pub mod assistants;
mod http;
pub mod openai;

pub use abacus::{AbacusConfig, AbacusProvider};
pub use assistants::{AssistantInfo, AssistantsClient, NewAssistant};
pub use openai::{OpenAiConfig, OpenAiProvider};

// Re-export core types for convenience
pub use agent_core::{
    Agent, AgentBuilder, AgentError, AssistantRunner, LlmProvider, Message, Result, Role, SessionId, ThreadBackend,
    Tool, ToolRegistry,
};
