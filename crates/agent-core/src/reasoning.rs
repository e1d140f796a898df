//! Turn Orchestration
//!
//! One user turn runs through a fixed sequence of stages:
//!
//! ```text
//! AwaitingDecision ──► ToolRequested ──► Dispatching ──► Summarizing ──► Done
//!        │                                                   ▲
//!        └──────────────── direct answer ────────────────────┘
//! ```
//!
//! The decision pass asks the primary model to either answer or select a
//! tool. A selected tool is dispatched once, and its output (successful or
//! not) goes to a second model pass that writes the final answer. Malformed
//! selections and unknown tools end the turn with a failure; nothing on this
//! path is retried.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::decision::{Decision, parse_decision};
use crate::error::{AgentError, Result};
use crate::history::{HistoryStore, MemoryHistoryStore, SessionId};
use crate::message::Message;
use crate::provider::{GenerationOptions, LlmProvider};
use crate::tool::{Tool, ToolRegistry, ToolResult};

/// Stage of a single turn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStage {
    AwaitingDecision,
    ToolRequested,
    Dispatching,
    Summarizing,
    Done,
}

impl std::fmt::Display for TurnStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::AwaitingDecision => "awaiting_decision",
            Self::ToolRequested => "tool_requested",
            Self::Dispatching => "dispatching",
            Self::Summarizing => "summarizing",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Outcome of a turn, returned as data
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TurnResponse {
    /// Whether the turn produced a final answer
    pub success: bool,

    /// Final answer, or a displayable failure message
    pub response: String,

    /// Failure detail
    pub error: Option<String>,

    /// Tool dispatched during the turn, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

impl TurnResponse {
    pub fn answered(response: impl Into<String>, tool: Option<String>) -> Self {
        Self {
            success: true,
            response: response.into(),
            error: None,
            tool,
        }
    }

    pub fn failed(err: &AgentError) -> Self {
        Self {
            success: false,
            response: err.user_message(),
            error: Some(err.to_string()),
            tool: None,
        }
    }
}

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Persona for the decision pass; tool descriptions are appended
    pub system_prompt: String,

    /// Decision pass generation options
    pub generation: GenerationOptions,

    /// System prompt of the summarizing pass
    pub summary_prompt: String,

    /// Summarizing pass generation options
    pub summary_generation: GenerationOptions,

    /// Offer tool schemas through native function calling as well
    pub native_tools: bool,

    /// Send direct answers through the summarizing pass too
    pub summarize_direct_answers: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            generation: GenerationOptions::default(),
            summary_prompt: DEFAULT_SUMMARY_PROMPT.into(),
            summary_generation: GenerationOptions::default(),
            native_tools: false,
            summarize_direct_answers: true,
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

const DEFAULT_SUMMARY_PROMPT: &str = "You are a helpful AI assistant and an expert in creating analysis and writing summaries.";

const TOOL_INSTRUCTIONS: &str = "You have access to the following set of tools. Here are the names and descriptions for each tool:";

const SELECTION_INSTRUCTIONS: &str = "Given the user input, return the name and input of the tool to use if any helps. \
Return your response as a JSON blob with 'name' and 'arguments' keys. \
If no tool helps, answer the user directly in plain text.";

/// The turn orchestrator
pub struct Agent {
    decider: Arc<dyn LlmProvider>,
    summarizer: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    history: Arc<dyn HistoryStore>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        decider: Arc<dyn LlmProvider>,
        summarizer: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        history: Arc<dyn HistoryStore>,
        config: AgentConfig,
    ) -> Self {
        Self {
            decider,
            summarizer,
            tools,
            history,
            config,
        }
    }

    /// Build the full system prompt including tool descriptions
    pub fn build_system_prompt(&self) -> String {
        let mut prompt = self.config.system_prompt.clone();

        if !self.tools.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(TOOL_INSTRUCTIONS);
            prompt.push('\n');
            prompt.push_str(&self.tools.render_descriptions());
            prompt.push_str(SELECTION_INSTRUCTIONS);
        }

        prompt
    }

    /// Process one user turn. Failures come back as `success == false`.
    #[instrument(skip(self, session, input), fields(session = %session))]
    pub async fn process_input(&self, session: &SessionId, input: &str) -> TurnResponse {
        match self.run_turn(session, input).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Turn failed");
                TurnResponse::failed(&e)
            }
        }
    }

    /// Process one turn in a fresh session
    pub async fn ask(&self, question: &str) -> TurnResponse {
        self.process_input(&SessionId::new(), question).await
    }

    async fn run_turn(&self, session: &SessionId, input: &str) -> Result<TurnResponse> {
        let mut stage = TurnStage::AwaitingDecision;
        debug!(%stage);

        let mut messages = vec![Message::system(self.build_system_prompt())];
        messages.extend(self.history.load(session)?);
        messages.push(Message::user(input));

        let mut options = self.config.generation.clone();
        if self.config.native_tools {
            options.tools = self.tools.schemas();
        }

        let completion = self.decider.complete(&messages, &options).await?;

        let (content, tool) = match parse_decision(&completion) {
            Decision::ParseError(reason) => return Err(AgentError::Parse(reason)),
            Decision::DirectAnswer(answer) if !self.config.summarize_direct_answers => {
                self.finish(session, input, &answer, &completion.model)?;
                return Ok(TurnResponse::answered(answer, None));
            }
            Decision::DirectAnswer(answer) => (answer, None),
            Decision::ToolRequest(call) => {
                stage = TurnStage::ToolRequested;
                debug!(%stage, tool = %call.name);

                stage = TurnStage::Dispatching;
                debug!(%stage, tool = %call.name);
                let result = self.tools.dispatch(&call).await?;
                info!(tool = %call.name, success = result.success, "Tool dispatched");

                (format_tool_result(&result), Some(call.name))
            }
        };

        stage = TurnStage::Summarizing;
        debug!(%stage);
        let answer = self.summarize(input, &content).await?;

        self.finish(session, input, &answer, &self.config.summary_generation.model)?;
        Ok(TurnResponse::answered(answer, tool))
    }

    /// Second pass: turn raw output into a readable answer
    async fn summarize(&self, question: &str, content: &str) -> Result<String> {
        let messages = [
            Message::system(self.config.summary_prompt.clone()),
            Message::user(format!(
                "Create a response for this question or prompt: {question}\n\n\
                 Take into account the following text:\n{content}\n\n\
                 Create a nice and well structured response."
            )),
        ];

        let completion = self
            .summarizer
            .complete(&messages, &self.config.summary_generation)
            .await?;

        let answer = completion.content.trim();
        if answer.is_empty() {
            return Err(AgentError::Provider(format!(
                "{} returned an empty summary",
                self.summarizer.name()
            )));
        }
        Ok(answer.to_string())
    }

    fn finish(&self, session: &SessionId, input: &str, answer: &str, model: &str) -> Result<()> {
        self.history.append(
            session,
            &[
                Message::user(input),
                Message::assistant(answer).with_model(model),
            ],
        )?;
        debug!(stage = %TurnStage::Done);
        Ok(())
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get configuration
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Format tool result for the summarizing pass
fn format_tool_result(result: &ToolResult) -> String {
    if result.success {
        format!("[Tool '{}' returned]\n{}", result.name, result.output)
    } else {
        format!("[Tool '{}' failed]\n{}", result.name, result.output)
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    decider: Option<Arc<dyn LlmProvider>>,
    summarizer: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    history: Option<Arc<dyn HistoryStore>>,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            decider: None,
            summarizer: None,
            tools: ToolRegistry::new(),
            history: None,
            config: AgentConfig::default(),
        }
    }

    /// Provider for the decision pass (also the summarizer unless set)
    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.decider = Some(provider);
        self
    }

    #[must_use]
    pub fn summarizer(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.summarizer = Some(provider);
        self
    }

    #[must_use]
    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    #[must_use]
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub fn history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn summary_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.summary_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    #[must_use]
    pub fn summary_model(mut self, model: impl Into<String>) -> Self {
        self.config.summary_generation.model = model.into();
        self
    }

    #[must_use]
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    #[must_use]
    pub const fn native_tools(mut self, enabled: bool) -> Self {
        self.config.native_tools = enabled;
        self
    }

    #[must_use]
    pub const fn summarize_direct_answers(mut self, enabled: bool) -> Self {
        self.config.summarize_direct_answers = enabled;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let decider = self
            .decider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;
        let summarizer = self.summarizer.unwrap_or_else(|| decider.clone());
        let history = self
            .history
            .unwrap_or_else(|| Arc::new(MemoryHistoryStore::new()));

        Ok(Agent::new(
            decider,
            summarizer,
            Arc::new(self.tools),
            history,
            self.config,
        ))
    }
}
