//! Assistant Thread Runs
//!
//! Turn orchestration for backends that model a conversation as a
//! long-running "run" on a hosted thread. The run is polled until it
//! completes, fails, or asks for tool outputs; requested tools are
//! dispatched through the registry and their outputs submitted back.
//!
//! The whole turn (new thread, run, polling, tool submission) is wrapped in
//! a caller-supplied [`RetryPolicy`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::{AgentError, Result};
use crate::history::{HistoryStore, SessionId};
use crate::message::Message;
use crate::reasoning::TurnResponse;
use crate::retry::RetryPolicy;
use crate::tool::{ToolCall, ToolRegistry};

/// Lifecycle status of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Expired,
    Incomplete,
}

impl RunStatus {
    /// Statuses after which the run will never progress
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Cancelled | Self::Failed | Self::Expired | Self::Incomplete)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Completed => "completed",
            Self::Expired => "expired",
            Self::Incomplete => "incomplete",
        }
    }
}

/// Snapshot of a run as reported by the backend
#[derive(Clone, Debug)]
pub struct ThreadRun {
    pub thread_id: String,
    pub run_id: String,
    pub status: RunStatus,
    /// Tool calls awaiting outputs when `status == RequiresAction`
    pub required_tool_calls: Vec<ToolCall>,
}

/// Output for one requested tool call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

/// Hosted thread/run API
#[async_trait]
pub trait ThreadBackend: Send + Sync {
    /// Start a thread holding the prompt and a run of the assistant on it
    async fn create_thread_and_run(&self, assistant_id: &str, prompt: &str) -> Result<ThreadRun>;

    /// Current state of a run
    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<ThreadRun>;

    /// Submit tool outputs for a run in `RequiresAction`
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<ThreadRun>;

    /// Text of the newest message on the thread
    async fn latest_message(&self, thread_id: &str) -> Result<String>;
}

/// Assistant runner configuration
#[derive(Clone, Debug)]
pub struct AssistantConfig {
    /// Hosted assistant to run
    pub assistant_id: String,

    /// Delay between status polls
    pub poll_interval: Duration,

    /// Polls allowed per attempt before giving up
    pub max_polls: usize,

    /// Whole-turn retry policy
    pub retry: RetryPolicy,
}

impl AssistantConfig {
    pub fn new(assistant_id: impl Into<String>) -> Self {
        Self {
            assistant_id: assistant_id.into(),
            poll_interval: Duration::from_millis(500),
            max_polls: 240,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub const fn with_polling(mut self, interval: Duration, max_polls: usize) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }
}

/// Runs turns against a hosted assistant
pub struct AssistantRunner {
    backend: Arc<dyn ThreadBackend>,
    tools: Arc<ToolRegistry>,
    history: Option<Arc<dyn HistoryStore>>,
    config: AssistantConfig,
}

impl AssistantRunner {
    pub fn new(backend: Arc<dyn ThreadBackend>, tools: Arc<ToolRegistry>, config: AssistantConfig) -> Self {
        Self {
            backend,
            tools,
            history: None,
            config,
        }
    }

    /// Record completed turns in a history store
    #[must_use]
    pub fn with_history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    /// Process one user turn, retrying the whole turn on any error
    #[instrument(skip(self, session, prompt), fields(session = %session, assistant = %self.config.assistant_id))]
    pub async fn process_input(&self, session: &SessionId, prompt: &str) -> TurnResponse {
        let this = self;
        let outcome = self
            .config
            .retry
            .execute("assistant_turn", move || this.attempt(prompt))
            .await;

        match outcome {
            Ok(answer) => {
                if let Some(history) = &self.history {
                    let turn = [Message::user(prompt), Message::assistant(answer.as_str())];
                    if let Err(e) = history.append(session, &turn) {
                        warn!(error = %e, "Failed to record turn");
                    }
                }
                TurnResponse::answered(answer, None)
            }
            Err(e) => TurnResponse {
                success: false,
                response: format!("All attempts failed. Last error: {e}"),
                error: Some(e.to_string()),
                tool: None,
            },
        }
    }

    /// One attempt: new thread, run, poll to completion
    async fn attempt(&self, prompt: &str) -> Result<String> {
        let mut run = self
            .backend
            .create_thread_and_run(&self.config.assistant_id, prompt)
            .await?;
        let mut polls = 0;

        loop {
            debug!(run = %run.run_id, status = run.status.as_str(), "Run status");

            match run.status {
                RunStatus::Completed => {
                    return self.backend.latest_message(&run.thread_id).await;
                }
                status if status.is_failure() => {
                    return Err(AgentError::RunFailed(status.as_str().into()));
                }
                RunStatus::RequiresAction => {
                    let outputs = self.dispatch_all(&run.required_tool_calls).await;
                    info!(count = outputs.len(), "Submitting tool outputs");
                    run = self
                        .backend
                        .submit_tool_outputs(&run.thread_id, &run.run_id, &outputs)
                        .await?;
                }
                _ => {
                    polls += 1;
                    if polls > self.config.max_polls {
                        return Err(AgentError::MaxIterations(self.config.max_polls));
                    }
                    tokio::time::sleep(self.config.poll_interval).await;
                    run = self.backend.retrieve_run(&run.thread_id, &run.run_id).await?;
                }
            }
        }
    }

    /// Dispatch each requested call. Unknown tools and tool errors become a
    /// failure string for that call only.
    async fn dispatch_all(&self, calls: &[ToolCall]) -> Vec<ToolOutput> {
        let mut outputs = Vec::with_capacity(calls.len());

        for call in calls {
            let output = match self.tools.dispatch(call).await {
                Ok(result) => result.output,
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "Tool call failed");
                    format!("Error: {e}")
                }
            };

            outputs.push(ToolOutput {
                tool_call_id: call.id.clone().unwrap_or_default(),
                output,
            });
        }

        outputs
    }
}
