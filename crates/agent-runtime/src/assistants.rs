//! OpenAI Assistants v2
//!
//! `ThreadBackend` over the hosted threads/runs API, plus the assistant
//! management calls (list, create, delete).

use std::time::Duration;

use agent_core::{
    assistant::{RunStatus, ThreadBackend, ThreadRun, ToolOutput},
    error::{AgentError, Result},
    tool::{ToolCall, ToolSchema},
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, instrument};

use crate::http;
use crate::openai::OpenAiConfig;

const BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

/// Assistant as listed by the API
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssistantInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub model: String,
    #[serde(default)]
    pub instructions: Option<String>,
}

/// Parameters for creating an assistant
#[derive(Clone, Debug)]
pub struct NewAssistant {
    pub name: String,
    pub model: String,
    pub instructions: String,
    pub tools: Vec<ToolSchema>,
}

/// Threads/runs client
pub struct AssistantsClient {
    client: Client,
    config: OpenAiConfig,
}

impl AssistantsClient {
    pub fn from_config(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_config(OpenAiConfig::from_env()?)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{path}", self.config.api_base.trim_end_matches('/'));
        self.client
            .request(method, url)
            .bearer_auth(&self.config.api_key)
            .header(BETA_HEADER.0, BETA_HEADER.1)
    }

    async fn send<T: for<'de> Deserialize<'de>>(request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(|e| http::transport_error(&e))?;
        http::check(response)
            .await?
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("Failed to parse response: {e}")))
    }

    pub async fn list_assistants(&self) -> Result<Vec<AssistantInfo>> {
        let page: ListResponse<AssistantInfo> =
            Self::send(self.request(reqwest::Method::GET, "assistants?limit=100&order=desc")).await?;
        Ok(page.data)
    }

    pub async fn create_assistant(&self, assistant: &NewAssistant) -> Result<AssistantInfo> {
        let tools: Vec<Value> = assistant
            .tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.json_schema(),
                    }
                })
            })
            .collect();

        let body = json!({
            "name": assistant.name,
            "model": assistant.model,
            "instructions": assistant.instructions,
            "tools": tools,
        });

        let created: AssistantInfo =
            Self::send(self.request(reqwest::Method::POST, "assistants").json(&body)).await?;
        info!(id = %created.id, "Created assistant");
        Ok(created)
    }

    pub async fn delete_assistant(&self, assistant_id: &str) -> Result<bool> {
        let deleted: DeleteResponse =
            Self::send(self.request(reqwest::Method::DELETE, &format!("assistants/{assistant_id}"))).await?;
        Ok(deleted.deleted)
    }
}

#[async_trait]
impl ThreadBackend for AssistantsClient {
    #[instrument(skip(self, prompt))]
    async fn create_thread_and_run(&self, assistant_id: &str, prompt: &str) -> Result<ThreadRun> {
        let body = json!({
            "assistant_id": assistant_id,
            "thread": {"messages": [{"role": "user", "content": prompt}]},
        });
        let run: RunObject = Self::send(self.request(reqwest::Method::POST, "threads/runs").json(&body)).await?;
        debug!(thread = %run.thread_id, run = %run.id, "Started run");
        run.into_thread_run()
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<ThreadRun> {
        let path = format!("threads/{thread_id}/runs/{run_id}");
        let run: RunObject = Self::send(self.request(reqwest::Method::GET, &path)).await?;
        run.into_thread_run()
    }

    async fn submit_tool_outputs(&self, thread_id: &str, run_id: &str, outputs: &[ToolOutput]) -> Result<ThreadRun> {
        let path = format!("threads/{thread_id}/runs/{run_id}/submit_tool_outputs");
        let body = json!({ "tool_outputs": outputs });
        let run: RunObject = Self::send(self.request(reqwest::Method::POST, &path).json(&body)).await?;
        run.into_thread_run()
    }

    async fn latest_message(&self, thread_id: &str) -> Result<String> {
        let path = format!("threads/{thread_id}/messages?limit=1&order=desc");
        let page: ListResponse<ThreadMessage> = Self::send(self.request(reqwest::Method::GET, &path)).await?;
        page.data
            .into_iter()
            .next()
            .map(ThreadMessage::text)
            .ok_or_else(|| AgentError::Provider(format!("Thread {thread_id} has no messages")))
    }
}

// Wire types

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    #[serde(default)]
    deleted: bool,
}

#[derive(Debug, Deserialize)]
struct RunObject {
    id: String,
    thread_id: String,
    status: RunStatus,
    #[serde(default)]
    required_action: Option<RequiredAction>,
}

#[derive(Debug, Deserialize)]
struct RequiredAction {
    submit_tool_outputs: SubmitToolOutputs,
}

#[derive(Debug, Deserialize)]
struct SubmitToolOutputs {
    tool_calls: Vec<RunToolCall>,
}

#[derive(Debug, Deserialize)]
struct RunToolCall {
    id: String,
    function: RunFunction,
}

#[derive(Debug, Deserialize)]
struct RunFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

impl RunObject {
    fn into_thread_run(self) -> Result<ThreadRun> {
        let mut required_tool_calls = Vec::new();
        for call in self
            .required_action
            .map(|a| a.submit_tool_outputs.tool_calls)
            .unwrap_or_default()
        {
            let arguments: Value = if call.function.arguments.trim().is_empty() {
                json!({})
            } else {
                serde_json::from_str(&call.function.arguments)?
            };
            required_tool_calls.push(ToolCall::new(call.function.name, arguments).with_id(call.id));
        }

        Ok(ThreadRun {
            thread_id: self.thread_id,
            run_id: self.id,
            status: self.status,
            required_tool_calls,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ThreadMessage {
    #[serde(default)]
    content: Vec<MessageContent>,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    #[serde(default)]
    text: Option<MessageText>,
}

#[derive(Debug, Deserialize)]
struct MessageText {
    value: String,
}

impl ThreadMessage {
    fn text(self) -> String {
        self.content
            .into_iter()
            .filter_map(|c| c.text.map(|t| t.value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
