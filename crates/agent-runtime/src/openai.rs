//! OpenAI-compatible Chat Provider
//!
//! Implementation of `LlmProvider` for any `/chat/completions` endpoint with
//! Bearer auth. Used for OpenAI itself (with native function calling when
//! tools are supplied) and for Perplexity.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::Message,
    provider::{Completion, FinishReason, GenerationOptions, LlmProvider, TokenUsage},
    tool::{ToolCall, ToolSchema},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::http;

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const PERPLEXITY_API_BASE: &str = "https://api.perplexity.ai";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// OpenAI-compatible provider configuration
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// Name used in logs and health output
    pub name: String,

    /// Bearer token
    pub api_key: String,

    /// API base URL, without the trailing `/chat/completions`
    pub api_base: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            name: "openai".into(),
            api_key: api_key.into(),
            api_base: DEFAULT_OPENAI_API_BASE.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Perplexity's OpenAI-compatible endpoint
    pub fn perplexity(api_key: impl Into<String>) -> Self {
        Self {
            name: "perplexity".into(),
            api_base: PERPLEXITY_API_BASE.into(),
            ..Self::new(api_key)
        }
    }

    /// Reads `OPENAI_API_KEY` and optionally `OPENAI_API_BASE`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| AgentError::Config("OPENAI_API_KEY environment variable not set".into()))?;
        let api_base = std::env::var("OPENAI_API_BASE")
            .unwrap_or_else(|_| DEFAULT_OPENAI_API_BASE.into());

        Ok(Self {
            api_base,
            ..Self::new(api_key)
        })
    }

    /// Reads `PERPLEXITY_API_KEY`
    pub fn perplexity_from_env() -> Result<Self> {
        let api_key = std::env::var("PERPLEXITY_API_KEY")
            .map_err(|_| AgentError::Config("PERPLEXITY_API_KEY environment variable not set".into()))?;
        Ok(Self::perplexity(api_key))
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// OpenAI-compatible chat provider
pub struct OpenAiProvider {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    /// Create from configuration
    pub fn from_config(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(OpenAiConfig::from_env()?)
    }

    pub const fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.api_base.trim_end_matches('/'))
    }

    fn build_request(messages: &[Message], options: &GenerationOptions) -> ChatRequest {
        let tools = (!options.tools.is_empty())
            .then(|| options.tools.iter().map(ChatTool::from_schema).collect());

        ChatRequest {
            model: options.model.clone(),
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: options.top_p,
            stop: (!options.stop_sequences.is_empty()).then(|| options.stop_sequences.clone()),
            tools,
        }
    }

    fn convert_completion(response: ChatResponse, requested_model: &str) -> Result<Completion> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Provider("No choices in response".into()))?;

        let mut tool_calls = Vec::new();
        for call in choice.message.tool_calls.unwrap_or_default() {
            let arguments: Value = if call.function.arguments.trim().is_empty() {
                Value::Object(serde_json::Map::new())
            } else {
                serde_json::from_str(&call.function.arguments).map_err(|e| {
                    AgentError::Parse(format!("tool call arguments for '{}': {e}", call.function.name))
                })?
            };
            tool_calls.push(ToolCall::new(call.function.name, arguments).with_id(call.id));
        }

        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            model: response.model.unwrap_or_else(|| requested_model.to_string()),
            tool_calls,
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason.as_deref().map(FinishReason::from_api),
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.endpoint("models"))
            .bearer_auth(&self.config.api_key)
            .send()
            .await;

        match response {
            Ok(r) => Ok(r.status().is_success()),
            Err(e) => {
                warn!("{} health check failed: {}", self.config.name, e);
                Ok(false)
            }
        }
    }

    #[instrument(skip(self, messages, options), fields(provider = %self.config.name, model = %options.model))]
    async fn complete(&self, messages: &[Message], options: &GenerationOptions) -> Result<Completion> {
        let request = Self::build_request(messages, options);
        debug!(messages = request.messages.len(), tools = options.tools.len(), "Sending chat completion");

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| http::transport_error(&e))?;

        let response: ChatResponse = http::check(response)
            .await?
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("Failed to parse response: {e}")))?;

        let completion = Self::convert_completion(response, &options.model)?;
        debug!(
            finish_reason = ?completion.finish_reason,
            tool_calls = completion.tool_calls.len(),
            "Received completion"
        );
        Ok(completion)
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ChatTool>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: ChatFunction,
}

impl ChatTool {
    fn from_schema(schema: &ToolSchema) -> Self {
        Self {
            kind: "function",
            function: ChatFunction {
                name: schema.name.clone(),
                description: schema.description.clone(),
                parameters: schema.json_schema(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ChatToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ChatToolCall {
    id: String,
    function: ChatToolFunction,
}

#[derive(Debug, Deserialize)]
struct ChatToolFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
