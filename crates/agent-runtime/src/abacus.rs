//! Abacus.AI Deployment Chat
//!
//! `LlmProvider` over a deployed Abacus.AI chat model (`getChatResponse`).
//! The deployment takes a list of `{is_user, text}` messages; system and
//! assistant turns are folded into a single prompt and the reply is the text
//! of the last non-user message.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{Completion, GenerationOptions, LlmProvider},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::http;

const DEFAULT_ABACUS_API_BASE: &str = "https://api.abacus.ai";
const MODEL_NAME: &str = "penelope";

/// Abacus.AI deployment configuration
#[derive(Clone, Debug)]
pub struct AbacusConfig {
    pub api_key: String,
    pub deployment_id: String,
    pub deployment_token: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl AbacusConfig {
    /// Reads `ABACUS_API_KEY`, `ABACUS_DEPLOYMENT_ID` and `ABACUS_DEPLOYMENT_TOKEN`
    pub fn from_env() -> Result<Self> {
        let var = |key: &str| {
            std::env::var(key).map_err(|_| AgentError::Config(format!("{key} environment variable not set")))
        };

        Ok(Self {
            api_key: var("ABACUS_API_KEY")?,
            deployment_id: var("ABACUS_DEPLOYMENT_ID")?,
            deployment_token: var("ABACUS_DEPLOYMENT_TOKEN")?,
            api_base: DEFAULT_ABACUS_API_BASE.into(),
            timeout_secs: 120,
        })
    }
}

/// Abacus.AI chat provider
pub struct AbacusProvider {
    client: Client,
    config: AbacusConfig,
}

impl AbacusProvider {
    pub fn from_config(config: AbacusConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_config(AbacusConfig::from_env()?)
    }

    /// Render the conversation as one user prompt
    fn render_prompt(messages: &[Message]) -> String {
        messages
            .iter()
            .map(|m| match m.role {
                Role::System => m.content.clone(),
                Role::User => format!("User: {}", m.content),
                Role::Assistant => format!("Assistant: {}", m.content),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn extract_reply(response: ChatResponse) -> Result<String> {
        if !response.success {
            return Err(AgentError::Provider(
                response.error.unwrap_or_else(|| "Abacus request failed".into()),
            ));
        }

        response
            .result
            .and_then(|r| r.messages.into_iter().rev().find(|m| !m.is_user))
            .map(|m| m.text)
            .ok_or_else(|| AgentError::Provider("No reply in Abacus response".into()))
    }
}

#[async_trait]
impl LlmProvider for AbacusProvider {
    fn name(&self) -> &str {
        "abacus"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.config.deployment_token.is_empty())
    }

    #[instrument(skip(self, messages, _options), fields(deployment = %self.config.deployment_id))]
    async fn complete(&self, messages: &[Message], _options: &GenerationOptions) -> Result<Completion> {
        let request = ChatRequest {
            messages: vec![ChatMessage {
                is_user: true,
                text: Self::render_prompt(messages),
            }],
        };
        debug!("Sending Abacus chat request");

        let response = self
            .client
            .post(format!("{}/api/v0/getChatResponse", self.config.api_base))
            .header("apiKey", &self.config.api_key)
            .query(&[
                ("deploymentId", self.config.deployment_id.as_str()),
                ("deploymentToken", self.config.deployment_token.as_str()),
            ])
            .json(&request)
            .send()
            .await
            .map_err(|e| http::transport_error(&e))?;

        let response: ChatResponse = http::check(response)
            .await?
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("Failed to parse response: {e}")))?;

        Ok(Completion::text(Self::extract_reply(response)?, MODEL_NAME))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    is_user: bool,
    text: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    result: Option<ChatResult>,
}

#[derive(Debug, Deserialize)]
struct ChatResult {
    #[serde(default)]
    messages: Vec<ChatMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prompt_rendering() {
        let prompt = AbacusProvider::render_prompt(&[
            Message::system("You are Penelope."),
            Message::user("gm"),
            Message::assistant("gm!"),
            Message::user("price of eth?"),
        ]);
        assert!(prompt.starts_with("You are Penelope."));
        assert!(prompt.ends_with("User: price of eth?"));
        assert!(prompt.contains("Assistant: gm!"));
    }

    #[test]
    fn test_reply_is_last_model_message() {
        let response: ChatResponse = serde_json::from_value(json!({
            "success": true,
            "result": {"messages": [
                {"is_user": true, "text": "price of eth?"},
                {"is_user": false, "text": "ETH trades at $3,100."}
            ]}
        }))
        .unwrap();
        assert_eq!(AbacusProvider::extract_reply(response).unwrap(), "ETH trades at $3,100.");
    }

    #[test]
    fn test_unsuccessful_response_is_error() {
        let response: ChatResponse =
            serde_json::from_value(json!({"success": false, "error": "invalid deployment token"})).unwrap();
        let err = AbacusProvider::extract_reply(response).unwrap_err();
        assert!(err.to_string().contains("invalid deployment token"));
    }
}
