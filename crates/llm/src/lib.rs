//! LLM client abstraction for the SPIN scorer
//!
//! Wraps chat-completion providers behind one JSON-oriented call. The `mock`
//! provider returns a canned response so the scoring pipeline can run
//! without network access.

use anyhow::{Context, Result};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client as OpenAIClient,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name (openai, mock)
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model to use for chat completions
    #[serde(default = "default_model")]
    pub model: String,
    /// API key (falls back to OPENAI_API_KEY)
    pub api_key: Option<String>,
    /// Base URL override (for OpenAI-compatible endpoints)
    pub base_url: Option<String>,
    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,
    /// Canned reply returned by the mock provider
    #[serde(default)]
    pub mock_response: Option<String>,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            base_url: None,
            temperature: 0.0,
            mock_response: None,
        }
    }
}

impl LlmConfig {
    /// Config for the mock provider, answering every call with `response`
    pub fn mock(response: impl Into<String>) -> Self {
        Self {
            provider: "mock".to_string(),
            model: "mock".to_string(),
            mock_response: Some(response.into()),
            ..Default::default()
        }
    }

    /// Apply `MODEL_NAME`, `OPENAI_API_KEY`, `LLM_BASE_URL` and `MOCK_LLM`
    /// on top of this config
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("MODEL_NAME") {
            self.model = model;
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        if let Ok(base_url) = std::env::var("LLM_BASE_URL") {
            self.base_url = Some(base_url);
        }
        let mock = std::env::var("MOCK_LLM")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if mock {
            self.provider = "mock".to_string();
        }
        self
    }

    /// Check the provider can actually serve the configured model
    ///
    /// A custom `base_url` skips model-name detection, since compatible
    /// gateways serve arbitrary model names.
    pub fn validate(&self) -> Result<()> {
        match self.provider.as_str() {
            "mock" => Ok(()),
            "openai" if self.base_url.is_some() => Ok(()),
            "openai" => match detect_provider(&self.model)? {
                "openai" => Ok(()),
                other => anyhow::bail!(
                    "Model '{}' belongs to provider '{}', which is not supported",
                    self.model,
                    other
                ),
            },
            provider => anyhow::bail!("Unsupported LLM provider: {}", provider),
        }
    }
}

/// Guess the provider family from a model identifier
pub fn detect_provider(model: &str) -> Result<&'static str> {
    let model = model.to_lowercase();
    if ["gpt-", "o1-", "gpt3", "gpt4"].iter().any(|p| model.contains(p)) {
        Ok("openai")
    } else if ["claude-", "claude3"].iter().any(|p| model.contains(p)) {
        Ok("anthropic")
    } else if ["gemini-", "gemini1", "gemini2"].iter().any(|p| model.contains(p)) {
        Ok("google")
    } else {
        anyhow::bail!(
            "Cannot determine provider for model '{}'. Supported prefixes: gpt-, o1-, claude-, gemini-",
            model
        )
    }
}

/// A message in a chat conversation
#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// LLM client abstraction
pub struct LlmClient {
    config: LlmConfig,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration
    pub fn new(config: LlmConfig) -> Self {
        Self { config }
    }

    /// Create a client after checking the config can reach a provider
    pub fn from_config(config: LlmConfig) -> Result<Self> {
        config.validate()?;
        if config.provider == "openai" && config.api_key.is_none() && config.base_url.is_none() {
            anyhow::bail!("OpenAI API key not configured. Set OPENAI_API_KEY or MOCK_LLM=true");
        }
        Ok(Self::new(config))
    }

    /// Generate a chat completion, asking for a JSON object reply
    pub async fn chat_json(&self, messages: Vec<Message>) -> Result<String> {
        match self.config.provider.as_str() {
            "openai" => self.chat_openai(messages).await,
            "mock" => self
                .config
                .mock_response
                .clone()
                .context("Mock provider has no canned response configured"),
            provider => anyhow::bail!("Unsupported LLM provider: {}", provider),
        }
    }

    /// JSON completion with a system prompt and user message
    pub async fn complete_json(&self, system: &str, user: &str) -> Result<String> {
        self.chat_json(vec![Message::system(system), Message::user(user)])
            .await
    }

    async fn chat_openai(&self, messages: Vec<Message>) -> Result<String> {
        let mut openai_config = OpenAIConfig::new();

        if let Some(api_key) = &self.config.api_key {
            openai_config = openai_config.with_api_key(api_key);
        }

        if let Some(base_url) = &self.config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        let client = OpenAIClient::with_config(openai_config);

        let openai_messages = messages
            .into_iter()
            .map(|msg| -> Result<ChatCompletionRequestMessage> {
                let message: ChatCompletionRequestMessage = match msg.role {
                    Role::System => ChatCompletionRequestSystemMessageArgs::default()
                        .content(msg.content)
                        .build()?
                        .into(),
                    Role::User => ChatCompletionRequestUserMessageArgs::default()
                        .content(msg.content)
                        .build()?
                        .into(),
                };
                Ok(message)
            })
            .collect::<Result<Vec<_>>>()
            .context("Failed to build chat messages")?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.config.model)
            .messages(openai_messages)
            .temperature(self.config.temperature)
            .response_format(ResponseFormat::JsonObject)
            .build()
            .context("Failed to build chat completion request")?;

        debug!(model = %self.config.model, "Sending chat completion request");

        let response = client
            .chat()
            .create(request)
            .await
            .context("Failed to create chat completion")?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(content)
    }

    /// Get the configured model name
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Get the configured provider name
    pub fn provider(&self) -> &str {
        &self.config.provider
    }
}
