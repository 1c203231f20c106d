//! LLM backend abstraction
//!
//! Supports OpenAI-compatible APIs (OpenAI, OpenRouter, local servers) and
//! Anthropic Claude.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// LLM backend errors
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Empty response")]
    EmptyResponse,
}

/// A chat model that turns a system and a user prompt into text
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Single-turn completion
    async fn generate(&self, system: &str, user: &str) -> Result<String, LlmError>;

    fn model_name(&self) -> &str;
}

/// Backend shared by all agents of a crew
pub type SharedBackend = Arc<dyn LlmBackend>;

/// Which API family to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    OpenAI,
    Anthropic,
    OpenRouter,
    Local,
}

impl Provider {
    /// Environment variable holding this provider's key
    pub fn key_env(&self) -> Option<&'static str> {
        match self {
            Provider::OpenAI => Some("OPENAI_API_KEY"),
            Provider::Anthropic => Some("ANTHROPIC_API_KEY"),
            Provider::OpenRouter => Some("OPENROUTER_API_KEY"),
            Provider::Local => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::OpenAI => "OpenAI",
            Provider::Anthropic => "Anthropic",
            Provider::OpenRouter => "OpenRouter",
            Provider::Local => "Local",
        };
        f.write_str(name)
    }
}

impl FromStr for Provider {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAI),
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            "openrouter" => Ok(Provider::OpenRouter),
            "local" | "ollama" => Ok(Provider::Local),
            other => Err(LlmError::Config(format!("unknown provider: {}", other))),
        }
    }
}

/// OpenAI-compatible backend configuration
#[derive(Debug, Clone)]
pub struct OpenAIBackendConfig {
    pub api_key: String,
    /// API base for OpenRouter or a local server; OpenAI when unset
    pub base_url: Option<String>,
    pub model: String,
    /// Sampling temperature, 0.0 to 2.0
    pub temperature: f32,
    pub max_tokens: u16,
}

impl Default for OpenAIBackendConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: 4096,
        }
    }
}

impl OpenAIBackendConfig {
    pub fn openai(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            ..Default::default()
        }
    }

    pub fn openrouter(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: Some("https://openrouter.ai/api/v1".to_string()),
            model: model.to_string(),
            ..Default::default()
        }
    }

    pub fn local(base_url: &str, model: &str) -> Self {
        Self {
            api_key: "sk-local".to_string(),
            base_url: Some(base_url.to_string()),
            model: model.to_string(),
            ..Default::default()
        }
    }
}

/// OpenAI-compatible LLM backend
pub struct OpenAIBackend {
    client: Client<OpenAIConfig>,
    config: OpenAIBackendConfig,
}

impl OpenAIBackend {
    pub fn new(config: OpenAIBackendConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::Config("API key is empty".to_string()));
        }

        let api_config = match &config.base_url {
            Some(base_url) => OpenAIConfig::new()
                .with_api_key(&config.api_key)
                .with_api_base(base_url),
            None => OpenAIConfig::new().with_api_key(&config.api_key),
        };

        Ok(Self {
            client: Client::with_config(api_config),
            config,
        })
    }

    fn request(&self, system: &str, user: &str) -> Result<CreateChatCompletionRequest, OpenAIError> {
        let system = ChatCompletionRequestSystemMessageArgs::default()
            .content(system)
            .build()?;
        let user = ChatCompletionRequestUserMessageArgs::default()
            .content(user)
            .build()?;

        CreateChatCompletionRequestArgs::default()
            .model(&self.config.model)
            .messages(vec![
                ChatCompletionRequestMessage::System(system),
                ChatCompletionRequestMessage::User(user),
            ])
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens)
            .build()
    }
}

impl From<OpenAIError> for LlmError {
    fn from(e: OpenAIError) -> Self {
        LlmError::Api(e.to_string())
    }
}

#[async_trait]
impl LlmBackend for OpenAIBackend {
    async fn generate(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let request = self.request(system, user)?;
        debug!(
            "Chat completion via {} ({} prompt chars)",
            self.config.model,
            system.len() + user.len()
        );

        let response = self.client.chat().create(request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Anthropic Claude backend configuration
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    /// Model name (e.g., claude-sonnet-4-20250514)
    pub model: String,
    pub max_tokens: u32,
    /// Messages endpoint
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl AnthropicConfig {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens: 4096,
            endpoint: ANTHROPIC_MESSAGES_URL.to_string(),
            timeout_secs: 180,
        }
    }
}

/// Anthropic Messages API backend
pub struct AnthropicBackend {
    client: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicBackend {
    pub fn new(config: AnthropicConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::Config("API key is empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
    async fn generate(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let body = serde_json::json!({
            "model": &self.config.model,
            "max_tokens": self.config.max_tokens,
            "system": system,
            "messages": [{"role": "user", "content": user}],
        });

        debug!("Anthropic request to {} ({} prompt chars)", self.config.model, system.len() + user.len());

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Api(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("Anthropic returned {}: {}", status, detail)));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Api(e.to_string()))?;

        anthropic_text(&json).ok_or(LlmError::EmptyResponse)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Concatenate the text blocks of a Messages API response
fn anthropic_text(json: &serde_json::Value) -> Option<String> {
    let text: String = json["content"]
        .as_array()?
        .iter()
        .filter_map(|block| block["text"].as_str())
        .collect::<Vec<_>>()
        .join("");

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Create a shared OpenAI-compatible backend
pub fn create_backend(config: OpenAIBackendConfig) -> Result<SharedBackend, LlmError> {
    Ok(Arc::new(OpenAIBackend::new(config)?))
}

/// Create a shared Anthropic backend
pub fn create_anthropic_backend(config: AnthropicConfig) -> Result<SharedBackend, LlmError> {
    Ok(Arc::new(AnthropicBackend::new(config)?))
}

/// Create a backend for `provider`.
///
/// `api_key` is required for every provider except `Local`, which needs
/// `base_url` instead.
pub fn build_backend(
    provider: Provider,
    model: &str,
    api_key: Option<&str>,
    base_url: Option<&str>,
) -> Result<SharedBackend, LlmError> {
    let require_key = || {
        api_key.filter(|k| !k.is_empty()).ok_or_else(|| {
            LlmError::Config(format!(
                "{} API key required. Set {}",
                provider,
                provider.key_env().unwrap_or("the API key")
            ))
        })
    };

    match provider {
        Provider::OpenAI => create_backend(OpenAIBackendConfig::openai(require_key()?, model)),
        Provider::OpenRouter => create_backend(OpenAIBackendConfig::openrouter(require_key()?, model)),
        Provider::Anthropic => create_anthropic_backend(AnthropicConfig::new(require_key()?, model)),
        Provider::Local => {
            let url = base_url.ok_or_else(|| {
                LlmError::Config("Local provider requires a base URL (LLM_BASE_URL)".to_string())
            })?;
            create_backend(OpenAIBackendConfig::local(url, model))
        }
    }
}
