//! Completion API client: one recipe block in, the model's answer out.
//!
//! Two implementations sit behind [`Completer`]:
//!
//! * [`HttpCompleter`] speaks the chat-completions wire format directly:
//!
//!   ```text
//!   POST <endpoint>
//!   Authorization: Bearer <key>
//!   {"model": "...", "max_tokens": N,
//!    "messages": [{"role":"system",...}, {"role":"user","content":"<instruction>\n\n<block>"}]}
//!   ```
//!
//!   and reads `choices[0].message.content` from the response.
//!
//! * [`ProviderCompleter`] sends the same two messages through an
//!   `edgequake-llm` provider, for back-ends that are not OpenAI-compatible.
//!
//! Neither retries: a failed block is reported as [`ItemError::Api`] and the
//! stage moves on.

use crate::config::PipelineConfig;
use crate::error::{ItemError, RecipeScanError};
use crate::prompts::{recipe_message, SYSTEM_PROMPT};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Restructures one raw recipe block.
#[async_trait]
pub trait Completer: Send + Sync {
    /// The model's answer, trimmed.
    async fn complete(&self, block: &str) -> Result<String, ItemError>;
}

// ── Wire format ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    messages: [ChatTurn<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatTurn<'a> {
    role: &'static str,
    content: std::borrow::Cow<'a, str>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

// ── HTTP completer ───────────────────────────────────────────────────────────

/// Direct chat-completions client.
#[derive(Clone)]
pub struct HttpCompleter {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    max_tokens: usize,
    system_prompt: String,
}

impl HttpCompleter {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        max_tokens: usize,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
            model: model.into(),
            max_tokens,
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        if config.api_key.is_none() {
            warn!("No API key configured; requests to {} are unauthenticated", config.endpoint);
        }
        let mut completer = Self::new(
            config.endpoint.clone(),
            config.api_key.clone(),
            config.model.clone(),
            config.max_tokens,
        );
        if let Some(ref prompt) = config.system_prompt {
            completer.system_prompt = prompt.clone();
        }
        completer
    }

    fn request_body<'a>(&'a self, block: &str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: [
                ChatTurn {
                    role: "system",
                    content: self.system_prompt.as_str().into(),
                },
                ChatTurn {
                    role: "user",
                    content: recipe_message(block).into(),
                },
            ],
        }
    }
}

impl std::fmt::Debug for HttpCompleter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCompleter")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[async_trait]
impl Completer for HttpCompleter {
    async fn complete(&self, block: &str) -> Result<String, ItemError> {
        let api_err = |detail: String| ItemError::Api { detail };

        let mut request = self.client.post(&self.endpoint).json(&self.request_body(block));
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| api_err(format!("request to {} failed: {}", self.endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_err(format!("HTTP {}: {}", status, body.trim())));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| api_err(format!("malformed response body: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| api_err("response has no choices[0].message.content".into()))?;

        debug!("Completion: {} chars", content.len());
        Ok(content.trim().to_string())
    }
}

// ── Provider completer ───────────────────────────────────────────────────────

/// Completion through an `edgequake-llm` provider.
pub struct ProviderCompleter {
    provider: Arc<dyn LLMProvider>,
    max_tokens: usize,
    system_prompt: String,
}

impl ProviderCompleter {
    pub fn new(provider: Arc<dyn LLMProvider>, max_tokens: usize) -> Self {
        Self {
            provider,
            max_tokens,
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }
}

#[async_trait]
impl Completer for ProviderCompleter {
    async fn complete(&self, block: &str) -> Result<String, ItemError> {
        let messages = vec![
            ChatMessage::system(&self.system_prompt),
            ChatMessage::user(recipe_message(block)),
        ];
        let options = CompletionOptions {
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| ItemError::Api {
                detail: e.to_string(),
            })?;

        debug!(
            "Completion: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content.trim().to_string())
    }
}

/// Pick the completer for `config`, from most-specific to least-specific:
///
/// 1. a pre-built provider (`config.provider`),
/// 2. a named provider (`config.provider_name`), created with `config.model`,
/// 3. the plain HTTP endpoint.
pub fn build_completer(config: &PipelineConfig) -> Result<Arc<dyn Completer>, RecipeScanError> {
    let provider = if let Some(ref provider) = config.provider {
        Some(Arc::clone(provider))
    } else if let Some(ref name) = config.provider_name {
        Some(
            ProviderFactory::create_llm_provider(name, &config.model).map_err(|e| {
                RecipeScanError::ProviderNotConfigured {
                    provider: name.clone(),
                    hint: e.to_string(),
                }
            })?,
        )
    } else {
        None
    };

    Ok(match provider {
        Some(provider) => {
            let mut completer = ProviderCompleter::new(provider, config.max_tokens);
            if let Some(ref prompt) = config.system_prompt {
                completer = completer.with_system_prompt(prompt.clone());
            }
            Arc::new(completer)
        }
        None => Arc::new(HttpCompleter::from_config(config)),
    })
}
