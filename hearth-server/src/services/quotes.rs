//! Daily quote providers
//!
//! Quotes come from an ordered chain: an AI completion service first, then a
//! public quotation service, then a constant that cannot fail. Each provider is
//! tried once per call; there are no retries within a tier.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
const QUOTABLE_URL: &str =
    "https://api.quotable.io/random?tags=motivational,inspirational&maxLength=150";

const QUOTE_PROMPT: &str = "Generate a short, motivational quote (1-2 sentences) suitable for a \
family good morning message. Make it uplifting and inspiring. Keep it under 150 characters. \
Return only the quote text, no additional explanation.";

/// Quote used when every provider fails
pub const FALLBACK_QUOTE: &str = "Have a wonderful day filled with joy and positivity!";

/// Quote provider errors
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("{0} not configured")]
    NotConfigured(&'static str),

    #[error("{service} API error: {status} - {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("{0} API returned empty quote")]
    Empty(&'static str),
}

/// Which tier produced the quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteSource {
    Primary,
    Secondary,
    Fallback,
}

impl QuoteSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteSource::Primary => "primary",
            QuoteSource::Secondary => "secondary",
            QuoteSource::Fallback => "fallback",
        }
    }

    fn for_tier(index: usize) -> Self {
        match index {
            0 => QuoteSource::Primary,
            _ => QuoteSource::Secondary,
        }
    }
}

/// Quote plus provenance and the failures that led to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteResult {
    pub quote: String,
    pub source: QuoteSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Short label used in error trails, e.g. "OpenAI"
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<String, QuoteError>;
}

/// Ordered best-effort chain of providers ending in [`FALLBACK_QUOTE`]
pub struct QuoteService {
    providers: Vec<Arc<dyn QuoteProvider>>,
}

impl QuoteService {
    /// Providers are tried in the given order; the first is the primary tier
    pub fn new(providers: Vec<Arc<dyn QuoteProvider>>) -> Self {
        Self { providers }
    }

    /// Never fails: always yields a non-empty quote
    pub async fn daily_quote(&self) -> QuoteResult {
        let mut failures = Vec::new();

        for (index, provider) in self.providers.iter().enumerate() {
            info!("[quotes] Attempting {}", provider.name());
            match provider.fetch().await {
                Ok(quote) if !quote.trim().is_empty() => {
                    info!("[quotes] Quote retrieved from {}", provider.name());
                    return QuoteResult {
                        quote: quote.trim().to_string(),
                        source: QuoteSource::for_tier(index),
                        error: join_failures(&failures),
                    };
                }
                Ok(_) => {
                    warn!("[quotes] {} returned an empty quote", provider.name());
                    failures.push(format!("{}: returned empty quote", provider.name()));
                }
                Err(e) => {
                    warn!("[quotes] {} failed: {}", provider.name(), e);
                    failures.push(format!("{}: {}", provider.name(), e));
                }
            }
        }

        info!("[quotes] All providers failed, using fallback message");
        QuoteResult {
            quote: FALLBACK_QUOTE.to_string(),
            source: QuoteSource::Fallback,
            error: join_failures(&failures),
        }
    }
}

fn join_failures(failures: &[String]) -> Option<String> {
    (!failures.is_empty()).then(|| failures.join(", "))
}

fn build_client() -> Result<reqwest::Client, QuoteError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()
        .map_err(|e| QuoteError::Network(e.to_string()))
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    error: Option<OpenAiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: Option<String>,
}

/// AI completion provider
pub struct OpenAiQuoteProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
}

impl OpenAiQuoteProvider {
    pub fn new(api_key: Option<String>, model: Option<String>) -> Result<Self, QuoteError> {
        Ok(Self {
            client: build_client()?,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
        })
    }
}

#[async_trait]
impl QuoteProvider for OpenAiQuoteProvider {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn fetch(&self) -> Result<String, QuoteError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(QuoteError::NotConfigured("OPENAI_API_KEY"))?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: QUOTE_PROMPT,
            }],
            max_tokens: 100,
            temperature: 0.8,
        };

        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| QuoteError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<OpenAiErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            return Err(QuoteError::Api {
                service: "OpenAI",
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| QuoteError::Network(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .ok_or(QuoteError::Empty("OpenAI"))
    }
}

#[derive(Debug, Deserialize)]
struct QuotableResponse {
    content: Option<String>,
}

/// Public quotation service
pub struct QuotableQuoteProvider {
    client: reqwest::Client,
}

impl QuotableQuoteProvider {
    pub fn new() -> Result<Self, QuoteError> {
        Ok(Self {
            client: build_client()?,
        })
    }
}

#[async_trait]
impl QuoteProvider for QuotableQuoteProvider {
    fn name(&self) -> &str {
        "Quotable"
    }

    async fn fetch(&self) -> Result<String, QuoteError> {
        let response = self
            .client
            .get(QUOTABLE_URL)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| QuoteError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuoteError::Api {
                service: "Quotable",
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("error").to_string(),
            });
        }

        let body: QuotableResponse = response
            .json()
            .await
            .map_err(|e| QuoteError::Network(e.to_string()))?;

        body.content
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .ok_or(QuoteError::Empty("Quotable"))
    }
}
