// backends/mod.rs - AI providers that turn a transcript into a Markdown brief
// OpenAI and Perplexity speak the same chat-completions protocol and share one
// implementation; Anthropic has its own message envelope.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use async_trait::async_trait;
use thiserror::Error;

pub mod anthropic;
pub mod factory;
pub mod openai_compatible;

pub use anthropic::AnthropicBackend;
pub use factory::BackendRegistry;
pub use openai_compatible::OpenAiCompatibleBackend;

pub const SUMMARIZATION_PROMPT: &str = include_str!("summarization_prompt.txt");
pub const MAX_OUTPUT_TOKENS: u32 = 1500;
pub const TEMPERATURE: f32 = 0.3;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    OpenAi,
    Anthropic,
    Perplexity,
}

impl BackendKind {
    /// Credential probe order used when no backend is named explicitly.
    pub const DETECTION_ORDER: [BackendKind; 3] = [BackendKind::OpenAi, BackendKind::Anthropic, BackendKind::Perplexity];

    /// Provider name used in user-facing messages.
    pub fn display_name(self) -> &'static str {
        match self {
            BackendKind::OpenAi => "OpenAI",
            BackendKind::Anthropic => "Anthropic",
            BackendKind::Perplexity => "Perplexity",
        }
    }

    pub fn api_key_var(self) -> &'static str {
        match self {
            BackendKind::OpenAi => "OPENAI_API_KEY",
            BackendKind::Anthropic => "ANTHROPIC_API_KEY",
            BackendKind::Perplexity => "PERPLEXITY_API_KEY",
        }
    }

    pub fn model_var(self) -> &'static str {
        match self {
            BackendKind::OpenAi => "OPENAI_MODEL",
            BackendKind::Anthropic => "ANTHROPIC_MODEL",
            BackendKind::Perplexity => "PERPLEXITY_MODEL",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            BackendKind::OpenAi => "gpt-4o-mini",
            BackendKind::Anthropic => "claude-sonnet-4-20250514",
            BackendKind::Perplexity => "llama-3.1-sonar-small-128k-online",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            BackendKind::OpenAi => "https://api.openai.com/v1",
            BackendKind::Anthropic => "https://api.anthropic.com/v1",
            BackendKind::Perplexity => "https://api.perplexity.ai",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(BackendKind::OpenAi),
            "anthropic" => Ok(BackendKind::Anthropic),
            "perplexity" => Ok(BackendKind::Perplexity),
            other => Err(format!("Unknown AI backend type: {}", other)),
        }
    }
}

/// Everything a backend needs to talk to its provider.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummarizationErrorCode {
    RateLimited,
    ApiError,
    Unknown,
}

impl fmt::Display for SummarizationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            SummarizationErrorCode::RateLimited => "RATE_LIMITED",
            SummarizationErrorCode::ApiError => "API_ERROR",
            SummarizationErrorCode::Unknown => "UNKNOWN",
        };
        f.write_str(code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SummarizationError {
    pub code: SummarizationErrorCode,
    pub message: String,
}

impl SummarizationError {
    pub fn api_error(message: impl Into<String>) -> Self {
        Self {
            code: SummarizationErrorCode::ApiError,
            message: message.into(),
        }
    }

    pub fn empty_response(kind: BackendKind) -> Self {
        Self::api_error(format!("{} returned an empty response.", kind))
    }

    /// Sorts a provider failure by the wording of its message. Rate limiting
    /// wins over auth/API failures when both match.
    pub fn classify(kind: BackendKind, raw: &str) -> Self {
        if raw.contains("rate limit") || raw.contains("429") {
            return Self {
                code: SummarizationErrorCode::RateLimited,
                message: format!("Rate limited by {}. Please try again later.", kind),
            };
        }

        if raw.contains("API") || raw.contains("401") || raw.contains("403") {
            return Self::api_error(format!("{} API error: {}", kind, raw));
        }

        Self {
            code: SummarizationErrorCode::Unknown,
            message: format!("{} failed to summarize transcript: {}", kind, raw),
        }
    }
}

/// A provider able to summarize a transcript. Implementations never panic on
/// provider failures; every failure comes back as a `SummarizationError`.
#[async_trait]
pub trait SummarizerBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn model(&self) -> &str;

    async fn summarize(&self, transcript: &str, video_id: &str) -> Result<String, SummarizationError>;
}

pub fn user_message(video_id: &str, transcript: &str) -> String {
    format!(
        "Please summarize the following YouTube video transcript (Video ID: {}):\n\n{}",
        video_id, transcript
    )
}
