// openai_compatible.rs - Chat-completions backend shared by OpenAI and Perplexity
// Any server speaking the OpenAI protocol works here, including local ones
// (LM Studio, Ollama) reached through OPENAI_BASE_URL.

use async_trait::async_trait;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::backends::{
    user_message, BackendConfig, BackendKind, SummarizationError, SummarizerBackend, MAX_OUTPUT_TOKENS,
    REQUEST_TIMEOUT, SUMMARIZATION_PROMPT, TEMPERATURE,
};
use crate::http::{build_client, describe_failure};
use crate::youtube::transcript::BoxError;

// Reasoning models wrap their scratchpad in <think> tags
static THINKING_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<think>.*?</think>").expect("Invalid thinking tag regex pattern")
});

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,                 // Model name
    messages: Vec<ChatMessage<'a>>, // System prompt + transcript
    temperature: f32,               // Sampling temperature
    max_tokens: u32,                // Max tokens to generate
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct OpenAiCompatibleBackend {
    kind: BackendKind,
    config: BackendConfig,
    client: reqwest::Client,
}

impl OpenAiCompatibleBackend {
    pub fn new(kind: BackendKind, config: BackendConfig) -> reqwest::Result<Self> {
        Ok(Self {
            kind,
            config,
            client: build_client(REQUEST_TIMEOUT)?,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    async fn request_completion(&self, transcript: &str, video_id: &str) -> Result<ChatResponse, BoxError> {
        let user = user_message(video_id, transcript);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage { role: "system", content: SUMMARIZATION_PROMPT },
                ChatMessage { role: "user", content: &user },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_OUTPUT_TOKENS,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(describe_failure(response).await.into());
        }

        Ok(response.json::<ChatResponse>().await?)
    }
}

#[async_trait]
impl SummarizerBackend for OpenAiCompatibleBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn summarize(&self, transcript: &str, video_id: &str) -> Result<String, SummarizationError> {
        debug!("🤖 Asking {} ({}) to summarize {}", self.kind, self.config.model, video_id);

        let response = self.request_completion(transcript, video_id).await.map_err(|e| {
            warn!("❌ {} request for {} failed: {}", self.kind, video_id, e);
            SummarizationError::classify(self.kind, &e.to_string())
        })?;

        completion_text(response).ok_or_else(|| SummarizationError::empty_response(self.kind))
    }
}

fn completion_text(response: ChatResponse) -> Option<String> {
    let content = response.choices.into_iter().next()?.message?.content?;
    let summary = strip_thinking(&content);
    if summary.is_empty() {
        None
    } else {
        Some(summary)
    }
}

fn strip_thinking(content: &str) -> String {
    THINKING_TAG_REGEX.replace_all(content, "").trim().to_string()
}
