// anthropic.rs - Claude backend on the Messages API

use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::backends::{
    user_message, BackendConfig, BackendKind, SummarizationError, SummarizerBackend, MAX_OUTPUT_TOKENS,
    REQUEST_TIMEOUT, SUMMARIZATION_PROMPT, TEMPERATURE,
};
use crate::http::{build_client, describe_failure};
use crate::youtube::transcript::BoxError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str, // Top-level, not a message
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

pub struct AnthropicBackend {
    config: BackendConfig,
    client: reqwest::Client,
}

impl AnthropicBackend {
    pub fn new(config: BackendConfig) -> reqwest::Result<Self> {
        Ok(Self {
            config,
            client: build_client(REQUEST_TIMEOUT)?,
        })
    }

    async fn request_message(&self, transcript: &str, video_id: &str) -> Result<MessagesResponse, BoxError> {
        let user = user_message(video_id, transcript);
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
            system: SUMMARIZATION_PROMPT,
            messages: vec![Message { role: "user", content: &user }],
        };

        let response = self
            .client
            .post(format!("{}/messages", self.config.base_url.trim_end_matches('/')))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(describe_failure(response).await.into());
        }

        Ok(response.json::<MessagesResponse>().await?)
    }
}

#[async_trait]
impl SummarizerBackend for AnthropicBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Anthropic
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn summarize(&self, transcript: &str, video_id: &str) -> Result<String, SummarizationError> {
        debug!("🤖 Asking Anthropic ({}) to summarize {}", self.config.model, video_id);

        let response = self.request_message(transcript, video_id).await.map_err(|e| {
            warn!("❌ Anthropic request for {} failed: {}", video_id, e);
            SummarizationError::classify(BackendKind::Anthropic, &e.to_string())
        })?;

        let summary = text_blocks(&response);
        if summary.is_empty() {
            return Err(SummarizationError::empty_response(BackendKind::Anthropic));
        }
        Ok(summary)
    }
}

// Tool-use and thinking blocks are skipped; text blocks are joined as-is.
fn text_blocks(response: &MessagesResponse) -> String {
    response
        .content
        .iter()
        .filter(|block| block.block_type == "text")
        .filter_map(|block| block.text.as_deref())
        .collect::<Vec<_>>()
        .join("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> MessagesResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_text_blocks_are_concatenated() {
        let response = parse(
            r####"{"id":"msg_1","type":"message","content":[{"type":"text","text":"### Overview\n"},{"type":"tool_use","id":"t","name":"x","input":{}},{"type":"text","text":"A video."}]}"####,
        );
        assert_eq!(text_blocks(&response), "### Overview\nA video.");
    }

    #[test]
    fn test_no_text_blocks_is_empty() {
        assert_eq!(text_blocks(&parse(r#"{"content":[]}"#)), "");
        assert_eq!(text_blocks(&parse(r#"{"content":[{"type":"thinking","thinking":"hmm"}]}"#)), "");
        assert_eq!(text_blocks(&parse(r#"{}"#)), "");
    }

    #[test]
    fn test_request_keeps_system_out_of_messages() {
        let user = user_message("dQw4w9WgXcQ", "words");
        let request = MessagesRequest {
            model: "claude-sonnet-4-20250514",
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
            system: SUMMARIZATION_PROMPT,
            messages: vec![Message { role: "user", content: &user }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["system"], SUMMARIZATION_PROMPT);
        assert_eq!(value["messages"].as_array().map(|m| m.len()), Some(1));
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["max_tokens"], 1500);
    }
}
