// facts.rs - "Did you know?" trivia shown while a summary is being prepared

use std::time::Duration;
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

use crate::http::build_client;
use crate::youtube::transcript::BoxError;

pub const RANDOM_FACT_URL: &str = "https://uselessfacts.jsph.pl/api/v2/facts/random?language=en";
pub const FACT_TIMEOUT: Duration = Duration::from_secs(2);

/// A source of short trivia. Never fails: no fact is just `None`.
#[async_trait]
pub trait FactSource: Send + Sync {
    async fn random_fact(&self) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct FactResponse {
    text: Option<String>,
}

pub struct RandomFactClient {
    client: reqwest::Client,
    url: String,
}

impl RandomFactClient {
    pub fn new() -> Result<Self, BoxError> {
        Ok(Self {
            client: build_client(FACT_TIMEOUT)?,
            url: RANDOM_FACT_URL.to_string(),
        })
    }

    async fn request_fact(&self) -> Result<Option<String>, BoxError> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(format!("fact service returned {}", response.status()).into());
        }

        let body: FactResponse = response.json().await?;
        Ok(body.text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()))
    }
}

#[async_trait]
impl FactSource for RandomFactClient {
    async fn random_fact(&self) -> Option<String> {
        match self.request_fact().await {
            Ok(fact) => fact,
            Err(e) => {
                debug!("🤷 No fun fact this time: {}", e);
                None
            }
        }
    }
}

/// Asks `source` for a fact but gives up after `limit`.
pub async fn fact_within(source: &dyn FactSource, limit: Duration) -> Option<String> {
    match tokio::time::timeout(limit, source.random_fact()).await {
        Ok(fact) => fact,
        Err(_) => {
            debug!("⏱️ Fun fact lookup timed out after {:?}", limit);
            None
        }
    }
}
