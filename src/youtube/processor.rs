// processor.rs - Turns a chat message into YouTube summaries
// For every distinct link: announce work (with a fun fact) unless cached, then
// cache hit -> transcript -> backend -> cache store, replying per link.

use std::sync::Arc;
use async_trait::async_trait;
use log::{debug, info, warn};
use thiserror::Error;
use uuid::Uuid;

use crate::backends::{BackendRegistry, SummarizationError};
use crate::youtube::cache::SummaryCache;
use crate::youtube::facts::{fact_within, FactSource, FACT_TIMEOUT};
use crate::youtube::links::{extract_links, ExtractedLink, VideoId};
use crate::youtube::transcript::{BoxError, TranscriptError, TranscriptFetcher};

/// Where replies go. The chat adapter decides how Markdown is delivered.
#[async_trait]
pub trait Conversation: Send + Sync {
    async fn send_markdown(&self, content: &str) -> Result<(), BoxError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Process at most this many links. `None` and `Some(0)` mean no cap.
    pub max_links: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub found: usize,
    pub processed: usize,
}

#[derive(Debug, Error)]
pub enum VideoError {
    #[error(transparent)]
    Transcript(#[from] TranscriptError),
    #[error(transparent)]
    Summarization(#[from] SummarizationError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSummary {
    pub summary: String,
    pub cached: bool,
}

pub struct VideoSummarizer {
    cache: Arc<SummaryCache>,
    transcripts: TranscriptFetcher,
    backends: Arc<BackendRegistry>,
    facts: Arc<dyn FactSource>,
}

impl VideoSummarizer {
    pub fn new(
        cache: Arc<SummaryCache>,
        transcripts: TranscriptFetcher,
        backends: Arc<BackendRegistry>,
        facts: Arc<dyn FactSource>,
    ) -> Self {
        Self {
            cache,
            transcripts,
            backends,
            facts,
        }
    }

    pub fn cache(&self) -> &Arc<SummaryCache> {
        &self.cache
    }

    pub fn backends(&self) -> &Arc<BackendRegistry> {
        &self.backends
    }

    /// Finds YouTube links in `text` and replies to `conversation` for each
    /// one, in order. Per-link failures become error replies; only a failed
    /// send aborts the run.
    pub async fn process(
        &self,
        text: &str,
        conversation: &dyn Conversation,
        options: ProcessOptions,
    ) -> Result<ProcessOutcome, BoxError> {
        let links = extract_links(text);
        if links.is_empty() {
            return Ok(ProcessOutcome::default());
        }

        let selected: &[ExtractedLink] = match options.max_links {
            Some(max) if max > 0 => &links[..max.min(links.len())],
            _ => &links,
        };

        let run_id = Uuid::new_v4();
        info!("🆔 Summary run {}: {} link(s) found, {} selected", run_id, links.len(), selected.len());

        for link in selected {
            if !self.cache.has(link.video_id.as_str()) {
                let fact = fact_within(self.facts.as_ref(), FACT_TIMEOUT).await;
                conversation.send_markdown(&processing_notice(fact.as_deref())).await?;
            }

            let reply = match self.summarize_video(&link.video_id).await {
                Ok(result) => {
                    info!("✅ [{}] Summary ready for {} (cached: {})", run_id, link.video_id, result.cached);
                    summary_reply(&result, &link.url)
                }
                Err(e) => {
                    warn!("❌ [{}] Could not summarize {}: {}", run_id, link.video_id, e);
                    error_reply(&e.to_string(), &link.url)
                }
            };

            conversation.send_markdown(&reply).await?;
        }

        Ok(ProcessOutcome {
            found: links.len(),
            processed: selected.len(),
        })
    }

    pub async fn summarize_video(&self, video_id: &VideoId) -> Result<VideoSummary, VideoError> {
        if let Some(summary) = self.cache.get(video_id.as_str()) {
            debug!("💾 Cache hit for {}", video_id);
            return Ok(VideoSummary { summary, cached: true });
        }

        let transcript = self.transcripts.fetch(video_id.as_str()).await?;

        let backend = self
            .backends
            .current()
            .map_err(|e| SummarizationError::api_error(e.to_string()))?;
        let summary = backend.summarize(&transcript, video_id.as_str()).await?;

        self.cache.set(video_id.as_str(), summary.clone());
        Ok(VideoSummary { summary, cached: false })
    }
}

pub fn processing_notice(fact: Option<&str>) -> String {
    match fact {
        Some(fact) => format!("Processing video... 🤓\n\n💡 **Did you know?** {}", fact),
        None => "Processing video... 🤓".to_string(),
    }
}

pub fn error_reply(error: &str, url: &str) -> String {
    format!("**Error:** {}\n\n*Video: {}*", error, url)
}

pub fn summary_reply(result: &VideoSummary, url: &str) -> String {
    let cached_label = if result.cached { " (cached)" } else { "" };
    format!("**Video Summary**{}\n\n{}\n\n---\n*Video: {}*", cached_label, result.summary, url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use crate::backends::{BackendKind, SummarizationErrorCode, SummarizerBackend};
    use crate::config::Env;
    use crate::youtube::transcript::{TranscriptSegment, TranscriptSource};

    #[derive(Default)]
    struct RecordingConversation {
        sent: Mutex<Vec<String>>,
    }

    impl RecordingConversation {
        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Conversation for RecordingConversation {
        async fn send_markdown(&self, content: &str) -> Result<(), BoxError> {
            self.sent.lock().unwrap().push(content.to_string());
            Ok(())
        }
    }

    struct BrokenConversation;

    #[async_trait]
    impl Conversation for BrokenConversation {
        async fn send_markdown(&self, _content: &str) -> Result<(), BoxError> {
            Err("channel gone".into())
        }
    }

    #[derive(Default)]
    struct FakeTranscripts {
        failures: HashMap<String, String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TranscriptSource for FakeTranscripts {
        async fn fetch_segments(&self, video_id: &str) -> Result<Vec<TranscriptSegment>, BoxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(raw) = self.failures.get(video_id) {
                return Err(raw.clone().into());
            }
            Ok(vec![TranscriptSegment {
                text: format!("transcript of {}", video_id),
                duration: 3.0,
                offset: 0.0,
            }])
        }
    }

    struct FakeBackend {
        failure: Option<SummarizationError>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SummarizerBackend for FakeBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::OpenAi
        }

        fn model(&self) -> &str {
            "fake"
        }

        async fn summarize(&self, transcript: &str, video_id: &str) -> Result<String, SummarizationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.failure {
                Some(err) => Err(err.clone()),
                None => Ok(format!("S({}): {}", video_id, transcript)),
            }
        }
    }

    struct FixedFact(Option<&'static str>);

    #[async_trait]
    impl FactSource for FixedFact {
        async fn random_fact(&self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    struct Harness {
        summarizer: VideoSummarizer,
        transcripts: Arc<FakeTranscripts>,
        backend: Arc<FakeBackend>,
    }

    fn harness(
        transcripts: FakeTranscripts,
        failure: Option<SummarizationError>,
        fact: Option<&'static str>,
    ) -> Harness {
        let transcripts = Arc::new(transcripts);
        let backend = Arc::new(FakeBackend { failure, calls: AtomicUsize::new(0) });
        let registry = BackendRegistry::with_backend(Env::from_pairs(&[]), backend.clone());
        let summarizer = VideoSummarizer::new(
            Arc::new(SummaryCache::new(Duration::from_secs(3600))),
            TranscriptFetcher::new(transcripts.clone()),
            Arc::new(registry),
            Arc::new(FixedFact(fact)),
        );
        Harness { summarizer, transcripts, backend }
    }

    #[tokio::test]
    async fn test_first_request_then_cached() {
        let h = harness(FakeTranscripts::default(), None, None);
        let text = "check this out https://youtu.be/dQw4w9WgXcQ";

        let first = RecordingConversation::default();
        let outcome = h.summarizer.process(text, &first, ProcessOptions::default()).await.unwrap();
        assert_eq!(outcome, ProcessOutcome { found: 1, processed: 1 });
        assert_eq!(
            first.sent(),
            vec![
                "Processing video... 🤓".to_string(),
                "**Video Summary**\n\nS(dQw4w9WgXcQ): transcript of dQw4w9WgXcQ\n\n---\n*Video: https://youtu.be/dQw4w9WgXcQ*".to_string(),
            ]
        );

        let second = RecordingConversation::default();
        let outcome = h.summarizer.process(text, &second, ProcessOptions::default()).await.unwrap();
        assert_eq!(outcome, ProcessOutcome { found: 1, processed: 1 });
        assert_eq!(second.sent().len(), 1, "no processing notice for a cached video");
        assert!(second.sent()[0].starts_with("**Video Summary** (cached)\n\n"));

        assert_eq!(h.transcripts.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unavailable_video_reports_error() {
        let mut transcripts = FakeTranscripts::default();
        transcripts
            .failures
            .insert("aaaaaaaaaaa".to_string(), "Video unavailable".to_string());
        let h = harness(transcripts, None, None);

        let conversation = RecordingConversation::default();
        let outcome = h
            .summarizer
            .process("https://www.youtube.com/watch?v=aaaaaaaaaaa", &conversation, ProcessOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome, ProcessOutcome { found: 1, processed: 1 });
        let sent = conversation.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(
            sent[1],
            "**Error:** Video is unavailable or private.\n\n*Video: https://www.youtube.com/watch?v=aaaaaaaaaaa*"
        );
        assert_eq!(h.backend.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.summarizer.cache().size(), 0);
    }

    #[tokio::test]
    async fn test_no_links_sends_nothing() {
        let h = harness(FakeTranscripts::default(), None, Some("unused"));
        let conversation = RecordingConversation::default();
        let outcome = h
            .summarizer
            .process("nothing to see here", &conversation, ProcessOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome, ProcessOutcome { found: 0, processed: 0 });
        assert!(conversation.sent().is_empty());
    }

    #[tokio::test]
    async fn test_max_links_caps_in_order() {
        let h = harness(FakeTranscripts::default(), None, None);
        let text = "youtu.be/aaaaaaaaaaa youtu.be/bbbbbbbbbbb youtu.be/ccccccccccc";

        let conversation = RecordingConversation::default();
        let outcome = h
            .summarizer
            .process(text, &conversation, ProcessOptions { max_links: Some(1) })
            .await
            .unwrap();
        assert_eq!(outcome, ProcessOutcome { found: 3, processed: 1 });
        assert!(conversation.sent()[1].contains("S(aaaaaaaaaaa)"));

        let conversation = RecordingConversation::default();
        let outcome = h
            .summarizer
            .process(text, &conversation, ProcessOptions { max_links: Some(0) })
            .await
            .unwrap();
        assert_eq!(outcome, ProcessOutcome { found: 3, processed: 3 });
    }

    #[tokio::test]
    async fn test_summarization_failure_continues_with_next_link() {
        let failure = SummarizationError::classify(BackendKind::OpenAi, "429 Too Many Requests");
        let h = harness(FakeTranscripts::default(), Some(failure), None);

        let conversation = RecordingConversation::default();
        let outcome = h
            .summarizer
            .process("youtu.be/aaaaaaaaaaa and youtu.be/bbbbbbbbbbb", &conversation, ProcessOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome, ProcessOutcome { found: 2, processed: 2 });
        let sent = conversation.sent();
        assert_eq!(sent.len(), 4);
        assert_eq!(
            sent[1],
            "**Error:** Rate limited by OpenAI. Please try again later.\n\n*Video: youtu.be/aaaaaaaaaaa*"
        );
        assert!(sent[3].ends_with("*Video: youtu.be/bbbbbbbbbbb*"));
        assert_eq!(h.summarizer.cache().size(), 0);
    }

    #[tokio::test]
    async fn test_fact_appended_when_available() {
        let h = harness(FakeTranscripts::default(), None, Some("Octopuses have three hearts."));
        let conversation = RecordingConversation::default();
        h.summarizer
            .process("youtu.be/dQw4w9WgXcQ", &conversation, ProcessOptions::default())
            .await
            .unwrap();
        assert_eq!(
            conversation.sent()[0],
            "Processing video... 🤓\n\n💡 **Did you know?** Octopuses have three hearts."
        );
    }

    #[tokio::test]
    async fn test_missing_backend_reported_per_link() {
        let summarizer = VideoSummarizer::new(
            Arc::new(SummaryCache::new(Duration::from_secs(3600))),
            TranscriptFetcher::new(Arc::new(FakeTranscripts::default())),
            Arc::new(BackendRegistry::from_env(Env::from_pairs(&[]))),
            Arc::new(FixedFact(None)),
        );

        let err = summarizer
            .summarize_video(&VideoId::parse("dQw4w9WgXcQ").unwrap())
            .await
            .unwrap_err();
        match err {
            VideoError::Summarization(e) => {
                assert_eq!(e.code, SummarizationErrorCode::ApiError);
                assert_eq!(e.message, "OPENAI_API_KEY environment variable is required for OpenAI backend.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_failure_propagates() {
        let h = harness(FakeTranscripts::default(), None, None);
        let result = h
            .summarizer
            .process("youtu.be/dQw4w9WgXcQ", &BrokenConversation, ProcessOptions::default())
            .await;
        assert!(result.is_err());
    }
}
