// transcript.rs - Transcript retrieval and error classification
// Wraps a TranscriptSource, flattens its segments into one bounded string and
// maps provider failures onto NoTranscript / PrivateVideo / Unknown.

use std::fmt;
use std::sync::Arc;
use async_trait::async_trait;
use log::{debug, warn};
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub const MAX_TRANSCRIPT_LENGTH: usize = 100_000;
pub const TRUNCATION_MARKER: &str = "... [truncated]";

/// One caption line as returned by a transcript provider.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub text: String,
    pub duration: f64,
    pub offset: f64,
}

/// Anything that can produce the caption segments of a video.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch_segments(&self, video_id: &str) -> Result<Vec<TranscriptSegment>, BoxError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptErrorCode {
    NoTranscript,
    PrivateVideo,
    Unknown,
}

impl fmt::Display for TranscriptErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            TranscriptErrorCode::NoTranscript => "NO_TRANSCRIPT",
            TranscriptErrorCode::PrivateVideo => "PRIVATE_VIDEO",
            TranscriptErrorCode::Unknown => "UNKNOWN",
        };
        f.write_str(code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TranscriptError {
    pub code: TranscriptErrorCode,
    pub message: String,
}

impl TranscriptError {
    fn no_transcript() -> Self {
        Self {
            code: TranscriptErrorCode::NoTranscript,
            message: "Transcript is disabled or unavailable for this video.".to_string(),
        }
    }

    fn private_video() -> Self {
        Self {
            code: TranscriptErrorCode::PrivateVideo,
            message: "Video is unavailable or private.".to_string(),
        }
    }

    /// Best-effort mapping of a provider's free-text error message.
    pub fn classify(raw: &str) -> Self {
        if raw.contains("disabled")
            || raw.contains("not available")
            || raw.contains("Could not get the transcript")
        {
            return Self::no_transcript();
        }

        if raw.contains("private") || raw.contains("unavailable") || raw.contains("Video unavailable") {
            return Self::private_video();
        }

        Self {
            code: TranscriptErrorCode::Unknown,
            message: format!("Failed to fetch transcript: {}", raw),
        }
    }
}

#[derive(Clone)]
pub struct TranscriptFetcher {
    source: Arc<dyn TranscriptSource>,
    max_length: usize,
}

impl TranscriptFetcher {
    pub fn new(source: Arc<dyn TranscriptSource>) -> Self {
        Self {
            source,
            max_length: MAX_TRANSCRIPT_LENGTH,
        }
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub async fn fetch(&self, video_id: &str) -> Result<String, TranscriptError> {
        let segments = match self.source.fetch_segments(video_id).await {
            Ok(segments) => segments,
            Err(e) => {
                let error = TranscriptError::classify(&e.to_string());
                warn!("❌ Transcript fetch for {} failed ({}): {}", video_id, error.code, e);
                return Err(error);
            }
        };

        if segments.is_empty() {
            debug!("📭 Transcript provider returned no segments for {}", video_id);
            return Err(TranscriptError::no_transcript());
        }

        let transcript = segments
            .iter()
            .map(|segment| segment.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let spoken_secs = segments
            .last()
            .map(|last| last.offset + last.duration)
            .unwrap_or_default();
        debug!(
            "📝 Transcript for {}: {} segments, ~{:.0}s spoken, {} chars",
            video_id,
            segments.len(),
            spoken_secs,
            transcript.chars().count()
        );
        Ok(truncate_transcript(transcript, self.max_length))
    }
}

/// Cuts `transcript` to `max_chars` characters plus a marker when it is longer.
pub fn truncate_transcript(mut transcript: String, max_chars: usize) -> String {
    if let Some((byte_idx, _)) = transcript.char_indices().nth(max_chars) {
        transcript.truncate(byte_idx);
        transcript.push_str(TRUNCATION_MARKER);
    }
    transcript
}
