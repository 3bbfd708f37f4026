// youtube/mod.rs - Link detection, transcripts, caching and the summary pipeline

pub mod cache;
pub mod captions;
pub mod facts;
pub mod links;
pub mod processor;
pub mod transcript;

pub use cache::SummaryCache;
pub use captions::YoutubeCaptionSource;
pub use facts::RandomFactClient;
pub use processor::{Conversation, ProcessOptions, VideoSummarizer};
pub use transcript::{BoxError, TranscriptFetcher};
