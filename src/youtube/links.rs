// links.rs - YouTube link detection in free-form chat text

use std::collections::HashSet;
use std::fmt;
use once_cell::sync::Lazy;
use regex::Regex;

// Watch (with extra query params), youtu.be, /embed/, /v/ and /shorts/ forms,
// optional scheme and www./m. prefix. The id group is deliberately wider than
// 11 chars so over-long ids are seen whole and rejected by VideoId::parse.
static YOUTUBE_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:https?://)?(?:www\.|m\.)?(?:youtube\.com/(?:watch\?(?:[^\s]*?&)?v=|embed/|v/|shorts/)|youtu\.be/)([a-z0-9_-]+)(?:[&?#][^\s]*)?",
    )
    .expect("Invalid YouTube URL regex pattern")
});

static VIDEO_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("Invalid video id regex pattern")
});

/// An 11-character YouTube video identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    pub fn parse(candidate: &str) -> Option<Self> {
        if VIDEO_ID_REGEX.is_match(candidate) {
            Some(Self(candidate.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A matched link: the text as the user wrote it plus its video id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    pub url: String,
    pub video_id: VideoId,
}

/// Finds every distinct YouTube video referenced in `text`, in order of
/// first appearance. Later links to an already-seen video are dropped, as
/// are candidates whose id is not exactly 11 valid characters.
pub fn extract_links(text: &str) -> Vec<ExtractedLink> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    for captures in YOUTUBE_URL_REGEX.captures_iter(text) {
        let (Some(whole), Some(id)) = (captures.get(0), captures.get(1)) else {
            continue;
        };

        let Some(video_id) = VideoId::parse(id.as_str()) else {
            continue;
        };

        if seen.insert(video_id.clone()) {
            links.push(ExtractedLink {
                url: whole.as_str().to_string(),
                video_id,
            });
        }
    }

    links
}
