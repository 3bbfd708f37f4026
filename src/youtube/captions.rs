// captions.rs - Caption scraping straight from youtube.com
// Reads ytInitialPlayerResponse from the watch page, picks a caption track
// (English first) and parses its timedtext XML into segments. Failures are
// phrased so TranscriptError::classify can sort them.

use std::time::Duration;
use async_trait::async_trait;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::http::{build_client, describe_failure, BROWSER_USER_AGENT};
use crate::youtube::transcript::{BoxError, TranscriptSegment, TranscriptSource};

const WATCH_URL: &str = "https://www.youtube.com/watch";
const PLAYER_RESPONSE_MARKER: &str = "ytInitialPlayerResponse = ";

static CAPTION_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<text start="([^"]*)"(?: dur="([^"]*)")?[^>]*>(.*?)</text>"#)
        .expect("Invalid caption line regex pattern")
});

// Only real tag shapes; decoded comparisons like "x < 5 and y > 3" stay
static INNER_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"</?[A-Za-z][A-Za-z0-9]*(?:\s[^<>]*)?>").expect("Invalid tag regex pattern")
});

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Captions {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: Option<String>,
}

pub struct YoutubeCaptionSource {
    client: reqwest::Client,
}

impl YoutubeCaptionSource {
    pub fn new() -> Result<Self, BoxError> {
        Ok(Self {
            client: build_client(Duration::from_secs(30))?,
        })
    }

    async fn fetch_watch_page(&self, video_id: &str) -> Result<String, BoxError> {
        let response = self
            .client
            .get(WATCH_URL)
            .query(&[("v", video_id)])
            .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(format!("Could not get the transcript: watch page returned {}", describe_failure(response).await).into());
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl TranscriptSource for YoutubeCaptionSource {
    async fn fetch_segments(&self, video_id: &str) -> Result<Vec<TranscriptSegment>, BoxError> {
        debug!("🎥 Fetching watch page for {}", video_id);
        let html = self.fetch_watch_page(video_id).await?;

        if html.contains("class=\"g-recaptcha\"") {
            return Err("YouTube is receiving too many requests from this IP and now requires solving a captcha".into());
        }

        let player = extract_player_response(&html)
            .ok_or("Could not get the transcript: player response missing from watch page")?;

        let track = select_caption_track(video_id, &player)?;
        debug!("🔤 Using caption track '{}' for {}", track.language_code.as_deref().unwrap_or("?"), video_id);

        let response = self
            .client
            .get(&track.base_url)
            .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(format!("Could not get the transcript: {}", describe_failure(response).await).into());
        }

        let xml = response.text().await?;
        let segments = parse_caption_xml(&xml);
        info!("✅ Fetched {} caption segments for {}", segments.len(), video_id);
        Ok(segments)
    }
}

// The player response is a JSON object embedded in a script tag; decode exactly
// one value starting at the marker and ignore the trailing script.
fn extract_player_response(html: &str) -> Option<PlayerResponse> {
    let start = html.find(PLAYER_RESPONSE_MARKER)? + PLAYER_RESPONSE_MARKER.len();
    let mut values = serde_json::Deserializer::from_str(&html[start..]).into_iter::<PlayerResponse>();
    values.next()?.ok()
}

fn select_caption_track(video_id: &str, player: &PlayerResponse) -> Result<CaptionTrack, BoxError> {
    if let Some(playability) = &player.playability_status {
        let status = playability.status.as_deref().unwrap_or("UNKNOWN");
        if status != "OK" {
            debug!(
                "🚫 Playability for {} is {}: {}",
                video_id,
                status,
                playability.reason.as_deref().unwrap_or("no reason given")
            );
            return Err(format!("Video unavailable ({})", status).into());
        }
    }

    let tracks = player
        .captions
        .as_ref()
        .and_then(|c| c.player_captions_tracklist_renderer.as_ref())
        .map(|r| r.caption_tracks.as_slice())
        .unwrap_or_default();

    tracks
        .iter()
        .find(|track| {
            track
                .language_code
                .as_deref()
                .map(|code| code.starts_with("en"))
                .unwrap_or(false)
        })
        .or_else(|| tracks.first())
        .cloned()
        .ok_or_else(|| format!("Transcript is disabled on this video ({})", video_id).into())
}

fn parse_caption_xml(xml: &str) -> Vec<TranscriptSegment> {
    CAPTION_LINE_REGEX
        .captures_iter(xml)
        .filter_map(|caps| {
            let offset = caps.get(1)?.as_str().parse::<f64>().unwrap_or(0.0);
            let duration = caps
                .get(2)
                .and_then(|d| d.as_str().parse::<f64>().ok())
                .unwrap_or(0.0);
            let raw = caps.get(3)?.as_str();
            let text = decode_html_entities(&INNER_TAG_REGEX.replace_all(&decode_html_entities(raw), ""));
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

            if text.is_empty() {
                None
            } else {
                Some(TranscriptSegment { text, duration, offset })
            }
        })
        .collect()
}

// Caption XML is often double-escaped (&amp;#39;), so &amp; goes first.
fn decode_html_entities(text: &str) -> String {
    let mut result = text.to_string();

    let entities = [
        ("&amp;", "&"),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&#x27;", "'"),
        ("&nbsp;", " "),
    ];

    for (entity, replacement) in entities.iter() {
        result = result.replace(entity, replacement);
    }

    result
}
