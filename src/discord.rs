// discord.rs - Discord side of the Conversation seam
// Replies are sent to the channel the message came from, split to fit
// Discord's per-message limit.

use std::sync::Arc;
use async_trait::async_trait;
use serenity::http::Http;
use serenity::model::id::ChannelId;

use crate::youtube::{BoxError, Conversation};

pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

pub struct ChannelConversation {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl ChannelConversation {
    pub fn new(http: Arc<Http>, channel_id: ChannelId) -> Self {
        Self { http, channel_id }
    }
}

#[async_trait]
impl Conversation for ChannelConversation {
    async fn send_markdown(&self, content: &str) -> Result<(), BoxError> {
        for chunk in split_message(content, DISCORD_MESSAGE_LIMIT) {
            self.channel_id.say(&*self.http, chunk).await?;
        }
        Ok(())
    }
}

// Split on line boundaries; a single line longer than max_len is cut at the
// last space that fits, or hard at max_len. Lengths are in characters.
pub fn split_message(content: &str, max_len: usize) -> Vec<String> {
    let mut messages = Vec::new();
    let mut current = String::new();

    for line in content.lines() {
        let line_len = line.chars().count();

        if current.chars().count() + line_len + 1 > max_len {
            flush(&mut messages, &mut current);

            if line_len > max_len {
                let mut remaining = line;
                while remaining.chars().count() > max_len {
                    let limit = remaining
                        .char_indices()
                        .nth(max_len)
                        .map(|(idx, _)| idx)
                        .unwrap_or(remaining.len());
                    let split_point = match remaining[..limit].rfind(' ') {
                        Some(idx) if idx > 0 => idx,
                        _ => limit,
                    };
                    messages.push(remaining[..split_point].to_string());
                    remaining = remaining[split_point..].trim_start();
                }
                current.push_str(remaining);
                current.push('\n');
                continue;
            }
        }

        current.push_str(line);
        current.push('\n');
    }

    flush(&mut messages, &mut current);
    messages
}

fn flush(messages: &mut Vec<String>, current: &mut String) {
    let chunk = current.trim();
    if !chunk.is_empty() {
        messages.push(chunk.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_message_is_one_chunk() {
        let text = "**Video Summary**\n\n### Overview\nShort.\n\n---\n*Video: youtu.be/dQw4w9WgXcQ*";
        assert_eq!(split_message(text, DISCORD_MESSAGE_LIMIT), vec![text.to_string()]);
    }

    #[test]
    fn test_splits_on_line_boundaries() {
        let text = (0..300).map(|i| format!("- point number {}", i)).collect::<Vec<_>>().join("\n");
        let chunks = split_message(&text, DISCORD_MESSAGE_LIMIT);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= DISCORD_MESSAGE_LIMIT);
            assert!(chunk.starts_with("- point number"));
        }
        assert_eq!(chunks.join("\n"), text);
    }

    #[test]
    fn test_overlong_line_is_cut_at_spaces() {
        let line = "word ".repeat(30);
        let chunks = split_message(line.trim(), 22);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 22, "chunk too long: {:?}", chunk);
            assert!(!chunk.starts_with(' '));
        }
        assert_eq!(chunks.join(" ").split_whitespace().count(), 30);
    }

    #[test]
    fn test_unbroken_line_is_hard_split() {
        let chunks = split_message(&"x".repeat(45), 20);
        assert_eq!(chunks, vec!["x".repeat(20), "x".repeat(20), "x".repeat(5)]);
    }

    #[test]
    fn test_multibyte_text_does_not_panic() {
        let text = "🤓".repeat(50);
        let chunks = split_message(&text, 16);
        assert!(chunks.iter().all(|c| c.chars().count() <= 16));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_empty_content() {
        assert!(split_message("", DISCORD_MESSAGE_LIMIT).is_empty());
    }
}
