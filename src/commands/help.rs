// help.rs - Help Command Module

use std::collections::HashSet;
use serenity::{
    client::Context,
    framework::standard::{macros::command, CommandResult},
    model::{channel::Message, id::UserId},
};
use tokio::sync::Mutex;

use crate::BotPrefix; // TypeMap key defined in main.rs
use crate::config::DEFAULT_PREFIX;

pub fn help_text(prefix: &str) -> String {
    format!(
        r#"**📺 YouTube Summary Bot**

Paste a YouTube link in any message and I'll reply with a summary of the video.

**📝 Commands:**
• `{p}summary <url>` - Summarize one video (aliases: `{p}sum`, `{p}summarize`)
• `{p}help` - Show this help message

**🔗 Supported links:**
• `youtube.com/watch?v=...`
• `youtu.be/...`
• `youtube.com/shorts/...`
• `youtube.com/embed/...` and `youtube.com/v/...`

Summaries are cached for a while, so asking again for the same video is instant."#,
        p = prefix
    )
}

pub fn welcome_text(prefix: &str) -> String {
    format!(
        r#"**Welcome to the YouTube Summary Bot!**

I can summarize YouTube videos for you:
• Just paste any YouTube link and I'll summarize it
• Or use `{p}summary <URL>` for explicit requests
• Type `{p}help` for more info"#,
        p = prefix
    )
}

// Users who already got the DM welcome; in memory, so a restart greets again
#[derive(Default)]
pub struct WelcomeTracker {
    greeted: Mutex<HashSet<UserId>>,
}

impl WelcomeTracker {
    /// True the first time a user is seen, false afterwards
    pub async fn first_contact(&self, user: UserId) -> bool {
        self.greeted.lock().await.insert(user)
    }
}

#[command]
#[aliases("h", "commands")]
/// Display help information for the bot
pub async fn help(ctx: &Context, msg: &Message) -> CommandResult {
    let prefix = {
        let data = ctx.data.read().await;
        data.get::<BotPrefix>().cloned()
    }
    .unwrap_or_else(|| DEFAULT_PREFIX.to_string());

    msg.channel_id.say(&ctx.http, help_text(&prefix)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_text_uses_prefix() {
        let text = help_text("!");
        assert!(text.contains("`!summary <url>`"));
        assert!(text.contains("`!help`"));
        assert!(!text.contains('^'));
    }

    #[test]
    fn test_welcome_text_uses_prefix() {
        let text = welcome_text("!");
        assert!(text.starts_with("**Welcome"));
        assert!(text.contains("`!summary <URL>`"));
        assert!(text.contains("`!help`"));
    }

    #[tokio::test]
    async fn test_welcome_only_on_first_contact() {
        let tracker = WelcomeTracker::default();
        assert!(tracker.first_contact(UserId(42)).await);
        assert!(!tracker.first_contact(UserId(42)).await);
        assert!(tracker.first_contact(UserId(7)).await);
    }
}
