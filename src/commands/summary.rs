// summary.rs - Explicit summarization command
// `^summary <url>` runs the same pipeline as auto-detection but for the first
// link only, and tells the user when there is nothing to summarize.

use log::info;
use serenity::{
    client::Context,
    framework::standard::{macros::command, Args, CommandResult},
    model::channel::Message,
};
use uuid::Uuid;

use crate::discord::ChannelConversation;
use crate::youtube::{Conversation, ProcessOptions};
use crate::{BotPrefix, SummarizerKey}; // TypeMap keys defined in main.rs

pub const NO_LINK_MESSAGE: &str = "**Error:** No valid YouTube URL found.\n\nPlease provide a valid YouTube link.";

pub fn usage_message(prefix: &str) -> String {
    format!(
        "**Usage:** `{p}summary <YouTube URL>`\n\nExample: `{p}summary https://www.youtube.com/watch?v=dQw4w9WgXcQ`",
        p = prefix
    )
}

#[command]
#[aliases("sum", "summarize")]
/// Summarize a single YouTube video: ^summary <url>
pub async fn summary(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    let command_uuid = Uuid::new_v4();
    info!("📺 Summary command {} from {} ({})", command_uuid, msg.author.name, msg.author.id);

    let (summarizer, prefix) = {
        let data = ctx.data.read().await;
        (data.get::<SummarizerKey>().cloned(), data.get::<BotPrefix>().cloned())
    };
    let summarizer = summarizer.ok_or("Summary pipeline is not initialised")?;

    let input = args.message().trim();
    if input.is_empty() {
        let prefix = prefix.unwrap_or_default();
        msg.reply(ctx, usage_message(&prefix)).await?;
        return Ok(());
    }

    let conversation = ChannelConversation::new(ctx.http.clone(), msg.channel_id);
    let outcome = summarizer
        .process(input, &conversation, ProcessOptions { max_links: Some(1) })
        .await?;

    if outcome.found == 0 {
        conversation.send_markdown(NO_LINK_MESSAGE).await?;
    }

    info!("📺 Summary command {} done: {:?}", command_uuid, outcome);
    Ok(())
}
