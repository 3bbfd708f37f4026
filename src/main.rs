mod backends;
mod commands;
mod config;
mod console;
mod discord;
mod http;
mod youtube;

use std::sync::Arc;
use log::{debug, error, info, warn};
use serenity::{
    async_trait,
    client::{Client, Context, EventHandler},
    framework::standard::StandardFramework,
    model::{channel::Message, gateway::Ready},
    prelude::{GatewayIntents, TypeMapKey},
};
use tokio::signal;
use tokio::sync::mpsc;

use crate::backends::BackendRegistry;
use crate::commands::help::{welcome_text, WelcomeTracker};
use crate::commands::{should_auto_detect, GENERAL_GROUP};
use crate::config::{cache_ttl, load_bot_config, BotSettings, Env};
use crate::discord::ChannelConversation;
use crate::youtube::cache::SWEEP_INTERVAL;
use crate::youtube::{
    Conversation, ProcessOptions, RandomFactClient, SummaryCache, TranscriptFetcher, VideoSummarizer,
    YoutubeCaptionSource,
};

// TypeMap key for the shared summary pipeline
pub struct SummarizerKey;
impl TypeMapKey for SummarizerKey {
    type Value = Arc<VideoSummarizer>;
}

// TypeMap key for the configured command prefix
pub struct BotPrefix;
impl TypeMapKey for BotPrefix {
    type Value = String;
}

// Event handler: every ordinary message is scanned for YouTube links
struct Handler {
    prefix: String,
    summarizer: Arc<VideoSummarizer>,
    welcomed: WelcomeTracker,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _: Context, ready: Ready) {
        info!("✅ Bot connected as {}! ({} guilds)", ready.user.name, ready.guilds.len());
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        let is_private = msg.guild_id.is_none();
        let conversation = ChannelConversation::new(ctx.http.clone(), msg.channel_id);

        if is_private && self.welcomed.first_contact(msg.author.id).await {
            info!("👋 First DM from {} ({}), sending welcome", msg.author.name, msg.author.id);
            if let Err(e) = conversation.send_markdown(&welcome_text(&self.prefix)).await {
                error!("❌ Failed to send welcome to {}: {}", msg.author.id, e);
            }
        }

        // Commands are handled by the framework
        if !should_auto_detect(&msg.content, is_private, &self.prefix) {
            return;
        }

        match self
            .summarizer
            .process(&msg.content, &conversation, ProcessOptions::default())
            .await
        {
            Ok(outcome) if outcome.found > 0 => {
                info!(
                    "📺 Auto-summarized {}/{} link(s) from {} in {}",
                    outcome.processed, outcome.found, msg.author.name, msg.channel_id
                );
            }
            Ok(_) => {}
            Err(e) => error!("❌ Failed to deliver summary to {}: {}", msg.channel_id, e),
        }
    }
}

fn build_summarizer(env: &Env) -> Result<Arc<VideoSummarizer>, Box<dyn std::error::Error + Send + Sync>> {
    let registry = Arc::new(BackendRegistry::from_env(env.clone()));
    // Fail at startup rather than on the first video
    registry.current()?;

    let ttl = cache_ttl(env);
    let cache = SummaryCache::with_sweeper(ttl, SWEEP_INTERVAL);
    debug!("💾 Summary cache TTL {}s, sweep every {}s", ttl.as_secs(), SWEEP_INTERVAL.as_secs());

    let transcripts = TranscriptFetcher::new(Arc::new(YoutubeCaptionSource::new()?));
    let facts = Arc::new(RandomFactClient::new()?);

    Ok(Arc::new(VideoSummarizer::new(cache, transcripts, registry, facts)))
}

#[tokio::main]
async fn main() {
    // Initialize logger - must be done before any logging calls
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    info!("🚀 YouTube summary bot starting up...");

    if load_bot_config().is_none() {
        warn!("⚠️ No botconfig.txt found; relying on environment variables");
    }

    let env = Env::process();

    let settings = match BotSettings::from_env(&env) {
        Ok(settings) => settings,
        Err(e) => {
            error!("❌ {}", e);
            eprintln!("Create a botconfig.txt file in the project root with: DISCORD_TOKEN=your_token_here and PREFIX=^");
            return;
        }
    };

    let summarizer = match build_summarizer(&env) {
        Ok(summarizer) => summarizer,
        Err(e) => {
            error!("❌ Could not set up the summary pipeline: {}", e);
            return;
        }
    };

    info!("🤖 Starting bot with prefix: '{}'", settings.prefix);

    let prefix = settings.prefix.clone();
    let framework = StandardFramework::new()
        .configure(|c| {
            c.prefix(&prefix)
                .case_insensitivity(true)
                .no_dm_prefix(true)
                .with_whitespace(true)
        })
        .after(|_ctx, msg, command_name, result| {
            Box::pin(async move {
                if let Err(e) = result {
                    error!("❌ Command '{}' failed for user {} ({}): {:?}", command_name, msg.author.name, msg.author.id, e);
                }
            })
        })
        .group(&GENERAL_GROUP);

    let intents = GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT;

    let handler = Handler {
        prefix: settings.prefix.clone(),
        summarizer: summarizer.clone(),
        welcomed: WelcomeTracker::default(),
    };

    let mut client = match Client::builder(&settings.token, intents)
        .event_handler(handler)
        .framework(framework)
        .await
    {
        Ok(client) => client,
        Err(e) => {
            error!("❌ Error creating Discord client: {:?}", e);
            summarizer.cache().stop_sweeper();
            return;
        }
    };

    {
        let mut data = client.data.write().await;
        data.insert::<SummarizerKey>(summarizer.clone());
        data.insert::<BotPrefix>(settings.prefix.clone());
    }

    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<String>(1);
    let cmd_task = tokio::spawn(console::handle_command_line(shutdown_tx, summarizer.clone()));

    info!("🚀 Bot is running... use 'quit' to stop gracefully, or press Ctrl+C");
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("⏹️ Received Ctrl+C, stopping bot gracefully...");
        }
        shutdown_signal = shutdown_rx.recv() => {
            if let Some(signal) = shutdown_signal {
                info!("📡 Received '{}' command, stopping bot gracefully...", signal);
            }
        }
        result = client.start() => {
            if let Err(why) = result {
                error!("❌ Client error: {:?}", why);
            }
        }
    }

    client.shard_manager.lock().await.shutdown_all().await;
    summarizer.cache().stop_sweeper();
    cmd_task.abort();

    info!("✅ Bot stopped");
}
