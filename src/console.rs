// console.rs - Operator commands typed into the bot's terminal
// quit stops the bot; the rest inspect or reset the summary pipeline.

use std::sync::Arc;
use log::{error, info};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::config::load_bot_config;
use crate::youtube::VideoSummarizer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Quit,
    Help,
    Status,
    ClearCache,
    Reload,
    Empty,
    Unknown(String),
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Self {
        let command = line.trim().to_lowercase();
        match command.as_str() {
            "quit" | "q" | "exit" => ConsoleCommand::Quit,
            "help" | "h" => ConsoleCommand::Help,
            "status" => ConsoleCommand::Status,
            "clearcache" | "clear" => ConsoleCommand::ClearCache,
            "reload" => ConsoleCommand::Reload,
            "" => ConsoleCommand::Empty,
            _ => ConsoleCommand::Unknown(command),
        }
    }
}

fn print_help() {
    println!("🤖 Available commands:");
    println!("  quit, q, exit     - Stop the bot gracefully");
    println!("  help, h           - Show this help message");
    println!("  status            - Show cache and backend status");
    println!("  clearcache, clear - Drop every cached summary");
    println!("  reload            - Re-read botconfig.txt and rebuild the AI backend");
}

fn print_status(summarizer: &VideoSummarizer) {
    let cache = summarizer.cache();
    println!("🤖 Bot Status: Running");
    println!("💾 Cached summaries: {} (TTL {}s)", cache.size(), cache.ttl().as_secs());
    match summarizer.backends().current() {
        Ok(backend) => println!("🧠 Backend: {} ({})", backend.kind(), backend.model()),
        Err(e) => println!("⚠️ Backend unavailable: {}", e),
    }
}

fn reload(summarizer: &VideoSummarizer) {
    load_bot_config();
    summarizer.backends().reset();
    match summarizer.backends().current() {
        Ok(backend) => info!("🔄 Backend rebuilt: {} ({})", backend.kind(), backend.model()),
        Err(e) => error!("❌ Backend rebuild failed, summaries will report errors: {}", e),
    }
}

pub async fn handle_command_line(shutdown_tx: mpsc::Sender<String>, summarizer: Arc<VideoSummarizer>) {
    println!("📝 Command line interface active. Type 'help' for available commands.");

    let mut reader = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    loop {
        if stdout.write_all(b"> ").await.is_err() || stdout.flush().await.is_err() {
            error!("❌ Failed to write console prompt");
            break;
        }

        let line = match reader.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("❌ Error reading command line: {}", e);
                break;
            }
        };

        match ConsoleCommand::parse(&line) {
            ConsoleCommand::Quit => {
                println!("⏹️ Shutting down bot...");
                if shutdown_tx.send("quit".to_string()).await.is_err() {
                    error!("❌ Failed to send shutdown signal");
                }
                break;
            }
            ConsoleCommand::Help => print_help(),
            ConsoleCommand::Status => print_status(&summarizer),
            ConsoleCommand::ClearCache => {
                let removed = summarizer.cache().size();
                summarizer.cache().clear();
                println!("🧹 Cleared {} cached summaries", removed);
            }
            ConsoleCommand::Reload => reload(&summarizer),
            ConsoleCommand::Empty => {}
            ConsoleCommand::Unknown(command) => {
                println!("❓ Unknown command: '{}'. Type 'help' for available commands.", command);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ConsoleCommand::parse("  QUIT "), ConsoleCommand::Quit);
        assert_eq!(ConsoleCommand::parse("q"), ConsoleCommand::Quit);
        assert_eq!(ConsoleCommand::parse("h"), ConsoleCommand::Help);
        assert_eq!(ConsoleCommand::parse("status"), ConsoleCommand::Status);
        assert_eq!(ConsoleCommand::parse("clear"), ConsoleCommand::ClearCache);
        assert_eq!(ConsoleCommand::parse("reload"), ConsoleCommand::Reload);
        assert_eq!(ConsoleCommand::parse(""), ConsoleCommand::Empty);
        assert_eq!(ConsoleCommand::parse("Dance"), ConsoleCommand::Unknown("dance".to_string()));
    }
}
