// commands/mod.rs - Prefix command registry

pub mod help;           // Usage, supported link formats and the DM welcome
pub mod summary;        // Explicit single-link summarization

use serenity::framework::standard::macros::group;

use crate::commands::help::HELP_COMMAND;
use crate::commands::summary::SUMMARY_COMMAND;

#[group]
#[commands(help, summary)]
pub struct General;

// Names and aliases of every command in the General group
pub const COMMAND_NAMES: &[&str] = &["help", "h", "commands", "summary", "sum", "summarize"];

/// Whether the auto-detect handler should scan a message. The framework owns
/// prefixed messages everywhere and, because DMs need no prefix, bare command
/// words in DMs too.
pub fn should_auto_detect(content: &str, is_private: bool, prefix: &str) -> bool {
    if content.starts_with(prefix) {
        return false;
    }

    if is_private {
        if let Some(word) = content.split_whitespace().next() {
            let word = word.to_lowercase();
            if COMMAND_NAMES.contains(&word.as_str()) {
                return false;
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guild_messages_are_scanned_unless_prefixed() {
        assert!(should_auto_detect("look at https://youtu.be/dQw4w9WgXcQ", false, "^"));
        assert!(!should_auto_detect("^sum https://youtu.be/dQw4w9WgXcQ", false, "^"));
        // Without a prefix a guild message is not a command
        assert!(should_auto_detect("sum https://youtu.be/dQw4w9WgXcQ", false, "^"));
    }

    #[test]
    fn test_dm_commands_without_prefix_are_left_to_framework() {
        assert!(!should_auto_detect("sum https://youtu.be/dQw4w9WgXcQ", true, "^"));
        assert!(!should_auto_detect("SUMMARIZE https://youtu.be/dQw4w9WgXcQ", true, "^"));
        assert!(!should_auto_detect("help", true, "^"));
        assert!(!should_auto_detect("^summary https://youtu.be/dQw4w9WgXcQ", true, "^"));
    }

    #[test]
    fn test_dm_links_are_scanned() {
        assert!(should_auto_detect("https://youtu.be/dQw4w9WgXcQ", true, "^"));
        assert!(should_auto_detect("summaries please https://youtu.be/dQw4w9WgXcQ", true, "^"));
        assert!(should_auto_detect("", true, "^"));
    }
}
