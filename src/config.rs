// config.rs - Bot and summarizer configuration
// Settings come from the process environment. botconfig.txt (KEY=VALUE lines)
// is an optional convenience: every pair found there is exported into the
// environment before anything else reads it.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use log::{debug, info, warn};

pub const DEFAULT_CACHE_TTL_MS: u64 = 3_600_000;
pub const DEFAULT_PREFIX: &str = "^";

const BOT_CONFIG_PATHS: [&str; 4] = [
    "botconfig.txt",
    "../botconfig.txt",
    "../../botconfig.txt",
    "src/botconfig.txt",
];

/// Read-only view over configuration variables.
///
/// Production code wraps the process environment; tests build one from a
/// fixed list of pairs so they never touch global state.
#[derive(Clone)]
pub struct Env {
    lookup: Arc<dyn Fn(&str) -> Option<String> + Send + Sync>,
}

impl Env {
    pub fn process() -> Self {
        Self {
            lookup: Arc::new(|key| env::var(key).ok()),
        }
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            lookup: Arc::new(move |key| vars.get(key).cloned()),
        }
    }

    /// Returns the trimmed value, treating empty strings as unset.
    pub fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// Cache TTL from `YOUTUBE_CACHE_TTL_MS`; anything that is not a positive
/// integer falls back to one hour.
pub fn cache_ttl(env: &Env) -> Duration {
    let ms = env
        .get("YOUTUBE_CACHE_TTL_MS")
        .and_then(|raw| match raw.parse::<u64>() {
            Ok(ms) if ms > 0 => Some(ms),
            _ => {
                warn!("⚠️ Ignoring invalid YOUTUBE_CACHE_TTL_MS value '{}'", raw);
                None
            }
        })
        .unwrap_or(DEFAULT_CACHE_TTL_MS);
    Duration::from_millis(ms)
}

// Parse KEY=VALUE lines, skipping blanks and # comments
pub fn parse_config_lines(content: &str) -> HashMap<String, String> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut config = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(equals_pos) = line.find('=') {
            let key = line[..equals_pos].trim().to_string();
            let value = line[equals_pos + 1..].trim().to_string();
            if !key.is_empty() {
                config.insert(key, value);
            }
        }
    }

    config
}

/// Loads botconfig.txt from the first location that has one and exports
/// its pairs into the process environment. Returns the path used, or None
/// when no file exists (the environment is then used as-is).
pub fn load_bot_config() -> Option<&'static str> {
    for config_path in &BOT_CONFIG_PATHS {
        match fs::read_to_string(config_path) {
            Ok(content) => {
                let config = parse_config_lines(&content);
                for (key, value) in &config {
                    env::set_var(key, value);
                }
                info!("✅ Configuration loaded from {} ({} keys)", config_path, config.len());
                return Some(config_path);
            }
            Err(_) => continue,
        }
    }

    debug!("📄 No botconfig.txt found, using process environment only");
    None
}

/// Discord connection settings.
#[derive(Debug, Clone)]
pub struct BotSettings {
    pub token: String,
    pub prefix: String,
}

impl BotSettings {
    pub fn from_env(env: &Env) -> Result<Self, String> {
        let token = env
            .get("DISCORD_TOKEN")
            .ok_or_else(|| "DISCORD_TOKEN is not set (environment or botconfig.txt)".to_string())?;

        if token == "YOUR_BOT_TOKEN_HERE" {
            return Err("DISCORD_TOKEN is set to the placeholder value".to_string());
        }

        let prefix = env.get("PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string());
        Ok(Self { token, prefix })
    }
}
