use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::SettingsError;

pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 8000;
pub const DEFAULT_CONTEXT7_URL: &str = "https://mcp.context7.com/mcp";

/// Process-wide configuration, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub context7_url: String,
}

impl Settings {
    /// Load from the process environment, falling back to `~/.env`.
    pub fn load() -> Result<Self, SettingsError> {
        let file = env_file_path()
            .and_then(|path| fs::read_to_string(path).ok())
            .map(|contents| parse_env_file(&contents))
            .unwrap_or_default();

        Self::from_lookup(|key| {
            std::env::var(key)
                .ok()
                .or_else(|| file.get(key).cloned())
        })
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("GEMINI_API_KEY").ok_or(SettingsError::MissingApiKey)?;

        Ok(Self {
            api_key,
            model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: get("GEMINI_TEMPERATURE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: get("GEMINI_MAX_TOKENS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_TOKENS),
            context7_url: get("CONTEXT7_URL").unwrap_or_else(|| DEFAULT_CONTEXT7_URL.to_string()),
        })
    }
}

fn env_file_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".env"))
}

/// Parse `KEY=VALUE` lines. Comments, blank lines and an `export ` prefix are
/// allowed. Quoted values keep everything between the quotes; unquoted values
/// end at a ` #` inline comment.
pub fn parse_env_file(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), env_value(value.trim()).to_string()))
        })
        .collect()
}

fn env_value(raw: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(rest) = raw.strip_prefix(quote) {
            if let Some(end) = rest.find(quote) {
                return &rest[..end];
            }
        }
    }
    if raw.starts_with('#') {
        return "";
    }
    match raw.find(" #") {
        Some(at) => raw[..at].trim_end(),
        None => raw,
    }
}
