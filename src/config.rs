use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    /// Without a key every explanation uses the rule-based text.
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
    pub temperature: f32,
    /// Cap for per-college explanations.
    pub max_tokens: u32,
    /// Cap for streamed chat replies.
    pub chat_max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub colleges_path: Option<PathBuf>,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GROQ_API_KEY").filter(|key| !key.trim().is_empty());

        let provider = ProviderConfig {
            api_key,
            model: lookup("GROQ_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_url: lookup("GROQ_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            temperature: parse_or(&lookup, "GROQ_TEMPERATURE", 0.7)?,
            max_tokens: parse_or(&lookup, "GROQ_MAX_TOKENS", 150)?,
            chat_max_tokens: parse_or(&lookup, "GROQ_CHAT_MAX_TOKENS", 800)?,
        };

        Ok(Self {
            provider,
            colleges_path: lookup("COLLEGES_PATH").map(PathBuf::from),
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value,
        }),
        None => Ok(default),
    }
}
