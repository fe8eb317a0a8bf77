use std::str::FromStr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub gemini_api_key: String,
    pub firebase_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Default conversation window for new chats.
    pub chat_max_messages: usize,
    /// Open chats kept per login session; the oldest is closed beyond this.
    pub max_open_chats: usize,
    pub llm_timeout_secs: u64,
    pub session_idle_ttl_secs: u64,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            firebase_api_key: require_env("FIREBASE_API_KEY")?,
            port: optional_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            chat_max_messages: optional_env("CHAT_MAX_MESSAGES", 20)?,
            max_open_chats: optional_env("MAX_OPEN_CHATS", 10)?,
            llm_timeout_secs: optional_env("LLM_TIMEOUT_SECS", 60)?,
            session_idle_ttl_secs: optional_env("SESSION_IDLE_TTL_SECS", 86_400)?,
            max_upload_bytes: optional_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse_or_default(key, std::env::var(key).ok(), default)
}

fn parse_or_default<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{value}'")),
        _ => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Defaults with placeholder credentials.
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/jobtrack_test".to_string(),
            gemini_api_key: "test-key".to_string(),
            firebase_api_key: "test-key".to_string(),
            port: 8080,
            rust_log: "debug".to_string(),
            chat_max_messages: 20,
            max_open_chats: 10,
            llm_timeout_secs: 5,
            session_idle_ttl_secs: 3600,
            max_upload_bytes: 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_value_uses_default() {
        let port: u16 = parse_or_default("PORT", None, 8080).unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_blank_value_uses_default() {
        let window: usize = parse_or_default("CHAT_MAX_MESSAGES", Some("  ".into()), 20).unwrap();
        assert_eq!(window, 20);
    }

    #[test]
    fn test_present_value_is_parsed() {
        let window: usize = parse_or_default("CHAT_MAX_MESSAGES", Some(" 12 ".into()), 20).unwrap();
        assert_eq!(window, 12);
    }

    #[test]
    fn test_invalid_value_names_the_variable() {
        let err = parse_or_default::<u16>("PORT", Some("eighty".into()), 8080).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
