//! Configuration for the chat client

use crate::state_machine::LateReplyPolicy;

pub const DEFAULT_API_URL: &str = "https://chatbot.vasanthkumarr.com";

pub const DEFAULT_GREETING: &str = "Hi, I'm Vasanth's AI assistant. Ask me anything about his \
     experience, skills, projects, or education";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Configuration resolved from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Base URL of the chat backend, without trailing slash
    pub api_url: String,
    /// Seed message shown on start and after every clear
    pub greeting: String,
    pub late_replies: LateReplyPolicy,
    pub log_format: LogFormat,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            greeting: DEFAULT_GREETING.to_string(),
            late_replies: LateReplyPolicy::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl ChatConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let api_url = get("FOLIO_CHAT_API_URL")
            .map_or(defaults.api_url, |url| url.trim().trim_end_matches('/').to_string());

        let late_replies = match get("FOLIO_CHAT_LATE_REPLIES") {
            Some(raw) => LateReplyPolicy::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "Unknown FOLIO_CHAT_LATE_REPLIES, using default");
                defaults.late_replies
            }),
            None => defaults.late_replies,
        };

        let log_format = match get("FOLIO_CHAT_LOG_FORMAT").as_deref().map(str::trim) {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Self {
            api_url,
            greeting: get("FOLIO_CHAT_GREETING").unwrap_or(defaults.greeting),
            late_replies,
            log_format,
        }
    }
}
