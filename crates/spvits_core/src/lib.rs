pub mod config;

pub use config::{OneBotConfig, PluginConfig, SpvitsConfig, TempStoreConfig, VitsConfig};

use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

/// A normalized text event delivered by the chat host
#[derive(Debug, Clone)]
pub struct Content {
    pub id: Uuid,
    pub source: String,
    pub author: String,
    pub body: String,
    pub timestamp: i64, // Unix timestamp
}

impl Content {
    pub fn new(source: impl Into<String>, author: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            author: author.into(),
            body: body.into(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// What the plugin hands back to the host for delivery
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    /// A synthesized clip sitting in the temp store
    Voice(PathBuf),
}

impl Reply {
    pub fn text(s: impl Into<String>) -> Self {
        Reply::Text(s.into())
    }
}

/// Delivers replies to wherever the triggering event came from.
///
/// Voice replies for a long LLM answer are pushed one at a time, so each
/// clip reaches the chat before the next segment is synthesized.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, reply: Reply) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_new_sets_fields() {
        let c = Content::new("onebot:private", "10001", "/say 你好");
        assert_eq!(c.source, "onebot:private");
        assert_eq!(c.author, "10001");
        assert_eq!(c.body, "/say 你好");
        assert!(c.timestamp > 0);
    }
}
