use anyhow::{Result, anyhow};
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::Config;
use crate::providers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
        }
    }

    /// Label used when the prompt is flattened into a single text input.
    pub fn label(&self) -> &'static str {
        match self {
            Self::System => "System",
            Self::User => "Human",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

pub async fn chat(client: &Client, cfg: &Config, messages: &[Message]) -> Result<String> {
    let provider = cfg.model_provider.to_ascii_lowercase();

    match provider.as_str() {
        "huggingface" => {
            debug!(
                provider = "huggingface",
                model = %cfg.model,
                task = cfg.model_task.as_str(),
                message_count = messages.len(),
                "dispatching model chat request"
            );
            providers::huggingface::chat(client, cfg, messages).await
        }
        other => {
            warn!(provider = %other, "unsupported model provider configured");
            Err(anyhow!(
                "Unsupported MODEL_PROVIDER='{}'. Supported providers: huggingface.",
                other
            ))
        }
    }
}
