use anyhow::Result;
use reqwest::Client;
use tracing::debug;

use crate::config::Config;
use crate::providers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

/// One request or response message within a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

pub async fn generate(client: &Client, cfg: &Config, turns: &[Turn]) -> Result<String> {
    debug!(
        model = %cfg.model,
        turn_count = turns.len(),
        "dispatching generate request"
    );
    providers::gemini::generate(client, cfg, turns).await
}
