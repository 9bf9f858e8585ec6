//! Outbound messaging port and its implementations.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::Provider;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to send message to {provider}:{recipient}: {reason}")]
pub struct SendError {
    pub provider: Provider,
    pub recipient: String,
    pub reason: String,
}

/// Delivers a text message to a user's external account.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, provider: Provider, recipient: &str, text: &str) -> Result<(), SendError>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMessageSender;

#[async_trait]
impl MessageSender for LoggingMessageSender {
    async fn send(
        &self,
        provider: Provider,
        recipient: &str,
        text: &str,
    ) -> Result<(), SendError> {
        info!(%provider, recipient, text, "outbound message");
        Ok(())
    }
}

/// A message captured by [`InMemoryMessageSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub provider: Provider,
    pub recipient: String,
    pub text: String,
}

#[derive(Debug, Default)]
struct InMemorySenderState {
    sent: Vec<SentMessage>,
    fail_on_send: bool,
}

/// Recording sender for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMessageSender {
    state: Arc<RwLock<InMemorySenderState>>,
}

impl InMemoryMessageSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following send fail until reset.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.state.write().unwrap().fail_on_send = fail;
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.state.read().unwrap().sent.clone()
    }

    pub fn sent_count(&self) -> usize {
        self.state.read().unwrap().sent.len()
    }
}

#[async_trait]
impl MessageSender for InMemoryMessageSender {
    async fn send(
        &self,
        provider: Provider,
        recipient: &str,
        text: &str,
    ) -> Result<(), SendError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_send {
            return Err(SendError {
                provider,
                recipient: recipient.to_string(),
                reason: "delivery refused".to_string(),
            });
        }

        state.sent.push(SentMessage {
            provider,
            recipient: recipient.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }
}
