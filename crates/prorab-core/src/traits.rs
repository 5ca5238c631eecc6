use crate::{
    error::ProrabError,
    history::History,
    message::{IncomingMessage, OutgoingMessage},
};
use async_trait::async_trait;

/// Completion backend that turns a conversation into a reply.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Generate a reply for `text` given the bounded conversation `history`.
    ///
    /// `Ok` carries the reply text (which may be a fixed fallback when the
    /// response shape is unexpected). `Err(Auth)`/`Err(Config)` mean the turn
    /// must be aborted before touching history; `Err(Provider)` means the
    /// upstream call failed after the turn started.
    async fn complete(&self, history: &History, text: &str) -> Result<String, ProrabError>;

    /// Check if the provider has everything it needs to be called.
    async fn is_available(&self) -> bool;
}

/// Messaging channel that receives and delivers chat messages.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Start listening for incoming messages.
    /// Returns a receiver that yields incoming messages.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<IncomingMessage>, ProrabError>;

    /// Send a message. Returns the platform message id when the platform
    /// reports one, so the caller can delete the message later.
    async fn send(&self, message: OutgoingMessage) -> Result<Option<i64>, ProrabError>;

    /// Delete a previously sent message. Best effort on platforms without
    /// deletion support.
    async fn delete(&self, _target: &str, _message_id: i64) -> Result<(), ProrabError> {
        Ok(())
    }

    /// Send a typing indicator to show the bot is processing.
    async fn send_typing(&self, _target: &str) -> Result<(), ProrabError> {
        Ok(())
    }

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), ProrabError>;
}
