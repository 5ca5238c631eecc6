//! Gateway: the main event loop connecting the channel, the session store,
//! and the completion provider.

mod scheduler;

pub use scheduler::Scheduler;

use crate::commands::{schedule_status, Command};
use prorab_core::{
    catalog,
    config::ScheduleConfig,
    error::ProrabError,
    history::HistoryEntry,
    message::{IncomingMessage, OutgoingMessage},
    traits::{Channel, Provider},
};
use prorab_memory::SessionStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

/// The central gateway that routes messages between the channel, the
/// provider, and the session store.
pub struct Gateway {
    provider: Arc<dyn Provider>,
    channel: Arc<dyn Channel>,
    sessions: SessionStore,
    scheduler: Scheduler,
    schedule_config: ScheduleConfig,
    /// Tracks senders with an in-flight turn. New messages are buffered here
    /// so a session's read-modify-write never interleaves with itself.
    active_senders: Mutex<HashMap<String, Vec<IncomingMessage>>>,
}

impl Gateway {
    /// Create a new gateway. The scheduler gets its own handle on the
    /// channel so timer callbacks never reach for global state.
    pub fn new(
        provider: Arc<dyn Provider>,
        channel: Arc<dyn Channel>,
        sessions: SessionStore,
        schedule_config: ScheduleConfig,
    ) -> Self {
        let scheduler = Scheduler::new(channel.clone(), schedule_config.clone());
        Self {
            provider,
            channel,
            sessions,
            scheduler,
            schedule_config,
            active_senders: Mutex::new(HashMap::new()),
        }
    }

    /// Run the main event loop.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        info!(
            "Prorab gateway running | provider: {} | channel: {}",
            self.provider.name(),
            self.channel.name(),
        );

        let mut rx: mpsc::Receiver<IncomingMessage> = self
            .channel
            .start()
            .await
            .map_err(|e| anyhow::anyhow!("failed to start channel: {e}"))?;

        self.register_startup_schedule().await;

        loop {
            tokio::select! {
                Some(incoming) = rx.recv() => {
                    let gw = self.clone();
                    tokio::spawn(async move {
                        gw.dispatch_message(incoming).await;
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        self.scheduler.cancel_all().await;
        if let Err(e) = self.channel.stop().await {
            warn!("failed to stop channel: {e}");
        }
        info!("Shutdown complete.");
        Ok(())
    }

    /// Register the daily broadcasts at startup when a target chat is
    /// configured. A missing chat id disables broadcasts only; the rest of
    /// the bot keeps working.
    async fn register_startup_schedule(&self) {
        if !self.schedule_config.enabled {
            info!("broadcast schedule disabled in config");
            return;
        }
        if self.schedule_config.chat_id.is_empty() {
            error!("CHAT_ID is not set, skipping broadcast schedule");
            return;
        }

        let chat_id = self.schedule_config.chat_id.clone();
        match self.scheduler.register(&chat_id).await {
            Ok(count) => {
                info!("startup schedule registered ({count} jobs)");
                self.send_text(&chat_id, catalog::SCHEDULE_STARTED).await;
            }
            Err(e) => {
                error!("startup schedule registration failed: {e}");
            }
        }
    }

    /// Dispatch a message: buffer if the sender has a turn in flight,
    /// otherwise process and then drain the buffer.
    async fn dispatch_message(self: Arc<Self>, incoming: IncomingMessage) {
        let sender_key = format!("{}:{}", incoming.channel, incoming.sender_id);

        {
            let mut active = self.active_senders.lock().await;
            if let Some(buffer) = active.get_mut(&sender_key) {
                buffer.push(incoming);
                info!("buffered message from {sender_key} (turn in progress)");
                return;
            }
            active.insert(sender_key.clone(), Vec::new());
        }

        self.handle_message(incoming).await;

        loop {
            let next = {
                let mut active = self.active_senders.lock().await;
                match active.get_mut(&sender_key) {
                    Some(buffer) if !buffer.is_empty() => Some(buffer.remove(0)),
                    _ => {
                        active.remove(&sender_key);
                        None
                    }
                }
            };

            match next {
                Some(buffered) => {
                    info!("processing buffered message from {sender_key}");
                    self.handle_message(buffered).await;
                }
                None => break,
            }
        }
    }

    /// Route one inbound message: command or conversation flow.
    pub(crate) async fn handle_message(&self, incoming: IncomingMessage) {
        let Some(target) = incoming.reply_target.clone() else {
            warn!("dropping message without reply target");
            return;
        };

        info!(
            "[{}] message from {}",
            incoming.channel,
            incoming.sender_name.as_deref().unwrap_or(&incoming.sender_id)
        );

        match Command::parse(&incoming.text) {
            Some(Command::Start) => {
                let session_id = session_key(&incoming);
                self.sessions.reset(&session_id).await;
                self.send_text(&target, catalog::WELCOME).await;
            }
            Some(Command::Random) => {
                self.send_text(&target, catalog::random_filler()).await;
            }
            Some(Command::ScheduleStatus) => {
                let registered = self.scheduler.is_registered().await;
                let status = schedule_status(&self.schedule_config, registered);
                self.send_text(&target, &status).await;
            }
            Some(Command::ScheduleStart) => match self.scheduler.register(&target).await {
                Ok(count) => {
                    info!("schedule registered on command ({count} jobs)");
                    self.send_text(&target, catalog::SCHEDULE_STARTED).await;
                }
                Err(e) => {
                    error!("schedule registration failed: {e}");
                    self.send_text(&target, catalog::SCHEDULE_FAILED).await;
                }
            },
            Some(Command::Unknown) => {
                self.send_text(&target, catalog::UNKNOWN_COMMAND).await;
            }
            None => {
                self.handle_chat(&incoming, &target).await;
            }
        }
    }

    /// Conversation flow: wait acknowledgment, completion call, history
    /// update, reply.
    ///
    /// Auth/config failures abort before any history mutation. Upstream
    /// failures substitute the fixed fallback reply, so every started turn
    /// appends exactly one user and one assistant record.
    async fn handle_chat(&self, incoming: &IncomingMessage, target: &str) {
        let _ = self.channel.send_typing(target).await;

        let wait_id = match self
            .channel
            .send(OutgoingMessage::text(target, catalog::WAIT))
            .await
        {
            Ok(id) => id,
            Err(e) => {
                warn!("failed to send wait acknowledgment: {e}");
                None
            }
        };

        let session_id = session_key(incoming);
        let history = self.sessions.get(&session_id).await;

        let reply = match self.provider.complete(&history, &incoming.text).await {
            Ok(text) => text,
            Err(e @ (ProrabError::Config(_) | ProrabError::Auth(_))) => {
                warn!("turn aborted, history untouched: {e}");
                self.delete_wait(target, wait_id).await;
                self.send_text(target, catalog::AUTH_ERROR).await;
                return;
            }
            Err(e) => {
                error!("completion failed: {e}");
                catalog::UPSTREAM_ERROR.to_string()
            }
        };

        let mut history = history;
        history.push(HistoryEntry::user(&incoming.text));
        history.push(HistoryEntry::assistant(&reply));
        self.sessions.put(&session_id, history).await;

        self.delete_wait(target, wait_id).await;
        self.send_text(target, &reply).await;
    }

    /// Delete the wait acknowledgment, best effort.
    async fn delete_wait(&self, target: &str, wait_id: Option<i64>) {
        if let Some(id) = wait_id {
            if let Err(e) = self.channel.delete(target, id).await {
                warn!("failed to delete wait message: {e}");
            }
        }
    }

    /// Send a plain text message. Delivery failures are logged, not retried.
    async fn send_text(&self, target: &str, text: &str) {
        let msg = OutgoingMessage::text(target, text);
        if let Err(e) = self.channel.send(msg).await {
            error!("failed to send message: {e}");
        }
    }
}

fn session_key(incoming: &IncomingMessage) -> String {
    format!("{}:{}", incoming.channel, incoming.sender_id)
}
