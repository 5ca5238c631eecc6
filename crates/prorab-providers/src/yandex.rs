//! YandexGPT completion provider.
//!
//! Docs: <https://yandex.cloud/docs/foundation-models/concepts/yandexgpt>

use crate::iam::fetch_iam_token;
use async_trait::async_trait;
use prorab_core::{
    catalog,
    config::YandexConfig,
    error::ProrabError,
    history::{History, HistoryEntry, Role},
    traits::Provider,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

const COMPLETION_URL: &str = "https://llm.api.cloud.yandex.net/foundationModels/v1/completion";

/// Fixed instruction prepended to every request.
const SYSTEM_PROMPT: &str = "Ты - полезный помощник и эксперт по разным вопросам.";

/// YandexGPT provider. Exchanges the OAuth token for a fresh IAM token on
/// every call.
pub struct YandexGptProvider {
    client: reqwest::Client,
    config: YandexConfig,
}

impl YandexGptProvider {
    /// Create from config values.
    pub fn from_config(config: YandexConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Model URI composed from the configured folder namespace.
    fn model_uri(&self) -> String {
        format!("gpt://{}/{}", self.config.folder_id, self.config.model)
    }
}

// --- completion API wire types ---

#[derive(Serialize)]
pub(crate) struct CompletionRequest {
    #[serde(rename = "modelUri")]
    pub model_uri: String,
    #[serde(rename = "completionOptions")]
    pub completion_options: CompletionOptions,
    pub messages: Vec<HistoryEntry>,
}

#[derive(Serialize)]
pub(crate) struct CompletionOptions {
    pub temperature: f32,
    #[serde(rename = "maxTokens")]
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionResponse {
    pub result: Option<CompletionResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionResult {
    pub alternatives: Option<Vec<Alternative>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Alternative {
    pub message: Option<AlternativeMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlternativeMessage {
    pub text: Option<String>,
}

/// Build the message list: fixed system instruction, bounded history,
/// then the new user turn.
pub(crate) fn build_messages(history: &History, text: &str) -> Vec<HistoryEntry> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(HistoryEntry {
        role: Role::System,
        text: SYSTEM_PROMPT.to_string(),
    });
    messages.extend(history.entries().iter().cloned());
    messages.push(HistoryEntry::user(text));
    messages
}

/// Extract the first alternative's text from a parsed response.
pub(crate) fn extract_reply(resp: CompletionResponse) -> Option<String> {
    resp.result?
        .alternatives?
        .into_iter()
        .next()?
        .message?
        .text
}

#[async_trait]
impl Provider for YandexGptProvider {
    fn name(&self) -> &str {
        "yandexgpt"
    }

    async fn complete(&self, history: &History, text: &str) -> Result<String, ProrabError> {
        if self.config.folder_id.is_empty() {
            return Err(ProrabError::Config("FOLDER_ID is not set".into()));
        }

        // Fresh token per request. Config/Auth errors abort the turn here,
        // before any history mutation by the caller.
        let iam_token = fetch_iam_token(&self.client, &self.config.oauth_token).await?;

        let body = CompletionRequest {
            model_uri: self.model_uri(),
            completion_options: CompletionOptions {
                temperature: self.config.temperature,
                max_tokens: self.config.max_tokens,
            },
            messages: build_messages(history, text),
        };

        let start = Instant::now();
        debug!("yandexgpt: POST {COMPLETION_URL} model={}", body.model_uri);

        let resp = self
            .client
            .post(COMPLETION_URL)
            .header("Accept", "application/json")
            .header("Authorization", format!("Bearer {iam_token}"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProrabError::Provider(format!("completion request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(ProrabError::Provider(format!(
                "completion endpoint returned {status}: {text}"
            )));
        }

        let raw = resp
            .text()
            .await
            .map_err(|e| ProrabError::Provider(format!("completion body read failed: {e}")))?;

        // An unexpected response shape does not fail the turn; the fixed
        // fallback text is the reply.
        let reply = match serde_json::from_str::<CompletionResponse>(&raw) {
            Ok(parsed) => extract_reply(parsed).unwrap_or_else(|| {
                warn!("yandexgpt: response carried no alternative text");
                catalog::BAD_RESPONSE.to_string()
            }),
            Err(e) => {
                warn!("yandexgpt: response parse failed: {e}");
                catalog::BAD_RESPONSE.to_string()
            }
        };

        debug!(
            "yandexgpt: replied in {}ms ({} chars)",
            start.elapsed().as_millis(),
            reply.len()
        );
        Ok(reply)
    }

    async fn is_available(&self) -> bool {
        if self.config.oauth_token.is_empty() {
            warn!("yandexgpt: no OAuth token configured");
            return false;
        }
        if self.config.folder_id.is_empty() {
            warn!("yandexgpt: no folder id configured");
            return false;
        }
        true
    }
}
