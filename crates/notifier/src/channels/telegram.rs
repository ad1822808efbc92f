//! Telegram Bot API channel
//!
//! Subscribers opt in by sending `/start` to the bot; they are picked up by
//! `refresh_subscribers` (getUpdates polling) and persisted in a
//! [`SubscriberStore`]. Text alerts fan out through `sendMessage`, recordings
//! through a multipart `sendVideo` upload.

use std::path::Path;
use std::time::Duration;

use contracts::{ContractError, DeliveryReport, NotificationChannel, TelegramConfig};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{NotifierError, NotifierResult};
use crate::store::SubscriberStore;

const CHANNEL_NAME: &str = "telegram";
const START_COMMAND: &str = "/start";

/// Bot API response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Chat ids that sent `/start`, in arrival order, without repeats
pub fn start_requests(updates: &[Update]) -> Vec<i64> {
    let mut chats = Vec::new();
    for message in updates.iter().filter_map(|u| u.message.as_ref()) {
        let is_start = message
            .text
            .as_deref()
            .is_some_and(|t| t.trim() == START_COMMAND);
        if is_start && !chats.contains(&message.chat.id) {
            chats.push(message.chat.id);
        }
    }
    chats
}

/// Offset acknowledging every update in the batch
pub fn next_offset(updates: &[Update]) -> Option<i64> {
    updates.iter().map(|u| u.update_id + 1).max()
}

pub struct TelegramChannel {
    http: Client,
    /// `{api_base}/bot{token}`; never logged
    base_url: String,
    store: SubscriberStore,
    offset: Option<i64>,
    default_caption: String,
    spoiler: bool,
    welcome_message: String,
}

impl TelegramChannel {
    /// Build from config, reading the bot token from `config.token_env`
    pub fn from_config(config: &TelegramConfig) -> NotifierResult<Self> {
        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| NotifierError::MissingToken {
                var: config.token_env.clone(),
            })?;
        Self::new(config, &token)
    }

    pub fn new(config: &TelegramConfig, token: &str) -> NotifierResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let store = SubscriberStore::load(&config.subscribers_path)?;
        info!(
            subscribers = store.len(),
            path = %store.path().display(),
            "Telegram channel ready"
        );

        Ok(Self {
            http,
            base_url: format!("{}/bot{}", config.api_base.trim_end_matches('/'), token),
            store,
            offset: None,
            default_caption: config.caption.clone(),
            spoiler: config.spoiler,
            welcome_message: config.welcome_message.clone(),
        })
    }

    pub fn subscribers(&self) -> &SubscriberStore {
        &self.store
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        request: RequestBuilder,
    ) -> NotifierResult<T> {
        let body: ApiResponse<T> = request.send().await?.json().await?;
        if !body.ok {
            return Err(NotifierError::api(
                method,
                body.description
                    .unwrap_or_else(|| "no description".to_string()),
            ));
        }
        body.result
            .ok_or_else(|| NotifierError::api(method, "response without result"))
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> NotifierResult<()> {
        let request = self
            .http
            .post(self.url("sendMessage"))
            .json(&serde_json::json!({ "chat_id": chat_id, "text": text }));
        self.call::<serde_json::Value>("sendMessage", request)
            .await
            .map(|_| ())
    }

    async fn send_video(
        &self,
        chat_id: i64,
        file_name: &str,
        video: Vec<u8>,
        caption: &str,
    ) -> NotifierResult<()> {
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("has_spoiler", self.spoiler.to_string())
            .text("caption", caption.to_string())
            .part("video", Part::bytes(video).file_name(file_name.to_string()));
        let request = self.http.post(self.url("sendVideo")).multipart(form);
        self.call::<serde_json::Value>("sendVideo", request)
            .await
            .map(|_| ())
    }

    async fn fan_out_text(&self, text: &str) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for &chat_id in self.store.chat_ids() {
            match self.send_message(chat_id, text).await {
                Ok(()) => {
                    debug!(chat_id, "Sent to chat");
                    report.delivered += 1;
                }
                Err(e) => {
                    warn!(chat_id, error = %e, "sendMessage failed");
                    report.failed += 1;
                }
            }
        }
        report
    }

    async fn poll_updates(&self) -> NotifierResult<Vec<Update>> {
        let mut params = serde_json::json!({ "timeout": 0, "allowed_updates": ["message"] });
        if let Some(offset) = self.offset {
            params["offset"] = serde_json::json!(offset);
        }
        let request = self.http.post(self.url("getUpdates")).json(&params);
        self.call("getUpdates", request).await
    }
}

impl NotificationChannel for TelegramChannel {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    #[instrument(name = "telegram_send_text", skip(self, text), fields(subscribers = self.store.len()))]
    async fn send_text(&mut self, text: &str) -> Result<DeliveryReport, ContractError> {
        Ok(self.fan_out_text(text).await)
    }

    #[instrument(
        name = "telegram_send_artifact",
        skip(self, path, caption),
        fields(path = %path.display(), subscribers = self.store.len())
    )]
    async fn send_artifact(
        &mut self,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<DeliveryReport, ContractError> {
        let caption = caption.unwrap_or(&self.default_caption).to_string();

        // Frame-directory recordings cannot be uploaded as a video
        if path.is_dir() {
            let text = format!("{caption} Saved to {}", path.display());
            return Ok(self.fan_out_text(&text).await);
        }

        let video = tokio::fs::read(path)
            .await
            .map_err(|e| NotifierError::from(e).into_contract(CHANNEL_NAME))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "incident.mp4".to_string());

        let mut report = DeliveryReport::default();
        for &chat_id in self.store.chat_ids() {
            match self
                .send_video(chat_id, &file_name, video.clone(), &caption)
                .await
            {
                Ok(()) => {
                    debug!(chat_id, "Sent video to chat");
                    report.delivered += 1;
                }
                Err(e) => {
                    warn!(chat_id, error = %e, "sendVideo failed");
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    #[instrument(name = "telegram_refresh_subscribers", skip(self))]
    async fn refresh_subscribers(&mut self) -> Result<DeliveryReport, ContractError> {
        let updates = self
            .poll_updates()
            .await
            .map_err(|e| e.into_contract(CHANNEL_NAME))?;
        if let Some(offset) = next_offset(&updates) {
            self.offset = Some(offset);
        }

        let fresh: Vec<i64> = start_requests(&updates)
            .into_iter()
            .filter(|&chat_id| self.store.add(chat_id))
            .collect();
        if fresh.is_empty() {
            return Ok(DeliveryReport::default());
        }

        self.store
            .save()
            .map_err(|e| e.into_contract(CHANNEL_NAME))?;
        info!(new = fresh.len(), total = self.store.len(), "New subscribers");

        let mut report = DeliveryReport::default();
        for chat_id in fresh {
            match self.send_message(chat_id, &self.welcome_message).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(chat_id, error = %e, "Welcome message failed");
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.store
            .save()
            .map_err(|e| e.into_contract(CHANNEL_NAME))
    }
}
