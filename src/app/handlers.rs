use crate::app::messages::{self, *};
use crate::app::notifier::upcoming_schedule;
use crate::bot::types::{BotEvent, CallbackQuery, EventKind, Message};
use crate::domain::ports::{BotApi, Storage};
use crate::schedule::parser::{parse_roster, ParsedRoster};
use crate::schedule::reader::{read_grid, sniff_format, SourceFormat};
use crate::storage::JsonStore;
use crate::utils::error::{AppError, Result};
use chrono::{Local, NaiveDate};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingInput {
    Threshold,
}

/// Turns incoming bot events into replies and state changes.
pub struct Dispatcher<B: BotApi, S: Storage> {
    bot: Arc<B>,
    store: Arc<JsonStore<S>>,
    /// Chats that were asked a question and whose next message answers it.
    pending: Mutex<HashMap<String, PendingInput>>,
    upload_file: String,
    file_host: Option<String>,
}

impl<B: BotApi, S: Storage> Dispatcher<B, S> {
    pub fn new(
        bot: Arc<B>,
        store: Arc<JsonStore<S>>,
        upload_file: impl Into<String>,
        file_host: Option<String>,
    ) -> Self {
        Self {
            bot,
            store,
            pending: Mutex::new(HashMap::new()),
            upload_file: upload_file.into(),
            file_host,
        }
    }

    pub fn pending(&self, chat_id: &str) -> Option<PendingInput> {
        self.pending
            .lock()
            .ok()
            .and_then(|p| p.get(chat_id).copied())
    }

    fn set_pending(&self, chat_id: &str, input: Option<PendingInput>) {
        if let Ok(mut pending) = self.pending.lock() {
            match input {
                Some(input) => pending.insert(chat_id.to_string(), input),
                None => pending.remove(chat_id),
            };
        }
    }

    pub async fn handle_event(&self, event: BotEvent) -> Result<()> {
        match event.kind {
            EventKind::NewMessage(message) => self.on_message(message).await,
            EventKind::CallbackQuery(query) => self.on_button(query).await,
            EventKind::Other(kind) => {
                tracing::debug!("Ignoring event {} of type {}", event.event_id, kind);
                Ok(())
            }
        }
    }

    async fn on_message(&self, message: Message) -> Result<()> {
        let chat_id = message.chat.chat_id.as_str();
        let text = message.text.trim();
        tracing::info!("MSG from={:?} text={:?}", chat_id, text);

        // an open question swallows the next message, uploads included
        if self.pending(chat_id) == Some(PendingInput::Threshold) {
            return self.save_threshold(chat_id, text).await;
        }

        if let Some(file_id) = message.file_id() {
            return self.process_file_by_id(chat_id, file_id).await;
        }
        if let Some(url) = self.file_link(text) {
            return self.process_file_by_url(chat_id, &url).await;
        }

        let command = text
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_lowercase();
        match command.as_str() {
            "/start" => {
                self.bot
                    .send_text(chat_id, GREETING, Some(&menu_keyboard()))
                    .await
            }
            "/help" => self.send_help(chat_id).await,
            "/set_channel" => self.set_channel(chat_id).await,
            "/status" => self.send_status(chat_id).await,
            _ => {
                self.bot
                    .send_text(chat_id, UNKNOWN_INPUT, Some(&menu_keyboard()))
                    .await
            }
        }
    }

    async fn on_button(&self, query: CallbackQuery) -> Result<()> {
        let chat_id = query.message.chat.chat_id.as_str();
        tracing::info!(
            "BUTTON from={:?} data={:?} query_id={:?}",
            chat_id,
            query.callback_data,
            query.query_id
        );

        if !query.query_id.is_empty() {
            if let Err(e) = self.bot.answer_callback_query(&query.query_id, "").await {
                tracing::warn!("answer_callback_query failed: {}", e);
            }
        }

        match query.callback_data.as_str() {
            CMD_STATUS => self.send_status(chat_id).await,
            CMD_HELP => self.send_help(chat_id).await,
            CMD_SCHEDULE => self.send_schedule(chat_id, Local::now().date_naive()).await,
            CMD_NOTIFICATIONS => {
                self.set_pending(chat_id, Some(PendingInput::Threshold));
                self.bot.send_text(chat_id, ASK_THRESHOLD, None).await
            }
            CMD_SET_CHANNEL => self.set_channel(chat_id).await,
            other => {
                tracing::debug!("Unknown callback data {:?}", other);
                Ok(())
            }
        }
    }

    /// A message that is a link on the messenger's file host counts as an
    /// upload.
    fn file_link(&self, text: &str) -> Option<String> {
        let host = self.file_host.as_deref()?;
        text.split_whitespace().find_map(|token| {
            let url = Url::parse(token).ok()?;
            let link_host = url.host_str()?;
            let on_host = link_host == host || link_host.ends_with(&format!(".{}", host));
            (matches!(url.scheme(), "http" | "https") && on_host).then(|| token.to_string())
        })
    }

    async fn save_threshold(&self, chat_id: &str, text: &str) -> Result<()> {
        let days = match text.parse::<u32>() {
            Ok(days) if days > 0 => days,
            _ => return self.bot.send_text(chat_id, THRESHOLD_INVALID, None).await,
        };

        let count = self
            .store
            .update(|data| {
                data.set_notify_days(chat_id, days);
                data.vacations_for(chat_id).len()
            })
            .await?;
        self.set_pending(chat_id, None);

        self.bot
            .send_text(
                chat_id,
                &messages::threshold_saved(count, days),
                Some(&menu_keyboard()),
            )
            .await
    }

    async fn send_help(&self, chat_id: &str) -> Result<()> {
        self.bot.send_text(chat_id, HELP, None).await
    }

    async fn set_channel(&self, chat_id: &str) -> Result<()> {
        self.store
            .update(|data| data.hr_chat_id = Some(chat_id.to_string()))
            .await?;
        self.bot.send_text(chat_id, CHANNEL_SET, None).await
    }

    async fn send_status(&self, chat_id: &str) -> Result<()> {
        let data = self.store.load().await;
        let text = messages::status(
            data.vacations_for(chat_id).len(),
            data.notify_days(chat_id),
            data.hr_chat_id.as_deref(),
            chat_id,
        );
        self.bot
            .send_text(chat_id, &text, Some(&menu_keyboard()))
            .await
    }

    pub async fn send_schedule(&self, chat_id: &str, today: NaiveDate) -> Result<()> {
        let data = self.store.load().await;
        let vacations = data.vacations_for(chat_id);

        let text = if vacations.is_empty() {
            SCHEDULE_NO_DATA.to_string()
        } else {
            match data.notify_days(chat_id) {
                None | Some(0) => SCHEDULE_NO_THRESHOLD.to_string(),
                Some(days) => {
                    let entries = upcoming_schedule(vacations, days, today);
                    if entries.is_empty() {
                        SCHEDULE_NOTHING_AHEAD.to_string()
                    } else {
                        messages::schedule(&entries, days)
                    }
                }
            }
        };

        self.bot
            .send_text(chat_id, &text, Some(&menu_keyboard()))
            .await
    }

    async fn process_file_by_id(&self, chat_id: &str, file_id: &str) -> Result<()> {
        self.bot.send_text(chat_id, FILE_RECEIVED, None).await?;

        let info = match self.bot.get_file_info(file_id).await {
            Ok(info) => info,
            Err(e @ AppError::BotApiError { .. }) => {
                tracing::warn!("files/getInfo failed: {}", e);
                return self.bot.send_text(chat_id, FILE_INFO_FAILED, None).await;
            }
            Err(e) => {
                tracing::error!("process_file_by_id error: {}", e);
                return self
                    .bot
                    .send_text(chat_id, &messages::generic_failure(&e.to_string()), None)
                    .await;
            }
        };
        tracing::info!("file info: name={:?} size={}", info.filename, info.size);

        match info.url.filter(|u| !u.is_empty()) {
            Some(url) => self.download_and_parse(chat_id, &url).await,
            None => self.bot.send_text(chat_id, NO_FILE_URL, None).await,
        }
    }

    async fn process_file_by_url(&self, chat_id: &str, url: &str) -> Result<()> {
        self.bot.send_text(chat_id, FILE_RECEIVED, None).await?;
        self.download_and_parse(chat_id, url).await
    }

    async fn download_and_parse(&self, chat_id: &str, url: &str) -> Result<()> {
        let bytes = match self.bot.download(url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                return self
                    .bot
                    .send_text(chat_id, &messages::download_failed(&e.to_string()), None)
                    .await
            }
        };

        let copy_name = upload_copy_name(&self.upload_file, sniff_format(&bytes));
        if let Err(e) = self.store.storage().write_file(&copy_name, &bytes).await {
            tracing::warn!("Could not keep a copy of the upload: {}", e);
        }

        let ParsedRoster { rows, errors } = match parse_upload(bytes).await {
            Ok(parsed) => parsed,
            Err(e) => {
                return self
                    .bot
                    .send_text(chat_id, &messages::read_failed(&e.to_string()), None)
                    .await
            }
        };

        if rows.is_empty() {
            return self.bot.send_text(chat_id, NO_DATA_FOUND, None).await;
        }

        let summary = messages::upload_summary(&rows, errors.len());
        self.store
            .update(|data| data.replace_roster(chat_id, rows))
            .await?;
        self.set_pending(chat_id, Some(PendingInput::Threshold));

        self.bot.send_text(chat_id, &summary, None).await
    }
}

/// Spreadsheet decoding is CPU-bound; keep it off the async workers.
async fn parse_upload(bytes: Vec<u8>) -> Result<ParsedRoster> {
    tokio::task::spawn_blocking(move || read_grid(&bytes).map(|grid| parse_roster(&grid)))
        .await
        .map_err(|e| AppError::SpreadsheetError {
            message: format!("parser task failed: {}", e),
        })?
}

/// Where the raw upload is kept. CSV uploads swap the configured extension
/// for `.csv` so the copy can be reopened as what it is.
fn upload_copy_name(configured: &str, format: SourceFormat) -> String {
    match format {
        SourceFormat::Workbook => configured.to_string(),
        SourceFormat::Csv => Path::new(configured)
            .with_extension("csv")
            .to_string_lossy()
            .into_owned(),
    }
}
