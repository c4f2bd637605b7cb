use crate::bot::types::{BotEvent, BotIdentity, FileInfo, Keyboard};
use crate::domain::ports::BotApi;
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the VK Teams / myteam Bot API.
pub struct HttpBotClient {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpBotClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("vacation-notifier/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// Calls `method` and returns the decoded body. The token travels as a
    /// query parameter, so request URLs are never logged.
    async fn call(&self, method: &str, params: &[(&str, String)], timeout: Duration) -> Result<Value> {
        tracing::debug!("Bot API call: {}", method);

        let response = self
            .client
            .get(self.endpoint(method))
            .query(&[("token", self.token.as_str())])
            .query(params)
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        if body.get("ok").and_then(Value::as_bool) == Some(false) {
            let description = body
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("no description")
                .to_string();
            return Err(AppError::BotApiError {
                method: method.to_string(),
                description,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl BotApi for HttpBotClient {
    async fn self_get(&self) -> Result<BotIdentity> {
        let body = self.call("self/get", &[], REQUEST_TIMEOUT).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn events_get(&self, last_event_id: u64, poll_time: u64) -> Result<Vec<BotEvent>> {
        let params = [
            ("lastEventId", last_event_id.to_string()),
            ("pollTime", poll_time.to_string()),
        ];
        // the server holds the request open for up to poll_time seconds
        let timeout = Duration::from_secs(poll_time) + Duration::from_secs(10);
        let body = self.call("events/get", &params, timeout).await?;

        let events = match body.get("events") {
            Some(Value::Array(items)) => items
                .iter()
                .cloned()
                .filter_map(BotEvent::from_value)
                .collect(),
            _ => Vec::new(),
        };
        Ok(events)
    }

    async fn send_text(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<()> {
        let mut params = vec![("chatId", chat_id.to_string()), ("text", text.to_string())];
        if let Some(keyboard) = keyboard {
            params.push(("inlineKeyboardMarkup", serde_json::to_string(keyboard)?));
        }
        self.call("messages/sendText", &params, REQUEST_TIMEOUT).await?;
        Ok(())
    }

    async fn answer_callback_query(&self, query_id: &str, text: &str) -> Result<()> {
        let params = [("queryId", query_id.to_string()), ("text", text.to_string())];
        self.call("messages/answerCallbackQuery", &params, REQUEST_TIMEOUT)
            .await?;
        Ok(())
    }

    async fn get_file_info(&self, file_id: &str) -> Result<FileInfo> {
        let body = self
            .call("files/getInfo", &[("fileId", file_id.to_string())], REQUEST_TIMEOUT)
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("Downloading uploaded file");
        let bytes = self
            .client
            .get(url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}
