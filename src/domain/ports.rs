use crate::bot::types::{BotEvent, BotIdentity, FileInfo, Keyboard};
use crate::utils::error::Result;
use async_trait::async_trait;

/// File access scoped to the persistent data directory.
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

/// Messenger Bot API as seen by the application.
#[async_trait]
pub trait BotApi: Send + Sync {
    async fn self_get(&self) -> Result<BotIdentity>;
    async fn events_get(&self, last_event_id: u64, poll_time: u64) -> Result<Vec<BotEvent>>;
    async fn send_text(&self, chat_id: &str, text: &str, keyboard: Option<&Keyboard>)
        -> Result<()>;
    async fn answer_callback_query(&self, query_id: &str, text: &str) -> Result<()>;
    async fn get_file_info(&self, file_id: &str) -> Result<FileInfo>;
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}
