pub mod client;
pub mod types;

pub use client::HttpBotClient;
pub use types::{BotEvent, EventKind, Keyboard};
