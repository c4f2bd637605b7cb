use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One employee's planned vacation, as read from an uploaded roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vacation {
    pub fio: String,
    #[serde(default)]
    pub org: String,
    pub days: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based row number in the source sheet.
    pub row: usize,
    pub fio: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSettings {
    pub notify_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Index into the chat's vacation list.
    pub vacation_id: usize,
    pub sent_at: NaiveDate,
}

/// Everything persisted in the state file, keyed by chat id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub vacations: HashMap<String, Vec<Vacation>>,
    #[serde(default)]
    pub settings: HashMap<String, ChatSettings>,
    #[serde(default)]
    pub hr_chat_id: Option<String>,
    #[serde(default)]
    pub notifications: HashMap<String, Vec<NotificationRecord>>,
}

impl StoreData {
    pub fn vacations_for(&self, chat_id: &str) -> &[Vacation] {
        self.vacations.get(chat_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn notify_days(&self, chat_id: &str) -> Option<u32> {
        self.settings.get(chat_id).and_then(|s| s.notify_days)
    }

    /// Replaces a chat's roster. Reminder history refers to list positions,
    /// so it is reset along with it.
    pub fn replace_roster(&mut self, chat_id: &str, rows: Vec<Vacation>) {
        self.vacations.insert(chat_id.to_string(), rows);
        self.notifications.insert(chat_id.to_string(), Vec::new());
    }

    pub fn set_notify_days(&mut self, chat_id: &str, days: u32) {
        self.settings
            .entry(chat_id.to_string())
            .or_default()
            .notify_days = Some(days);
    }

    pub fn was_notified(&self, chat_id: &str, vacation_id: usize) -> bool {
        self.notifications
            .get(chat_id)
            .is_some_and(|records| records.iter().any(|n| n.vacation_id == vacation_id))
    }

    pub fn record_notification(&mut self, chat_id: &str, vacation_id: usize, sent_at: NaiveDate) {
        self.notifications
            .entry(chat_id.to_string())
            .or_default()
            .push(NotificationRecord {
                vacation_id,
                sent_at,
            });
    }
}
