use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use vacation_notifier::app::handlers::{Dispatcher, PendingInput};
use vacation_notifier::app::messages;
use vacation_notifier::app::notifier::{send_notifications, Notifier};
use vacation_notifier::app::{polling, run_bot};
use vacation_notifier::bot::types::{BotEvent, BotIdentity, FileInfo, Keyboard};
use vacation_notifier::contract::DataDir;
use vacation_notifier::domain::ports::{BotApi, Storage};
use vacation_notifier::storage::{DataDirStorage, JsonStore};
use vacation_notifier::{AppError, Result};

const CHAT: &str = "hr@example.org";
const ROSTER_CSV: &str = "Vacation schedule 2026\n\
Employee;Company;Days;Start date\n\
Jane Doe;Acme;14;01.07.2026\n\
John Roe;Acme;7;2026-07-03\n\
Broken Row;Acme;5;someday\n";

#[derive(Default)]
struct MockBot {
    sent: Mutex<Vec<(String, String)>>,
    answered: Mutex<Vec<String>>,
    batches: Mutex<VecDeque<Vec<BotEvent>>>,
    files: HashMap<String, FileInfo>,
    downloads: HashMap<String, Vec<u8>>,
}

impl MockBot {
    fn with_file(mut self, file_id: &str, url: &str, body: &str) -> Self {
        self.files.insert(
            file_id.to_string(),
            FileInfo {
                filename: "roster.csv".to_string(),
                size: body.len() as u64,
                url: Some(url.to_string()),
            },
        );
        self.downloads
            .insert(url.to_string(), body.as_bytes().to_vec());
        self
    }

    fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    fn last_text(&self) -> String {
        self.texts().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl BotApi for MockBot {
    async fn self_get(&self) -> Result<BotIdentity> {
        Ok(BotIdentity {
            user_id: "1000".to_string(),
            nick: "vacation_bot".to_string(),
            first_name: "Vacation".to_string(),
        })
    }

    async fn events_get(&self, _last_event_id: u64, _poll_time: u64) -> Result<Vec<BotEvent>> {
        let next = self.batches.lock().unwrap().pop_front();
        match next {
            Some(batch) => Ok(batch),
            None => {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn send_text(&self, chat_id: &str, text: &str, _keyboard: Option<&Keyboard>) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn answer_callback_query(&self, query_id: &str, _text: &str) -> Result<()> {
        self.answered.lock().unwrap().push(query_id.to_string());
        Ok(())
    }

    async fn get_file_info(&self, file_id: &str) -> Result<FileInfo> {
        self.files
            .get(file_id)
            .cloned()
            .ok_or_else(|| AppError::BotApiError {
                method: "files/getInfo".to_string(),
                description: "file not found".to_string(),
            })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.downloads
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::SpreadsheetError {
                message: format!("no such url {}", url),
            })
    }
}

fn text_event(event_id: u64, text: &str) -> BotEvent {
    BotEvent::from_value(json!({
        "eventId": event_id,
        "type": "newMessage",
        "payload": {"msgId": "m1", "chat": {"chatId": CHAT, "type": "private"}, "text": text}
    }))
    .unwrap()
}

fn file_event(event_id: u64, file_id: &str) -> BotEvent {
    BotEvent::from_value(json!({
        "eventId": event_id,
        "type": "newMessage",
        "payload": {
            "msgId": "m2",
            "chat": {"chatId": CHAT, "type": "private"},
            "parts": [{"type": "file", "payload": {"fileId": file_id, "type": "file"}}]
        }
    }))
    .unwrap()
}

fn button_event(event_id: u64, data: &str) -> BotEvent {
    BotEvent::from_value(json!({
        "eventId": event_id,
        "type": "callbackQuery",
        "payload": {
            "queryId": "q-1",
            "callbackData": data,
            "message": {"chat": {"chatId": CHAT, "type": "private"}}
        }
    }))
    .unwrap()
}

struct Harness {
    _temp_dir: TempDir,
    bot: Arc<MockBot>,
    store: Arc<JsonStore<DataDirStorage>>,
    dispatcher: Dispatcher<MockBot, DataDirStorage>,
}

fn harness(bot: MockBot) -> Harness {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = DataDir::verify(temp_dir.path()).unwrap();
    let store = Arc::new(JsonStore::new(DataDirStorage::new(data_dir), "vacation_data.json"));
    let bot = Arc::new(bot);
    let dispatcher = Dispatcher::new(
        bot.clone(),
        store.clone(),
        "latest.xlsx",
        Some("files.example.org".to_string()),
    );
    Harness {
        _temp_dir: temp_dir,
        bot,
        store,
        dispatcher,
    }
}

#[tokio::test]
async fn test_upload_then_threshold_flow() {
    let h = harness(MockBot::default().with_file("f-1", "https://files.example.org/f-1", ROSTER_CSV));

    h.dispatcher.handle_event(file_event(1, "f-1")).await.unwrap();

    let texts = h.bot.texts();
    assert_eq!(texts[0], messages::FILE_RECEIVED);
    assert!(texts[1].contains("Loaded 2 records"), "{}", texts[1]);
    assert!(texts[1].contains("Skipped: 1 rows"), "{}", texts[1]);
    assert!(texts[1].ends_with(messages::ASK_THRESHOLD));
    assert_eq!(h.dispatcher.pending(CHAT), Some(PendingInput::Threshold));

    // the raw upload is kept next to the state file, named after its format
    assert!(h.store.storage().exists("latest.csv").await);
    assert!(!h.store.storage().exists("latest.xlsx").await);
    let data = h.store.load().await;
    assert_eq!(data.vacations_for(CHAT).len(), 2);
    assert_eq!(data.notify_days(CHAT), None);

    h.dispatcher.handle_event(text_event(2, "abc")).await.unwrap();
    assert_eq!(h.bot.last_text(), messages::THRESHOLD_INVALID);
    assert_eq!(h.dispatcher.pending(CHAT), Some(PendingInput::Threshold));

    h.dispatcher.handle_event(text_event(3, "7")).await.unwrap();
    assert_eq!(h.bot.last_text(), messages::threshold_saved(2, 7));
    assert_eq!(h.dispatcher.pending(CHAT), None);
    assert_eq!(h.store.load().await.notify_days(CHAT), Some(7));
}

#[tokio::test]
async fn test_file_link_counts_as_upload() {
    let h = harness(MockBot::default().with_file(
        "unused",
        "https://cdn.files.example.org/get/abc",
        ROSTER_CSV,
    ));

    h.dispatcher
        .handle_event(text_event(1, "here it is https://cdn.files.example.org/get/abc"))
        .await
        .unwrap();

    assert_eq!(h.store.load().await.vacations_for(CHAT).len(), 2);
    assert_eq!(h.dispatcher.pending(CHAT), Some(PendingInput::Threshold));
}

#[tokio::test]
async fn test_pending_threshold_takes_precedence_over_uploads() {
    let h = harness(
        MockBot::default()
            .with_file("f-1", "https://files.example.org/f-1", ROSTER_CSV),
    );

    h.dispatcher
        .handle_event(button_event(1, messages::CMD_NOTIFICATIONS))
        .await
        .unwrap();
    h.dispatcher
        .handle_event(text_event(2, "https://files.example.org/f-1"))
        .await
        .unwrap();
    h.dispatcher.handle_event(file_event(3, "f-1")).await.unwrap();

    assert_eq!(
        h.bot.texts(),
        vec![
            messages::ASK_THRESHOLD.to_string(),
            messages::THRESHOLD_INVALID.to_string(),
            messages::THRESHOLD_INVALID.to_string(),
        ]
    );
    assert_eq!(h.dispatcher.pending(CHAT), Some(PendingInput::Threshold));
    assert!(h.store.load().await.vacations_for(CHAT).is_empty());
    assert!(!h.store.storage().exists("latest.csv").await);
}

#[tokio::test]
async fn test_foreign_link_is_not_downloaded() {
    let h = harness(MockBot::default());

    h.dispatcher
        .handle_event(text_event(1, "https://evil.example.com/roster.xlsx"))
        .await
        .unwrap();

    assert_eq!(h.bot.texts(), vec![messages::UNKNOWN_INPUT.to_string()]);
}

#[tokio::test]
async fn test_unknown_file_reports_failure() {
    let h = harness(MockBot::default());

    h.dispatcher.handle_event(file_event(1, "missing")).await.unwrap();

    assert_eq!(
        h.bot.texts(),
        vec![
            messages::FILE_RECEIVED.to_string(),
            messages::FILE_INFO_FAILED.to_string()
        ]
    );
    assert!(h.store.load().await.vacations_for(CHAT).is_empty());
}

#[tokio::test]
async fn test_file_without_rows_keeps_previous_roster() {
    let h = harness(
        MockBot::default()
            .with_file("good", "https://files.example.org/good", ROSTER_CSV)
            .with_file("empty", "https://files.example.org/empty", "just some text\n"),
    );

    h.dispatcher.handle_event(file_event(1, "good")).await.unwrap();
    h.dispatcher.handle_event(text_event(2, "3")).await.unwrap();
    h.dispatcher.handle_event(file_event(3, "empty")).await.unwrap();

    assert_eq!(h.bot.last_text(), messages::NO_DATA_FOUND);
    assert_eq!(h.store.load().await.vacations_for(CHAT).len(), 2);
}

#[tokio::test]
async fn test_commands() {
    let h = harness(MockBot::default());

    h.dispatcher.handle_event(text_event(1, "/start")).await.unwrap();
    assert_eq!(h.bot.last_text(), messages::GREETING);

    h.dispatcher.handle_event(text_event(2, "/HELP")).await.unwrap();
    assert_eq!(h.bot.last_text(), messages::HELP);

    h.dispatcher.handle_event(text_event(3, "/set_channel")).await.unwrap();
    assert_eq!(h.bot.last_text(), messages::CHANNEL_SET);
    assert_eq!(h.store.load().await.hr_chat_id.as_deref(), Some(CHAT));

    h.dispatcher.handle_event(text_event(4, "/status")).await.unwrap();
    assert_eq!(h.bot.last_text(), messages::status(0, None, Some(CHAT), CHAT));

    h.dispatcher.handle_event(text_event(5, "hello?")).await.unwrap();
    assert_eq!(h.bot.last_text(), messages::UNKNOWN_INPUT);
}

#[tokio::test]
async fn test_buttons_are_acknowledged() {
    let h = harness(MockBot::default());

    h.dispatcher
        .handle_event(button_event(1, messages::CMD_NOTIFICATIONS))
        .await
        .unwrap();

    assert_eq!(*h.bot.answered.lock().unwrap(), vec!["q-1".to_string()]);
    assert_eq!(h.bot.last_text(), messages::ASK_THRESHOLD);
    assert_eq!(h.dispatcher.pending(CHAT), Some(PendingInput::Threshold));

    h.dispatcher
        .handle_event(button_event(2, messages::CMD_SCHEDULE))
        .await
        .unwrap();
    assert_eq!(h.bot.last_text(), messages::SCHEDULE_NO_DATA);

    h.dispatcher
        .handle_event(button_event(3, "something_else"))
        .await
        .unwrap();
    assert_eq!(h.bot.answered.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_schedule_lists_upcoming_reminders() {
    let h = harness(MockBot::default().with_file("f", "https://files.example.org/f", ROSTER_CSV));
    h.dispatcher.handle_event(file_event(1, "f")).await.unwrap();
    h.dispatcher.handle_event(text_event(2, "5")).await.unwrap();

    let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
    h.dispatcher.send_schedule(CHAT, today).await.unwrap();

    let text = h.bot.last_text();
    assert!(text.contains("26.06.2026 — Jane Doe"), "{}", text);
    assert!(text.contains("28.06.2026 — John Roe"), "{}", text);
}

#[tokio::test]
async fn test_reminders_are_sent_once_per_vacation() {
    let h = harness(MockBot::default().with_file("f", "https://files.example.org/f", ROSTER_CSV));
    h.dispatcher.handle_event(file_event(1, "f")).await.unwrap();
    h.dispatcher.handle_event(text_event(2, "3")).await.unwrap();
    let before = h.bot.texts().len();

    let day = NaiveDate::from_ymd_opt(2026, 6, 29).unwrap();
    let sent = send_notifications(h.bot.as_ref(), &h.store, day).await.unwrap();
    assert_eq!(sent, 1);
    assert!(h.bot.last_text().contains("Jane Doe"));

    let next_day = day.succ_opt().unwrap();
    let sent = send_notifications(h.bot.as_ref(), &h.store, next_day).await.unwrap();
    assert_eq!(sent, 1);
    assert!(h.bot.last_text().contains("John Roe"));

    let sent = send_notifications(h.bot.as_ref(), &h.store, next_day).await.unwrap();
    assert_eq!(sent, 0);
    assert_eq!(h.bot.texts().len(), before + 2);
}

#[tokio::test]
async fn test_polling_dispatches_in_order_until_cancelled() {
    let h = harness(MockBot::default());
    h.bot
        .batches
        .lock()
        .unwrap()
        .extend([vec![text_event(4, "/start"), text_event(5, "/help")], vec![text_event(9, "/status")]]);

    let shutdown = CancellationToken::new();
    let poller = {
        let shutdown = shutdown.clone();
        let bot = h.bot.clone();
        let dispatcher = h.dispatcher;
        tokio::spawn(async move { polling::poll_events(bot.as_ref(), &dispatcher, 5, 0, shutdown).await })
    };

    let bot = h.bot.clone();
    tokio::time::timeout(Duration::from_secs(5), async {
        while bot.texts().len() < 3 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    shutdown.cancel();

    let last_event_id = poller.await.unwrap();
    assert_eq!(last_event_id, 9);
    assert_eq!(
        bot.texts(),
        vec![
            messages::GREETING.to_string(),
            messages::HELP.to_string(),
            messages::status(0, None, None, CHAT),
        ]
    );
}

#[tokio::test]
async fn test_run_bot_stops_on_shutdown() {
    let h = harness(MockBot::default());
    let dispatcher = Arc::new(h.dispatcher);
    let notifier = Arc::new(Notifier::new(h.bot.clone(), h.store.clone(), 9));

    let shutdown = CancellationToken::new();
    let stopper = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        stopper.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        run_bot(h.bot.clone(), dispatcher, notifier, 5, shutdown),
    )
    .await
    .unwrap();
    assert!(result.is_ok());
}
