use crate::app::notifier::ScheduleEntry;
use crate::bot::types::{Button, ButtonStyle, Keyboard};
use crate::domain::model::Vacation;

pub const CMD_STATUS: &str = "cmd_status";
pub const CMD_HELP: &str = "cmd_help";
pub const CMD_SCHEDULE: &str = "cmd_schedule";
pub const CMD_NOTIFICATIONS: &str = "cmd_notifications";
pub const CMD_SET_CHANNEL: &str = "cmd_set_channel";

const SAMPLE_ROWS: usize = 3;

pub fn menu_keyboard() -> Keyboard {
    vec![
        vec![
            Button::new("📊 Status", CMD_STATUS, ButtonStyle::Primary),
            Button::new("ℹ️ Help", CMD_HELP, ButtonStyle::Primary),
        ],
        vec![
            Button::new("📅 Schedule", CMD_SCHEDULE, ButtonStyle::Primary),
            Button::new("🔔 Notifications", CMD_NOTIFICATIONS, ButtonStyle::Primary),
        ],
        vec![Button::new(
            "📢 Use this chat for notifications",
            CMD_SET_CHANNEL,
            ButtonStyle::Attention,
        )],
    ]
}

pub const GREETING: &str = "👋 Hi! I keep track of the vacation schedule.\n\n\
What I can do:\n\
📎 Read an Excel or CSV file with the vacation schedule\n\
⏰ Remind you about upcoming vacations the number of days you choose\n\
📢 Send the reminders to a chat of your choice\n\n\
👇 Send a schedule file to begin, or pick an action:";

pub const HELP: &str = "ℹ️ Help\n\n\
1. Send the vacation schedule as an Excel (.xlsx) or CSV file.\n   \
I look for the columns: full name, organization, number of days, start date.\n\n\
2. After the upload I ask how many days before a vacation to remind you.\n\n\
3. Commands:\n   \
/start — getting started\n   \
/status — status and settings\n   \
/set_channel — use this chat for notifications\n\n\
4. Reminders are sent once a day.";

pub const UNKNOWN_INPUT: &str = "Send the vacation schedule as an Excel (.xlsx) or CSV file,\nor use the menu:";
pub const ASK_THRESHOLD: &str = "🔔 How many days before a vacation should I remind you?\n\nEnter a number (for example: 7)";
pub const THRESHOLD_INVALID: &str = "❌ Enter a positive whole number (for example: 7)";
pub const FILE_RECEIVED: &str = "📂 File received, processing...";
pub const FILE_INFO_FAILED: &str = "❌ Could not get the file from the server.";
pub const NO_FILE_URL: &str = "❌ The server did not return a download link for the file.";
pub const CHANNEL_SET: &str = "✅ This chat will receive vacation notifications.";
pub const NO_DATA_FOUND: &str = "⚠️ No schedule data found in the file.\n\n\
Make sure the table has the columns:\n\
full name, organization, number of days, start date";
pub const SCHEDULE_NO_DATA: &str = "📅 Schedule\n\nNo vacation data uploaded yet.";
pub const SCHEDULE_NO_THRESHOLD: &str = "📅 Schedule\n\nReminder threshold is not set. Upload a schedule file.";
pub const SCHEDULE_NOTHING_AHEAD: &str = "📅 Schedule\n\nNo upcoming reminders.\nAll vacations have started or were already announced.";

pub fn download_failed(error: &str) -> String {
    format!("❌ Could not download the file: {}", error)
}

pub fn read_failed(error: &str) -> String {
    format!("❌ Could not read the spreadsheet: {}", error)
}

pub fn generic_failure(error: &str) -> String {
    format!("❌ Error: {}", error)
}

pub fn threshold_saved(count: usize, days: u32) -> String {
    format!(
        "✅ Settings saved!\n\n\
         📅 Records loaded: {}\n\
         ⏰ Reminders: {} days before a vacation starts\n\n\
         I will check for upcoming vacations every day.",
        count, days
    )
}

pub fn status(count: usize, notify_days: Option<u32>, notification_chat: Option<&str>, chat_id: &str) -> String {
    let threshold = notify_days
        .map(|d| d.to_string())
        .unwrap_or_else(|| "not set".to_string());
    let channel = match notification_chat {
        None => "not set",
        Some(chat) if chat == chat_id => "this chat",
        Some(_) => "another chat",
    };
    format!(
        "📊 Bot status\n\n\
         📅 Vacation records: {}\n\
         ⏰ Remind: {} days ahead\n\
         📢 Notification chat: {}\n",
        count, threshold, channel
    )
}

pub fn upload_summary(rows: &[Vacation], skipped: usize) -> String {
    let mut sample = rows
        .iter()
        .take(SAMPLE_ROWS)
        .map(|r| format!("• {} — {} ({} days)", r.fio, r.start_date, r.days))
        .collect::<Vec<_>>()
        .join("\n");
    if rows.len() > SAMPLE_ROWS {
        sample.push_str(&format!("\n  ...and {} more", rows.len() - SAMPLE_ROWS));
    }

    let mut header = format!("✅ Loaded {} records", rows.len());
    if skipped > 0 {
        header.push_str(&format!("\n⚠️ Skipped: {} rows", skipped));
    }

    format!("{}\n\nSample:\n{}\n\n{}", header, sample, ASK_THRESHOLD)
}

pub fn schedule(entries: &[ScheduleEntry], notify_days: u32) -> String {
    let mut lines = vec![format!("📅 Reminder schedule ({} days ahead)\n", notify_days)];
    lines.extend(entries.iter().map(|e| {
        format!(
            "• {} — {} (vacation from {})",
            e.notify_date.format("%d.%m.%Y"),
            e.fio,
            e.start_date.format("%d.%m.%Y")
        )
    }));
    lines.join("\n")
}

pub fn reminder(vacation: &Vacation, days_left: i64) -> String {
    format!(
        "⏰ Vacation reminder\n\n\
         👤 {}\n\
         🏢 {}\n\
         📅 Starts: {}\n\
         📅 Ends: {}\n\
         🗓 Days: {}\n\n\
         Days until the vacation: {}",
        vacation.fio,
        vacation.org,
        vacation.start_date,
        vacation.end_date,
        vacation.days,
        days_left
    )
}
