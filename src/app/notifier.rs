use crate::app::messages;
use crate::domain::model::{StoreData, Vacation};
use crate::domain::ports::{BotApi, Storage};
use crate::storage::JsonStore;
use crate::utils::error::Result;
use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const RETRY_AFTER_ERROR: std::time::Duration = std::time::Duration::from_secs(3600);
const SCHEDULE_PREVIEW: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub notify_date: NaiveDate,
    pub start_date: NaiveDate,
    pub fio: String,
}

/// Reminder dates that are still ahead, soonest first.
pub fn upcoming_schedule(
    vacations: &[Vacation],
    notify_days: u32,
    today: NaiveDate,
) -> Vec<ScheduleEntry> {
    let mut entries: Vec<ScheduleEntry> = vacations
        .iter()
        .map(|v| ScheduleEntry {
            notify_date: v.start_date - Duration::days(i64::from(notify_days)),
            start_date: v.start_date,
            fio: v.fio.clone(),
        })
        .filter(|e| e.notify_date >= today)
        .collect();
    entries.sort_by_key(|e| e.notify_date);
    entries.truncate(SCHEDULE_PREVIEW);
    entries
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueReminder {
    pub chat_id: String,
    pub vacation_id: usize,
    pub vacation: Vacation,
    pub days_left: i64,
}

/// Vacations starting within each chat's threshold that have not been
/// announced since the roster was uploaded.
pub fn due_reminders(data: &StoreData, today: NaiveDate) -> Vec<DueReminder> {
    let mut due = Vec::new();

    for (chat_id, settings) in &data.settings {
        let Some(notify_days) = settings.notify_days.filter(|d| *d > 0) else {
            continue;
        };

        for (vacation_id, vacation) in data.vacations_for(chat_id).iter().enumerate() {
            let days_left = (vacation.start_date - today).num_days();
            if (0..=i64::from(notify_days)).contains(&days_left)
                && !data.was_notified(chat_id, vacation_id)
            {
                due.push(DueReminder {
                    chat_id: chat_id.clone(),
                    vacation_id,
                    vacation: vacation.clone(),
                    days_left,
                });
            }
        }
    }

    due.sort_by(|a, b| {
        a.chat_id
            .cmp(&b.chat_id)
            .then(a.vacation_id.cmp(&b.vacation_id))
    });
    due
}

/// Sends today's reminders and records them. The store is only written when
/// at least one reminder went out.
pub async fn send_notifications<B, S>(
    bot: &B,
    store: &JsonStore<S>,
    today: NaiveDate,
) -> Result<usize>
where
    B: BotApi + ?Sized,
    S: Storage,
{
    let snapshot = store.load().await;
    let mut sent = Vec::new();

    for reminder in due_reminders(&snapshot, today) {
        let text = messages::reminder(&reminder.vacation, reminder.days_left);
        match bot.send_text(&reminder.chat_id, &text, None).await {
            Ok(()) => sent.push(reminder),
            Err(e) => tracing::error!(
                "Failed to send notification to {}: {}",
                reminder.chat_id,
                e
            ),
        }
    }

    if sent.is_empty() {
        tracing::info!("Notifier: no notifications due today");
        return Ok(0);
    }

    let recorded = store
        .update(|data| {
            let mut recorded = 0;
            for reminder in &sent {
                // a roster uploaded while we were sending shifts the indices
                let unchanged = data
                    .vacations_for(&reminder.chat_id)
                    .get(reminder.vacation_id)
                    == Some(&reminder.vacation);
                if unchanged {
                    data.record_notification(&reminder.chat_id, reminder.vacation_id, today);
                    recorded += 1;
                }
            }
            recorded
        })
        .await?;

    tracing::info!("Sent {} notification(s), recorded {}", sent.len(), recorded);
    Ok(sent.len())
}

/// Next occurrence of `hour:00` strictly after `now`.
pub fn next_run_after(now: NaiveDateTime, hour: u32) -> NaiveDateTime {
    let at = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let today_run = now.date().and_time(at);
    if now >= today_run {
        today_run + Duration::days(1)
    } else {
        today_run
    }
}

/// Daily reminder pass at a fixed local hour.
pub struct Notifier<B: BotApi, S: Storage> {
    bot: Arc<B>,
    store: Arc<JsonStore<S>>,
    hour: u32,
}

impl<B: BotApi, S: Storage> Notifier<B, S> {
    pub fn new(bot: Arc<B>, store: Arc<JsonStore<S>>, hour: u32) -> Self {
        Self { bot, store, hour }
    }

    pub async fn run(&self, shutdown: CancellationToken) {
        tracing::info!("Notifier loop started");

        loop {
            let now = Local::now().naive_local();
            let next_run = next_run_after(now, self.hour);
            let wait = (next_run - now).to_std().unwrap_or_default();
            tracing::info!(
                "Notifier: next run at {} (in {:.1}h)",
                next_run,
                wait.as_secs_f64() / 3600.0
            );

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }

            let today = Local::now().date_naive();
            if let Err(e) = send_notifications(self.bot.as_ref(), &self.store, today).await {
                tracing::error!("Notifier loop error: {}", e);
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(RETRY_AFTER_ERROR) => {}
                }
            }
        }

        tracing::info!("Notifier loop stopped");
    }
}
