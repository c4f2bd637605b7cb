use crate::app::handlers::Dispatcher;
use crate::domain::ports::{BotApi, Storage};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const IDLE_BETWEEN_POLLS: Duration = Duration::from_millis(50);
const BACKOFF_AFTER_ERROR: Duration = Duration::from_secs(5);

/// Long-polls the Bot API and hands every event to the dispatcher, one at a
/// time and in order. Returns the last event id seen.
pub async fn poll_events<B: BotApi, S: Storage>(
    bot: &B,
    dispatcher: &Dispatcher<B, S>,
    poll_time: u64,
    start_after: u64,
    shutdown: CancellationToken,
) -> u64 {
    tracing::info!("Polling loop started");
    let mut last_event_id = start_after;

    loop {
        let batch = tokio::select! {
            _ = shutdown.cancelled() => break,
            batch = bot.events_get(last_event_id, poll_time) => batch,
        };

        let pause = match batch {
            Ok(events) => {
                if !events.is_empty() {
                    tracing::info!("Got {} event(s)", events.len());
                }
                for event in events {
                    last_event_id = last_event_id.max(event.event_id);
                    let event_id = event.event_id;
                    if let Err(e) = dispatcher.handle_event(event).await {
                        tracing::error!("Dispatch error for event {}: {}", event_id, e);
                    }
                }
                IDLE_BETWEEN_POLLS
            }
            Err(e) => {
                tracing::error!("Polling error: {}", e);
                BACKOFF_AFTER_ERROR
            }
        };

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(pause) => {}
        }
    }

    tracing::info!("Polling loop stopped at event {}", last_event_id);
    last_event_id
}
