pub mod handlers;
pub mod messages;
pub mod notifier;
pub mod polling;

use crate::bot::HttpBotClient;
use crate::config::{EntrypointTarget, Settings};
use crate::contract::ReadyEnvironment;
use crate::domain::ports::BotApi;
use crate::storage::{DataDirStorage, JsonStore};
use crate::utils::error::{AppError, Result};
use chrono::Local;
use handlers::Dispatcher;
use notifier::{send_notifications, Notifier};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs whatever the launch configuration selects. Only called once the
/// environment has been verified.
pub async fn run(settings: &Settings, env: ReadyEnvironment) -> Result<()> {
    match settings.launch.target {
        EntrypointTarget::Check => {
            tracing::info!(
                "✅ Environment check passed (data dir {})",
                env.data_dir.path().display()
            );
            Ok(())
        }
        EntrypointTarget::NotifyOnce => {
            let (bot, store) = connect(settings, env)?;
            let sent = send_notifications(bot.as_ref(), &store, Local::now().date_naive()).await?;
            tracing::info!("✅ Notification pass finished, {} sent", sent);
            Ok(())
        }
        EntrypointTarget::Bot => {
            let (bot, store) = connect(settings, env)?;
            let upload_file =
                relative_to_data_dir(store.storage(), settings, &settings.upload_file)?;
            let dispatcher = Arc::new(Dispatcher::new(
                bot.clone(),
                store.clone(),
                upload_file,
                settings.file_host(),
            ));
            let notifier = Arc::new(Notifier::new(bot.clone(), store, settings.notify_hour));

            run_bot(bot, dispatcher, notifier, settings.poll_time, CancellationToken::new()).await
        }
    }
}

type Store = JsonStore<DataDirStorage>;

fn connect(settings: &Settings, env: ReadyEnvironment) -> Result<(Arc<HttpBotClient>, Arc<Store>)> {
    let bot = HttpBotClient::new(&settings.base_url, &env.token)?;
    let storage = DataDirStorage::new(env.data_dir);
    let data_file = relative_to_data_dir(&storage, settings, &settings.data_file)?;
    Ok((Arc::new(bot), Arc::new(JsonStore::new(storage, data_file))))
}

fn relative_to_data_dir(
    storage: &DataDirStorage,
    settings: &Settings,
    path: &std::path::Path,
) -> Result<String> {
    storage
        .relative_name(path)
        .ok_or_else(|| AppError::InvalidConfigValueError {
            field: "storage path".to_string(),
            value: path.display().to_string(),
            reason: format!("must be inside {}", settings.data_dir.display()),
        })
}

/// Polls and notifies until a shutdown signal arrives or `shutdown` is
/// cancelled elsewhere.
pub async fn run_bot<B, S>(
    bot: Arc<B>,
    dispatcher: Arc<Dispatcher<B, S>>,
    notifier: Arc<Notifier<B, S>>,
    poll_time: u64,
    shutdown: CancellationToken,
) -> Result<()>
where
    B: BotApi + 'static,
    S: crate::domain::ports::Storage + 'static,
{
    match bot.self_get().await {
        Ok(me) => tracing::info!("Bot identity: {} ({})", me.nick, me.user_id),
        Err(e) => tracing::error!("self_get failed: {}", e),
    }

    let polling = {
        let bot = bot.clone();
        let token = shutdown.child_token();
        tokio::spawn(async move {
            polling::poll_events(bot.as_ref(), dispatcher.as_ref(), poll_time, 0, token).await
        })
    };
    let notifying = {
        let token = shutdown.child_token();
        tokio::spawn(async move { notifier.run(token).await })
    };

    tracing::info!("Bot running, waiting for SIGINT/SIGTERM to shut down");
    tokio::select! {
        _ = wait_for_signal() => tracing::info!("Shutdown signal received, stopping..."),
        _ = shutdown.cancelled() => tracing::info!("Shutdown requested"),
    }
    shutdown.cancel();

    if let Err(e) = polling.await {
        tracing::error!("Polling task ended abnormally: {}", e);
    }
    if let Err(e) = notifying.await {
        tracing::error!("Notifier task ended abnormally: {}", e);
    }

    tracing::info!("Bot stopped");
    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
