use clap::Parser;
use std::process::ExitCode;
use vacation_notifier::contract::{report_failure, verify_environment};
use vacation_notifier::utils::logger;
use vacation_notifier::{app, CliArgs, ExitStatus, Lifecycle, Settings};

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    // 初始化日誌
    logger::init_logger(args.log_format, args.verbose);

    let mut lifecycle = Lifecycle::new();
    let status = run(&args, &mut lifecycle).await;

    let final_state = lifecycle.terminate(status == ExitStatus::Success);
    tracing::debug!("Exiting in state {} with code {}", final_state, status.code());
    status.into()
}

async fn run(args: &CliArgs, lifecycle: &mut Lifecycle) -> ExitStatus {
    if let Err(e) = lifecycle.begin_checks() {
        return report_failure(&e);
    }

    // Nothing is logged before the checks so a failure is the first line.
    let settings = match Settings::resolve(args) {
        Ok(settings) => settings,
        Err(e) => return report_failure(&e),
    };
    let env = match verify_environment(&settings) {
        Ok(env) => env,
        Err(e) => return report_failure(&e),
    };

    if let Err(e) = lifecycle.enter_running() {
        return report_failure(&e);
    }
    tracing::info!("🚀 Starting vacation-notifier");
    display_config_summary(&settings);

    match app::run(&settings, env).await {
        Ok(()) => {
            tracing::info!("✅ Finished normally");
            ExitStatus::Success
        }
        Err(e) => report_failure(&e),
    }
}

fn display_config_summary(settings: &Settings) {
    tracing::info!("📋 Configuration:");
    tracing::info!("  Target: {:?}", settings.launch.target);
    tracing::info!("  Bot API: {}", settings.base_url);
    tracing::info!("  Data dir: {}", settings.data_dir.display());
    tracing::info!("  State file: {}", settings.data_file.display());
    tracing::info!("  Upload file: {}", settings.upload_file.display());
    tracing::info!("  Daily reminders at: {:02}:00", settings.notify_hour);
    tracing::info!("  Poll time: {}s", settings.poll_time);
}
