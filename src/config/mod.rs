pub mod toml_config;

use crate::contract::dependencies::{default_required, Capability};
use crate::utils::error::Result;
use crate::utils::logger::LogFormat;
use crate::utils::validation::{
    validate_inside_dir, validate_non_empty_string, validate_path, validate_range, validate_url,
    Validate,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use toml_config::FileConfig;

pub const DEFAULT_BASE_URL: &str = "https://myteam.mail.ru/bot/v1";
pub const DEFAULT_DATA_DIR: &str = "/data";
pub const DEFAULT_DATA_FILE: &str = "vacation_data.json";
pub const DEFAULT_UPLOAD_FILE: &str = "latest.xlsx";
pub const DEFAULT_NOTIFY_HOUR: u32 = 9;
pub const DEFAULT_POLL_TIME: u64 = 5;

/// What the single entrypoint does once the environment checks pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EntrypointTarget {
    /// Run the chat bot until SIGINT/SIGTERM.
    #[default]
    Bot,
    /// Send the reminders due today and exit.
    NotifyOnce,
    /// Verify the environment and exit.
    Check,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaunchConfig {
    pub target: EntrypointTarget,
}

/// Raw launcher input. Every option can come from the environment, which is
/// how the container runtime configures the process; flags exist for local
/// runs only.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "vacation-notifier")]
#[command(about = "Chat bot that turns vacation rosters into reminders")]
pub struct CliArgs {
    /// Optional TOML configuration file
    #[arg(long = "config", env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    #[arg(long, env = "VKT_BOT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[arg(long, env = "VKT_BASE_URL")]
    pub base_url: Option<String>,

    #[arg(long, env = "DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[arg(long, env = "DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// Copy of the last uploaded roster; CSV uploads are kept with a `.csv`
    /// extension instead
    #[arg(long = "upload-file", env = "FILE_PATH")]
    pub upload_file: Option<PathBuf>,

    #[arg(long, env = "NOTIFY_HOUR")]
    pub notify_hour: Option<u32>,

    #[arg(long, env = "POLL_TIME")]
    pub poll_time: Option<u64>,

    #[arg(long, env = "ENTRYPOINT_TARGET", value_enum)]
    pub target: Option<EntrypointTarget>,

    #[arg(long, env = "REQUIRED_CAPABILITIES", value_delimiter = ',')]
    pub required_capabilities: Vec<String>,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "compact")]
    pub log_format: LogFormat,

    #[arg(short, long, env = "VERBOSE", help = "Enable verbose output")]
    pub verbose: bool,
}

/// Fully resolved configuration: defaults < config file < environment/flags.
#[derive(Debug, Clone)]
pub struct Settings {
    pub token: Option<String>,
    pub base_url: String,
    pub data_dir: PathBuf,
    pub data_file: PathBuf,
    pub upload_file: PathBuf,
    pub notify_hour: u32,
    pub poll_time: u64,
    pub launch: LaunchConfig,
    pub required_capabilities: Vec<Capability>,
}

impl Settings {
    pub fn resolve(args: &CliArgs) -> Result<Self> {
        let file = match &args.config_file {
            Some(path) => {
                tracing::debug!("Loading configuration file {}", path.display());
                FileConfig::from_file(path)?
            }
            None => FileConfig::default(),
        };
        Self::merge(args, file)
    }

    pub fn merge(args: &CliArgs, file: FileConfig) -> Result<Self> {
        let data_dir = args
            .data_dir
            .clone()
            .or(file.storage.data_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let data_file = args
            .data_file
            .clone()
            .or(file.storage.data_file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE));
        let upload_file = args
            .upload_file
            .clone()
            .or(file.storage.upload_file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_FILE));

        let required_capabilities = if !args.required_capabilities.is_empty() {
            parse_capabilities(&args.required_capabilities)?
        } else if let Some(names) = &file.runtime.required_capabilities {
            parse_capabilities(names)?
        } else {
            default_required()
        };

        let settings = Self {
            token: args.token.clone().or(file.bot.token),
            base_url: args
                .base_url
                .clone()
                .or(file.bot.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            data_file: within(&data_dir, data_file),
            upload_file: within(&data_dir, upload_file),
            data_dir,
            notify_hour: args
                .notify_hour
                .or(file.notifier.hour)
                .unwrap_or(DEFAULT_NOTIFY_HOUR),
            poll_time: args
                .poll_time
                .or(file.bot.poll_time_seconds)
                .unwrap_or(DEFAULT_POLL_TIME),
            launch: LaunchConfig {
                target: args.target.or(file.runtime.target).unwrap_or_default(),
            },
            required_capabilities,
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Host of the Bot API; file links on this host (or a subdomain of it)
    /// are treated as uploads.
    pub fn file_host(&self) -> Option<String> {
        url::Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}

fn within(dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        dir.join(path)
    }
}

fn parse_capabilities<S: AsRef<str>>(names: &[S]) -> Result<Vec<Capability>> {
    names
        .iter()
        .map(|s| s.as_ref())
        .filter(|s| !s.trim().is_empty())
        .map(str::parse)
        .collect()
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("VKT_BASE_URL", &self.base_url)?;
        if let Some(token) = &self.token {
            validate_non_empty_string("VKT_BOT_TOKEN", token)?;
        }
        validate_path("DATA_DIR", &self.data_dir)?;
        validate_inside_dir("DATA_FILE", &self.data_file, &self.data_dir)?;
        validate_inside_dir("FILE_PATH", &self.upload_file, &self.data_dir)?;
        validate_range("NOTIFY_HOUR", self.notify_hour, 0, 23)?;
        validate_range("POLL_TIME", self.poll_time, 1, 60)?;
        Ok(())
    }
}
