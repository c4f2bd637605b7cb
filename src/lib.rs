pub mod app;
pub mod bot;
pub mod config;
pub mod contract;
pub mod domain;
pub mod schedule;
pub mod storage;
pub mod utils;

pub use config::{CliArgs, EntrypointTarget, LaunchConfig, Settings};
pub use contract::{ExitStatus, Lifecycle, ProcessState};
pub use utils::error::{AppError, Result};
