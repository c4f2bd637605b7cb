use crate::config::Settings;
use crate::contract::dependencies::{check_dependencies, compiled_capabilities};
use crate::utils::error::{AppError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const TOKEN_VAR: &str = "VKT_BOT_TOKEN";

/// The persistent data directory, after it has been checked to exist and be
/// writable. Only [`DataDir::verify`] builds one, so holding a `DataDir`
/// means the check already passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDir {
    path: PathBuf,
}

impl DataDir {
    /// Read-only check: never creates the directory and leaves no entry
    /// behind in it.
    pub fn verify(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let unready = |reason: String| AppError::EnvironmentUnready {
            path: path.clone(),
            reason,
        };

        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(unready("directory does not exist".to_string()))
            }
            Err(e) => return Err(unready(format!("cannot be accessed: {}", e))),
        };

        if !metadata.is_dir() {
            return Err(unready("path exists but is not a directory".to_string()));
        }

        fs::read_dir(&path).map_err(|e| unready(format!("cannot be listed: {}", e)))?;

        if metadata.permissions().readonly() {
            return Err(unready("directory is read-only".to_string()));
        }

        // An anonymous temp file is unlinked right away (O_TMPFILE where
        // available), so the listing is unchanged afterwards.
        tempfile::tempfile_in(&path).map_err(|e| unready(format!("is not writable: {}", e)))?;

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.path.join(name)
    }
}

/// Everything the application needs that the precondition check vouches for.
#[derive(Debug, Clone)]
pub struct ReadyEnvironment {
    pub working_dir: PathBuf,
    pub data_dir: DataDir,
    pub token: String,
}

pub fn check_working_dir() -> Result<PathBuf> {
    let cwd = std::env::current_dir().map_err(|e| AppError::EnvironmentUnready {
        path: PathBuf::from("."),
        reason: format!("working directory is not accessible: {}", e),
    })?;
    fs::read_dir(&cwd).map_err(|e| AppError::EnvironmentUnready {
        path: cwd.clone(),
        reason: format!("working directory cannot be listed: {}", e),
    })?;
    Ok(cwd)
}

pub fn check_required_var(field: &str, value: Option<&str>) -> Result<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AppError::MissingConfigError {
            field: field.to_string(),
        }),
    }
}

/// Runs every startup precondition in order and stops at the first failure:
/// working directory, data directory, compiled dependencies, environment.
pub fn verify_environment(settings: &Settings) -> Result<ReadyEnvironment> {
    let working_dir = check_working_dir()?;
    let data_dir = DataDir::verify(&settings.data_dir)?;
    check_dependencies(&settings.required_capabilities, &compiled_capabilities())?;
    let token = check_required_var(TOKEN_VAR, settings.token.as_deref())?;

    tracing::debug!(
        "environment ready: cwd={}, data_dir={}, capabilities={:?}",
        working_dir.display(),
        data_dir.path().display(),
        settings.required_capabilities
    );

    Ok(ReadyEnvironment {
        working_dir,
        data_dir,
        token,
    })
}
