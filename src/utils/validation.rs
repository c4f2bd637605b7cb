use crate::utils::error::{AppError, Result};
use std::path::{Component, Path};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(AppError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &Path) -> Result<()> {
    let display = path.display().to_string();
    if display.is_empty() {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: display,
            reason: "Path cannot be empty".to_string(),
        });
    }

    if display.contains('\0') {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: display,
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// A state file must live directly or nested inside the data directory and
/// must not climb out of it.
pub fn validate_inside_dir(field_name: &str, path: &Path, dir: &Path) -> Result<()> {
    validate_path(field_name, path)?;

    let escapes = path
        .components()
        .any(|c| matches!(c, Component::ParentDir));
    if escapes || !path.starts_with(dir) || path == dir {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.display().to_string(),
            reason: format!("Path must be a file inside {}", dir.display()),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("VKT_BASE_URL", "https://myteam.mail.ru/bot/v1").is_ok());
        assert!(validate_url("VKT_BASE_URL", "http://localhost:8080").is_ok());
        assert!(validate_url("VKT_BASE_URL", "").is_err());
        assert!(validate_url("VKT_BASE_URL", "invalid-url").is_err());
        assert!(validate_url("VKT_BASE_URL", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("NOTIFY_HOUR", 9, 0, 23).is_ok());
        assert!(validate_range("NOTIFY_HOUR", 24, 0, 23).is_err());
    }

    #[test]
    fn test_validate_inside_dir() {
        let dir = Path::new("/data");
        assert!(validate_inside_dir("DATA_FILE", Path::new("/data/state.json"), dir).is_ok());
        assert!(validate_inside_dir("DATA_FILE", Path::new("/data/sub/state.json"), dir).is_ok());
        assert!(validate_inside_dir("DATA_FILE", Path::new("/tmp/state.json"), dir).is_err());
        assert!(validate_inside_dir("DATA_FILE", Path::new("/data/../etc/passwd"), dir).is_err());
        assert!(validate_inside_dir("DATA_FILE", Path::new("/data"), dir).is_err());
        // `/database` shares a string prefix but is a different directory
        assert!(validate_inside_dir("DATA_FILE", Path::new("/database/x.json"), dir).is_err());
    }
}
