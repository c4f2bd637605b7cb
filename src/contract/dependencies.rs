//! The dependency set of the process is fixed when the binary is built.
//! Startup only compares what the configuration requires against what was
//! compiled in; nothing is fetched or installed at runtime.

use crate::utils::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// HTTPS client for the Bot API.
    Tls,
    /// CSV roster uploads.
    Csv,
    /// Excel / OpenDocument roster uploads.
    Xlsx,
}

impl Capability {
    pub const ALL: [Capability; 3] = [Capability::Tls, Capability::Csv, Capability::Xlsx];

    pub fn name(self) -> &'static str {
        match self {
            Capability::Tls => "tls",
            Capability::Csv => "csv",
            Capability::Xlsx => "xlsx",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Capability {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Capability::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::InvalidConfigValueError {
                field: "REQUIRED_CAPABILITIES".to_string(),
                value: s.to_string(),
                reason: format!(
                    "Unknown capability. Known capabilities: {}",
                    Capability::ALL.map(Capability::name).join(", ")
                ),
            })
    }
}

pub fn default_required() -> Vec<Capability> {
    vec![Capability::Tls, Capability::Csv, Capability::Xlsx]
}

/// Capabilities linked into this binary.
pub fn compiled_capabilities() -> Vec<Capability> {
    let mut caps = vec![Capability::Tls, Capability::Csv];
    if cfg!(feature = "xlsx") {
        caps.push(Capability::Xlsx);
    }
    caps
}

pub fn check_dependencies(required: &[Capability], available: &[Capability]) -> Result<()> {
    match required.iter().find(|c| !available.contains(c)) {
        Some(missing) => Err(AppError::MissingDependency {
            name: missing.name().to_string(),
        }),
        None => Ok(()),
    }
}
