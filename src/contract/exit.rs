use crate::utils::error::AppError;

/// Process exit codes. Every precondition class has its own code so a
/// supervisor can tell an unready environment from a crashed application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    Success = 0,
    ApplicationFailure = 1,
    Misconfigured = 2,
    EnvironmentUnready = 3,
    MissingDependency = 4,
}

impl ExitStatus {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ExitStatus::Success => "success",
            ExitStatus::ApplicationFailure => "application_failure",
            ExitStatus::Misconfigured => "misconfigured",
            ExitStatus::EnvironmentUnready => "environment_unready",
            ExitStatus::MissingDependency => "missing_dependency",
        }
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status.code())
    }
}

/// Emits the failure diagnostic and returns the status to exit with.
///
/// The user-facing line goes out first so that it is the first line an
/// operator sees; details and the recovery hint follow.
pub fn report_failure(err: &AppError) -> ExitStatus {
    let status = err.exit_status();

    tracing::error!("{}", err.user_friendly_message());
    tracing::error!(
        exit_code = status.code(),
        class = status.as_str(),
        category = ?err.category(),
        severity = ?err.severity(),
        "💡 Recovery suggestion: {}",
        err.recovery_suggestion()
    );

    eprintln!("❌ {}", err.user_friendly_message());
    eprintln!("💡 {}", err.recovery_suggestion());

    status
}
