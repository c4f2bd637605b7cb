use crate::utils::error::{AppError, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    NotStarted,
    CheckingEnvironment,
    Running,
    TerminatedOk,
    TerminatedFailed,
}

impl ProcessState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessState::TerminatedOk | ProcessState::TerminatedFailed)
    }

    fn can_move_to(self, next: ProcessState) -> bool {
        use ProcessState::*;
        matches!(
            (self, next),
            (NotStarted, CheckingEnvironment)
                | (CheckingEnvironment, Running)
                | (CheckingEnvironment, TerminatedFailed)
                | (Running, TerminatedOk)
                | (Running, TerminatedFailed)
        )
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessState::NotStarted => "NOT_STARTED",
            ProcessState::CheckingEnvironment => "CHECKING_ENVIRONMENT",
            ProcessState::Running => "RUNNING",
            ProcessState::TerminatedOk => "TERMINATED_OK",
            ProcessState::TerminatedFailed => "TERMINATED_FAILED",
        };
        f.write_str(name)
    }
}

/// Tracks where the entrypoint process is in its startup/shutdown sequence.
#[derive(Debug)]
pub struct Lifecycle {
    state: ProcessState,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: ProcessState::NotStarted,
        }
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn transition(&mut self, next: ProcessState) -> Result<()> {
        if !self.state.can_move_to(next) {
            return Err(AppError::LifecycleError {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!("lifecycle: {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    pub fn begin_checks(&mut self) -> Result<()> {
        self.transition(ProcessState::CheckingEnvironment)
    }

    pub fn enter_running(&mut self) -> Result<()> {
        self.transition(ProcessState::Running)
    }

    /// Moves to the matching terminal state. Failing is allowed from any
    /// non-terminal state so startup errors before the checks still end the
    /// lifecycle cleanly.
    pub fn terminate(&mut self, ok: bool) -> ProcessState {
        let next = if ok {
            ProcessState::TerminatedOk
        } else {
            ProcessState::TerminatedFailed
        };

        if self.state.is_terminal() {
            return self.state;
        }
        if self.state == ProcessState::NotStarted && !ok {
            self.state = ProcessState::CheckingEnvironment;
        }
        if self.transition(next).is_err() {
            self.state = ProcessState::TerminatedFailed;
        }
        self.state
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
