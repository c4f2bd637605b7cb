//! Startup contract of the entrypoint process: what must hold before any
//! application work starts, and how the process reports and exits when it
//! does not.

pub mod dependencies;
pub mod exit;
pub mod lifecycle;
pub mod preconditions;

pub use exit::{report_failure, ExitStatus};
pub use lifecycle::{Lifecycle, ProcessState};
pub use preconditions::{verify_environment, DataDir, ReadyEnvironment};
