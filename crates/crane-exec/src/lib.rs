//! crane-exec: Executor abstraction
//!
//! Defines the contract for performing drain/replace operations against
//! infrastructure, plus a shell-hook implementation and a dry-run one.

pub mod command;
pub mod dry_run;
pub mod error;
pub mod result;
pub mod traits;

pub use command::{CommandExecutor, CommandExecutorConfig};
pub use dry_run::DryRunExecutor;
pub use error::ExecError;
pub use result::CommandResult;
pub use traits::Executor;
