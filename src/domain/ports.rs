use crate::domain::model::{BootPhase, Capability, CommandOutput, CommandSpec, StepOutcome};
use crate::utils::error::{BootError, Result};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;

/// Runs an external command to completion and captures its output.
///
/// A command that starts but exits non-zero is `Ok` with a non-zero code;
/// `Err` means the program could not be started at all.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput>;
}

#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>>;
}

/// Opens a connection to the database, then closes it straight away.
#[async_trait]
pub trait DatabaseProbe: Send + Sync {
    async fn ping(&self, database_url: &str, timeout: Duration) -> Result<()>;
}

/// Replaces the current process with `command`.
///
/// On success this does not return on Unix. Implementations that cannot
/// replace the process return the child's exit code instead.
pub trait Handoff: Send + Sync {
    fn hand_off(&self, command: &CommandSpec) -> Result<i32>;
}

/// Optional capability check.
#[async_trait]
pub trait Probe: Send + Sync {
    fn name(&self) -> &str;
    async fn probe(&self, ctx: &BootContext) -> Capability;
}

/// Shared state passed to every step after config validation.
#[derive(Debug, Clone)]
pub struct BootContext {
    pub database_url: String,
    pub redis_url: String,
}

#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &str;
    fn phase(&self) -> BootPhase;
    async fn run(&self, ctx: &BootContext) -> StepOutcome;

    /// Error the boot fails with when `run` returns `Fatal(message)`.
    fn fatal_error(&self, message: String) -> BootError {
        BootError::StepFailed {
            step: self.name().to_string(),
            message,
        }
    }
}
