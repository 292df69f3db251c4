use crate::domain::model::CommandSpec;
use crate::domain::ports::Handoff;
use crate::utils::error::{BootError, Result};
use std::process::Command;

/// Hands the process over to the server.
///
/// On Unix the bootstrapper's image is replaced with `exec`, so the server
/// keeps the PID and receives signals directly. Elsewhere the server runs as
/// a child with inherited stdio and its exit code is returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecHandoff;

impl Handoff for ExecHandoff {
    #[cfg(unix)]
    fn hand_off(&self, command: &CommandSpec) -> Result<i32> {
        use std::os::unix::process::CommandExt;

        let err = Command::new(&command.program).args(&command.args).exec();
        Err(BootError::HandoffError {
            program: command.program.clone(),
            source: err,
        })
    }

    #[cfg(not(unix))]
    fn hand_off(&self, command: &CommandSpec) -> Result<i32> {
        let status = Command::new(&command.program)
            .args(&command.args)
            .status()
            .map_err(|source| BootError::HandoffError {
                program: command.program.clone(),
                source,
            })?;
        Ok(status.code().unwrap_or(1))
    }
}
