//! macOS development environment provisioning.
//!
//! Builds an ordered list of [`SetupAction`]s from `[setup]` and runs them
//! through a [`CommandRunner`]. Every action checks first whether it is
//! already done, so the whole setup can be re-run safely. The first failing
//! action aborts the run.

use crate::config::toml_config::{to_spec, SetupConfig};
use crate::domain::model::{CommandOutput, CommandSpec};
use crate::domain::ports::CommandRunner;
use crate::utils::error::{BootError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupAction {
    InstallFormula(String),
    StartService(String),
    WaitForDatabase { attempts: u32, interval: Duration },
    EnsureRole(String),
    EnsureDatabase { name: String, owner: String },
    CopyEnvFile { from: PathBuf, to: PathBuf },
    Run { label: String, command: CommandSpec },
}

impl fmt::Display for SetupAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupAction::InstallFormula(name) => write!(f, "install {} via Homebrew", name),
            SetupAction::StartService(name) => write!(f, "start service {}", name),
            SetupAction::WaitForDatabase { attempts, interval } => write!(
                f,
                "wait for PostgreSQL to accept connections ({} x {}s)",
                attempts,
                interval.as_secs()
            ),
            SetupAction::EnsureRole(name) => write!(f, "create database role {}", name),
            SetupAction::EnsureDatabase { name, owner } => {
                write!(f, "create database {} owned by {}", name, owner)
            }
            SetupAction::CopyEnvFile { from, to } => {
                write!(f, "copy {} to {}", from.display(), to.display())
            }
            SetupAction::Run { label, command } => write!(f, "{} (`{}`)", label, command),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionStatus {
    Done,
    AlreadyDone,
    Skipped(String),
}

/// 依設定產生安裝步驟
pub fn plan(config: &SetupConfig, project_dir: &Path) -> Result<Vec<SetupAction>> {
    config.validate_setup()?;

    let mut actions: Vec<SetupAction> = config
        .formulae
        .iter()
        .cloned()
        .map(SetupAction::InstallFormula)
        .collect();
    actions.extend(config.services.iter().cloned().map(SetupAction::StartService));
    // brew services start 只交給 launchd，不等資料庫就緒
    actions.push(SetupAction::WaitForDatabase {
        attempts: config.database_wait_attempts,
        interval: config.database_wait_interval(),
    });
    actions.push(SetupAction::EnsureRole(config.database_user.clone()));
    actions.push(SetupAction::EnsureDatabase {
        name: config.database_name.clone(),
        owner: config.database_user.clone(),
    });
    actions.push(SetupAction::CopyEnvFile {
        from: project_dir.join(&config.env_example),
        to: project_dir.join(&config.env_file),
    });
    actions.push(SetupAction::Run {
        label: "install dependencies".to_string(),
        command: to_spec("setup.install", &config.install)?,
    });
    actions.push(SetupAction::Run {
        label: "generate database client".to_string(),
        command: to_spec("setup.generate", &config.generate)?,
    });

    Ok(actions)
}

pub struct LocalSetup<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> LocalSetup<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Fails unless running on macOS with Homebrew callable.
    pub async fn check_preconditions(&self, os: &str) -> Result<()> {
        if os != "macos" {
            return Err(BootError::SetupError {
                message: format!("local setup only supports macOS, this is {}", os),
            });
        }
        let brew = CommandSpec::new("brew").arg("--version");
        match self.runner.run(&brew).await {
            Ok(output) if output.success() => Ok(()),
            _ => Err(BootError::SetupError {
                message: "Homebrew not found; install it from https://brew.sh".to_string(),
            }),
        }
    }

    pub async fn run_all(&self, actions: &[SetupAction]) -> Result<Vec<ActionStatus>> {
        let mut statuses = Vec::with_capacity(actions.len());
        for action in actions {
            tracing::info!("▶ {}", action);
            let status = self.apply(action).await?;
            match &status {
                ActionStatus::Done => tracing::info!("✅ {}", action),
                ActionStatus::AlreadyDone => tracing::info!("✅ {} (already done)", action),
                ActionStatus::Skipped(reason) => tracing::warn!("⚠️ skipped {}: {}", action, reason),
            }
            statuses.push(status);
        }
        Ok(statuses)
    }

    async fn apply(&self, action: &SetupAction) -> Result<ActionStatus> {
        match action {
            SetupAction::InstallFormula(name) => {
                let installed = CommandSpec::new("brew").arg("list").arg("--versions").arg(name);
                if self.succeeds(&installed).await {
                    return Ok(ActionStatus::AlreadyDone);
                }
                self.require(&CommandSpec::new("brew").arg("install").arg(name))
                    .await?;
                Ok(ActionStatus::Done)
            }
            SetupAction::StartService(name) => {
                // brew services start 對已啟動的服務也會成功
                self.require(&CommandSpec::new("brew").arg("services").arg("start").arg(name))
                    .await?;
                Ok(ActionStatus::Done)
            }
            SetupAction::WaitForDatabase { attempts, interval } => {
                self.wait_for_database(*attempts, *interval).await
            }
            SetupAction::EnsureRole(name) => {
                let query = format!("SELECT 1 FROM pg_roles WHERE rolname='{}'", name);
                if self.query_returns_row(&query).await? {
                    return Ok(ActionStatus::AlreadyDone);
                }
                self.require(&CommandSpec::new("createuser").arg("--createdb").arg(name))
                    .await?;
                Ok(ActionStatus::Done)
            }
            SetupAction::EnsureDatabase { name, owner } => {
                let query = format!("SELECT 1 FROM pg_database WHERE datname='{}'", name);
                if self.query_returns_row(&query).await? {
                    return Ok(ActionStatus::AlreadyDone);
                }
                self.require(&CommandSpec::new("createdb").arg("-O").arg(owner).arg(name))
                    .await?;
                Ok(ActionStatus::Done)
            }
            SetupAction::CopyEnvFile { from, to } => copy_env_file(from, to),
            SetupAction::Run { command, .. } => {
                self.require(command).await?;
                Ok(ActionStatus::Done)
            }
        }
    }

    async fn wait_for_database(&self, attempts: u32, interval: Duration) -> Result<ActionStatus> {
        let ready = CommandSpec::new("pg_isready").arg("-d").arg("postgres");
        for attempt in 1..=attempts {
            let output = self.runner.run(&ready).await?;
            if output.success() {
                return Ok(ActionStatus::Done);
            }
            tracing::debug!(
                "PostgreSQL not ready ({}/{}): {}",
                attempt,
                attempts,
                output.error_summary(1)
            );
            if attempt < attempts {
                tokio::time::sleep(interval).await;
            }
        }
        Err(BootError::SetupError {
            message: format!(
                "PostgreSQL did not accept connections after {} attempt(s); check `brew services list`",
                attempts
            ),
        })
    }

    async fn succeeds(&self, command: &CommandSpec) -> bool {
        matches!(self.runner.run(command).await, Ok(output) if output.success())
    }

    async fn require(&self, command: &CommandSpec) -> Result<CommandOutput> {
        let output = self.runner.run(command).await?;
        for line in output.combined().lines().filter(|l| !l.trim().is_empty()) {
            tracing::info!("[{}] {}", command.program, line);
        }
        if !output.success() {
            return Err(BootError::CommandError {
                program: command.to_string(),
                message: format!(
                    "{}: {}",
                    output.exit_description(),
                    output.error_summary(3)
                ),
            });
        }
        Ok(output)
    }

    async fn query_returns_row(&self, query: &str) -> Result<bool> {
        let psql = CommandSpec::new("psql")
            .arg("-d")
            .arg("postgres")
            .arg("-tAc")
            .arg(query);
        let output = self.require(&psql).await?;
        Ok(output.stdout.trim() == "1")
    }
}

fn copy_env_file(from: &Path, to: &Path) -> Result<ActionStatus> {
    if to.exists() {
        return Ok(ActionStatus::AlreadyDone);
    }
    if !from.exists() {
        return Ok(ActionStatus::Skipped(format!(
            "{} does not exist",
            from.display()
        )));
    }
    std::fs::copy(from, to)?;
    Ok(ActionStatus::Done)
}
