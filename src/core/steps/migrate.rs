use crate::domain::model::{BootPhase, CommandSpec, StepOutcome};
use crate::domain::ports::{BootContext, CommandRunner, Step};
use crate::utils::error::BootError;
use async_trait::async_trait;
use std::sync::Arc;

/// Forward migration, optionally falling back to a schema push.
///
/// Without a fallback a failed migration is fatal. With one, the push is
/// tried exactly once and the boot continues whatever it returns.
pub struct MigrateStep {
    runner: Arc<dyn CommandRunner>,
    deploy: CommandSpec,
    push: Option<CommandSpec>,
}

impl MigrateStep {
    pub fn new(runner: Arc<dyn CommandRunner>, deploy: CommandSpec, push: Option<CommandSpec>) -> Self {
        Self {
            runner,
            deploy,
            push,
        }
    }

    /// 執行命令，失敗時回傳原因
    async fn attempt(&self, command: &CommandSpec) -> Result<(), String> {
        match self.runner.run(command).await {
            Ok(output) if output.success() => Ok(()),
            Ok(output) => {
                for line in output.combined().lines().filter(|l| !l.trim().is_empty()) {
                    tracing::warn!("[{}] {}", command.program, line);
                }
                Err(format!(
                    "`{}` {}: {}",
                    command,
                    output.exit_description(),
                    output.error_summary(ERROR_LINES)
                ))
            }
            Err(e) => Err(e.to_string()),
        }
    }
}

const ERROR_LINES: usize = 3;

#[async_trait]
impl Step for MigrateStep {
    fn name(&self) -> &str {
        "migrate"
    }

    fn phase(&self) -> BootPhase {
        BootPhase::Migrating
    }

    async fn run(&self, _ctx: &BootContext) -> StepOutcome {
        let reason = match self.attempt(&self.deploy).await {
            Ok(()) => return StepOutcome::Ok("migrations applied".to_string()),
            Err(reason) => reason,
        };

        let Some(push) = &self.push else {
            return StepOutcome::Fatal(reason);
        };

        tracing::warn!("⚠️ Migration failed ({}), falling back to `{}`", reason, push);
        match self.attempt(push).await {
            Ok(()) => StepOutcome::Warn(format!(
                "migration failed ({}); schema pushed as fallback",
                reason
            )),
            Err(push_reason) => StepOutcome::Warn(format!(
                "migration failed ({}) and schema push failed ({}); starting against the existing schema",
                reason, push_reason
            )),
        }
    }

    fn fatal_error(&self, message: String) -> BootError {
        BootError::CommandError {
            program: self.deploy.program.clone(),
            message: format!("migration failed: {}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{context, RecordingRunner};
    use crate::domain::model::CommandOutput;

    fn deploy() -> CommandSpec {
        CommandSpec::new("npx").arg("prisma").arg("migrate").arg("deploy")
    }

    fn push() -> CommandSpec {
        CommandSpec::new("npx").arg("prisma").arg("db").arg("push")
    }

    fn exit(code: i32, stderr: &str) -> CommandOutput {
        CommandOutput {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    #[tokio::test]
    async fn test_successful_migration_skips_push() {
        let runner = Arc::new(RecordingRunner::new());
        let step = MigrateStep::new(runner.clone(), deploy(), Some(push()));

        assert_eq!(step.run(&context()).await, StepOutcome::Ok("migrations applied".into()));
        assert_eq!(runner.calls(), vec![deploy()]);
    }

    #[tokio::test]
    async fn test_failed_migration_pushes_once() {
        let runner = Arc::new(
            RecordingRunner::new().respond("npx prisma migrate deploy", exit(1, "P3009 failed migrations")),
        );
        let step = MigrateStep::new(runner.clone(), deploy(), Some(push()));

        let outcome = step.run(&context()).await;
        assert!(matches!(outcome, StepOutcome::Warn(m) if m.contains("P3009")));
        assert_eq!(runner.calls(), vec![deploy(), push()]);
    }

    #[tokio::test]
    async fn test_both_failing_still_continues() {
        let runner = Arc::new(
            RecordingRunner::new()
                .respond("npx prisma migrate deploy", exit(1, "P3009"))
                .respond("npx prisma db push", exit(1, "P1001 can't reach database")),
        );
        let step = MigrateStep::new(runner.clone(), deploy(), Some(push()));

        let outcome = step.run(&context()).await;
        assert!(!outcome.is_fatal());
        assert!(outcome.message().contains("P1001"));
        assert_eq!(runner.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_without_fallback_failure_is_fatal() {
        let runner = Arc::new(RecordingRunner::new().not_found("npx prisma migrate deploy"));
        let step = MigrateStep::new(runner.clone(), deploy(), None);

        let outcome = step.run(&context()).await;
        assert!(outcome.is_fatal());
        assert_eq!(runner.calls(), vec![deploy()]);

        match step.fatal_error(outcome.message().to_string()) {
            BootError::CommandError { program, message } => {
                assert_eq!(program, "npx");
                assert!(message.starts_with("migration failed"));
            }
            other => panic!("expected command error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_warning_carries_leading_error_lines() {
        let runner = Arc::new(RecordingRunner::new().respond(
            "npx prisma migrate deploy",
            exit(
                1,
                "Error: P3005\nThe database schema is not empty.\nRead more: https://pris.ly/d/migrate-baseline",
            ),
        ));
        let step = MigrateStep::new(runner, deploy(), Some(push()));

        let message = step.run(&context()).await.message().to_string();
        assert!(message.contains("exited with code 1"));
        assert!(message.contains("Error: P3005 | The database schema is not empty."));
    }
}
