use crate::domain::model::{BootPhase, CommandSpec, StepOutcome};
use crate::domain::ports::{BootContext, CommandRunner, Step};
use crate::utils::error::{BootError, Result};
use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use std::path::PathBuf;
use std::sync::Arc;

/// Verifies the generated ORM client exists and can be loaded.
///
/// A load failure that mentions the TLS library is fatal: the server would
/// crash on its first query anyway. Any other failure only warns.
pub struct ClientLoadStep {
    runner: Arc<dyn CommandRunner>,
    client_dir: PathBuf,
    load: CommandSpec,
    tls_pattern: Regex,
}

impl ClientLoadStep {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        client_dir: impl Into<PathBuf>,
        load: CommandSpec,
        tls_library: &str,
    ) -> Result<Self> {
        Ok(Self {
            runner,
            client_dir: client_dir.into(),
            load,
            tls_pattern: tls_pattern(tls_library)?,
        })
    }
}

/// 不分大小寫比對 TLS 函式庫名稱
pub fn tls_pattern(tls_library: &str) -> Result<Regex> {
    RegexBuilder::new(&regex::escape(tls_library))
        .case_insensitive(true)
        .build()
        .map_err(|e| BootError::InvalidConfigValueError {
            field: "diagnostics.tls_library".to_string(),
            value: tls_library.to_string(),
            reason: e.to_string(),
        })
}

/// Decide how bad a client load failure is from its error text.
pub fn classify_client_load_error(message: &str, tls_pattern: &Regex) -> StepOutcome {
    let summary = message
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no error output");

    if tls_pattern.is_match(message) {
        let detail = message
            .lines()
            .map(str::trim)
            .find(|line| tls_pattern.is_match(line))
            .unwrap_or(summary);
        StepOutcome::Fatal(detail.to_string())
    } else {
        StepOutcome::Warn(format!("database client failed to load: {}", summary))
    }
}

#[async_trait]
impl Step for ClientLoadStep {
    fn name(&self) -> &str {
        "client-load"
    }

    fn phase(&self) -> BootPhase {
        BootPhase::DiagnosingEnvironment
    }

    async fn run(&self, _ctx: &BootContext) -> StepOutcome {
        if !self.client_dir.is_dir() {
            return StepOutcome::Warn(format!(
                "generated client not found at {}; was the client generated during build?",
                self.client_dir.display()
            ));
        }

        match self.runner.run(&self.load).await {
            Ok(output) if output.success() => StepOutcome::Ok(format!(
                "database client at {} loads",
                self.client_dir.display()
            )),
            Ok(output) => classify_client_load_error(&output.combined(), &self.tls_pattern),
            Err(e) => StepOutcome::Warn(format!("could not run client load check: {}", e)),
        }
    }

    fn fatal_error(&self, message: String) -> BootError {
        BootError::ClientLoadError { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{context, RecordingRunner};
    use crate::domain::model::CommandOutput;

    fn load_command() -> CommandSpec {
        CommandSpec::new("node")
            .arg("-e")
            .arg("require('@prisma/client')")
    }

    fn failed(stderr: &str) -> CommandOutput {
        CommandOutput {
            code: Some(1),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn test_tls_error_is_fatal() {
        let pattern = tls_pattern("libssl").unwrap();
        let message = "PrismaClientInitializationError: Unable to require(`libquery_engine.so.node`).\n\
                       Error loading shared library libssl.so.1.1: No such file or directory";

        match classify_client_load_error(message, &pattern) {
            StepOutcome::Fatal(m) => assert!(m.contains("libssl.so.1.1")),
            other => panic!("expected fatal, got {:?}", other),
        }
        assert!(classify_client_load_error("LIBSSL missing", &pattern).is_fatal());
    }

    #[test]
    fn test_other_error_only_warns() {
        let pattern = tls_pattern("libssl").unwrap();
        let outcome = classify_client_load_error("Cannot find module '.prisma/client/default'", &pattern);
        assert!(matches!(outcome, StepOutcome::Warn(m) if m.contains("Cannot find module")));
    }

    #[test]
    fn test_pattern_is_literal() {
        let pattern = tls_pattern("libssl.so.3").unwrap();
        assert!(!pattern.is_match("libsslXsoX3"));
        assert!(pattern.is_match("cannot open libssl.so.3"));
    }

    #[tokio::test]
    async fn test_missing_client_dir_skips_load() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::new());
        let step = ClientLoadStep::new(
            runner.clone(),
            dir.path().join("node_modules/.prisma/client"),
            load_command(),
            "libssl",
        )
        .unwrap();

        assert!(matches!(step.run(&context()).await, StepOutcome::Warn(_)));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_with_tls_library_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::new().respond(
            "node -e require('@prisma/client')",
            failed("Error: libssl.so.3: cannot open shared object file"),
        ));
        let step = ClientLoadStep::new(runner.clone(), dir.path(), load_command(), "libssl").unwrap();

        let outcome = step.run(&context()).await;
        assert!(outcome.is_fatal());
        assert_eq!(runner.calls().len(), 1);

        let error = step.fatal_error(outcome.message().to_string());
        assert!(matches!(&error, BootError::ClientLoadError { message } if message.contains("libssl.so.3")));
        assert!(error.recovery_suggestion().contains("TLS library"));
    }

    #[tokio::test]
    async fn test_successful_load() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::new());
        let step = ClientLoadStep::new(runner, dir.path(), load_command(), "libssl").unwrap();

        assert!(matches!(step.run(&context()).await, StepOutcome::Ok(_)));
    }
}
