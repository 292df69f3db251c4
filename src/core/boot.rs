use crate::config::env::RequiredEnv;
use crate::domain::model::{
    BootPhase, BootReport, CommandSpec, StepOutcome, StepRecord, Terminal, Variant,
};
use crate::domain::ports::{Handoff, Step};
use crate::utils::error::BootError;
use std::time::Instant;

const VALIDATE_STEP: &str = "validate-config";
const HANDOFF_STEP: &str = "handoff";

#[derive(Debug)]
pub enum BootExit {
    /// The server ran as a child and exited with this code. With a real
    /// `exec` handoff this is never observed.
    HandedOff(i32),
    Failed { step: String, error: BootError },
}

impl BootExit {
    pub fn exit_code(&self) -> i32 {
        match self {
            BootExit::HandedOff(code) => *code,
            BootExit::Failed { .. } => 1,
        }
    }
}

#[derive(Debug)]
pub struct BootResult {
    pub report: BootReport,
    pub exit: BootExit,
}

/// Runs the boot steps in order and hands off to the server.
///
/// Only a `Fatal` outcome stops the pipeline; warnings are logged and the
/// next step runs.
pub struct BootEngine {
    variant: Variant,
    steps: Vec<Box<dyn Step>>,
    server: CommandSpec,
    handoff: Box<dyn Handoff>,
}

impl BootEngine {
    pub fn new(variant: Variant, server: CommandSpec, handoff: Box<dyn Handoff>) -> Self {
        Self {
            variant,
            steps: Vec::new(),
            server,
            handoff,
        }
    }

    pub fn with_step(mut self, step: impl Step + 'static) -> Self {
        debug_assert!(
            self.steps
                .last()
                .map_or(true, |last| last.phase().can_advance_to(step.phase())),
            "step `{}` added out of phase order",
            step.name()
        );
        self.steps.push(Box::new(step));
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub async fn run(&self) -> BootResult {
        self.run_with_env(|key| std::env::var(key).ok()).await
    }

    pub async fn run_with_env<F>(&self, lookup: F) -> BootResult
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut report = BootReport::new(self.variant);
        tracing::info!("🚀 Starting {:?} boot sequence", self.variant);

        // 驗證必要環境變數，這是唯一會因設定而中止的步驟
        let started = Instant::now();
        let ctx = match RequiredEnv::from_lookup(lookup) {
            Ok(env) => {
                let outcome = StepOutcome::Ok("DATABASE_URL and REDIS_URL are set".to_string());
                log_outcome(VALIDATE_STEP, &outcome);
                record(&mut report, VALIDATE_STEP, BootPhase::ValidatingConfig, outcome, started);
                env.into_context()
            }
            Err(error) => {
                let outcome = StepOutcome::Fatal(error.to_string());
                log_outcome(VALIDATE_STEP, &outcome);
                record(&mut report, VALIDATE_STEP, BootPhase::ValidatingConfig, outcome, started);
                report.terminal = Some(Terminal::Failed);
                return BootResult {
                    report,
                    exit: BootExit::Failed {
                        step: VALIDATE_STEP.to_string(),
                        error,
                    },
                };
            }
        };

        let mut phase = BootPhase::ValidatingConfig;
        for step in &self.steps {
            if step.phase() != phase {
                phase = step.phase();
                tracing::info!("▶ {}", phase);
            }

            let started = Instant::now();
            let outcome = step.run(&ctx).await;
            log_outcome(step.name(), &outcome);
            let fatal = outcome.is_fatal().then(|| outcome.message().to_string());
            record(&mut report, step.name(), phase, outcome, started);

            if let Some(message) = fatal {
                report.terminal = Some(Terminal::Failed);
                return BootResult {
                    report,
                    exit: BootExit::Failed {
                        step: step.name().to_string(),
                        error: step.fatal_error(message),
                    },
                };
            }
        }

        tracing::info!("▶ {}", BootPhase::HandingOff);
        tracing::info!(
            "Boot checks finished with {} warning(s), handing off to `{}`",
            report.warnings(),
            self.server
        );
        // exec 成功後不會返回，所以先標記為 Running
        report.terminal = Some(Terminal::Running);
        if let Ok(json) = serde_json::to_string(&report) {
            tracing::debug!("Boot report: {}", json);
        }

        match self.handoff.hand_off(&self.server) {
            Ok(code) => BootResult {
                report,
                exit: BootExit::HandedOff(code),
            },
            Err(error) => {
                tracing::error!("❌ {}", error);
                report.terminal = Some(Terminal::Failed);
                BootResult {
                    report,
                    exit: BootExit::Failed {
                        step: HANDOFF_STEP.to_string(),
                        error,
                    },
                }
            }
        }
    }
}

fn log_outcome(step: &str, outcome: &StepOutcome) {
    match outcome {
        StepOutcome::Ok(message) => tracing::info!("✅ {}: {}", step, message),
        StepOutcome::Warn(message) => tracing::warn!("⚠️ {}: {}", step, message),
        StepOutcome::Fatal(message) => tracing::error!("❌ {}: {}", step, message),
    }
}

fn record(
    report: &mut BootReport,
    step: &str,
    phase: BootPhase,
    outcome: StepOutcome,
    started: Instant,
) {
    report.records.push(StepRecord {
        step: step.to_string(),
        phase,
        outcome,
        elapsed_ms: started.elapsed().as_millis() as u64,
    });
}
