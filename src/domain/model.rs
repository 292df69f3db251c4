use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which start procedure to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Validate, migrate, hand off. Migration failure is fatal.
    Basic,
    /// Full diagnostics; every check after config validation only warns.
    #[default]
    Extended,
}

/// Result of a single pipeline step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum StepOutcome {
    Ok(String),
    Warn(String),
    Fatal(String),
}

impl StepOutcome {
    pub fn is_fatal(&self) -> bool {
        matches!(self, StepOutcome::Fatal(_))
    }

    pub fn message(&self) -> &str {
        match self {
            StepOutcome::Ok(m) | StepOutcome::Warn(m) | StepOutcome::Fatal(m) => m,
        }
    }
}

/// Tri-state answer of an optional capability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capability {
    Present(String),
    Absent(String),
    Unknown(String),
}

impl From<Capability> for StepOutcome {
    fn from(capability: Capability) -> Self {
        match capability {
            Capability::Present(detail) => StepOutcome::Ok(detail),
            Capability::Absent(detail) => StepOutcome::Warn(detail),
            Capability::Unknown(detail) => StepOutcome::Warn(format!("could not determine: {}", detail)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminal {
    Running,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootPhase {
    ValidatingConfig,
    DiagnosingEnvironment,
    Migrating,
    VerifyingConnectivity,
    HandingOff,
    Terminal(Terminal),
}

impl BootPhase {
    fn rank(self) -> u8 {
        match self {
            BootPhase::ValidatingConfig => 0,
            BootPhase::DiagnosingEnvironment => 1,
            BootPhase::Migrating => 2,
            BootPhase::VerifyingConnectivity => 3,
            BootPhase::HandingOff => 4,
            BootPhase::Terminal(_) => 5,
        }
    }

    /// Phases only move forward; a terminal phase is final.
    pub fn can_advance_to(self, next: BootPhase) -> bool {
        match (self, next) {
            (BootPhase::Terminal(_), _) => false,
            (_, BootPhase::Terminal(_)) => true,
            (current, next) => next.rank() >= current.rank(),
        }
    }
}

impl fmt::Display for BootPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BootPhase::ValidatingConfig => "validating-config",
            BootPhase::DiagnosingEnvironment => "diagnosing-environment",
            BootPhase::Migrating => "migrating",
            BootPhase::VerifyingConnectivity => "verifying-connectivity",
            BootPhase::HandingOff => "handing-off",
            BootPhase::Terminal(Terminal::Running) => "running",
            BootPhase::Terminal(Terminal::Failed) => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: String,
    pub phase: BootPhase,
    pub outcome: StepOutcome,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootReport {
    pub variant: Variant,
    pub started_at: DateTime<Utc>,
    pub records: Vec<StepRecord>,
    pub terminal: Option<Terminal>,
}

impl BootReport {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            started_at: Utc::now(),
            records: Vec::new(),
            terminal: None,
        }
    }

    pub fn warnings(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, StepOutcome::Warn(_)))
            .count()
    }

    pub fn outcome_of(&self, step: &str) -> Option<&StepOutcome> {
        self.records
            .iter()
            .find(|r| r.step == step)
            .map(|r| &r.outcome)
    }
}

/// An external program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Build from an argv array; `None` if it is empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stderr and stdout joined, used when matching error text
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stderr, self.stdout)
    }

    pub fn exit_description(&self) -> String {
        match self.code {
            Some(code) => format!("exited with code {}", code),
            None => "was terminated by a signal".to_string(),
        }
    }

    /// First `max_lines` non-empty lines of stderr, or of stdout when stderr
    /// is empty. Tools such as prisma print the cause first and a
    /// "Read more" link last.
    pub fn error_summary(&self, max_lines: usize) -> String {
        let source = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let lines: Vec<&str> = source
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(max_lines)
            .collect();
        if lines.is_empty() {
            "no error output".to_string()
        } else {
            lines.join(" | ")
        }
    }
}
