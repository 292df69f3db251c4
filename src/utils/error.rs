use thiserror::Error;

#[derive(Error, Debug)]
pub enum BootError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Missing required environment variable: {var}")]
    MissingEnvError { var: String },

    #[error("Invalid value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Command `{program}` failed: {message}")]
    CommandError { program: String, message: String },

    #[error("Database client failed to load: {message}")]
    ClientLoadError { message: String },

    #[error("DNS resolution failed for {host}: {message}")]
    ResolveError { host: String, message: String },

    #[error("{operation} timed out after {seconds}s")]
    TimeoutError { operation: String, seconds: u64 },

    #[error("Handoff to `{program}` failed: {source}")]
    HandoffError {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Step `{step}` failed: {message}")]
    StepFailed { step: String, message: String },

    #[error("Setup error: {message}")]
    SetupError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Environment,
    ExternalTool,
    Network,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BootError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BootError::MissingEnvError { .. }
            | BootError::InvalidConfigValueError { .. }
            | BootError::ConfigError { .. } => ErrorCategory::Configuration,
            BootError::ClientLoadError { .. }
            | BootError::StepFailed { .. }
            | BootError::SetupError { .. } => ErrorCategory::Environment,
            BootError::CommandError { .. } => ErrorCategory::ExternalTool,
            BootError::DatabaseError(_)
            | BootError::ResolveError { .. }
            | BootError::TimeoutError { .. } => ErrorCategory::Network,
            BootError::IoError(_) | BootError::HandoffError { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 診斷類錯誤只會降級為警告
            BootError::ResolveError { .. }
            | BootError::TimeoutError { .. }
            | BootError::DatabaseError(_) => ErrorSeverity::Low,
            BootError::CommandError { .. } => ErrorSeverity::Medium,
            BootError::MissingEnvError { .. }
            | BootError::InvalidConfigValueError { .. }
            | BootError::ConfigError { .. }
            | BootError::SetupError { .. } => ErrorSeverity::High,
            BootError::ClientLoadError { .. }
            | BootError::StepFailed { .. }
            | BootError::IoError(_)
            | BootError::HandoffError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            BootError::MissingEnvError { var } => {
                format!("Set {} in the service variables before deploying", var)
            }
            BootError::InvalidConfigValueError { field, .. } => {
                format!("Fix the value of `{}` in the bootstrap configuration", field)
            }
            BootError::ConfigError { .. } => {
                "Check that the configuration file exists and is valid TOML".to_string()
            }
            BootError::CommandError { program, .. } => {
                format!("Make sure `{}` is installed and on PATH", program)
            }
            BootError::ClientLoadError { .. } => {
                "Install the TLS library (e.g. openssl) in the runtime image".to_string()
            }
            BootError::ResolveError { .. } => {
                "Enable dual-stack lookup (family=0) in the cache client".to_string()
            }
            BootError::TimeoutError { .. } | BootError::DatabaseError(_) => {
                "Verify the database is reachable from this network".to_string()
            }
            BootError::HandoffError { .. } => {
                "Check the server command and that the build output exists".to_string()
            }
            BootError::StepFailed { step, .. } => {
                format!("Inspect the `{}` log lines above for the failing command", step)
            }
            BootError::SetupError { .. } => {
                "Run local-setup on macOS with Homebrew installed".to_string()
            }
            BootError::IoError(_) => "Check file permissions and disk space".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Environment => format!("Runtime environment problem: {}", self),
            ErrorCategory::ExternalTool => format!("External tool problem: {}", self),
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::System => format!("System problem: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, BootError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_env_is_configuration_error() {
        let err = BootError::MissingEnvError {
            var: "DATABASE_URL".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.recovery_suggestion().contains("DATABASE_URL"));
        assert!(err.user_friendly_message().starts_with("Configuration problem"));
    }

    #[test]
    fn test_resolve_error_is_low_severity() {
        let err = BootError::ResolveError {
            host: "cache.internal".to_string(),
            message: "no records".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert!(err.recovery_suggestion().contains("family=0"));
    }
}
