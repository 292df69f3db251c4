pub mod env;
pub mod toml_config;

use crate::domain::model::Variant;
use crate::utils::logger::LogFormat;
use clap::Parser;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "bootstrap.toml";

#[derive(Debug, Clone, Parser)]
#[command(name = "deploy-bootstrap")]
#[command(about = "Validate the environment, migrate the database and hand off to the server")]
pub struct BootArgs {
    /// Path to TOML configuration file
    #[arg(short, long, env = "BOOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Start procedure to run
    #[arg(long, env = "BOOT_VARIANT", value_enum, default_value_t = Variant::Extended)]
    pub variant: Variant,

    /// Load variables from a dotenv file before validation
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    #[arg(long, env = "BOOT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Server command, overrides `[server] command` from the config file
    #[arg(last = true)]
    pub server_command: Vec<String>,
}

/// 設定檔路徑與是否必須存在 (明確指定時必須存在)
pub fn resolve_config_path(explicit: Option<&Path>) -> (PathBuf, bool) {
    match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    }
}

impl BootArgs {
    pub fn config_path(&self) -> (PathBuf, bool) {
        resolve_config_path(self.config.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_uses_defaults() {
        let args = BootArgs::try_parse_from(["deploy-bootstrap"]).unwrap();
        assert_eq!(args.variant, Variant::Extended);
        assert_eq!(args.log_format, LogFormat::Pretty);
        assert!(args.server_command.is_empty());
        assert_eq!(
            args.config_path(),
            (PathBuf::from(DEFAULT_CONFIG_PATH), false)
        );
    }

    #[test]
    fn test_trailing_server_command() {
        let args = BootArgs::try_parse_from([
            "deploy-bootstrap",
            "--variant",
            "basic",
            "--config",
            "deploy/boot.toml",
            "--",
            "node",
            "server.js",
            "--port",
            "3000",
        ])
        .unwrap();
        assert_eq!(args.variant, Variant::Basic);
        assert_eq!(args.server_command, vec!["node", "server.js", "--port", "3000"]);
        assert_eq!(args.config_path(), (PathBuf::from("deploy/boot.toml"), true));
    }
}
