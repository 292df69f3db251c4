use crate::domain::model::CommandSpec;
use crate::utils::error::{BootError, Result};
use crate::utils::validation::{
    validate_command, validate_identifier, validate_non_empty_string, validate_positive_number,
    Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BootConfig {
    pub migration: MigrationConfig,
    pub diagnostics: DiagnosticsConfig,
    pub server: ServerConfig,
    pub setup: SetupConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Forward, versioned migration
    pub deploy: Vec<String>,
    /// Destructive fallback, extended variant only
    pub push: Vec<String>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            deploy: argv(&["npx", "prisma", "migrate", "deploy"]),
            push: argv(&["npx", "prisma", "db", "push", "--accept-data-loss"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub tls_library: String,
    pub tls_command: Vec<String>,
    pub library_index: Vec<String>,
    pub client_dir: String,
    pub client_load: Vec<String>,
    pub redis_default_port: u16,
    pub dns_timeout_secs: u64,
    pub db_connect_timeout_secs: u64,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            tls_library: "libssl".to_string(),
            tls_command: argv(&["openssl", "version"]),
            library_index: argv(&["ldconfig", "-p"]),
            client_dir: "node_modules/.prisma/client".to_string(),
            client_load: argv(&["node", "-e", "require('@prisma/client')"]),
            redis_default_port: 6379,
            dns_timeout_secs: 5,
            db_connect_timeout_secs: 10,
        }
    }
}

impl DiagnosticsConfig {
    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }

    pub fn db_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.db_connect_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub command: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: argv(&["node", "dist/index.js"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    pub formulae: Vec<String>,
    pub services: Vec<String>,
    pub database_name: String,
    pub database_user: String,
    pub env_example: String,
    pub env_file: String,
    pub install: Vec<String>,
    pub generate: Vec<String>,
    /// How often `pg_isready` is tried after the services start
    pub database_wait_attempts: u32,
    pub database_wait_interval_secs: u64,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            formulae: argv(&["postgresql@16", "redis", "cloudflared", "pnpm"]),
            services: argv(&["postgresql@16", "redis"]),
            database_name: "app_dev".to_string(),
            database_user: "app".to_string(),
            env_example: ".env.example".to_string(),
            env_file: ".env".to_string(),
            install: argv(&["pnpm", "install"]),
            generate: argv(&["pnpm", "exec", "prisma", "generate"]),
            database_wait_attempts: 10,
            database_wait_interval_secs: 1,
        }
    }
}

impl BootConfig {
    /// 從 TOML 檔案載入配置
    ///
    /// A missing file yields the built-in defaults unless `required` is set.
    pub fn load<P: AsRef<Path>>(path: P, required: bool) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            if required {
                return Err(BootError::ConfigError {
                    message: format!("config file '{}' not found", path.display()),
                });
            }
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| BootError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATABASE_URL})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
        let re = PLACEHOLDER.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_command("migration.deploy", &self.migration.deploy)?;
        validate_command("migration.push", &self.migration.push)?;
        validate_command("server.command", &self.server.command)?;

        let diagnostics = &self.diagnostics;
        validate_non_empty_string("diagnostics.tls_library", &diagnostics.tls_library)?;
        validate_command("diagnostics.tls_command", &diagnostics.tls_command)?;
        validate_command("diagnostics.library_index", &diagnostics.library_index)?;
        validate_non_empty_string("diagnostics.client_dir", &diagnostics.client_dir)?;
        validate_command("diagnostics.client_load", &diagnostics.client_load)?;
        validate_positive_number("diagnostics.dns_timeout_secs", diagnostics.dns_timeout_secs, 1)?;
        validate_positive_number(
            "diagnostics.db_connect_timeout_secs",
            diagnostics.db_connect_timeout_secs,
            1,
        )?;

        Ok(())
    }

    pub fn deploy_command(&self) -> Result<CommandSpec> {
        to_spec("migration.deploy", &self.migration.deploy)
    }

    pub fn push_command(&self) -> Result<CommandSpec> {
        to_spec("migration.push", &self.migration.push)
    }

    pub fn server_command(&self) -> Result<CommandSpec> {
        to_spec("server.command", &self.server.command)
    }
}

impl SetupConfig {
    pub fn database_wait_interval(&self) -> Duration {
        Duration::from_secs(self.database_wait_interval_secs)
    }

    pub fn validate_setup(&self) -> Result<()> {
        validate_identifier("setup.database_name", &self.database_name)?;
        validate_identifier("setup.database_user", &self.database_user)?;
        validate_non_empty_string("setup.env_example", &self.env_example)?;
        validate_non_empty_string("setup.env_file", &self.env_file)?;
        validate_command("setup.install", &self.install)?;
        validate_command("setup.generate", &self.generate)?;
        validate_positive_number(
            "setup.database_wait_attempts",
            u64::from(self.database_wait_attempts),
            1,
        )?;
        for formula in self.formulae.iter().chain(self.services.iter()) {
            validate_non_empty_string("setup.formulae", formula)?;
        }
        Ok(())
    }
}

pub(crate) fn to_spec(field: &str, argv: &[String]) -> Result<CommandSpec> {
    validate_command(field, argv)?;
    CommandSpec::from_argv(argv).ok_or_else(|| BootError::ConfigError {
        message: format!("{} is empty", field),
    })
}

impl Validate for BootConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
