use anyhow::{bail, Context};
use clap::Parser;
use deploy_bootstrap::adapters::SystemCommandRunner;
use deploy_bootstrap::config::resolve_config_path;
use deploy_bootstrap::setup::{self, LocalSetup};
use deploy_bootstrap::utils::logger::{self, LogFormat};
use deploy_bootstrap::BootConfig;
use dialoguer::{theme::ColorfulTheme, Confirm};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "local-setup")]
#[command(about = "Install and start local dependencies for development (macOS)")]
struct Args {
    /// Path to TOML configuration file (default: bootstrap.toml, optional)
    #[arg(short, long, env = "BOOT_CONFIG")]
    config: Option<PathBuf>,

    /// Project directory holding the env files and package manifest
    #[arg(long, default_value = ".")]
    project_dir: PathBuf,

    /// Do not ask for confirmation
    #[arg(short, long)]
    yes: bool,

    /// Show what would be done without executing
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_logger(args.verbose, LogFormat::Pretty);

    let (config_path, required) = resolve_config_path(args.config.as_deref());
    let config = BootConfig::load(&config_path, required)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let actions = setup::plan(&config.setup, &args.project_dir).context("invalid [setup] section")?;

    println!("🔧 Local setup plan:");
    for (i, action) in actions.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, action);
    }

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing was executed");
        return Ok(());
    }

    let runner = SystemCommandRunner::with_working_dir(&args.project_dir);
    let local = LocalSetup::new(&runner);
    local.check_preconditions(std::env::consts::OS).await?;

    if !args.yes {
        let proceed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Proceed with local setup?")
            .default(true)
            .interact()
            .context("failed to read confirmation")?;
        if !proceed {
            bail!("setup cancelled");
        }
    }

    let statuses = local.run_all(&actions).await.context("local setup failed")?;
    let skipped = statuses
        .iter()
        .filter(|s| matches!(s, setup::ActionStatus::Skipped(_)))
        .count();

    println!("✅ Local environment ready ({} step(s) skipped)", skipped);
    println!("💡 Next: review {} and start the dev server", config.setup.env_file);
    Ok(())
}
