use clap::Parser;
use deploy_bootstrap::config::env::load_env_file;
use deploy_bootstrap::utils::{logger, validation::Validate};
use deploy_bootstrap::{build_engine, Adapters, BootArgs, BootConfig, BootError, BootExit, CommandSpec};

fn fail(error: &BootError) -> ! {
    tracing::error!(
        "❌ Boot failed: {} (Category: {:?}, Severity: {:?})",
        error,
        error.category(),
        error.severity()
    );
    tracing::error!("💡 Suggestion: {}", error.recovery_suggestion());
    eprintln!("❌ {}", error.user_friendly_message());
    std::process::exit(1);
}

fn load_config(args: &BootArgs) -> Result<(BootConfig, CommandSpec), BootError> {
    let (path, required) = args.config_path();
    let config = BootConfig::load(&path, required)?;
    config.validate()?;

    // 命令列指定的 server 指令優先
    let server = match CommandSpec::from_argv(&args.server_command) {
        Some(server) => server,
        None => config.server_command()?,
    };
    Ok((config, server))
}

#[tokio::main]
async fn main() {
    let args = BootArgs::parse();

    // 初始化日誌
    logger::init_logger(args.verbose, args.log_format);
    tracing::debug!("Boot args: {:?}", args);

    if let Some(env_file) = &args.env_file {
        if let Err(e) = load_env_file(env_file) {
            fail(&e);
        }
        tracing::info!("📁 Loaded variables from {}", env_file.display());
    }

    let (config, server) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => fail(&e),
    };

    let engine = match build_engine(args.variant, &config, server, Adapters::system()) {
        Ok(engine) => engine,
        Err(e) => fail(&e),
    };

    let result = engine.run().await;
    match result.exit {
        BootExit::HandedOff(code) => std::process::exit(code),
        BootExit::Failed { step, error } => {
            tracing::error!("❌ Boot aborted at `{}`", step);
            fail(&error)
        }
    }
}
