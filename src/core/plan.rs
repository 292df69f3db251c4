use crate::adapters::{ExecHandoff, PgDatabaseProbe, SystemCommandRunner, SystemResolver};
use crate::config::toml_config::{to_spec, BootConfig};
use crate::core::boot::BootEngine;
use crate::core::steps::{
    ClientLoadStep, ConnectivityStep, LibraryIndexProbe, MigrateStep, ProbeStep, RedisDnsProbe,
    TlsCommandProbe,
};
use crate::domain::model::{CommandSpec, Variant};
use crate::domain::ports::{CommandRunner, DatabaseProbe, Handoff, Resolver};
use crate::utils::error::Result;
use std::sync::Arc;

/// Everything the boot steps need from the outside world.
pub struct Adapters {
    pub runner: Arc<dyn CommandRunner>,
    pub resolver: Arc<dyn Resolver>,
    pub database: Arc<dyn DatabaseProbe>,
    pub handoff: Box<dyn Handoff>,
}

impl Adapters {
    pub fn system() -> Self {
        Self {
            runner: Arc::new(SystemCommandRunner::new()),
            resolver: Arc::new(SystemResolver),
            database: Arc::new(PgDatabaseProbe),
            handoff: Box::new(ExecHandoff),
        }
    }
}

/// Assemble the step list for `variant`.
///
/// basic:    migrate (fatal on failure)
/// extended: tls-command, tls-library-index, redis-dns, client-load,
///           migrate (push fallback), database-connectivity
pub fn build_engine(
    variant: Variant,
    config: &BootConfig,
    server: CommandSpec,
    adapters: Adapters,
) -> Result<BootEngine> {
    let Adapters {
        runner,
        resolver,
        database,
        handoff,
    } = adapters;
    let engine = BootEngine::new(variant, server, handoff);
    let deploy = config.deploy_command()?;

    if variant == Variant::Basic {
        return Ok(engine.with_step(MigrateStep::new(runner, deploy, None)));
    }

    let diagnostics = &config.diagnostics;
    let engine = engine
        .with_step(ProbeStep::new(TlsCommandProbe::new(
            runner.clone(),
            to_spec("diagnostics.tls_command", &diagnostics.tls_command)?,
        )))
        .with_step(ProbeStep::new(LibraryIndexProbe::new(
            runner.clone(),
            to_spec("diagnostics.library_index", &diagnostics.library_index)?,
            diagnostics.tls_library.clone(),
        )))
        .with_step(ProbeStep::new(RedisDnsProbe::new(
            resolver,
            diagnostics.redis_default_port,
            diagnostics.dns_timeout(),
        )))
        .with_step(ClientLoadStep::new(
            runner.clone(),
            &diagnostics.client_dir,
            to_spec("diagnostics.client_load", &diagnostics.client_load)?,
            &diagnostics.tls_library,
        )?)
        .with_step(MigrateStep::new(
            runner,
            deploy,
            Some(config.push_command()?),
        ))
        .with_step(ConnectivityStep::new(
            database,
            diagnostics.db_connect_timeout(),
        ));

    Ok(engine)
}
