use crate::domain::model::{BootPhase, StepOutcome};
use crate::domain::ports::{BootContext, DatabaseProbe, Step};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub struct ConnectivityStep {
    database: Arc<dyn DatabaseProbe>,
    timeout: Duration,
}

impl ConnectivityStep {
    pub fn new(database: Arc<dyn DatabaseProbe>, timeout: Duration) -> Self {
        Self { database, timeout }
    }
}

#[async_trait]
impl Step for ConnectivityStep {
    fn name(&self) -> &str {
        "database-connectivity"
    }

    fn phase(&self) -> BootPhase {
        BootPhase::VerifyingConnectivity
    }

    async fn run(&self, ctx: &BootContext) -> StepOutcome {
        match self.database.ping(&ctx.database_url, self.timeout).await {
            Ok(()) => StepOutcome::Ok("database connection verified".to_string()),
            Err(e) => StepOutcome::Warn(format!("database connectivity check failed: {}", e)),
        }
    }
}
