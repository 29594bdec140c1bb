//! Worker supervisor composition root (C9 entrypoint).
//!
//! Reads the pipeline's env configuration, connects every collaborator
//! (Postgres, RabbitMQ, Redis, optionally the advisor HTTP client), and runs
//! both consumer loops until a shutdown signal arrives. Mirrors the
//! teacher's `commands/serve.rs`: one function, one composition root, no
//! business logic of its own.

use std::sync::Arc;

use anyhow::Result;
use smsguard_service::{Deps, PipelineConfig, WorkerSupervisor};

pub(crate) async fn run() -> Result<()> {
    let config = PipelineConfig::from_env()?;
    tracing::info!(
        main_queue = %config.rabbitmq_main_queue,
        dlq = %config.rabbitmq_dlq,
        ai_configured = config.openrouter_api_key.is_some(),
        "starting smsguard worker"
    );

    let deps = Arc::new(Deps::connect(config).await?);
    let supervisor = WorkerSupervisor::new(deps);
    supervisor.run_until_shutdown().await?;
    Ok(())
}
