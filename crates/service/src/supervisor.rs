//! Worker Supervisor (C9): starts the main and DLQ consumer loops and shuts
//! both down cleanly on signal (spec.md §4.9).
//!
//! Modeled on the teacher's `start_background_processor` (one
//! `tokio::spawn`ed loop per concern) combined with the CLI's composition
//! style — two `tokio::spawn`ed consumer loops here, joined on
//! `tokio::signal::ctrl_c()`, with a `tokio::sync::watch` channel standing
//! in for the original's `threading.Event` used to signal both consumer
//! threads to stop.

use std::sync::Arc;

use futures_util::StreamExt;
use lapin::message::Delivery;
use tokio::sync::watch;

use crate::deps::Deps;
use crate::error::PipelineError;
use crate::orchestrator::{process_dlq_delivery, process_main_delivery};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConsumerKind {
    Main,
    Dlq,
}

pub struct WorkerSupervisor {
    deps: Arc<Deps>,
}

impl WorkerSupervisor {
    #[must_use]
    pub const fn new(deps: Arc<Deps>) -> Self {
        Self { deps }
    }

    /// Starts both consumer loops and blocks until `SIGINT`/Ctrl-C, at which
    /// point it signals both loops to stop accepting new deliveries and
    /// waits for the in-flight one (if any) to finish — prefetch=1 means
    /// there is at most one in-flight delivery per consumer.
    ///
    /// # Errors
    /// Returns `PipelineError::Queue` if either consumer fails to start, or
    /// `PipelineError::Connection` if waiting on the shutdown signal fails.
    pub async fn run_until_shutdown(&self) -> Result<(), PipelineError> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let main_deps = Arc::clone(&self.deps);
        let main_shutdown = shutdown_rx.clone();
        let main_handle =
            tokio::spawn(async move { run_consumer_loop(main_deps, ConsumerKind::Main, main_shutdown).await });

        let dlq_deps = Arc::clone(&self.deps);
        let dlq_shutdown = shutdown_rx.clone();
        let dlq_handle =
            tokio::spawn(async move { run_consumer_loop(dlq_deps, ConsumerKind::Dlq, dlq_shutdown).await });

        tokio::signal::ctrl_c().await.map_err(|err| PipelineError::Connection(err.to_string()))?;
        tracing::info!("shutdown signal received, draining in-flight deliveries");
        drop(shutdown_tx.send(true));

        let (main_result, dlq_result) = tokio::join!(main_handle, dlq_handle);
        main_result.map_err(|err| PipelineError::Connection(err.to_string()))??;
        dlq_result.map_err(|err| PipelineError::Connection(err.to_string()))??;
        tracing::info!("worker supervisor shut down cleanly");
        Ok(())
    }
}

async fn run_consumer_loop(
    deps: Arc<Deps>,
    kind: ConsumerKind,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), PipelineError> {
    let (queue_name, consumer_tag) = match kind {
        ConsumerKind::Main => (deps.queue.main_queue(), "smsguard-main"),
        ConsumerKind::Dlq => (deps.queue.dlq_queue(), "smsguard-dlq"),
    };
    let (_channel, mut consumer) = deps.queue.consume(queue_name, consumer_tag).await?;
    tracing::info!(queue = queue_name, "consumer started");

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => {
                tracing::info!(queue = queue_name, "consumer stopping on shutdown signal");
                break;
            },
            next = consumer.next() => {
                let Some(delivery_result) = next else {
                    tracing::warn!(queue = queue_name, "consumer stream closed");
                    break;
                };
                match delivery_result {
                    Ok(delivery) => handle_delivery(&deps, kind, delivery).await,
                    Err(err) => tracing::error!(queue = queue_name, error = %err, "consumer stream error"),
                }
            },
        }
    }

    Ok(())
}

async fn handle_delivery(deps: &Deps, kind: ConsumerKind, delivery: Delivery) {
    let outcome = match kind {
        ConsumerKind::Main => process_main_delivery(deps, &delivery.data).await,
        ConsumerKind::Dlq => process_dlq_delivery(deps, &delivery.data).await,
    };

    match outcome {
        Ok(result) => {
            tracing::debug!(?result, "delivery processed");
            if let Err(err) = smsguard_queue::ack(&delivery).await {
                tracing::error!(error = %err, "failed to ack delivery");
            }
        },
        Err(err) if err.is_bad_payload() => {
            tracing::warn!(error = %err, "discarding bad payload");
            if let Err(nack_err) = smsguard_queue::nack_no_requeue(&delivery).await {
                tracing::error!(error = %nack_err, "failed to nack bad payload");
            }
        },
        Err(err) => {
            // spec.md §7 / DESIGN.md: every error the orchestrator raises
            // here has already left the event row in a consistent state (or
            // unchanged), so re-delivery of the same tag would only repeat
            // work that a future upstream publish or operator replay should
            // own instead. Matches `consumer.py`'s unconditional
            // `nack(requeue=false)`.
            tracing::error!(error = %err, "pipeline processing failed");
            if let Err(nack_err) = smsguard_queue::nack_no_requeue(&delivery).await {
                tracing::error!(error = %nack_err, "failed to nack after processing error");
            }
        },
    }
}
