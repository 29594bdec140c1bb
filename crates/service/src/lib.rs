//! Pipeline Orchestrator (C8) and Worker Supervisor (C9) for the SMS
//! cost-guard pipeline: the state machine tying the dedup store, daily
//! limiter, rule engine, AI advisor, provider sink, queue broker and event
//! store together, plus the two long-lived consumer loops that drive it.

mod config;
mod deps;
mod error;
mod orchestrator;
mod supervisor;

pub use config::PipelineConfig;
pub use deps::Deps;
pub use error::PipelineError;
pub use orchestrator::{process_dlq_payload, process_main_payload, ProcessOutcome};
pub use supervisor::WorkerSupervisor;
