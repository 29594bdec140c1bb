//! `Deps`: a constructed context carrying every pipeline collaborator,
//! passed through the orchestrator instead of relying on process-wide
//! globals (spec.md §9 Design Notes). Modeled on the teacher's service
//! structs (`Arc<StorageBackend>`, `Arc<LlmClient>` held by value, async
//! methods taking `&self`).

use std::time::Duration;

use smsguard_advisor::AdvisorClient;
use smsguard_dedup::{DailyLimiter, DedupStore};
use smsguard_queue::QueueBroker;
use smsguard_storage::PgStore;

use crate::config::PipelineConfig;
use crate::error::PipelineError;

pub struct Deps {
    pub store: PgStore,
    pub queue: QueueBroker,
    pub dedup: DedupStore,
    pub limiter: DailyLimiter,
    pub advisor_client: Option<AdvisorClient>,
    pub config: PipelineConfig,
}

impl Deps {
    /// Connects to every collaborator named in `config`: Postgres (runs
    /// migrations), RabbitMQ (declares MAIN/DLQ), and Redis (dedup store and
    /// daily limiter). Constructs the advisor's HTTP client only if
    /// `OPENROUTER_API_KEY` is set — otherwise `advise()` takes the "AI not
    /// configured" branch of spec.md §4.3 step 1.
    ///
    /// # Errors
    /// Returns `PipelineError::Storage`/`Queue`/`Connection` if the
    /// respective collaborator fails to connect.
    pub async fn connect(config: PipelineConfig) -> Result<Self, PipelineError> {
        let store = PgStore::new(&config.database_url).await?;
        let queue =
            QueueBroker::connect(&config.rabbitmq_url, config.rabbitmq_main_queue.clone(), config.rabbitmq_dlq.clone())
                .await?;
        let dedup = DedupStore::connect(&config.redis_url, config.dedup_key_prefix.clone())
            .await
            .map_err(|err| PipelineError::Connection(err.to_string()))?;
        let limiter =
            DailyLimiter::connect(&config.redis_url).await.map_err(|err| PipelineError::Connection(err.to_string()))?;

        let advisor_client = config.openrouter_api_key.as_ref().map(|key| {
            AdvisorClient::new(
                key.clone(),
                config.openrouter_base_url.clone(),
                Duration::from_secs(config.openrouter_timeout_secs),
            )
        });

        Ok(Self { store, queue, dedup, limiter, advisor_client, config })
    }
}
