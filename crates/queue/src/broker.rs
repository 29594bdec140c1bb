//! RabbitMQ adapter (C6): durable MAIN/DLQ queues, a lazily-reopened
//! publisher channel, and prefetch=1 consumers with manual ack/nack.
//!
//! Grounded on `worker/publisher.py` (thread-local channel cache, persistent
//! delivery mode) and `worker/consumer.py` (per-consumer QoS, ack on
//! success, `nack(requeue=false)` on any processing error).

use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions, BasicQosOptions,
    QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use smsguard_core::constants::QUEUE_PREFETCH_COUNT;
use tokio::sync::Mutex;

use crate::error::QueueError;

pub struct QueueBroker {
    connection: Connection,
    main_queue: String,
    dlq_queue: String,
    /// Cached publish channel, reopened lazily on first use or after close —
    /// the async analogue of `publisher.py`'s `threading.local()` cache.
    publish_channel: Mutex<Option<Channel>>,
}

impl QueueBroker {
    /// Connects, declares both durable queues, and returns a ready broker.
    ///
    /// # Errors
    /// Returns `QueueError::Amqp` if the connection or queue declaration
    /// fails.
    pub async fn connect(amqp_url: &str, main_queue: impl Into<String>, dlq_queue: impl Into<String>) -> Result<Self, QueueError> {
        let connection = Connection::connect(amqp_url, ConnectionProperties::default()).await?;
        let broker = Self {
            connection,
            main_queue: main_queue.into(),
            dlq_queue: dlq_queue.into(),
            publish_channel: Mutex::new(None),
        };
        let setup_channel = broker.connection.create_channel().await?;
        broker.declare_queues(&setup_channel).await?;
        tracing::info!(main = %broker.main_queue, dlq = %broker.dlq_queue, "queue broker connected");
        Ok(broker)
    }

    async fn declare_queues(&self, channel: &Channel) -> Result<(), QueueError> {
        for queue in [&self.main_queue, &self.dlq_queue] {
            channel
                .queue_declare(queue, QueueDeclareOptions { durable: true, ..Default::default() }, FieldTable::default())
                .await?;
        }
        Ok(())
    }

    async fn publish_channel(&self) -> Result<Channel, QueueError> {
        let mut guard = self.publish_channel.lock().await;
        if let Some(channel) = guard.as_ref() {
            if channel.status().connected() {
                return Ok(channel.clone());
            }
        }
        let channel = self.connection.create_channel().await?;
        self.declare_queues(&channel).await?;
        *guard = Some(channel.clone());
        Ok(channel)
    }

    /// Publishes `payload` with persistent delivery mode to the named queue.
    ///
    /// # Errors
    /// Returns `QueueError::Serialization` if `payload` can't be serialized,
    /// or `QueueError::Amqp` if the publish itself fails.
    pub async fn publish<T: serde::Serialize>(&self, queue: &str, payload: &T) -> Result<(), QueueError> {
        let body = serde_json::to_vec(payload)?;
        let channel = self.publish_channel().await?;
        channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default().with_delivery_mode(2),
            )
            .await?
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn main_queue(&self) -> &str {
        &self.main_queue
    }

    #[must_use]
    pub fn dlq_queue(&self) -> &str {
        &self.dlq_queue
    }

    /// Opens a dedicated consumer channel on `queue` with per-consumer
    /// prefetch=1 (strict one-in-flight ordering per worker, spec.md §4.6).
    ///
    /// # Errors
    /// Returns `QueueError::Amqp` if the channel, QoS, or consume setup
    /// fails.
    pub async fn consume(&self, queue: &str, consumer_tag: &str) -> Result<(Channel, lapin::Consumer), QueueError> {
        let channel = self.connection.create_channel().await?;
        channel.basic_qos(QUEUE_PREFETCH_COUNT, BasicQosOptions::default()).await?;
        let consumer = channel
            .basic_consume(queue, consumer_tag, BasicConsumeOptions::default(), FieldTable::default())
            .await?;
        Ok((channel, consumer))
    }
}

/// Acks a delivery after successful processing.
///
/// # Errors
/// Returns `QueueError::Amqp` if the ack fails.
pub async fn ack(delivery: &lapin::message::Delivery) -> Result<(), QueueError> {
    delivery.ack(BasicAckOptions::default()).await.map_err(QueueError::from)
}

/// Nacks a delivery without requeue after a processing error — the
/// orchestrator has already written the event row before this point, so
/// re-delivery of the same tag would double-act (spec.md §4.6).
///
/// # Errors
/// Returns `QueueError::Amqp` if the nack fails.
pub async fn nack_no_requeue(delivery: &lapin::message::Delivery) -> Result<(), QueueError> {
    delivery.nack(BasicNackOptions { requeue: false, ..Default::default() }).await.map_err(QueueError::from)
}
