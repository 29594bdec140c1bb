//! RabbitMQ queue broker adapter (C6): durable MAIN/DLQ queues over `lapin`.

mod broker;
mod error;

pub use broker::{ack, nack_no_requeue, QueueBroker};
pub use error::QueueError;
