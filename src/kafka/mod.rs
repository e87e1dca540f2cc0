//! Kafka 工具模块
//!
//! Role-specific configuration views and client builders over `rdkafka`.

pub mod consumer_builder;
pub mod consumer_config;
pub mod producer_builder;
pub mod producer_config;

pub use consumer_builder::{build_kafka_consumer, subscribe_consumer};
pub use consumer_config::KafkaConsumerConfig;
pub use producer_builder::build_kafka_producer;
pub use producer_config::KafkaProducerConfig;

use std::fmt;

/// Role a client handle is bound to, alongside its topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientRole {
    Producer,
    Consumer,
}

impl fmt::Display for ClientRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientRole::Producer => write!(f, "producer"),
            ClientRole::Consumer => write!(f, "consumer"),
        }
    }
}
