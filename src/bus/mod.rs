//! Message bus boundary.
//!
//! The worker never manages the connection itself: [`Bus`] is opened once per
//! process and released when dropped, and the worker only receives a
//! [`Subscription`] to pull deliveries from.

pub mod subscription;

pub use subscription::{decode_message, ChannelSubscription, LineSubscription, Subscription};

use std::env;
use std::fs;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::config::WorkerConfig;

/// Subscriber names share this prefix so all report workers form one consumer group per host.
pub const SUBSCRIBER_PREFIX: &str = "ReportGenerator";

#[derive(Debug, Error)]
pub enum BusError {
    #[error("malformed report message: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid report message: {0}")]
    Invalid(String),
    #[error("failed to read from bus: {0}")]
    Io(#[from] std::io::Error),
}

/// `ReportGenerator@{machine}`
pub fn subscriber_id(machine_name: &str) -> String {
    format!("{SUBSCRIBER_PREFIX}@{machine_name}")
}

/// Best-effort name of the host this process runs on.
pub fn machine_name() -> String {
    ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .filter_map(|name| env::var(name).ok())
        .chain(fs::read_to_string("/etc/hostname").ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Process-scoped bus handle.
#[derive(Debug)]
pub struct Bus {
    subscriber_id: String,
}

impl Bus {
    pub fn open(config: &WorkerConfig) -> Self {
        let machine = config.host_name.clone().unwrap_or_else(machine_name);
        let subscriber_id = subscriber_id(&machine);
        log::info!("Connected to report bus as {}", subscriber_id);
        Self { subscriber_id }
    }

    pub fn subscriber_id(&self) -> &str {
        &self.subscriber_id
    }

    /// Subscribe to newline-delimited JSON reports read from `reader`.
    pub fn subscribe_lines<R>(&self, reader: R) -> LineSubscription<R>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        log::info!("{} subscribed to doctor reports", self.subscriber_id);
        LineSubscription::new(reader.lines())
    }
}

impl Drop for Bus {
    fn drop(&mut self) {
        log::info!("Released report bus connection for {}", self.subscriber_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_id() {
        assert_eq!(subscriber_id("worker-7"), "ReportGenerator@worker-7");
    }

    #[test]
    fn test_machine_name_is_not_empty() {
        assert!(!machine_name().is_empty());
    }

    #[test]
    fn test_bus_uses_configured_host_name() {
        let config = WorkerConfig {
            host_name: Some("reports-01".into()),
            ..WorkerConfig::default()
        };
        let bus = Bus::open(&config);
        assert_eq!(bus.subscriber_id(), "ReportGenerator@reports-01");
    }
}
