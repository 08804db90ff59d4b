use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CacheEvent {
    WriteCompleted(WriteCompletedEvent),
    WriteFailed(WriteFailedEvent),
}

impl CacheEvent {
    pub fn partition(&self) -> &str {
        match self {
            CacheEvent::WriteCompleted(e) => &e.partition,
            CacheEvent::WriteFailed(e) => &e.partition,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            CacheEvent::WriteCompleted(e) => &e.key,
            CacheEvent::WriteFailed(e) => &e.key,
        }
    }
}

/// A background cache write finished.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteCompletedEvent {
    pub partition: String,
    pub key: String,
    pub body_size: usize,
    pub timestamp: u64,
}

/// A background cache write failed. The request that triggered it already
/// completed; this is observability only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteFailedEvent {
    pub partition: String,
    pub key: String,
    pub reason: String,
    pub timestamp: u64,
}

/// Helper to get current timestamp in seconds since UNIX epoch
pub fn now_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
