// shared/src/lib.rs

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("network error: {0}")]
    Network(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("install failed: {0}")]
    InstallFailed(String),
    #[error("origin unreachable and no cached fallback available")]
    Unreachable,
    #[error("invalid worker state: expected {expected}, was {actual}")]
    InvalidState { expected: String, actual: String },
    #[error("internal: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod config;
