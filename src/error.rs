use thiserror::Error;

use crate::domain::ticket::Priority;

pub type Result<T> = std::result::Result<T, DeskError>;

#[derive(Debug, Error)]
pub enum DeskError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid ticket ID format: {0}")]
    InvalidTicketId(String),

    #[error("Invalid request type: {0}")]
    InvalidRequestType(String),

    #[error("Invalid priority: {0}")]
    InvalidPriority(String),

    #[error("No more {0} ticket ids can be issued")]
    CounterExhausted(Priority),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
