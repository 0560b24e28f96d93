//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
