//! Typed error hierarchy for roomboard.
//!
//! Three top-level enums cover the three surfaces:
//! - `GateError`: session gate failures, mapped onto HTTP statuses
//! - `BoardError`: mutation protocol failures, caught at the session boundary
//! - `ClientError`: failures seen by a client joining a room through the gate

use thiserror::Error;

/// Errors from the session gate.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Name, email, and room key are required")]
    Validation,

    #[error("Invalid room key")]
    Authorization { room_id: String },

    #[error("Sync service refused the session with status {status}")]
    SyncRejected { status: u16 },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Errors from a board mutation. Always recoverable: the mutation is
/// aborted with no partial effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("Column {id} not found")]
    ColumnNotFound { id: String },

    #[error("Task {id} not found")]
    TaskNotFound { id: String },
}

impl BoardError {
    /// Short, id-free description used in user-facing notices.
    pub fn summary(&self) -> &'static str {
        match self {
            Self::ColumnNotFound { .. } => "Column not found",
            Self::TaskNotFound { .. } => "Task not found",
        }
    }
}

/// Errors seen by a client talking to the session gate.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Authorization(String),

    #[error("Gate answered {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Session expired. Please authenticate again.")]
    Transport(#[source] reqwest::Error),

    #[error("Invalid room location: {0}")]
    InvalidRoom(String),
}

impl ClientError {
    /// Whether the caller must drop its authenticated state and re-enter the gate.
    pub fn requires_reauth(&self) -> bool {
        !matches!(self, Self::InvalidRoom(_))
    }
}
