//! Shared error types for the services crate.

use thiserror::Error;

use edusync_core::model::OptionId;
use gateway::GatewayError;

/// Errors emitted by assessment sessions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session is not accepting answers")]
    NotActive,
    #[error("session has already been started")]
    AlreadyStarted,
    #[error("no submission is in flight")]
    NotSubmitting,
    #[error("question {index} is out of range (assessment has {total})")]
    QuestionOutOfRange { index: usize, total: usize },
    #[error("option {option} does not belong to question {index}")]
    UnknownOption { index: usize, option: OptionId },
    #[error("question {index} must be answered before moving on")]
    CurrentUnanswered { index: usize },
    #[error("already at the first question")]
    AtFirstQuestion,
    #[error("already at the last question")]
    AtLastQuestion,
    #[error("failed to load assessment: {0}")]
    FetchFailed(#[source] GatewayError),
    #[error("session loop has stopped")]
    Closed,
}

/// Errors emitted by `SessionContext` and token stores.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("token has expired")]
    Expired,
    #[error("token store unavailable: {0}")]
    Store(#[from] std::io::Error),
    #[error("token store lock poisoned")]
    Poisoned,
}
