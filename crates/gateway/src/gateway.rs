use async_trait::async_trait;
use edusync_core::model::{
    Assessment, AssessmentError, AssessmentId, AssessmentResult, SubmittedAnswer,
};
use thiserror::Error;

/// Errors surfaced by gateway adapters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("not found")]
    NotFound,

    #[error("not authorized")]
    Unauthorized,

    #[error("network error: {0}")]
    Network(String),

    #[error("rejected by server: {0}")]
    Validation(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("invalid assessment: {0}")]
    InvalidAssessment(#[from] AssessmentError),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("invalid API url: {0}")]
    InvalidUrl(String),
}

impl GatewayError {
    /// Transient failures worth another attempt. Auth and client errors never are.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Network(_) => true,
            GatewayError::Status(code) => *code >= 500,
            _ => false,
        }
    }
}

/// Boundary through which a session fetches assessments and submits answers.
#[async_trait]
pub trait AssessmentGateway: Send + Sync {
    /// Fetch an assessment by id.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NotFound` if it does not exist, or other transport errors.
    async fn fetch_assessment(&self, id: &AssessmentId) -> Result<Assessment, GatewayError>;

    /// Submit the answered questions of an attempt and return the graded result.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Validation` if the server rejects the payload, or
    /// transport errors.
    async fn submit_assessment(
        &self,
        id: &AssessmentId,
        answers: &[SubmittedAnswer],
    ) -> Result<AssessmentResult, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(GatewayError::Network("reset".into()).is_retryable());
        assert!(GatewayError::Status(503).is_retryable());
        assert!(!GatewayError::Status(409).is_retryable());
        assert!(!GatewayError::Unauthorized.is_retryable());
        assert!(!GatewayError::NotFound.is_retryable());
        assert!(!GatewayError::Validation("bad".into()).is_retryable());
    }
}
