#![forbid(unsafe_code)]

pub mod assessment;
pub mod auth;
pub mod error;

pub use edusync_core::Clock;

pub use error::{AuthError, SessionError};

pub use assessment::{
    ActiveState, AssessmentLoopService, AssessmentSession, Completion, SessionHandle,
    SessionProgress, SessionSnapshot, SessionState, SubmissionFailurePolicy, SubmissionRequest,
    SubmitTrigger,
};
pub use auth::{Claims, FileTokenStore, InMemoryTokenStore, Role, SessionContext, TokenStore};
