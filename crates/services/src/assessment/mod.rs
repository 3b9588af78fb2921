//! Assessment-taking sessions: the state machine, its event loop and helpers.

mod driver;
mod policy;
mod progress;
mod session;
mod state;
mod workflow;

pub use crate::error::SessionError;
pub use driver::SessionHandle;
pub use policy::{SubmissionFailurePolicy, UnknownPolicy};
pub use progress::SessionProgress;
pub use session::AssessmentSession;
pub use state::{
    ActiveState, Completion, SessionSnapshot, SessionState, SubmissionRequest, SubmitTrigger,
};
pub use workflow::AssessmentLoopService;
