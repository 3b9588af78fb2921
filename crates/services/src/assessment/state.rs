use std::fmt;
use std::sync::Arc;

use edusync_core::model::{AnswerMap, Assessment, AssessmentId, AssessmentResult, SubmittedAnswer};
use gateway::GatewayError;

use super::progress::SessionProgress;

/// What caused a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitTrigger {
    Manual,
    TimeExpired,
}

impl fmt::Display for SubmitTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SubmitTrigger::Manual => "manual",
            SubmitTrigger::TimeExpired => "time_expired",
        })
    }
}

/// Mutable state of an attempt while it accepts input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveState {
    pub(crate) current_index: usize,
    pub(crate) answers: AnswerMap,
    pub(crate) remaining_seconds: u32,
}

impl ActiveState {
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.answers.len();
        let answered = self.answers.answered_count();
        SessionProgress {
            total,
            answered,
            unanswered: total - answered,
            current_index: self.current_index,
        }
    }
}

/// How an attempt ended once its submission settled.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The gateway graded and stored the attempt.
    Recorded(AssessmentResult),
    /// The gateway failed and a stand-in result was shown instead.
    Placeholder(AssessmentResult),
    /// The gateway failed and the failure is shown to the student.
    Unrecorded(GatewayError),
}

impl Completion {
    #[must_use]
    pub fn result(&self) -> Option<&AssessmentResult> {
        match self {
            Completion::Recorded(result) | Completion::Placeholder(result) => Some(result),
            Completion::Unrecorded(_) => None,
        }
    }

    #[must_use]
    pub fn is_recorded(&self) -> bool {
        matches!(self, Completion::Recorded(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Loading,
    Active(ActiveState),
    Submitting {
        answers: AnswerMap,
        trigger: SubmitTrigger,
    },
    Completed(Completion),
    Error(GatewayError),
}

impl SessionState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed(_) | SessionState::Error(_))
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Loading => "loading",
            SessionState::Active(_) => "active",
            SessionState::Submitting { .. } => "submitting",
            SessionState::Completed(_) => "completed",
            SessionState::Error(_) => "error",
        }
    }
}

/// Payload handed to the gateway when a session leaves `Active`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    pub assessment_id: AssessmentId,
    pub answers: Vec<SubmittedAnswer>,
    pub trigger: SubmitTrigger,
}

/// Read-only copy of a session, published after every processed event.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub assessment_id: AssessmentId,
    pub assessment: Option<Arc<Assessment>>,
    pub state: SessionState,
    pub trigger: Option<SubmitTrigger>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn loading(assessment_id: AssessmentId) -> Self {
        Self {
            assessment_id,
            assessment: None,
            state: SessionState::Loading,
            trigger: None,
        }
    }
}
