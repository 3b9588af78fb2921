use std::fmt;
use std::str::FromStr;

use edusync_core::model::AssessmentResult;
use gateway::GatewayError;

use super::state::Completion;

/// What a session shows when the gateway fails to record a submission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubmissionFailurePolicy {
    /// Complete with the failure visible to the student.
    #[default]
    Surface,
    /// Complete with a placeholder result so a completion screen still renders.
    /// The result is flagged and carries no score.
    MaskWithPlaceholder,
}

impl SubmissionFailurePolicy {
    #[must_use]
    pub fn complete(self, error: GatewayError, total_questions: usize) -> Completion {
        match self {
            SubmissionFailurePolicy::Surface => Completion::Unrecorded(error),
            SubmissionFailurePolicy::MaskWithPlaceholder => {
                let total = u32::try_from(total_questions).unwrap_or(u32::MAX);
                Completion::Placeholder(AssessmentResult::placeholder(total))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPolicy(pub String);

impl fmt::Display for UnknownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown submission failure policy `{}` (expected `surface` or `placeholder`)",
            self.0
        )
    }
}

impl std::error::Error for UnknownPolicy {}

impl FromStr for SubmissionFailurePolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "surface" => Ok(Self::Surface),
            "placeholder" | "mask" => Ok(Self::MaskWithPlaceholder),
            other => Err(UnknownPolicy(other.to_owned())),
        }
    }
}
