use serde::{Deserialize, Serialize};

/// Graded outcome returned after a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    /// Percentage in `0..=100`.
    pub score: f64,
    pub total_questions: u32,
    pub correct_answers: u32,
    #[serde(default)]
    pub feedback: String,
}

impl AssessmentResult {
    /// Build a result from raw counts, deriving the percentage score.
    #[must_use]
    pub fn graded(total_questions: u32, correct_answers: u32, feedback: impl Into<String>) -> Self {
        let score = if total_questions == 0 {
            0.0
        } else {
            (f64::from(correct_answers) * 100.0 / f64::from(total_questions)).round()
        };
        Self {
            score,
            total_questions,
            correct_answers,
            feedback: feedback.into(),
        }
    }

    /// Result shown when a submission could not be recorded.
    ///
    /// Carries no score; it only lets a completion screen render.
    #[must_use]
    pub fn placeholder(total_questions: u32) -> Self {
        Self::graded(
            total_questions,
            0,
            "Your answers could not be recorded. Please contact your instructor before retaking this assessment.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_api_payload() {
        let json = r#"{"score":80,"totalQuestions":5,"correctAnswers":4,"feedback":"Great job!"}"#;
        let result: AssessmentResult = serde_json::from_str(json).unwrap();
        assert_eq!(result, AssessmentResult::graded(5, 4, "Great job!"));
    }

    #[test]
    fn placeholder_reports_no_score() {
        let result = AssessmentResult::placeholder(5);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.correct_answers, 0);
        assert_eq!(result.total_questions, 5);
    }
}
