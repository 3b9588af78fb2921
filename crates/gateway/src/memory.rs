use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use edusync_core::model::{
    Assessment, AssessmentId, AssessmentResult, OptionId, QuestionId, SubmittedAnswer,
};

use crate::gateway::{AssessmentGateway, GatewayError};

/// A submission captured by [`InMemoryGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSubmission {
    pub assessment_id: AssessmentId,
    pub answers: Vec<SubmittedAnswer>,
}

#[derive(Default)]
struct State {
    assessments: HashMap<AssessmentId, Assessment>,
    answer_keys: HashMap<AssessmentId, HashMap<QuestionId, OptionId>>,
    fetch_failure: Option<GatewayError>,
    submit_failure: Option<GatewayError>,
    submissions: Vec<RecordedSubmission>,
}

/// In-process gateway for tests and offline demos.
///
/// Never used as a silent fallback: callers construct it explicitly. Submissions
/// are graded against an optional answer key and logged for inspection.
#[derive(Clone, Default)]
pub struct InMemoryGateway {
    state: Arc<Mutex<State>>,
}

impl InMemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_assessment(self, assessment: Assessment) -> Self {
        self.insert_assessment(assessment);
        self
    }

    pub fn insert_assessment(&self, assessment: Assessment) {
        if let Ok(mut state) = self.state.lock() {
            state.assessments.insert(assessment.id().clone(), assessment);
        }
    }

    /// Correct option per question, used to grade submissions.
    pub fn set_answer_key(&self, id: AssessmentId, key: HashMap<QuestionId, OptionId>) {
        if let Ok(mut state) = self.state.lock() {
            state.answer_keys.insert(id, key);
        }
    }

    /// Make every subsequent fetch fail with `error`.
    pub fn fail_fetches_with(&self, error: GatewayError) {
        if let Ok(mut state) = self.state.lock() {
            state.fetch_failure = Some(error);
        }
    }

    /// Make every subsequent submission fail with `error`. The attempt is still logged.
    pub fn fail_submissions_with(&self, error: GatewayError) {
        if let Ok(mut state) = self.state.lock() {
            state.submit_failure = Some(error);
        }
    }

    #[must_use]
    pub fn submissions(&self) -> Vec<RecordedSubmission> {
        self.state
            .lock()
            .map(|state| state.submissions.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn submission_count(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.submissions.len())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, GatewayError> {
        self.state
            .lock()
            .map_err(|e| GatewayError::Network(e.to_string()))
    }
}

fn feedback_for(score: f64) -> &'static str {
    if score >= 80.0 {
        "Great job! You have a solid grasp of this material."
    } else if score >= 50.0 {
        "Good effort. Review the questions you missed and try again."
    } else {
        "Keep practicing. Revisit the course material before your next attempt."
    }
}

fn grade(
    assessment: &Assessment,
    key: Option<&HashMap<QuestionId, OptionId>>,
    answers: &[SubmittedAnswer],
) -> Result<AssessmentResult, GatewayError> {
    for answer in answers {
        let question = assessment
            .questions()
            .iter()
            .find(|q| q.id() == &answer.question_id)
            .ok_or_else(|| {
                GatewayError::Validation(format!("unknown question {}", answer.question_id))
            })?;
        if !question.has_option(&answer.selected_option_id) {
            return Err(GatewayError::Validation(format!(
                "option {} does not belong to question {}",
                answer.selected_option_id, answer.question_id
            )));
        }
    }

    let correct = key.map_or(0, |key| {
        answers
            .iter()
            .filter(|a| key.get(&a.question_id) == Some(&a.selected_option_id))
            .count()
    });
    let total = u32::try_from(assessment.question_count()).unwrap_or(u32::MAX);
    let correct = u32::try_from(correct).unwrap_or(u32::MAX);

    let mut result = AssessmentResult::graded(total, correct, "");
    result.feedback = feedback_for(result.score).to_owned();
    Ok(result)
}

#[async_trait]
impl AssessmentGateway for InMemoryGateway {
    async fn fetch_assessment(&self, id: &AssessmentId) -> Result<Assessment, GatewayError> {
        let state = self.lock()?;
        if let Some(err) = &state.fetch_failure {
            return Err(err.clone());
        }
        state
            .assessments
            .get(id)
            .cloned()
            .ok_or(GatewayError::NotFound)
    }

    async fn submit_assessment(
        &self,
        id: &AssessmentId,
        answers: &[SubmittedAnswer],
    ) -> Result<AssessmentResult, GatewayError> {
        let mut state = self.lock()?;
        state.submissions.push(RecordedSubmission {
            assessment_id: id.clone(),
            answers: answers.to_vec(),
        });
        if let Some(err) = &state.submit_failure {
            return Err(err.clone());
        }

        let assessment = state.assessments.get(id).ok_or(GatewayError::NotFound)?;
        grade(assessment, state.answer_keys.get(id), answers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edusync_core::model::{AnswerOption, Question};

    fn assessment() -> Assessment {
        let questions = (1..=4)
            .map(|id| {
                Question::new(
                    QuestionId::new(id),
                    format!("Q{id}"),
                    vec![
                        AnswerOption::new(OptionId::new(id * 10), "right"),
                        AnswerOption::new(OptionId::new(id * 10 + 1), "wrong"),
                    ],
                )
                .unwrap()
            })
            .collect();
        Assessment::new(AssessmentId::new(1), "Quiz", questions).unwrap()
    }

    fn key() -> HashMap<QuestionId, OptionId> {
        (1..=4)
            .map(|id| (QuestionId::new(id), OptionId::new(id * 10)))
            .collect()
    }

    fn answer(question: u64, option: u64) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id: QuestionId::new(question),
            selected_option_id: OptionId::new(option),
        }
    }

    #[tokio::test]
    async fn grades_against_answer_key() {
        let gateway = InMemoryGateway::new().with_assessment(assessment());
        gateway.set_answer_key(AssessmentId::new(1), key());

        let result = gateway
            .submit_assessment(
                &AssessmentId::new(1),
                &[answer(1, 10), answer(2, 20), answer(3, 31)],
            )
            .await
            .unwrap();

        assert_eq!(result.total_questions, 4);
        assert_eq!(result.correct_answers, 2);
        assert_eq!(result.score, 50.0);
        assert_eq!(gateway.submission_count(), 1);
    }

    #[tokio::test]
    async fn rejects_options_from_other_questions() {
        let gateway = InMemoryGateway::new().with_assessment(assessment());
        let err = gateway
            .submit_assessment(&AssessmentId::new(1), &[answer(1, 20)])
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_assessment_is_not_found() {
        let gateway = InMemoryGateway::new();
        let err = gateway
            .fetch_assessment(&AssessmentId::new(9))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::NotFound);
    }

    #[tokio::test]
    async fn scripted_submit_failure_still_logs_attempt() {
        let gateway = InMemoryGateway::new().with_assessment(assessment());
        gateway.fail_submissions_with(GatewayError::Network("offline".into()));

        let err = gateway
            .submit_assessment(&AssessmentId::new(1), &[answer(1, 10)])
            .await
            .unwrap_err();

        assert_eq!(err, GatewayError::Network("offline".into()));
        assert_eq!(gateway.submissions()[0].answers, vec![answer(1, 10)]);
    }
}
