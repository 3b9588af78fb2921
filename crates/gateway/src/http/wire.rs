use edusync_core::model::{
    AnswerOption, Assessment, AssessmentError, AssessmentId, CourseId, OptionId, Question,
    QuestionId, SubmittedAnswer,
};
use serde::{Deserialize, Serialize};

/// Assessment as served by `GET /Assessments/{id}`.
///
/// Kept separate from the domain type so validation happens once, on conversion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRecord {
    pub id: AssessmentId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub course_id: Option<CourseId>,
    #[serde(default)]
    pub course_title: Option<String>,
    #[serde(default, alias = "timeLimitMinutes")]
    pub time_limit: Option<u32>,
    #[serde(default)]
    pub questions: Vec<QuestionRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRecord {
    pub id: QuestionId,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub options: Vec<OptionRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionRecord {
    pub id: OptionId,
    #[serde(default)]
    pub text: String,
}

impl AssessmentRecord {
    /// Convert into a validated domain `Assessment`.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError` for an empty question list or repeated ids.
    pub fn into_assessment(self) -> Result<Assessment, AssessmentError> {
        let questions = self
            .questions
            .into_iter()
            .map(|q| {
                let options = q
                    .options
                    .into_iter()
                    .map(|o| AnswerOption::new(o.id, o.text))
                    .collect();
                Question::new(q.id, q.text, options)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Assessment::new(self.id, self.title, questions)?
            .with_description(self.description)
            .with_course(self.course_id, self.course_title)
            .with_time_limit_minutes(self.time_limit))
    }
}

/// Body of `POST /Results/results`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord<'a> {
    pub assessment_id: &'a AssessmentId,
    pub answers: &'a [SubmittedAnswer],
}

/// Error envelope the API uses for non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl ErrorBody {
    #[must_use]
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error).or(self.title)
    }
}
