use std::collections::HashSet;

use thiserror::Error;

use crate::model::{AssessmentId, CourseId, OptionId, QuestionId};

/// Time limit applied when an assessment does not carry one.
pub const DEFAULT_TIME_LIMIT_MINUTES: u32 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AssessmentError {
    #[error("assessment has no questions")]
    NoQuestions,

    #[error("question id {id} appears more than once")]
    DuplicateQuestion { id: QuestionId },

    #[error("option id {option} appears more than once in question {question}")]
    DuplicateOption { question: QuestionId, option: OptionId },
}

/// A selectable answer for a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    id: OptionId,
    text: String,
}

impl AnswerOption {
    #[must_use]
    pub fn new(id: OptionId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &OptionId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A multiple-choice prompt.
///
/// No minimum option count is enforced here; authoring tools require two or more,
/// but a session answers whatever it is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: Vec<AnswerOption>,
}

impl Question {
    /// Build a question, rejecting repeated option ids.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::DuplicateOption` if two options share an id.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<AnswerOption>,
    ) -> Result<Self, AssessmentError> {
        let mut seen = HashSet::with_capacity(options.len());
        for option in &options {
            if !seen.insert(option.id()) {
                return Err(AssessmentError::DuplicateOption {
                    question: id,
                    option: option.id().clone(),
                });
            }
        }

        Ok(Self {
            id,
            text: text.into(),
            options,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }

    #[must_use]
    pub fn has_option(&self, option: &OptionId) -> bool {
        self.options.iter().any(|o| o.id() == option)
    }
}

/// A timed set of questions, read-only for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    id: AssessmentId,
    title: String,
    description: Option<String>,
    course_id: Option<CourseId>,
    course_title: Option<String>,
    time_limit_minutes: u32,
    questions: Vec<Question>,
}

impl Assessment {
    /// Build an assessment with the default time limit.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::NoQuestions` for an empty question list and
    /// `AssessmentError::DuplicateQuestion` if two questions share an id.
    pub fn new(
        id: AssessmentId,
        title: impl Into<String>,
        questions: Vec<Question>,
    ) -> Result<Self, AssessmentError> {
        if questions.is_empty() {
            return Err(AssessmentError::NoQuestions);
        }

        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(AssessmentError::DuplicateQuestion {
                    id: question.id().clone(),
                });
            }
        }

        Ok(Self {
            id,
            title: title.into(),
            description: None,
            course_id: None,
            course_title: None,
            time_limit_minutes: DEFAULT_TIME_LIMIT_MINUTES,
            questions,
        })
    }

    /// Set the time limit. `None` and `Some(0)` both fall back to the default.
    #[must_use]
    pub fn with_time_limit_minutes(mut self, minutes: Option<u32>) -> Self {
        self.time_limit_minutes = match minutes {
            Some(m) if m > 0 => m,
            _ => DEFAULT_TIME_LIMIT_MINUTES,
        };
        self
    }

    #[must_use]
    pub fn with_course(mut self, id: Option<CourseId>, title: Option<String>) -> Self {
        self.course_id = id;
        self.course_title = title;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn id(&self) -> &AssessmentId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn course_id(&self) -> Option<&CourseId> {
        self.course_id.as_ref()
    }

    #[must_use]
    pub fn course_title(&self) -> Option<&str> {
        self.course_title.as_deref()
    }

    #[must_use]
    pub fn time_limit_minutes(&self) -> u32 {
        self.time_limit_minutes
    }

    #[must_use]
    pub fn time_limit_seconds(&self) -> u32 {
        self.time_limit_minutes.saturating_mul(60)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            vec![
                AnswerOption::new(OptionId::new(id * 10), "a"),
                AnswerOption::new(OptionId::new(id * 10 + 1), "b"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn empty_assessment_is_rejected() {
        let err = Assessment::new(AssessmentId::new(1), "Empty", Vec::new()).unwrap_err();
        assert_eq!(err, AssessmentError::NoQuestions);
    }

    #[test]
    fn duplicate_question_ids_are_rejected() {
        let err = Assessment::new(AssessmentId::new(1), "Dup", vec![question(1), question(1)])
            .unwrap_err();
        assert!(matches!(err, AssessmentError::DuplicateQuestion { .. }));
    }

    #[test]
    fn duplicate_option_ids_are_rejected() {
        let err = Question::new(
            QuestionId::new(1),
            "Q",
            vec![
                AnswerOption::new(OptionId::new(5), "a"),
                AnswerOption::new(OptionId::new(5), "b"),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, AssessmentError::DuplicateOption { .. }));
    }

    #[test]
    fn missing_or_zero_time_limit_defaults_to_thirty_minutes() {
        let base = Assessment::new(AssessmentId::new(1), "T", vec![question(1)]).unwrap();
        assert_eq!(base.time_limit_seconds(), 1800);

        let zero = base.clone().with_time_limit_minutes(Some(0));
        assert_eq!(zero.time_limit_minutes(), DEFAULT_TIME_LIMIT_MINUTES);

        let ten = base.with_time_limit_minutes(Some(10));
        assert_eq!(ten.time_limit_seconds(), 600);
    }

    #[test]
    fn question_knows_its_options() {
        let q = question(2);
        assert!(q.has_option(&OptionId::new(20)));
        assert!(!q.has_option(&OptionId::new(30)));
    }
}
