use edusync_core::model::{Assessment, CourseId};
use services::{Completion, SubmitTrigger};

/// Completion screen for a finished attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultView {
    pub title: String,
    /// Score and summary are `None` unless the server recorded the attempt.
    pub score_label: Option<String>,
    pub summary: Option<String>,
    pub feedback: Option<String>,
    /// Set whenever the shown result is not what the server stored.
    pub notice: Option<String>,
    pub timed_out: bool,
    pub recorded: bool,
    pub return_to: Option<CourseId>,
}

impl ResultView {
    #[must_use]
    pub fn new(
        assessment: &Assessment,
        completion: &Completion,
        trigger: Option<SubmitTrigger>,
    ) -> Self {
        let result = completion.result();
        let notice = match completion {
            Completion::Recorded(_) => None,
            Completion::Placeholder(_) => Some(
                "Your answers could not be recorded. The result below is a placeholder and was not saved."
                    .to_owned(),
            ),
            Completion::Unrecorded(err) => {
                Some(format!("Your answers could not be submitted: {err}."))
            }
        };

        let recorded = result.filter(|_| completion.is_recorded());

        Self {
            title: assessment.title().to_owned(),
            score_label: recorded.map(|r| format!("{}%", r.score)),
            summary: recorded.map(|r| {
                format!(
                    "{} out of {} questions answered correctly",
                    r.correct_answers, r.total_questions
                )
            }),
            feedback: result
                .map(|r| r.feedback.clone())
                .filter(|feedback| !feedback.is_empty()),
            notice,
            timed_out: trigger == Some(SubmitTrigger::TimeExpired),
            recorded: completion.is_recorded(),
            return_to: assessment.course_id().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edusync_core::model::{
        AnswerOption, AssessmentId, AssessmentResult, OptionId, Question, QuestionId,
    };
    use gateway::GatewayError;

    fn assessment() -> Assessment {
        let question = Question::new(
            QuestionId::new(1),
            "What does CSS stand for?",
            vec![AnswerOption::new(OptionId::new(1), "Cascading Style Sheets")],
        )
        .unwrap();
        Assessment::new(AssessmentId::new(2), "CSS Quiz", vec![question])
            .unwrap()
            .with_course(Some(CourseId::new(4)), None)
    }

    #[test]
    fn recorded_result_shows_score() {
        let completion = Completion::Recorded(AssessmentResult::graded(5, 4, "Great job!"));
        let view = ResultView::new(&assessment(), &completion, Some(SubmitTrigger::Manual));

        assert_eq!(view.score_label.as_deref(), Some("80%"));
        assert_eq!(
            view.summary.as_deref(),
            Some("4 out of 5 questions answered correctly")
        );
        assert_eq!(view.feedback.as_deref(), Some("Great job!"));
        assert_eq!(view.notice, None);
        assert!(view.recorded);
        assert!(!view.timed_out);
        assert_eq!(view.return_to, Some(CourseId::new(4)));
    }

    #[test]
    fn placeholder_is_flagged_and_unscored() {
        let completion = Completion::Placeholder(AssessmentResult::placeholder(5));
        let view = ResultView::new(&assessment(), &completion, Some(SubmitTrigger::TimeExpired));

        assert_eq!(view.score_label, None);
        assert_eq!(view.summary, None);
        assert!(view.feedback.is_some());
        assert!(view.notice.is_some());
        assert!(!view.recorded);
        assert!(view.timed_out);
    }

    #[test]
    fn unrecorded_surfaces_the_failure() {
        let completion = Completion::Unrecorded(GatewayError::Status(503));
        let view = ResultView::new(&assessment(), &completion, Some(SubmitTrigger::Manual));

        assert_eq!(view.summary, None);
        assert!(view.notice.as_deref().unwrap().contains("503"));
    }
}
