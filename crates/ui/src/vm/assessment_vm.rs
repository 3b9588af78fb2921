use edusync_core::model::{Assessment, OptionId};
use edusync_core::time::format_countdown;
use gateway::GatewayError;
use services::{ActiveState, SessionSnapshot, SessionState, SubmitTrigger};

use crate::vm::result_vm::ResultView;

/// Countdown values below this are shown as urgent.
pub const URGENT_BELOW_SECONDS: u32 = 60;

/// What the assessment screen should render for a snapshot.
#[derive(Clone, Debug, PartialEq)]
pub enum AssessmentView {
    Loading,
    Failed { message: String },
    Taking(QuestionView),
    Submitting { trigger: SubmitTrigger },
    Completed(ResultView),
}

impl AssessmentView {
    #[must_use]
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        let assessment = snapshot.assessment.as_deref();
        match (&snapshot.state, assessment) {
            (SessionState::Loading, _) => AssessmentView::Loading,
            (SessionState::Error(err), _) => AssessmentView::Failed {
                message: load_error_message(err).to_owned(),
            },
            (SessionState::Active(active), Some(assessment)) => {
                AssessmentView::Taking(QuestionView::new(assessment, active))
            }
            (SessionState::Submitting { trigger, .. }, _) => {
                AssessmentView::Submitting { trigger: *trigger }
            }
            (SessionState::Completed(completion), Some(assessment)) => AssessmentView::Completed(
                ResultView::new(assessment, completion, snapshot.trigger),
            ),
            // Active and Completed always carry the assessment.
            (SessionState::Active(_) | SessionState::Completed(_), None) => AssessmentView::Loading,
        }
    }
}

#[must_use]
pub fn load_error_message(err: &GatewayError) -> &'static str {
    match err {
        GatewayError::NotFound => "This assessment could not be found.",
        GatewayError::Unauthorized => "Your session has expired. Please log in again.",
        _ => "Failed to load assessment. Please try again later.",
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionView {
    pub id: OptionId,
    pub text: String,
    pub selected: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimaryAction {
    Next { enabled: bool },
    Submit { enabled: bool },
}

impl PrimaryAction {
    #[must_use]
    pub fn enabled(self) -> bool {
        match self {
            PrimaryAction::Next { enabled } | PrimaryAction::Submit { enabled } => enabled,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            PrimaryAction::Next { .. } => "Next",
            PrimaryAction::Submit { .. } => "Submit Assessment",
        }
    }
}

/// Text of the submit confirmation dialog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub warning: Option<&'static str>,
    pub message: &'static str,
}

impl ConfirmPrompt {
    #[must_use]
    pub fn for_answers(all_answered: bool) -> Self {
        if all_answered {
            Self {
                warning: None,
                message: "Are you sure you want to submit your assessment? You cannot change your answers after submission.",
            }
        } else {
            Self {
                warning: Some("You haven't answered all questions."),
                message: "Are you sure you want to submit the assessment? Unanswered questions will be marked as incorrect.",
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct QuestionView {
    pub title: String,
    pub course_title: Option<String>,
    pub countdown: String,
    pub urgent: bool,
    /// `"{n}/{total}"`, one-based.
    pub progress_label: String,
    pub position_label: String,
    pub position_percent: f64,
    pub answered_label: String,
    pub index: usize,
    pub text: String,
    pub options: Vec<OptionView>,
    pub can_go_previous: bool,
    pub primary: PrimaryAction,
    /// Offered on interior questions only; enabled once every question is answered.
    pub finish_early: Option<bool>,
    pub confirm: ConfirmPrompt,
}

impl QuestionView {
    #[must_use]
    pub fn new(assessment: &Assessment, active: &ActiveState) -> Self {
        let progress = active.progress();
        let index = progress.current_index;
        let current = active.answers().selected(index);
        let answered_current = current.is_some();

        let (text, options) = assessment.question(index).map_or_else(
            || (String::new(), Vec::new()),
            |question| {
                let options = question
                    .options()
                    .iter()
                    .map(|option| OptionView {
                        id: option.id().clone(),
                        text: option.text().to_owned(),
                        selected: current == Some(option.id()),
                    })
                    .collect();
                (question.text().to_owned(), options)
            },
        );

        let last = progress.is_last_question();
        let primary = if last {
            PrimaryAction::Submit {
                enabled: answered_current,
            }
        } else {
            PrimaryAction::Next {
                enabled: answered_current,
            }
        };

        Self {
            title: assessment.title().to_owned(),
            course_title: assessment.course_title().map(str::to_owned),
            countdown: format_countdown(active.remaining_seconds()),
            urgent: active.remaining_seconds() < URGENT_BELOW_SECONDS,
            progress_label: format!("{}/{}", index + 1, progress.total),
            position_label: format!("Question {} of {}", index + 1, progress.total),
            position_percent: progress.position_percent(),
            answered_label: format!("{} answered", progress.answered),
            index,
            text,
            options,
            can_go_previous: index > 0,
            primary,
            finish_early: (!last).then_some(progress.all_answered()),
            confirm: ConfirmPrompt::for_answers(progress.all_answered()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edusync_core::model::{AnswerOption, AssessmentId, CourseId, Question, QuestionId};
    use gateway::InMemoryGateway;
    use services::{AssessmentSession, Completion};

    fn assessment(questions: u64) -> Assessment {
        let questions = (1..=questions)
            .map(|q| {
                Question::new(
                    QuestionId::new(q),
                    format!("Question {q}?"),
                    vec![
                        AnswerOption::new(OptionId::new(q * 10 + 1), "yes"),
                        AnswerOption::new(OptionId::new(q * 10 + 2), "no"),
                    ],
                )
                .unwrap()
            })
            .collect();
        Assessment::new(AssessmentId::new(1), "HTML Basics", questions)
            .unwrap()
            .with_time_limit_minutes(Some(1))
            .with_course(Some(CourseId::new(8)), Some("Web Development".into()))
    }

    fn session(questions: u64) -> AssessmentSession {
        let mut session = AssessmentSession::new(AssessmentId::new(1));
        session.activate(assessment(questions)).unwrap();
        session
    }

    fn taking(session: &AssessmentSession) -> QuestionView {
        match AssessmentView::from_snapshot(&session.snapshot()) {
            AssessmentView::Taking(view) => view,
            other => panic!("expected a question, got {other:?}"),
        }
    }

    #[test]
    fn first_question_layout() {
        let session = session(3);
        let view = taking(&session);

        assert_eq!(view.title, "HTML Basics");
        assert_eq!(view.course_title.as_deref(), Some("Web Development"));
        assert_eq!(view.countdown, "1:00");
        assert!(!view.urgent);
        assert_eq!(view.progress_label, "1/3");
        assert_eq!(view.position_label, "Question 1 of 3");
        assert_eq!(view.answered_label, "0 answered");
        assert_eq!(view.text, "Question 1?");
        assert!(!view.can_go_previous);
        assert_eq!(view.primary, PrimaryAction::Next { enabled: false });
        assert_eq!(view.finish_early, Some(false));
        assert!(view.options.iter().all(|o| !o.selected));
    }

    #[test]
    fn answering_enables_next_and_marks_selection() {
        let mut session = session(3);
        session.select_answer(0, OptionId::new(12)).unwrap();
        let view = taking(&session);

        assert_eq!(view.primary, PrimaryAction::Next { enabled: true });
        assert!(view.options[1].selected);
        assert!(!view.options[0].selected);
        assert_eq!(view.answered_label, "1 answered");
    }

    #[test]
    fn last_question_offers_submit_without_finish_early() {
        let mut session = session(2);
        session.select_answer(0, OptionId::new(11)).unwrap();
        session.next().unwrap();
        let view = taking(&session);

        assert_eq!(view.primary, PrimaryAction::Submit { enabled: false });
        assert_eq!(view.finish_early, None);
        assert!(view.can_go_previous);
        assert_eq!(view.confirm.warning, Some("You haven't answered all questions."));
        assert!((view.position_percent - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn finish_early_needs_every_answer() {
        let mut session = session(3);
        for (index, option) in [(0, 11), (1, 21), (2, 31)] {
            session.select_answer(index, OptionId::new(option)).unwrap();
        }
        let view = taking(&session);

        assert_eq!(view.finish_early, Some(true));
        assert_eq!(view.confirm.warning, None);
    }

    #[test]
    fn countdown_turns_urgent_under_a_minute() {
        let mut session = session(1);
        let _ = session.tick();
        let view = taking(&session);

        assert_eq!(view.countdown, "0:59");
        assert!(view.urgent);
    }

    #[test]
    fn submitting_and_loading_states() {
        let mut loading = AssessmentSession::new(AssessmentId::new(1));
        assert_eq!(
            AssessmentView::from_snapshot(&loading.snapshot()),
            AssessmentView::Loading
        );

        loading.activate(assessment(1)).unwrap();
        loading.begin_submit().unwrap();
        assert_eq!(
            AssessmentView::from_snapshot(&loading.snapshot()),
            AssessmentView::Submitting {
                trigger: SubmitTrigger::Manual
            }
        );
    }

    #[tokio::test]
    async fn fetch_failure_renders_message() {
        let gateway = InMemoryGateway::new();
        let mut session = AssessmentSession::new(AssessmentId::new(99));
        let _ = session.start(&gateway).await;

        assert_eq!(
            AssessmentView::from_snapshot(&session.snapshot()),
            AssessmentView::Failed {
                message: "This assessment could not be found.".into()
            }
        );
    }

    #[tokio::test]
    async fn completion_renders_result() {
        let gateway = InMemoryGateway::new().with_assessment(assessment(2));
        let mut session = AssessmentSession::new(AssessmentId::new(1));
        session.start(&gateway).await.unwrap();
        let completion = session.submit(&gateway).await.unwrap().clone();
        assert!(matches!(completion, Completion::Recorded(_)));

        let AssessmentView::Completed(result) = AssessmentView::from_snapshot(&session.snapshot())
        else {
            panic!("expected a result");
        };
        assert_eq!(result.title, "HTML Basics");
        assert_eq!(result.return_to, Some(CourseId::new(8)));
    }
}
