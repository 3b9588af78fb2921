use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

use edusync_core::model::{AnswerMap, Assessment, AssessmentId, AssessmentResult, OptionId, Question};
use edusync_core::time::format_countdown;
use gateway::{AssessmentGateway, GatewayError};
use tracing::{debug, info, warn};

use crate::Clock;
use crate::error::SessionError;
use super::policy::SubmissionFailurePolicy;
use super::progress::SessionProgress;
use super::state::{
    ActiveState, Completion, SessionSnapshot, SessionState, SubmissionRequest, SubmitTrigger,
};

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One student's attempt at an assessment.
///
/// `Loading → Active → Submitting → Completed`, with `Error` reachable from
/// `Loading`. Every transition out of `Active` goes through one place, so only
/// the first of a manual submit and a timer expiry produces a submission.
pub struct AssessmentSession {
    assessment_id: AssessmentId,
    assessment: Option<Arc<Assessment>>,
    state: SessionState,
    policy: SubmissionFailurePolicy,
    clock: Clock,
    trigger: Option<SubmitTrigger>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl AssessmentSession {
    #[must_use]
    pub fn new(assessment_id: AssessmentId) -> Self {
        Self {
            assessment_id,
            assessment: None,
            state: SessionState::Loading,
            policy: SubmissionFailurePolicy::default(),
            clock: Clock::default_clock(),
            trigger: None,
            started_at: None,
            completed_at: None,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_failure_policy(mut self, policy: SubmissionFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn assessment_id(&self) -> &AssessmentId {
        &self.assessment_id
    }

    #[must_use]
    pub fn assessment(&self) -> Option<&Assessment> {
        self.assessment.as_deref()
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn failure_policy(&self) -> SubmissionFailurePolicy {
        self.policy
    }

    #[must_use]
    pub fn trigger(&self) -> Option<SubmitTrigger> {
        self.trigger
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    #[must_use]
    pub fn active(&self) -> Option<&ActiveState> {
        match &self.state {
            SessionState::Active(active) => Some(active),
            _ => None,
        }
    }

    #[must_use]
    pub fn answers(&self) -> Option<&AnswerMap> {
        match &self.state {
            SessionState::Active(active) => Some(&active.answers),
            SessionState::Submitting { answers, .. } => Some(answers),
            _ => None,
        }
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> Option<u32> {
        self.active().map(ActiveState::remaining_seconds)
    }

    #[must_use]
    pub fn countdown_label(&self) -> Option<String> {
        self.remaining_seconds().map(format_countdown)
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        let active = self.active()?;
        self.assessment.as_ref()?.question(active.current_index)
    }

    #[must_use]
    pub fn completion(&self) -> Option<&Completion> {
        match &self.state {
            SessionState::Completed(completion) => Some(completion),
            _ => None,
        }
    }

    /// Progress of the attempt while it accepts answers.
    #[must_use]
    pub fn progress(&self) -> Option<SessionProgress> {
        self.active().map(ActiveState::progress)
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            assessment_id: self.assessment_id.clone(),
            assessment: self.assessment.clone(),
            state: self.state.clone(),
            trigger: self.trigger,
        }
    }

    //
    // ─── LOADING ───────────────────────────────────────────────────────────────
    //

    /// Fetch the assessment and enter `Active`, or halt in `Error`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` outside `Loading` and
    /// `SessionError::FetchFailed` when the gateway cannot provide the assessment.
    pub async fn start(&mut self, gateway: &dyn AssessmentGateway) -> Result<(), SessionError> {
        if !matches!(self.state, SessionState::Loading) {
            return Err(SessionError::AlreadyStarted);
        }

        match gateway.fetch_assessment(&self.assessment_id).await {
            Ok(assessment) => self.activate(assessment),
            Err(err) => {
                self.fail(err.clone());
                Err(SessionError::FetchFailed(err))
            }
        }
    }

    /// Enter `Active` with an already fetched assessment.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` outside `Loading`.
    pub fn activate(&mut self, assessment: Assessment) -> Result<(), SessionError> {
        if !matches!(self.state, SessionState::Loading) {
            return Err(SessionError::AlreadyStarted);
        }

        let remaining_seconds = assessment.time_limit_seconds();
        self.state = SessionState::Active(ActiveState {
            current_index: 0,
            answers: AnswerMap::unanswered(assessment.question_count()),
            remaining_seconds,
        });
        info!(
            assessment_id = %self.assessment_id,
            questions = assessment.question_count(),
            remaining_seconds,
            "assessment session active"
        );
        self.assessment = Some(Arc::new(assessment));
        self.started_at = Some(self.clock.now());
        Ok(())
    }

    fn fail(&mut self, err: GatewayError) {
        warn!(assessment_id = %self.assessment_id, error = %err, "failed to load assessment");
        self.state = SessionState::Error(err);
    }

    //
    // ─── ANSWERING & NAVIGATION ────────────────────────────────────────────────
    //

    fn active_parts(&mut self) -> Result<(&Assessment, &mut ActiveState), SessionError> {
        match (&self.assessment, &mut self.state) {
            (Some(assessment), SessionState::Active(active)) => Ok((assessment.as_ref(), active)),
            _ => Err(SessionError::NotActive),
        }
    }

    /// Record `option` as the answer to question `index`.
    ///
    /// Leaves the current index and the countdown untouched.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` outside `Active`,
    /// `SessionError::QuestionOutOfRange` for a bad index, and
    /// `SessionError::UnknownOption` if the option is not offered by that question.
    pub fn select_answer(&mut self, index: usize, option: OptionId) -> Result<(), SessionError> {
        let (assessment, active) = self.active_parts()?;
        let question = assessment
            .question(index)
            .ok_or(SessionError::QuestionOutOfRange {
                index,
                total: assessment.question_count(),
            })?;
        if !question.has_option(&option) {
            return Err(SessionError::UnknownOption { index, option });
        }

        debug!(question = index, option = %option, "answer selected");
        active.answers.record(index, option);
        Ok(())
    }

    /// Jump to question `index`, in either direction.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` outside `Active` and
    /// `SessionError::QuestionOutOfRange` for a bad index.
    pub fn go_to(&mut self, index: usize) -> Result<(), SessionError> {
        let (_, active) = self.active_parts()?;
        if !active.answers.contains_index(index) {
            return Err(SessionError::QuestionOutOfRange {
                index,
                total: active.answers.len(),
            });
        }
        active.current_index = index;
        Ok(())
    }

    /// Advance one question. Only allowed once the current question is answered.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::CurrentUnanswered` if the current question has no
    /// answer and `SessionError::AtLastQuestion` on the final question.
    pub fn next(&mut self) -> Result<(), SessionError> {
        let (_, active) = self.active_parts()?;
        let index = active.current_index;
        if !active.answers.is_answered(index) {
            return Err(SessionError::CurrentUnanswered { index });
        }
        if index + 1 >= active.answers.len() {
            return Err(SessionError::AtLastQuestion);
        }
        active.current_index = index + 1;
        Ok(())
    }

    /// Go back one question. Never gated on answers.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AtFirstQuestion` on the first question.
    pub fn previous(&mut self) -> Result<(), SessionError> {
        let (_, active) = self.active_parts()?;
        if active.current_index == 0 {
            return Err(SessionError::AtFirstQuestion);
        }
        active.current_index -= 1;
        Ok(())
    }

    //
    // ─── COUNTDOWN ─────────────────────────────────────────────────────────────
    //

    /// Apply one second of countdown.
    ///
    /// A no-op outside `Active`. When the countdown reaches zero the session
    /// moves to `Submitting` and the returned request must be delivered.
    pub fn tick(&mut self) -> Option<SubmissionRequest> {
        let SessionState::Active(active) = &mut self.state else {
            return None;
        };
        active.remaining_seconds = active.remaining_seconds.saturating_sub(1);
        if active.remaining_seconds > 0 {
            return None;
        }

        info!(assessment_id = %self.assessment_id, "time expired, submitting");
        self.begin_submission(SubmitTrigger::TimeExpired).ok()
    }

    //
    // ─── SUBMISSION ────────────────────────────────────────────────────────────
    //

    /// Leave `Active` and build the submission payload.
    ///
    /// Not gated on unanswered questions; confirming intent is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` if the session already left `Active`.
    pub fn begin_submit(&mut self) -> Result<SubmissionRequest, SessionError> {
        self.begin_submission(SubmitTrigger::Manual)
    }

    fn begin_submission(
        &mut self,
        trigger: SubmitTrigger,
    ) -> Result<SubmissionRequest, SessionError> {
        let Some(assessment) = self.assessment.clone() else {
            return Err(SessionError::NotActive);
        };
        let answers = match std::mem::replace(&mut self.state, SessionState::Loading) {
            SessionState::Active(active) => active.answers,
            other => {
                self.state = other;
                return Err(SessionError::NotActive);
            }
        };

        let payload = answers.to_submission(assessment.questions());
        info!(
            assessment_id = %self.assessment_id,
            %trigger,
            answered = payload.len(),
            total = answers.len(),
            "submitting assessment"
        );
        self.state = SessionState::Submitting { answers, trigger };
        self.trigger = Some(trigger);

        Ok(SubmissionRequest {
            assessment_id: self.assessment_id.clone(),
            answers: payload,
            trigger,
        })
    }

    /// Settle an in-flight submission and enter `Completed`.
    ///
    /// Gateway failures never surface as `Err`; the failure policy turns them
    /// into a `Completion`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotSubmitting` if no submission is in flight.
    pub fn finish_submission(
        &mut self,
        outcome: Result<AssessmentResult, GatewayError>,
    ) -> Result<&Completion, SessionError> {
        let SessionState::Submitting { answers, .. } = &self.state else {
            return Err(SessionError::NotSubmitting);
        };

        let completion = match outcome {
            Ok(result) => Completion::Recorded(result),
            Err(err) => {
                warn!(
                    assessment_id = %self.assessment_id,
                    error = %err,
                    policy = ?self.policy,
                    "submission was not recorded"
                );
                self.policy.complete(err, answers.len())
            }
        };

        self.completed_at = Some(self.clock.now());
        self.state = SessionState::Completed(completion);
        self.completion().ok_or(SessionError::NotSubmitting)
    }

    /// Send a prepared request through the gateway and settle it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotSubmitting` if no submission is in flight.
    pub async fn deliver(
        &mut self,
        request: SubmissionRequest,
        gateway: &dyn AssessmentGateway,
    ) -> Result<&Completion, SessionError> {
        if !matches!(self.state, SessionState::Submitting { .. }) {
            return Err(SessionError::NotSubmitting);
        }
        let outcome = gateway
            .submit_assessment(&request.assessment_id, &request.answers)
            .await;
        self.finish_submission(outcome)
    }

    /// Submit the current answers and wait for the outcome.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` if the session already left `Active`.
    pub async fn submit(
        &mut self,
        gateway: &dyn AssessmentGateway,
    ) -> Result<&Completion, SessionError> {
        let request = self.begin_submit()?;
        self.deliver(request, gateway).await
    }
}

impl fmt::Debug for AssessmentSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssessmentSession")
            .field("assessment_id", &self.assessment_id)
            .field("state", &self.state.name())
            .field("policy", &self.policy)
            .field("trigger", &self.trigger)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use edusync_core::model::{AnswerOption, QuestionId};
    use edusync_core::time::{fixed_clock, fixed_now};
    use gateway::InMemoryGateway;

    fn build_assessment(questions: u64, minutes: Option<u32>) -> Assessment {
        let questions = (1..=questions)
            .map(|id| {
                Question::new(
                    QuestionId::new(id),
                    format!("Question {id}"),
                    vec![
                        AnswerOption::new(OptionId::new(id * 10), "A"),
                        AnswerOption::new(OptionId::new(id * 10 + 1), "B"),
                    ],
                )
                .unwrap()
            })
            .collect();
        Assessment::new(AssessmentId::new(1), "Quiz", questions)
            .unwrap()
            .with_time_limit_minutes(minutes)
    }

    fn active_session(questions: u64, minutes: Option<u32>) -> AssessmentSession {
        let mut session = AssessmentSession::new(AssessmentId::new(1)).with_clock(fixed_clock());
        session
            .activate(build_assessment(questions, minutes))
            .unwrap();
        session
    }

    fn option_for(index: usize) -> OptionId {
        OptionId::new((index as u64 + 1) * 10)
    }

    #[test]
    fn activation_populates_every_answer_slot() {
        let session = active_session(5, Some(10));
        let active = session.active().unwrap();

        assert_eq!(active.answers().len(), 5);
        assert_eq!(active.answers().answered_count(), 0);
        assert_eq!(active.current_index(), 0);
        assert_eq!(active.remaining_seconds(), 600);
        assert_eq!(session.started_at(), Some(fixed_now()));
    }

    #[test]
    fn missing_time_limit_starts_at_thirty_minutes() {
        let session = active_session(2, None);
        assert_eq!(session.remaining_seconds(), Some(1800));
        assert_eq!(session.countdown_label().as_deref(), Some("30:00"));
    }

    #[test]
    fn answers_survive_navigation() {
        let mut session = active_session(3, None);
        session.select_answer(1, option_for(1)).unwrap();
        session.go_to(2).unwrap();
        session.go_to(0).unwrap();
        session.go_to(1).unwrap();

        assert_eq!(session.answers().unwrap().selected(1), Some(&option_for(1)));
        assert_eq!(session.current_question().unwrap().id(), &QuestionId::new(2));
    }

    #[test]
    fn select_does_not_move_index_or_timer() {
        let mut session = active_session(3, Some(1));
        session.select_answer(2, option_for(2)).unwrap();
        let active = session.active().unwrap();
        assert_eq!(active.current_index(), 0);
        assert_eq!(active.remaining_seconds(), 60);
    }

    #[test]
    fn select_rejects_bad_index_and_foreign_option() {
        let mut session = active_session(2, None);
        assert_eq!(
            session.select_answer(5, option_for(0)),
            Err(SessionError::QuestionOutOfRange { index: 5, total: 2 })
        );
        assert_eq!(
            session.select_answer(0, option_for(1)),
            Err(SessionError::UnknownOption {
                index: 0,
                option: option_for(1)
            })
        );
    }

    #[test]
    fn next_requires_an_answer_and_stops_at_last() {
        let mut session = active_session(2, None);
        assert_eq!(
            session.next(),
            Err(SessionError::CurrentUnanswered { index: 0 })
        );

        session.select_answer(0, option_for(0)).unwrap();
        session.next().unwrap();
        assert_eq!(session.active().unwrap().current_index(), 1);

        assert_eq!(
            session.next(),
            Err(SessionError::CurrentUnanswered { index: 1 })
        );
        session.select_answer(1, option_for(1)).unwrap();
        assert_eq!(session.next(), Err(SessionError::AtLastQuestion));
        assert_eq!(session.active().unwrap().current_index(), 1);
    }

    #[test]
    fn previous_is_never_gated_except_at_start() {
        let mut session = active_session(3, None);
        assert_eq!(session.previous(), Err(SessionError::AtFirstQuestion));
        session.go_to(2).unwrap();
        session.previous().unwrap();
        assert_eq!(session.active().unwrap().current_index(), 1);
    }

    #[test]
    fn go_to_rejects_out_of_range() {
        let mut session = active_session(2, None);
        assert_eq!(
            session.go_to(2),
            Err(SessionError::QuestionOutOfRange { index: 2, total: 2 })
        );
    }

    #[test]
    fn progress_is_derived_from_answers() {
        let mut session = active_session(4, None);
        session.select_answer(0, option_for(0)).unwrap();
        session.select_answer(3, option_for(3)).unwrap();
        session.go_to(1).unwrap();

        let progress = session.progress().unwrap();
        assert_eq!(progress.answered, 2);
        assert_eq!(progress.unanswered, 2);
        assert!((progress.position_percent() - 50.0).abs() < f64::EPSILON);
        assert!(!progress.all_answered());
    }

    #[test]
    fn countdown_expiry_forces_one_submission() {
        let mut session = active_session(3, Some(1));
        session.select_answer(0, option_for(0)).unwrap();

        for _ in 0..59 {
            assert!(session.tick().is_none());
        }
        assert_eq!(session.remaining_seconds(), Some(1));

        let request = session.tick().expect("expiry submits");
        assert_eq!(request.trigger, SubmitTrigger::TimeExpired);
        assert_eq!(request.answers.len(), 1);
        assert!(matches!(session.state(), SessionState::Submitting { .. }));

        assert!(session.tick().is_none());
        assert_eq!(session.begin_submit(), Err(SessionError::NotActive));
    }

    #[test]
    fn operations_outside_active_are_rejected() {
        let mut session = AssessmentSession::new(AssessmentId::new(1));
        assert_eq!(session.select_answer(0, option_for(0)), Err(SessionError::NotActive));
        assert_eq!(session.next(), Err(SessionError::NotActive));
        assert_eq!(session.begin_submit(), Err(SessionError::NotActive));
        assert!(session.tick().is_none());
        assert!(matches!(session.state(), SessionState::Loading));
    }

    #[test]
    fn failure_policy_decides_completion() {
        let mut surfaced = active_session(2, None);
        surfaced.begin_submit().unwrap();
        let completion = surfaced
            .finish_submission(Err(GatewayError::Network("down".into())))
            .unwrap();
        assert_eq!(
            completion,
            &Completion::Unrecorded(GatewayError::Network("down".into()))
        );

        let mut masked = active_session(2, None)
            .with_failure_policy(SubmissionFailurePolicy::MaskWithPlaceholder);
        masked.begin_submit().unwrap();
        let completion = masked
            .finish_submission(Err(GatewayError::Network("down".into())))
            .unwrap();
        assert!(matches!(completion, Completion::Placeholder(r) if r.total_questions == 2));
        assert_eq!(masked.completed_at(), Some(fixed_now()));
    }

    #[tokio::test]
    async fn start_failure_halts_in_error() {
        let gateway = InMemoryGateway::new();
        let mut session = AssessmentSession::new(AssessmentId::new(7));

        let err = session.start(&gateway).await.unwrap_err();
        assert_eq!(err, SessionError::FetchFailed(GatewayError::NotFound));
        assert!(matches!(session.state(), SessionState::Error(GatewayError::NotFound)));
        assert!(session.is_terminal());
        assert_eq!(session.start(&gateway).await, Err(SessionError::AlreadyStarted));
    }

    #[tokio::test]
    async fn manual_submit_omits_unanswered_questions() {
        let gateway = InMemoryGateway::new().with_assessment(build_assessment(5, None));
        let mut session = AssessmentSession::new(AssessmentId::new(1));
        session.start(&gateway).await.unwrap();

        for index in [0, 1, 3] {
            session.select_answer(index, option_for(index)).unwrap();
        }
        let completion = session.submit(&gateway).await.unwrap().clone();
        assert!(completion.is_recorded());
        assert_eq!(session.trigger(), Some(SubmitTrigger::Manual));

        let submitted: Vec<_> = gateway.submissions()[0]
            .answers
            .iter()
            .map(|a| a.question_id.clone())
            .collect();
        assert_eq!(
            submitted,
            vec![QuestionId::new(1), QuestionId::new(2), QuestionId::new(4)]
        );

        assert_eq!(session.submit(&gateway).await, Err(SessionError::NotActive));
        assert_eq!(gateway.submission_count(), 1);
    }

    #[tokio::test]
    async fn submit_from_unanswered_last_question() {
        let gateway = InMemoryGateway::new().with_assessment(build_assessment(5, None));
        let mut session = AssessmentSession::new(AssessmentId::new(1));
        session.start(&gateway).await.unwrap();

        for index in 0..4 {
            session.select_answer(index, option_for(index)).unwrap();
            session.next().unwrap();
        }
        assert_eq!(session.active().unwrap().current_index(), 4);
        assert_eq!(
            session.next(),
            Err(SessionError::CurrentUnanswered { index: 4 })
        );
        assert_eq!(session.active().unwrap().current_index(), 4);

        let completion = session.submit(&gateway).await.unwrap();
        assert!(completion.is_recorded());

        let submitted = &gateway.submissions()[0].answers;
        assert_eq!(submitted.len(), 4);
        assert!(
            submitted
                .iter()
                .all(|answer| answer.question_id != QuestionId::new(5))
        );
    }
}
