use std::sync::Arc;
use std::time::Duration;

use edusync_core::model::AssessmentId;
use gateway::AssessmentGateway;

use crate::Clock;
use crate::error::SessionError;
use super::driver::SessionHandle;
use super::policy::SubmissionFailurePolicy;
use super::session::AssessmentSession;
use super::state::Completion;

const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);
const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

/// Orchestrates session start, submission and the countdown loop.
#[derive(Clone)]
pub struct AssessmentLoopService {
    clock: Clock,
    gateway: Arc<dyn AssessmentGateway>,
    policy: SubmissionFailurePolicy,
    tick_period: Duration,
}

impl AssessmentLoopService {
    #[must_use]
    pub fn new(clock: Clock, gateway: Arc<dyn AssessmentGateway>) -> Self {
        Self {
            clock,
            gateway,
            policy: SubmissionFailurePolicy::default(),
            tick_period: DEFAULT_TICK_PERIOD,
        }
    }

    #[must_use]
    pub fn with_failure_policy(mut self, policy: SubmissionFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Wall time per countdown second. Only tests should shorten this.
    /// Periods under a millisecond are raised to one.
    #[must_use]
    pub fn with_tick_period(mut self, tick_period: Duration) -> Self {
        self.tick_period = tick_period.max(MIN_TICK_PERIOD);
        self
    }

    #[must_use]
    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    #[must_use]
    pub fn failure_policy(&self) -> SubmissionFailurePolicy {
        self.policy
    }

    fn new_session(&self, assessment_id: AssessmentId) -> AssessmentSession {
        AssessmentSession::new(assessment_id)
            .with_clock(self.clock)
            .with_failure_policy(self.policy)
    }

    /// Fetch the assessment and return an active session without a countdown loop.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::FetchFailed` when the gateway cannot provide the assessment.
    pub async fn start_session(
        &self,
        assessment_id: AssessmentId,
    ) -> Result<AssessmentSession, SessionError> {
        let mut session = self.new_session(assessment_id);
        session.start(self.gateway.as_ref()).await?;
        Ok(session)
    }

    /// Submit a session started with [`Self::start_session`].
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` if the session already left `Active`.
    pub async fn submit(&self, session: &mut AssessmentSession) -> Result<Completion, SessionError> {
        session.submit(self.gateway.as_ref()).await.cloned()
    }

    /// Spawn a session on its own event loop. Loading happens inside the loop,
    /// so the handle starts out publishing `Loading`.
    #[must_use]
    pub fn spawn_session(&self, assessment_id: AssessmentId) -> SessionHandle {
        let session = self.new_session(assessment_id);
        SessionHandle::spawn(session, Arc::clone(&self.gateway), self.tick_period)
    }
}

impl std::fmt::Debug for AssessmentLoopService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssessmentLoopService")
            .field("policy", &self.policy)
            .field("tick_period", &self.tick_period)
            .finish_non_exhaustive()
    }
}
