use std::sync::Arc;
use std::time::Duration;

use edusync_core::model::OptionId;
use gateway::AssessmentGateway;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::SessionError;
use super::session::AssessmentSession;
use super::state::{Completion, SessionSnapshot, SessionState};

const COMMAND_BUFFER: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionCommand {
    SelectAnswer { index: usize, option: OptionId },
    GoTo(usize),
    Next,
    Previous,
    Submit,
}

struct Request {
    command: SessionCommand,
    reply: oneshot::Sender<Result<(), SessionError>>,
}

enum Event {
    Cancelled,
    Detached,
    Tick,
    Command(Request),
}

/// Handle to a session running on its own event loop.
///
/// User commands and countdown ticks are queued and applied one at a time by a
/// single task, so a tick that lands after a submission has started is a no-op.
/// Dropping the handle tears the loop down and stops the countdown.
///
/// Once the session is terminal the loop keeps running, without a countdown,
/// and rejects further commands until it is cancelled.
pub struct SessionHandle {
    commands: mpsc::Sender<Request>,
    snapshots: watch::Receiver<SessionSnapshot>,
    cancel: CancellationToken,
    task: Option<JoinHandle<AssessmentSession>>,
}

impl SessionHandle {
    pub(crate) fn spawn(
        session: AssessmentSession,
        gateway: Arc<dyn AssessmentGateway>,
        tick_period: Duration,
    ) -> Self {
        let (commands, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshots) = watch::channel(session.snapshot());
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run(
            session,
            gateway,
            command_rx,
            snapshot_tx,
            cancel.clone(),
            tick_period,
        ));

        Self {
            commands,
            snapshots,
            cancel,
            task: Some(task),
        }
    }

    /// # Errors
    ///
    /// Returns the session's rejection, or `SessionError::Closed` once the loop has stopped.
    pub async fn select_answer(&self, index: usize, option: OptionId) -> Result<(), SessionError> {
        self.request(SessionCommand::SelectAnswer { index, option })
            .await
    }

    /// # Errors
    ///
    /// Returns the session's rejection, or `SessionError::Closed` once the loop has stopped.
    pub async fn go_to(&self, index: usize) -> Result<(), SessionError> {
        self.request(SessionCommand::GoTo(index)).await
    }

    /// # Errors
    ///
    /// Returns the session's rejection, or `SessionError::Closed` once the loop has stopped.
    pub async fn next(&self) -> Result<(), SessionError> {
        self.request(SessionCommand::Next).await
    }

    /// # Errors
    ///
    /// Returns the session's rejection, or `SessionError::Closed` once the loop has stopped.
    pub async fn previous(&self) -> Result<(), SessionError> {
        self.request(SessionCommand::Previous).await
    }

    /// Submit and wait until the submission has settled.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` if another submission (manual or timed)
    /// got there first, or `SessionError::Closed` once the loop has stopped.
    pub async fn submit(&self) -> Result<Completion, SessionError> {
        self.request(SessionCommand::Submit).await?;
        match &self.snapshots.borrow().state {
            SessionState::Completed(completion) => Ok(completion.clone()),
            _ => Err(SessionError::NotSubmitting),
        }
    }

    async fn request(&self, command: SessionCommand) -> Result<(), SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Request { command, reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        response.await.map_err(|_| SessionError::Closed)?
    }

    /// Latest published state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified after every processed event, ticks included.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Stop the loop. The session keeps whatever state it had reached.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Stop the loop and take the session back.
    ///
    /// An in-flight submission settles before the loop stops.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` if the loop task panicked.
    pub async fn join(mut self) -> Result<AssessmentSession, SessionError> {
        self.cancel.cancel();
        let task = self.task.take().ok_or(SessionError::Closed)?;
        task.await.map_err(|_| SessionError::Closed)
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    mut session: AssessmentSession,
    gateway: Arc<dyn AssessmentGateway>,
    mut commands: mpsc::Receiver<Request>,
    snapshots: watch::Sender<SessionSnapshot>,
    cancel: CancellationToken,
    tick_period: Duration,
) -> AssessmentSession {
    let loaded = tokio::select! {
        biased;
        () = cancel.cancelled() => None,
        result = session.start(gateway.as_ref()) => Some(result),
    };
    snapshots.send_replace(session.snapshot());
    match loaded {
        None => {
            info!(assessment_id = %session.assessment_id(), "session torn down while loading");
            return session;
        }
        Some(Err(err)) => debug!(error = %err, "assessment failed to load"),
        Some(Ok(())) => {}
    }

    // Armed one period out so the first tick lands a full second after activation.
    let mut ticker = time::interval_at(Instant::now() + tick_period, tick_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Terminal sessions keep answering commands (with rejections) until torn down.
    loop {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => Event::Cancelled,
            request = commands.recv() => request.map_or(Event::Detached, Event::Command),
            _ = ticker.tick(), if session.is_active() => Event::Tick,
        };

        match event {
            Event::Cancelled | Event::Detached => {
                info!(
                    assessment_id = %session.assessment_id(),
                    state = session.state().name(),
                    "session torn down"
                );
                break;
            }
            Event::Tick => {
                if let Some(request) = session.tick() {
                    if let Err(err) = session.deliver(request, gateway.as_ref()).await {
                        debug!(error = %err, "timed submission not delivered");
                    }
                }
                snapshots.send_replace(session.snapshot());
            }
            Event::Command(Request { command, reply }) => {
                let result = apply(&mut session, command, gateway.as_ref()).await;
                snapshots.send_replace(session.snapshot());
                let _ = reply.send(result);
            }
        }
    }

    session
}

async fn apply(
    session: &mut AssessmentSession,
    command: SessionCommand,
    gateway: &dyn AssessmentGateway,
) -> Result<(), SessionError> {
    match command {
        SessionCommand::SelectAnswer { index, option } => session.select_answer(index, option),
        SessionCommand::GoTo(index) => session.go_to(index),
        SessionCommand::Next => session.next(),
        SessionCommand::Previous => session.previous(),
        SessionCommand::Submit => session.submit(gateway).await.map(|_| ()),
    }
}
