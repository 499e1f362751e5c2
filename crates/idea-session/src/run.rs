use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::channel::{Channel, ChannelConnector};
use crate::errors::{ChannelError, IdeaError};
use crate::locator::idea_from_snapshot;
use crate::model::{ClientOptions, FinishedIdea, GenerationRequest, RawIdea};
use crate::session::SessionApi;
use crate::stream::{ControlMessage, Progress, StreamEvent, UNSPECIFIED_REMOTE_ERROR};

/// Lifecycle of a single run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RunPhase {
    Idle,
    SessionCreating,
    ChannelOpening,
    AwaitingReady,
    Running,
    TerminatingSuccess,
    TerminatingFailure,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::SessionCreating => "session_creating",
            Self::ChannelOpening => "channel_opening",
            Self::AwaitingReady => "awaiting_ready",
            Self::Running => "running",
            Self::TerminatingSuccess => "terminating_success",
            Self::TerminatingFailure => "terminating_failure",
        };
        f.write_str(name)
    }
}

struct PhaseTracker {
    caller_id: i64,
    phase: RunPhase,
}

impl PhaseTracker {
    fn new(caller_id: i64) -> Self {
        Self {
            caller_id,
            phase: RunPhase::Idle,
        }
    }

    fn enter(&mut self, next: RunPhase) {
        debug!(
            event = "run.phase",
            caller_id = self.caller_id,
            from = %self.phase,
            to = %next
        );
        self.phase = next;
    }

    fn finish<T>(&mut self, outcome: &Result<T, IdeaError>) {
        match outcome {
            Ok(_) => self.enter(RunPhase::TerminatingSuccess),
            Err(_) => self.enter(RunPhase::TerminatingFailure),
        }
    }
}

/// Inputs borrowed for the duration of one run.
pub(crate) struct RunContext<'a> {
    pub sessions: &'a dyn SessionApi,
    pub connector: &'a dyn ChannelConnector,
    pub options: &'a ClientOptions,
    pub progress: Option<&'a mpsc::Sender<Progress>>,
}

/// Drives one request from session creation to a finished idea.
///
/// Once a channel has been opened it is disconnected exactly once, before
/// the outcome is returned.
pub(crate) async fn execute(
    ctx: RunContext<'_>,
    request: &GenerationRequest,
    caller_id: i64,
) -> Result<FinishedIdea, IdeaError> {
    let mut tracker = PhaseTracker::new(caller_id);

    tracker.enter(RunPhase::SessionCreating);
    let handle = match ctx.sessions.create_session(request).await {
        Ok(handle) => handle,
        Err(err) => {
            warn!(event = "session.create_failed", caller_id, error = %err);
            let outcome = Err(IdeaError::from(err));
            tracker.finish(&outcome);
            return outcome;
        }
    };
    info!(event = "session.created", caller_id, session_id = %handle);

    tracker.enter(RunPhase::ChannelOpening);
    let mut channel = match ctx
        .connector
        .open(&handle, ctx.options.event_buffer_capacity)
        .await
    {
        Ok(channel) => channel,
        Err(err) => {
            let outcome = Err(IdeaError::from(err));
            tracker.finish(&outcome);
            return outcome;
        }
    };

    let outcome = drive(&ctx, channel.as_mut(), &mut tracker, request, caller_id).await;
    tracker.finish(&outcome);
    channel.disconnect().await;
    debug!(event = "channel.disconnected", caller_id, session_id = %handle);
    outcome
}

async fn drive(
    ctx: &RunContext<'_>,
    channel: &mut dyn Channel,
    tracker: &mut PhaseTracker,
    request: &GenerationRequest,
    caller_id: i64,
) -> Result<FinishedIdea, IdeaError> {
    tracker.enter(RunPhase::AwaitingReady);
    channel.ready(ctx.options.poll_interval).await?;

    let start = ControlMessage::Start
        .encode()
        .map_err(|e| ChannelError::transport(format!("failed to encode start signal: {e}")))?;
    channel.send(start).await?;
    tracker.enter(RunPhase::Running);

    let mut candidate: Option<RawIdea> = None;
    loop {
        let frame = match channel.next_frame().await {
            Some(Ok(frame)) => frame,
            Some(Err(err)) => return Err(err.into()),
            None => {
                return Err(ChannelError::closed("stream ended before a terminal event").into());
            }
        };
        let event = match StreamEvent::decode(&frame) {
            Ok(event) => event,
            Err(err) => {
                warn!(
                    event = "stream.frame_skipped",
                    caller_id,
                    error = %err,
                    frame_len = frame.len() as u64
                );
                continue;
            }
        };

        if let Some(sink) = ctx.progress
            && let Some(item) = Progress::from_event(&event)
        {
            let _ = sink.try_send(item);
        }

        match event {
            StreamEvent::NodeComplete { node, state } if node == ctx.options.structured_stage => {
                match idea_from_snapshot(&state) {
                    Some(idea) => {
                        debug!(event = "stream.candidate_updated", caller_id, stage = %node);
                        candidate = Some(idea);
                    }
                    None => {
                        debug!(event = "stream.candidate_missing", caller_id, stage = %node);
                    }
                }
            }
            StreamEvent::NodeComplete { node, .. } => {
                debug!(event = "stream.stage_complete", caller_id, stage = %node);
            }
            StreamEvent::Connected { .. } | StreamEvent::Token { .. } => {}
            StreamEvent::Complete { .. } => {
                let raw = candidate.ok_or(IdeaError::MissingResult)?;
                info!(event = "run.completed", caller_id);
                return Ok(FinishedIdea::assemble(raw, caller_id, request));
            }
            StreamEvent::Error { message } => {
                let message = message
                    .filter(|text| !text.trim().is_empty())
                    .unwrap_or_else(|| UNSPECIFIED_REMOTE_ERROR.to_string());
                warn!(event = "run.remote_error", caller_id, message = %message);
                return Err(IdeaError::RemoteGeneration(message));
            }
        }
    }
}
