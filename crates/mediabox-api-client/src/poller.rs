//! Video processing status poller.
//!
//! After a video upload is accepted, [`VideoStatusPoller::start`] spawns a
//! task that checks the job once immediately and then on a fixed interval
//! until the job finishes, fails, or the attempt budget runs out. The latest
//! [`PollState`] is published on a watch channel.
//!
//! One poller tracks at most one job. Starting a new poll cancels the
//! previous one, and a cancelled poll never publishes again: every publish
//! re-checks, under the same lock that cancellation takes, that its poll is
//! still the active one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mediabox_core::models::{VideoStatus, VideoStatusCode};
use mediabox_core::ClientError;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::session::lock;
use crate::ApiClient;

/// Caller-visible state of the poller.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    /// Nothing is being tracked.
    Idle,
    /// Checks are running; `status` is the latest observation, if any.
    Polling {
        video_uuid: String,
        attempt: u32,
        status: Option<VideoStatus>,
    },
    Finished {
        video_uuid: String,
        status: VideoStatus,
    },
    ProcessingFailed {
        video_uuid: String,
        status: VideoStatus,
    },
    TimedOut {
        video_uuid: String,
        attempts: u32,
        last_status: Option<VideoStatus>,
    },
    /// A status request failed; the job itself may still be running.
    CheckFailed {
        video_uuid: String,
        error: ClientError,
    },
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Idle | PollState::Polling { .. })
    }

    /// Latest status reported by the backend.
    pub fn status(&self) -> Option<&VideoStatus> {
        match self {
            PollState::Polling { status, .. } => status.as_ref(),
            PollState::Finished { status, .. } | PollState::ProcessingFailed { status, .. } => {
                Some(status)
            }
            PollState::TimedOut { last_status, .. } => last_status.as_ref(),
            PollState::Idle | PollState::CheckFailed { .. } => None,
        }
    }

    /// Terminal states as a result: `Ok` only for a finished job.
    pub fn into_result(self) -> Option<Result<VideoStatus, ClientError>> {
        match self {
            PollState::Idle | PollState::Polling { .. } => None,
            PollState::Finished { status, .. } => Some(Ok(status)),
            PollState::ProcessingFailed { status, .. } => {
                Some(Err(ClientError::ProcessingFailed(status.to_string())))
            }
            PollState::TimedOut { attempts, .. } => {
                Some(Err(ClientError::ProcessingTimedOut { attempts }))
            }
            PollState::CheckFailed { error, .. } => {
                Some(Err(ClientError::StatusCheckFailed(error.to_string())))
            }
        }
    }
}

/// Identifies one poll started by [`VideoStatusPoller::start`].
#[derive(Debug, Clone)]
pub struct PollHandle {
    id: u64,
    video_uuid: String,
    cancel: CancellationToken,
}

impl PollHandle {
    pub fn video_uuid(&self) -> &str {
        &self.video_uuid
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[derive(Debug)]
struct ActivePoll {
    id: u64,
    cancel: CancellationToken,
}

struct PollerInner {
    api: ApiClient,
    interval: Duration,
    max_attempts: u32,
    state: watch::Sender<PollState>,
    active: Mutex<Option<ActivePoll>>,
    next_id: AtomicU64,
}

impl PollerInner {
    /// Publish `state` if poll `id` is still the active, uncancelled poll.
    fn publish(&self, id: u64, state: PollState) -> bool {
        let active = lock(&self.active);
        match active.as_ref() {
            Some(poll) if poll.id == id && !poll.cancel.is_cancelled() => {
                self.state.send_replace(state);
                true
            }
            _ => false,
        }
    }

    /// Publish a terminal state and release the active slot.
    fn finish(&self, id: u64, state: PollState) {
        let mut active = lock(&self.active);
        if matches!(active.as_ref(), Some(poll) if poll.id == id && !poll.cancel.is_cancelled()) {
            self.state.send_replace(state);
            *active = None;
        }
    }

    /// Cancel the active poll, optionally only if it is `id`.
    fn cancel(&self, id: Option<u64>) -> bool {
        let mut active = lock(&self.active);
        let matches = match (active.as_ref(), id) {
            (Some(poll), Some(id)) => poll.id == id,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if !matches {
            return false;
        }
        if let Some(poll) = active.take() {
            poll.cancel.cancel();
            self.state.send_replace(PollState::Idle);
            tracing::debug!(poll_id = poll.id, "Video status poll cancelled");
        }
        true
    }
}

/// Tracks the processing of one uploaded video at a time.
#[derive(Clone)]
pub struct VideoStatusPoller {
    inner: Arc<PollerInner>,
}

impl std::fmt::Debug for VideoStatusPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoStatusPoller")
            .field("interval", &self.inner.interval)
            .field("max_attempts", &self.inner.max_attempts)
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}

impl VideoStatusPoller {
    /// Poller using the interval and attempt budget from the client's config.
    pub fn new(api: ApiClient) -> Self {
        let interval = api.config().poll_interval;
        let max_attempts = api.config().poll_max_attempts;
        Self::with_schedule(api, interval, max_attempts)
    }

    pub fn with_schedule(api: ApiClient, interval: Duration, max_attempts: u32) -> Self {
        let (state, _) = watch::channel(PollState::Idle);
        Self {
            inner: Arc::new(PollerInner {
                api,
                interval,
                max_attempts: max_attempts.max(1),
                state,
                active: Mutex::new(None),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Start tracking `video_uuid`, cancelling any poll already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, video_uuid: &str) -> PollHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let cancel = CancellationToken::new();
        let video_uuid = video_uuid.to_string();

        {
            let mut active = lock(&self.inner.active);
            if let Some(previous) = active.take() {
                previous.cancel.cancel();
                tracing::debug!(
                    poll_id = previous.id,
                    "Previous video status poll superseded"
                );
            }
            *active = Some(ActivePoll {
                id,
                cancel: cancel.clone(),
            });
            self.inner.state.send_replace(PollState::Polling {
                video_uuid: video_uuid.clone(),
                attempt: 0,
                status: None,
            });
        }

        tracing::info!(
            poll_id = id,
            video_uuid = %video_uuid,
            interval_ms = self.inner.interval.as_millis() as u64,
            max_attempts = self.inner.max_attempts,
            "Started video status polling"
        );

        tokio::spawn(run_poll(
            Arc::clone(&self.inner),
            id,
            video_uuid.clone(),
            cancel.clone(),
        ));

        PollHandle {
            id,
            video_uuid,
            cancel,
        }
    }

    /// Stop the poll identified by `handle`. Returns false if it had already ended.
    pub fn cancel(&self, handle: &PollHandle) -> bool {
        handle.cancel.cancel();
        self.inner.cancel(Some(handle.id))
    }

    /// Stop whatever poll is running. Idempotent.
    pub fn stop(&self) {
        self.inner.cancel(None);
    }

    pub fn is_active(&self) -> bool {
        lock(&self.inner.active).is_some()
    }

    pub fn state(&self) -> PollState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.inner.state.subscribe()
    }

    /// Wait until the current poll ends.
    ///
    /// Returns the terminal state, or [`PollState::Idle`] if the poll was
    /// cancelled or none was running.
    pub async fn wait(&self) -> PollState {
        let mut rx = self.subscribe();
        let state = match rx
            .wait_for(|state| !matches!(state, PollState::Polling { .. }))
            .await
        {
            Ok(state) => state.clone(),
            Err(_) => PollState::Idle,
        };
        state
    }
}

async fn run_poll(
    inner: Arc<PollerInner>,
    id: u64,
    video_uuid: String,
    cancel: CancellationToken,
) {
    let mut attempt = 0u32;

    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            result = inner.api.get_video_status(&video_uuid) => result,
        };
        attempt += 1;

        let status = match result {
            Ok(status) => status,
            Err(error) => {
                tracing::warn!(
                    poll_id = id,
                    video_uuid = %video_uuid,
                    attempt,
                    error = %error,
                    "Video status check failed"
                );
                inner.finish(id, PollState::CheckFailed { video_uuid, error });
                return;
            }
        };

        tracing::debug!(
            poll_id = id,
            video_uuid = %video_uuid,
            attempt,
            code = status.code.code(),
            status = %status,
            "Video status check"
        );

        match status.code {
            VideoStatusCode::Finished => {
                tracing::info!(poll_id = id, video_uuid = %video_uuid, attempt, "Video processing finished");
                inner.finish(id, PollState::Finished { video_uuid, status });
                return;
            }
            VideoStatusCode::Failed => {
                tracing::warn!(poll_id = id, video_uuid = %video_uuid, attempt, "Video processing failed");
                inner.finish(id, PollState::ProcessingFailed { video_uuid, status });
                return;
            }
            _ => {}
        }

        if attempt >= inner.max_attempts {
            tracing::warn!(
                poll_id = id,
                video_uuid = %video_uuid,
                attempts = attempt,
                "Video processing timed out"
            );
            inner.finish(
                id,
                PollState::TimedOut {
                    video_uuid,
                    attempts: attempt,
                    last_status: Some(status),
                },
            );
            return;
        }

        let published = inner.publish(
            id,
            PollState::Polling {
                video_uuid: video_uuid.clone(),
                attempt,
                status: Some(status),
            },
        );
        if !published {
            return;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(inner.interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: i64) -> VideoStatus {
        VideoStatus {
            code: VideoStatusCode::from_code(code),
            name: String::new(),
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(!PollState::Idle.is_terminal());
        assert!(!PollState::Polling {
            video_uuid: "v".into(),
            attempt: 1,
            status: None
        }
        .is_terminal());
        assert!(PollState::TimedOut {
            video_uuid: "v".into(),
            attempts: 30,
            last_status: None
        }
        .is_terminal());
    }

    #[test]
    fn test_into_result() {
        let finished = PollState::Finished {
            video_uuid: "v".into(),
            status: status(3),
        };
        assert_eq!(finished.into_result(), Some(Ok(status(3))));

        let timed_out = PollState::TimedOut {
            video_uuid: "v".into(),
            attempts: 30,
            last_status: Some(status(2)),
        };
        assert_eq!(
            timed_out.into_result(),
            Some(Err(ClientError::ProcessingTimedOut { attempts: 30 }))
        );

        let failed = PollState::ProcessingFailed {
            video_uuid: "v".into(),
            status: status(5),
        };
        assert!(matches!(
            failed.into_result(),
            Some(Err(ClientError::ProcessingFailed(ref name))) if name == "FAILED"
        ));

        assert_eq!(PollState::Idle.into_result(), None);
    }
}
