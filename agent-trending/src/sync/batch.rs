//! Retry state machine shared by batch writes and snapshot reads.

use crate::sync::WorkspaceError;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// How often and how patiently a request is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first included.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Retries immediately; for tests and fakes.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay after failed attempt `attempt` (1-based): `base * 2^(attempt-1)`,
    /// capped at `max_delay`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// What a batch writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchKind {
    Create,
    Update,
}

impl BatchKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }

    /// Creating the same rows twice duplicates them; updating twice does not.
    #[must_use]
    pub fn replay(self) -> Replay {
        match self {
            Self::Create => Replay::Unsafe,
            Self::Update => Replay::Safe,
        }
    }
}

/// Whether a request may be resent when its first outcome is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replay {
    /// Reads and updates.
    Safe,
    /// Creates; only resent after errors that prove nothing was applied.
    Unsafe,
}

/// Lifecycle of one batch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BatchState {
    /// Not yet sent.
    Pending,

    /// Attempt `attempt` is in progress.
    InFlight { attempt: u32 },

    /// Attempt `attempt` failed; the next one starts after `delay`.
    Retrying {
        attempt: u32,
        #[serde(skip)]
        delay: Duration,
        error: String,
    },

    /// Written after `attempts` tries.
    Succeeded { attempts: u32 },

    /// Gave up after `attempts` tries.
    Failed { attempts: u32, error: String },
}

impl BatchState {
    /// Returns true for `Succeeded` and `Failed`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }

    /// Starts the next attempt from `Pending` or `Retrying`.
    ///
    /// Any other state is returned as is.
    #[must_use]
    pub fn start(self) -> Self {
        match self {
            Self::Pending => Self::InFlight { attempt: 1 },
            Self::Retrying { attempt, .. } => Self::InFlight {
                attempt: attempt + 1,
            },
            other => other,
        }
    }

    /// Applies the result of the in-flight attempt.
    ///
    /// Any state other than `InFlight` is returned as is. With
    /// [`Replay::Unsafe`] an error that may have been applied is final.
    #[must_use]
    pub fn finish(
        self,
        result: Result<(), &WorkspaceError>,
        policy: &RetryPolicy,
        replay: Replay,
    ) -> Self {
        let Self::InFlight { attempt } = self else {
            return self;
        };
        let resendable = |e: &WorkspaceError| {
            e.is_retryable() && (replay == Replay::Safe || !e.may_have_applied())
        };
        match result {
            Ok(()) => Self::Succeeded { attempts: attempt },
            Err(e) if resendable(e) && attempt < policy.max_attempts => Self::Retrying {
                attempt,
                delay: policy.delay_for(attempt),
                error: e.to_string(),
            },
            Err(e) => Self::Failed {
                attempts: attempt,
                error: e.to_string(),
            },
        }
    }

    /// Attempts made so far.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Pending => 0,
            Self::InFlight { attempt } | Self::Retrying { attempt, .. } => *attempt,
            Self::Succeeded { attempts } | Self::Failed { attempts, .. } => *attempts,
        }
    }
}

/// A batch that exhausted its attempts or hit a permanent error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncBatchFailure {
    pub kind: BatchKind,

    /// Repositories in the batch.
    pub full_names: Vec<String>,

    pub attempts: u32,

    /// Last error seen.
    pub error: String,
}

/// Drives `op` through the state machine until a terminal state.
///
/// Returns the terminal state and, on success, the operation's value.
pub(crate) async fn drive<T, F, Fut>(
    policy: &RetryPolicy,
    replay: Replay,
    mut op: F,
) -> (BatchState, Option<T>)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, WorkspaceError>>,
{
    let mut state = BatchState::Pending;
    loop {
        state = state.start();
        debug!(attempt = state.attempts(), "Sending request");

        let result = op().await;
        state = state.finish(result.as_ref().map(|_| ()), policy, replay);

        if let BatchState::Retrying {
            attempt,
            delay,
            error,
        } = &state
        {
            warn!(attempt, delay_ms = delay.as_millis() as u64, error = %error, "Request failed, retrying");
            tokio::time::sleep(*delay).await;
            continue;
        }

        if state.is_terminal() {
            return (state, result.ok());
        }

        // `finish` never leaves a batch in flight.
        let attempts = state.attempts();
        return (
            BatchState::Failed {
                attempts,
                error: "request did not complete".to_string(),
            },
            None,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn transient() -> WorkspaceError {
        WorkspaceError::Transient {
            message: "503".to_string(),
        }
    }

    fn rejected() -> WorkspaceError {
        WorkspaceError::Rejected {
            code: 1254001,
            message: "WrongRequestBody".to_string(),
        }
    }

    #[test]
    fn delays_double_and_cap() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        };
        let delays: Vec<u64> = (1..=7).map(|n| policy.delay_for(n).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 30, 30]);
        assert_eq!(policy.delay_for(64), Duration::from_secs(30));
    }

    #[test]
    fn transitions_follow_retry_policy() {
        let policy = RetryPolicy {
            max_attempts: 2,
            ..RetryPolicy::default()
        };

        let state = BatchState::Pending.start();
        assert_eq!(state, BatchState::InFlight { attempt: 1 });

        let state = state.finish(Err(&transient()), &policy, Replay::Safe);
        assert!(matches!(
            state,
            BatchState::Retrying { attempt: 1, delay, .. } if delay == Duration::from_secs(1)
        ));

        let state = state
            .start()
            .finish(Err(&transient()), &policy, Replay::Safe);
        assert!(matches!(state, BatchState::Failed { attempts: 2, .. }));
        assert!(state.is_terminal());
    }

    #[test]
    fn permanent_errors_fail_immediately() {
        let state = BatchState::Pending
            .start()
            .finish(Err(&rejected()), &RetryPolicy::default(), Replay::Safe);
        assert!(matches!(state, BatchState::Failed { attempts: 1, .. }));
    }

    #[test]
    fn terminal_states_ignore_further_input() {
        let done = BatchState::Succeeded { attempts: 1 };
        assert_eq!(done.clone().start(), done);
        assert_eq!(
            done.clone()
                .finish(Ok(()), &RetryPolicy::default(), Replay::Safe),
            done
        );
    }

    #[test]
    fn unconfirmed_creates_are_not_resent() {
        let timeout = WorkspaceError::Unconfirmed {
            message: "operation timed out".to_string(),
        };
        let policy = RetryPolicy::immediate(3);

        let create = BatchState::Pending
            .start()
            .finish(Err(&timeout), &policy, BatchKind::Create.replay());
        assert!(matches!(create, BatchState::Failed { attempts: 1, .. }));

        let update = BatchState::Pending
            .start()
            .finish(Err(&timeout), &policy, BatchKind::Update.replay());
        assert!(matches!(update, BatchState::Retrying { attempt: 1, .. }));

        let throttled = BatchState::Pending.start().finish(
            Err(&WorkspaceError::RateLimited {
                message: "frequency limit".to_string(),
            }),
            &policy,
            Replay::Unsafe,
        );
        assert!(matches!(throttled, BatchState::Retrying { .. }));
    }

    #[tokio::test]
    async fn drive_retries_until_success() {
        let calls = AtomicU32::new(0);
        let (state, value) = drive(&RetryPolicy::immediate(3), Replay::Safe, || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(transient())
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(state, BatchState::Succeeded { attempts: 3 });
        assert_eq!(value, Some("done"));
    }

    #[tokio::test]
    async fn drive_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let (state, value) = drive(&RetryPolicy::immediate(2), Replay::Safe, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(transient())
        })
        .await;

        assert!(matches!(state, BatchState::Failed { attempts: 2, .. }));
        assert!(value.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
