//! Operation Tracker
//!
//! Polls one operation's control-plane status until terminal, with a bounded
//! attempt budget, and detects two-phase signing: if a poll observes fresh
//! non-server-side sign requests, tracking pauses and surfaces them so the
//! caller can run another authorization pass before resuming with the same
//! session.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::control_plane::{ControlPlaneClient, Operation, OperationStatus, SignRequest};

/// Per-operation tracking state, carried across pauses.
///
/// The attempt budget is shared by every signing phase of the operation: the
/// number of phases is unbounded, but total wall-clock is capped by this
/// budget.
#[derive(Debug)]
pub struct TrackSession {
    operation_id: String,
    attempts_left: u32,
    seen_requests: HashSet<String>,
}

impl TrackSession {
    /// Create a session with a fresh attempt budget.
    pub fn new(operation_id: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            operation_id: operation_id.into(),
            attempts_left: max_attempts,
            seen_requests: HashSet::new(),
        }
    }

    /// Mark sign requests as already observed (e.g. the initial batch that
    /// was authorized before tracking started).
    pub fn mark_seen<I>(&mut self, request_ids: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.seen_requests.extend(request_ids);
    }

    /// The tracked operation id.
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Remaining poll attempts.
    pub fn attempts_left(&self) -> u32 {
        self.attempts_left
    }
}

/// Result of one tracking run.
#[derive(Debug)]
pub enum TrackOutcome {
    /// The operation reached COMPLETED.
    Completed,
    /// The operation reached FAILED.
    Failed {
        /// Control-plane failure message, when available
        reason: Option<String>,
    },
    /// The attempt budget ran out with the operation still non-terminal.
    /// Distinct from `Failed`: the operation may still complete later.
    TimedOut,
    /// Fresh non-server-side sign requests appeared. The caller runs another
    /// authorization pass, submits the results, and resumes tracking with
    /// the same session.
    SignatureRequired {
        /// The newly observed requests, in control-plane order
        requests: Vec<SignRequest>,
    },
}

/// Polls operations until terminal.
pub struct OperationTracker {
    /// Control-plane client for status reads
    control_plane: Arc<ControlPlaneClient>,
    /// Interval between polls
    poll_interval: Duration,
}

impl OperationTracker {
    /// Create a new tracker.
    pub fn new(control_plane: Arc<ControlPlaneClient>, poll_interval: Duration) -> Self {
        Self {
            control_plane,
            poll_interval,
        }
    }

    /// Single status read for one operation.
    pub async fn poll(&self, operation_id: &str) -> anyhow::Result<Operation> {
        self.control_plane.get_operation(operation_id).await
    }

    /// Poll until terminal, the attempt budget is exhausted, or a fresh
    /// signing phase appears.
    ///
    /// A failed poll (transport error, malformed response) consumes an
    /// attempt and is retried at the next interval; errors never cross out of
    /// the tracking loop.
    pub async fn track(&self, session: &mut TrackSession) -> TrackOutcome {
        loop {
            if session.attempts_left == 0 {
                warn!(
                    "Tracking budget exhausted for operation {} before a terminal status",
                    session.operation_id
                );
                return TrackOutcome::TimedOut;
            }
            session.attempts_left -= 1;

            match self.control_plane.get_operation(&session.operation_id).await {
                Err(e) => {
                    warn!("Status poll for {} failed: {:#}", session.operation_id, e);
                }
                Ok(operation) => {
                    debug!(
                        "Operation {} status: {:?} ({} attempt(s) left)",
                        session.operation_id, operation.status, session.attempts_left
                    );

                    match operation.status {
                        OperationStatus::Completed => return TrackOutcome::Completed,
                        OperationStatus::Failed => {
                            return TrackOutcome::Failed {
                                reason: operation.error,
                            }
                        }
                        _ => {
                            let fresh: Vec<SignRequest> = operation
                                .sign_requests
                                .into_iter()
                                .filter(|request| {
                                    !request.server_side
                                        && session.seen_requests.insert(request.id.clone())
                                })
                                .collect();

                            if !fresh.is_empty() {
                                info!(
                                    "Operation {} requires {} additional signature(s)",
                                    session.operation_id,
                                    fresh.len()
                                );
                                return TrackOutcome::SignatureRequired { requests: fresh };
                            }
                        }
                    }
                }
            }

            if session.attempts_left == 0 {
                return TrackOutcome::TimedOut;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
