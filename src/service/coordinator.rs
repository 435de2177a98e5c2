//! Execution Coordinator
//!
//! Drives a batch of sign requests through the user-authorization surface
//! and the subsequent finality waits.
//!
//! Authorization steps cannot be parallelized: each one needs sequential,
//! exclusive access to the single user-authorization surface (a biometric or
//! passkey prompt). So requests are authorized one at a time, in input order,
//! under the surface lock. The resulting pending executions then wait for
//! finality concurrently, one task per handle, so a slow chain never blocks a
//! fast one. Partial outcomes are preserved: a declined authorization or a
//! failed finality wait is recorded per request and never aborts the rest.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::account::{AccountBackend, ExecutionHandle, FinalityStatus};
use crate::control_plane::SignRequest;
use crate::error::ExecutionError;

/// One request that reached finality.
#[derive(Debug, Clone)]
pub struct FinalizedExecution {
    /// The sign request that was executed
    pub request_id: String,
    /// Hash of the finalized transaction
    pub execution_hash: String,
}

/// One request that did not reach finality.
#[derive(Debug)]
pub struct FailedExecution {
    /// The sign request that failed
    pub request_id: String,
    /// Why it failed
    pub error: ExecutionError,
}

/// Outcome of one coordinator pass. Contains only partial results on
/// failure; requests absent from both lists were server-side and skipped.
#[derive(Debug, Default)]
pub struct CoordinatorReport {
    /// Requests that reached finality (including already-applied replays)
    pub finalized: Vec<FinalizedExecution>,
    /// Requests that were declined, rejected, or timed out
    pub failed: Vec<FailedExecution>,
}

/// Coordinates sequential authorization and concurrent finality waits.
pub struct ExecutionCoordinator {
    /// Smart-account execution backend
    backend: Arc<dyn AccountBackend>,
    /// The single user-authorization surface. Held for the sequential
    /// authorization stage of each pass; finality waits run outside it.
    auth_surface: Mutex<()>,
    /// Interval between finality polls
    poll_interval: Duration,
    /// Upper bound on one execution's finality wait
    finality_timeout: Duration,
}

impl ExecutionCoordinator {
    /// Create a new coordinator.
    ///
    /// # Arguments
    ///
    /// * `backend` - Smart-account execution backend
    /// * `poll_interval` - Interval between finality polls
    /// * `finality_timeout` - Upper bound per execution's finality wait
    pub fn new(
        backend: Arc<dyn AccountBackend>,
        poll_interval: Duration,
        finality_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            auth_surface: Mutex::new(()),
            poll_interval,
            finality_timeout,
        }
    }

    /// Authorize every non-server-side request in input order, then wait for
    /// all resulting executions concurrently.
    ///
    /// Server-side requests are skipped with a warning; some other actor
    /// authorizes those.
    pub async fn authorize_all(&self, requests: &[SignRequest]) -> CoordinatorReport {
        let mut report = CoordinatorReport::default();
        let mut handles: Vec<ExecutionHandle> = Vec::new();

        // Stage 1: sequential authorization under the surface lock. The user
        // grants the whole batch back-to-back instead of waiting for each
        // confirmation in between.
        {
            let _surface = self.auth_surface.lock().await;
            for request in requests {
                if request.server_side {
                    warn!(
                        "Skipping server-side sign request {} ({})",
                        request.id, request.kind
                    );
                    continue;
                }

                info!(
                    "Requesting authorization for {} on domain {} ({} call(s))",
                    request.id,
                    request.domain,
                    request.calls.len()
                );
                match self.backend.authorize(request).await {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        warn!("Authorization for {} failed: {}", request.id, e);
                        report.failed.push(FailedExecution {
                            request_id: request.id.clone(),
                            error: e,
                        });
                    }
                }
            }
        }

        if handles.is_empty() {
            return report;
        }

        // Stage 2: concurrent finality waits, one task per handle. Waits for
        // different chains complete in any order.
        let mut waits = JoinSet::new();
        for handle in handles {
            let backend = Arc::clone(&self.backend);
            let poll_interval = self.poll_interval;
            let finality_timeout = self.finality_timeout;
            waits.spawn(async move {
                wait_for_finality(backend, handle, poll_interval, finality_timeout).await
            });
        }

        while let Some(joined) = waits.join_next().await {
            match joined {
                Ok((request_id, Ok(execution_hash))) => {
                    info!("Execution for {} finalized: {}", request_id, execution_hash);
                    report.finalized.push(FinalizedExecution {
                        request_id,
                        execution_hash,
                    });
                }
                Ok((request_id, Err(e))) => {
                    warn!("Execution for {} failed: {}", request_id, e);
                    report.failed.push(FailedExecution {
                        request_id,
                        error: e,
                    });
                }
                Err(e) => {
                    error!("Finality wait task failed: {}", e);
                }
            }
        }

        report
    }
}

/// Poll one execution until it is final, rejected, or the timeout elapses.
/// Transient backend errors are logged and retried until the deadline.
async fn wait_for_finality(
    backend: Arc<dyn AccountBackend>,
    handle: ExecutionHandle,
    poll_interval: Duration,
    finality_timeout: Duration,
) -> (String, Result<String, ExecutionError>) {
    let deadline = tokio::time::Instant::now() + finality_timeout;

    loop {
        match backend.finality_status(&handle).await {
            Ok(FinalityStatus::Finalized { execution_hash }) => {
                return (handle.request_id, Ok(execution_hash));
            }
            Ok(FinalityStatus::AlreadyApplied { execution_hash }) => {
                info!(
                    "Execution for {} was already applied: {}",
                    handle.request_id, execution_hash
                );
                return (handle.request_id, Ok(execution_hash));
            }
            Ok(FinalityStatus::Rejected { reason }) => {
                return (handle.request_id, Err(ExecutionError::Rejected { reason }));
            }
            Ok(FinalityStatus::Pending) => {}
            Err(e) => {
                warn!("Finality query for {} failed: {}", handle.request_id, e);
            }
        }

        if tokio::time::Instant::now() + poll_interval > deadline {
            return (
                handle.request_id,
                Err(ExecutionError::FinalityTimeout {
                    timeout_secs: finality_timeout.as_secs(),
                }),
            );
        }
        tokio::time::sleep(poll_interval).await;
    }
}
