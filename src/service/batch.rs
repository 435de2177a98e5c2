//! Batch Orchestrator
//!
//! Top-level driver for multi-operation flows (batch send, multi-chain
//! collect). Prepares one operation per batch item concurrently, resolves
//! burn/mint steps through the attestation pipeline, runs a single merged
//! authorization pass so the user grants the whole batch back-to-back, fans
//! the results back out to their owning operations, then tracks every
//! operation concurrently while tolerating partial failure.

use ethereum_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::account::AccountBackend;
use crate::attestation::AttestationClient;
use crate::config::{DomainConfig, OrchestratorConfig};
use crate::control_plane::{
    ControlPlaneClient, CreateOperationRequest, Operation, SignRequest, SignatureEntry,
};
use crate::crypto::IntentSigner;
use crate::error::{AttestationError, BatchError, CodecError};
use crate::intent::BurnIntentBuilder;
use crate::mint::build_mint_call;
use crate::service::coordinator::{CoordinatorReport, ExecutionCoordinator};
use crate::service::tracker::{OperationTracker, TrackOutcome, TrackSession};

// ============================================================================
// BATCH STRUCTURES
// ============================================================================

/// One line item of a multi-operation batch: a human label plus the action to
/// prepare. Maps 1:1 to an operation created in the prepare phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    /// Human-readable label used in reports
    pub label: String,
    /// The action to prepare
    pub request: CreateOperationRequest,
}

/// Terminal outcome of one batch item.
#[derive(Debug)]
pub enum ItemOutcome {
    /// The operation reached COMPLETED
    Completed,
    /// The prepare call failed; the item never got an operation
    PreparationFailed {
        /// Why preparation failed
        reason: String,
    },
    /// The attestation service rejected the item's transfer
    TransferRejected {
        /// Service-provided rejection message
        reason: String,
    },
    /// No authorization was granted for any of the item's requests
    AuthorizationFailed {
        /// Per-request failure summary
        reason: String,
    },
    /// The operation reached FAILED
    Failed {
        /// Control-plane failure message, when available
        reason: Option<String>,
    },
    /// The tracking budget ran out; the operation may still complete later
    TimedOut,
}

impl ItemOutcome {
    /// Whether this item completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Completed)
    }
}

/// Per-item result in the batch report.
#[derive(Debug)]
pub struct ItemReport {
    /// The item's label
    pub label: String,
    /// The prepared operation id, when preparation succeeded
    pub operation_id: Option<String>,
    /// Terminal outcome
    pub outcome: ItemOutcome,
}

/// Aggregate result of one batch run. Successes are always listed, even when
/// other items failed.
#[derive(Debug)]
pub struct BatchReport {
    /// Per-item results, in input order
    pub items: Vec<ItemReport>,
    /// Worst-case estimate across all prepared operations, in seconds
    pub estimated_time_secs: Option<u64>,
}

impl BatchReport {
    /// Whether every item completed.
    pub fn all_completed(&self) -> bool {
        self.items.iter().all(|item| item.outcome.is_success())
    }

    /// Convert a partial result into an error listing the failed items. The
    /// report itself still holds the successes.
    pub fn ensure_completed(&self) -> Result<(), BatchError> {
        let failed_items: Vec<String> = self
            .items
            .iter()
            .filter(|item| !item.outcome.is_success())
            .map(|item| item.label.clone())
            .collect();

        if failed_items.is_empty() {
            Ok(())
        } else {
            Err(BatchError::PartialBatchFailure { failed_items })
        }
    }
}

/// Per-item working state during a run.
struct ItemSlot {
    label: String,
    operation: Option<Operation>,
    outcome: Option<ItemOutcome>,
}

/// Failure while resolving a burn/mint step.
enum ResolveError {
    /// Malformed embedded payload: a version-mismatch indicator, aborts the
    /// operation without retry
    Codec(CodecError),
    /// The attestation service turned the transfer down
    Attestation(AttestationError),
}

impl ResolveError {
    fn into_outcome(self) -> ItemOutcome {
        match self {
            ResolveError::Codec(e) => ItemOutcome::Failed {
                reason: Some(e.to_string()),
            },
            ResolveError::Attestation(AttestationError::TransferRejected { reason }) => {
                ItemOutcome::TransferRejected { reason }
            }
            ResolveError::Attestation(e) => ItemOutcome::Failed {
                reason: Some(e.to_string()),
            },
        }
    }
}

// ============================================================================
// OPERATION DRIVER
// ============================================================================

/// Shared components for driving one operation to a terminal outcome,
/// cloned into each tracking task.
#[derive(Clone)]
struct OperationDriver {
    control_plane: Arc<ControlPlaneClient>,
    attestation: Arc<AttestationClient>,
    coordinator: Arc<ExecutionCoordinator>,
    tracker: Arc<OperationTracker>,
    signer: Arc<IntentSigner>,
    default_max_fee: U256,
}

impl OperationDriver {
    /// Resolve burn/mint steps in place: a request carrying an embedded
    /// transfer payload and no concrete calls is turned into a single mint
    /// call by building, signing, and attesting a burn intent.
    async fn resolve_sign_requests(
        &self,
        requests: &mut [SignRequest],
    ) -> Result<(), ResolveError> {
        for request in requests.iter_mut() {
            let Some(spec_wire) = request.burn_intent.as_ref() else {
                continue;
            };
            if !request.calls.is_empty() {
                continue;
            }

            let intent = BurnIntentBuilder::new()
                .max_fee(self.default_max_fee)
                .build_from_wire(spec_wire)
                .map_err(ResolveError::Codec)?;

            info!(
                "Attesting burn intent for request {} ({} from domain {} to {})",
                request.id,
                intent.spec.value,
                intent.spec.source_domain,
                intent.spec.destination_domain
            );

            let envelope = self.signer.sign(&intent);
            let attestation = self
                .attestation
                .request_attestation(&envelope)
                .await
                .map_err(ResolveError::Attestation)?;

            // The destination gateway minter is the spec's own destination
            // contract; presenting the attestation there mints to the
            // attested recipient.
            request.calls = vec![build_mint_call(intent.spec.destination_contract, &attestation)];
        }
        Ok(())
    }

    /// Run one authorization pass for an operation's fresh requests and
    /// submit the results. Returns an outcome when the operation can no
    /// longer make progress.
    async fn sign_and_submit(
        &self,
        operation_id: &str,
        requests: &mut Vec<SignRequest>,
    ) -> Result<(), ItemOutcome> {
        if let Err(e) = self.resolve_sign_requests(requests).await {
            return Err(e.into_outcome());
        }

        let report = self.coordinator.authorize_all(requests).await;
        for failure in &report.failed {
            warn!(
                "Request {} of operation {} failed: {}",
                failure.request_id, operation_id, failure.error
            );
        }

        if report.finalized.is_empty() {
            return Err(ItemOutcome::AuthorizationFailed {
                reason: summarize_failures(&report),
            });
        }

        let entries: Vec<SignatureEntry> = report
            .finalized
            .iter()
            .map(|finalized| SignatureEntry {
                request_id: finalized.request_id.clone(),
                execution_hash: finalized.execution_hash.clone(),
            })
            .collect();

        match self
            .control_plane
            .submit_signatures(operation_id, &entries)
            .await
        {
            Ok(updated) => {
                info!(
                    "Submitted {} signature(s) for operation {} (status now {:?})",
                    entries.len(),
                    operation_id,
                    updated.status
                );
                Ok(())
            }
            Err(e) => Err(ItemOutcome::Failed {
                reason: Some(format!("Failed to submit signatures: {:#}", e)),
            }),
        }
    }

    /// Track one operation to a terminal outcome, re-entering the signing
    /// pipeline whenever a fresh phase appears.
    async fn drive(&self, operation_id: String, mut session: TrackSession) -> ItemOutcome {
        loop {
            match self.tracker.track(&mut session).await {
                TrackOutcome::Completed => return ItemOutcome::Completed,
                TrackOutcome::Failed { reason } => return ItemOutcome::Failed { reason },
                TrackOutcome::TimedOut => return ItemOutcome::TimedOut,
                TrackOutcome::SignatureRequired { mut requests } => {
                    info!(
                        "Operation {} entered a new signing phase with {} request(s)",
                        operation_id,
                        requests.len()
                    );
                    if let Err(outcome) =
                        self.sign_and_submit(&operation_id, &mut requests).await
                    {
                        return outcome;
                    }
                }
            }
        }
    }
}

fn summarize_failures(report: &CoordinatorReport) -> String {
    if report.failed.is_empty() {
        "no authorization granted".to_string()
    } else {
        report
            .failed
            .iter()
            .map(|failure| format!("{}: {}", failure.request_id, failure.error))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// ============================================================================
// BATCH ORCHESTRATOR
// ============================================================================

/// Drives an arbitrary set of independently-preparable operations through
/// preparation, one merged signing pass, submission, and concurrent tracking.
pub struct BatchOrchestrator {
    driver: OperationDriver,
    domains: Vec<DomainConfig>,
    max_track_attempts: u32,
}

impl BatchOrchestrator {
    /// Create an orchestrator from configuration, an execution backend, and
    /// the intent signer. The control-plane, attestation, coordinator, and
    /// tracker components are built from the config's endpoints and timing.
    pub fn new(
        config: &OrchestratorConfig,
        backend: Arc<dyn AccountBackend>,
        signer: IntentSigner,
    ) -> anyhow::Result<Self> {
        let control_plane = Arc::new(ControlPlaneClient::new(
            &config.service.control_plane_url,
            config.service.request_timeout(),
        )?);
        let attestation = Arc::new(AttestationClient::new(
            &config.service.attestation_url,
            config.service.request_timeout(),
        )?);
        let coordinator = Arc::new(ExecutionCoordinator::new(
            backend,
            config.service.poll_interval(),
            config.service.finality_timeout(),
        ));
        let tracker = Arc::new(OperationTracker::new(
            Arc::clone(&control_plane),
            config.service.poll_interval(),
        ));

        Ok(Self {
            driver: OperationDriver {
                control_plane,
                attestation,
                coordinator,
                tracker,
                signer: Arc::new(signer),
                default_max_fee: config.default_max_fee()?,
            },
            domains: config.domain.clone(),
            max_track_attempts: config.service.max_track_attempts,
        })
    }

    /// Run a batch to completion.
    ///
    /// Returns the per-item report; call [`BatchReport::ensure_completed`]
    /// to turn a partial result into an error. An empty batch returns
    /// [`BatchError::NoOpSelected`] without any network calls.
    pub async fn run(&self, items: Vec<BatchItem>) -> Result<BatchReport, BatchError> {
        if items.is_empty() {
            return Err(BatchError::NoOpSelected);
        }

        info!("Starting batch run with {} item(s)", items.len());
        let mut slots = self.prepare_operations(&items).await;

        // Merge every prepared operation's client-side sign requests into one
        // ordered list, tagged with the owning item. Burn/mint steps are
        // resolved first so a rejected transfer surfaces per item before the
        // user is ever prompted for it.
        let mut merged: Vec<SignRequest> = Vec::new();
        let mut owner_by_request: HashMap<String, usize> = HashMap::new();
        for (index, slot) in slots.iter_mut().enumerate() {
            if slot.outcome.is_some() {
                continue;
            }
            let Some(operation) = slot.operation.as_mut() else {
                continue;
            };

            if let Err(e) = self
                .driver
                .resolve_sign_requests(&mut operation.sign_requests)
                .await
            {
                slot.outcome = Some(e.into_outcome());
                continue;
            }

            for request in operation.sign_requests.iter().filter(|r| !r.server_side) {
                owner_by_request.insert(request.id.clone(), index);
                merged.push(request.clone());
            }
        }

        // Single authorization pass over the whole batch: the user is
        // prompted once per distinct chain-scoped step, not once per item.
        let report = if merged.is_empty() {
            CoordinatorReport::default()
        } else {
            info!(
                "Running merged authorization pass over {} request(s)",
                merged.len()
            );
            self.driver.coordinator.authorize_all(&merged).await
        };

        self.submit_authorizations(&mut slots, &owner_by_request, report)
            .await;

        let estimated_time_secs = slots
            .iter()
            .filter_map(|slot| slot.operation.as_ref())
            .filter_map(|operation| operation.estimated_time_secs)
            .max();
        if let Some(estimate) = estimated_time_secs {
            info!("Worst-case estimated completion across batch: {}s", estimate);
        }

        self.track_operations(&mut slots).await;

        let items = slots
            .into_iter()
            .map(|slot| ItemReport {
                label: slot.label,
                operation_id: slot.operation.map(|operation| operation.id),
                outcome: slot
                    .outcome
                    .unwrap_or(ItemOutcome::Failed { reason: None }),
            })
            .collect();

        Ok(BatchReport {
            items,
            estimated_time_secs,
        })
    }

    /// Phase 1: one prepare call per item, all in parallel. A failed
    /// preparation is recorded per item and never blocks the others.
    async fn prepare_operations(&self, items: &[BatchItem]) -> Vec<ItemSlot> {
        let mut slots: Vec<ItemSlot> = items
            .iter()
            .map(|item| ItemSlot {
                label: item.label.clone(),
                operation: None,
                outcome: None,
            })
            .collect();

        let mut prepare_tasks = JoinSet::new();
        for (index, item) in items.iter().enumerate() {
            if let Err(reason) = self.validate_item(&item.request) {
                warn!("Item '{}' rejected before prepare: {}", item.label, reason);
                slots[index].outcome = Some(ItemOutcome::PreparationFailed { reason });
                continue;
            }

            let control_plane = Arc::clone(&self.driver.control_plane);
            let request = item.request.clone();
            prepare_tasks
                .spawn(async move { (index, control_plane.create_operation(&request).await) });
        }

        while let Some(joined) = prepare_tasks.join_next().await {
            let (index, result) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    error!("Prepare task failed: {}", e);
                    continue;
                }
            };
            match result {
                Ok(operation) => {
                    info!(
                        "Prepared operation {} for item '{}'",
                        operation.id, slots[index].label
                    );
                    slots[index].operation = Some(operation);
                }
                Err(e) => {
                    warn!("Preparation for item '{}' failed: {:#}", slots[index].label, e);
                    slots[index].outcome = Some(ItemOutcome::PreparationFailed {
                        reason: format!("{:#}", e),
                    });
                }
            }
        }

        slots
    }

    /// Check an item references only configured domains before any network
    /// call is made for it.
    fn validate_item(&self, request: &CreateOperationRequest) -> Result<(), String> {
        let mut referenced = vec![request.destination_domain];
        referenced.extend(request.source_domain);
        for domain in referenced {
            if !self.domains.iter().any(|d| d.domain == domain) {
                return Err(format!("Unknown domain id {}", domain));
            }
        }
        Ok(())
    }

    /// Phase 4: partition finalized authorizations by owning operation and
    /// submit each partition independently, in parallel. An item whose
    /// requests all failed is recorded; items with partial authorization
    /// still submit what was granted.
    async fn submit_authorizations(
        &self,
        slots: &mut [ItemSlot],
        owner_by_request: &HashMap<String, usize>,
        report: CoordinatorReport,
    ) {
        let mut entries_by_item: HashMap<usize, Vec<SignatureEntry>> = HashMap::new();
        for finalized in &report.finalized {
            if let Some(&index) = owner_by_request.get(&finalized.request_id) {
                entries_by_item
                    .entry(index)
                    .or_default()
                    .push(SignatureEntry {
                        request_id: finalized.request_id.clone(),
                        execution_hash: finalized.execution_hash.clone(),
                    });
            }
        }

        let mut failures_by_item: HashMap<usize, Vec<String>> = HashMap::new();
        for failure in &report.failed {
            if let Some(&index) = owner_by_request.get(&failure.request_id) {
                failures_by_item
                    .entry(index)
                    .or_default()
                    .push(format!("{}: {}", failure.request_id, failure.error));
            }
        }

        let mut submit_tasks = JoinSet::new();
        for (index, slot) in slots.iter_mut().enumerate() {
            if slot.outcome.is_some() {
                continue;
            }
            let Some(operation) = slot.operation.as_ref() else {
                continue;
            };

            let had_requests = operation.sign_requests.iter().any(|r| !r.server_side);
            let entries = entries_by_item.remove(&index).unwrap_or_default();

            if entries.is_empty() {
                if had_requests {
                    let reason = failures_by_item
                        .remove(&index)
                        .map(|failures| failures.join("; "))
                        .unwrap_or_else(|| "no authorization granted".to_string());
                    slot.outcome = Some(ItemOutcome::AuthorizationFailed { reason });
                }
                // Server-side-only operations proceed straight to tracking.
                continue;
            }

            let control_plane = Arc::clone(&self.driver.control_plane);
            let operation_id = operation.id.clone();
            submit_tasks.spawn(async move {
                let result = control_plane
                    .submit_signatures(&operation_id, &entries)
                    .await;
                (index, result)
            });
        }

        while let Some(joined) = submit_tasks.join_next().await {
            let (index, result) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    error!("Signature submission task failed: {}", e);
                    continue;
                }
            };
            match result {
                Ok(updated) => {
                    info!(
                        "Signatures accepted for operation {} (status {:?})",
                        updated.id, updated.status
                    );
                }
                Err(e) => {
                    warn!(
                        "Signature submission for item '{}' failed: {:#}",
                        slots[index].label, e
                    );
                    slots[index].outcome = Some(ItemOutcome::Failed {
                        reason: Some(format!("Failed to submit signatures: {:#}", e)),
                    });
                }
            }
        }
    }

    /// Phase 5: one tracking task per surviving operation, all concurrent. A
    /// tracker that surfaces a new signing phase re-enters the authorization
    /// pipeline for that operation alone.
    async fn track_operations(&self, slots: &mut [ItemSlot]) {
        let mut track_tasks = JoinSet::new();
        for (index, slot) in slots.iter().enumerate() {
            if slot.outcome.is_some() {
                continue;
            }
            let Some(operation) = slot.operation.as_ref() else {
                continue;
            };

            let mut session = TrackSession::new(operation.id.clone(), self.max_track_attempts);
            session.mark_seen(
                operation
                    .sign_requests
                    .iter()
                    .filter(|r| !r.server_side)
                    .map(|r| r.id.clone()),
            );

            let driver = self.driver.clone();
            let operation_id = operation.id.clone();
            track_tasks.spawn(async move { (index, driver.drive(operation_id, session).await) });
        }

        while let Some(joined) = track_tasks.join_next().await {
            let (index, outcome) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    error!("Tracking task failed: {}", e);
                    continue;
                }
            };
            info!(
                "Item '{}' finished tracking: {:?}",
                slots[index].label, outcome
            );
            slots[index].outcome = Some(outcome);
        }
    }
}
