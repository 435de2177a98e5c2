//! Control-Plane API Client
//!
//! HTTP client for communicating with the control-plane service that owns
//! Operation state. Provides methods for preparing operations, submitting
//! authorization results, and polling operation status.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::intent::TransferSpecWire;

// ============================================================================
// API RESPONSE WRAPPER
// ============================================================================

/// Standardized response structure from the control-plane API.
///
/// All control-plane endpoints return this format:
/// ```json
/// {
///   "success": true|false,
///   "data": <payload>|null,
///   "error": <message>|null
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (if successful)
    pub data: Option<T>,
    /// Error message (if failed)
    pub error: Option<String>,
}

// ============================================================================
// OPERATION STRUCTURES
// ============================================================================

/// Lifecycle status of an operation.
///
/// `AWAITING_SIGNATURE → PROCESSING → CONFIRMED → COMPLETED`, with `FAILED`
/// reachable from any non-terminal state, and the phase-2 branch
/// `AWAITING_SIGNATURE → AWAITING_SIGNATURE_PHASE2 → PROCESSING → …` when an
/// additional authorization becomes required mid-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStatus {
    /// Waiting for the first authorization phase
    #[serde(rename = "AWAITING_SIGNATURE")]
    AwaitingSignature,
    /// Waiting for a follow-up authorization phase
    #[serde(rename = "AWAITING_SIGNATURE_PHASE2")]
    AwaitingSignaturePhase2,
    /// Signatures submitted, steps executing
    #[serde(rename = "PROCESSING")]
    Processing,
    /// All steps confirmed on-chain
    #[serde(rename = "CONFIRMED")]
    Confirmed,
    /// Terminal success
    #[serde(rename = "COMPLETED")]
    Completed,
    /// Terminal failure
    #[serde(rename = "FAILED")]
    Failed,
}

impl OperationStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationStatus::Completed | OperationStatus::Failed)
    }
}

/// Kind of logical user action an operation represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    /// Send to one recipient
    Send,
    /// Sweep a source-chain balance into the unified balance
    Collect,
    /// Bridge between two chains
    Bridge,
    /// Send to many recipients
    BatchSend,
}

/// One call to execute through the user's smart account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountCall {
    /// Call target address, 0x-hex
    pub target: String,
    /// Calldata, 0x-hex
    pub data: String,
    /// Native value to attach, decimal string (omitted when zero)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// One unit of required authorization: a named, chain-scoped batch of calls
/// to execute atomically through the user's smart account.
///
/// A request carrying an embedded `burn_intent` and no calls marks a
/// cross-chain burn/mint step the engine must resolve (build, sign, attest,
/// mint call) before authorization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignRequest {
    /// Request identifier, unique within the control plane
    pub id: String,
    /// Target domain id
    pub domain: u32,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Type tag (e.g. "transfer", "swap-deposit")
    #[serde(default)]
    pub kind: String,
    /// True when some other actor authorizes this request; excluded from the
    /// client-side authorization pass
    #[serde(default, rename = "serverSide")]
    pub server_side: bool,
    /// Ordered calls to execute atomically
    #[serde(default)]
    pub calls: Vec<AccountCall>,
    /// Embedded transfer payload for burn/mint steps
    #[serde(default, rename = "burnIntent", skip_serializing_if = "Option::is_none")]
    pub burn_intent: Option<TransferSpecWire>,
}

/// The control plane's view of one logical user action.
///
/// Owned by the control plane; the engine only reads it and appends
/// signatures. `sign_requests` is populated progressively: a fresh batch may
/// appear only after a previous phase's steps have been confirmed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    /// Operation identifier
    pub id: String,
    /// Kind of action
    pub kind: OperationKind,
    /// Current lifecycle status
    pub status: OperationStatus,
    /// Required authorizations observed so far
    #[serde(default, rename = "signRequests")]
    pub sign_requests: Vec<SignRequest>,
    /// Control-plane estimate of time to completion, in seconds
    #[serde(default, rename = "estimatedTimeSecs")]
    pub estimated_time_secs: Option<u64>,
    /// Failure message once the operation is FAILED
    #[serde(default)]
    pub error: Option<String>,
}

/// Request structure for preparing an operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOperationRequest {
    /// Kind of action to prepare
    pub kind: OperationKind,
    /// Source domain id (collect/bridge flows)
    #[serde(default, rename = "sourceDomain", skip_serializing_if = "Option::is_none")]
    pub source_domain: Option<u32>,
    /// Destination domain id
    #[serde(rename = "destinationDomain")]
    pub destination_domain: u32,
    /// Token identifier on the destination chain, 0x-hex
    pub token: String,
    /// Recipient address, 0x-hex
    pub recipient: String,
    /// Transfer value, decimal string in the smallest token unit
    pub value: String,
}

/// One authorization result to append to an operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureEntry {
    /// The sign request this result belongs to
    #[serde(rename = "requestId")]
    pub request_id: String,
    /// Hash of the finalized execution
    #[serde(rename = "executionHash")]
    pub execution_hash: String,
}

// ============================================================================
// CONTROL-PLANE CLIENT
// ============================================================================

/// HTTP client for communicating with the control-plane service.
///
/// All methods return `Result` with appropriate error context; API-level
/// failures surface the service's error message verbatim.
pub struct ControlPlaneClient {
    /// Base URL of the control-plane service
    base_url: String,
    /// HTTP client instance
    client: reqwest::Client,
}

impl ControlPlaneClient {
    /// Create a new control-plane client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the control-plane service
    /// * `request_timeout` - Upper bound on each request
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .no_proxy() // Avoid macOS system-configuration issues in tests
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    /// Prepare one operation for the described action.
    ///
    /// # Returns
    ///
    /// * `Ok(Operation)` - The prepared operation with its initial status and
    ///   sign requests
    /// * `Err(anyhow::Error)` - Transport failure or control-plane rejection
    pub async fn create_operation(&self, request: &CreateOperationRequest) -> Result<Operation> {
        let url = format!("{}/operations", self.base_url);

        let response: ApiResponse<Operation> = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .context("Failed to send POST /operations request")?
            .json()
            .await
            .context("Failed to parse POST /operations response")?;

        if !response.success {
            return Err(anyhow::anyhow!(
                "Control-plane API error: {}",
                response.error.unwrap_or_else(|| "Unknown error".to_string())
            ));
        }

        response.data.context("Missing data in successful response")
    }

    /// Append authorization results to an operation.
    ///
    /// # Returns
    ///
    /// * `Ok(Operation)` - The updated operation
    /// * `Err(anyhow::Error)` - Transport failure or control-plane rejection
    pub async fn submit_signatures(
        &self,
        operation_id: &str,
        signatures: &[SignatureEntry],
    ) -> Result<Operation> {
        let url = format!("{}/operations/{}/signatures", self.base_url, operation_id);

        let response: ApiResponse<Operation> = self
            .client
            .post(&url)
            .json(&signatures)
            .send()
            .await
            .context("Failed to send POST /operations/:id/signatures request")?
            .json()
            .await
            .context("Failed to parse POST /operations/:id/signatures response")?;

        if !response.success {
            return Err(anyhow::anyhow!(
                "Control-plane API error: {}",
                response.error.unwrap_or_else(|| "Unknown error".to_string())
            ));
        }

        response.data.context("Missing data in successful response")
    }

    /// Fetch the current state of an operation (polling read).
    ///
    /// # Returns
    ///
    /// * `Ok(Operation)` - The current operation
    /// * `Err(anyhow::Error)` - Transport failure or control-plane rejection
    pub async fn get_operation(&self, operation_id: &str) -> Result<Operation> {
        let url = format!("{}/operations/{}", self.base_url, operation_id);

        let response: ApiResponse<Operation> = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send GET /operations/:id request")?
            .json()
            .await
            .context("Failed to parse GET /operations/:id response")?;

        if !response.success {
            return Err(anyhow::anyhow!(
                "Control-plane API error: {}",
                response.error.unwrap_or_else(|| "Unknown error".to_string())
            ));
        }

        response.data.context("Missing data in successful response")
    }
}
