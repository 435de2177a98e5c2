//! Smart-Account Execution Backend
//!
//! The user's smart account executes a batch of calls atomically under one
//! off-chain authorization (e.g. a passkey confirmation). The backend seam is
//! a trait so the coordinator can be driven against a mock in tests; the HTTP
//! implementation talks to an account service that blocks the authorize call
//! on user presence.

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::control_plane::{AccountCall, ApiResponse, SignRequest};
use crate::error::ExecutionError;

/// Handle to a pending execution produced by an authorization.
#[derive(Debug, Clone)]
pub struct ExecutionHandle {
    /// The sign request this execution belongs to
    pub request_id: String,
    /// Backend-issued handle for finality queries
    pub handle: String,
}

/// Finality state of one execution.
#[derive(Debug, Clone)]
pub enum FinalityStatus {
    /// Not yet final
    Pending,
    /// Reached finality
    Finalized {
        /// Hash of the finalized transaction
        execution_hash: String,
    },
    /// The effect was already applied by an earlier submission; treated as
    /// finalized, never as an error
    AlreadyApplied {
        /// Hash of the original transaction
        execution_hash: String,
    },
    /// Rejected after authorization (e.g. reverted)
    Rejected {
        /// Backend-provided rejection message
        reason: String,
    },
}

/// Execution backend seam for the user's smart account.
///
/// `authorize` blocks on the single user-authorization surface, so callers
/// must never issue concurrent authorize calls; `finality_status` is a cheap
/// read that may be polled concurrently for any number of handles.
#[async_trait]
pub trait AccountBackend: Send + Sync {
    /// Request authorization for one sign request's calls. Blocks until the
    /// user grants or declines.
    async fn authorize(&self, request: &SignRequest) -> Result<ExecutionHandle, ExecutionError>;

    /// Query the finality state of a pending execution.
    async fn finality_status(
        &self,
        handle: &ExecutionHandle,
    ) -> Result<FinalityStatus, ExecutionError>;
}

// ============================================================================
// HTTP IMPLEMENTATION
// ============================================================================

/// Request structure for POST /executions.
#[derive(Debug, Serialize)]
struct ExecutionRequest<'a> {
    /// Sign request id
    #[serde(rename = "requestId")]
    request_id: &'a str,
    /// Target domain id
    domain: u32,
    /// Calls to execute atomically
    calls: &'a [AccountCall],
}

/// Response data for POST /executions.
#[derive(Debug, Deserialize)]
struct ExecutionCreated {
    /// Backend-issued execution handle
    handle: String,
}

/// Response data for GET /executions/:handle.
#[derive(Debug, Deserialize)]
struct ExecutionState {
    /// "pending" | "finalized" | "already_applied" | "rejected"
    status: String,
    /// Transaction hash once final
    #[serde(default, rename = "executionHash")]
    execution_hash: Option<String>,
    /// Rejection message
    #[serde(default)]
    reason: Option<String>,
}

/// HTTP implementation of [`AccountBackend`] against an account service.
pub struct HttpAccountBackend {
    /// Base URL of the account service
    base_url: String,
    /// HTTP client instance
    client: reqwest::Client,
}

impl HttpAccountBackend {
    /// Create a new account backend client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the account service
    /// * `authorize_timeout` - Upper bound on one authorize round trip
    ///   (covers the user interaction, so it is generous)
    pub fn new(
        base_url: impl Into<String>,
        authorize_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(authorize_timeout)
            .no_proxy() // Avoid macOS system-configuration issues in tests
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }
}

#[async_trait]
impl AccountBackend for HttpAccountBackend {
    async fn authorize(&self, request: &SignRequest) -> Result<ExecutionHandle, ExecutionError> {
        let url = format!("{}/executions", self.base_url);
        let body = ExecutionRequest {
            request_id: &request.id,
            domain: request.domain,
            calls: &request.calls,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ExecutionError::Backend(format!("POST /executions failed: {}", e)))?;

        let status = response.status();
        let response: ApiResponse<ExecutionCreated> = response.json().await.map_err(|e| {
            ExecutionError::Backend(format!("Failed to parse POST /executions response: {}", e))
        })?;

        if !response.success {
            let reason = response
                .error
                .unwrap_or_else(|| "Unknown error".to_string());
            // The service answers 403 when the user declined the prompt.
            if status == reqwest::StatusCode::FORBIDDEN {
                return Err(ExecutionError::AuthorizationDeclined { reason });
            }
            return Err(ExecutionError::Backend(reason));
        }

        let created = response
            .data
            .ok_or_else(|| ExecutionError::Backend("Missing data in successful response".to_string()))?;

        Ok(ExecutionHandle {
            request_id: request.id.clone(),
            handle: created.handle,
        })
    }

    async fn finality_status(
        &self,
        handle: &ExecutionHandle,
    ) -> Result<FinalityStatus, ExecutionError> {
        let url = format!("{}/executions/{}", self.base_url, handle.handle);

        let response: ApiResponse<ExecutionState> = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ExecutionError::Backend(format!("GET /executions/:handle failed: {}", e)))?
            .json()
            .await
            .map_err(|e| {
                ExecutionError::Backend(format!(
                    "Failed to parse GET /executions/:handle response: {}",
                    e
                ))
            })?;

        if !response.success {
            return Err(ExecutionError::Backend(
                response.error.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        let state = response
            .data
            .ok_or_else(|| ExecutionError::Backend("Missing data in successful response".to_string()))?;

        match state.status.as_str() {
            "pending" => Ok(FinalityStatus::Pending),
            "finalized" => Ok(FinalityStatus::Finalized {
                execution_hash: state
                    .execution_hash
                    .ok_or_else(|| ExecutionError::Backend("finalized without executionHash".to_string()))?,
            }),
            "already_applied" => Ok(FinalityStatus::AlreadyApplied {
                execution_hash: state
                    .execution_hash
                    .ok_or_else(|| ExecutionError::Backend("already_applied without executionHash".to_string()))?,
            }),
            "rejected" => Ok(FinalityStatus::Rejected {
                reason: state.reason.unwrap_or_else(|| "Unknown rejection".to_string()),
            }),
            other => Err(ExecutionError::Backend(format!(
                "Unknown execution status '{}'",
                other
            ))),
        }
    }
}
