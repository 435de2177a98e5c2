//! Error taxonomy for the orchestration engine
//!
//! Codec errors indicate a client/service version mismatch and abort the
//! affected operation without retry. Attestation and execution errors are
//! recorded per request/item so a batch never hides which items succeeded.

use thiserror::Error;

/// Errors from the burn-intent wire codec and digest construction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// An address word carried non-zero padding bytes, or was not a valid
    /// 20-byte address / 32-byte padded word.
    #[error("malformed address word in field '{field}'")]
    MalformedAddressWord {
        /// Name of the offending field
        field: &'static str,
    },

    /// A wire field could not be represented in the target integer width
    /// (or failed the field's validity constraint, e.g. `value > 0`).
    #[error("field '{field}' out of range: '{value}'")]
    FieldOutOfRange {
        /// Name of the offending field
        field: &'static str,
        /// The rejected wire value
        value: String,
    },

    /// Encoded input shorter than the fixed-width prefix.
    #[error("truncated input: expected at least {expected} bytes, got {actual}")]
    Truncated {
        /// Minimum expected length in bytes
        expected: usize,
        /// Actual input length in bytes
        actual: usize,
    },
}

/// Errors from the attestation service client.
#[derive(Debug, Error)]
pub enum AttestationError {
    /// The service rejected the transfer. Carries the service's message
    /// verbatim (fee too low, domain unsupported, insufficient balance, ...).
    #[error("transfer rejected by attestation service: {reason}")]
    TransferRejected {
        /// Service-provided rejection message
        reason: String,
    },

    /// A successful response was missing the attestation payload or the
    /// operator counter-signature. Callers must never mint without both.
    #[error("malformed attestation response: {0}")]
    MalformedResponse(String),
}

/// Errors from the smart-account execution backend.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The user declined the authorization prompt.
    #[error("authorization declined: {reason}")]
    AuthorizationDeclined {
        /// Backend-provided decline message
        reason: String,
    },

    /// The execution was rejected after authorization (e.g. reverted).
    #[error("execution rejected: {reason}")]
    Rejected {
        /// Backend-provided rejection message
        reason: String,
    },

    /// The execution did not reach finality within the configured bound.
    #[error("execution did not finalize within {timeout_secs}s")]
    FinalityTimeout {
        /// The bound that was exceeded, in seconds
        timeout_secs: u64,
    },

    /// Transport or protocol failure talking to the account backend.
    #[error("account backend error: {0}")]
    Backend(String),
}

/// Errors from the batch orchestrator.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The batch contained no items; no network calls were made.
    #[error("no operation selected: batch contains no items")]
    NoOpSelected,

    /// Some items failed or timed out. The successes are preserved in the
    /// batch report held by the caller.
    #[error("batch partially failed, items did not complete: {failed_items:?}")]
    PartialBatchFailure {
        /// Labels of the items that did not complete
        failed_items: Vec<String>,
    },
}
