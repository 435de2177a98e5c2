//! Attestation Service Client
//!
//! Submits a signed burn intent to the attestation service and returns the
//! attestation payload plus operator counter-signature authorizing the mint
//! on the destination chain.
//!
//! The client performs no retries itself. Submission is at-most-once and
//! idempotent by salt on the service side: retrying the identical envelope is
//! safe, retrying with a fresh salt after a prior success risks a duplicate
//! burn, so retry policy belongs to the caller that tracks submission state.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::AttestationError;
use crate::intent::{BurnIntentWire, SignedBurnIntent};

// ============================================================================
// WIRE STRUCTURES
// ============================================================================

/// One entry of the transfer request body.
#[derive(Debug, Clone, Serialize)]
struct TransferRequestItem {
    /// The burn intent in wire form
    #[serde(rename = "burnIntent")]
    burn_intent: BurnIntentWire,
    /// Typed-data signature, 0x-hex
    signature: String,
}

/// One entry of the transfer response body.
#[derive(Debug, Clone, Deserialize)]
struct TransferResponseItem {
    /// Attestation payload, 0x-hex (absent on rejection)
    #[serde(default)]
    attestation: Option<String>,
    /// Operator counter-signature, 0x-hex (absent on rejection)
    #[serde(default)]
    signature: Option<String>,
    /// Whether the service accepted the transfer
    success: bool,
    /// Service message (rejection reason, or "already attested" note)
    #[serde(default)]
    message: Option<String>,
}

/// An attestation payload plus operator counter-signature.
///
/// Both are opaque capability tokens: presenting them to the destination
/// chain's mint entry point authorizes minting the attested value to the
/// attested recipient. Consumed exactly-once on the destination chain; a
/// second presentation reports "already applied" and is treated as success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attestation {
    /// The attestation payload
    pub attestation: Vec<u8>,
    /// The operator counter-signature
    pub operator_signature: Vec<u8>,
}

// ============================================================================
// ATTESTATION CLIENT
// ============================================================================

/// HTTP client for the attestation service.
pub struct AttestationClient {
    /// Base URL of the attestation service
    base_url: String,
    /// HTTP client instance
    client: reqwest::Client,
}

impl AttestationClient {
    /// Create a new attestation client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the attestation service
    /// * `request_timeout` - Upper bound on the attestation round trip
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
    ) -> anyhow::Result<Self> {
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

    /// Submit a signed intent and return its attestation.
    ///
    /// Transport failures and non-2xx responses map to
    /// [`AttestationError::TransferRejected`] carrying the service's message
    /// verbatim. A successful item missing either attestation field maps to
    /// [`AttestationError::MalformedResponse`]: callers must never proceed to
    /// mint with an absent attestation. A rejected item that nevertheless
    /// carries both fields is an already-attested replay of the same salt and
    /// is returned as success.
    pub async fn request_attestation(
        &self,
        envelope: &SignedBurnIntent,
    ) -> Result<Attestation, AttestationError> {
        let url = format!("{}/transfer", self.base_url);
        let body = vec![TransferRequestItem {
            burn_intent: BurnIntentWire::from(&envelope.intent),
            signature: format!("0x{}", hex::encode(&envelope.signature)),
        }];

        debug!(
            "Requesting attestation for transfer of {} (domain {} -> {})",
            envelope.intent.spec.value,
            envelope.intent.spec.source_domain,
            envelope.intent.spec.destination_domain
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AttestationError::TransferRejected {
                reason: format!("transport failure: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let reason = response
                .text()
                .await
                .ok()
                .and_then(|text| extract_service_message(&text))
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(AttestationError::TransferRejected { reason });
        }

        let items: Vec<TransferResponseItem> = response.json().await.map_err(|e| {
            AttestationError::MalformedResponse(format!("unparseable body: {}", e))
        })?;

        let item = items
            .into_iter()
            .next()
            .ok_or_else(|| AttestationError::MalformedResponse("empty response array".to_string()))?;

        let fields = match (&item.attestation, &item.signature) {
            (Some(attestation), Some(signature)) => Some((attestation.clone(), signature.clone())),
            _ => None,
        };

        if !item.success {
            // A rejected item that still carries both fields means the
            // service already consumed this salt and is echoing the original
            // attestation.
            if let Some((attestation, signature)) = fields {
                info!(
                    "Attestation service reports intent already attested: {}",
                    item.message.as_deref().unwrap_or("no message")
                );
                return decode_attestation(&attestation, &signature);
            }
            return Err(AttestationError::TransferRejected {
                reason: item
                    .message
                    .unwrap_or_else(|| "Unknown rejection".to_string()),
            });
        }

        let (attestation, signature) = fields.ok_or_else(|| {
            AttestationError::MalformedResponse(
                "successful response missing attestation or signature".to_string(),
            )
        })?;
        decode_attestation(&attestation, &signature)
    }
}

/// Decode the two hex capability fields of a response item.
fn decode_attestation(
    attestation: &str,
    signature: &str,
) -> Result<Attestation, AttestationError> {
    let attestation = decode_hex_field("attestation", attestation)?;
    let operator_signature = decode_hex_field("signature", signature)?;
    if attestation.is_empty() || operator_signature.is_empty() {
        return Err(AttestationError::MalformedResponse(
            "empty attestation or signature".to_string(),
        ));
    }
    Ok(Attestation {
        attestation,
        operator_signature,
    })
}

fn decode_hex_field(field: &str, value: &str) -> Result<Vec<u8>, AttestationError> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(stripped)
        .map_err(|_| AttestationError::MalformedResponse(format!("field '{}' is not hex", field)))
}

/// Pull the service message out of a non-2xx body, which may be the usual
/// response array or a bare `{"message": ...}` object.
fn extract_service_message(body: &str) -> Option<String> {
    if let Ok(items) = serde_json::from_str::<Vec<TransferResponseItem>>(body) {
        if let Some(message) = items.into_iter().next().and_then(|i| i.message) {
            return Some(message);
        }
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
            return Some(message.to_string());
        }
    }
    if body.trim().is_empty() {
        None
    } else {
        Some(body.trim().to_string())
    }
}
