//! Shared test helpers for orchestrator unit tests
//!
//! This module provides constants, factory functions, and a scripted
//! account-backend mock used across the test files.

#![allow(dead_code)]

use async_trait::async_trait;
use ethereum_types::{H160, U256};
use std::collections::HashMap;
use std::sync::Mutex;

use orchestrator::account::{AccountBackend, ExecutionHandle, FinalityStatus};
use orchestrator::config::{
    DomainConfig, OrchestratorConfig, PolicyConfig, ServiceConfig, SignerConfig,
};
use orchestrator::control_plane::{
    AccountCall, CreateOperationRequest, OperationKind, SignRequest,
};
use orchestrator::error::ExecutionError;
use orchestrator::intent::{TransferSpec, TransferSpecWire};

// ============================================================================
// CONSTANTS
// ============================================================================

// --------------------------------- IDs ----------------------------------

/// Dummy operation ID
pub const DUMMY_OPERATION_ID: &str = "op-1111";

/// Dummy sign request ID
pub const DUMMY_REQUEST_ID: &str = "req-1";

/// Dummy source domain id
pub const DUMMY_SOURCE_DOMAIN: u32 = 1;

/// Dummy destination domain id
pub const DUMMY_DESTINATION_DOMAIN: u32 = 6;

// -------------------------- ADDRESSES (20 bytes) -------------------------

/// Dummy source gateway contract
pub const DUMMY_SOURCE_CONTRACT: &str = "0x0000000000000000000000000000000000000001";

/// Dummy destination gateway minter
pub const DUMMY_DESTINATION_CONTRACT: &str = "0x0000000000000000000000000000000000000002";

/// Dummy source token
pub const DUMMY_SOURCE_TOKEN: &str = "0x0000000000000000000000000000000000000003";

/// Dummy destination token
pub const DUMMY_DESTINATION_TOKEN: &str = "0x0000000000000000000000000000000000000004";

/// Dummy depositor
pub const DUMMY_DEPOSITOR: &str = "0x0000000000000000000000000000000000000005";

/// Dummy recipient
pub const DUMMY_RECIPIENT: &str = "0x0000000000000000000000000000000000000006";

/// Dummy authorized signer
pub const DUMMY_SIGNER: &str = "0x0000000000000000000000000000000000000007";

// -------------------------------- OTHER ---------------------------------

/// Dummy execution hash (64 hex characters)
pub const DUMMY_EXECUTION_HASH: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000012";

/// Dummy Ed25519 signing key bytes
pub const DUMMY_SIGNER_KEY: [u8; 32] = [7u8; 32];

// ============================================================================
// FACTORY FUNCTIONS
// ============================================================================

fn address(hex_str: &str) -> H160 {
    let stripped = hex_str.strip_prefix("0x").unwrap();
    H160::from_slice(&hex::decode(stripped).unwrap())
}

/// Create a default transfer spec with test values.
/// This can be customized using Rust's struct update syntax:
/// ```
/// let spec = TransferSpec {
///     value: U256::from(42u64),
///     ..create_default_transfer_spec()
/// };
/// ```
pub fn create_default_transfer_spec() -> TransferSpec {
    TransferSpec {
        version: 1,
        source_domain: DUMMY_SOURCE_DOMAIN,
        destination_domain: DUMMY_DESTINATION_DOMAIN,
        source_contract: address(DUMMY_SOURCE_CONTRACT),
        destination_contract: address(DUMMY_DESTINATION_CONTRACT),
        source_token: address(DUMMY_SOURCE_TOKEN),
        destination_token: address(DUMMY_DESTINATION_TOKEN),
        source_depositor: address(DUMMY_DEPOSITOR),
        destination_recipient: address(DUMMY_RECIPIENT),
        source_signer: address(DUMMY_SIGNER),
        destination_caller: H160::zero(),
        value: U256::from(250_000u64),
        salt: [0x11u8; 32],
        hook_data: Vec::new(),
    }
}

/// Create the wire form of the default transfer spec.
pub fn create_default_spec_wire() -> TransferSpecWire {
    TransferSpecWire::from(&create_default_transfer_spec())
}

/// Create a sign request with one concrete call.
pub fn create_default_sign_request(id: &str) -> SignRequest {
    SignRequest {
        id: id.to_string(),
        domain: DUMMY_DESTINATION_DOMAIN,
        description: "Transfer step".to_string(),
        kind: "transfer".to_string(),
        server_side: false,
        calls: vec![AccountCall {
            target: DUMMY_DESTINATION_CONTRACT.to_string(),
            data: "0xdeadbeef".to_string(),
            value: None,
        }],
        burn_intent: None,
    }
}

/// Create a default service config with test values (fast polling, short
/// timeouts). This can be customized using Rust's struct update syntax.
pub fn create_default_service_config() -> ServiceConfig {
    ServiceConfig {
        control_plane_url: "http://127.0.0.1:3333".to_string(),
        attestation_url: "http://127.0.0.1:3334".to_string(),
        account_service_url: "http://127.0.0.1:3335".to_string(),
        request_timeout_secs: 5,
        poll_interval_secs: 0,
        finality_timeout_secs: 2,
        max_track_attempts: 20,
    }
}

/// Create a default orchestrator config with test values.
/// This can be customized using Rust's struct update syntax:
/// ```
/// let config = OrchestratorConfig {
///     service: ServiceConfig {
///         control_plane_url: mock_server.uri(),
///         ..create_default_service_config()
///     },
///     ..create_default_config()
/// };
/// ```
pub fn create_default_config() -> OrchestratorConfig {
    OrchestratorConfig {
        service: create_default_service_config(),
        signer: SignerConfig {
            key_env: "ORCHESTRATOR_SIGNER_KEY".to_string(),
            key_file: None,
        },
        policy: PolicyConfig {
            default_max_fee: "2000".to_string(),
        },
        domain: vec![
            DomainConfig {
                name: "source-chain".to_string(),
                domain: DUMMY_SOURCE_DOMAIN,
            },
            DomainConfig {
                name: "destination-chain".to_string(),
                domain: DUMMY_DESTINATION_DOMAIN,
            },
        ],
    }
}

/// Create a default create-operation request targeting the destination
/// domain.
pub fn create_default_operation_request() -> CreateOperationRequest {
    CreateOperationRequest {
        kind: OperationKind::Send,
        source_domain: None,
        destination_domain: DUMMY_DESTINATION_DOMAIN,
        token: DUMMY_DESTINATION_TOKEN.to_string(),
        recipient: DUMMY_RECIPIENT.to_string(),
        value: "250000".to_string(),
    }
}

// ============================================================================
// MOCK ACCOUNT BACKEND
// ============================================================================

/// Scripted behavior for one request id. Requests without a scripted
/// behavior finalize immediately with a deterministic hash.
pub enum MockBehavior {
    /// Report pending for N polls, then finalized
    Finalize {
        execution_hash: String,
        pending_polls: u32,
    },
    /// Report already applied on the first poll
    AlreadyApplied { execution_hash: String },
    /// Decline the authorization prompt
    Decline { reason: String },
    /// Authorize, then reject at finality
    RejectAtFinality { reason: String },
    /// Authorize, then stay pending forever
    NeverFinal,
}

/// In-memory account backend that records every authorize/poll event, for
/// asserting call ordering and inspecting the authorized calls.
#[derive(Default)]
pub struct MockAccountBackend {
    behaviors: Mutex<HashMap<String, MockBehavior>>,
    remaining_pending: Mutex<HashMap<String, u32>>,
    events: Mutex<Vec<String>>,
    authorized: Mutex<Vec<SignRequest>>,
}

impl MockAccountBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the behavior for one request id.
    pub fn set_behavior(&self, request_id: &str, behavior: MockBehavior) {
        if let MockBehavior::Finalize { pending_polls, .. } = &behavior {
            self.remaining_pending
                .lock()
                .unwrap()
                .insert(request_id.to_string(), *pending_polls);
        }
        self.behaviors
            .lock()
            .unwrap()
            .insert(request_id.to_string(), behavior);
    }

    /// Recorded events, in order: `auth:<id>` and `poll:<id>`.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Every request passed to authorize, in call order.
    pub fn authorized_requests(&self) -> Vec<SignRequest> {
        self.authorized.lock().unwrap().clone()
    }
}

#[async_trait]
impl AccountBackend for MockAccountBackend {
    async fn authorize(&self, request: &SignRequest) -> Result<ExecutionHandle, ExecutionError> {
        self.events
            .lock()
            .unwrap()
            .push(format!("auth:{}", request.id));
        self.authorized.lock().unwrap().push(request.clone());

        if let Some(MockBehavior::Decline { reason }) =
            self.behaviors.lock().unwrap().get(&request.id)
        {
            return Err(ExecutionError::AuthorizationDeclined {
                reason: reason.clone(),
            });
        }

        Ok(ExecutionHandle {
            request_id: request.id.clone(),
            handle: format!("handle-{}", request.id),
        })
    }

    async fn finality_status(
        &self,
        handle: &ExecutionHandle,
    ) -> Result<FinalityStatus, ExecutionError> {
        self.events
            .lock()
            .unwrap()
            .push(format!("poll:{}", handle.request_id));

        let behaviors = self.behaviors.lock().unwrap();
        match behaviors.get(&handle.request_id) {
            None => Ok(FinalityStatus::Finalized {
                execution_hash: format!("0xhash-{}", handle.request_id),
            }),
            Some(MockBehavior::Finalize { execution_hash, .. }) => {
                let mut remaining = self.remaining_pending.lock().unwrap();
                let left = remaining.entry(handle.request_id.clone()).or_insert(0);
                if *left > 0 {
                    *left -= 1;
                    Ok(FinalityStatus::Pending)
                } else {
                    Ok(FinalityStatus::Finalized {
                        execution_hash: execution_hash.clone(),
                    })
                }
            }
            Some(MockBehavior::AlreadyApplied { execution_hash }) => {
                Ok(FinalityStatus::AlreadyApplied {
                    execution_hash: execution_hash.clone(),
                })
            }
            Some(MockBehavior::Decline { .. }) => Err(ExecutionError::Backend(
                "unexpected finality query for declined request".to_string(),
            )),
            Some(MockBehavior::RejectAtFinality { reason }) => Ok(FinalityStatus::Rejected {
                reason: reason.clone(),
            }),
            Some(MockBehavior::NeverFinal) => Ok(FinalityStatus::Pending),
        }
    }
}
