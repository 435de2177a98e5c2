//! Cross-chain value-transfer orchestration engine
//!
//! Builds and signs burn intents, obtains attestations authorizing mints on
//! destination chains, coordinates the smart-account authorization flow, and
//! drives batches of operations concurrently to completion while tolerating
//! partial failure.

pub mod account;
pub mod attestation;
pub mod config;
pub mod control_plane;
pub mod crypto;
pub mod error;
pub mod intent;
pub mod mint;
pub mod service;

// Re-export public types for convenience
pub use account::{AccountBackend, ExecutionHandle, FinalityStatus, HttpAccountBackend};
pub use attestation::{Attestation, AttestationClient};
pub use config::{OrchestratorConfig, ServiceConfig, SignerConfig};
pub use control_plane::{
    AccountCall, ApiResponse, ControlPlaneClient, CreateOperationRequest, Operation,
    OperationKind, OperationStatus, SignRequest, SignatureEntry,
};
pub use crypto::IntentSigner;
pub use error::{AttestationError, BatchError, CodecError, ExecutionError};
pub use intent::{
    BurnIntent, BurnIntentBuilder, BurnIntentWire, SignedBurnIntent, TransferSpec,
    TransferSpecWire,
};
pub use service::{
    BatchItem, BatchOrchestrator, BatchReport, ExecutionCoordinator, ItemOutcome, ItemReport,
    OperationTracker, TrackOutcome, TrackSession,
};
