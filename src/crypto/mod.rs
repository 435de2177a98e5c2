//! Cryptographic operations for the orchestration engine
//!
//! This module provides the typed-data digest construction and intent
//! signing.

pub mod digest;
pub mod signing;

// Re-export for convenience
pub use digest::{burn_intent_digest, keccak256, transfer_spec_hash};
pub use signing::IntentSigner;
