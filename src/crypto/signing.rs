//! Burn-intent signing
//!
//! The engine holds a single Ed25519 key authorized as `source_signer` for
//! the unified balance. The key is loaded from an environment variable first
//! (hex, 32 bytes), falling back to a raw hex key file. Signature bytes are
//! opaque to the engine; the attestation service is the verifier.

use anyhow::{Context, Result};
use ed25519_dalek::{Signer, SigningKey};

use crate::config::SignerConfig;
use crate::crypto::digest::burn_intent_digest;
use crate::intent::{BurnIntent, SignedBurnIntent};

/// Signs burn intents with a locally held Ed25519 key.
#[derive(Debug)]
pub struct IntentSigner {
    signing_key: SigningKey,
}

impl IntentSigner {
    /// Create a signer from raw key bytes.
    pub fn from_bytes(key: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(key),
        }
    }

    /// Load the signing key per the configured lookup order:
    /// environment variable first, then key file.
    pub fn from_config(config: &SignerConfig) -> Result<Self> {
        if let Ok(key_str) = std::env::var(&config.key_env) {
            let key = decode_key(&key_str)
                .with_context(|| format!("Failed to decode key from {} env var", config.key_env))?;
            return Ok(Self::from_bytes(&key));
        }

        if let Some(path) = &config.key_file {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read signing key file: {}", path))?;
            let key = decode_key(content.trim())
                .with_context(|| format!("Failed to decode key from file: {}", path))?;
            return Ok(Self::from_bytes(&key));
        }

        anyhow::bail!(
            "No signing key available: set the {} env var or configure [signer] key_file",
            config.key_env
        )
    }

    /// Sign the typed-data digest of an intent, producing the submission
    /// envelope.
    pub fn sign(&self, intent: &BurnIntent) -> SignedBurnIntent {
        let digest = burn_intent_digest(intent);
        let signature = self.signing_key.sign(&digest);
        SignedBurnIntent {
            intent: intent.clone(),
            signature: signature.to_bytes().to_vec(),
        }
    }

    /// Public key bytes of the signing key.
    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }
}

/// Decode a 32-byte Ed25519 key from a hex string (0x prefix optional).
fn decode_key(key_str: &str) -> Result<[u8; 32]> {
    let key_hex = key_str.strip_prefix("0x").unwrap_or(key_str);
    let key_bytes = hex::decode(key_hex).context("Signing key is not valid hex")?;
    if key_bytes.len() != 32 {
        anyhow::bail!(
            "Invalid signing key length: expected 32 bytes, got {}",
            key_bytes.len()
        );
    }
    let mut key = [0u8; 32];
    key.copy_from_slice(&key_bytes);
    Ok(key)
}
