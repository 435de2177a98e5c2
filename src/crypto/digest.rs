//! Typed-data digest of a burn intent
//!
//! The digest follows a fixed typed-data schema: an outer `BurnIntent` record
//! containing a nested `TransferSpec` record with the exact wire field order.
//! The field order is part of the signed contract; changing it requires a
//! protocol version bump.

use sha3::{Digest, Keccak256};

use crate::intent::{address_word, BurnIntent, TransferSpec};

/// Canonical type string of the transfer payload.
pub const TRANSFER_SPEC_TYPE: &str = "TransferSpec(\
    uint32 version,uint32 sourceDomain,uint32 destinationDomain,\
    bytes32 sourceContract,bytes32 destinationContract,\
    bytes32 sourceToken,bytes32 destinationToken,\
    bytes32 sourceDepositor,bytes32 destinationRecipient,\
    bytes32 sourceSigner,bytes32 destinationCaller,\
    uint256 value,bytes32 salt,bytes hookData)";

/// Canonical type string of the outer envelope. The nested type string is
/// appended, so the envelope hash commits to the spec schema as well.
pub const BURN_INTENT_TYPE: &str =
    "BurnIntent(uint256 maxBlockHeight,uint256 maxFee,TransferSpec spec)";

/// Keccak-256 of arbitrary bytes.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

fn transfer_spec_type_hash() -> [u8; 32] {
    keccak256(TRANSFER_SPEC_TYPE.as_bytes())
}

fn burn_intent_type_hash() -> [u8; 32] {
    let mut type_string = Vec::new();
    type_string.extend_from_slice(BURN_INTENT_TYPE.as_bytes());
    type_string.extend_from_slice(TRANSFER_SPEC_TYPE.as_bytes());
    keccak256(&type_string)
}

fn u32_word(value: u32) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[28..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Struct hash of the transfer payload: type hash followed by every field as
/// a 32-byte word, with hook data hashed into its slot.
pub fn transfer_spec_hash(spec: &TransferSpec) -> [u8; 32] {
    let mut encoded = Vec::with_capacity(15 * 32);
    encoded.extend_from_slice(&transfer_spec_type_hash());
    encoded.extend_from_slice(&u32_word(spec.version));
    encoded.extend_from_slice(&u32_word(spec.source_domain));
    encoded.extend_from_slice(&u32_word(spec.destination_domain));
    encoded.extend_from_slice(&address_word(&spec.source_contract));
    encoded.extend_from_slice(&address_word(&spec.destination_contract));
    encoded.extend_from_slice(&address_word(&spec.source_token));
    encoded.extend_from_slice(&address_word(&spec.destination_token));
    encoded.extend_from_slice(&address_word(&spec.source_depositor));
    encoded.extend_from_slice(&address_word(&spec.destination_recipient));
    encoded.extend_from_slice(&address_word(&spec.source_signer));
    encoded.extend_from_slice(&address_word(&spec.destination_caller));
    let mut value = [0u8; 32];
    spec.value.to_big_endian(&mut value);
    encoded.extend_from_slice(&value);
    encoded.extend_from_slice(&spec.salt);
    encoded.extend_from_slice(&keccak256(&spec.hook_data));
    keccak256(&encoded)
}

/// The signable typed-data digest of a burn intent.
pub fn burn_intent_digest(intent: &BurnIntent) -> [u8; 32] {
    let mut encoded = Vec::with_capacity(4 * 32);
    encoded.extend_from_slice(&burn_intent_type_hash());
    let mut max_block_height = [0u8; 32];
    intent.max_block_height.to_big_endian(&mut max_block_height);
    encoded.extend_from_slice(&max_block_height);
    let mut max_fee = [0u8; 32];
    intent.max_fee.to_big_endian(&mut max_fee);
    encoded.extend_from_slice(&max_fee);
    encoded.extend_from_slice(&transfer_spec_hash(&intent.spec));
    keccak256(&encoded)
}
