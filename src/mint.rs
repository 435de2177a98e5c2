//! Destination mint-call builder
//!
//! Builds the single call that presents an attestation to the destination
//! chain's gateway minter: a 4-byte function selector followed by the ABI
//! encoding of the two dynamic byte strings (attestation, operator
//! signature).

use ethereum_types::H160;

use crate::attestation::Attestation;
use crate::control_plane::AccountCall;
use crate::crypto::digest::keccak256;

/// Solidity signature of the mint entry point.
pub const GATEWAY_MINT_SIGNATURE: &str = "gatewayMint(bytes,bytes)";

/// Function selector of the mint entry point: first 4 bytes of the
/// Keccak-256 of the Solidity signature.
pub fn mint_selector() -> [u8; 4] {
    let hash = keccak256(GATEWAY_MINT_SIGNATURE.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash[..4]);
    selector
}

/// Build the mint call against the destination gateway minter.
pub fn build_mint_call(minter: H160, attestation: &Attestation) -> AccountCall {
    let mut data = Vec::new();
    data.extend_from_slice(&mint_selector());
    data.extend_from_slice(&abi_encode_two_bytes(
        &attestation.attestation,
        &attestation.operator_signature,
    ));

    AccountCall {
        target: format!("0x{}", hex::encode(minter.as_bytes())),
        data: format!("0x{}", hex::encode(data)),
        value: None,
    }
}

/// ABI-encode two dynamic byte strings: two offset words, then each tail as
/// a length word followed by the content padded to a 32-byte boundary.
fn abi_encode_two_bytes(first: &[u8], second: &[u8]) -> Vec<u8> {
    let first_tail_len = 32 + padded_len(first.len());
    let mut out = Vec::with_capacity(64 + first_tail_len + 32 + padded_len(second.len()));
    out.extend_from_slice(&offset_word(64));
    out.extend_from_slice(&offset_word(64 + first_tail_len));
    append_bytes_tail(&mut out, first);
    append_bytes_tail(&mut out, second);
    out
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(32) * 32
}

fn offset_word(offset: usize) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&(offset as u64).to_be_bytes());
    word
}

fn append_bytes_tail(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&offset_word(bytes.len()));
    out.extend_from_slice(bytes);
    out.resize(out.len() + padded_len(bytes.len()) - bytes.len(), 0);
}
