//! Burn-intent types and wire codec
//!
//! A burn intent declares that value should be removed from a source-chain
//! balance and made available for minting on a destination chain. This module
//! defines the internal types, the fixed-width binary encoding (addresses as
//! 32-byte left-zero-padded words), and the JSON wire forms used by the
//! attestation API (integers as decimal strings, byte fields as 0x-hex).

use ethereum_types::{H160, U256};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Length of the fixed-width prefix of an encoded transfer spec:
/// three 4-byte integers, eight 32-byte address words, a 32-byte value
/// word, and the 32-byte salt. Everything after the prefix is hook data.
pub const ENCODED_PREFIX_LEN: usize = 12 + 8 * 32 + 32 + 32;

// ============================================================================
// INTERNAL TYPES
// ============================================================================

/// The payload of a value-transfer intent.
///
/// Identifier fields are carried as raw 20-byte addresses and serialized on
/// the wire as 32-byte left-zero-padded words. The field order below is part
/// of the signed contract and must never be reordered without bumping
/// `version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSpec {
    /// Protocol version
    pub version: u32,
    /// Source domain id (protocol-level chain identifier)
    pub source_domain: u32,
    /// Destination domain id
    pub destination_domain: u32,
    /// Gateway contract holding the unified balance on the source chain
    pub source_contract: H160,
    /// Gateway minter contract on the destination chain
    pub destination_contract: H160,
    /// Token contract on the source chain
    pub source_token: H160,
    /// Token contract on the destination chain
    pub destination_token: H160,
    /// Depositor whose balance is burned
    pub source_depositor: H160,
    /// Recipient of the minted value
    pub destination_recipient: H160,
    /// Signer authorized to issue this intent
    pub source_signer: H160,
    /// Caller allowed to present the attestation on the destination chain
    /// (zero = unrestricted)
    pub destination_caller: H160,
    /// Transfer value in the smallest token unit, must be > 0
    pub value: U256,
    /// Per-intent uniqueness salt, cryptographically random
    pub salt: [u8; 32],
    /// Opaque hook data, usually empty
    pub hook_data: Vec<u8>,
}

/// A transfer spec with its liveness and fee bounds, ready for signing.
/// Immutable once signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurnIntent {
    /// Maximum acceptable block height (`U256::MAX` = unbounded)
    pub max_block_height: U256,
    /// Maximum fee the signer accepts
    pub max_fee: U256,
    /// The transfer payload
    pub spec: TransferSpec,
}

/// A burn intent plus its typed-data signature bytes.
///
/// Produced once, submitted once. The attestation service is idempotent on
/// replay of the identical envelope (same salt); a retry with a fresh salt
/// after a prior success risks a duplicate burn and is never done here.
#[derive(Debug, Clone)]
pub struct SignedBurnIntent {
    /// The signed intent
    pub intent: BurnIntent,
    /// Signature over the typed-data digest
    pub signature: Vec<u8>,
}

/// Builds a [`BurnIntent`] from a wire-form spec, generating the uniqueness
/// salt and validating the transfer value.
#[derive(Debug, Clone)]
pub struct BurnIntentBuilder {
    max_block_height: U256,
    max_fee: U256,
}

impl Default for BurnIntentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BurnIntentBuilder {
    /// Create a builder with an unbounded block height and zero max fee.
    pub fn new() -> Self {
        Self {
            max_block_height: U256::MAX,
            max_fee: U256::zero(),
        }
    }

    /// Set the maximum fee the signer accepts.
    pub fn max_fee(mut self, max_fee: U256) -> Self {
        self.max_fee = max_fee;
        self
    }

    /// Set the maximum acceptable block height.
    pub fn max_block_height(mut self, max_block_height: U256) -> Self {
        self.max_block_height = max_block_height;
        self
    }

    /// Build an intent from an internal spec. The salt is always regenerated
    /// here; intent uniqueness is this engine's responsibility, never the
    /// control plane's.
    pub fn build(self, mut spec: TransferSpec) -> Result<BurnIntent, CodecError> {
        if spec.value.is_zero() {
            return Err(CodecError::FieldOutOfRange {
                field: "value",
                value: "0".to_string(),
            });
        }
        OsRng.fill_bytes(&mut spec.salt);
        Ok(BurnIntent {
            max_block_height: self.max_block_height,
            max_fee: self.max_fee,
            spec,
        })
    }

    /// Build an intent from the wire form embedded in a sign request.
    pub fn build_from_wire(self, wire: &TransferSpecWire) -> Result<BurnIntent, CodecError> {
        let spec = TransferSpec::try_from(wire)?;
        self.build(spec)
    }
}

// ============================================================================
// FIXED-WIDTH BINARY CODEC
// ============================================================================

/// Right-align a 20-byte address into a 32-byte word (12 zero bytes + address).
pub fn address_word(address: &H160) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

/// Recover an address from a 32-byte word, validating that the 12 padding
/// bytes are all zero.
pub fn strip_address_word(field: &'static str, word: &[u8]) -> Result<H160, CodecError> {
    if word.len() != 32 || word[..12].iter().any(|b| *b != 0) {
        return Err(CodecError::MalformedAddressWord { field });
    }
    Ok(H160::from_slice(&word[12..]))
}

impl TransferSpec {
    /// Encode into the fixed-width wire layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ENCODED_PREFIX_LEN + self.hook_data.len());
        out.extend_from_slice(&self.version.to_be_bytes());
        out.extend_from_slice(&self.source_domain.to_be_bytes());
        out.extend_from_slice(&self.destination_domain.to_be_bytes());
        for address in self.address_fields() {
            out.extend_from_slice(&address_word(address));
        }
        let mut value = [0u8; 32];
        self.value.to_big_endian(&mut value);
        out.extend_from_slice(&value);
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.hook_data);
        out
    }

    /// Decode from the fixed-width wire layout. Round-trips with
    /// [`TransferSpec::encode`] exactly.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() < ENCODED_PREFIX_LEN {
            return Err(CodecError::Truncated {
                expected: ENCODED_PREFIX_LEN,
                actual: bytes.len(),
            });
        }

        let version = u32::from_be_bytes(bytes[0..4].try_into().expect("4-byte slice"));
        let source_domain = u32::from_be_bytes(bytes[4..8].try_into().expect("4-byte slice"));
        let destination_domain = u32::from_be_bytes(bytes[8..12].try_into().expect("4-byte slice"));

        let mut offset = 12;
        let mut addresses = [H160::zero(); 8];
        for (address, field) in addresses.iter_mut().zip(ADDRESS_FIELD_NAMES) {
            *address = strip_address_word(field, &bytes[offset..offset + 32])?;
            offset += 32;
        }

        let value = U256::from_big_endian(&bytes[offset..offset + 32]);
        offset += 32;
        let mut salt = [0u8; 32];
        salt.copy_from_slice(&bytes[offset..offset + 32]);
        offset += 32;
        let hook_data = bytes[offset..].to_vec();

        Ok(Self {
            version,
            source_domain,
            destination_domain,
            source_contract: addresses[0],
            destination_contract: addresses[1],
            source_token: addresses[2],
            destination_token: addresses[3],
            source_depositor: addresses[4],
            destination_recipient: addresses[5],
            source_signer: addresses[6],
            destination_caller: addresses[7],
            value,
            salt,
            hook_data,
        })
    }

    /// Address fields in wire order.
    fn address_fields(&self) -> [&H160; 8] {
        [
            &self.source_contract,
            &self.destination_contract,
            &self.source_token,
            &self.destination_token,
            &self.source_depositor,
            &self.destination_recipient,
            &self.source_signer,
            &self.destination_caller,
        ]
    }
}

/// Field names in wire order, used in decode errors.
const ADDRESS_FIELD_NAMES: [&str; 8] = [
    "source_contract",
    "destination_contract",
    "source_token",
    "destination_token",
    "source_depositor",
    "destination_recipient",
    "source_signer",
    "destination_caller",
];

// ============================================================================
// JSON WIRE FORMS
// ============================================================================

/// JSON wire form of a transfer spec.
///
/// Integers are decimal strings; addresses are 0x-hex 32-byte words; salt and
/// hook data are 0x-hex bytes. This is the shape embedded in control-plane
/// sign requests and submitted to the attestation API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSpecWire {
    /// Protocol version, decimal string
    pub version: String,
    /// Source domain id, decimal string
    #[serde(rename = "sourceDomain")]
    pub source_domain: String,
    /// Destination domain id, decimal string
    #[serde(rename = "destinationDomain")]
    pub destination_domain: String,
    /// Source gateway contract, 32-byte hex word
    #[serde(rename = "sourceContract")]
    pub source_contract: String,
    /// Destination gateway minter, 32-byte hex word
    #[serde(rename = "destinationContract")]
    pub destination_contract: String,
    /// Source token, 32-byte hex word
    #[serde(rename = "sourceToken")]
    pub source_token: String,
    /// Destination token, 32-byte hex word
    #[serde(rename = "destinationToken")]
    pub destination_token: String,
    /// Depositor, 32-byte hex word
    #[serde(rename = "sourceDepositor")]
    pub source_depositor: String,
    /// Recipient, 32-byte hex word
    #[serde(rename = "destinationRecipient")]
    pub destination_recipient: String,
    /// Authorized signer, 32-byte hex word
    #[serde(rename = "sourceSigner")]
    pub source_signer: String,
    /// Destination caller restriction, 32-byte hex word (zero = unrestricted)
    #[serde(rename = "destinationCaller")]
    pub destination_caller: String,
    /// Transfer value, decimal string
    pub value: String,
    /// Uniqueness salt, 0x-hex (32 bytes)
    pub salt: String,
    /// Hook data, 0x-hex (may be "0x")
    #[serde(rename = "hookData")]
    pub hook_data: String,
}

/// JSON wire form of a burn intent, the body shape of the attestation API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurnIntentWire {
    /// Maximum acceptable block height, decimal string
    #[serde(rename = "maxBlockHeight")]
    pub max_block_height: String,
    /// Maximum accepted fee, decimal string
    #[serde(rename = "maxFee")]
    pub max_fee: String,
    /// The transfer payload
    pub spec: TransferSpecWire,
}

fn hex_word(address: &H160) -> String {
    format!("0x{}", hex::encode(address_word(address)))
}

fn hex_bytes(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn parse_u32(field: &'static str, value: &str) -> Result<u32, CodecError> {
    value.parse::<u32>().map_err(|_| CodecError::FieldOutOfRange {
        field,
        value: value.to_string(),
    })
}

fn parse_u256(field: &'static str, value: &str) -> Result<U256, CodecError> {
    U256::from_dec_str(value).map_err(|_| CodecError::FieldOutOfRange {
        field,
        value: value.to_string(),
    })
}

/// Parse a wire address: either a bare 20-byte address or a 32-byte
/// left-zero-padded word, 0x-prefixed hex.
fn parse_address(field: &'static str, value: &str) -> Result<H160, CodecError> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    let bytes = hex::decode(stripped).map_err(|_| CodecError::MalformedAddressWord { field })?;
    match bytes.len() {
        20 => Ok(H160::from_slice(&bytes)),
        32 => strip_address_word(field, &bytes),
        _ => Err(CodecError::MalformedAddressWord { field }),
    }
}

fn parse_bytes(field: &'static str, value: &str) -> Result<Vec<u8>, CodecError> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(stripped).map_err(|_| CodecError::FieldOutOfRange {
        field,
        value: value.to_string(),
    })
}

impl From<&TransferSpec> for TransferSpecWire {
    fn from(spec: &TransferSpec) -> Self {
        Self {
            version: spec.version.to_string(),
            source_domain: spec.source_domain.to_string(),
            destination_domain: spec.destination_domain.to_string(),
            source_contract: hex_word(&spec.source_contract),
            destination_contract: hex_word(&spec.destination_contract),
            source_token: hex_word(&spec.source_token),
            destination_token: hex_word(&spec.destination_token),
            source_depositor: hex_word(&spec.source_depositor),
            destination_recipient: hex_word(&spec.destination_recipient),
            source_signer: hex_word(&spec.source_signer),
            destination_caller: hex_word(&spec.destination_caller),
            value: spec.value.to_string(),
            salt: hex_bytes(&spec.salt),
            hook_data: hex_bytes(&spec.hook_data),
        }
    }
}

impl TryFrom<&TransferSpecWire> for TransferSpec {
    type Error = CodecError;

    fn try_from(wire: &TransferSpecWire) -> Result<Self, CodecError> {
        let salt_bytes = parse_bytes("salt", &wire.salt)?;
        if salt_bytes.len() != 32 {
            return Err(CodecError::FieldOutOfRange {
                field: "salt",
                value: wire.salt.clone(),
            });
        }
        let mut salt = [0u8; 32];
        salt.copy_from_slice(&salt_bytes);

        Ok(Self {
            version: parse_u32("version", &wire.version)?,
            source_domain: parse_u32("source_domain", &wire.source_domain)?,
            destination_domain: parse_u32("destination_domain", &wire.destination_domain)?,
            source_contract: parse_address("source_contract", &wire.source_contract)?,
            destination_contract: parse_address(
                "destination_contract",
                &wire.destination_contract,
            )?,
            source_token: parse_address("source_token", &wire.source_token)?,
            destination_token: parse_address("destination_token", &wire.destination_token)?,
            source_depositor: parse_address("source_depositor", &wire.source_depositor)?,
            destination_recipient: parse_address(
                "destination_recipient",
                &wire.destination_recipient,
            )?,
            source_signer: parse_address("source_signer", &wire.source_signer)?,
            destination_caller: parse_address("destination_caller", &wire.destination_caller)?,
            value: parse_u256("value", &wire.value)?,
            salt,
            hook_data: parse_bytes("hook_data", &wire.hook_data)?,
        })
    }
}

impl From<&BurnIntent> for BurnIntentWire {
    fn from(intent: &BurnIntent) -> Self {
        Self {
            max_block_height: intent.max_block_height.to_string(),
            max_fee: intent.max_fee.to_string(),
            spec: TransferSpecWire::from(&intent.spec),
        }
    }
}

impl TryFrom<&BurnIntentWire> for BurnIntent {
    type Error = CodecError;

    fn try_from(wire: &BurnIntentWire) -> Result<Self, CodecError> {
        Ok(Self {
            max_block_height: parse_u256("max_block_height", &wire.max_block_height)?,
            max_fee: parse_u256("max_fee", &wire.max_fee)?,
            spec: TransferSpec::try_from(&wire.spec)?,
        })
    }
}
