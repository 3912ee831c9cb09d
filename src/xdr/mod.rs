//! Minimal XDR support for the one transaction shape this client produces.
//!
//! Rather than carrying a full Stellar XDR model, this module writes exactly
//! the `TransactionV1Envelope` layout a Soroban contract invocation needs and
//! reads exactly the fields the pipeline consumes (the sequence number of an
//! account ledger entry). Simulation artifacts (authorization entries,
//! `SorobanTransactionData`) are spliced in as the opaque XDR blobs the RPC
//! returned; their interior is never interpreted here.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use thiserror::Error;

// XDR union discriminants, per the Stellar protocol definitions.
const ENVELOPE_TYPE_TX: u32 = 2;
const KEY_TYPE_ED25519: u32 = 0;
const PRECOND_TIME: u32 = 1;
const MEMO_NONE: u32 = 0;
const OP_INVOKE_HOST_FUNCTION: u32 = 24;
const HOST_FUNCTION_TYPE_INVOKE_CONTRACT: u32 = 0;
const SC_ADDRESS_TYPE_ACCOUNT: u32 = 0;
const SC_ADDRESS_TYPE_CONTRACT: u32 = 1;
const SCV_I128: u32 = 10;
const SCV_SYMBOL: u32 = 15;
const SCV_ADDRESS: u32 = 18;
const LEDGER_ENTRY_ACCOUNT: u32 = 0;

#[derive(Debug, Error)]
pub enum XdrError {
    #[error("failed to decode base64 XDR blob: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("XDR blob too short: expected at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("unexpected XDR discriminant {actual} (expected {expected})")]
    Discriminant { expected: u32, actual: u32 },
}

/// Target of a contract invocation or an address-typed argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScAddress {
    Account([u8; 32]),
    Contract([u8; 32]),
}

/// The subset of `ScVal` this pipeline passes as call arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScVal {
    Address(ScAddress),
    Symbol(String),
    I128(i128),
}

struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn new() -> Self {
        Self { buf: Vec::with_capacity(256) }
    }

    fn u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    fn u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    fn i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    fn fixed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Variable-length opaque/string: length prefix plus zero padding to a
    /// four-byte boundary.
    fn var_opaque(&mut self, bytes: &[u8]) {
        self.u32(bytes.len() as u32);
        self.buf.extend_from_slice(bytes);
        let pad = (4 - bytes.len() % 4) % 4;
        self.buf.extend_from_slice(&[0u8; 3][..pad]);
    }

    /// Splice a pre-encoded XDR value verbatim (no length prefix).
    fn splice(&mut self, blob: &[u8]) {
        self.buf.extend_from_slice(blob);
    }

    fn sc_address(&mut self, address: &ScAddress) {
        match address {
            ScAddress::Account(key) => {
                self.u32(SC_ADDRESS_TYPE_ACCOUNT);
                // AccountID is PublicKey, itself a union over the key type.
                self.u32(KEY_TYPE_ED25519);
                self.fixed(key);
            }
            ScAddress::Contract(hash) => {
                self.u32(SC_ADDRESS_TYPE_CONTRACT);
                self.fixed(hash);
            }
        }
    }

    fn sc_val(&mut self, value: &ScVal) {
        match value {
            ScVal::Address(address) => {
                self.u32(SCV_ADDRESS);
                self.sc_address(address);
            }
            ScVal::Symbol(text) => {
                self.u32(SCV_SYMBOL);
                self.var_opaque(text.as_bytes());
            }
            ScVal::I128(value) => {
                self.u32(SCV_I128);
                // Int128Parts: hi i64 then lo u64.
                self.i64((value >> 64) as i64);
                self.u64(*value as u64);
            }
        }
    }
}

/// Everything needed to serialize one unsigned invoke-host-function envelope.
pub struct EnvelopeParts<'a> {
    pub source_account: [u8; 32],
    pub fee: u32,
    pub sequence: i64,
    pub min_time: u64,
    pub max_time: u64,
    pub contract: ScAddress,
    pub function: &'a str,
    pub args: &'a [ScVal],
    /// `SorobanAuthorizationEntry` blobs from simulation, already XDR.
    pub auth_entries: &'a [Vec<u8>],
    /// `SorobanTransactionData` blob from simulation, already XDR.
    pub transaction_data: Option<&'a [u8]>,
}

/// Encode an unsigned `TransactionV1Envelope` and return it as base64.
pub fn encode_envelope(parts: &EnvelopeParts<'_>) -> String {
    let mut w = Writer::new();

    w.u32(ENVELOPE_TYPE_TX);

    // Transaction.
    w.u32(KEY_TYPE_ED25519); // MuxedAccount
    w.fixed(&parts.source_account);
    w.u32(parts.fee);
    w.i64(parts.sequence);
    w.u32(PRECOND_TIME);
    w.u64(parts.min_time);
    w.u64(parts.max_time);
    w.u32(MEMO_NONE);

    // Exactly one operation, no per-operation source account.
    w.u32(1);
    w.u32(0);
    w.u32(OP_INVOKE_HOST_FUNCTION);

    w.u32(HOST_FUNCTION_TYPE_INVOKE_CONTRACT);
    w.sc_address(&parts.contract);
    w.var_opaque(parts.function.as_bytes());
    w.u32(parts.args.len() as u32);
    for arg in parts.args {
        w.sc_val(arg);
    }

    w.u32(parts.auth_entries.len() as u32);
    for entry in parts.auth_entries {
        w.splice(entry);
    }

    // Transaction ext: v1 carries the simulated SorobanTransactionData.
    match parts.transaction_data {
        Some(blob) => {
            w.u32(1);
            w.splice(blob);
        }
        None => w.u32(0),
    }

    // Signatures: none yet, signing is the wallet's job.
    w.u32(0);

    BASE64.encode(&w.buf)
}

/// Build the base64 `LedgerKey` for an account entry, as passed to
/// `getLedgerEntries`.
pub fn account_ledger_key(account: &[u8; 32]) -> String {
    let mut w = Writer::new();
    w.u32(LEDGER_ENTRY_ACCOUNT);
    w.u32(KEY_TYPE_ED25519);
    w.fixed(account);
    BASE64.encode(&w.buf)
}

/// Pull the sequence number out of a base64 `LedgerEntryData` account entry.
///
/// Layout: union discriminant (4) + AccountID (4 + 32) + balance (8) +
/// seq_num (8); everything past the sequence number is irrelevant here.
pub fn account_entry_sequence(entry_xdr: &str) -> Result<i64, XdrError> {
    let raw = BASE64.decode(entry_xdr)?;
    if raw.len() < 56 {
        return Err(XdrError::Truncated { expected: 56, actual: raw.len() });
    }
    let discriminant = u32::from_be_bytes(raw[0..4].try_into().expect("checked length"));
    if discriminant != LEDGER_ENTRY_ACCOUNT {
        return Err(XdrError::Discriminant {
            expected: LEDGER_ENTRY_ACCOUNT,
            actual: discriminant,
        });
    }
    Ok(i64::from_be_bytes(raw[48..56].try_into().expect("checked length")))
}

/// Decode a base64 XDR blob into raw bytes for later splicing.
pub fn decode_blob(blob: &str) -> Result<Vec<u8>, XdrError> {
    Ok(BASE64.decode(blob)?)
}
