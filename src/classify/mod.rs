//! Error classification.
//!
//! The ledger surfaces contract-level failures only as integer codes embedded
//! in a diagnostic string (`Error(Contract, #101)`), not as structured
//! values. This module is the single adapter from that unstructured text —
//! and from the pipeline's stage failures — to a closed taxonomy callers can
//! match on. Classification is pure: the same failure always yields the same
//! `VaultError`.

use std::collections::BTreeMap;
use std::str::FromStr;

use thiserror::Error;

use crate::engine::{EnvelopeError, ProposeError};
use crate::wallet::WalletError;

/// Closed set of user-facing error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VaultErrorCode {
    Unknown,
    WalletError,
    NotInitialized,
    AlreadyInitialized,
    Unauthorized,
    InsufficientFunds,
    ThresholdNotMet,
    DailyLimitExceeded,
    RpcError,
    EncodingError,
    AccountLookupError,
    SimulationFailure,
    SignerUnavailable,
    SubmissionRejected,
}

impl VaultErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VaultErrorCode::Unknown => "UNKNOWN",
            VaultErrorCode::WalletError => "WALLET_ERROR",
            VaultErrorCode::NotInitialized => "NOT_INITIALIZED",
            VaultErrorCode::AlreadyInitialized => "ALREADY_INITIALIZED",
            VaultErrorCode::Unauthorized => "UNAUTHORIZED",
            VaultErrorCode::InsufficientFunds => "INSUFFICIENT_FUNDS",
            VaultErrorCode::ThresholdNotMet => "THRESHOLD_NOT_MET",
            VaultErrorCode::DailyLimitExceeded => "DAILY_LIMIT_EXCEEDED",
            VaultErrorCode::RpcError => "RPC_ERROR",
            VaultErrorCode::EncodingError => "ENCODING_ERROR",
            VaultErrorCode::AccountLookupError => "ACCOUNT_LOOKUP_ERROR",
            VaultErrorCode::SimulationFailure => "SIMULATION_FAILURE",
            VaultErrorCode::SignerUnavailable => "SIGNER_UNAVAILABLE",
            VaultErrorCode::SubmissionRejected => "SUBMISSION_REJECTED",
        }
    }

    /// Canned message for contract-mapped categories.
    fn contract_message(&self) -> &'static str {
        match self {
            VaultErrorCode::NotInitialized => "Contract not initialized.",
            VaultErrorCode::AlreadyInitialized => "Contract already initialized.",
            VaultErrorCode::Unauthorized => {
                "You are not authorized to perform this action."
            }
            VaultErrorCode::InsufficientFunds => "Insufficient vault balance.",
            VaultErrorCode::ThresholdNotMet => "Proposal approval threshold not met.",
            VaultErrorCode::DailyLimitExceeded => "Daily spending limit exceeded.",
            _ => "Failed to submit transaction.",
        }
    }
}

impl std::fmt::Display for VaultErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VaultErrorCode {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "UNKNOWN" => VaultErrorCode::Unknown,
            "WALLET_ERROR" => VaultErrorCode::WalletError,
            "NOT_INITIALIZED" => VaultErrorCode::NotInitialized,
            "ALREADY_INITIALIZED" => VaultErrorCode::AlreadyInitialized,
            "UNAUTHORIZED" => VaultErrorCode::Unauthorized,
            "INSUFFICIENT_FUNDS" => VaultErrorCode::InsufficientFunds,
            "THRESHOLD_NOT_MET" => VaultErrorCode::ThresholdNotMet,
            "DAILY_LIMIT_EXCEEDED" => VaultErrorCode::DailyLimitExceeded,
            "RPC_ERROR" => VaultErrorCode::RpcError,
            "ENCODING_ERROR" => VaultErrorCode::EncodingError,
            "ACCOUNT_LOOKUP_ERROR" => VaultErrorCode::AccountLookupError,
            "SIMULATION_FAILURE" => VaultErrorCode::SimulationFailure,
            "SIGNER_UNAVAILABLE" => VaultErrorCode::SignerUnavailable,
            "SUBMISSION_REJECTED" => VaultErrorCode::SubmissionRejected,
            other => return Err(TableError::UnknownCode(other.to_string())),
        })
    }
}

/// What callers receive on any failure: one taxonomy code plus a
/// human-readable message. Created per failing call, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct VaultError {
    pub code: VaultErrorCode,
    pub message: String,
}

impl VaultError {
    fn new(code: VaultErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    /// Fallback shape for a failure carrying no usable value. `Result`
    /// makes that case unreachable in the pipeline itself, so only the
    /// taxonomy tests construct it.
    #[cfg(test)]
    fn unknown() -> Self {
        Self::new(VaultErrorCode::Unknown, "An unknown error occurred.")
    }
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("contract error table key {0:?} is not a numeric code")]
    BadKey(String),
    #[error("contract error table value {0:?} is not a taxonomy name")]
    UnknownCode(String),
}

/// Mapping from the contract's error enumeration to taxonomy categories.
///
/// The defaults mirror the deployed vault contract; this is a cross-system
/// invariant the contract does not enforce for us, so the table accepts
/// overrides from configuration (code 110 in particular is unconfirmed
/// against the contract's enumeration).
#[derive(Debug, Clone)]
pub struct ContractErrorTable {
    entries: BTreeMap<u32, VaultErrorCode>,
}

impl Default for ContractErrorTable {
    fn default() -> Self {
        let entries = BTreeMap::from([
            (1, VaultErrorCode::NotInitialized),
            (2, VaultErrorCode::AlreadyInitialized),
            (100, VaultErrorCode::Unauthorized),
            (101, VaultErrorCode::InsufficientFunds),
            (102, VaultErrorCode::ThresholdNotMet),
            (110, VaultErrorCode::DailyLimitExceeded),
        ]);
        Self { entries }
    }
}

impl ContractErrorTable {
    /// Defaults plus configured overrides (string-keyed, as read from TOML).
    pub fn with_overrides(
        overrides: &BTreeMap<String, String>,
    ) -> Result<Self, TableError> {
        let mut table = Self::default();
        for (key, value) in overrides {
            let code = key
                .parse::<u32>()
                .map_err(|_| TableError::BadKey(key.clone()))?;
            table.entries.insert(code, value.parse()?);
        }
        Ok(table)
    }

    pub fn lookup(&self, code: u32) -> Option<VaultErrorCode> {
        self.entries.get(&code).copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = (u32, VaultErrorCode)> + '_ {
        self.entries.iter().map(|(&code, &kind)| (code, kind))
    }
}

/// Pull the numeric contract error code out of a diagnostic string, looking
/// for the `Error(Contract, #N)` marker. All call sites go through here so
/// the marker format lives in one place.
pub fn extract_contract_code(diagnostic: &str) -> Option<u32> {
    const MARKER: &str = "Error(Contract, #";
    let start = diagnostic.find(MARKER)? + MARKER.len();
    let rest = &diagnostic[start..];
    let end = rest.find(')')?;
    rest[..end].parse::<u32>().ok()
}

#[derive(Debug, Clone, Default)]
pub struct ErrorClassifier {
    table: ContractErrorTable,
}

impl ErrorClassifier {
    pub fn new(table: ContractErrorTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &ContractErrorTable {
        &self.table
    }

    /// Map a pipeline failure to its taxonomy category. First match wins:
    /// wallet rejection, then an embedded contract error code, then the
    /// failing stage, then `RPC_ERROR` with the original message verbatim.
    pub fn classify(&self, error: &ProposeError) -> VaultError {
        if let ProposeError::Wallet(WalletError::Rejected(_)) = error {
            return VaultError::new(
                VaultErrorCode::WalletError,
                "Transaction rejected by wallet.",
            );
        }

        let message = error.to_string();
        if let Some(code) = extract_contract_code(&message) {
            if let Some(kind) = self.table.lookup(code) {
                return VaultError::new(kind, kind.contract_message());
            }
        }

        match error {
            ProposeError::Wallet(WalletError::Unavailable(_)) => {
                VaultError::new(VaultErrorCode::SignerUnavailable, message)
            }
            ProposeError::Encoding(_) => {
                VaultError::new(VaultErrorCode::EncodingError, message)
            }
            ProposeError::AccountLookup { .. } => {
                VaultError::new(VaultErrorCode::AccountLookupError, message)
            }
            ProposeError::Envelope(EnvelopeError::Artifact(_)) => {
                VaultError::new(VaultErrorCode::SimulationFailure, message)
            }
            ProposeError::Submission { .. } => {
                VaultError::new(VaultErrorCode::SubmissionRejected, message)
            }
            _ => {
                let message = if message.is_empty() {
                    "Failed to submit transaction.".to_string()
                } else {
                    message
                };
                VaultError::new(VaultErrorCode::RpcError, message)
            }
        }
    }
}
