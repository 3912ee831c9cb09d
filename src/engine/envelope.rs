//! Transaction envelope lifecycle.
//!
//! An envelope moves strictly `Unsigned → Prepared → Signed → Submitted`.
//! Simulation must precede signing: the auth entries and resource footprint
//! discovered by the dry run are part of what the wallet signs. Every
//! transition checks the current state and rejects misuse instead of
//! producing a payload the network would bounce.

use thiserror::Error;

use crate::rpc::types::SimulationArtifacts;
use crate::xdr::{self, EnvelopeParts, XdrError};

use super::encoder::Invocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Unsigned,
    Prepared,
    Signed,
    Submitted,
}

impl EnvelopeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvelopeState::Unsigned => "unsigned",
            EnvelopeState::Prepared => "prepared",
            EnvelopeState::Signed => "signed",
            EnvelopeState::Submitted => "submitted",
        }
    }
}

impl std::fmt::Display for EnvelopeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("cannot prepare a {0} envelope; simulation consumes an unsigned envelope exactly once")]
    AlreadyPrepared(EnvelopeState),
    #[error("cannot sign a {0} envelope; simulation must precede signing")]
    NotPrepared(EnvelopeState),
    #[error("cannot submit a {0} envelope; only a signed envelope may be submitted")]
    NotSigned(EnvelopeState),
    #[error("simulation returned malformed artifacts: {0}")]
    Artifact(#[from] XdrError),
    #[error("wallet returned an empty signed payload")]
    EmptySignedPayload,
    #[error("wallet returned a signed payload that is not valid base64")]
    MalformedSignedPayload,
}

/// A transaction container addressed from the proposer's account, holding
/// exactly one contract invocation.
#[derive(Debug, Clone)]
pub struct Envelope {
    source_account: [u8; 32],
    sequence: i64,
    fee: u32,
    min_time: u64,
    max_time: u64,
    invocation: Invocation,
    auth_entries: Vec<Vec<u8>>,
    transaction_data: Option<Vec<u8>>,
    state: EnvelopeState,
    signed_xdr: Option<String>,
}

impl Envelope {
    pub(crate) fn unsigned(
        source_account: [u8; 32],
        sequence: i64,
        fee: u32,
        min_time: u64,
        max_time: u64,
        invocation: Invocation,
    ) -> Self {
        Self {
            source_account,
            sequence,
            fee,
            min_time,
            max_time,
            invocation,
            auth_entries: Vec::new(),
            transaction_data: None,
            state: EnvelopeState::Unsigned,
            signed_xdr: None,
        }
    }

    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    pub fn fee(&self) -> u32 {
        self.fee
    }

    pub fn sequence(&self) -> i64 {
        self.sequence
    }

    /// Serialize the (un)prepared envelope for simulation or signing.
    pub fn to_xdr_base64(&self) -> String {
        xdr::encode_envelope(&EnvelopeParts {
            source_account: self.source_account,
            fee: self.fee,
            sequence: self.sequence,
            min_time: self.min_time,
            max_time: self.max_time,
            contract: self.invocation.contract,
            function: self.invocation.function,
            args: &self.invocation.args,
            auth_entries: &self.auth_entries,
            transaction_data: self.transaction_data.as_deref(),
        })
    }

    /// Merge simulation results, moving `Unsigned → Prepared`. The simulated
    /// resource fee is added on top of the inclusion-fee placeholder. An
    /// empty-effect simulation (no auth, no footprint) still prepares.
    pub fn prepare(&mut self, artifacts: SimulationArtifacts) -> Result<(), EnvelopeError> {
        if self.state != EnvelopeState::Unsigned {
            return Err(EnvelopeError::AlreadyPrepared(self.state));
        }

        let mut auth_entries = Vec::with_capacity(artifacts.auth_entries.len());
        for entry in &artifacts.auth_entries {
            auth_entries.push(xdr::decode_blob(entry)?);
        }
        let transaction_data = artifacts
            .transaction_data
            .as_deref()
            .map(xdr::decode_blob)
            .transpose()?;

        self.auth_entries = auth_entries;
        self.transaction_data = transaction_data;
        self.fee = u32::try_from(u64::from(self.fee) + artifacts.min_resource_fee)
            .unwrap_or(u32::MAX);
        self.state = EnvelopeState::Prepared;
        Ok(())
    }

    /// Record the wallet's signed encoding, moving `Prepared → Signed`.
    pub fn mark_signed(&mut self, signed_xdr: String) -> Result<(), EnvelopeError> {
        if self.state != EnvelopeState::Prepared {
            return Err(EnvelopeError::NotPrepared(self.state));
        }
        if signed_xdr.is_empty() {
            return Err(EnvelopeError::EmptySignedPayload);
        }
        // The signature lives inside the blob; verifying it is the
        // network's job. We only require that the blob decodes.
        xdr::decode_blob(&signed_xdr).map_err(|_| EnvelopeError::MalformedSignedPayload)?;
        self.signed_xdr = Some(signed_xdr);
        self.state = EnvelopeState::Signed;
        Ok(())
    }

    /// The signed encoding, available only in `Signed` state.
    pub fn signed_xdr(&self) -> Result<&str, EnvelopeError> {
        if self.state != EnvelopeState::Signed {
            return Err(EnvelopeError::NotSigned(self.state));
        }
        Ok(self
            .signed_xdr
            .as_deref()
            .unwrap_or_default())
    }

    pub fn mark_submitted(&mut self) -> Result<(), EnvelopeError> {
        if self.state != EnvelopeState::Signed {
            return Err(EnvelopeError::NotSigned(self.state));
        }
        self.state = EnvelopeState::Submitted;
        Ok(())
    }
}
