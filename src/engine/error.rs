use thiserror::Error;

use crate::rpc::RpcError;
use crate::rpc::types::SubmissionStatus;
use crate::wallet::WalletError;

use super::encoder::EncodingError;
use super::envelope::EnvelopeError;

/// Stage-specific failures of the proposal pipeline. Every variant is
/// terminal for its invocation; retrying means re-running the pipeline from
/// the first stage with a fresh sequence number.
#[derive(Debug, Error)]
pub enum ProposeError {
    #[error("a proposal is already in flight")]
    InFlight,
    #[error("Wallet not connected")]
    SessionMissing,
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error("failed to look up account {address}: {source}")]
    AccountLookup {
        address: String,
        #[source]
        source: RpcError,
    },
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
    #[error("Simulation Failed: {log}")]
    Simulation { log: String },
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error("transaction submission failed with status {status} (hash {hash})")]
    Submission {
        hash: String,
        status: SubmissionStatus,
    },
    #[error("RPC request failed: {0}")]
    Rpc(#[from] RpcError),
}

pub type ProposeResult<T> = Result<T, ProposeError>;
