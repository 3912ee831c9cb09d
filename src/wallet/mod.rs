//! External signing authority.
//!
//! Keys never live in this process: a prepared envelope is handed to an
//! out-of-process wallet (reached through a local HTTP bridge) and comes back
//! either signed or declined. The hand-off can block on user interaction for
//! an unbounded time; no timeout is enforced here.

pub mod bridge;

use async_trait::async_trait;
use thiserror::Error;

pub use bridge::BridgeSigner;

#[derive(Debug, Error)]
pub enum WalletError {
    /// The authority was reached and reported a user-declined action.
    #[error("transaction rejected by wallet: {0}")]
    Rejected(String),
    /// The authority could not be reached at all. Unlike a rejection this is
    /// not a user decision and retrying without fixing the setup is futile.
    #[error("signing authority unavailable: {0}")]
    Unavailable(String),
    #[error("unexpected wallet bridge response: {0}")]
    Schema(String),
}

/// Wallet connection state owned by the caller and passed into the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSession {
    pub address: String,
}

impl WalletSession {
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into() }
    }
}

/// Public identity the authority is willing to sign for.
#[derive(Debug, Clone)]
pub struct WalletIdentity {
    pub public_key: String,
}

/// Out-of-process signing authority.
#[async_trait]
pub trait SigningAuthority: Send + Sync {
    /// Whether this client is already permitted to talk to the wallet.
    async fn is_allowed(&self) -> Result<bool, WalletError>;

    /// Ask the wallet to grant access (may prompt the user).
    async fn request_access(&self) -> Result<(), WalletError>;

    /// Current public address the wallet would sign with.
    async fn user_identity(&self) -> Result<WalletIdentity, WalletError>;

    /// Sign an encoded envelope for the given network. Suspends until the
    /// user responds; the returned string is the signed envelope's base64 XDR.
    async fn sign_transaction(
        &self,
        envelope_xdr: &str,
        network_passphrase: &str,
    ) -> Result<String, WalletError>;
}
