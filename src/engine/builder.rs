use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::rpc::LedgerRpc;
use crate::strkey;

use super::encoder::{EncodingError, Invocation};
use super::envelope::Envelope;
use super::error::{ProposeError, ProposeResult};

/// Builds `Unsigned` envelopes from current account state.
///
/// The only network call here is the account fetch; fee and resource
/// figures stay placeholders until simulation fills them in.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    base_fee: u32,
    validity_window_secs: u64,
}

impl EnvelopeBuilder {
    pub fn new(base_fee: u32, validity_window_secs: u64) -> Self {
        Self {
            base_fee,
            validity_window_secs,
        }
    }

    /// Fetch the proposer's account and wrap the invocation into an
    /// `Unsigned` envelope with one operation and a bounded validity
    /// window, so a stale envelope expires instead of staying replayable.
    pub async fn build(
        &self,
        rpc: &dyn LedgerRpc,
        proposer: &str,
        invocation: Invocation,
    ) -> ProposeResult<Envelope> {
        let source_account = strkey::decode_account(proposer).map_err(|source| {
            ProposeError::Encoding(EncodingError::Address {
                field: "proposer",
                source,
            })
        })?;

        let account = rpc
            .fetch_account(proposer)
            .await
            .map_err(|source| ProposeError::AccountLookup {
                address: proposer.to_string(),
                source,
            })?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let max_time = now + self.validity_window_secs;

        // The envelope consumes the next sequence number after the one
        // currently recorded on chain.
        let sequence = account.sequence + 1;

        debug!(
            target: "engine::builder",
            proposer,
            sequence,
            fee = self.base_fee,
            max_time,
            "built unsigned envelope"
        );

        Ok(Envelope::unsigned(
            source_account,
            sequence,
            self.base_fee,
            0,
            max_time,
            invocation,
        ))
    }
}
