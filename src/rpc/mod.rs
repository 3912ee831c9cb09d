//! Soroban RPC client.
//!
//! Three calls drive the whole pipeline: `getLedgerEntries` for the
//! proposer's account (sequence number), `simulateTransaction` for resource
//! and authorization discovery, and `sendTransaction` for submission.

pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info};

use crate::strkey;
use crate::xdr::{self, XdrError};

use self::types::{
    AccountSnapshot, GetLedgerEntriesResult, JsonRpcEnvelope, SendTransactionResult,
    SimulateTransactionResult, SimulationArtifacts, SimulationOutcome, SubmissionResult,
};

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("failed to call Soroban RPC: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to parse RPC response body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("RPC request to {endpoint} failed with status {status}")]
    ApiStatus {
        endpoint: String,
        status: StatusCode,
    },
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("unexpected RPC response schema: {0}")]
    Schema(String),
    #[error("account {address} not found (unknown or unfunded)")]
    AccountNotFound { address: String },
    #[error("invalid account address: {0}")]
    Address(#[from] strkey::StrkeyError),
    #[error("failed to decode ledger entry XDR: {0}")]
    Xdr(#[from] XdrError),
}

/// Seam between the pipeline and the network, so the pipeline is testable
/// against an in-memory ledger.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    async fn fetch_account(&self, address: &str) -> Result<AccountSnapshot, RpcError>;
    async fn simulate_transaction(&self, envelope_xdr: &str)
    -> Result<SimulationOutcome, RpcError>;
    async fn send_transaction(&self, envelope_xdr: &str) -> Result<SubmissionResult, RpcError>;
}

#[derive(Clone, Debug)]
pub struct SorobanRpcClient {
    client: reqwest::Client,
    endpoint: String,
    request_timeout: Duration,
}

impl SorobanRpcClient {
    pub fn new(client: reqwest::Client, endpoint: String, request_timeout_ms: u64) -> Self {
        Self {
            client,
            endpoint,
            request_timeout: Duration::from_millis(request_timeout_ms),
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RpcError::ApiStatus {
                endpoint: self.endpoint.clone(),
                status: response.status(),
            });
        }

        let envelope: JsonRpcEnvelope = response.json().await?;
        if let Some(err) = envelope.error {
            return Err(RpcError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        envelope
            .result
            .ok_or_else(|| RpcError::Schema(format!("{method} response carried no result")))
    }
}

#[async_trait]
impl LedgerRpc for SorobanRpcClient {
    async fn fetch_account(&self, address: &str) -> Result<AccountSnapshot, RpcError> {
        let key = strkey::decode_account(address)?;
        let ledger_key = xdr::account_ledger_key(&key);

        let result = self
            .call("getLedgerEntries", json!({ "keys": [ledger_key] }))
            .await?;
        let entries: GetLedgerEntriesResult = serde_json::from_value(result)?;

        let entry = entries
            .entries
            .into_iter()
            .next()
            .ok_or_else(|| RpcError::AccountNotFound {
                address: address.to_string(),
            })?;
        let sequence = xdr::account_entry_sequence(&entry.xdr)?;

        debug!(
            target: "rpc::soroban",
            address,
            sequence,
            "fetched account entry"
        );

        Ok(AccountSnapshot {
            address: address.to_string(),
            sequence,
        })
    }

    async fn simulate_transaction(
        &self,
        envelope_xdr: &str,
    ) -> Result<SimulationOutcome, RpcError> {
        let result = self
            .call("simulateTransaction", json!({ "transaction": envelope_xdr }))
            .await?;
        let simulation: SimulateTransactionResult = serde_json::from_value(result)?;

        if let Some(error_log) = simulation.error {
            info!(
                target: "rpc::soroban",
                error_log = %error_log,
                "simulation reported a failure"
            );
            return Ok(SimulationOutcome::Failure { error_log });
        }

        let min_resource_fee = match simulation.min_resource_fee.as_deref() {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                RpcError::Schema(format!("minResourceFee is not an integer: {raw}"))
            })?,
            None => 0,
        };
        let auth_entries = simulation
            .results
            .into_iter()
            .flat_map(|r| r.auth)
            .collect::<Vec<_>>();

        debug!(
            target: "rpc::soroban",
            min_resource_fee,
            auth_entries = auth_entries.len(),
            has_transaction_data = simulation.transaction_data.is_some(),
            "simulation succeeded"
        );

        Ok(SimulationOutcome::Success(SimulationArtifacts {
            transaction_data: simulation.transaction_data,
            auth_entries,
            min_resource_fee,
        }))
    }

    async fn send_transaction(&self, envelope_xdr: &str) -> Result<SubmissionResult, RpcError> {
        let result = self
            .call("sendTransaction", json!({ "transaction": envelope_xdr }))
            .await?;
        let sent: SendTransactionResult = serde_json::from_value(result)?;

        info!(
            target: "rpc::soroban",
            hash = %sent.hash,
            status = %sent.status,
            "transaction handed to the network"
        );

        Ok(SubmissionResult {
            hash: sent.hash,
            status: sent.status,
        })
    }
}
