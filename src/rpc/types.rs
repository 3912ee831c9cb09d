//! Wire types for the Soroban RPC JSON-RPC surface.

use serde::Deserialize;
use serde_json::Value;

/// Snapshot of the proposer's on-chain account at build time.
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    pub address: String,
    pub sequence: i64,
}

/// Artifacts a successful simulation contributes to the envelope.
#[derive(Debug, Clone, Default)]
pub struct SimulationArtifacts {
    /// Base64 `SorobanTransactionData` (resource footprint).
    pub transaction_data: Option<String>,
    /// Base64 `SorobanAuthorizationEntry` blobs.
    pub auth_entries: Vec<String>,
    /// Minimum resource fee in stroops, added on top of the inclusion fee.
    pub min_resource_fee: u64,
}

/// Outcome of a dry-run execution against current network state.
///
/// A successful-but-empty-effect simulation is still `Success`; `Failure`
/// carries the node's diagnostic log verbatim for the classifier.
#[derive(Debug, Clone)]
pub enum SimulationOutcome {
    Success(SimulationArtifacts),
    Failure { error_log: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Pending,
    Error,
    Duplicate,
    TryAgainLater,
    #[serde(other)]
    Unrecognized,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "PENDING",
            SubmissionStatus::Error => "ERROR",
            SubmissionStatus::Duplicate => "DUPLICATE",
            SubmissionStatus::TryAgainLater => "TRY_AGAIN_LATER",
            SubmissionStatus::Unrecognized => "UNRECOGNIZED",
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the network reported when it first saw the signed envelope. This is
/// an acknowledgement of receipt, not of execution.
#[derive(Debug, Clone)]
pub struct SubmissionResult {
    pub hash: String,
    pub status: SubmissionStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JsonRpcEnvelope {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetLedgerEntriesResult {
    #[serde(default)]
    pub entries: Vec<LedgerEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LedgerEntry {
    pub xdr: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SimulateTransactionResult {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub transaction_data: Option<String>,
    #[serde(default)]
    pub min_resource_fee: Option<String>,
    #[serde(default)]
    pub results: Vec<SimulateHostFunctionResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SimulateHostFunctionResult {
    #[serde(default)]
    pub auth: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendTransactionResult {
    pub status: SubmissionStatus,
    pub hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_status_parses_known_and_unknown_values() {
        let pending: SubmissionStatus = serde_json::from_str("\"PENDING\"").unwrap();
        assert_eq!(pending, SubmissionStatus::Pending);
        let try_again: SubmissionStatus = serde_json::from_str("\"TRY_AGAIN_LATER\"").unwrap();
        assert_eq!(try_again, SubmissionStatus::TryAgainLater);
        let odd: SubmissionStatus = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(odd, SubmissionStatus::Unrecognized);
    }

    #[test]
    fn simulate_result_tolerates_missing_fields() {
        let parsed: SimulateTransactionResult = serde_json::from_str("{}").unwrap();
        assert!(parsed.error.is_none());
        assert!(parsed.results.is_empty());
        assert!(parsed.min_resource_fee.is_none());
    }

    #[test]
    fn simulate_result_parses_success_shape() {
        let parsed: SimulateTransactionResult = serde_json::from_str(
            r#"{
                "transactionData": "AAAA",
                "minResourceFee": "52641",
                "results": [{"auth": ["BBBB", "CCCC"], "xdr": "AAAA"}],
                "latestLedger": 1234
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.min_resource_fee.as_deref(), Some("52641"));
        assert_eq!(parsed.results[0].auth.len(), 2);
    }
}
