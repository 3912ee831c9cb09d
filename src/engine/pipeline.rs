use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::classify::{ContractErrorTable, ErrorClassifier, VaultError};
use crate::rpc::LedgerRpc;
use crate::rpc::types::{SimulationOutcome, SubmissionResult, SubmissionStatus};
use crate::wallet::{SigningAuthority, WalletSession};

use super::builder::EnvelopeBuilder;
use super::encoder::{ProposalRequest, encode_invocation};
use super::error::{ProposeError, ProposeResult};

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub contract_id: String,
    pub network_passphrase: String,
    pub base_fee: u32,
    pub validity_window_secs: u64,
}

/// The five-stage proposal pipeline. Stages run strictly in order, each
/// consuming the previous stage's output; there is no retry and no
/// cancellation once a stage has been entered. Any failure is classified
/// into a `VaultError` before it reaches the caller.
pub struct ProposalPipeline {
    rpc: Arc<dyn LedgerRpc>,
    signer: Arc<dyn SigningAuthority>,
    classifier: ErrorClassifier,
    builder: EnvelopeBuilder,
    settings: PipelineSettings,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag on every exit path, including early returns
/// and classified failures.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ProposalPipeline {
    pub fn new(
        rpc: Arc<dyn LedgerRpc>,
        signer: Arc<dyn SigningAuthority>,
        table: ContractErrorTable,
        settings: PipelineSettings,
    ) -> Self {
        let builder = EnvelopeBuilder::new(settings.base_fee, settings.validity_window_secs);
        Self {
            rpc,
            signer,
            classifier: ErrorClassifier::new(table),
            builder,
            settings,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn classifier(&self) -> &ErrorClassifier {
        &self.classifier
    }

    /// Whether a proposal is currently being driven through the stages.
    /// This is duplicate-trigger suppression for the caller's UI, not a
    /// cross-context lock.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Propose a treasury transfer. Returns the network's acknowledgement
    /// (hash plus `PENDING`) or a classified `VaultError`; there is no third
    /// outcome. The result means "accepted for inclusion", not "executed" —
    /// confirmation polling is out of scope for this pipeline.
    pub async fn propose_transfer(
        &self,
        session: &WalletSession,
        recipient: &str,
        token: &str,
        amount: &str,
        memo: &str,
    ) -> Result<SubmissionResult, VaultError> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            return Err(self.classifier.classify(&ProposeError::InFlight));
        };

        match self.run(session, recipient, token, amount, memo).await {
            Ok(result) => Ok(result),
            Err(err) => {
                warn!(
                    target: "engine::pipeline",
                    error = %err,
                    "proposal failed"
                );
                Err(self.classifier.classify(&err))
            }
        }
    }

    async fn run(
        &self,
        session: &WalletSession,
        recipient: &str,
        token: &str,
        amount: &str,
        memo: &str,
    ) -> ProposeResult<SubmissionResult> {
        if session.address.is_empty() {
            return Err(ProposeError::SessionMissing);
        }

        // Stage 1: encode the contract call. Pure; a bad request fails here
        // before any network traffic.
        let request = ProposalRequest {
            proposer: session.address.clone(),
            recipient: recipient.to_string(),
            token: token.to_string(),
            amount: amount.to_string(),
            memo: memo.to_string(),
        };
        let invocation = encode_invocation(&self.settings.contract_id, &request)?;

        // Stage 2: wrap it into an unsigned envelope from current account
        // state.
        let mut envelope = self
            .builder
            .build(self.rpc.as_ref(), &session.address, invocation)
            .await?;

        // Stage 3: simulate to discover required authorizations and the
        // resource fee. This is the only place those are learned; the
        // pipeline never guesses them.
        match self
            .rpc
            .simulate_transaction(&envelope.to_xdr_base64())
            .await?
        {
            SimulationOutcome::Success(artifacts) => envelope.prepare(artifacts)?,
            SimulationOutcome::Failure { error_log } => {
                return Err(ProposeError::Simulation { log: error_log });
            }
        }

        info!(
            target: "engine::pipeline",
            fee = envelope.fee(),
            sequence = envelope.sequence(),
            "envelope prepared, requesting signature"
        );

        // Stage 4: hand off to the external signer. May block on user
        // interaction indefinitely.
        let signed_xdr = self
            .signer
            .sign_transaction(&envelope.to_xdr_base64(), &self.settings.network_passphrase)
            .await?;
        envelope.mark_signed(signed_xdr)?;

        // Stage 5: submit. PENDING is the only acceptable answer.
        let result = self.rpc.send_transaction(envelope.signed_xdr()?).await?;
        if result.status != SubmissionStatus::Pending {
            return Err(ProposeError::Submission {
                hash: result.hash,
                status: result.status,
            });
        }
        envelope.mark_submitted()?;

        info!(
            target: "engine::pipeline",
            hash = %result.hash,
            "transaction submitted, not yet confirmed"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::VaultErrorCode;
    use crate::rpc::RpcError;
    use crate::rpc::types::{AccountSnapshot, SimulationArtifacts};
    use crate::strkey::{encode_account, encode_contract};
    use crate::wallet::{WalletError, WalletIdentity};

    use std::sync::Mutex;

    use async_trait::async_trait;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as BASE64;

    struct FakeLedger {
        simulation: SimulationOutcome,
        submission_status: SubmissionStatus,
        calls: Mutex<Vec<&'static str>>,
    }

    impl FakeLedger {
        fn happy() -> Self {
            Self {
                simulation: SimulationOutcome::Success(SimulationArtifacts {
                    transaction_data: Some(BASE64.encode([0u8; 8])),
                    auth_entries: vec![BASE64.encode([1u8; 4])],
                    min_resource_fee: 52_641,
                }),
                submission_status: SubmissionStatus::Pending,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing_simulation(log: &str) -> Self {
            Self {
                simulation: SimulationOutcome::Failure { error_log: log.to_string() },
                submission_status: SubmissionStatus::Pending,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LedgerRpc for FakeLedger {
        async fn fetch_account(&self, address: &str) -> Result<AccountSnapshot, RpcError> {
            self.calls.lock().unwrap().push("fetch_account");
            Ok(AccountSnapshot {
                address: address.to_string(),
                sequence: 7,
            })
        }

        async fn simulate_transaction(
            &self,
            _envelope_xdr: &str,
        ) -> Result<SimulationOutcome, RpcError> {
            self.calls.lock().unwrap().push("simulate");
            Ok(self.simulation.clone())
        }

        async fn send_transaction(
            &self,
            _envelope_xdr: &str,
        ) -> Result<SubmissionResult, RpcError> {
            self.calls.lock().unwrap().push("send");
            Ok(SubmissionResult {
                hash: "ab".repeat(32),
                status: self.submission_status,
            })
        }
    }

    struct FakeSigner {
        decline: bool,
        unreachable: bool,
    }

    impl FakeSigner {
        fn approving() -> Self {
            Self { decline: false, unreachable: false }
        }

        fn declining() -> Self {
            Self { decline: true, unreachable: false }
        }
    }

    #[async_trait]
    impl SigningAuthority for FakeSigner {
        async fn is_allowed(&self) -> Result<bool, WalletError> {
            Ok(!self.unreachable)
        }

        async fn request_access(&self) -> Result<(), WalletError> {
            Ok(())
        }

        async fn user_identity(&self) -> Result<WalletIdentity, WalletError> {
            Ok(WalletIdentity { public_key: encode_account(&[1u8; 32]) })
        }

        async fn sign_transaction(
            &self,
            envelope_xdr: &str,
            _network_passphrase: &str,
        ) -> Result<String, WalletError> {
            if self.unreachable {
                return Err(WalletError::Unavailable("bridge not running".to_string()));
            }
            if self.decline {
                return Err(WalletError::Rejected("user declined".to_string()));
            }
            // A real wallet returns the envelope with signatures appended;
            // an opaque non-empty blob is enough for the pipeline.
            Ok(envelope_xdr.to_string())
        }
    }

    /// Holds the signing call open until released, so a test can observe the
    /// pipeline while it is parked mid-flight.
    struct ParkedSigner {
        gate: tokio::sync::Notify,
    }

    impl ParkedSigner {
        fn new() -> Self {
            Self { gate: tokio::sync::Notify::new() }
        }

        fn release(&self) {
            self.gate.notify_one();
        }
    }

    #[async_trait]
    impl SigningAuthority for ParkedSigner {
        async fn is_allowed(&self) -> Result<bool, WalletError> {
            Ok(true)
        }

        async fn request_access(&self) -> Result<(), WalletError> {
            Ok(())
        }

        async fn user_identity(&self) -> Result<WalletIdentity, WalletError> {
            Ok(WalletIdentity { public_key: encode_account(&[1u8; 32]) })
        }

        async fn sign_transaction(
            &self,
            envelope_xdr: &str,
            _network_passphrase: &str,
        ) -> Result<String, WalletError> {
            self.gate.notified().await;
            Ok(envelope_xdr.to_string())
        }
    }

    fn pipeline(ledger: Arc<FakeLedger>, signer: Arc<dyn SigningAuthority>) -> ProposalPipeline {
        ProposalPipeline::new(
            ledger,
            signer,
            ContractErrorTable::default(),
            PipelineSettings {
                contract_id: encode_contract(&[9u8; 32]),
                network_passphrase: "Test SDF Network ; September 2015".to_string(),
                base_fee: 100,
                validity_window_secs: 30,
            },
        )
    }

    fn session() -> WalletSession {
        WalletSession::new(encode_account(&[1u8; 32]))
    }

    fn recipient() -> String {
        encode_account(&[2u8; 32])
    }

    fn token() -> String {
        encode_contract(&[3u8; 32])
    }

    #[tokio::test]
    async fn happy_path_yields_pending_hash() {
        let ledger = Arc::new(FakeLedger::happy());
        let pipeline = pipeline(ledger.clone(), Arc::new(FakeSigner::approving()));

        let result = pipeline
            .propose_transfer(&session(), &recipient(), &token(), "1000000", "payout")
            .await
            .unwrap();

        assert_eq!(result.status, SubmissionStatus::Pending);
        assert_eq!(result.hash.len(), 64);
        assert_eq!(ledger.calls(), vec!["fetch_account", "simulate", "send"]);
        assert!(!pipeline.is_busy());
    }

    #[tokio::test]
    async fn declining_wallet_classifies_as_wallet_error_and_clears_busy() {
        let ledger = Arc::new(FakeLedger::happy());
        let pipeline = pipeline(ledger.clone(), Arc::new(FakeSigner::declining()));

        let err = pipeline
            .propose_transfer(&session(), &recipient(), &token(), "1000000", "payout")
            .await
            .unwrap_err();

        assert_eq!(err.code, VaultErrorCode::WalletError);
        // Nothing was submitted after the decline.
        assert_eq!(ledger.calls(), vec!["fetch_account", "simulate"]);
        assert!(!pipeline.is_busy());
    }

    #[tokio::test]
    async fn bad_amount_fails_before_any_network_call() {
        let ledger = Arc::new(FakeLedger::happy());
        let pipeline = pipeline(ledger.clone(), Arc::new(FakeSigner::approving()));

        let err = pipeline
            .propose_transfer(&session(), &recipient(), &token(), "abc", "payout")
            .await
            .unwrap_err();

        assert_eq!(err.code, VaultErrorCode::EncodingError);
        assert!(ledger.calls().is_empty());
    }

    #[tokio::test]
    async fn contract_diagnostic_maps_through_the_table() {
        let ledger = Arc::new(FakeLedger::failing_simulation(
            "HostError: Error(Contract, #101)",
        ));
        let pipeline = pipeline(ledger, Arc::new(FakeSigner::approving()));

        let err = pipeline
            .propose_transfer(&session(), &recipient(), &token(), "1000000", "payout")
            .await
            .unwrap_err();

        assert_eq!(err.code, VaultErrorCode::InsufficientFunds);
        assert_eq!(err.message, "Insufficient vault balance.");
    }

    #[tokio::test]
    async fn non_pending_submission_is_rejected() {
        let mut ledger = FakeLedger::happy();
        ledger.submission_status = SubmissionStatus::Duplicate;
        let pipeline = pipeline(Arc::new(ledger), Arc::new(FakeSigner::approving()));

        let err = pipeline
            .propose_transfer(&session(), &recipient(), &token(), "1000000", "payout")
            .await
            .unwrap_err();

        assert_eq!(err.code, VaultErrorCode::SubmissionRejected);
        assert!(err.message.contains("DUPLICATE"));
    }

    #[tokio::test]
    async fn unreachable_signer_is_distinct_from_rejection() {
        let ledger = Arc::new(FakeLedger::happy());
        let signer = Arc::new(FakeSigner { decline: false, unreachable: true });
        let pipeline = pipeline(ledger, signer);

        let err = pipeline
            .propose_transfer(&session(), &recipient(), &token(), "1000000", "payout")
            .await
            .unwrap_err();

        assert_eq!(err.code, VaultErrorCode::SignerUnavailable);
    }

    #[tokio::test]
    async fn second_call_while_one_is_in_flight_fails_fast() {
        let ledger = Arc::new(FakeLedger::happy());
        let signer = Arc::new(ParkedSigner::new());
        let pipeline = Arc::new(pipeline(ledger, signer.clone()));

        let first = tokio::spawn({
            let pipeline = Arc::clone(&pipeline);
            async move {
                pipeline
                    .propose_transfer(&session(), &recipient(), &token(), "1000000", "payout")
                    .await
            }
        });

        // Let the first call take the flag and park at the signer.
        while !pipeline.is_busy() {
            tokio::task::yield_now().await;
        }

        let err = pipeline
            .propose_transfer(&session(), &recipient(), &token(), "1000000", "payout")
            .await
            .unwrap_err();
        assert_eq!(err.code, VaultErrorCode::RpcError);
        assert_eq!(err.message, "a proposal is already in flight");

        // The rejected duplicate must not disturb the parked attempt.
        signer.release();
        let result = first.await.unwrap().unwrap();
        assert_eq!(result.status, SubmissionStatus::Pending);
        assert!(!pipeline.is_busy());
    }

    #[tokio::test]
    async fn missing_session_fails_before_any_network_call() {
        let ledger = Arc::new(FakeLedger::happy());
        let pipeline = pipeline(ledger.clone(), Arc::new(FakeSigner::approving()));

        let err = pipeline
            .propose_transfer(
                &WalletSession::new(""),
                &recipient(),
                &token(),
                "1",
                "payout",
            )
            .await
            .unwrap_err();

        assert_eq!(err.code, VaultErrorCode::RpcError);
        assert_eq!(err.message, "Wallet not connected");
        assert!(ledger.calls().is_empty());
    }
}
