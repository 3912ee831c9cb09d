//! HTTP client for the local wallet bridge (Freighter-style API).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{SigningAuthority, WalletError, WalletIdentity};

#[derive(Clone, Debug)]
pub struct BridgeSigner {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

#[derive(Deserialize)]
struct AllowedResponse {
    allowed: bool,
}

#[derive(Deserialize)]
struct IdentityResponse {
    public_key: String,
}

#[derive(Serialize)]
struct SignRequest<'a> {
    transaction_xdr: &'a str,
    network_passphrase: &'a str,
}

#[derive(Deserialize)]
struct SignResponse {
    signed_xdr: String,
}

#[derive(Deserialize, Default)]
struct BridgeErrorBody {
    #[serde(default)]
    error: String,
}

impl BridgeSigner {
    pub fn new(client: reqwest::Client, base_url: String, request_timeout_ms: u64) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_millis(request_timeout_ms),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Connection-level failures mean the bridge (or the wallet behind it) is
    /// not there, which is a distinct condition from a user decline.
    fn unreachable(err: reqwest::Error) -> WalletError {
        WalletError::Unavailable(err.to_string())
    }

    async fn rejection(response: reqwest::Response) -> WalletError {
        let status = response.status();
        let body = response
            .json::<BridgeErrorBody>()
            .await
            .unwrap_or_default();
        let message = if body.error.is_empty() {
            format!("wallet bridge returned status {status}")
        } else {
            body.error
        };
        if status == StatusCode::FORBIDDEN {
            WalletError::Rejected(message)
        } else {
            WalletError::Schema(message)
        }
    }
}

#[async_trait]
impl SigningAuthority for BridgeSigner {
    async fn is_allowed(&self) -> Result<bool, WalletError> {
        let response = self
            .client
            .get(self.endpoint("/v1/allowed"))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(Self::unreachable)?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        let body: AllowedResponse = response
            .json()
            .await
            .map_err(|err| WalletError::Schema(err.to_string()))?;
        Ok(body.allowed)
    }

    async fn request_access(&self) -> Result<(), WalletError> {
        let response = self
            .client
            .post(self.endpoint("/v1/access"))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(Self::unreachable)?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        info!(target: "wallet::bridge", "wallet access granted");
        Ok(())
    }

    async fn user_identity(&self) -> Result<WalletIdentity, WalletError> {
        let response = self
            .client
            .get(self.endpoint("/v1/identity"))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(Self::unreachable)?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        let body: IdentityResponse = response
            .json()
            .await
            .map_err(|err| WalletError::Schema(err.to_string()))?;
        debug!(
            target: "wallet::bridge",
            public_key = %body.public_key,
            "resolved wallet identity"
        );
        Ok(WalletIdentity { public_key: body.public_key })
    }

    async fn sign_transaction(
        &self,
        envelope_xdr: &str,
        network_passphrase: &str,
    ) -> Result<String, WalletError> {
        // No timeout on this call: it waits on user interaction.
        let response = self
            .client
            .post(self.endpoint("/v1/sign"))
            .json(&SignRequest {
                transaction_xdr: envelope_xdr,
                network_passphrase,
            })
            .send()
            .await
            .map_err(Self::unreachable)?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        let body: SignResponse = response
            .json()
            .await
            .map_err(|err| WalletError::Schema(err.to_string()))?;
        info!(target: "wallet::bridge", "envelope signed by wallet");
        Ok(body.signed_xdr)
    }
}
