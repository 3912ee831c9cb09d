use std::collections::BTreeMap;

use serde::Deserialize;

pub mod loader;

pub use loader::{ConfigError, load_config, write_template};

pub(crate) fn default_rpc_url() -> String {
    "https://soroban-testnet.stellar.org".to_string()
}

pub(crate) fn default_network_passphrase() -> String {
    "Test SDF Network ; September 2015".to_string()
}

pub(crate) fn default_bridge_url() -> String {
    "http://127.0.0.1:8791".to_string()
}

pub(crate) fn default_base_fee() -> u32 {
    100
}

pub(crate) fn default_validity_window_secs() -> u64 {
    30
}

pub(crate) fn default_request_timeout_ms() -> u64 {
    10_000
}

pub(crate) fn default_logging_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct AstrolabeConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Overrides for the contract error-code table, keyed by the numeric
    /// code embedded in simulation diagnostics (TOML keys are strings, so
    /// codes are quoted: `"110" = "DAILY_LIMIT_EXCEEDED"`). The deployed
    /// contract's error enumeration is authoritative; this table must be
    /// kept in sync with it.
    #[serde(default)]
    pub contract_errors: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default = "default_network_passphrase")]
    pub network_passphrase: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            network_passphrase: default_network_passphrase(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Contract id of the deployed treasury vault (`C...` strkey).
    #[serde(default)]
    pub contract_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WalletConfig {
    /// Base URL of the local wallet bridge that holds the signing keys.
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self { bridge_url: default_bridge_url() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Inclusion-fee placeholder in stroops; simulation adds the resource fee.
    #[serde(default = "default_base_fee")]
    pub base_fee: u32,
    /// Envelope validity window. Stale envelopes expire instead of lingering
    /// as replayable payloads.
    #[serde(default = "default_validity_window_secs")]
    pub validity_window_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_fee: default_base_fee(),
            validity_window_secs: default_validity_window_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_logging_level() }
    }
}
