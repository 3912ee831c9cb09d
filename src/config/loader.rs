use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::AstrolabeConfig;

pub const DEFAULT_CONFIG_PATHS: &[&str] = &["astrolabe.toml", "config/astrolabe.toml"];

const CONFIG_TEMPLATE: &str = r#"# astrolabe configuration

[network]
# Soroban RPC endpoint used for account lookup, simulation and submission.
rpc_url = "https://soroban-testnet.stellar.org"
network_passphrase = "Test SDF Network ; September 2015"
request_timeout_ms = 10000

[vault]
# Contract id of the deployed treasury vault.
contract_id = ""

[wallet]
# Local wallet bridge holding the signing keys.
bridge_url = "http://127.0.0.1:8791"

[pipeline]
# Inclusion-fee placeholder in stroops; simulation adds the resource fee.
base_fee = 100
# Envelope validity window in seconds.
validity_window_secs = 30

[logging]
level = "info"

# Overrides for the contract error-code table. Keys are the numeric codes
# embedded in simulation diagnostics, values are taxonomy names. Keep this in
# sync with the deployed contract's error enumeration.
#[contract_errors]
#"110" = "DAILY_LIMIT_EXCEEDED"
"#;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("refusing to overwrite existing config at {0} (use --force)")]
    Exists(PathBuf),
}

pub fn load_config(path: Option<PathBuf>) -> Result<AstrolabeConfig, ConfigError> {
    let candidate_paths = match path {
        Some(p) => vec![p],
        None => DEFAULT_CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .collect::<Vec<PathBuf>>(),
    };

    for candidate in candidate_paths {
        if let Some(config) = try_load_file(&candidate)? {
            return Ok(config);
        }
    }

    Ok(AstrolabeConfig::default())
}

fn try_load_file(path: &Path) -> Result<Option<AstrolabeConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config: AstrolabeConfig =
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(Some(config))
}

/// Write the commented config template, used by `astrolabe init`.
pub fn write_template(path: &Path, force: bool) -> Result<(), ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::Exists(path.to_path_buf()));
    }
    fs::write(path, CONFIG_TEMPLATE).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses_as_valid_config() {
        let config: AstrolabeConfig = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.pipeline.base_fee, 100);
        assert_eq!(
            config.network.network_passphrase,
            "Test SDF Network ; September 2015"
        );
    }

    #[test]
    fn missing_explicit_path_yields_defaults_only_for_search_paths() {
        // An explicit path that does not exist falls through to defaults.
        let config = load_config(Some(PathBuf::from("does/not/exist.toml"))).unwrap();
        assert_eq!(config.pipeline.validity_window_secs, 30);
    }
}
