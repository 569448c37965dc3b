// deployer/src/config.rs

use dotenv::dotenv;
use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use tracing::info;

// --- Defaults ---
pub const DEFAULT_NETWORK_NAME: &str = "mumbai";
pub const DEFAULT_CONTRACT_NAME: &str = "MLOpsNFT";
pub const DEFAULT_ARTIFACTS_DIR: &str = "./artifacts";
pub const DEFAULT_OUTPUT_PATH: &str = "./genericJson/deploymentInfo.txt";
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_CONFIRMATIONS: usize = 1;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load env file {path:?}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenv::Error,
    },
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} has an invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// A named network profile: where to send transactions and who signs them.
#[derive(Clone)]
pub struct NetworkConfig {
    pub name: String,
    pub rpc_url: String,
    /// Hex private keys. The first one deploys and is recorded as owner.
    pub accounts: Vec<String>,
    /// Fetched from the endpoint when unset.
    pub chain_id: Option<u64>,
}

// Keys stay out of logs.
impl fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("name", &self.name)
            .field("rpc_url", &self.rpc_url)
            .field("accounts", &format_args!("[{} redacted]", self.accounts.len()))
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

/// Options for a single deploy-and-record run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentConfig {
    /// Bare (`MLOpsNFT`) or fully qualified (`contracts/MLOps.sol:MLOpsNFT`) name.
    pub contract_name: String,
    pub artifacts_dir: PathBuf,
    pub output_path: PathBuf,
    pub confirmation_timeout: Duration,
    pub confirmations: usize,
    pub poll_interval: Duration,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            contract_name: DEFAULT_CONTRACT_NAME.to_string(),
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            confirmation_timeout: Duration::from_secs(DEFAULT_CONFIRMATION_TIMEOUT_SECS),
            confirmations: DEFAULT_CONFIRMATIONS,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub network: NetworkConfig,
    pub deployment: DeploymentConfig,
}

/// Loads `.env` (or `env_file` when given) into the process environment.
/// Variables already set in the environment win over the file.
pub fn load_env(env_file: Option<&Path>) -> Result<(), ConfigError> {
    match env_file {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration from env file");
            dotenv::from_path(path).map_err(|source| ConfigError::EnvFile {
                path: path.to_path_buf(),
                source,
            })?;
        }
        None => {
            info!("Loading configuration from .env file...");
            dotenv().ok();
        }
    }
    Ok(())
}

impl Config {
    /// Builds the configuration from any key/value source.
    ///
    /// Values that fail to parse are rejected here. Required values may still
    /// be missing; callers fill in overrides and then call [`Config::validate`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| {
            lookup(var)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let parse_u64 = |var: &'static str, default: u64| -> Result<u64, ConfigError> {
            match get(var) {
                Some(value) => value.parse::<u64>().map_err(|e| ConfigError::Invalid {
                    var,
                    reason: e.to_string(),
                    value,
                }),
                None => Ok(default),
            }
        };

        // --- Network ---
        let name = get("NETWORK_NAME").unwrap_or_else(|| DEFAULT_NETWORK_NAME.to_string());
        let rpc_url = get("ALCHEMY_HTTP_URL")
            .or_else(|| get("RPC_URL"))
            .unwrap_or_default();
        let accounts: Vec<String> = get("PRIVATE_KEY")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from)
            .collect();
        let chain_id = match get("CHAIN_ID") {
            Some(_) => Some(parse_u64("CHAIN_ID", 0)?),
            None => None,
        };

        // --- Deployment ---
        let timeout_secs =
            parse_u64("CONFIRMATION_TIMEOUT_SECS", DEFAULT_CONFIRMATION_TIMEOUT_SECS)?;
        let confirmations = parse_u64("CONFIRMATIONS", DEFAULT_CONFIRMATIONS as u64)?;
        let poll_interval_ms = parse_u64("POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?;

        let deployment = DeploymentConfig {
            contract_name: get("CONTRACT_NAME")
                .unwrap_or_else(|| DEFAULT_CONTRACT_NAME.to_string()),
            artifacts_dir: get("ARTIFACTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACTS_DIR)),
            output_path: get("DEPLOYMENT_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH)),
            confirmation_timeout: Duration::from_secs(timeout_secs),
            confirmations: confirmations as usize,
            poll_interval: Duration::from_millis(poll_interval_ms),
        };

        Ok(Self {
            network: NetworkConfig {
                name,
                rpc_url,
                accounts,
                chain_id,
            },
            deployment,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.network.validate()?;
        self.deployment.validate()
    }
}

impl NetworkConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc_url.trim().is_empty() {
            return Err(ConfigError::Missing("ALCHEMY_HTTP_URL or RPC_URL"));
        }
        if self.accounts.iter().all(|k| k.trim().is_empty()) {
            return Err(ConfigError::Missing("PRIVATE_KEY"));
        }
        Ok(())
    }
}

impl DeploymentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.contract_name.trim().is_empty() {
            return Err(ConfigError::Missing("CONTRACT_NAME"));
        }
        if self.confirmation_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "CONFIRMATION_TIMEOUT_SECS",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.confirmations == 0 {
            return Err(ConfigError::Invalid {
                var: "CONFIRMATIONS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        // Zero would poll the endpoint in a tight loop.
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid {
                var: "POLL_INTERVAL_MS",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

// END OF FILE: deployer/src/config.rs
