// deployer/src/cli.rs

use clap::Parser;
use std::{env, path::PathBuf, time::Duration};

use crate::config::{load_env, Config, ConfigError};

// --- CLI Argument Parsing ---
#[derive(Parser, Debug, Default)]
#[command(
    name = "deploy_recorder",
    author,
    version,
    about = "Deploys a contract and records its address",
    long_about = None
)]
pub struct Cli {
    /// Env file to load instead of `./.env`.
    #[arg(long = "env-file", value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Network profile name (NETWORK_NAME).
    #[arg(long)]
    pub network: Option<String>,

    /// JSON-RPC endpoint (ALCHEMY_HTTP_URL / RPC_URL).
    #[arg(long = "rpc-url", value_name = "URL")]
    pub rpc_url: Option<String>,

    /// Contract to deploy, bare or fully qualified (CONTRACT_NAME).
    #[arg(long)]
    pub contract: Option<String>,

    /// Hardhat artifacts directory (ARTIFACTS_DIR).
    #[arg(long = "artifacts", value_name = "DIR")]
    pub artifacts_dir: Option<PathBuf>,

    /// Record file (DEPLOYMENT_OUTPUT).
    #[arg(long = "output", value_name = "PATH")]
    pub output_path: Option<PathBuf>,

    /// Seconds to wait for confirmation (CONFIRMATION_TIMEOUT_SECS).
    #[arg(long = "timeout-secs", value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Blocks required before the deployment counts as confirmed (CONFIRMATIONS).
    #[arg(long)]
    pub confirmations: Option<usize>,
}

impl Cli {
    /// Loads the env file, then resolves the configuration from the process
    /// environment with these flags on top.
    pub fn load_config(self) -> Result<Config, ConfigError> {
        load_env(self.env_file.as_deref())?;
        self.resolve(|key| env::var(key).ok())
    }

    /// Builds the configuration from `lookup`, lets every flag that was given
    /// replace its variable, then validates the result.
    pub fn resolve<F>(self, lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::from_lookup(lookup)?;
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(self, config: &mut Config) {
        if let Some(name) = self.network {
            config.network.name = name;
        }
        if let Some(url) = self.rpc_url {
            config.network.rpc_url = url;
        }
        if let Some(contract) = self.contract {
            config.deployment.contract_name = contract;
        }
        if let Some(dir) = self.artifacts_dir {
            config.deployment.artifacts_dir = dir;
        }
        if let Some(path) = self.output_path {
            config.deployment.output_path = path;
        }
        if let Some(secs) = self.timeout_secs {
            config.deployment.confirmation_timeout = Duration::from_secs(secs);
        }
        if let Some(n) = self.confirmations {
            config.deployment.confirmations = n;
        }
    }
}
