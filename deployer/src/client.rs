// deployer/src/client.rs
// The network collaborator: submits deployments and reports configured accounts.

use async_trait::async_trait;
use ethers::{
    contract::ContractError,
    middleware::signer::SignerMiddlewareError,
    prelude::{
        ContractFactory, Http, LocalWallet, Middleware, PendingTransaction, Provider, Signer,
        SignerMiddleware,
    },
    providers::ProviderError,
    signers::WalletError,
    types::{Address, TxHash, U64},
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::artifact::{ArtifactError, ContractArtifact};
use crate::config::{DeploymentConfig, NetworkConfig};

pub type EthClient = SignerMiddleware<Provider<Http>, LocalWallet>;

const TX_SUCCESS_STATUS: U64 = U64([1]);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid endpoint {url:?}: {reason}")]
    Endpoint { url: String, reason: String },
    #[error("credential #{index} is not a valid private key")]
    Credential {
        index: usize,
        #[source]
        source: WalletError,
    },
    #[error("no signing credentials configured")]
    NoAccounts,
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error(transparent)]
    Contract(#[from] ContractError<EthClient>),
    #[error(transparent)]
    Send(#[from] SignerMiddlewareError<Provider<Http>, LocalWallet>),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("deployment transaction {0:?} was dropped before confirmation")]
    Dropped(TxHash),
    #[error("deployment transaction {0:?} reverted")]
    Reverted(TxHash),
    #[error("receipt for {0:?} carries no contract address")]
    MissingContractAddress(TxHash),
}

/// A deployment transaction that has been broadcast but not yet confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeployment {
    pub contract_name: String,
    pub tx_hash: TxHash,
}

/// What the recorder needs from a network: deploy a contract by name and
/// say which accounts it signs with.
#[async_trait]
pub trait DeploymentClient: Send + Sync {
    /// Broadcasts the deployment transaction for `contract_name`.
    async fn submit_deployment(
        &self,
        contract_name: &str,
    ) -> Result<PendingDeployment, ClientError>;

    /// Resolves once the deployment is confirmed, yielding the contract address.
    /// Unbounded; callers apply their own timeout.
    async fn wait_for_deployment(
        &self,
        pending: &PendingDeployment,
    ) -> Result<Address, ClientError>;

    /// Configured accounts in credential order. The first one signs deployments.
    fn accounts(&self) -> Vec<Address>;
}

/// `DeploymentClient` backed by an HTTP JSON-RPC endpoint and local wallets.
pub struct EthersClient {
    client: Arc<EthClient>,
    accounts: Vec<Address>,
    artifacts_dir: PathBuf,
    confirmations: usize,
    poll_interval: Duration,
}

impl EthersClient {
    #[instrument(skip_all, fields(network = %network.name))]
    pub async fn connect(
        network: &NetworkConfig,
        deployment: &DeploymentConfig,
    ) -> Result<Self, ClientError> {
        let provider = Provider::<Http>::try_from(network.rpc_url.as_str())
            .map_err(|e| ClientError::Endpoint {
                url: network.rpc_url.clone(),
                reason: e.to_string(),
            })?
            .interval(deployment.poll_interval);

        let chain_id = match network.chain_id {
            Some(id) => id,
            None => provider.get_chainid().await?.as_u64(),
        };
        info!(chain_id, "RPC OK");

        let wallets = network
            .accounts
            .iter()
            .enumerate()
            .map(|(index, key)| {
                key.parse::<LocalWallet>()
                    .map(|w| w.with_chain_id(chain_id))
                    .map_err(|source| ClientError::Credential { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let accounts: Vec<Address> = wallets.iter().map(|w| w.address()).collect();
        let signer = wallets.into_iter().next().ok_or(ClientError::NoAccounts)?;
        debug!(deployer = ?signer.address(), accounts = accounts.len(), "Wallets loaded");

        Ok(Self {
            client: Arc::new(SignerMiddleware::new(provider, signer)),
            accounts,
            artifacts_dir: deployment.artifacts_dir.clone(),
            confirmations: deployment.confirmations,
            poll_interval: deployment.poll_interval,
        })
    }
}

#[async_trait]
impl DeploymentClient for EthersClient {
    #[instrument(skip(self))]
    async fn submit_deployment(
        &self,
        contract_name: &str,
    ) -> Result<PendingDeployment, ClientError> {
        let artifact = ContractArtifact::resolve(&self.artifacts_dir, contract_name)?;
        info!(artifact = %artifact.qualified_name(), "Deploying contract...");

        let factory = ContractFactory::new(artifact.abi, artifact.bytecode, self.client.clone());
        // Empty constructor arguments.
        let deployer = factory.deploy(())?;

        let pending = self.client.send_transaction(deployer.tx, None).await?;
        let tx_hash = pending.tx_hash();
        info!(?tx_hash, "Deployment transaction sent");

        Ok(PendingDeployment {
            contract_name: contract_name.to_string(),
            tx_hash,
        })
    }

    #[instrument(skip(self), fields(tx_hash = ?pending.tx_hash))]
    async fn wait_for_deployment(
        &self,
        pending: &PendingDeployment,
    ) -> Result<Address, ClientError> {
        let receipt = PendingTransaction::new(pending.tx_hash, self.client.provider())
            .confirmations(self.confirmations)
            .interval(self.poll_interval)
            .await?
            .ok_or(ClientError::Dropped(pending.tx_hash))?;

        debug!(
            block = ?receipt.block_number,
            gas_used = ?receipt.gas_used,
            "Receipt received"
        );
        if receipt.status != Some(TX_SUCCESS_STATUS) {
            return Err(ClientError::Reverted(pending.tx_hash));
        }
        receipt
            .contract_address
            .ok_or(ClientError::MissingContractAddress(pending.tx_hash))
    }

    fn accounts(&self) -> Vec<Address> {
        self.accounts.clone()
    }
}
