// deployer/src/recorder.rs

use ethers::types::{Address, TxHash};
use std::{fmt, path::PathBuf, time::Duration};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{error, info, instrument};

use crate::client::{ClientError, DeploymentClient};
use crate::config::DeploymentConfig;
use crate::record::DeploymentRecord;

/// Where a run is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentStage {
    NotStarted,
    Submitted,
    Confirmed,
    Recorded,
    Failed,
    RecordFailed,
}

impl fmt::Display for DeploymentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not-started",
            Self::Submitted => "submitted",
            Self::Confirmed => "confirmed",
            Self::Recorded => "recorded",
            Self::Failed => "failed",
            Self::RecordFailed => "record-failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("deployment of `{contract}` could not be submitted")]
    Submission {
        contract: String,
        #[source]
        source: ClientError,
    },
    #[error("deployment of `{contract}` was not confirmed (tx {tx_hash:?})")]
    Confirmation {
        contract: String,
        tx_hash: TxHash,
        #[source]
        source: ClientError,
    },
    #[error("no confirmation for `{contract}` within {timeout:?} (tx {tx_hash:?}); it may still be mined")]
    ConfirmationTimeout {
        contract: String,
        tx_hash: TxHash,
        timeout: Duration,
    },
    #[error("contract deployed to {contract_address:?} but no configured account to record as owner")]
    Owner { contract_address: Address },
    #[error("contract deployed to {contract_address:?} but the record could not be written to {path:?}; the on-chain deployment is NOT undone")]
    Record {
        contract_address: Address,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DeployError {
    /// True when the contract exists on-chain but the local record does not
    /// reflect it.
    pub fn is_post_deployment(&self) -> bool {
        matches!(self, Self::Owner { .. } | Self::Record { .. })
    }

    /// The terminal stage this error leaves the run in.
    pub fn stage(&self) -> DeploymentStage {
        if self.is_post_deployment() {
            DeploymentStage::RecordFailed
        } else {
            DeploymentStage::Failed
        }
    }
}

/// Deploys `config.contract_name` through `client`, waits for confirmation and
/// writes the resulting record to `config.output_path`.
///
/// Nothing touches the output file unless the deployment is confirmed. A
/// failure after confirmation leaves the contract on-chain; see
/// [`DeployError::is_post_deployment`].
#[instrument(skip_all, fields(contract = %config.contract_name))]
pub async fn deploy_and_record<C>(
    client: &C,
    config: &DeploymentConfig,
) -> Result<DeploymentRecord, DeployError>
where
    C: DeploymentClient + ?Sized,
{
    let contract = config.contract_name.clone();
    let mut stage = DeploymentStage::NotStarted;
    info!(%stage, "Starting deployment");

    // 1. Submit
    let pending = client
        .submit_deployment(&contract)
        .await
        .map_err(|source| {
            let err = DeployError::Submission {
                contract: contract.clone(),
                source,
            };
            fail(stage, err)
        })?;
    stage = DeploymentStage::Submitted;
    info!(%stage, tx_hash = ?pending.tx_hash, "Waiting for confirmation...");

    // 2-3. Confirm and read the address
    let wait = client.wait_for_deployment(&pending);
    let contract_address = match timeout(config.confirmation_timeout, wait).await {
        Ok(Ok(address)) => address,
        Ok(Err(source)) => {
            let err = DeployError::Confirmation {
                contract,
                tx_hash: pending.tx_hash,
                source,
            };
            return Err(fail(stage, err));
        }
        Err(_) => {
            let err = DeployError::ConfirmationTimeout {
                contract,
                tx_hash: pending.tx_hash,
                timeout: config.confirmation_timeout,
            };
            return Err(fail(stage, err));
        }
    };
    stage = DeploymentStage::Confirmed;
    info!(%stage, address = ?contract_address, "Contract has been deployed successfully");

    // 4. Owner is the first configured account.
    let owner = client
        .accounts()
        .first()
        .copied()
        .ok_or_else(|| fail(stage, DeployError::Owner { contract_address }))?;
    info!(owner = ?owner, "Owner");

    // 5-7. Record
    let record = DeploymentRecord::new(contract_address, owner);
    record.write_to(&config.output_path).map_err(|source| {
        let err = DeployError::Record {
            contract_address,
            path: config.output_path.clone(),
            source,
        };
        fail(stage, err)
    })?;
    stage = DeploymentStage::Recorded;
    info!(%stage, path = %config.output_path.display(), "Deployment information has been saved");

    Ok(record)
}

fn fail(from: DeploymentStage, err: DeployError) -> DeployError {
    error!(
        from = %from,
        to = %err.stage(),
        post_deployment = err.is_post_deployment(),
        "{err}"
    );
    err
}
