// deployer/src/lib.rs
// Library interface shared by the binary and the integration tests.

pub mod artifact;
pub mod cli;
pub mod client;
pub mod config;
pub mod record;
pub mod recorder;

// Public types re-exported for convenience
pub use artifact::{ArtifactError, ContractArtifact};
pub use cli::Cli;
pub use client::{ClientError, DeploymentClient, EthersClient, PendingDeployment};
pub use config::{load_env, Config, ConfigError, DeploymentConfig, NetworkConfig};
pub use record::{DeploymentRecord, ParseRecordError};
pub use recorder::{deploy_and_record, DeployError, DeploymentStage};
