// tests/anvil_deploy_test.rs
// Needs a local node: `anvil` on 127.0.0.1:8545 with its default accounts.

use deploy_recorder::{
    deploy_and_record, DeploymentConfig, DeploymentRecord, EthersClient, NetworkConfig,
};
use ethers::{
    providers::{Http, Middleware, Provider},
    types::Address,
};
use eyre::Result;
use serde_json::json;
use std::{fs, path::Path, process::Command, time::Duration};
use tempfile::TempDir;
use tracing::{info, Level};

const ANVIL_HTTP_URL: &str = "http://127.0.0.1:8545";
const ANVIL_CHAIN_ID: u64 = 31337;
// Anvil account #0
const ANVIL_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const ANVIL_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
// Init code for a contract whose runtime returns 42.
const RETURN_42: &str = "0x600a600c600039600a6000f3602a60005260206000f3";

fn write_answer_artifact(root: &Path) -> Result<()> {
    let artifact_dir = root.join("artifacts/contracts/Answer.sol");
    fs::create_dir_all(&artifact_dir)?;
    fs::write(
        artifact_dir.join("Answer.json"),
        json!({
            "_format": "hh-sol-artifact-1",
            "contractName": "Answer",
            "sourceName": "contracts/Answer.sol",
            "abi": [],
            "bytecode": RETURN_42,
        })
        .to_string(),
    )?;
    Ok(())
}

#[tokio::test]
#[ignore]
async fn deploys_to_anvil_and_records_owner() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_test_writer()
        .try_init();

    let tmp = TempDir::new()?;
    write_answer_artifact(tmp.path())?;

    let network = NetworkConfig {
        name: "anvil".to_string(),
        rpc_url: ANVIL_HTTP_URL.to_string(),
        accounts: vec![ANVIL_PRIVATE_KEY.to_string()],
        chain_id: Some(ANVIL_CHAIN_ID),
    };
    let deployment = DeploymentConfig {
        contract_name: "Answer".to_string(),
        artifacts_dir: tmp.path().join("artifacts"),
        output_path: tmp.path().join("genericJson/deploymentInfo.txt"),
        confirmation_timeout: Duration::from_secs(30),
        poll_interval: Duration::from_millis(100),
        ..DeploymentConfig::default()
    };

    let client = EthersClient::connect(&network, &deployment).await?;
    let record = deploy_and_record(&client, &deployment).await?;
    info!(?record, "Deployed");

    assert_eq!(record.deployer, ANVIL_ADDRESS.parse::<Address>()?);
    assert_eq!(DeploymentRecord::read_from(&deployment.output_path)?, record);

    let provider = Provider::<Http>::try_from(ANVIL_HTTP_URL)?;
    let code = provider.get_code(record.contract_address, None).await?;
    assert_eq!(
        code.to_vec(),
        vec![0x60, 0x2a, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xf3]
    );
    Ok(())
}

#[test]
#[ignore]
fn binary_exits_zero_and_prints_the_record() -> Result<()> {
    let tmp = TempDir::new()?;
    write_answer_artifact(tmp.path())?;
    let env_path = tmp.path().join(".env.anvil");
    let contents = format!(
        "PRIVATE_KEY={ANVIL_PRIVATE_KEY}\nCHAIN_ID={ANVIL_CHAIN_ID}\nPOLL_INTERVAL_MS=100\n"
    );
    fs::write(&env_path, contents)?;

    let output = Command::new(env!("CARGO_BIN_EXE_deploy_recorder"))
        .current_dir(tmp.path())
        .env_clear()
        .arg("--env-file")
        .arg(&env_path)
        .args(["--rpc-url", ANVIL_HTTP_URL, "--contract", "Answer"])
        .args(["--timeout-secs", "30"])
        .output()?;

    assert_eq!(
        output.status.code(),
        Some(0),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let written = fs::read_to_string(tmp.path().join("genericJson/deploymentInfo.txt"))?;
    assert_eq!(String::from_utf8(output.stdout)?, written);
    let record: DeploymentRecord = written.parse()?;
    assert_eq!(record.deployer, ANVIL_ADDRESS.parse::<Address>()?);
    Ok(())
}
