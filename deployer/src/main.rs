// deployer/src/main.rs

// --- Imports ---
use clap::Parser;
use deploy_recorder::{deploy_and_record, Cli, EthersClient};
use eyre::{Result, WrapErr};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// --- Main Execution ---
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // Usage errors fail like every other error; help and version do not.
        Err(err) if err.use_stderr() => {
            let _ = err.print();
            std::process::exit(1);
        }
        Err(err) => err.exit(),
    };
    let config = cli.load_config()?;
    info!(network = ?config.network, "Using network");

    let client = EthersClient::connect(&config.network, &config.deployment)
        .await
        .wrap_err_with(|| format!("Failed to connect to network `{}`", config.network.name))?;

    match deploy_and_record(&client, &config.deployment).await {
        Ok(record) => {
            print!("{record}");
            Ok(())
        }
        Err(err) => {
            if err.is_post_deployment() {
                error!(
                    "The contract is live on-chain but {} was not updated; record it manually",
                    config.deployment.output_path.display()
                );
            }
            Err(err.into())
        }
    }
}
// END OF FILE: deployer/src/main.rs
