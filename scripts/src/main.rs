//! Entry point of the deploy scripts

use clap::Parser;
use scripts::cli::Cli;
use scripts::errors::ScriptError;
use scripts::utils::setup_client;

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    let Cli {
        priv_key,
        rpc_url,
        deployments_path,
        artifacts_dir,
        command,
    } = Cli::parse();

    tracing_subscriber::fmt().pretty().init();

    let client = setup_client(&priv_key, &rpc_url)?;

    command.run(client, &deployments_path, &artifacts_dir).await
}
