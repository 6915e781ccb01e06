//! Definitions of CLI arguments and commands for deploy scripts

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use crate::client::HttpChainClient;
use crate::commands::{deploy_implementation, deploy_proxy, show_proxy, upgrade};
use crate::constants::{DEFAULT_ARTIFACTS_DIR, DEFAULT_DEPLOYMENTS_PATH};
use crate::errors::ScriptError;

/// The safe upgradeable-proxy deployment orchestrator
#[derive(Parser)]
pub struct Cli {
    /// Private key of the deployer
    // TODO: Better key management
    #[arg(short, long)]
    pub priv_key: String,

    /// Network RPC URL
    #[arg(short, long)]
    pub rpc_url: String,

    /// Path of the deployments state file
    #[arg(long, default_value = DEFAULT_DEPLOYMENTS_PATH)]
    pub deployments_path: String,

    /// Directory holding implementation artifact files
    #[arg(long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts_dir: String,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// The subcommands of the deploy scripts
#[derive(Subcommand)]
pub enum Command {
    /// Deploy a fresh proxied system: implementation, proxy, and the
    /// one-time initialization pointing the proxy at the implementation.
    ///
    /// Refuses to run once the deployments file records a proxy; from then
    /// on, `upgrade` is the only lifecycle entry point.
    DeployProxy(DeployProxyArgs),
    /// Upgrade the recorded proxy to a new implementation artifact.
    ///
    /// The new artifact's storage layout is validated against the current
    /// implementation's before anything is published.
    Upgrade(UpgradeArgs),
    /// Publish an implementation artifact without touching any proxy
    DeployImpl(DeployImplArgs),
    /// Print the recorded proxy's current state and upgrade history
    ShowProxy,
}

impl Command {
    /// Dispatch the parsed command
    pub async fn run(
        self,
        client: Arc<HttpChainClient>,
        deployments_path: &str,
        artifacts_dir: &str,
    ) -> Result<(), ScriptError> {
        match self {
            Command::DeployProxy(args) => {
                deploy_proxy(args, client, deployments_path, artifacts_dir).await
            }
            Command::Upgrade(args) => upgrade(args, client, deployments_path, artifacts_dir).await,
            Command::DeployImpl(args) => {
                deploy_implementation(args, client, deployments_path, artifacts_dir).await
            }
            Command::ShowProxy => show_proxy(client, deployments_path).await,
        }
    }
}

/// Deploy a fresh proxied system
#[derive(Args)]
pub struct DeployProxyArgs {
    /// The implementation artifact to deploy, as `name@version`
    #[arg(short, long)]
    pub contract: String,

    /// Admin address authorized to upgrade the proxy, in hex.
    ///
    /// Defaults to the deployer's address.
    #[arg(short, long)]
    pub admin: Option<String>,
}

/// Upgrade the proxy to a new implementation
#[derive(Args)]
pub struct UpgradeArgs {
    /// The implementation artifact to upgrade to, as `name@version`
    #[arg(short, long)]
    pub contract: String,

    /// Address of the proxy contract in hex.
    ///
    /// Defaults to the proxy recorded in the deployments file.
    #[arg(long)]
    pub proxy: Option<String>,
}

/// Publish an implementation artifact
#[derive(Args)]
pub struct DeployImplArgs {
    /// The implementation artifact to publish, as `name@version`
    #[arg(short, long)]
    pub contract: String,
}
