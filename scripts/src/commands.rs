//! Implementations of the various deploy scripts

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::Address;
use upgrade_common::types::ContractKey;

use crate::audit::TracingSink;
use crate::cli::{DeployImplArgs, DeployProxyArgs, UpgradeArgs};
use crate::client::HttpChainClient;
use crate::deployer::Deployer;
use crate::errors::ScriptError;
use crate::orchestrator::Orchestrator;
use crate::registry::ArtifactRegistry;
use crate::utils::DeploymentsFile;

/// Deploy a fresh proxied system
pub async fn deploy_proxy(
    args: DeployProxyArgs,
    client: Arc<HttpChainClient>,
    deployments_path: &str,
    artifacts_dir: &str,
) -> Result<(), ScriptError> {
    let key = parse_contract_key(&args.contract)?;
    let admin = match args.admin {
        Some(admin) => parse_address(&admin)?,
        None => client.sender(),
    };

    let orchestrator = build_orchestrator(client, deployments_path, artifacts_dir)?;
    let record = orchestrator.deploy_proxy(&key, admin).await?;

    println!("Proxy contract deployed at {:#x}", record.address);
    println!(
        "Proxy initialized with implementation {:#x}",
        record.current_implementation
    );

    Ok(())
}

/// Upgrade the proxy to a new implementation artifact
pub async fn upgrade(
    args: UpgradeArgs,
    client: Arc<HttpChainClient>,
    deployments_path: &str,
    artifacts_dir: &str,
) -> Result<(), ScriptError> {
    let key = parse_contract_key(&args.contract)?;
    let deployments = DeploymentsFile::new(deployments_path);

    let proxy = match args.proxy {
        Some(proxy) => parse_address(&proxy)?,
        None => deployments.proxy_address()?.ok_or_else(|| {
            ScriptError::InvalidArguments(
                "no proxy recorded; pass --proxy or run deploy-proxy first".to_string(),
            )
        })?,
    };

    let caller = client.sender();
    let orchestrator = build_orchestrator(client, deployments_path, artifacts_dir)?;
    let record = orchestrator.upgrade(proxy, &key, caller).await?;

    println!(
        "Proxy {:#x} repointed from {:#x} to {:#x} in tx {:#x}",
        record.proxy, record.from_implementation, record.to_implementation, record.tx_hash
    );

    Ok(())
}

/// Publish an implementation artifact without touching any proxy
pub async fn deploy_implementation(
    args: DeployImplArgs,
    client: Arc<HttpChainClient>,
    deployments_path: &str,
    artifacts_dir: &str,
) -> Result<(), ScriptError> {
    let key = parse_contract_key(&args.contract)?;
    let registry = ArtifactRegistry::from_dir(Path::new(artifacts_dir))?;
    let artifact = registry.resolve(&key)?;

    let deployer = Deployer::new(client, DeploymentsFile::new(deployments_path));
    let deployed = deployer.deploy(artifact).await?;

    println!(
        "Implementation {} deployed at {:#x}",
        deployed.key, deployed.address
    );

    Ok(())
}

/// Print the recorded proxy's current state and upgrade history
pub async fn show_proxy(
    client: Arc<HttpChainClient>,
    deployments_path: &str,
) -> Result<(), ScriptError> {
    let deployments = DeploymentsFile::new(deployments_path);
    let proxy = deployments.proxy_address()?.ok_or_else(|| {
        ScriptError::InvalidArguments("no proxy recorded in deployments file".to_string())
    })?;

    let orchestrator = Orchestrator::new(
        client,
        ArtifactRegistry::new(),
        deployments.clone(),
        Arc::new(TracingSink),
    );
    let record = orchestrator.read_proxy(proxy).await?;

    println!("Proxy contract at {:#x}", record.address);
    println!("Current implementation {:#x}", record.current_implementation);
    println!("Initialized: {}", record.initialized);
    println!("Admin: {:#x}", record.admin);

    for upgrade in deployments.upgrade_history()? {
        println!(
            "  upgraded {:#x} -> {:#x} at block {} by {:#x}",
            upgrade.from_implementation,
            upgrade.to_implementation,
            upgrade.block_number,
            upgrade.initiator
        );
    }

    Ok(())
}

/// Build the orchestrator from its file-backed collaborators
fn build_orchestrator(
    client: Arc<HttpChainClient>,
    deployments_path: &str,
    artifacts_dir: &str,
) -> Result<Orchestrator<HttpChainClient>, ScriptError> {
    let registry = ArtifactRegistry::from_dir(Path::new(artifacts_dir))?;
    Ok(Orchestrator::new(
        client,
        registry,
        DeploymentsFile::new(deployments_path),
        Arc::new(TracingSink),
    ))
}

/// Parse a `name@version` contract key argument
fn parse_contract_key(raw: &str) -> Result<ContractKey, ScriptError> {
    ContractKey::from_str(raw).map_err(|e| ScriptError::InvalidArguments(e.to_string()))
}

/// Parse a hex address argument
fn parse_address(raw: &str) -> Result<Address, ScriptError> {
    Address::from_str(raw).map_err(|e| ScriptError::InvalidArguments(e.to_string()))
}
