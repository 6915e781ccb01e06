//! The upgrade orchestrator: validate, deploy, repoint — or abort.
//!
//! Each invocation is a sequential pipeline in which every step strictly
//! gates the next; no failure leaves a partial commit behind. Upgrades of
//! distinct proxies may run concurrently, but upgrades of one proxy are
//! serialized behind a per-address lease.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy_primitives::Address;
use tracing::info;
use upgrade_common::backends::ChainClient;
use upgrade_common::types::{ContractKey, ProxyRecord, UpgradeRecord};
use upgrade_core::validator::validate;

use crate::audit::AuditSink;
use crate::deployer::Deployer;
use crate::errors::{DeployError, ProxyError, RegistryError, UpgradeError};
use crate::proxy::ProxyController;
use crate::registry::ArtifactRegistry;
use crate::utils::{proxy_bytecode, DeploymentsFile};

/// Composes the validator, deployer, and proxy controller into the two
/// lifecycle entry points: first deployment and upgrade
pub struct Orchestrator<C> {
    /// The chain client every network interaction goes through
    client: Arc<C>,
    /// The artifact registry, resolved against at orchestration start
    registry: ArtifactRegistry,
    /// The durable deployments index & upgrade history
    deployments: DeploymentsFile,
    /// The sink committed upgrades are emitted to
    sink: Arc<dyn AuditSink>,
    /// Per-proxy leases serializing concurrent upgrades of one proxy
    leases: Mutex<HashMap<Address, Arc<tokio::sync::Mutex<()>>>>,
}

impl<C: ChainClient> Orchestrator<C> {
    /// Construct an orchestrator over the given collaborators
    pub fn new(
        client: Arc<C>,
        registry: ArtifactRegistry,
        deployments: DeploymentsFile,
        sink: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            client,
            registry,
            deployments,
            sink,
            leases: Mutex::new(HashMap::new()),
        }
    }

    /// The lease guarding the given proxy
    fn lease(&self, proxy: Address) -> Arc<tokio::sync::Mutex<()>> {
        // The lock is held only to clone the entry, never across an await
        self.leases
            .lock()
            .expect("lease table lock poisoned")
            .entry(proxy)
            .or_default()
            .clone()
    }

    /// Upgrade an existing proxy to a new implementation artifact.
    ///
    /// Validates the new artifact's storage layout against the layout of
    /// the implementation the proxy currently points at, publishes the new
    /// artifact, and repoints the proxy — in that order, so the proxy only
    /// ever points at fully-published, layout-compatible code. Any failure
    /// before the repoint leaves no committed state.
    pub async fn upgrade(
        &self,
        proxy: Address,
        key: &ContractKey,
        caller: Address,
    ) -> Result<UpgradeRecord, UpgradeError> {
        let lease = self.lease(proxy);
        let _guard = lease.lock().await;

        let controller = ProxyController::new(self.client.clone(), proxy);
        let record = controller.read_record().await?;

        let old_key = self
            .deployments
            .key_for_implementation(record.current_implementation)?
            .ok_or_else(|| {
                RegistryError::UnknownImplementation(record.current_implementation)
            })?;
        let old_artifact = self.registry.resolve(&old_key)?;
        let new_artifact = self.registry.resolve(key)?;

        validate(Some(&old_artifact.layout), &new_artifact.layout)?;

        let deployer = Deployer::new(self.client.clone(), self.deployments.clone());
        let deployed = deployer.deploy(new_artifact).await?;

        let upgrade_record = controller.repoint(deployed.address, caller).await?;

        // The durable history append and sink emission happen only once the
        // repoint receipt has confirmed
        self.deployments.append_upgrade_record(&upgrade_record)?;
        self.sink.record(&upgrade_record);

        Ok(upgrade_record)
    }

    /// Deploy a fresh proxied system: publish the implementation, publish
    /// the proxy, and initialize the proxy to point at the implementation.
    ///
    /// This path is mutually exclusive with [`Self::upgrade`]: it refuses to
    /// run once a proxy is recorded for the logical system, and `upgrade`
    /// has nothing to act on before it has run.
    pub async fn deploy_proxy(
        &self,
        key: &ContractKey,
        admin: Address,
    ) -> Result<ProxyRecord, UpgradeError> {
        if let Some(existing) = self.deployments.proxy_address()? {
            return Err(ProxyError::AlreadyInitialized(existing).into());
        }

        let artifact = self.registry.resolve(key)?;
        validate(None, &artifact.layout)?;

        let deployer = Deployer::new(self.client.clone(), self.deployments.clone());
        let deployed = deployer.deploy(artifact).await?;

        let proxy_address = self
            .client
            .publish_bytecode(proxy_bytecode()?)
            .await
            .map_err(DeployError::from)?;

        let controller = ProxyController::new(self.client.clone(), proxy_address);
        let record = controller.initialize(deployed.address, admin).await?;

        self.deployments.record_proxy(proxy_address)?;
        info!(
            proxy = %proxy_address,
            implementation = %deployed.address,
            "proxy deployed and initialized"
        );

        Ok(record)
    }

    /// Read the current record of the proxy at the given address
    pub async fn read_proxy(&self, proxy: Address) -> Result<ProxyRecord, UpgradeError> {
        let controller = ProxyController::new(self.client.clone(), proxy);
        Ok(controller.read_record().await?)
    }
}
