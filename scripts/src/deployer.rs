//! The implementation deployer.
//!
//! Publishes implementation bytecode through the chain client and records
//! the deployment in the content-addressed index, reusing an
//! already-published identical artifact instead of re-publishing it.

use std::sync::Arc;

use alloy_primitives::Bytes;
use tracing::info;
use upgrade_common::backends::ChainClient;
use upgrade_common::types::{DeployedImplementation, ImplementationArtifact};

use crate::errors::DeployError;
use crate::utils::DeploymentsFile;

/// Publishes implementation artifacts to the network
pub struct Deployer<C> {
    /// The chain client to publish through
    client: Arc<C>,
    /// The content-addressed index of prior deployments
    deployments: DeploymentsFile,
}

impl<C: ChainClient> Deployer<C> {
    /// Construct a deployer over the given client and deployments index
    pub fn new(client: Arc<C>, deployments: DeploymentsFile) -> Self {
        Self {
            client,
            deployments,
        }
    }

    /// Publish the artifact's bytecode, returning the deployed
    /// implementation.
    ///
    /// If an identical artifact is already recorded as published and the
    /// chain still reports matching code at its address, the existing
    /// deployment is returned without a new publish.
    pub async fn deploy(
        &self,
        artifact: &ImplementationArtifact,
    ) -> Result<DeployedImplementation, DeployError> {
        if artifact.bytecode.is_empty() {
            return Err(DeployError::CompilationInvalid(format!(
                "artifact {} has empty bytecode",
                artifact.key
            )));
        }

        let code_hash = artifact.code_hash();

        if let Some(address) = self.deployments.implementation_by_hash(code_hash)? {
            if self.client.get_code_hash(address).await? == Some(code_hash) {
                info!(%address, artifact = %artifact.key, "reusing already-published implementation");
                return Ok(DeployedImplementation {
                    key: artifact.key.clone(),
                    address,
                    code_hash,
                });
            }
        }

        let address = self
            .client
            .publish_bytecode(Bytes::from(artifact.bytecode.clone()))
            .await?;

        let deployed = DeployedImplementation {
            key: artifact.key.clone(),
            address,
            code_hash,
        };
        self.deployments.record_implementation(&deployed)?;
        info!(%address, artifact = %artifact.key, "implementation published");

        Ok(deployed)
    }
}
