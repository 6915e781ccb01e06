//! End-to-end tests for the upgrade pipeline, run against the in-memory
//! mock chain.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

use std::sync::{Arc, Mutex};

use alloy_primitives::Address;
use scripts::audit::AuditSink;
use scripts::orchestrator::Orchestrator;
use scripts::registry::ArtifactRegistry;
use scripts::utils::DeploymentsFile;
use upgrade_common::types::{ContractKey, ImplementationArtifact, UpgradeRecord};
use upgrade_utils::fixtures::{
    appended_layout, pseudo_bytecode, staking_artifact_v1, staking_artifact_v2,
    staking_artifact_v3, STAKING_CONTRACT,
};
use upgrade_utils::mock_chain::MockChainClient;

/// The admin identity used across the tests
pub const TEST_ADMIN: Address = Address::repeat_byte(0xaa);

/// A sink that collects every emitted record, for assertions
#[derive(Default)]
pub struct CollectingSink {
    /// The records received so far
    records: Mutex<Vec<UpgradeRecord>>,
}

impl CollectingSink {
    /// The records received so far
    pub fn records(&self) -> Vec<UpgradeRecord> {
        self.records.lock().expect("sink lock poisoned").clone()
    }
}

impl AuditSink for CollectingSink {
    fn record(&self, record: &UpgradeRecord) {
        self.records
            .lock()
            .expect("sink lock poisoned")
            .push(*record);
    }
}

/// A second safe upgrade target alongside v2: same appended layout, distinct
/// bytecode, used by the concurrency tests
pub fn staking_artifact_v2_1() -> ImplementationArtifact {
    ImplementationArtifact {
        key: ContractKey::new(STAKING_CONTRACT, "2.1.0"),
        bytecode: pseudo_bytecode(4, 64),
        layout: appended_layout(),
    }
}

/// The arguments provided to each integration test
pub struct TestArgs {
    /// The mock chain
    pub client: Arc<MockChainClient>,
    /// The orchestrator under test
    pub orchestrator: Arc<Orchestrator<MockChainClient>>,
    /// The collecting audit sink
    pub sink: Arc<CollectingSink>,
    /// The deployments state file backing the orchestrator
    pub deployments: DeploymentsFile,
}

/// Stand up a fresh mock chain, registry of every staking fixture, and
/// orchestrator over a unique temp deployments file
pub fn setup_test_args() -> TestArgs {
    let client = Arc::new(MockChainClient::new());
    let sink = Arc::new(CollectingSink::default());

    let mut registry = ArtifactRegistry::new();
    registry.insert(staking_artifact_v1());
    registry.insert(staking_artifact_v2());
    registry.insert(staking_artifact_v2_1());
    registry.insert(staking_artifact_v3());

    let path = std::env::temp_dir().join(format!("deployments-{}.json", rand::random::<u64>()));
    let deployments = DeploymentsFile::new(path.to_string_lossy().to_string());

    let orchestrator = Arc::new(Orchestrator::new(
        client.clone(),
        registry,
        deployments.clone(),
        sink.clone(),
    ));

    TestArgs {
        client,
        orchestrator,
        sink,
        deployments,
    }
}
