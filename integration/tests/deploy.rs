//! First-deployment scenarios: the deploy-proxy path and its one-time nature

use eyre::Result;
use integration::{setup_test_args, TEST_ADMIN};
use scripts::errors::{ProxyError, UpgradeError};
use upgrade_common::types::ContractKey;

#[tokio::test]
async fn test_fresh_system_deploys_and_initializes() -> Result<()> {
    let args = setup_test_args();
    let key = ContractKey::new("staking", "1.0.0");

    let record = args.orchestrator.deploy_proxy(&key, TEST_ADMIN).await?;

    assert!(record.initialized);
    assert_eq!(record.admin, TEST_ADMIN);
    assert_eq!(
        args.client.implementation_of(record.address),
        record.current_implementation,
    );

    // The proxy is recorded for the logical system; one publish for the
    // implementation, one for the proxy itself
    assert_eq!(args.deployments.proxy_address()?, Some(record.address));
    assert_eq!(args.client.publish_count(), 2);

    Ok(())
}

#[tokio::test]
async fn test_deploy_proxy_is_one_time() -> Result<()> {
    let args = setup_test_args();
    let key = ContractKey::new("staking", "1.0.0");

    let record = args.orchestrator.deploy_proxy(&key, TEST_ADMIN).await?;

    let err = args
        .orchestrator
        .deploy_proxy(&key, TEST_ADMIN)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        UpgradeError::Proxy(ProxyError::AlreadyInitialized(record.address)),
    );

    // Nothing further was published
    assert_eq!(args.client.publish_count(), 2);

    Ok(())
}

#[tokio::test]
async fn test_deploy_proxy_unknown_artifact_is_registry_error() -> Result<()> {
    let args = setup_test_args();
    let key = ContractKey::new("staking", "9.9.9");

    let err = args
        .orchestrator
        .deploy_proxy(&key, TEST_ADMIN)
        .await
        .unwrap_err();
    assert!(matches!(err, UpgradeError::Registry(_)));
    assert_eq!(args.client.publish_count(), 0);

    Ok(())
}
