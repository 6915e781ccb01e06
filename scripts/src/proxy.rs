//! The proxy controller: the only sanctioned mutation path for the proxy's
//! implementation pointer.
//!
//! The controller is a state machine over {uninitialized, active}.
//! Initialization is a one-way transition; every later pointer change goes
//! through `repoint`, which requires the caller to be the proxy admin and
//! commits the pointer move together with the upgrade-history append in a
//! single transaction.

use std::sync::Arc;

use alloy_primitives::{Address, B256};
use tracing::{info, warn};
use upgrade_common::backends::ChainClient;
use upgrade_common::constants::{
    ADMIN_STORAGE_SLOT, IMPLEMENTATION_STORAGE_SLOT, INITIALIZED_STORAGE_SLOT,
};
use upgrade_common::types::{ProxyCall, ProxyRecord, TransactionCall, UpgradeRecord};

use crate::errors::ProxyError;

/// A handle on one proxy contract's upgrade surface
pub struct ProxyController<C> {
    /// The chain client transactions are submitted through
    client: Arc<C>,
    /// The proxy's address
    proxy: Address,
}

impl<C: ChainClient> ProxyController<C> {
    /// Construct a controller for the proxy at the given address
    pub fn new(client: Arc<C>, proxy: Address) -> Self {
        Self { client, proxy }
    }

    /// The proxy address this controller manages
    pub fn address(&self) -> Address {
        self.proxy
    }

    /// Read the proxy's persistent record back from network state
    pub async fn read_record(&self) -> Result<ProxyRecord, ProxyError> {
        if self.client.get_code_hash(self.proxy).await?.is_none() {
            return Err(ProxyError::ProxyNotFound(self.proxy));
        }

        let current_implementation = Address::from_word(
            self.client
                .read_storage(self.proxy, IMPLEMENTATION_STORAGE_SLOT)
                .await?,
        );
        let admin = Address::from_word(
            self.client
                .read_storage(self.proxy, ADMIN_STORAGE_SLOT)
                .await?,
        );
        let initialized = self
            .client
            .read_storage(self.proxy, INITIALIZED_STORAGE_SLOT)
            .await?
            != B256::ZERO;

        Ok(ProxyRecord {
            address: self.proxy,
            current_implementation,
            initialized,
            admin,
        })
    }

    /// Perform the one-way transition out of the uninitialized state,
    /// pointing the proxy at its first implementation and fixing its admin
    pub async fn initialize(
        &self,
        implementation: Address,
        admin: Address,
    ) -> Result<ProxyRecord, ProxyError> {
        let record = self.read_record().await?;
        if record.initialized {
            return Err(ProxyError::AlreadyInitialized(self.proxy));
        }

        self.client
            .submit_transaction(&TransactionCall {
                to: self.proxy,
                from: admin,
                call: ProxyCall::Initialize {
                    implementation,
                    admin,
                },
            })
            .await?;

        info!(proxy = %self.proxy, %implementation, %admin, "proxy initialized");

        Ok(ProxyRecord {
            address: self.proxy,
            current_implementation: implementation,
            initialized: true,
            admin,
        })
    }

    /// Atomically move the proxy's implementation pointer.
    ///
    /// The returned record is built from the confirmed receipt; if this
    /// returns an error, the pointer did not move.
    pub async fn repoint(
        &self,
        new_implementation: Address,
        caller: Address,
    ) -> Result<UpgradeRecord, ProxyError> {
        let record = self.read_record().await?;
        if !record.is_active() {
            return Err(ProxyError::NotInitialized(self.proxy));
        }
        if caller != record.admin {
            warn!(
                proxy = %self.proxy,
                %caller,
                admin = %record.admin,
                "rejected repoint from unauthorized caller"
            );
            return Err(ProxyError::Unauthorized {
                caller,
                admin: record.admin,
            });
        }

        let receipt = self
            .client
            .submit_transaction(&TransactionCall {
                to: self.proxy,
                from: caller,
                call: ProxyCall::Repoint { new_implementation },
            })
            .await?;

        Ok(UpgradeRecord {
            proxy: self.proxy,
            from_implementation: record.current_implementation,
            to_implementation: new_implementation,
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
            timestamp: receipt.timestamp,
            initiator: caller,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use alloy_primitives::{Address, Bytes};
    use upgrade_common::backends::ChainClient;
    use upgrade_utils::mock_chain::MockChainClient;

    use super::ProxyController;
    use crate::errors::ProxyError;

    /// Publish a proxy account on a fresh mock chain
    async fn setup() -> (Arc<MockChainClient>, ProxyController<MockChainClient>) {
        let client = Arc::new(MockChainClient::new());
        let proxy = client
            .publish_bytecode(Bytes::from_static(&[0x60, 0x80]))
            .await
            .unwrap();
        let controller = ProxyController::new(client.clone(), proxy);
        (client, controller)
    }

    #[tokio::test]
    async fn test_read_record_unknown_address() {
        let client = Arc::new(MockChainClient::new());
        let controller = ProxyController::new(client, Address::repeat_byte(0x99));

        let err = controller.read_record().await.unwrap_err();
        assert!(matches!(err, ProxyError::ProxyNotFound(_)));
    }

    #[tokio::test]
    async fn test_initialize_is_one_way() {
        let (_, controller) = setup().await;
        let admin = Address::repeat_byte(0xaa);
        let v1 = Address::repeat_byte(0x01);
        let v2 = Address::repeat_byte(0x02);

        let record = controller.initialize(v1, admin).await.unwrap();
        assert!(record.initialized);
        assert_eq!(record.current_implementation, v1);

        // Re-entry fails regardless of the implementation argument
        for implementation in [v1, v2] {
            let err = controller.initialize(implementation, admin).await.unwrap_err();
            assert!(matches!(err, ProxyError::AlreadyInitialized(_)));
        }
    }

    #[tokio::test]
    async fn test_repoint_requires_initialization() {
        let (_, controller) = setup().await;

        let err = controller
            .repoint(Address::repeat_byte(0x02), Address::repeat_byte(0xaa))
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::NotInitialized(_)));
    }

    #[tokio::test]
    async fn test_repoint_by_non_admin_rejected_without_mutation() {
        let (client, controller) = setup().await;
        let admin = Address::repeat_byte(0xaa);
        let intruder = Address::repeat_byte(0xbb);
        let v1 = Address::repeat_byte(0x01);
        let v2 = Address::repeat_byte(0x02);

        controller.initialize(v1, admin).await.unwrap();

        let err = controller.repoint(v2, intruder).await.unwrap_err();
        assert_eq!(
            err,
            ProxyError::Unauthorized {
                caller: intruder,
                admin,
            }
        );
        assert_eq!(client.implementation_of(controller.address()), v1);
    }

    #[tokio::test]
    async fn test_repoint_moves_pointer_and_appends_history() {
        let (client, controller) = setup().await;
        let admin = Address::repeat_byte(0xaa);
        let v1 = Address::repeat_byte(0x01);
        let v2 = Address::repeat_byte(0x02);

        controller.initialize(v1, admin).await.unwrap();
        let record = controller.repoint(v2, admin).await.unwrap();

        assert_eq!(record.from_implementation, v1);
        assert_eq!(record.to_implementation, v2);
        assert_eq!(record.initiator, admin);
        assert_eq!(client.implementation_of(controller.address()), v2);
        assert_eq!(
            client.upgrade_history(controller.address()),
            vec![(Address::ZERO, v1), (v1, v2)],
        );
    }
}
