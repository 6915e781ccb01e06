//! An in-memory chain client for testing the upgrade pipeline.
//!
//! The mock applies each transaction atomically under a single lock, the way
//! a real chain applies a transaction in one state transition, and enforces
//! the proxy contract's own rules (initialization one-way, admin-only
//! repoint) so that tests exercise the same reverts a live proxy would
//! produce.

use std::collections::HashMap;
use std::sync::Mutex;

use alloy_primitives::{keccak256, Address, Bytes, B256};
use upgrade_common::backends::{ChainClient, ClientError};
use upgrade_common::constants::{
    ADMIN_STORAGE_SLOT, IMPLEMENTATION_STORAGE_SLOT, INITIALIZED_STORAGE_SLOT,
};
use upgrade_common::types::{ProxyCall, TransactionCall, TransactionReceipt};

/// The timestamp of the mock chain's genesis block
const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

/// The mock chain's fixed block time, in seconds
const BLOCK_TIME: u64 = 12;

/// A single account on the mock chain
struct MockAccount {
    /// The hash of the code published at the account
    code_hash: B256,
    /// The account's storage words
    storage: HashMap<B256, B256>,
    /// The account's upgrade history, appended atomically with each pointer
    /// change as `(old_implementation, new_implementation)`
    history: Vec<(Address, Address)>,
}

/// The mutable state of the mock chain
struct MockChainState {
    /// The accounts holding published code
    accounts: HashMap<Address, MockAccount>,
    /// The current block number
    block_number: u64,
    /// Counter from which fresh account addresses are derived
    next_account: u64,
    /// Counter from which transaction hashes are derived
    next_tx: u64,
    /// The number of bytecode publishes the chain has accepted
    publishes: u64,
    /// When set, every network operation fails as unreachable
    offline: bool,
}

/// An in-memory [`ChainClient`] with deterministic addresses, hashes, and
/// block timestamps
pub struct MockChainClient {
    /// The chain state, locked for the duration of each state transition
    state: Mutex<MockChainState>,
}

impl Default for MockChainClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChainClient {
    /// Create a fresh, empty chain
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockChainState {
                accounts: HashMap::new(),
                block_number: 0,
                next_account: 0,
                next_tx: 0,
                publishes: 0,
                offline: false,
            }),
        }
    }

    /// Simulate the network becoming (un)reachable
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// The number of bytecode publishes the chain has accepted
    pub fn publish_count(&self) -> u64 {
        self.lock().publishes
    }

    /// The upgrade history the given proxy has committed, oldest first
    pub fn upgrade_history(&self, proxy: Address) -> Vec<(Address, Address)> {
        self.lock()
            .accounts
            .get(&proxy)
            .map(|account| account.history.clone())
            .unwrap_or_default()
    }

    /// Read a storage word synchronously, for test assertions
    pub fn storage_word(&self, address: Address, slot: B256) -> B256 {
        self.lock()
            .accounts
            .get(&address)
            .and_then(|account| account.storage.get(&slot))
            .copied()
            .unwrap_or(B256::ZERO)
    }

    /// The implementation address the given proxy currently points at
    pub fn implementation_of(&self, proxy: Address) -> Address {
        Address::from_word(self.storage_word(proxy, IMPLEMENTATION_STORAGE_SLOT))
    }

    /// Lock the chain state
    fn lock(&self) -> std::sync::MutexGuard<'_, MockChainState> {
        self.state.lock().expect("mock chain lock poisoned")
    }
}

impl MockChainState {
    /// Derive a fresh deterministic account address
    fn alloc_address(&mut self) -> Address {
        self.next_account += 1;
        Address::from_word(keccak256(self.next_account.to_be_bytes()))
    }

    /// Seal a block: advance the block number and clock, and derive the
    /// transaction hash of the block's single transaction
    fn seal_block(&mut self) -> TransactionReceipt {
        self.block_number += 1;
        self.next_tx += 1;
        TransactionReceipt {
            tx_hash: keccak256(self.next_tx.to_be_bytes()),
            block_number: self.block_number,
            timestamp: GENESIS_TIMESTAMP + self.block_number * BLOCK_TIME,
        }
    }

    /// Fail if the chain is offline
    fn check_online(&self) -> Result<(), ClientError> {
        if self.offline {
            Err(ClientError::Network("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

impl ChainClient for MockChainClient {
    async fn publish_bytecode(&self, bytecode: Bytes) -> Result<Address, ClientError> {
        let mut state = self.lock();
        state.check_online()?;

        if bytecode.is_empty() {
            return Err(ClientError::Rejected(
                "cannot publish empty bytecode".to_string(),
            ));
        }

        let address = state.alloc_address();
        state.accounts.insert(
            address,
            MockAccount {
                code_hash: keccak256(&bytecode),
                storage: HashMap::new(),
                history: Vec::new(),
            },
        );
        state.publishes += 1;
        state.seal_block();

        Ok(address)
    }

    async fn submit_transaction(
        &self,
        call: &TransactionCall,
    ) -> Result<TransactionReceipt, ClientError> {
        let mut state = self.lock();
        state.check_online()?;

        let account = state
            .accounts
            .get_mut(&call.to)
            .ok_or_else(|| ClientError::Rejected("no code at call target".to_string()))?;

        // Apply the call's full effect while holding the chain lock: the
        // pointer change and the history append are one transition
        match call.call {
            ProxyCall::Initialize {
                implementation,
                admin,
            } => {
                if account
                    .storage
                    .get(&INITIALIZED_STORAGE_SLOT)
                    .copied()
                    .unwrap_or(B256::ZERO)
                    != B256::ZERO
                {
                    return Err(ClientError::Rejected(
                        "proxy already initialized".to_string(),
                    ));
                }

                account
                    .storage
                    .insert(IMPLEMENTATION_STORAGE_SLOT, implementation.into_word());
                account.storage.insert(ADMIN_STORAGE_SLOT, admin.into_word());
                account
                    .storage
                    .insert(INITIALIZED_STORAGE_SLOT, B256::with_last_byte(1));
                account.history.push((Address::ZERO, implementation));
            }
            ProxyCall::Repoint { new_implementation } => {
                if account
                    .storage
                    .get(&INITIALIZED_STORAGE_SLOT)
                    .copied()
                    .unwrap_or(B256::ZERO)
                    == B256::ZERO
                {
                    return Err(ClientError::Rejected("proxy not initialized".to_string()));
                }

                let admin = Address::from_word(
                    account
                        .storage
                        .get(&ADMIN_STORAGE_SLOT)
                        .copied()
                        .unwrap_or(B256::ZERO),
                );
                if call.from != admin {
                    return Err(ClientError::Rejected(
                        "caller is not the proxy admin".to_string(),
                    ));
                }

                let old_implementation = Address::from_word(
                    account
                        .storage
                        .get(&IMPLEMENTATION_STORAGE_SLOT)
                        .copied()
                        .unwrap_or(B256::ZERO),
                );
                account
                    .storage
                    .insert(IMPLEMENTATION_STORAGE_SLOT, new_implementation.into_word());
                account.history.push((old_implementation, new_implementation));
            }
        }

        Ok(state.seal_block())
    }

    async fn read_storage(&self, address: Address, slot: B256) -> Result<B256, ClientError> {
        let state = self.lock();
        state.check_online()?;

        Ok(state
            .accounts
            .get(&address)
            .and_then(|account| account.storage.get(&slot))
            .copied()
            .unwrap_or(B256::ZERO))
    }

    async fn get_code_hash(&self, address: Address) -> Result<Option<B256>, ClientError> {
        let state = self.lock();
        state.check_online()?;

        Ok(state.accounts.get(&address).map(|account| account.code_hash))
    }
}
