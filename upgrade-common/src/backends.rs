//! "Backends" representing functionality that is delegated to either a live
//! network client, or to an in-memory chain in tests.
//!
//! This abstraction exists primarily to enable mocks for testing.

use core::fmt::{self, Display, Formatter};

use alloy_primitives::{Address, Bytes, B256};

use crate::types::{TransactionCall, TransactionReceipt};

/// An error returned by a chain client backend
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientError {
    /// The network was unreachable, or confirmation polling timed out.
    ///
    /// Retryable at the caller's discretion.
    Network(String),
    /// The network accepted the request but rejected its content, e.g. a
    /// reverted transaction or undeployable bytecode.
    ///
    /// Not retryable; the input must change.
    Rejected(String),
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Network(s) => write!(f, "network error: {}", s),
            ClientError::Rejected(s) => write!(f, "request rejected: {}", s),
        }
    }
}

impl std::error::Error for ClientError {}

/// The network client capability the upgrade pipeline depends on.
///
/// The type that implements this trait either speaks JSON-RPC to a live
/// node, or applies transitions to an in-memory chain in a testing context.
/// Every method is a suspension point; no other operation in the pipeline
/// blocks.
#[allow(async_fn_in_trait)]
pub trait ChainClient: Send + Sync {
    /// Publish contract bytecode to the network, waiting for confirmation.
    ///
    /// Returns the address the code was published at.
    async fn publish_bytecode(&self, bytecode: Bytes) -> Result<Address, ClientError>;

    /// Submit a transaction and wait for its confirmed receipt.
    ///
    /// The transaction's effects commit atomically: a returned receipt means
    /// every state change the call implies is visible, and an error means
    /// none are.
    async fn submit_transaction(
        &self,
        call: &TransactionCall,
    ) -> Result<TransactionReceipt, ClientError>;

    /// Read a single word of contract storage
    async fn read_storage(&self, address: Address, slot: B256) -> Result<B256, ClientError>;

    /// The hash of the code published at an address, if any
    async fn get_code_hash(&self, address: Address) -> Result<Option<B256>, ClientError>;
}
