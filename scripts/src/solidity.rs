//! Definitions of Solidity functions called during deployment

use alloy_primitives::Bytes;
use alloy_sol_types::{sol, SolCall};
use upgrade_common::types::ProxyCall;

sol! {
    function initialize(address implementation, address admin) external;
    function upgradeTo(address newImplementation) external;
}

/// Encode a proxy call to the calldata the proxy's upgrade surface expects
pub(crate) fn encode_proxy_call(call: &ProxyCall) -> Bytes {
    match *call {
        ProxyCall::Initialize {
            implementation,
            admin,
        } => initializeCall {
            implementation,
            admin,
        }
        .abi_encode()
        .into(),
        ProxyCall::Repoint { new_implementation } => upgradeToCall {
            newImplementation: new_implementation,
        }
        .abi_encode()
        .into(),
    }
}
