//! Utilities for the deploy scripts.

use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use alloy::network::EthereumWallet;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use alloy_primitives::{Address, Bytes, B256};
use json::JsonValue;
use upgrade_common::types::{ContractKey, DeployedImplementation, UpgradeRecord};

use crate::client::HttpChainClient;
use crate::constants::{
    DEPLOYMENTS_KEY, IMPLEMENTATIONS_KEY, PROXY_BYTECODE, PROXY_CONTRACT_KEY, UPGRADE_HISTORY_KEY,
};
use crate::errors::{DeployError, ScriptError};

/// Set up the chain client with which to run the scripts, from the private
/// key and RPC URL supplied on the command line
pub fn setup_client(priv_key: &str, rpc_url: &str) -> Result<Arc<HttpChainClient>, ScriptError> {
    let signer = PrivateKeySigner::from_str(priv_key)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let sender = signer.address();

    let url = Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .on_http(url);

    Ok(Arc::new(HttpChainClient::new(provider.erased(), sender)))
}

/// Decode the bundled proxy bytecode
pub fn proxy_bytecode() -> Result<Bytes, DeployError> {
    hex::decode(PROXY_BYTECODE.trim())
        .map(Bytes::from)
        .map_err(|e| {
            DeployError::CompilationInvalid(format!("bundled proxy bytecode is not valid hex: {}", e))
        })
}

/// The durable `deployments.json` state file.
///
/// Records the proxy address for the logical system, the content-addressed
/// index of published implementations, and the append-only upgrade history.
#[derive(Clone)]
pub struct DeploymentsFile {
    /// The path of the state file
    path: String,
}

impl DeploymentsFile {
    /// Wrap the state file at the given path
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Parse the state file, treating a missing file as empty state
    fn read(&self) -> Result<JsonValue, DeployError> {
        if !Path::new(&self.path).exists() {
            return Ok(JsonValue::new_object());
        }

        let contents =
            fs::read_to_string(&self.path).map_err(|e| DeployError::Index(e.to_string()))?;

        json::parse(&contents).map_err(|e| DeployError::Index(e.to_string()))
    }

    /// Write the state file back out
    fn write(&self, parsed: &JsonValue) -> Result<(), DeployError> {
        fs::write(&self.path, json::stringify_pretty(parsed.clone(), 4))
            .map_err(|e| DeployError::Index(e.to_string()))
    }

    /// The address a bytecode content hash was published at, if recorded
    pub fn implementation_by_hash(&self, code_hash: B256) -> Result<Option<Address>, DeployError> {
        let parsed = self.read()?;
        let hash_key = format!("{:#x}", code_hash);
        let entry = &parsed[DEPLOYMENTS_KEY][IMPLEMENTATIONS_KEY][hash_key.as_str()];

        match entry["address"].as_str() {
            Some(address) => Address::from_str(address)
                .map(Some)
                .map_err(|e| DeployError::Index(format!("corrupt deployments file: {}", e))),
            None => Ok(None),
        }
    }

    /// Record a published implementation under its content hash
    pub fn record_implementation(
        &self,
        deployed: &DeployedImplementation,
    ) -> Result<(), DeployError> {
        let mut parsed = self.read()?;

        let mut entry = JsonValue::new_object();
        entry["address"] = format!("{:#x}", deployed.address).into();
        entry["name"] = deployed.key.name.clone().into();
        entry["version"] = deployed.key.version.clone().into();

        let hash_key = format!("{:#x}", deployed.code_hash);
        parsed[DEPLOYMENTS_KEY][IMPLEMENTATIONS_KEY][hash_key.as_str()] = entry;

        self.write(&parsed)
    }

    /// The registry key of the artifact published at the given address, if
    /// this tool published it
    pub fn key_for_implementation(
        &self,
        address: Address,
    ) -> Result<Option<ContractKey>, DeployError> {
        let parsed = self.read()?;
        let wanted = format!("{:#x}", address);

        for (_, entry) in parsed[DEPLOYMENTS_KEY][IMPLEMENTATIONS_KEY].entries() {
            if entry["address"].as_str() == Some(wanted.as_str()) {
                match (entry["name"].as_str(), entry["version"].as_str()) {
                    (Some(name), Some(version)) => {
                        return Ok(Some(ContractKey::new(name, version)))
                    }
                    _ => {
                        return Err(DeployError::Index(
                            "corrupt deployments file: implementation entry missing name/version"
                                .to_string(),
                        ))
                    }
                }
            }
        }

        Ok(None)
    }

    /// The recorded proxy address for the logical system, if one exists
    pub fn proxy_address(&self) -> Result<Option<Address>, DeployError> {
        let parsed = self.read()?;

        match parsed[DEPLOYMENTS_KEY][PROXY_CONTRACT_KEY].as_str() {
            Some(address) => Address::from_str(address)
                .map(Some)
                .map_err(|e| DeployError::Index(format!("corrupt deployments file: {}", e))),
            None => Ok(None),
        }
    }

    /// Record the proxy address for the logical system
    pub fn record_proxy(&self, address: Address) -> Result<(), DeployError> {
        let mut parsed = self.read()?;
        parsed[DEPLOYMENTS_KEY][PROXY_CONTRACT_KEY] = format!("{:#x}", address).into();
        self.write(&parsed)
    }

    /// Append a committed upgrade to the durable history
    pub fn append_upgrade_record(&self, record: &UpgradeRecord) -> Result<(), DeployError> {
        let mut parsed = self.read()?;

        let mut entry = JsonValue::new_object();
        entry["proxy"] = format!("{:#x}", record.proxy).into();
        entry["from_implementation"] = format!("{:#x}", record.from_implementation).into();
        entry["to_implementation"] = format!("{:#x}", record.to_implementation).into();
        entry["tx_hash"] = format!("{:#x}", record.tx_hash).into();
        entry["block_number"] = record.block_number.into();
        entry["timestamp"] = record.timestamp.into();
        entry["initiator"] = format!("{:#x}", record.initiator).into();

        if !parsed[UPGRADE_HISTORY_KEY].is_array() {
            parsed[UPGRADE_HISTORY_KEY] = JsonValue::new_array();
        }
        parsed[UPGRADE_HISTORY_KEY]
            .push(entry)
            .map_err(|e| DeployError::Index(e.to_string()))?;

        self.write(&parsed)
    }

    /// The recorded upgrade history, oldest first
    pub fn upgrade_history(&self) -> Result<Vec<UpgradeRecord>, DeployError> {
        let parsed = self.read()?;
        let mut records = Vec::new();

        for entry in parsed[UPGRADE_HISTORY_KEY].members() {
            records.push(parse_history_entry(entry)?);
        }

        Ok(records)
    }
}

/// Parse a single history entry from the deployments file
fn parse_history_entry(entry: &JsonValue) -> Result<UpgradeRecord, DeployError> {
    /// Shorthand for the corrupt-entry error
    fn corrupt(what: &str) -> DeployError {
        DeployError::Index(format!("corrupt deployments file: bad history {}", what))
    }

    let address = |field: &str| -> Result<Address, DeployError> {
        entry[field]
            .as_str()
            .and_then(|s| Address::from_str(s).ok())
            .ok_or_else(|| corrupt(field))
    };

    Ok(UpgradeRecord {
        proxy: address("proxy")?,
        from_implementation: address("from_implementation")?,
        to_implementation: address("to_implementation")?,
        tx_hash: entry["tx_hash"]
            .as_str()
            .and_then(|s| B256::from_str(s).ok())
            .ok_or_else(|| corrupt("tx_hash"))?,
        block_number: entry["block_number"]
            .as_u64()
            .ok_or_else(|| corrupt("block_number"))?,
        timestamp: entry["timestamp"]
            .as_u64()
            .ok_or_else(|| corrupt("timestamp"))?,
        initiator: address("initiator")?,
    })
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, B256};
    use upgrade_common::types::{ContractKey, DeployedImplementation, UpgradeRecord};

    use super::DeploymentsFile;

    /// A deployments file at a unique temp path
    fn temp_deployments() -> DeploymentsFile {
        let path = std::env::temp_dir().join(format!("deployments-{}.json", rand::random::<u64>()));
        DeploymentsFile::new(path.to_string_lossy().to_string())
    }

    #[test]
    fn test_implementation_round_trip() {
        let file = temp_deployments();
        let deployed = DeployedImplementation {
            key: ContractKey::new("staking", "2.0.0"),
            address: Address::repeat_byte(0x11),
            code_hash: B256::repeat_byte(0x22),
        };

        assert_eq!(file.implementation_by_hash(deployed.code_hash).unwrap(), None);

        file.record_implementation(&deployed).unwrap();
        assert_eq!(
            file.implementation_by_hash(deployed.code_hash).unwrap(),
            Some(deployed.address),
        );
        assert_eq!(
            file.key_for_implementation(deployed.address).unwrap(),
            Some(deployed.key),
        );
        assert_eq!(
            file.key_for_implementation(Address::repeat_byte(0x33)).unwrap(),
            None,
        );
    }

    #[test]
    fn test_proxy_round_trip() {
        let file = temp_deployments();
        assert_eq!(file.proxy_address().unwrap(), None);

        let proxy = Address::repeat_byte(0x44);
        file.record_proxy(proxy).unwrap();
        assert_eq!(file.proxy_address().unwrap(), Some(proxy));
    }

    #[test]
    fn test_history_appends_in_order() {
        let file = temp_deployments();
        let record = |n: u8| UpgradeRecord {
            proxy: Address::repeat_byte(0x01),
            from_implementation: Address::repeat_byte(n),
            to_implementation: Address::repeat_byte(n + 1),
            tx_hash: B256::repeat_byte(n),
            block_number: u64::from(n),
            timestamp: 1_700_000_000 + u64::from(n),
            initiator: Address::repeat_byte(0xaa),
        };

        file.append_upgrade_record(&record(1)).unwrap();
        file.append_upgrade_record(&record(2)).unwrap();

        let history = file.upgrade_history().unwrap();
        assert_eq!(history, vec![record(1), record(2)]);
    }
}
