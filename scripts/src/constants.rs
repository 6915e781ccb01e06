//! Constants used in the deploy scripts

/// The bytecode of the bundled UUPS proxy contract, hex-encoded.
///
/// Published once per logical system by the first-deployment path; every
/// later upgrade reuses the proxy address this code was published at.
pub const PROXY_BYTECODE: &str = include_str!("../artifacts/uups_proxy.bin");

/// The number of confirmations to wait for before treating a transaction as
/// committed
pub const NUM_DEPLOY_CONFIRMATIONS: u64 = 1;

/// The number of seconds to poll for a transaction confirmation before
/// surfacing the network as unavailable
pub const TX_TIMEOUT_SECS: u64 = 60;

/// The default path of the `deployments.json` state file
pub const DEFAULT_DEPLOYMENTS_PATH: &str = "deployments.json";

/// The default directory holding implementation artifact files
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// The extension of an implementation artifact file
pub const ARTIFACT_EXTENSION: &str = "json";

/// The deployments key in the `deployments.json` file
pub const DEPLOYMENTS_KEY: &str = "deployments";

/// The proxy contract key in the `deployments.json` file
pub const PROXY_CONTRACT_KEY: &str = "proxy_contract";

/// The published-implementations key in the `deployments.json` file,
/// mapping bytecode content hashes to their deployed addresses
pub const IMPLEMENTATIONS_KEY: &str = "implementations";

/// The upgrade-history key in the `deployments.json` file
pub const UPGRADE_HISTORY_KEY: &str = "upgrade_history";
