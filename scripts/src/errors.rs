//! Definitions of errors that can occur during the execution of the contract
//! management scripts

use std::error::Error;
use std::fmt::{self, Display, Formatter};

use alloy_primitives::Address;
use upgrade_common::backends::ClientError;
use upgrade_common::types::ContractKey;
use upgrade_core::errors::LayoutError;

/// Errors that can occur while publishing an implementation contract
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeployError {
    /// The network was unreachable or confirmation polling timed out.
    ///
    /// The caller may retry; the deployer itself never does.
    NetworkUnavailable(String),
    /// The artifact is not deployable as published code.
    ///
    /// Fatal: retrying cannot help, the artifact must be rebuilt.
    CompilationInvalid(String),
    /// Error reading or writing the deployments index file
    Index(String),
}

impl Display for DeployError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DeployError::NetworkUnavailable(s) => write!(f, "network unavailable: {}", s),
            DeployError::CompilationInvalid(s) => write!(f, "artifact not deployable: {}", s),
            DeployError::Index(s) => write!(f, "error accessing deployments index: {}", s),
        }
    }
}

impl Error for DeployError {}

impl From<ClientError> for DeployError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Network(s) => DeployError::NetworkUnavailable(s),
            ClientError::Rejected(s) => DeployError::CompilationInvalid(s),
        }
    }
}

/// Errors that can occur while interacting with the proxy contract
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProxyError {
    /// No code is published at the supposed proxy address
    ProxyNotFound(Address),
    /// `initialize` was called on a proxy that has already completed its
    /// one-way initialization
    AlreadyInitialized(Address),
    /// `repoint` was called on a proxy that has not been initialized
    NotInitialized(Address),
    /// The caller is not the proxy's admin; security-relevant and logged
    /// distinctly at the rejection site
    Unauthorized {
        /// The identity that attempted the call
        caller: Address,
        /// The identity actually authorized
        admin: Address,
    },
    /// The network was unreachable or confirmation polling timed out
    Network(String),
    /// The proxy rejected the transaction
    Rejected(String),
}

impl Display for ProxyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::ProxyNotFound(address) => {
                write!(f, "no proxy found at {:#x}", address)
            }
            ProxyError::AlreadyInitialized(address) => {
                write!(f, "proxy at {:#x} is already initialized", address)
            }
            ProxyError::NotInitialized(address) => {
                write!(f, "proxy at {:#x} is not initialized", address)
            }
            ProxyError::Unauthorized { caller, admin } => write!(
                f,
                "caller {:#x} is not the proxy admin {:#x}",
                caller, admin
            ),
            ProxyError::Network(s) => write!(f, "network unavailable: {}", s),
            ProxyError::Rejected(s) => write!(f, "proxy rejected transaction: {}", s),
        }
    }
}

impl Error for ProxyError {}

impl From<ClientError> for ProxyError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Network(s) => ProxyError::Network(s),
            ClientError::Rejected(s) => ProxyError::Rejected(s),
        }
    }
}

/// Errors that can occur while resolving implementation artifacts
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// No artifact is registered under the given key
    UnknownArtifact(ContractKey),
    /// The proxy points at an implementation this tool never published, so
    /// no prior layout is known to validate against
    UnknownImplementation(Address),
    /// Error parsing an implementation artifact file
    ArtifactParsing(String),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::UnknownArtifact(key) => {
                write!(f, "no artifact registered for {}", key)
            }
            RegistryError::UnknownImplementation(address) => write!(
                f,
                "current implementation {:#x} is not a known artifact deployment",
                address
            ),
            RegistryError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
        }
    }
}

impl Error for RegistryError {}

/// An orchestration failure, tagged with the component it originated in so
/// operators can tell an unsafe layout from a down network from a missing
/// authorization
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpgradeError {
    /// The new implementation's storage layout is incompatible
    Layout(LayoutError),
    /// Publishing the implementation failed
    Deploy(DeployError),
    /// Interacting with the proxy failed
    Proxy(ProxyError),
    /// Resolving an artifact failed
    Registry(RegistryError),
}

impl Display for UpgradeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            UpgradeError::Layout(e) => write!(f, "layout validation failed: {}", e),
            UpgradeError::Deploy(e) => write!(f, "deployment failed: {}", e),
            UpgradeError::Proxy(e) => write!(f, "proxy interaction failed: {}", e),
            UpgradeError::Registry(e) => write!(f, "artifact resolution failed: {}", e),
        }
    }
}

impl Error for UpgradeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            UpgradeError::Layout(e) => Some(e),
            UpgradeError::Deploy(e) => Some(e),
            UpgradeError::Proxy(e) => Some(e),
            UpgradeError::Registry(e) => Some(e),
        }
    }
}

impl From<LayoutError> for UpgradeError {
    fn from(e: LayoutError) -> Self {
        UpgradeError::Layout(e)
    }
}

impl From<DeployError> for UpgradeError {
    fn from(e: DeployError) -> Self {
        UpgradeError::Deploy(e)
    }
}

impl From<ProxyError> for UpgradeError {
    fn from(e: ProxyError) -> Self {
        UpgradeError::Proxy(e)
    }
}

impl From<RegistryError> for UpgradeError {
    fn from(e: RegistryError) -> Self {
        UpgradeError::Registry(e)
    }
}

/// Errors that can occur during the execution of the contract management
/// scripts
#[derive(Debug)]
pub enum ScriptError {
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error parsing a command line argument
    InvalidArguments(String),
    /// An orchestration failure
    Upgrade(UpgradeError),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::ClientInitialization(s) => {
                write!(f, "error initializing client: {}", s)
            }
            ScriptError::InvalidArguments(s) => write!(f, "invalid arguments: {}", s),
            ScriptError::Upgrade(e) => write!(f, "{}", e),
        }
    }
}

impl Error for ScriptError {}

impl From<UpgradeError> for ScriptError {
    fn from(e: UpgradeError) -> Self {
        ScriptError::Upgrade(e)
    }
}

impl From<DeployError> for ScriptError {
    fn from(e: DeployError) -> Self {
        ScriptError::Upgrade(UpgradeError::Deploy(e))
    }
}

impl From<ProxyError> for ScriptError {
    fn from(e: ProxyError) -> Self {
        ScriptError::Upgrade(UpgradeError::Proxy(e))
    }
}

impl From<RegistryError> for ScriptError {
    fn from(e: RegistryError) -> Self {
        ScriptError::Upgrade(UpgradeError::Registry(e))
    }
}
