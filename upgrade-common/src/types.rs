//! Common types used throughout the upgrade pipeline.

use core::fmt::{self, Display};
use core::str::FromStr;

use alloy_primitives::{keccak256, Address, B256};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

// ------------------
// | Storage layout |
// ------------------

/// The type of a value held in a single region of contract storage.
///
/// Sizes are the abstract byte footprint of the type as declared, which is
/// what layout compatibility is judged against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlotType {
    /// A boolean flag
    Bool,
    /// An unsigned integer of the given bit width
    Uint {
        /// The declared bit width, a multiple of 8 up to 256
        bits: u16,
    },
    /// A signed integer of the given bit width
    Int {
        /// The declared bit width, a multiple of 8 up to 256
        bits: u16,
    },
    /// A contract or account address
    Address,
    /// A fixed-length byte string, e.g. `bytes32`
    FixedBytes {
        /// The declared byte length
        len: u8,
    },
    /// A fixed-length array of a single element type
    FixedArray {
        /// The element type
        elem: Box<SlotType>,
        /// The number of elements
        len: u32,
    },
    /// A struct, flattened to its ordered field types
    Struct {
        /// The ordered field types
        fields: Vec<SlotType>,
    },
}

impl SlotType {
    /// The byte footprint of the type as declared
    pub fn size(&self) -> u64 {
        match self {
            SlotType::Bool => 1,
            SlotType::Uint { bits } | SlotType::Int { bits } => u64::from(*bits) / 8,
            SlotType::Address => 20,
            SlotType::FixedBytes { len } => u64::from(*len),
            SlotType::FixedArray { elem, len } => elem.size() * u64::from(*len),
            SlotType::Struct { fields } => fields.iter().map(SlotType::size).sum(),
        }
    }
}

impl Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotType::Bool => write!(f, "bool"),
            SlotType::Uint { bits } => write!(f, "uint{}", bits),
            SlotType::Int { bits } => write!(f, "int{}", bits),
            SlotType::Address => write!(f, "address"),
            SlotType::FixedBytes { len } => write!(f, "bytes{}", len),
            SlotType::FixedArray { elem, len } => write!(f, "{}[{}]", elem, len),
            SlotType::Struct { fields } => {
                write!(f, "struct(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", field)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A single entry in a contract's declared storage layout
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSlot {
    /// The declared slot index
    pub slot: u64,
    /// The source-level name of the state variable
    pub label: String,
    /// The type held at the slot
    pub ty: SlotType,
}

/// The ordered sequence of storage slots declared by an implementation
/// contract.
///
/// Order is declaration order; compatibility across upgrades is judged
/// position-by-position against the previous implementation's descriptor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutDescriptor {
    /// The declared slots, in declaration order
    pub slots: Vec<StorageSlot>,
}

impl LayoutDescriptor {
    /// Construct a descriptor from its ordered slots
    pub fn new(slots: Vec<StorageSlot>) -> Self {
        Self { slots }
    }

    /// The number of declared slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the layout declares no slots
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

// -------------
// | Artifacts |
// -------------

/// The typed registry key identifying an implementation artifact by
/// name & version
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractKey {
    /// The contract name
    pub name: String,
    /// The contract version marker
    pub version: String,
}

impl ContractKey {
    /// Construct a key from its parts
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl Display for ContractKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// The error returned when parsing a malformed `name@version` contract key
#[derive(Debug)]
pub struct InvalidContractKey(
    /// The offending input
    pub String,
);

impl Display for InvalidContractKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid contract key `{}`, expected `name@version`", self.0)
    }
}

impl std::error::Error for InvalidContractKey {}

impl FromStr for ContractKey {
    type Err = InvalidContractKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('@') {
            Some((name, version)) if !name.is_empty() && !version.is_empty() => {
                Ok(Self::new(name, version))
            }
            _ => Err(InvalidContractKey(s.to_string())),
        }
    }
}

/// A compiled implementation contract, as supplied by the artifact source.
///
/// Immutable once published to the network; an upgrade always produces a new
/// artifact rather than mutating an old one.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementationArtifact {
    /// The registry key of the artifact
    #[serde(flatten)]
    pub key: ContractKey,
    /// The deployable bytecode
    #[serde_as(as = "serde_with::hex::Hex")]
    pub bytecode: Vec<u8>,
    /// The declared storage layout of the implementation
    pub layout: LayoutDescriptor,
}

impl ImplementationArtifact {
    /// The content address of the artifact's bytecode
    pub fn code_hash(&self) -> B256 {
        keccak256(&self.bytecode)
    }
}

/// A successfully published implementation contract
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployedImplementation {
    /// The registry key of the published artifact
    pub key: ContractKey,
    /// The address the implementation was published at
    pub address: Address,
    /// The content address of the published bytecode
    pub code_hash: B256,
}

// ---------------
// | Proxy state |
// ---------------

/// The proxy's persistent record, as read back from network state.
///
/// The record is mutated only through the proxy controller's
/// initialize/repoint transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProxyRecord {
    /// The proxy's own address
    pub address: Address,
    /// The implementation the proxy currently delegates to
    pub current_implementation: Address,
    /// Whether the proxy has been initialized
    pub initialized: bool,
    /// The identity authorized to repoint the proxy
    pub admin: Address,
}

impl ProxyRecord {
    /// Whether the proxy has completed its one-way transition out of the
    /// uninitialized state
    pub fn is_active(&self) -> bool {
        self.initialized
    }
}

/// An append-only audit entry recording a committed pointer change
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeRecord {
    /// The proxy whose pointer changed
    pub proxy: Address,
    /// The implementation the proxy pointed at before the change
    pub from_implementation: Address,
    /// The implementation the proxy points at after the change
    pub to_implementation: Address,
    /// The hash of the transaction that committed the change
    pub tx_hash: B256,
    /// The block in which the change committed
    pub block_number: u64,
    /// The timestamp at which the change committed
    pub timestamp: u64,
    /// The identity that initiated the change
    pub initiator: Address,
}

// ----------------
// | Transactions |
// ----------------

/// A call against the proxy's sanctioned mutation surface
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProxyCall {
    /// The one-way transition out of the uninitialized state: set the
    /// implementation pointer, the admin, and the initialized flag
    Initialize {
        /// The implementation to point the fresh proxy at
        implementation: Address,
        /// The identity to authorize for future repoints
        admin: Address,
    },
    /// The upgrade transition: atomically move the implementation pointer
    /// and append the upgrade history entry
    Repoint {
        /// The implementation to repoint the proxy at
        new_implementation: Address,
    },
}

/// A transaction submitted through the chain client
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransactionCall {
    /// The contract the call is addressed to
    pub to: Address,
    /// The identity submitting the call
    pub from: Address,
    /// The proxy call being made
    pub call: ProxyCall,
}

/// The receipt of a confirmed transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransactionReceipt {
    /// The transaction hash
    pub tx_hash: B256,
    /// The block the transaction was included in
    pub block_number: u64,
    /// The timestamp of the including block
    pub timestamp: u64,
}
