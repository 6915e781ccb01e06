//! Canned layouts and artifacts used by unit and integration tests.
//!
//! The fixtures model a staking contract across three versions: v2 grows the
//! layout by appended slots (a safe upgrade), v3 drops a slot (an unsafe
//! one).

use upgrade_common::types::{
    ContractKey, ImplementationArtifact, LayoutDescriptor, SlotType, StorageSlot,
};

/// The contract name shared by every staking fixture
pub const STAKING_CONTRACT: &str = "staking";

/// Deterministic pseudo-bytecode: an EVM-looking prelude followed by
/// seed-derived filler, so distinct versions hash to distinct content
/// addresses
pub fn pseudo_bytecode(seed: u8, len: usize) -> Vec<u8> {
    let mut bytecode = vec![0x60, 0x80, 0x60, 0x40, 0x52, seed];
    bytecode.extend((0..len).map(|i| (i as u8).wrapping_mul(seed).wrapping_add(seed)));
    bytecode
}

/// The v1 layout: owner, paused flag, total stake
pub fn base_layout() -> LayoutDescriptor {
    LayoutDescriptor::new(vec![
        StorageSlot {
            slot: 0,
            label: "owner".to_string(),
            ty: SlotType::Address,
        },
        StorageSlot {
            slot: 1,
            label: "paused".to_string(),
            ty: SlotType::Bool,
        },
        StorageSlot {
            slot: 2,
            label: "total_staked".to_string(),
            ty: SlotType::Uint { bits: 256 },
        },
    ])
}

/// The v2 layout: v1 plus an appended reward rate slot
pub fn appended_layout() -> LayoutDescriptor {
    let mut layout = base_layout();
    layout.slots.push(StorageSlot {
        slot: 3,
        label: "reward_rate".to_string(),
        ty: SlotType::Uint { bits: 256 },
    });
    layout
}

/// A layout that drops v1's trailing slot; upgrading to it must be rejected
pub fn truncated_layout() -> LayoutDescriptor {
    let mut layout = base_layout();
    layout.slots.pop();
    layout
}

/// The v1 staking artifact
pub fn staking_artifact_v1() -> ImplementationArtifact {
    ImplementationArtifact {
        key: ContractKey::new(STAKING_CONTRACT, "1.0.0"),
        bytecode: pseudo_bytecode(1, 64),
        layout: base_layout(),
    }
}

/// The v2 staking artifact: safely grown layout
pub fn staking_artifact_v2() -> ImplementationArtifact {
    ImplementationArtifact {
        key: ContractKey::new(STAKING_CONTRACT, "2.0.0"),
        bytecode: pseudo_bytecode(2, 64),
        layout: appended_layout(),
    }
}

/// The v3 staking artifact: drops a persisted slot, never deployable over v1
pub fn staking_artifact_v3() -> ImplementationArtifact {
    ImplementationArtifact {
        key: ContractKey::new(STAKING_CONTRACT, "3.0.0"),
        bytecode: pseudo_bytecode(3, 64),
        layout: truncated_layout(),
    }
}
