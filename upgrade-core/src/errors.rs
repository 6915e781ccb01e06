//! Definitions of errors that can occur during storage layout validation

use std::error::Error;
use std::fmt::{self, Display, Formatter};

use upgrade_common::types::SlotType;

/// An incompatibility between a previous implementation's storage layout and
/// a proposed replacement's.
///
/// Always fatal: a layout error means the new implementation would read
/// persisted state through the wrong types, and must be fixed in source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutError {
    /// The new layout declares fewer slots than the old one; a previously
    /// persisted slot would be orphaned
    Truncated {
        /// The number of slots the old layout declares
        old_len: usize,
        /// The number of slots the new layout declares
        new_len: usize,
    },
    /// An existing slot's declared index shifted between layouts
    Reordered {
        /// The position in declaration order at which the shift occurred
        position: usize,
        /// The slot index the old layout declares at that position
        old_slot: u64,
        /// The slot index the new layout declares at that position
        new_slot: u64,
    },
    /// An existing slot's type changed in a way that is not storage-compatible
    Incompatible {
        /// The slot index at which the types diverge
        slot: u64,
        /// The type the old layout declares at the slot
        old_ty: SlotType,
        /// The type the new layout declares at the slot
        new_ty: SlotType,
    },
}

impl Display for LayoutError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::Truncated { old_len, new_len } => write!(
                f,
                "layout truncated: {} slots declared where the previous implementation declares {}",
                new_len, old_len
            ),
            LayoutError::Reordered {
                position,
                old_slot,
                new_slot,
            } => write!(
                f,
                "slot at position {} moved from index {} to index {}",
                position, old_slot, new_slot
            ),
            LayoutError::Incompatible {
                slot,
                old_ty,
                new_ty,
            } => write!(
                f,
                "slot {} changed from {} to {}, which is not storage-compatible",
                slot, old_ty, new_ty
            ),
        }
    }
}

impl Error for LayoutError {}
