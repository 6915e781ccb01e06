//! The storage layout validator.
//!
//! Compares a proposed implementation's declared storage layout against the
//! layout of the implementation it replaces, position by position. An upgrade
//! that passes validation can read every slot the previous implementation
//! persisted; one that fails would silently corrupt state and is rejected
//! before anything touches the network.

use upgrade_common::types::{LayoutDescriptor, SlotType};

use crate::errors::LayoutError;

/// Validate a proposed layout against the layout it replaces.
///
/// `old` is absent for a first deployment, in which case validation
/// trivially succeeds. Slots appended beyond the old layout's length are
/// always permitted; every pre-existing position must keep its declared
/// slot index and hold a storage-compatible type.
pub fn validate(old: Option<&LayoutDescriptor>, new: &LayoutDescriptor) -> Result<(), LayoutError> {
    let old = match old {
        Some(old) => old,
        None => return Ok(()),
    };

    if new.len() < old.len() {
        return Err(LayoutError::Truncated {
            old_len: old.len(),
            new_len: new.len(),
        });
    }

    for (position, (old_slot, new_slot)) in old.slots.iter().zip(new.slots.iter()).enumerate() {
        if old_slot.slot != new_slot.slot {
            return Err(LayoutError::Reordered {
                position,
                old_slot: old_slot.slot,
                new_slot: new_slot.slot,
            });
        }

        if !is_compatible(&old_slot.ty, &new_slot.ty) {
            return Err(LayoutError::Incompatible {
                slot: old_slot.slot,
                old_ty: old_slot.ty.clone(),
                new_ty: new_slot.ty.clone(),
            });
        }
    }

    Ok(())
}

/// Whether `new` may occupy a slot previously declared as `old` without
/// reinterpreting persisted bytes.
///
/// Identical types are compatible, as are same-size aggregates whose
/// elements are themselves compatible, and the allowlisted widenings of
/// [`is_allowlisted_widening`].
fn is_compatible(old: &SlotType, new: &SlotType) -> bool {
    if old == new || is_allowlisted_widening(old, new) {
        return true;
    }

    match (old, new) {
        (
            SlotType::FixedArray {
                elem: old_elem,
                len: old_len,
            },
            SlotType::FixedArray {
                elem: new_elem,
                len: new_len,
            },
        ) => old_len == new_len && is_compatible(old_elem, new_elem),
        (
            SlotType::Struct { fields: old_fields },
            SlotType::Struct { fields: new_fields },
        ) => {
            old_fields.len() == new_fields.len()
                && old.size() == new.size()
                && old_fields
                    .iter()
                    .zip(new_fields.iter())
                    .all(|(o, n)| is_compatible(o, n))
        }
        _ => false,
    }
}

/// The explicit widening allowlist: integers may change signedness at the
/// same bit width, and a bool may widen to a uint8. Anything that changes a
/// type's byte footprint changes slot packing and is rejected.
fn is_allowlisted_widening(old: &SlotType, new: &SlotType) -> bool {
    match (old, new) {
        (SlotType::Uint { bits: old_bits }, SlotType::Int { bits: new_bits })
        | (SlotType::Int { bits: old_bits }, SlotType::Uint { bits: new_bits }) => {
            old_bits == new_bits
        }
        (SlotType::Bool, SlotType::Uint { bits: 8 }) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use upgrade_common::types::{LayoutDescriptor, SlotType, StorageSlot};

    use super::validate;
    use crate::errors::LayoutError;

    /// Build a descriptor assigning the given types to consecutive slots
    fn layout_of(types: Vec<SlotType>) -> LayoutDescriptor {
        let slots = types
            .into_iter()
            .enumerate()
            .map(|(i, ty)| StorageSlot {
                slot: i as u64,
                label: format!("var{}", i),
                ty,
            })
            .collect();
        LayoutDescriptor::new(slots)
    }

    /// A representative starting layout: owner, paused flag, total stake
    fn base_layout() -> LayoutDescriptor {
        layout_of(vec![
            SlotType::Address,
            SlotType::Bool,
            SlotType::Uint { bits: 256 },
        ])
    }

    #[test]
    fn test_first_deployment_always_validates() {
        assert!(validate(None, &base_layout()).is_ok());
        assert!(validate(None, &layout_of(vec![])).is_ok());
    }

    #[test]
    fn test_identical_layout_validates() {
        assert!(validate(Some(&base_layout()), &base_layout()).is_ok());
    }

    #[test]
    fn test_appended_slots_validate() {
        let mut new = base_layout();
        new.slots.push(StorageSlot {
            slot: 3,
            label: "reward_rate".to_string(),
            ty: SlotType::Uint { bits: 256 },
        });
        new.slots.push(StorageSlot {
            slot: 4,
            label: "reward_token".to_string(),
            ty: SlotType::Address,
        });

        assert!(validate(Some(&base_layout()), &new).is_ok());
    }

    #[test]
    fn test_removed_trailing_slot_fails_truncated() {
        let mut new = base_layout();
        new.slots.pop();

        let err = validate(Some(&base_layout()), &new).unwrap_err();
        assert_eq!(
            err,
            LayoutError::Truncated {
                old_len: 3,
                new_len: 2,
            }
        );
    }

    #[test]
    fn test_removed_middle_slot_fails() {
        // Removing the middle slot shifts the later declarations down, and an
        // appended slot restores the length, so this must fail on content
        let new = layout_of(vec![
            SlotType::Address,
            SlotType::Uint { bits: 256 },
            SlotType::Uint { bits: 256 },
        ]);

        assert!(validate(Some(&base_layout()), &new).is_err());
    }

    #[test]
    fn test_shifted_slot_index_fails_reordered() {
        let mut new = base_layout();
        new.slots[1].slot = 5;

        let err = validate(Some(&base_layout()), &new).unwrap_err();
        assert_eq!(
            err,
            LayoutError::Reordered {
                position: 1,
                old_slot: 1,
                new_slot: 5,
            }
        );
    }

    #[test]
    fn test_retyped_slot_fails_incompatible() {
        let mut new = base_layout();
        new.slots[2].ty = SlotType::Address;

        let err = validate(Some(&base_layout()), &new).unwrap_err();
        match err {
            LayoutError::Incompatible { slot, .. } => assert_eq!(slot, 2),
            other => panic!("expected Incompatible, got {:?}", other),
        }
    }

    #[test]
    fn test_same_width_signedness_change_is_allowlisted() {
        let old = layout_of(vec![SlotType::Uint { bits: 128 }]);
        let new = layout_of(vec![SlotType::Int { bits: 128 }]);
        assert!(validate(Some(&old), &new).is_ok());
        assert!(validate(Some(&new), &old).is_ok());
    }

    #[test]
    fn test_integer_width_change_fails() {
        let old = layout_of(vec![SlotType::Uint { bits: 128 }]);
        let new = layout_of(vec![SlotType::Uint { bits: 256 }]);
        assert!(validate(Some(&old), &new).is_err());
    }

    #[test]
    fn test_bool_widens_to_uint8_only() {
        let old = layout_of(vec![SlotType::Bool]);
        let as_uint8 = layout_of(vec![SlotType::Uint { bits: 8 }]);
        let as_uint16 = layout_of(vec![SlotType::Uint { bits: 16 }]);

        assert!(validate(Some(&old), &as_uint8).is_ok());
        assert!(validate(Some(&old), &as_uint16).is_err());
        // The widening is one-way
        assert!(validate(Some(&as_uint8), &old).is_err());
    }

    #[test]
    fn test_aggregate_compatibility() {
        let old = layout_of(vec![SlotType::FixedArray {
            elem: Box::new(SlotType::Uint { bits: 64 }),
            len: 4,
        }]);
        // Same length, element widened within the allowlist
        let signedness_changed = layout_of(vec![SlotType::FixedArray {
            elem: Box::new(SlotType::Int { bits: 64 }),
            len: 4,
        }]);
        // Same total size, different shape
        let reshaped = layout_of(vec![SlotType::FixedArray {
            elem: Box::new(SlotType::Uint { bits: 128 }),
            len: 2,
        }]);

        assert!(validate(Some(&old), &signedness_changed).is_ok());
        assert!(validate(Some(&old), &reshaped).is_err());
    }

    #[test]
    fn test_struct_compatibility() {
        let old = layout_of(vec![SlotType::Struct {
            fields: vec![SlotType::Address, SlotType::Uint { bits: 96 }],
        }]);
        let signedness_changed = layout_of(vec![SlotType::Struct {
            fields: vec![SlotType::Address, SlotType::Int { bits: 96 }],
        }]);
        let field_added = layout_of(vec![SlotType::Struct {
            fields: vec![
                SlotType::Address,
                SlotType::Uint { bits: 96 },
                SlotType::Bool,
            ],
        }]);

        assert!(validate(Some(&old), &signedness_changed).is_ok());
        assert!(validate(Some(&old), &field_added).is_err());
    }
}
