//! Helper sequences built on demand for array-typed inputs.

use std::sync::Arc;

use tessel_ir::{Match, Operation, Type};
use tessel_sequence::{Sequence, SequenceError};

use super::manager::ComponentManager;
use crate::rng::Randomness;

/// Arrays built by the helper have length `0..MAX_ARRAY_LENGTH`.
pub const MAX_ARRAY_LENGTH: usize = 4;

/// Build a fresh array-creation sequence for `array_type`.
///
/// Elements are drawn from existing components of the element type. When
/// none exist the array is empty, or (when null is allowed, on a coin flip)
/// holds a single null/zero element. Returns `None` for non-array types.
pub fn create_array_sequence(
    components: &mut ComponentManager,
    array_type: &Type,
    forbid_null: bool,
    random: &mut Randomness,
) -> Result<Option<Sequence>, SequenceError> {
    let Some(element) = array_type.element_type().cloned() else {
        return Ok(None);
    };

    let chosen: Option<Vec<Sequence>> = {
        let candidates = components.sequences_for_type(&element);
        if candidates.is_empty() {
            None
        } else {
            let length = random.next_index(MAX_ARRAY_LENGTH);
            Some(
                (0..length)
                    .filter_map(|_| candidates.get(random.next_index(candidates.len())).cloned())
                    .collect(),
            )
        }
    };

    let Some(chosen) = chosen else {
        if forbid_null || random.weighted_coin_flip(0.5) {
            let empty = Arc::new(Operation::array(&element, 0)?);
            return Ok(Some(Sequence::create(empty)?));
        }
        let single = Arc::new(Operation::array(&element, 1)?);
        return Ok(Some(Sequence::null_or_zero(&element).extend_indices(single, &[0])?));
    };

    let mut indices = Vec::with_capacity(chosen.len());
    let mut offset = 0;
    for seq in &chosen {
        if let Some(var) =
            seq.random_variable_for_type_last_statement(&element, Match::CompatibleType, random.rng())
        {
            indices.push(offset + var.index());
        }
        offset += seq.size();
    }
    let base = Sequence::concatenate(&chosen);
    let create = Arc::new(Operation::array(&element, indices.len())?);
    Ok(Some(base.extend_indices(create, &indices)?))
}
