//! Conversion of whole label maps to and from the float encoding.

use crate::{common::*, LabelState};

/// Decodes a float label map of any dimensionality.
pub fn decode_label_map<T, D>(values: ArrayView<T, D>) -> Result<Array<LabelState, D>>
where
    T: Float,
    D: Dimension,
{
    ensure!(!values.is_empty(), "label map must not be empty");

    let mut states = Vec::with_capacity(values.len());
    for &value in values.iter() {
        states.push(LabelState::try_from_value(value)?);
    }

    // `iter()` visits in logical order, so the standard layout matches.
    let map = Array::from_shape_vec(values.raw_dim(), states)?;
    Ok(map)
}

pub fn encode_label_map<T, D>(states: ArrayView<LabelState, D>) -> Array<T, D>
where
    T: Float,
    D: Dimension,
{
    states.map(|state| state.to_value())
}

/// Counts the locations of a map in the given state.
pub fn count_state<D>(states: ArrayView<LabelState, D>, state: LabelState) -> usize
where
    D: Dimension,
{
    states.iter().filter(|&&s| s == state).count()
}
