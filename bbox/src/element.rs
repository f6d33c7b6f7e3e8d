use crate::common::*;

/// The scalar type of box coordinates, tensors and losses.
pub trait Element: Float + Debug {}

impl<T> Element for T where T: Float + Debug {}
