pub use anyhow::{bail, ensure, format_err, Context as _, Error, Result};
pub use bbox::{Element, NormalizedBox, Rect, RectFloat};
pub use getset::{CopyGetters, Getters};
pub use itertools::{iproduct, Itertools as _};
pub use label::{count_state, Label, LabelState};
pub use log::{debug, warn};
pub use ndarray::{
    s, Array, Array2, Array3, ArrayView, ArrayView2, ArrayView3, ArrayView4, ArrayViewMut,
    ArrayViewMut2, ArrayViewMut3, ArrayViewMut4, Axis, Dimension, Zip,
};
pub use noisy_float::prelude::*;
pub use num_traits::{NumCast, ToPrimitive};
pub use rand::prelude::*;
pub use serde::{Deserialize, Serialize};
pub use std::{cmp::Ordering, str::FromStr};
pub use strum::AsRefStr;

/// Converts a primitive number into the element type.
///
/// Every primitive number is representable by `f32` and `f64` up to
/// rounding, so the conversion cannot fail for the supported elements.
pub fn elem<T, V>(value: V) -> T
where
    T: Element,
    V: ToPrimitive,
{
    <T as NumCast>::from(value).unwrap()
}

/// The smallest positive normal value, used to floor arguments of `ln`.
pub fn prob_floor<T>() -> T
where
    T: Element,
{
    T::min_positive_value()
}
