pub use anyhow::{bail, ensure, Result};
pub use ndarray::{Array, ArrayView, Dimension};
pub use num_traits::Float;
pub use strum::{AsRefStr, EnumIter};
