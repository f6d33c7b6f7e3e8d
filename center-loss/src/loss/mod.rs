//! Loss function building blocks.

mod center_loss;
mod cross_entropy;
mod focal_loss;
mod regression;

pub use center_loss::*;
pub use cross_entropy::*;
pub use focal_loss::*;
pub use regression::*;

/// Number of box regression channels at the front of a prediction tensor.
pub const NUM_BOX_CHANNELS: usize = 4;

/// Number of background/foreground score channels after the box channels.
pub const NUM_CLASS_CHANNELS: usize = 2;
