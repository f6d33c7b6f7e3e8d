//! Target generation and loss computation for center-point detectors.
//!
//! The crate renders Gaussian heatmap targets, mines hard negatives and
//! evaluates the focal, softmax cross-entropy and box regression losses of
//! a CenterNet-style head. Every engine returns a scalar loss and writes its
//! gradient into a caller-owned buffer.

mod common;
pub mod config;
pub mod heatmap;
pub mod loss;
pub mod mining;
pub mod sampler;
pub mod softmax;

pub use bbox;
pub use label;
