//! Normalized bounding box types and overlap metrics.

mod common;

pub use element::*;
pub mod element;

pub use rect::*;
pub mod rect;

pub use normalized::*;
pub mod normalized;

pub use center::*;
pub mod center;

pub use overlap::*;
pub mod overlap;

pub mod prelude {
    pub use crate::rect::{Rect, RectFloat};
}
