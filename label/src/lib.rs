//! Ground-truth labels and the per-location label states of a target map.

mod common;

pub use state::*;
pub mod state;

pub use map::*;
pub mod map;

use bbox::Rect;

/// A ground-truth object: a box and its class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label<R, C>
where
    R: Rect,
{
    pub rect: R,
    pub class: C,
}

impl<R, C> Label<R, C>
where
    R: Rect,
{
    pub fn new(rect: R, class: C) -> Self {
        Self { rect, class }
    }
}
