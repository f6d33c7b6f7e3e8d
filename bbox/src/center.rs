use super::{NormalizedBox, Rect};
use crate::common::*;

/// Bounding box in center form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterBox<T> {
    pub cx: T,
    pub cy: T,
    pub w: T,
    pub h: T,
}

impl<T> CenterBox<T>
where
    T: Float,
{
    pub fn try_new(cx: T, cy: T, w: T, h: T) -> Result<Self> {
        let zero = T::zero();
        ensure!(
            w >= zero && h >= zero,
            "box width and height must be non-negative"
        );
        Ok(Self { cx, cy, w, h })
    }
}

impl<T> Rect for CenterBox<T>
where
    T: Float,
{
    type Type = T;

    fn xmin(&self) -> T {
        let two = T::one() + T::one();
        self.cx - self.w / two
    }

    fn ymin(&self) -> T {
        let two = T::one() + T::one();
        self.cy - self.h / two
    }

    fn xmax(&self) -> T {
        let two = T::one() + T::one();
        self.cx + self.w / two
    }

    fn ymax(&self) -> T {
        let two = T::one() + T::one();
        self.cy + self.h / two
    }

    fn cx(&self) -> T {
        self.cx
    }

    fn cy(&self) -> T {
        self.cy
    }

    fn w(&self) -> T {
        self.w
    }

    fn h(&self) -> T {
        self.h
    }
}

impl<T> From<NormalizedBox<T>> for CenterBox<T>
where
    T: Float,
{
    fn from(from: NormalizedBox<T>) -> Self {
        Self::from(&from)
    }
}

impl<T> From<&NormalizedBox<T>> for CenterBox<T>
where
    T: Float,
{
    fn from(from: &NormalizedBox<T>) -> Self {
        Self {
            cx: from.cx(),
            cy: from.cy(),
            w: from.w(),
            h: from.h(),
        }
    }
}
