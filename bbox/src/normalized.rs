use super::{CenterBox, Rect};
use crate::common::*;

/// Bounding box in corner form, coordinates relative to the image size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBox<T> {
    pub(crate) xmin: T,
    pub(crate) ymin: T,
    pub(crate) xmax: T,
    pub(crate) ymax: T,
}

impl<T> NormalizedBox<T>
where
    T: Float,
{
    pub fn try_new(xmin: T, ymin: T, xmax: T, ymax: T) -> Result<Self> {
        ensure!(
            xmax >= xmin && ymax >= ymin,
            "xmax >= xmin and ymax >= ymin must hold"
        );
        Ok(Self {
            xmin,
            ymin,
            xmax,
            ymax,
        })
    }

    pub fn try_from_corners(corners: [T; 4]) -> Result<Self> {
        let [xmin, ymin, xmax, ymax] = corners;
        Self::try_new(xmin, ymin, xmax, ymax)
    }

    /// Returns true if every coordinate lies in `[0, 1]`.
    pub fn is_within_unit(&self) -> bool {
        let zero = T::zero();
        let one = T::one();
        [self.xmin, self.ymin, self.xmax, self.ymax]
            .iter()
            .all(|&v| v >= zero && v <= one)
    }

    pub fn try_cast<V>(self) -> Option<NormalizedBox<V>>
    where
        V: NumCast,
    {
        Some(NormalizedBox {
            xmin: V::from(self.xmin)?,
            ymin: V::from(self.ymin)?,
            xmax: V::from(self.xmax)?,
            ymax: V::from(self.ymax)?,
        })
    }
}

impl<T> Rect for NormalizedBox<T>
where
    T: Float,
{
    type Type = T;

    fn xmin(&self) -> T {
        self.xmin
    }

    fn ymin(&self) -> T {
        self.ymin
    }

    fn xmax(&self) -> T {
        self.xmax
    }

    fn ymax(&self) -> T {
        self.ymax
    }

    fn cx(&self) -> T {
        let two = T::one() + T::one();
        (self.xmin + self.xmax) / two
    }

    fn cy(&self) -> T {
        let two = T::one() + T::one();
        (self.ymin + self.ymax) / two
    }

    fn w(&self) -> T {
        self.xmax - self.xmin
    }

    fn h(&self) -> T {
        self.ymax - self.ymin
    }
}

impl<T> From<CenterBox<T>> for NormalizedBox<T>
where
    T: Float,
{
    fn from(from: CenterBox<T>) -> Self {
        Self::from(&from)
    }
}

impl<T> From<&CenterBox<T>> for NormalizedBox<T>
where
    T: Float,
{
    fn from(from: &CenterBox<T>) -> Self {
        let two = T::one() + T::one();
        let CenterBox { cx, cy, w, h } = *from;
        Self {
            xmin: cx - w / two,
            ymin: cy - h / two,
            xmax: cx + w / two,
            ymax: cy + h / two,
        }
    }
}
