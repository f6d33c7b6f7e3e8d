use super::{overlap, CenterBox, NormalizedBox};
use crate::common::*;

/// The generic rectangle.
pub trait Rect {
    type Type;

    fn xmin(&self) -> Self::Type;
    fn ymin(&self) -> Self::Type;
    fn xmax(&self) -> Self::Type;
    fn ymax(&self) -> Self::Type;
    fn cx(&self) -> Self::Type;
    fn cy(&self) -> Self::Type;
    fn w(&self) -> Self::Type;
    fn h(&self) -> Self::Type;
}

pub trait RectFloat: Rect
where
    Self::Type: Float,
{
    fn corners(&self) -> [Self::Type; 4] {
        [self.xmin(), self.ymin(), self.xmax(), self.ymax()]
    }

    fn cxcywh(&self) -> [Self::Type; 4] {
        [self.cx(), self.cy(), self.w(), self.h()]
    }

    fn area(&self) -> Self::Type {
        self.w() * self.h()
    }

    fn to_center(&self) -> CenterBox<Self::Type> {
        CenterBox {
            cx: self.cx(),
            cy: self.cy(),
            w: self.w(),
            h: self.h(),
        }
    }

    fn to_normalized(&self) -> NormalizedBox<Self::Type> {
        NormalizedBox {
            xmin: self.xmin(),
            ymin: self.ymin(),
            xmax: self.xmax(),
            ymax: self.ymax(),
        }
    }

    /// Intersection area computed from the center form of both boxes.
    fn intersection_area_with<R>(&self, other: &R) -> Self::Type
    where
        R: Rect<Type = Self::Type>,
    {
        overlap::intersection(self, other)
    }

    fn union_area_with<R>(&self, other: &R) -> Self::Type
    where
        R: Rect<Type = Self::Type>,
    {
        overlap::union(self, other)
    }

    fn iou_with<R>(&self, other: &R) -> Self::Type
    where
        R: Rect<Type = Self::Type>,
    {
        overlap::iou(self, other)
    }
}

impl<T> RectFloat for T
where
    T: Rect,
    T::Type: Float,
{
}
