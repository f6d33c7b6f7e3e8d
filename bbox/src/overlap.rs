//! Overlap metrics between rectangles.

use super::Rect;
use crate::common::*;

/// Length of the overlap between two centered 1-D intervals.
///
/// The result is negative when the intervals are disjoint.
pub fn overlap_1d<T>(c1: T, w1: T, c2: T, w2: T) -> T
where
    T: Float,
{
    let two = T::one() + T::one();
    let left = (c1 - w1 / two).max(c2 - w2 / two);
    let right = (c1 + w1 / two).min(c2 + w2 / two);
    right - left
}

/// Intersection area of two boxes, computed on their center forms.
pub fn intersection<A, B, T>(a: &A, b: &B) -> T
where
    A: Rect<Type = T> + ?Sized,
    B: Rect<Type = T> + ?Sized,
    T: Float,
{
    let zero = T::zero();
    let w = overlap_1d(a.cx(), a.w(), b.cx(), b.w());
    let h = overlap_1d(a.cy(), a.h(), b.cy(), b.h());
    if w < zero || h < zero {
        return zero;
    }
    w * h
}

pub fn union<A, B, T>(a: &A, b: &B) -> T
where
    A: Rect<Type = T> + ?Sized,
    B: Rect<Type = T> + ?Sized,
    T: Float,
{
    let inter = intersection(a, b);
    a.w() * a.h() + b.w() * b.h() - inter
}

/// Intersection over union. Returns zero when the union area is not
/// positive, which only happens when both boxes are degenerate.
pub fn iou<A, B, T>(a: &A, b: &B) -> T
where
    A: Rect<Type = T> + ?Sized,
    B: Rect<Type = T> + ?Sized,
    T: Float,
{
    let zero = T::zero();
    let inter = intersection(a, b);
    let union = a.w() * a.h() + b.w() * b.h() - inter;
    if !(union > zero) {
        return zero;
    }
    inter / union
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CenterBox, NormalizedBox, RectFloat};
    use approx::assert_abs_diff_eq;
    use rand::prelude::*;

    fn random_box(rng: &mut impl Rng) -> NormalizedBox<f64> {
        let x1: f64 = rng.gen_range(0.0..1.0);
        let x2: f64 = rng.gen_range(0.0..1.0);
        let y1: f64 = rng.gen_range(0.0..1.0);
        let y2: f64 = rng.gen_range(0.0..1.0);
        NormalizedBox::try_new(x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2)).unwrap()
    }

    #[test]
    fn overlap_1d_signs() {
        assert_abs_diff_eq!(overlap_1d(0.5, 0.4, 0.6, 0.4), 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(overlap_1d(0.1, 0.1, 0.9, 0.1), -0.7, epsilon = 1e-12);
    }

    #[test]
    fn iou_known_value() -> Result<()> {
        let a = NormalizedBox::try_new(0.0, 0.0, 0.5, 0.5)?;
        let b = NormalizedBox::try_new(0.25, 0.0, 0.75, 0.5)?;
        assert_abs_diff_eq!(intersection(&a, &b), 0.125, epsilon = 1e-12);
        assert_abs_diff_eq!(union(&a, &b), 0.375, epsilon = 1e-12);
        assert_abs_diff_eq!(a.iou_with(&b), 1.0 / 3.0, epsilon = 1e-12);

        // mixed representations agree
        let c = CenterBox::from(&b);
        assert_abs_diff_eq!(a.iou_with(&c), 1.0 / 3.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn disjoint_boxes_have_zero_iou() -> Result<()> {
        let a = NormalizedBox::try_new(0.0, 0.0, 0.2, 0.2)?;
        let b = NormalizedBox::try_new(0.5, 0.0, 0.7, 0.2)?;
        assert_eq!(intersection(&a, &b), 0.0);
        assert_eq!(iou(&a, &b), 0.0);
        Ok(())
    }

    #[test]
    fn degenerate_union_is_guarded() -> Result<()> {
        let a = NormalizedBox::try_new(0.3, 0.3, 0.3, 0.3)?;
        let b = NormalizedBox::try_new(0.3, 0.3, 0.3, 0.3)?;
        let value = iou(&a, &b);
        assert!(value.is_finite());
        assert_eq!(value, 0.0);
        Ok(())
    }

    #[test]
    fn iou_symmetry_and_range() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..1000 {
            let a = random_box(&mut rng);
            let b = random_box(&mut rng);
            let ab = iou(&a, &b);
            let ba = iou(&b, &a);
            assert_eq!(ab, ba);
            assert!(ab >= 0.0 && ab <= 1.0 + 1e-9, "iou {} out of range", ab);
        }
    }

    #[test]
    fn identical_boxes_have_unit_iou() {
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..100 {
            let a = random_box(&mut rng);
            if a.area() < 1e-6 {
                continue;
            }
            assert_abs_diff_eq!(iou(&a, &a), 1.0, epsilon = 1e-9);
        }

        let a = NormalizedBox::try_new(0.1f32, 0.2, 0.4, 0.9).unwrap();
        assert_abs_diff_eq!(a.iou_with(&a), 1.0, epsilon = 1e-5);
    }
}
