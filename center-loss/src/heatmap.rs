//! Gaussian heatmap targets.

use crate::common::*;

/// Kernel values below this threshold are stored as exact zeros.
pub const GAUSSIAN_FLOOR: f64 = 5e-11;

/// Computes the object radius of a box on the heatmap grid.
///
/// The radius is the smallest of the roots of the three corner-shift
/// regimes, so that a box displaced by that radius still reaches
/// `min_overlap` IoU with the ground truth.
pub fn gaussian_radius<T>(height: T, width: T, min_overlap: T) -> Result<T>
where
    T: Element,
{
    let zero = T::zero();
    let one = T::one();

    ensure!(
        height > zero && width > zero,
        "box height and width must be positive"
    );
    ensure!(
        min_overlap > zero && min_overlap < one,
        "min_overlap must be in range (0, 1)"
    );

    let [r1, r2, r3] = radius_roots(height, width, min_overlap);
    Ok(r1.min(r2).min(r3))
}

/// Roots of the three overlap regimes, in the order the minimum is taken.
fn radius_roots<T>(height: T, width: T, min_overlap: T) -> [T; 3]
where
    T: Element,
{
    let one = T::one();
    let two = one + one;
    let four = two + two;

    let a1 = one;
    let b1 = height + width;
    let c1 = width * height * (one - min_overlap) / (one + min_overlap);
    let r1 = (b1 + clamped_sqrt(b1 * b1 - four * a1 * c1)) / two;

    let a2 = four;
    let b2 = two * (height + width);
    let c2 = (one - min_overlap) * width * height;
    let r2 = (b2 + clamped_sqrt(b2 * b2 - four * a2 * c2)) / two;

    let a3 = four * min_overlap;
    let b3 = -two * min_overlap * (height + width);
    let c3 = (min_overlap - one) * width * height;
    let r3 = (b3 + clamped_sqrt(b3 * b3 - four * a3 * c3)) / two;

    [r1, r2, r3]
}

fn clamped_sqrt<T>(discriminant: T) -> T
where
    T: Element,
{
    if discriminant < T::zero() {
        warn!(
            "negative discriminant {:?} in radius computation, clamped to zero",
            discriminant
        );
        return T::zero();
    }
    discriminant.sqrt()
}

/// Builds a dense Gaussian kernel centered at `((height - 1) / 2, (width - 1) / 2)`.
pub fn gaussian_2d<T>(height: usize, width: usize, sigma: T) -> Result<Array2<T>>
where
    T: Element,
{
    ensure!(sigma > T::zero(), "sigma must be positive");

    let floor: T = elem(GAUSSIAN_FLOOR);
    let two = T::one() + T::one();
    let denom = two * sigma * sigma;
    let half_height = (height as isize - 1) / 2;
    let half_width = (width as isize - 1) / 2;

    let kernel = Array2::from_shape_fn((height, width), |(row, col)| {
        let dy = row as isize - half_height;
        let dx = col as isize - half_width;
        let dist: T = elem(dx * dx + dy * dy);
        let value = (-dist / denom).exp();
        if value < floor {
            T::zero()
        } else {
            value
        }
    });

    Ok(kernel)
}

/// Splats a Gaussian of the given radius at `(center_x, center_y)`.
///
/// Each covered cell keeps the maximum of its old value and the kernel
/// value. The kernel is clipped to the heatmap, so centers near or beyond
/// the border are fine.
pub fn draw_gaussian<T>(
    mut heatmap: ArrayViewMut2<T>,
    center_x: usize,
    center_y: usize,
    radius: usize,
) -> Result<()>
where
    T: Element,
{
    let diameter = 2 * radius + 1;
    let six: T = elem(6);
    let sigma = elem::<T, _>(diameter) / six;
    let kernel = gaussian_2d(diameter, diameter, sigma)?;

    let (height, width) = heatmap.dim();
    let row_start = center_y.saturating_sub(radius);
    let row_end = center_y.saturating_add(radius + 1).min(height);
    let col_start = center_x.saturating_sub(radius);
    let col_end = center_x.saturating_add(radius + 1).min(width);

    if row_start >= row_end || col_start >= col_end {
        return Ok(());
    }

    let kernel_row = row_start + radius - center_y;
    let kernel_col = col_start + radius - center_x;
    let rows = row_end - row_start;
    let cols = col_end - col_start;

    let window = heatmap.slice_mut(s![row_start..row_end, col_start..col_end]);
    let patch = kernel.slice(s![
        kernel_row..(kernel_row + rows),
        kernel_col..(kernel_col + cols)
    ]);

    Zip::from(window).and(patch).for_each(|cell, &value| {
        if value > *cell {
            *cell = value;
        }
    });

    Ok(())
}

/// Merges `source` into `target` by element-wise maximum.
pub fn merge_max<T>(target: ArrayViewMut2<T>, source: ArrayView2<T>) -> Result<()>
where
    T: Element,
{
    ensure!(
        target.dim() == source.dim(),
        "heatmap shape mismatch: {:?} vs {:?}",
        target.dim(),
        source.dim()
    );

    Zip::from(target).and(source).for_each(|cell, &value| {
        if value > *cell {
            *cell = value;
        }
    });
    Ok(())
}

/// Renders one heatmap from a list of normalized boxes.
pub fn render_heatmap<T>(
    boxes: &[NormalizedBox<T>],
    height: usize,
    width: usize,
    min_overlap: T,
) -> Result<Array2<T>>
where
    T: Element,
{
    ensure!(height > 0 && width > 0, "heatmap size must be positive");

    let mut heatmap = Array2::zeros((height, width));
    for bbox in boxes {
        splat_box(heatmap.view_mut(), bbox, min_overlap)?;
    }
    Ok(heatmap)
}

/// Renders a `(class, row, col)` stack of heatmaps from labeled boxes.
pub fn render_class_heatmaps<T>(
    labels: &[Label<NormalizedBox<T>, usize>],
    num_classes: usize,
    height: usize,
    width: usize,
    min_overlap: T,
) -> Result<Array3<T>>
where
    T: Element,
{
    ensure!(height > 0 && width > 0, "heatmap size must be positive");

    let mut heatmaps = Array3::zeros((num_classes, height, width));
    for label in labels {
        ensure!(
            label.class < num_classes,
            "class {} is out of range, expect less than {}",
            label.class,
            num_classes
        );
        splat_box(
            heatmaps.index_axis_mut(Axis(0), label.class),
            &label.rect,
            min_overlap,
        )?;
    }
    Ok(heatmaps)
}

fn splat_box<T>(heatmap: ArrayViewMut2<T>, bbox: &NormalizedBox<T>, min_overlap: T) -> Result<()>
where
    T: Element,
{
    let zero = T::zero();
    let (height, width) = heatmap.dim();
    let grid_h: T = elem(height);
    let grid_w: T = elem(width);

    let box_h = bbox.h() * grid_h;
    let box_w = bbox.w() * grid_w;
    if !(box_h > zero && box_w > zero) {
        debug!("skip degenerate box {:?}", bbox);
        return Ok(());
    }

    let radius = gaussian_radius(box_h, box_w, min_overlap)?.floor().max(zero);
    let radius = radius
        .to_usize()
        .ok_or_else(|| format_err!("radius {:?} is not representable", radius))?;

    let last_col: T = elem(width - 1);
    let last_row: T = elem(height - 1);
    let center_x = (bbox.cx() * grid_w).floor().max(zero).min(last_col);
    let center_y = (bbox.cy() * grid_h).floor().max(zero).min(last_row);
    let center_x = center_x.to_usize().unwrap_or(0);
    let center_y = center_y.to_usize().unwrap_or(0);

    draw_gaussian(heatmap, center_x, center_y, radius)
}
