//! Softmax and sigmoid activations over prediction tensors.

use crate::{
    common::*,
    loss::{NUM_BOX_CHANNELS, NUM_CLASS_CHANNELS},
};

pub fn sigmoid<T>(x: T) -> T
where
    T: Element,
{
    T::one() / (T::one() + (-x).exp())
}

pub fn sigmoid_in_place<T, D>(mut values: ArrayViewMut<T, D>)
where
    T: Element,
    D: Dimension,
{
    values.mapv_inplace(sigmoid);
}

/// Stable softmax of a background/foreground score pair.
pub fn softmax_pair<T>(bg: T, fg: T) -> (T, T)
where
    T: Element,
{
    let max = bg.max(fg);
    let bg = (bg - max).exp();
    let fg = (fg - max).exp();
    let sum = bg + fg;
    (bg / sum, fg / sum)
}

/// Normalizes the channels `offset..offset + count` of a
/// `(batch, channel, row, col)` tensor in place, per spatial location.
pub fn softmax_channels<T>(
    mut predictions: ArrayViewMut4<T>,
    offset: usize,
    count: usize,
) -> Result<()>
where
    T: Element,
{
    let (_, num_channels, _, _) = predictions.dim();
    ensure!(!predictions.is_empty(), "predictions must not be empty");
    ensure!(count > 0, "softmax channel group must not be empty");
    ensure!(
        offset + count <= num_channels,
        "channels {}..{} exceed the {} channels of predictions",
        offset,
        offset + count,
        num_channels
    );

    let mut group = predictions.slice_mut(s![.., offset..(offset + count), .., ..]);
    for mut lane in group.lanes_mut(Axis(1)) {
        let max = lane.fold(T::neg_infinity(), |max, &value| max.max(value));
        lane.mapv_inplace(|value| (value - max).exp());
        let sum = lane.sum();
        lane.mapv_inplace(|value| value / sum);
    }

    Ok(())
}

/// Normalizes the background/foreground channels that follow the box
/// regression channels.
pub fn softmax_center_grid<T>(predictions: ArrayViewMut4<T>, label_channel: usize) -> Result<()>
where
    T: Element,
{
    ensure!(
        label_channel == NUM_CLASS_CHANNELS,
        "expect {} label channels, but get {}",
        NUM_CLASS_CHANNELS,
        label_channel
    );
    softmax_channels(predictions, NUM_BOX_CHANNELS, label_channel)
}
