use super::{NUM_BOX_CHANNELS, NUM_CLASS_CHANNELS};
use crate::{common::*, softmax::softmax_pair};

const BG_CHANNEL: usize = NUM_BOX_CHANNELS;
const FG_CHANNEL: usize = NUM_BOX_CHANNELS + 1;

/// Softmax cross-entropy of a single location.
pub fn single_softmax_loss<T>(bg_score: T, fg_score: T, is_foreground: bool) -> T
where
    T: Element,
{
    let (bg_prob, fg_prob) = softmax_pair(bg_score, fg_score);
    let prob = if is_foreground { fg_prob } else { bg_prob };
    -prob.max(prob_floor()).ln()
}

/// Per-location loss of every location scored as background. The result
/// has shape `(batch, row, col)` and feeds the softmax hard-negative miner.
pub fn softmax_sample_losses<T>(predictions: ArrayView4<T>) -> Result<Array3<T>>
where
    T: Element,
{
    let (batch_size, num_channels, height, width) = predictions.dim();
    ensure!(
        batch_size * height * width > 0,
        "predictions must not be empty"
    );
    ensure!(
        num_channels >= NUM_BOX_CHANNELS + NUM_CLASS_CHANNELS,
        "expect at least {} channels, but get {}",
        NUM_BOX_CHANNELS + NUM_CLASS_CHANNELS,
        num_channels
    );

    let losses = Array3::from_shape_fn((batch_size, height, width), |(b, h, w)| {
        single_softmax_loss(
            predictions[[b, BG_CHANNEL, h, w]],
            predictions[[b, FG_CHANNEL, h, w]],
            false,
        )
    });
    Ok(losses)
}

/// Two-way softmax cross-entropy over the class channels.
///
/// `labels` has shape `(batch, row, col)`; `predictions` and `grad` have
/// shape `(batch, channel, row, col)`. Hard negatives are background
/// samples and positives are foreground samples. Ignored and candidate
/// locations are skipped and get zero gradient. Only the class channels of
/// `grad` are written.
pub fn softmax_cross_entropy<T>(
    labels: ArrayView3<LabelState>,
    predictions: ArrayView4<T>,
    mut grad: ArrayViewMut4<T>,
) -> Result<T>
where
    T: Element,
{
    let (batch_size, num_channels, height, width) = predictions.dim();
    ensure!(
        batch_size * height * width > 0,
        "predictions must not be empty"
    );
    ensure!(
        num_channels >= NUM_BOX_CHANNELS + NUM_CLASS_CHANNELS,
        "expect at least {} channels, but get {}",
        NUM_BOX_CHANNELS + NUM_CLASS_CHANNELS,
        num_channels
    );
    ensure!(
        labels.dim() == (batch_size, height, width),
        "label shape {:?} does not match prediction grid {:?}",
        labels.dim(),
        (batch_size, height, width)
    );
    ensure!(
        grad.dim() == predictions.dim(),
        "gradient shape {:?} does not match prediction shape {:?}",
        grad.dim(),
        predictions.dim()
    );

    let zero = T::zero();
    let one = T::one();
    let mut loss = zero;

    for (b, h, w) in iproduct!(0..batch_size, 0..height, 0..width) {
        let is_foreground = match labels[[b, h, w]] {
            LabelState::Ignore | LabelState::CandidateNegative => {
                grad[[b, BG_CHANNEL, h, w]] = zero;
                grad[[b, FG_CHANNEL, h, w]] = zero;
                continue;
            }
            LabelState::HardNegative => false,
            LabelState::Positive => true,
            state @ LabelState::ConfirmedBackground => {
                bail!(
                    "no valid label value: {} at batch {}, row {}, col {}",
                    state.as_ref(),
                    b,
                    h,
                    w
                );
            }
        };

        let (bg_prob, fg_prob) = softmax_pair(
            predictions[[b, BG_CHANNEL, h, w]],
            predictions[[b, FG_CHANNEL, h, w]],
        );
        let (true_channel, true_prob, other_channel, other_prob) = if is_foreground {
            (FG_CHANNEL, fg_prob, BG_CHANNEL, bg_prob)
        } else {
            (BG_CHANNEL, bg_prob, FG_CHANNEL, fg_prob)
        };

        loss = loss - true_prob.max(prob_floor()).ln();
        grad[[b, true_channel, h, w]] = true_prob - one;
        grad[[b, other_channel, h, w]] = other_prob;
    }

    debug_assert!(!loss.is_nan(), "NaN detected");
    Ok(loss)
}
