//! Hard-negative mining.
//!
//! Both miners rank the `CandidateNegative` locations of a label map by
//! loss and promote the hardest `min(candidates, positives × ratio)` of
//! them. They differ in what the promoted locations become:
//!
//! - the sigmoid miner marks them `ConfirmedBackground`,
//! - the softmax miner marks them `HardNegative`, and the candidates it
//!   leaves behind stay out of the softmax loss.

use crate::{
    common::*,
    loss::{background_focal_loss, NUM_BOX_CHANNELS, NUM_CLASS_CHANNELS},
};

/// Promotes the highest-loss candidates of a sigmoid head.
///
/// `probs` holds the foreground probabilities of the same `(row, col)` grid
/// as `labels`. Returns the number of promoted locations.
///
/// The promoted `ConfirmedBackground` state carries no loss in
/// [`sigmoid_focal_loss`](crate::loss::sigmoid_focal_loss); only
/// `HardNegative` and `Positive` locations are scored there.
pub fn select_hard_negatives_sigmoid<T>(
    labels: ArrayViewMut2<LabelState>,
    probs: ArrayView2<T>,
    negative_ratio: usize,
    num_positive: usize,
    num_channels: usize,
) -> Result<usize>
where
    T: Element,
{
    ensure!(!labels.is_empty(), "label map must not be empty");
    ensure!(
        num_channels == NUM_BOX_CHANNELS + 2,
        "x, y, width, height + objectness + label class containing face, but get {} channels",
        num_channels
    );
    ensure!(
        labels.dim() == probs.dim(),
        "label shape {:?} does not match probability shape {:?}",
        labels.dim(),
        probs.dim()
    );

    let quota = num_positive.saturating_mul(negative_ratio);
    let promoted = promote_hardest(
        labels,
        |index| background_focal_loss(probs[index]),
        quota,
        LabelState::ConfirmedBackground,
    );
    debug!(
        "sigmoid mining promoted {} negatives for {} positives",
        promoted, num_positive
    );
    Ok(promoted)
}

/// Promotes the highest-loss candidates of a softmax head, per batch element.
///
/// `sample_losses` has the `(batch, row, col)` shape of `labels`, usually
/// computed by [`softmax_sample_losses`](crate::loss::softmax_sample_losses).
/// `positives[b]` is the number of positives of batch element `b`. Returns
/// the number of promoted locations per batch element.
pub fn select_hard_negatives_softmax<T>(
    mut labels: ArrayViewMut3<LabelState>,
    sample_losses: ArrayView3<T>,
    negative_ratio: usize,
    positives: &[usize],
    num_channels: usize,
) -> Result<Vec<usize>>
where
    T: Element,
{
    ensure!(!labels.is_empty(), "label map must not be empty");
    ensure!(
        num_channels == NUM_BOX_CHANNELS + NUM_CLASS_CHANNELS,
        "x, y, width, height + label classes containing background + face, but get {} channels",
        num_channels
    );
    ensure!(
        labels.dim() == sample_losses.dim(),
        "label shape {:?} does not match sample loss shape {:?}",
        labels.dim(),
        sample_losses.dim()
    );
    ensure!(
        positives.len() == labels.len_of(Axis(0)),
        "expect {} positive counts, but get {}",
        labels.len_of(Axis(0)),
        positives.len()
    );

    let promoted: Vec<usize> = labels
        .outer_iter_mut()
        .zip(sample_losses.outer_iter())
        .zip(positives)
        .map(|((map, losses), &num_positive)| {
            let quota = num_positive.saturating_mul(negative_ratio);
            promote_hardest(map, |index| losses[index], quota, LabelState::HardNegative)
        })
        .collect();

    debug!(
        "softmax mining promoted {:?} negatives for {:?} positives",
        promoted, positives
    );
    Ok(promoted)
}

fn promote_hardest<T, F>(
    mut labels: ArrayViewMut2<LabelState>,
    loss_fn: F,
    quota: usize,
    promoted_state: LabelState,
) -> usize
where
    T: Element,
    F: Fn((usize, usize)) -> T,
{
    let mut candidates: Vec<((usize, usize), T)> = labels
        .indexed_iter()
        .filter(|(_, state)| **state == LabelState::CandidateNegative)
        .map(|(index, _)| (index, loss_fn(index)))
        .collect();

    // stable, so equal losses keep the row-major scan order
    candidates.sort_by(|(_, lhs), (_, rhs)| descending(*lhs, *rhs));

    let num_promoted = candidates.len().min(quota);
    for &(index, _) in &candidates[..num_promoted] {
        labels[index] = promoted_state;
    }
    num_promoted
}

/// Total descending order, with NaN sorted last.
fn descending<T>(lhs: T, rhs: T) -> Ordering
where
    T: Element,
{
    match (lhs.is_nan(), rhs.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => rhs.partial_cmp(&lhs).unwrap_or(Ordering::Equal),
    }
}
