use crate::common::*;

/// The alpha coefficient of the focal loss.
pub const FOCAL_ALPHA: f64 = 0.25;

/// The gamma coefficient of the focal loss.
pub const FOCAL_GAMMA: f64 = 2.0;

/// Focal loss of a location treated as background, `-α·p^γ·ln(1 - p)`.
pub fn background_focal_loss<T>(prob: T) -> T
where
    T: Element,
{
    let alpha: T = elem(FOCAL_ALPHA);
    let gamma: T = elem(FOCAL_GAMMA);
    let log_neg = (T::one() - prob).max(prob_floor()).ln();
    -alpha * prob.powf(gamma) * log_neg
}

/// Loss and gradient of one element, or `None` if the state carries no
/// focal loss.
///
/// The gradient is taken with respect to the score before the sigmoid.
pub fn focal_loss_term<T>(state: LabelState, prob: T) -> Option<(T, T)>
where
    T: Element,
{
    let one = T::one();
    let alpha: T = elem(FOCAL_ALPHA);
    let gamma: T = elem(FOCAL_GAMMA);

    match state {
        LabelState::HardNegative => {
            let log_neg = (one - prob).max(prob_floor()).ln();
            let weight = alpha * prob.powf(gamma);
            let loss = -weight * log_neg;
            let grad = weight * (prob - gamma * (one - prob) * log_neg);
            Some((loss, grad))
        }
        LabelState::Positive => {
            let log_pos = prob.max(prob_floor()).ln();
            let weight = alpha * (one - prob).powf(gamma);
            let loss = -weight * log_pos;
            let grad = weight * (gamma * prob * log_pos + prob - one);
            Some((loss, grad))
        }
        LabelState::Ignore | LabelState::CandidateNegative | LabelState::ConfirmedBackground => {
            None
        }
    }
}

/// Sigmoid focal loss over a map of probabilities.
///
/// Hard negatives and positives contribute to the summed loss. Every other
/// location gets zero gradient. `grad` is overwritten entirely.
pub fn sigmoid_focal_loss<T, D>(
    labels: ArrayView<LabelState, D>,
    probs: ArrayView<T, D>,
    grad: ArrayViewMut<T, D>,
) -> Result<T>
where
    T: Element,
    D: Dimension,
{
    ensure!(!probs.is_empty(), "probability map must not be empty");
    ensure!(
        labels.shape() == probs.shape() && grad.shape() == probs.shape(),
        "shape mismatch: labels {:?}, probs {:?}, grad {:?}",
        labels.shape(),
        probs.shape(),
        grad.shape()
    );

    let mut loss = T::zero();
    Zip::from(labels)
        .and(probs)
        .and(grad)
        .for_each(|&state, &prob, grad| match focal_loss_term(state, prob) {
            Some((elem_loss, elem_grad)) => {
                loss = loss + elem_loss;
                *grad = elem_grad;
            }
            None => {
                *grad = T::zero();
            }
        });

    debug_assert!(!loss.is_nan(), "NaN detected");
    Ok(loss)
}
