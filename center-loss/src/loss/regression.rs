use super::NUM_BOX_CHANNELS;
use crate::common::*;

/// The choice of box regression loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr)]
pub enum RegressionLoss {
    SmoothL1,
    L2,
    HalfL2,
}

impl RegressionLoss {
    /// Loss and derivative for a residual `x`.
    pub fn eval<T>(self, x: T) -> (T, T)
    where
        T: Element,
    {
        match self {
            Self::SmoothL1 => smooth_l1_loss(x),
            Self::L2 => l2_loss(x),
            Self::HalfL2 => half_l2_loss(x),
        }
    }
}

impl Default for RegressionLoss {
    fn default() -> Self {
        Self::SmoothL1
    }
}

pub fn smooth_l1_loss<T>(x: T) -> (T, T)
where
    T: Element,
{
    let zero = T::zero();
    let one = T::one();
    let half = one / (one + one);

    let abs = x.abs();
    if abs < one {
        (half * x * x, x)
    } else {
        let sign = if x > zero {
            one
        } else if x < zero {
            -one
        } else {
            zero
        };
        (abs - half, sign)
    }
}

pub fn l2_loss<T>(x: T) -> (T, T)
where
    T: Element,
{
    let two = T::one() + T::one();
    (x * x, two * x)
}

pub fn half_l2_loss<T>(x: T) -> (T, T)
where
    T: Element,
{
    let half = T::one() / (T::one() + T::one());
    (half * x * x, x)
}

/// Box regression loss over the first four channels at positive locations.
///
/// `targets` has shape `(batch, 4, row, col)`. Only the box channels of
/// `grad` are written, with zero at non-positive locations.
pub fn regression_loss<T>(
    kind: RegressionLoss,
    labels: ArrayView3<LabelState>,
    predictions: ArrayView4<T>,
    targets: ArrayView4<T>,
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
        num_channels >= NUM_BOX_CHANNELS,
        "expect at least {} channels, but get {}",
        NUM_BOX_CHANNELS,
        num_channels
    );
    ensure!(
        labels.dim() == (batch_size, height, width),
        "label shape {:?} does not match prediction grid {:?}",
        labels.dim(),
        (batch_size, height, width)
    );
    ensure!(
        targets.dim() == (batch_size, NUM_BOX_CHANNELS, height, width),
        "target shape {:?} is not (batch, {}, row, col)",
        targets.dim(),
        NUM_BOX_CHANNELS
    );
    ensure!(
        grad.dim() == predictions.dim(),
        "gradient shape {:?} does not match prediction shape {:?}",
        grad.dim(),
        predictions.dim()
    );

    let mut loss = T::zero();

    for (b, h, w) in iproduct!(0..batch_size, 0..height, 0..width) {
        let is_positive = labels[[b, h, w]] == LabelState::Positive;

        for c in 0..NUM_BOX_CHANNELS {
            if !is_positive {
                grad[[b, c, h, w]] = T::zero();
                continue;
            }

            let diff = predictions[[b, c, h, w]] - targets[[b, c, h, w]];
            let (elem_loss, elem_grad) = kind.eval(diff);
            loss = loss + elem_loss;
            grad[[b, c, h, w]] = elem_grad;
        }
    }

    debug_assert!(!loss.is_nan(), "NaN detected");
    Ok(loss)
}
