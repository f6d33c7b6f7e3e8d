//! Defines the combined loss of the center-point head.

use super::{
    regression_loss, softmax_cross_entropy, softmax_sample_losses, RegressionLoss,
    NUM_BOX_CHANNELS, NUM_CLASS_CHANNELS,
};
use crate::{common::*, mining::select_hard_negatives_softmax};

pub use center_loss::*;
pub use center_loss_output::*;

mod center_loss {
    use super::*;

    #[derive(Debug, Clone, Default)]
    pub struct CenterLossInit {
        pub negative_ratio: Option<usize>,
        pub regression_loss: Option<RegressionLoss>,
        pub classification_loss_weight: Option<f64>,
        pub regression_loss_weight: Option<f64>,
    }

    impl CenterLossInit {
        pub fn build(self) -> Result<CenterLoss> {
            let Self {
                negative_ratio,
                regression_loss,
                classification_loss_weight,
                regression_loss_weight,
            } = self;

            let negative_ratio = negative_ratio.unwrap_or(5);
            let regression_loss = regression_loss.unwrap_or_default();
            let classification_loss_weight = classification_loss_weight.unwrap_or(1.0);
            let regression_loss_weight = regression_loss_weight.unwrap_or(1.0);

            ensure!(negative_ratio > 0, "negative_ratio must be positive");
            ensure!(
                classification_loss_weight >= 0.0,
                "classification_loss_weight must be non-negative"
            );
            ensure!(
                regression_loss_weight >= 0.0,
                "regression_loss_weight must be non-negative"
            );

            Ok(CenterLoss {
                negative_ratio,
                regression_loss,
                classification_loss_weight,
                regression_loss_weight,
            })
        }
    }

    /// Softmax classification with hard-negative mining plus box regression
    /// on the positive locations.
    #[derive(Debug, Clone, CopyGetters)]
    pub struct CenterLoss {
        #[get_copy = "pub"]
        negative_ratio: usize,
        #[get_copy = "pub"]
        regression_loss: RegressionLoss,
        #[get_copy = "pub"]
        classification_loss_weight: f64,
        #[get_copy = "pub"]
        regression_loss_weight: f64,
    }

    impl CenterLoss {
        /// Computes the loss and fills `grad`.
        ///
        /// `labels` has shape `(batch, row, col)` and is updated in place:
        /// mined locations become `HardNegative`. `predictions` and `grad`
        /// have shape `(batch, channel, row, col)`, `box_targets` has shape
        /// `(batch, 4, row, col)`. Every element of `grad` is written.
        pub fn forward<T>(
            &self,
            mut labels: ArrayViewMut3<LabelState>,
            predictions: ArrayView4<T>,
            box_targets: ArrayView4<T>,
            mut grad: ArrayViewMut4<T>,
        ) -> Result<CenterLossOutput<T>>
        where
            T: Element,
        {
            let (batch_size, num_channels, height, width) = predictions.dim();
            ensure!(
                labels.dim() == (batch_size, height, width),
                "label shape {:?} does not match prediction grid {:?}",
                labels.dim(),
                (batch_size, height, width)
            );
            let num_owned = NUM_BOX_CHANNELS + NUM_CLASS_CHANNELS;
            ensure!(
                num_channels >= num_owned,
                "expect at least {} prediction channels, but get {}",
                num_owned,
                num_channels
            );
            let classification_weight: T = <T as NumCast>::from(self.classification_loss_weight)
                .ok_or_else(|| {
                    format_err!(
                        "classification_loss_weight {} is not representable by the element type",
                        self.classification_loss_weight
                    )
                })?;
            let regression_weight: T = <T as NumCast>::from(self.regression_loss_weight)
                .ok_or_else(|| {
                    format_err!(
                        "regression_loss_weight {} is not representable by the element type",
                        self.regression_loss_weight
                    )
                })?;

            // mine negatives
            let positives: Vec<usize> = labels
                .outer_iter()
                .map(|map| count_state(map, LabelState::Positive))
                .collect();
            let sample_losses = softmax_sample_losses(predictions)?;
            let hard_negatives = select_hard_negatives_softmax(
                labels.view_mut(),
                sample_losses.view(),
                self.negative_ratio,
                &positives,
                num_owned,
            )?;

            // compute losses
            let classification_loss =
                softmax_cross_entropy(labels.view(), predictions, grad.view_mut())?;
            let regression_loss = regression_loss(
                self.regression_loss,
                labels.view(),
                predictions,
                box_targets,
                grad.view_mut(),
            )?;

            // weight gradients
            grad.slice_mut(s![.., ..NUM_BOX_CHANNELS, .., ..])
                .mapv_inplace(|value| value * regression_weight);
            grad.slice_mut(s![.., NUM_BOX_CHANNELS..num_owned, .., ..])
                .mapv_inplace(|value| value * classification_weight);
            grad.slice_mut(s![.., num_owned.., .., ..])
                .fill(T::zero());

            let total_loss =
                classification_loss * classification_weight + regression_loss * regression_weight;
            debug_assert!(!total_loss.is_nan(), "NaN detected");

            let num_positive: usize = positives.iter().sum();
            let num_hard_negative: usize = hard_negatives.iter().sum();
            debug!(
                "center loss {:?} with {} positives and {} hard negatives",
                total_loss, num_positive, num_hard_negative
            );

            Ok(CenterLossOutput {
                total_loss,
                classification_loss,
                regression_loss,
                num_positive,
                num_hard_negative,
            })
        }
    }
}

mod center_loss_output {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct CenterLossOutput<T> {
        pub total_loss: T,
        /// Unweighted softmax cross-entropy sum.
        pub classification_loss: T,
        /// Unweighted box regression sum.
        pub regression_loss: T,
        pub num_positive: usize,
        pub num_hard_negative: usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::single_softmax_loss;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array3, Array4};

    fn scene() -> (Array3<LabelState>, Array4<f64>, Array4<f64>) {
        let mut labels = Array3::from_elem((1, 3, 3), LabelState::CandidateNegative);
        labels[[0, 1, 1]] = LabelState::Positive;
        labels[[0, 0, 0]] = LabelState::Ignore;

        let mut predictions = Array4::<f64>::zeros((1, 7, 3, 3));
        // confident false positives at (0, 2) and (2, 0)
        predictions[[0, 5, 0, 2]] = 3.0;
        predictions[[0, 5, 2, 0]] = 2.0;
        predictions[[0, 5, 1, 1]] = 1.0;
        predictions[[0, 0, 1, 1]] = 0.5;

        let targets = Array4::<f64>::zeros((1, 4, 3, 3));
        (labels, predictions, targets)
    }

    #[test]
    fn forward_mines_and_combines() -> Result<()> {
        let (mut labels, predictions, targets) = scene();
        let mut grad = Array4::from_elem((1, 7, 3, 3), 9.0);

        let loss = CenterLossInit {
            negative_ratio: Some(2),
            regression_loss_weight: Some(2.0),
            ..Default::default()
        }
        .build()?;
        let output = loss.forward(
            labels.view_mut(),
            predictions.view(),
            targets.view(),
            grad.view_mut(),
        )?;

        assert_eq!(output.num_positive, 1);
        assert_eq!(output.num_hard_negative, 2);
        assert_eq!(labels[[0, 0, 2]], LabelState::HardNegative);
        assert_eq!(labels[[0, 2, 0]], LabelState::HardNegative);
        assert_eq!(labels[[0, 0, 0]], LabelState::Ignore);
        assert_eq!(count_state(labels.view(), LabelState::CandidateNegative), 5);

        let expect_classification = single_softmax_loss(0.0, 1.0, true)
            + single_softmax_loss(0.0, 3.0, false)
            + single_softmax_loss(0.0, 2.0, false);
        assert_abs_diff_eq!(
            output.classification_loss,
            expect_classification,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(output.regression_loss, 0.125, epsilon = 1e-12);
        assert_abs_diff_eq!(
            output.total_loss,
            expect_classification + 0.25,
            epsilon = 1e-12
        );

        // weighted regression gradient, extra channel cleared
        assert_abs_diff_eq!(grad[[0, 0, 1, 1]], 1.0, epsilon = 1e-12);
        assert!(grad.slice(s![0, 6, .., ..]).iter().all(|&value| value == 0.0));

        // ignored and leftover candidates carry no gradient
        for (r, c) in [(0, 0), (0, 1), (1, 0)] {
            assert!(grad.slice(s![0, .., r, c]).iter().all(|&value| value == 0.0));
        }
        Ok(())
    }

    #[test]
    fn zero_weight_silences_classification() -> Result<()> {
        let (mut labels, predictions, targets) = scene();
        let mut grad = Array4::zeros((1, 7, 3, 3));

        let loss = CenterLossInit {
            classification_loss_weight: Some(0.0),
            ..Default::default()
        }
        .build()?;
        let output = loss.forward(
            labels.view_mut(),
            predictions.view(),
            targets.view(),
            grad.view_mut(),
        )?;

        assert!(output.classification_loss > 0.0);
        assert_abs_diff_eq!(output.total_loss, output.regression_loss, epsilon = 1e-12);
        assert!(grad.slice(s![0, 4..6, .., ..]).iter().all(|&value| value == 0.0));
        Ok(())
    }

    #[test]
    fn reject_bad_init_and_shapes() -> Result<()> {
        assert!(CenterLossInit {
            negative_ratio: Some(0),
            ..Default::default()
        }
        .build()
        .is_err());
        assert!(CenterLossInit {
            regression_loss_weight: Some(-1.0),
            ..Default::default()
        }
        .build()
        .is_err());

        let loss = CenterLossInit::default().build()?;
        assert_eq!(loss.negative_ratio(), 5);
        assert_eq!(loss.regression_loss(), RegressionLoss::SmoothL1);

        let mut labels = Array3::from_elem((1, 2, 3), LabelState::Positive);
        let predictions = Array4::<f32>::zeros((1, 6, 3, 3));
        let targets = Array4::<f32>::zeros((1, 4, 3, 3));
        let mut grad = Array4::<f32>::zeros((1, 6, 3, 3));
        assert!(loss
            .forward(
                labels.view_mut(),
                predictions.view(),
                targets.view(),
                grad.view_mut()
            )
            .is_err());
        Ok(())
    }

    #[test]
    fn reject_missing_class_channels() -> Result<()> {
        let loss = CenterLossInit::default().build()?;
        let mut labels = Array3::from_elem((1, 2, 2), LabelState::CandidateNegative);
        let predictions = Array4::<f64>::zeros((1, 5, 2, 2));
        let targets = Array4::<f64>::zeros((1, 4, 2, 2));
        let mut grad = Array4::<f64>::zeros((1, 5, 2, 2));

        let err = loss
            .forward(
                labels.view_mut(),
                predictions.view(),
                targets.view(),
                grad.view_mut(),
            )
            .unwrap_err();
        assert!(err.to_string().contains("at least 6 prediction channels"));
        Ok(())
    }

    #[test]
    fn weights_must_fit_the_element_type() -> Result<()> {
        let loss = CenterLossInit {
            regression_loss_weight: Some(1e39),
            ..Default::default()
        }
        .build()?;

        let mut labels = Array3::from_elem((1, 2, 2), LabelState::Positive);
        let predictions = Array4::<f32>::zeros((1, 6, 2, 2));
        let targets = Array4::<f32>::zeros((1, 4, 2, 2));
        let mut grad = Array4::<f32>::zeros((1, 6, 2, 2));
        assert!(loss
            .forward(
                labels.view_mut(),
                predictions.view(),
                targets.view(),
                grad.view_mut()
            )
            .is_err());

        let mut labels = Array3::from_elem((1, 2, 2), LabelState::Positive);
        let predictions = Array4::<f64>::zeros((1, 6, 2, 2));
        let targets = Array4::<f64>::zeros((1, 4, 2, 2));
        let mut grad = Array4::<f64>::zeros((1, 6, 2, 2));
        let output = loss.forward(
            labels.view_mut(),
            predictions.view(),
            targets.view(),
            grad.view_mut(),
        )?;
        assert_eq!(output.regression_loss, 0.0);
        Ok(())
    }
}
