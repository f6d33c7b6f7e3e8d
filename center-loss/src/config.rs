//! Loss layer configuration format.

use crate::{
    common::*,
    loss::{CenterLossInit, RegressionLoss},
    sampler::SamplerConfig,
};

/// The center loss configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Number of mined negatives per positive.
    #[serde(default = "default_negative_ratio")]
    pub negative_ratio: usize,
    /// The IoU a shifted box must keep with its ground truth, used to size
    /// the heatmap Gaussians.
    #[serde(default = "default_min_overlap")]
    pub min_overlap: R64,
    /// The choice of box regression loss.
    #[serde(default)]
    pub regression_loss: RegressionLoss,
    /// The weight factor of classification loss.
    pub classification_loss_weight: Option<R64>,
    /// The weight factor of box regression loss.
    pub regression_loss_weight: Option<R64>,
    /// Batch composition options.
    pub sampler: SamplerConfig,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.negative_ratio > 0, "negative_ratio must be positive");
        ensure!(
            self.min_overlap.raw() > 0.0 && self.min_overlap.raw() < 1.0,
            "min_overlap must be in range (0, 1)"
        );
        if let Some(weight) = self.classification_loss_weight {
            ensure!(
                weight.raw() >= 0.0,
                "classification_loss_weight must be non-negative"
            );
        }
        if let Some(weight) = self.regression_loss_weight {
            ensure!(weight.raw() >= 0.0, "regression_loss_weight must be non-negative");
        }
        self.sampler.validate()?;
        Ok(())
    }

    pub fn center_loss_init(&self) -> CenterLossInit {
        let Self {
            negative_ratio,
            regression_loss,
            classification_loss_weight,
            regression_loss_weight,
            ..
        } = *self;

        let mut init = CenterLossInit {
            negative_ratio: Some(negative_ratio),
            regression_loss: Some(regression_loss),
            ..Default::default()
        };

        if let Some(weight) = classification_loss_weight {
            init.classification_loss_weight = Some(weight.raw());
        }

        if let Some(weight) = regression_loss_weight {
            init.regression_loss_weight = Some(weight.raw());
        }

        init
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let config: Self = json5::from_str(text).context("failed to parse config")?;
        config.validate()?;
        Ok(config)
    }
}

fn default_negative_ratio() -> usize {
    5
}

fn default_min_overlap() -> R64 {
    r64(0.7)
}
