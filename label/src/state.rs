use crate::common::*;

/// The state of one location of a target map.
///
/// The training framework stores these as floats. The numeric codes only
/// appear in [`LabelState::to_value`] and [`LabelState::try_from_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumIter)]
pub enum LabelState {
    /// Excluded from every loss. Encoded as `-2`.
    Ignore,
    /// Unassigned background, eligible for hard-negative mining. Encoded as `-1`.
    CandidateNegative,
    /// Background confirmed by mining. Encoded as `0`.
    ConfirmedBackground,
    /// Hard or near-boundary negative. Encoded as `0.5`.
    HardNegative,
    /// Object location. Encoded as `1`.
    Positive,
}

impl LabelState {
    pub fn to_value<T>(self) -> T
    where
        T: Float,
    {
        let one = T::one();
        let two = one + one;
        match self {
            Self::Ignore => -two,
            Self::CandidateNegative => -one,
            Self::ConfirmedBackground => T::zero(),
            Self::HardNegative => one / two,
            Self::Positive => one,
        }
    }

    /// Decodes a stored label. Only exact codes are accepted.
    pub fn try_from_value<T>(value: T) -> Result<Self>
    where
        T: Float,
    {
        let one = T::one();
        let two = one + one;

        let state = if value == -two {
            Self::Ignore
        } else if value == -one {
            Self::CandidateNegative
        } else if value == T::zero() {
            Self::ConfirmedBackground
        } else if value == one / two {
            Self::HardNegative
        } else if value == one {
            Self::Positive
        } else {
            bail!(
                "invalid label value {:?}",
                value.to_f64().unwrap_or(f64::NAN)
            );
        };
        Ok(state)
    }

    /// Returns true for the states that take part in classification losses.
    pub fn is_loss_bearing(self) -> bool {
        matches!(self, Self::HardNegative | Self::Positive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator as _;

    #[test]
    fn legacy_codes() -> Result<()> {
        for state in LabelState::iter() {
            let value: f32 = state.to_value();
            assert_eq!(LabelState::try_from_value(value)?, state);
            let value: f64 = state.to_value();
            assert_eq!(LabelState::try_from_value(value)?, state);
        }

        assert_eq!(LabelState::HardNegative.to_value::<f32>(), 0.5);
        assert_eq!(LabelState::Ignore.to_value::<f64>(), -2.0);
        Ok(())
    }

    #[test]
    fn reject_unknown_codes() {
        for value in [0.25f32, 2.0, -0.5, 0.49999, f32::NAN] {
            assert!(LabelState::try_from_value(value).is_err());
        }
    }

    #[test]
    fn loss_bearing_states() {
        let bearing: Vec<_> = LabelState::iter()
            .filter(|state| state.is_loss_bearing())
            .collect();
        assert_eq!(
            bearing,
            vec![LabelState::HardNegative, LabelState::Positive]
        );
    }
}
