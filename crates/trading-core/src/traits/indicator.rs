//! Indicator trait definitions.

use crate::error::IndicatorError;

/// Trait for technical indicators.
///
/// Indicators process price data and produce derived values
/// useful for trading decisions.
pub trait Indicator: Send + Sync {
    /// The output type of the indicator.
    type Output;

    /// Calculate indicator values for the given data.
    ///
    /// The result has one entry per full window, so it is shorter than the
    /// input by `period() - 1`.
    fn calculate(&self, data: &[f64]) -> Vec<Self::Output>;

    /// Calculate values aligned 1:1 with the input.
    ///
    /// The first `period() - 1` entries are `None`.
    fn calculate_aligned(&self, data: &[f64]) -> Vec<Option<Self::Output>> {
        let warmup = self.period().saturating_sub(1).min(data.len());
        let mut aligned: Vec<Option<Self::Output>> = Vec::with_capacity(data.len());
        aligned.extend((0..warmup).map(|_| None));
        aligned.extend(self.calculate(data).into_iter().map(Some));
        aligned
    }

    /// Get the minimum data points required.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;

    /// Validate that there's enough data.
    fn validate_data(&self, data: &[f64]) -> Result<(), IndicatorError> {
        if data.len() < self.period() {
            return Err(IndicatorError::InsufficientData {
                required: self.period(),
                available: data.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct WindowSum {
        period: usize,
    }

    impl Indicator for WindowSum {
        type Output = f64;

        fn calculate(&self, data: &[f64]) -> Vec<f64> {
            if data.len() < self.period {
                return vec![];
            }
            data.windows(self.period).map(|w| w.iter().sum()).collect()
        }

        fn period(&self) -> usize {
            self.period
        }

        fn name(&self) -> &str {
            "sum"
        }
    }

    #[test]
    fn test_indicator_validation() {
        let indicator = WindowSum { period: 5 };

        assert!(indicator.validate_data(&[1.0, 2.0, 3.0]).is_err());
        assert!(indicator.validate_data(&[1.0, 2.0, 3.0, 4.0, 5.0]).is_ok());
    }

    #[test]
    fn test_calculate_aligned() {
        let indicator = WindowSum { period: 3 };
        let aligned = indicator.calculate_aligned(&[1.0, 2.0, 3.0, 4.0]);

        assert_eq!(aligned, vec![None, None, Some(6.0), Some(9.0)]);
    }

    #[test]
    fn test_calculate_aligned_short_input() {
        let indicator = WindowSum { period: 3 };
        assert_eq!(indicator.calculate_aligned(&[1.0]), vec![None]);
    }
}
