use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::EpiError;
use crate::rand::Rng;

const MAX_REJECTIONS: usize = 1000;

/// A normal distribution restricted to `[lower, upper]`, sampled by rejection.
///
/// Bounds that sit deep in a tail would make rejection sampling spin, so after
/// `MAX_REJECTIONS` misses the last draw is clamped into range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TruncatedNormal {
    pub mean: f64,
    pub std_dev: f64,
    pub lower: f64,
    pub upper: f64,
}

impl TruncatedNormal {
    pub fn new(mean: f64, std_dev: f64, lower: f64, upper: f64) -> Result<Self, EpiError> {
        let distribution = TruncatedNormal {
            mean,
            std_dev,
            lower,
            upper,
        };
        distribution.validate()?;
        Ok(distribution)
    }

    pub fn validate(&self) -> Result<(), EpiError> {
        if !(self.std_dev.is_finite() && self.std_dev >= 0.0) {
            return Err(EpiError::ConfigurationError(format!(
                "standard deviation must be finite and non-negative, got {}",
                self.std_dev
            )));
        }
        if !(self.lower.is_finite() && self.upper.is_finite() && self.lower <= self.upper) {
            return Err(EpiError::ConfigurationError(format!(
                "invalid truncation bounds [{}, {}]",
                self.lower, self.upper
            )));
        }
        if !self.mean.is_finite() {
            return Err(EpiError::ConfigurationError(
                "mean must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

impl Distribution<f64> for TruncatedNormal {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let Ok(normal) = Normal::new(self.mean, self.std_dev) else {
            return self.mean.clamp(self.lower, self.upper);
        };
        let mut value = self.mean;
        for _ in 0..MAX_REJECTIONS {
            value = normal.sample(rng);
            if (self.lower..=self.upper).contains(&value) {
                return value;
            }
        }
        value.clamp(self.lower, self.upper)
    }
}
