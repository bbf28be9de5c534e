use rand::rngs::StdRng;
use rand::Rng;

use crate::config::{ConfigError, Sampler};
use crate::core::state::Ticks;

/// Duration distributions for the harness. The engine itself only sees the
/// [`Sampler`] trait.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dist {
    Constant(Ticks),
    Uniform { lo: Ticks, hi: Ticks },
    Exp { mean: f64 },
}

impl Dist {
    /// Validates parameters; malformed distributions are start-up errors.
    pub fn validated(self) -> Result<Self, ConfigError> {
        match self {
            Self::Uniform { lo, hi } if lo > hi => Err(ConfigError::Distribution(format!(
                "uniform bounds inverted: lo={lo}, hi={hi}"
            ))),
            Self::Exp { mean } if !(mean > 0.0 && mean.is_finite()) => Err(
                ConfigError::Distribution(format!("exponential mean must be positive, got {mean}")),
            ),
            other => Ok(other),
        }
    }

    pub fn boxed(self) -> Result<Box<dyn Sampler>, ConfigError> {
        Ok(Box::new(self.validated()?))
    }
}

impl Sampler for Dist {
    fn sample(&mut self, rng: &mut StdRng) -> Ticks {
        match *self {
            Self::Constant(value) => value,
            Self::Uniform { lo, hi } => rng.random_range(lo..=hi),
            Self::Exp { mean } => {
                let u: f64 = rng.random();
                (-mean * (1.0 - u).ln()).round() as Ticks
            }
        }
    }
}
