//! Parameter initializers.
//!
//! Each initializer produces a single scalar from the network's random source.
//! Weight initializers also receive the fan-in (the width of the previous layer)
//! so they can scale the draw:
//!
//! - `Gaussian`: `N(0, 1)`
//! - `Xavier`: `N(0, 1) / sqrt(fan_in)`
//! - `He`: `N(0, sqrt(2 / fan_in))`
//!
//! Gaussian draws use the Box-Muller transform over two uniform draws in `(0, 1]`.

use std::f64::consts::PI;

use rand::Rng;

use crate::{Activation, Error, Result};

/// Bias initializer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum BiasInit {
    /// Every bias gets the same value.
    Constant { value: f32 },
    /// Standard normal draw.
    #[default]
    Gaussian,
}

/// Weight initializer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum WeightInit {
    /// Every weight gets the same value.
    Constant { value: f32 },
    /// Standard normal draw, independent of fan-in.
    Gaussian,
    /// Xavier/Glorot: standard normal scaled by `1 / sqrt(fan_in)`.
    Xavier,
    /// He/Kaiming: normal with standard deviation `sqrt(2 / fan_in)`.
    He,
}

impl BiasInit {
    pub fn validate(self) -> Result<()> {
        match self {
            BiasInit::Constant { value } if !value.is_finite() => Err(Error::InvalidConfig(
                format!("constant bias must be finite, got {value}"),
            )),
            _ => Ok(()),
        }
    }

    #[inline]
    pub fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> f32 {
        match self {
            BiasInit::Constant { value } => value,
            BiasInit::Gaussian => gaussian(rng, 0.0, 1.0),
        }
    }
}

impl WeightInit {
    pub fn validate(self) -> Result<()> {
        match self {
            WeightInit::Constant { value } if !value.is_finite() => Err(Error::InvalidConfig(
                format!("constant weight must be finite, got {value}"),
            )),
            _ => Ok(()),
        }
    }

    /// Draw one weight for a neuron with `fan_in` incoming connections.
    #[inline]
    pub fn sample<R: Rng + ?Sized>(self, rng: &mut R, fan_in: usize) -> f32 {
        debug_assert!(fan_in > 0);
        match self {
            WeightInit::Constant { value } => value,
            WeightInit::Gaussian => gaussian(rng, 0.0, 1.0),
            WeightInit::Xavier => gaussian(rng, 0.0, 1.0) / (fan_in as f32).sqrt(),
            WeightInit::He => gaussian(rng, 0.0, (2.0 / fan_in as f64).sqrt()),
        }
    }

    /// Reasonable default for a given activation.
    #[inline]
    pub fn for_activation(activation: Activation) -> Self {
        match activation {
            Activation::Sigmoid => WeightInit::Xavier,
            Activation::ReLU => WeightInit::He,
        }
    }
}

/// Box-Muller normal draw with the given mean and standard deviation.
pub fn gaussian<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f32 {
    let u1 = 1.0 - rng.r#gen::<f64>();
    let u2 = 1.0 - rng.r#gen::<f64>();
    let std_normal = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).sin();
    (mean + std_dev * std_normal) as f32
}
