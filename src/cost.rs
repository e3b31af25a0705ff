//! Cost functions.
//!
//! A cost provides two things:
//!
//! - the scalar loss of one prediction against its expected output
//! - the error signal (`delta`) seeded into the output layer during backprop

/// Clamp applied to outputs before taking logarithms in cross-entropy.
pub const LOG_CLAMP: f32 = f32::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
/// Supported cost functions.
pub enum Cost {
    /// `0.5 * ||output - expected||^2`.
    #[default]
    Quadratic,
    /// Binary cross-entropy summed over output neurons.
    ///
    /// Intended for a sigmoid output layer: the activation derivative cancels
    /// out of the output delta.
    CrossEntropy,
}

impl Cost {
    /// Loss of a single prediction.
    ///
    /// Shape contract: `output.len() == expected.len()`.
    #[inline]
    pub fn value(self, output: &[f32], expected: &[f32]) -> f32 {
        debug_assert_eq!(output.len(), expected.len());
        match self {
            Cost::Quadratic => quadratic(output, expected),
            Cost::CrossEntropy => cross_entropy(output, expected),
        }
    }

    /// Output-layer delta.
    ///
    /// `activation_gradient` is `f'(z)` for the output layer's weighted sums.
    /// Cross-entropy does not use it.
    ///
    /// Shape contract: all three slices have the output width.
    #[inline]
    pub fn output_delta(
        self,
        output: &[f32],
        expected: &[f32],
        activation_gradient: &[f32],
    ) -> Vec<f32> {
        debug_assert_eq!(output.len(), expected.len());
        debug_assert_eq!(output.len(), activation_gradient.len());
        match self {
            Cost::Quadratic => output
                .iter()
                .zip(expected)
                .zip(activation_gradient)
                .map(|((&o, &e), &g)| (o - e) * g)
                .collect(),
            Cost::CrossEntropy => output.iter().zip(expected).map(|(&o, &e)| o - e).collect(),
        }
    }
}

fn quadratic(output: &[f32], expected: &[f32]) -> f32 {
    let mut sum_sq = 0.0_f32;
    for (&o, &e) in output.iter().zip(expected) {
        let diff = o - e;
        sum_sq += diff * diff;
    }
    0.5 * sum_sq
}

fn cross_entropy(output: &[f32], expected: &[f32]) -> f32 {
    let mut sum = 0.0_f32;
    for (&o, &e) in output.iter().zip(expected) {
        let log_o = o.clamp(LOG_CLAMP, 1.0 - LOG_CLAMP).ln();
        let log_one_minus_o = (1.0 - o).clamp(LOG_CLAMP, 1.0 - LOG_CLAMP).ln();
        sum += nan_to_num(-e * log_o - (1.0 - e) * log_one_minus_o);
    }
    sum
}

/// NaN to 0, infinities to the largest finite values of the same sign.
#[inline]
fn nan_to_num(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else if x == f32::INFINITY {
        f32::MAX
    } else if x == f32::NEG_INFINITY {
        f32::MIN
    } else {
        x
    }
}
