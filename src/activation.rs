//! Activation functions.
//!
//! A layer computes a weighted sum `z = W x + b` per neuron and then applies the
//! activation element-wise: `y = activation(z)`.
//!
//! The forward pass keeps the weighted sums around, so derivatives here are
//! expressed in terms of `z` and recompute the activation instead of reusing a
//! cached output.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
/// Element-wise activation function.
pub enum Activation {
    #[default]
    Sigmoid,
    ReLU,
}

impl Activation {
    /// `y = f(z)`.
    #[inline]
    pub fn compute(self, z: f32) -> f32 {
        match self {
            Activation::Sigmoid => sigmoid(z),
            Activation::ReLU => {
                if z < 0.0 {
                    0.0
                } else {
                    z
                }
            }
        }
    }

    /// `dy/dz` evaluated at the weighted sum `z`.
    #[inline]
    pub fn gradient(self, z: f32) -> f32 {
        match self {
            Activation::Sigmoid => {
                let y = sigmoid(z);
                y * (1.0 - y)
            }
            // 1 at the kink.
            Activation::ReLU => {
                if z >= 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Element-wise `compute` over a vector.
    pub fn compute_all(self, zs: &[f32]) -> Vec<f32> {
        zs.iter().map(|&z| self.compute(z)).collect()
    }

    /// Element-wise `gradient` over a vector.
    pub fn gradient_all(self, zs: &[f32]) -> Vec<f32> {
        zs.iter().map(|&z| self.gradient(z)).collect()
    }
}

#[inline]
fn sigmoid(z: f32) -> f32 {
    // exp(-z) overflows to +inf for very negative z, which still yields 0.
    1.0 / (1.0 + (-z).exp())
}
