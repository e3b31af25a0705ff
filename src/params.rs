//! Parameter and gradient storage.
//!
//! Both containers are layer-aligned with the layer schedule: index `l` holds the
//! parameters of layer `l`, and index 0 (the input layer) is always empty.
//!
//! - biases: one vector of length `sizes[l]` per layer
//! - weights: one row-major buffer with shape `(sizes[l], sizes[l - 1])` per layer,
//!   so row `n` holds the incoming weights of neuron `n`

use rand::Rng;

use crate::{BiasInit, Error, Result, WeightInit};

/// Biases and weights of a network. Never resized after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    sizes: Vec<usize>,
    biases: Vec<Vec<f32>>,
    weights: Vec<Vec<f32>>,
}

/// Partial derivatives shaped like [`Parameters`].
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    sizes: Vec<usize>,
    d_biases: Vec<Vec<f32>>,
    d_weights: Vec<Vec<f32>>,
}

/// Validate a layer schedule: at least two layers, all widths > 0.
pub fn validate_sizes(sizes: &[usize]) -> Result<()> {
    if sizes.len() < 2 {
        return Err(Error::InvalidShape(format!(
            "layer schedule must include input and output widths, got {} layer(s)",
            sizes.len()
        )));
    }
    if let Some(idx) = sizes.iter().position(|&s| s == 0) {
        return Err(Error::InvalidShape(format!(
            "layer {idx} has width 0; all widths must be > 0"
        )));
    }
    Ok(())
}

fn zeroed(sizes: &[usize]) -> (Vec<Vec<f32>>, Vec<Vec<f32>>) {
    let mut biases = Vec::with_capacity(sizes.len());
    let mut weights = Vec::with_capacity(sizes.len());
    biases.push(Vec::new());
    weights.push(Vec::new());
    for w in sizes.windows(2) {
        biases.push(vec![0.0; w[1]]);
        weights.push(vec![0.0; w[1] * w[0]]);
    }
    (biases, weights)
}

impl Parameters {
    /// All-zero parameters for `sizes`.
    pub fn zeros(sizes: &[usize]) -> Result<Self> {
        validate_sizes(sizes)?;
        let (biases, weights) = zeroed(sizes);
        Ok(Self {
            sizes: sizes.to_vec(),
            biases,
            weights,
        })
    }

    /// Draw every parameter from the given initializers.
    ///
    /// Layers are filled in order; within a layer all biases are drawn first,
    /// then the weights row by row.
    pub fn init_with_rng<R: Rng + ?Sized>(
        sizes: &[usize],
        bias_init: BiasInit,
        weight_init: WeightInit,
        rng: &mut R,
    ) -> Result<Self> {
        bias_init.validate()?;
        weight_init.validate()?;

        let mut params = Self::zeros(sizes)?;
        for layer in 1..sizes.len() {
            let fan_in = sizes[layer - 1];
            for b in params.biases[layer].iter_mut() {
                *b = bias_init.sample(rng);
            }
            for w in params.weights[layer].iter_mut() {
                *w = weight_init.sample(rng, fan_in);
            }
        }
        Ok(params)
    }

    /// Build from explicit nested tensors.
    ///
    /// `biases[l]` must have length `sizes[l]` and `weights[l]` must be a
    /// `sizes[l] x sizes[l - 1]` matrix for every `l >= 1`; both index-0 slots
    /// must be empty.
    pub fn from_nested(
        sizes: &[usize],
        biases: Vec<Vec<f32>>,
        weights: Vec<Vec<Vec<f32>>>,
    ) -> Result<Self> {
        validate_sizes(sizes)?;

        if biases.len() != sizes.len() {
            return Err(Error::InvalidShape(format!(
                "biases has {} layers, schedule has {}",
                biases.len(),
                sizes.len()
            )));
        }
        if weights.len() != sizes.len() {
            return Err(Error::InvalidShape(format!(
                "weights has {} layers, schedule has {}",
                weights.len(),
                sizes.len()
            )));
        }
        if !biases[0].is_empty() || !weights[0].is_empty() {
            return Err(Error::InvalidShape(
                "input layer must not carry biases or weights".to_owned(),
            ));
        }

        let mut flat_weights = Vec::with_capacity(sizes.len());
        flat_weights.push(Vec::new());

        for layer in 1..sizes.len() {
            let (width, fan_in) = (sizes[layer], sizes[layer - 1]);
            if biases[layer].len() != width {
                return Err(Error::InvalidShape(format!(
                    "layer {layer} has {} biases, expected {width}",
                    biases[layer].len()
                )));
            }
            if weights[layer].len() != width {
                return Err(Error::InvalidShape(format!(
                    "layer {layer} has {} weight rows, expected {width}",
                    weights[layer].len()
                )));
            }

            let mut flat = Vec::with_capacity(width * fan_in);
            for (neuron, row) in weights[layer].iter().enumerate() {
                if row.len() != fan_in {
                    return Err(Error::InvalidShape(format!(
                        "layer {layer} neuron {neuron} has {} weights, expected {fan_in}",
                        row.len()
                    )));
                }
                flat.extend_from_slice(row);
            }

            if biases[layer].iter().chain(&flat).any(|v| !v.is_finite()) {
                return Err(Error::InvalidData(format!(
                    "layer {layer} parameters must be finite"
                )));
            }
            flat_weights.push(flat);
        }

        Ok(Self {
            sizes: sizes.to_vec(),
            biases,
            weights: flat_weights,
        })
    }

    /// Copy out as nested `(biases, weights)` tensors (inverse of [`Self::from_nested`]).
    pub fn to_nested(&self) -> (Vec<Vec<f32>>, Vec<Vec<Vec<f32>>>) {
        let weights = (0..self.sizes.len())
            .map(|layer| {
                if layer == 0 {
                    Vec::new()
                } else {
                    self.weights[layer]
                        .chunks(self.sizes[layer - 1])
                        .map(<[f32]>::to_vec)
                        .collect()
                }
            })
            .collect();
        (self.biases.clone(), weights)
    }

    #[inline]
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.sizes[0]
    }

    #[inline]
    pub fn output_dim(&self) -> usize {
        self.sizes[self.sizes.len() - 1]
    }

    #[inline]
    pub fn biases(&self, layer: usize) -> &[f32] {
        &self.biases[layer]
    }

    /// Row-major weights of `layer`, shape `(sizes[layer], sizes[layer - 1])`.
    #[inline]
    pub fn weights(&self, layer: usize) -> &[f32] {
        &self.weights[layer]
    }

    /// Incoming weights of one neuron.
    #[inline]
    pub fn weight_row(&self, layer: usize, neuron: usize) -> &[f32] {
        let fan_in = self.sizes[layer - 1];
        let start = neuron * fan_in;
        &self.weights[layer][start..start + fan_in]
    }

    #[inline]
    pub(crate) fn biases_mut(&mut self, layer: usize) -> &mut [f32] {
        &mut self.biases[layer]
    }

    #[inline]
    pub(crate) fn weights_mut(&mut self, layer: usize) -> &mut [f32] {
        &mut self.weights[layer]
    }

    /// Sum of squared weights over every non-input layer (the L2 penalty term).
    pub fn weights_sum_sq(&self) -> f32 {
        let mut sum = 0.0_f32;
        for layer in &self.weights[1..] {
            for &w in layer {
                sum += w * w;
            }
        }
        sum
    }
}

impl Gradients {
    /// Zeroed gradients for `params`.
    pub fn zeros_like(params: &Parameters) -> Self {
        let (d_biases, d_weights) = zeroed(&params.sizes);
        Self {
            sizes: params.sizes.clone(),
            d_biases,
            d_weights,
        }
    }

    #[inline]
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    #[inline]
    pub fn d_biases(&self, layer: usize) -> &[f32] {
        &self.d_biases[layer]
    }

    /// Row-major weight gradients of `layer`.
    #[inline]
    pub fn d_weights(&self, layer: usize) -> &[f32] {
        &self.d_weights[layer]
    }

    #[inline]
    pub fn d_weight_row(&self, layer: usize, neuron: usize) -> &[f32] {
        let fan_in = self.sizes[layer - 1];
        let start = neuron * fan_in;
        &self.d_weights[layer][start..start + fan_in]
    }

    #[inline]
    pub(crate) fn set_layer(&mut self, layer: usize, d_biases: Vec<f32>, d_weights: Vec<f32>) {
        debug_assert_eq!(d_biases.len(), self.sizes[layer]);
        debug_assert_eq!(d_weights.len(), self.sizes[layer] * self.sizes[layer - 1]);
        self.d_biases[layer] = d_biases;
        self.d_weights[layer] = d_weights;
    }

    /// Element-wise `self += other`.
    pub fn accumulate(&mut self, other: &Gradients) {
        debug_assert_eq!(self.sizes, other.sizes);
        for (acc, g) in self.d_biases.iter_mut().zip(&other.d_biases) {
            for (a, &v) in acc.iter_mut().zip(g) {
                *a += v;
            }
        }
        for (acc, g) in self.d_weights.iter_mut().zip(&other.d_weights) {
            for (a, &v) in acc.iter_mut().zip(g) {
                *a += v;
            }
        }
    }

    /// Copy out as nested `(d_biases, d_weights)` tensors.
    pub fn to_nested(&self) -> (Vec<Vec<f32>>, Vec<Vec<Vec<f32>>>) {
        let d_weights = (0..self.sizes.len())
            .map(|layer| {
                if layer == 0 {
                    Vec::new()
                } else {
                    self.d_weights[layer]
                        .chunks(self.sizes[layer - 1])
                        .map(<[f32]>::to_vec)
                        .collect()
                }
            })
            .collect();
        (self.d_biases.clone(), d_weights)
    }
}
