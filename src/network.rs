use std::borrow::Borrow;

use rand::rngs::StdRng;

use crate::metrics::softmax;
use crate::{Activation, Cost, Error, Gradients, Parameters, Result, Sample};

/// A fully-connected feed-forward network.
///
/// The network owns its parameters, its activation and cost strategies, and the
/// random source used for shuffling during training. The seed that produced the
/// random source is kept so a run can be reproduced.
#[derive(Debug, Clone)]
pub struct Network {
    params: Parameters,
    activation: Activation,
    cost: Cost,
    seed: u64,
    rng: StdRng,
}

/// Per-layer results of one forward pass.
///
/// `outputs[0]` is the raw input and `weighted_sums[0]` is empty; every later
/// index holds the weighted sums and activations of that layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardPass {
    pub outputs: Vec<Vec<f32>>,
    pub weighted_sums: Vec<Vec<f32>>,
}

impl ForwardPass {
    /// Activations of the final layer.
    #[inline]
    pub fn output(&self) -> &[f32] {
        &self.outputs[self.outputs.len() - 1]
    }
}

impl Network {
    pub(crate) fn from_parts(
        params: Parameters,
        activation: Activation,
        cost: Cost,
        seed: u64,
        rng: StdRng,
    ) -> Self {
        Self {
            params,
            activation,
            cost,
            seed,
            rng,
        }
    }

    #[inline]
    pub fn sizes(&self) -> &[usize] {
        self.params.sizes()
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.params.input_dim()
    }

    #[inline]
    pub fn output_dim(&self) -> usize {
        self.params.output_dim()
    }

    #[inline]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    #[inline]
    pub fn cost(&self) -> Cost {
        self.cost
    }

    /// Seed of the network's random source.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    #[inline]
    pub(crate) fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }

    #[inline]
    pub(crate) fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub(crate) fn check_input(&self, input: &[f32]) -> Result<()> {
        if input.len() != self.input_dim() {
            return Err(Error::InvalidShape(format!(
                "input len {} does not match input width {}",
                input.len(),
                self.input_dim()
            )));
        }
        Ok(())
    }

    pub(crate) fn check_expected(&self, expected: &[f32]) -> Result<()> {
        if expected.len() != self.output_dim() {
            return Err(Error::InvalidShape(format!(
                "expected len {} does not match output width {}",
                expected.len(),
                self.output_dim()
            )));
        }
        Ok(())
    }

    /// Validate every sample of `data` against the layer schedule.
    pub(crate) fn check_samples<S: Borrow<Sample>>(&self, data: &[S]) -> Result<()> {
        for (idx, sample) in data.iter().enumerate() {
            let sample = sample.borrow();
            self.check_input(&sample.input)
                .and_then(|()| self.check_expected(&sample.expected))
                .map_err(|e| match e {
                    Error::InvalidShape(msg) => Error::InvalidShape(format!("sample {idx}: {msg}")),
                    other => other,
                })?;
        }
        Ok(())
    }

    /// Forward pass for a single sample.
    pub fn feed_forward(&self, input: &[f32]) -> Result<ForwardPass> {
        self.check_input(input)?;
        Ok(self.forward_unchecked(input))
    }

    pub(crate) fn forward_unchecked(&self, input: &[f32]) -> ForwardPass {
        let sizes = self.params.sizes();
        let mut outputs = Vec::with_capacity(sizes.len());
        let mut weighted_sums = Vec::with_capacity(sizes.len());
        outputs.push(input.to_vec());
        weighted_sums.push(Vec::new());

        for layer in 1..sizes.len() {
            let prev = &outputs[layer - 1];
            let biases = self.params.biases(layer);
            let mut zs = Vec::with_capacity(sizes[layer]);
            let mut ys = Vec::with_capacity(sizes[layer]);

            for (neuron, &bias) in biases.iter().enumerate() {
                let mut sum = 0.0_f32;
                for (&w, &x) in self.params.weight_row(layer, neuron).iter().zip(prev) {
                    sum += w * x;
                }
                let z = sum + bias;
                zs.push(z);
                ys.push(self.activation.compute(z));
            }

            weighted_sums.push(zs);
            outputs.push(ys);
        }

        ForwardPass {
            outputs,
            weighted_sums,
        }
    }

    /// Inference for a single input.
    ///
    /// With the cross-entropy cost the raw output layer is normalized with a
    /// softmax before it is returned.
    pub fn predict(&self, input: &[f32]) -> Result<Vec<f32>> {
        self.check_input(input)?;
        Ok(self.predict_unchecked(input))
    }

    pub(crate) fn predict_unchecked(&self, input: &[f32]) -> Vec<f32> {
        let mut pass = self.forward_unchecked(input);
        let output = pass.outputs.pop().unwrap_or_default();
        match self.cost {
            Cost::CrossEntropy => softmax(&output),
            Cost::Quadratic => output,
        }
    }

    /// Gradients of the cost of one sample with respect to every bias and weight.
    ///
    /// The result is layer-aligned with the parameters; the input layer slot is empty.
    pub fn backprop(&self, input: &[f32], expected: &[f32]) -> Result<Gradients> {
        self.check_input(input)?;
        self.check_expected(expected)?;
        Ok(self.backprop_unchecked(input, expected))
    }

    pub(crate) fn backprop_unchecked(&self, input: &[f32], expected: &[f32]) -> Gradients {
        let sizes = self.params.sizes();
        let last = sizes.len() - 1;
        let pass = self.forward_unchecked(input);
        let mut grads = Gradients::zeros_like(&self.params);

        let output_gradient = self.activation.gradient_all(&pass.weighted_sums[last]);
        let mut delta = self
            .cost
            .output_delta(&pass.outputs[last], expected, &output_gradient);
        let d_weights = outer(&delta, &pass.outputs[last - 1]);
        grads.set_layer(last, delta.clone(), d_weights);

        for layer in (1..last).rev() {
            let width = sizes[layer];
            let next_weights = self.params.weights(layer + 1);
            let zs = &pass.weighted_sums[layer];

            // delta_l = (W_{l+1}^T delta_{l+1}) * f'(z_l)
            let mut next_delta = Vec::with_capacity(width);
            for k in 0..width {
                let mut sum = 0.0_f32;
                for (n, &d) in delta.iter().enumerate() {
                    sum += next_weights[n * width + k] * d;
                }
                next_delta.push(sum * self.activation.gradient(zs[k]));
            }
            delta = next_delta;

            let d_weights = outer(&delta, &pass.outputs[layer - 1]);
            grads.set_layer(layer, delta.clone(), d_weights);
        }

        grads
    }
}

/// Row-major outer product `delta * prev^T`.
fn outer(delta: &[f32], prev: &[f32]) -> Vec<f32> {
    let mut out = Vec::with_capacity(delta.len() * prev.len());
    for &d in delta {
        for &p in prev {
            out.push(d * p);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::NetworkBuilder;

    fn loss(net: &Network, input: &[f32], expected: &[f32]) -> f32 {
        let pass = net.forward_unchecked(input);
        net.cost().value(pass.output(), expected)
    }

    fn assert_close(analytic: f32, numeric: f32, abs_tol: f32, rel_tol: f32) {
        let diff = (analytic - numeric).abs();
        let scale = analytic.abs().max(numeric.abs()).max(1.0);
        assert!(
            diff <= abs_tol || diff / scale <= rel_tol,
            "analytic={analytic} numeric={numeric} diff={diff}"
        );
    }

    fn perturbed(
        net: &Network,
        layer: usize,
        bias: Option<usize>,
        weight: Option<usize>,
        eps: f32,
    ) -> Network {
        let mut net = net.clone();
        let params = net.parameters_mut();
        if let Some(i) = bias {
            params.biases_mut(layer)[i] += eps;
        }
        if let Some(i) = weight {
            params.weights_mut(layer)[i] += eps;
        }
        net
    }

    #[test]
    fn forward_pass_shapes_follow_the_schedule() {
        let net = NetworkBuilder::new(&[3, 4, 2]).seed(0).build().unwrap();
        let pass = net.feed_forward(&[0.1, 0.2, 0.3]).unwrap();
        assert_eq!(pass.outputs.len(), 3);
        assert_eq!(pass.outputs[0], vec![0.1, 0.2, 0.3]);
        assert!(pass.weighted_sums[0].is_empty());
        assert_eq!(pass.weighted_sums[1].len(), 4);
        assert_eq!(pass.output().len(), 2);
    }

    #[test]
    fn forward_applies_weights_then_bias_then_activation() {
        let net = NetworkBuilder::new(&[2, 1])
            .activation(Activation::ReLU)
            .build_with_parameters(vec![vec![], vec![-1.0]], vec![vec![], vec![vec![2.0, 3.0]]])
            .unwrap();
        let pass = net.feed_forward(&[1.0, 1.0]).unwrap();
        assert_eq!(pass.weighted_sums[1], vec![4.0]);
        assert_eq!(pass.output(), &[4.0]);

        let pass = net.feed_forward(&[-1.0, 0.0]).unwrap();
        assert_eq!(pass.weighted_sums[1], vec![-3.0]);
        assert_eq!(pass.output(), &[0.0]);
    }

    #[test]
    fn backprop_matches_numeric_gradients() {
        for cost in [Cost::Quadratic, Cost::CrossEntropy] {
            let net = NetworkBuilder::new(&[2, 3, 2])
                .cost(cost)
                .seed(5)
                .build()
                .unwrap();
            let input = [0.3_f32, -0.7];
            let expected = [1.0_f32, 0.0];
            let grads = net.backprop(&input, &expected).unwrap();

            let eps = 1e-2_f32;
            for layer in 1..net.sizes().len() {
                for i in 0..net.parameters().biases(layer).len() {
                    let plus = loss(&perturbed(&net, layer, Some(i), None, eps), &input, &expected);
                    let minus = loss(&perturbed(&net, layer, Some(i), None, -eps), &input, &expected);
                    let numeric = (plus - minus) / (2.0 * eps);
                    assert_close(grads.d_biases(layer)[i], numeric, 2e-3, 2e-2);
                }
                for i in 0..net.parameters().weights(layer).len() {
                    let plus = loss(&perturbed(&net, layer, None, Some(i), eps), &input, &expected);
                    let minus = loss(&perturbed(&net, layer, None, Some(i), -eps), &input, &expected);
                    let numeric = (plus - minus) / (2.0 * eps);
                    assert_close(grads.d_weights(layer)[i], numeric, 2e-3, 2e-2);
                }
            }
        }
    }

    #[test]
    fn minimal_schedule_produces_single_layer_gradients() {
        let net = NetworkBuilder::new(&[1, 1])
            .build_with_parameters(vec![vec![], vec![0.0]], vec![vec![], vec![vec![0.0]]])
            .unwrap();
        let grads = net.backprop(&[1.0], &[1.0]).unwrap();

        // z = 0, y = 0.5, f'(z) = 0.25, delta = (0.5 - 1) * 0.25
        assert!(grads.d_biases(0).is_empty());
        assert!(grads.d_weights(0).is_empty());
        assert_eq!(grads.d_biases(1), &[-0.125]);
        assert_eq!(grads.d_weights(1), &[-0.125]);

        let wide = NetworkBuilder::new(&[3, 2]).seed(1).build().unwrap();
        let grads = wide.backprop(&[1.0, 2.0, 3.0], &[0.0, 1.0]).unwrap();
        assert_eq!(grads.d_biases(1).len(), 2);
        assert_eq!(grads.d_weights(1).len(), 6);
        assert_eq!(grads.d_weight_row(1, 1).len(), 3);

        let (d_biases, d_weights) = grads.to_nested();
        assert_eq!(d_biases.len(), 2);
        assert!(d_biases[0].is_empty() && d_weights[0].is_empty());
        assert_eq!(d_weights[1].len(), 2);
        assert!(d_weights[1].iter().all(|row| row.len() == 3));
        assert_eq!(d_weights[1][1], grads.d_weight_row(1, 1));
    }

    #[test]
    fn backprop_is_deterministic() {
        let net = NetworkBuilder::new(&[3, 5, 2]).seed(9).build().unwrap();
        let a = net.backprop(&[0.1, 0.5, -0.3], &[0.0, 1.0]).unwrap();
        let b = net.backprop(&[0.1, 0.5, -0.3], &[0.0, 1.0]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn predict_is_idempotent() {
        let net = NetworkBuilder::new(&[3, 4, 2]).seed(2).build().unwrap();
        let a = net.predict(&[0.3, -0.1, 0.8]).unwrap();
        let b = net.predict(&[0.3, -0.1, 0.8]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn cross_entropy_predictions_are_softmax_normalized() {
        let net = NetworkBuilder::new(&[2, 3, 3])
            .cost(Cost::CrossEntropy)
            .seed(4)
            .build()
            .unwrap();
        let raw = net.feed_forward(&[0.5, 0.5]).unwrap();
        let out = net.predict(&[0.5, 0.5]).unwrap();
        assert_eq!(out, softmax(raw.output()));
        let total: f32 = out.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn shape_mismatches_are_errors() {
        let net = NetworkBuilder::new(&[2, 3, 1]).seed(0).build().unwrap();
        assert!(matches!(net.predict(&[0.0; 3]), Err(Error::InvalidShape(_))));
        assert!(matches!(net.feed_forward(&[0.0]), Err(Error::InvalidShape(_))));
        assert!(matches!(
            net.backprop(&[0.0; 2], &[0.0; 2]),
            Err(Error::InvalidShape(_))
        ));
    }
}
