//! Mini-batch gradient descent with L2 weight decay.
//!
//! For a batch of `m` samples drawn from a training set, with learning rate `lr`
//! and regularization strength `reg`:
//!
//! - `b <- b - lr * sum(db) / m`
//! - `w <- (1 - lr * reg / m) * w - lr * sum(dw) / m`
//!
//! Biases are never decayed.

use std::borrow::Borrow;

use crate::{Error, Gradients, Network, Parameters, Result, Sample};

#[derive(Debug, Clone, Copy, PartialEq)]
/// Validated SGD hyperparameters.
pub struct Sgd {
    learning_rate: f32,
    regularization: f32,
}

impl Sgd {
    pub fn new(learning_rate: f32, regularization: f32) -> Result<Self> {
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be finite and > 0, got {learning_rate}"
            )));
        }
        if !(regularization.is_finite() && regularization >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "regularization must be finite and >= 0, got {regularization}"
            )));
        }
        Ok(Self {
            learning_rate,
            regularization,
        })
    }

    #[inline]
    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    #[inline]
    pub fn regularization(&self) -> f32 {
        self.regularization
    }

    /// Apply one update from gradients summed over `batch_len` samples.
    pub fn step(&self, params: &mut Parameters, grad_sum: &Gradients, batch_len: usize) {
        debug_assert!(batch_len > 0);
        debug_assert_eq!(params.sizes(), grad_sum.sizes());

        let lr = self.learning_rate;
        let m = batch_len as f32;
        let decay = 1.0 - lr * (self.regularization / m);

        for layer in 1..params.sizes().len() {
            for (b, &g) in params.biases_mut(layer).iter_mut().zip(grad_sum.d_biases(layer)) {
                *b -= lr * g / m;
            }
            for (w, &g) in params
                .weights_mut(layer)
                .iter_mut()
                .zip(grad_sum.d_weights(layer))
            {
                *w = decay * *w - lr * g / m;
            }
        }
    }
}

impl Network {
    /// One regularized gradient step over `batch`.
    ///
    /// Gradients are summed over every sample of the batch before any
    /// parameter changes, so the order of samples within a batch only matters
    /// through float summation.
    pub fn update_parameters<S: Borrow<Sample>>(
        &mut self,
        batch: &[S],
        learning_rate: f32,
        regularization: f32,
    ) -> Result<()> {
        let sgd = Sgd::new(learning_rate, regularization)?;
        if batch.is_empty() {
            return Err(Error::InvalidData("batch must not be empty".to_owned()));
        }
        self.check_samples(batch)?;
        self.apply_batch(batch, &sgd);
        Ok(())
    }

    pub(crate) fn apply_batch<S: Borrow<Sample>>(&mut self, batch: &[S], sgd: &Sgd) {
        let mut grad_sum = Gradients::zeros_like(self.parameters());
        for sample in batch {
            let sample = sample.borrow();
            let grads = self.backprop_unchecked(&sample.input, &sample.expected);
            grad_sum.accumulate(&grads);
        }
        sgd.step(self.parameters_mut(), &grad_sum, batch.len());
    }
}
