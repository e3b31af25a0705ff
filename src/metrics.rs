//! Evaluation.
//!
//! Metrics do not participate in backprop. Per-sample work runs in parallel on
//! the rayon pool; the reduction over samples is sequential so the result does
//! not depend on thread scheduling.

use std::borrow::Borrow;

use rayon::prelude::*;

use crate::{Error, Network, Result, Sample};

/// Accuracy and regularized cost of a network over a dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Evaluation {
    /// Fraction of samples whose predicted class matches the expected one,
    /// rounded to two decimals.
    pub accuracy: f32,
    /// Mean per-sample cost plus `0.5 * (reg / n) * sum(w^2)`.
    ///
    /// Not rounded; only the training log formats it to four decimals.
    pub cost: f32,
}

impl Network {
    /// Accuracy and cost over `data`.
    ///
    /// `regularization` only affects the weight penalty term of the cost.
    pub fn evaluate<S>(&self, data: &[S], regularization: f32) -> Result<Evaluation>
    where
        S: Borrow<Sample> + Sync,
    {
        if data.is_empty() {
            return Err(Error::InvalidData(
                "evaluation data must not be empty".to_owned(),
            ));
        }
        if !(regularization.is_finite() && regularization >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "regularization must be finite and >= 0, got {regularization}"
            )));
        }
        self.check_samples(data)?;
        Ok(self.evaluate_unchecked(data, regularization))
    }

    /// Accuracy alone; skips the cost computation.
    pub fn evaluate_accuracy<S>(&self, data: &[S]) -> Result<f32>
    where
        S: Borrow<Sample> + Sync,
    {
        if data.is_empty() {
            return Err(Error::InvalidData(
                "evaluation data must not be empty".to_owned(),
            ));
        }
        self.check_samples(data)?;

        let hits = data
            .par_iter()
            .map(|sample| {
                let sample = sample.borrow();
                let predicted = self.predict_unchecked(&sample.input);
                argmax(&predicted) == argmax(&sample.expected)
            })
            .filter(|&hit| hit)
            .count();

        Ok(round2(hits as f32 / data.len() as f32))
    }

    pub(crate) fn evaluate_unchecked<S>(&self, data: &[S], regularization: f32) -> Evaluation
    where
        S: Borrow<Sample> + Sync,
    {
        let total = data.len() as f32;

        let per_sample: Vec<(bool, f32)> = data
            .par_iter()
            .map(|sample| {
                let sample = sample.borrow();
                let predicted = self.predict_unchecked(&sample.input);
                let hit = argmax(&predicted) == argmax(&sample.expected);
                (hit, self.cost().value(&predicted, &sample.expected))
            })
            .collect();

        let mut hits = 0_usize;
        let mut cost = 0.5 * (regularization / total) * self.parameters().weights_sum_sq();
        for (hit, value) in per_sample {
            if hit {
                hits += 1;
            }
            cost += value / total;
        }

        Evaluation {
            accuracy: round2(hits as f32 / total),
            cost,
        }
    }
}

/// Index of the largest element; the first one wins on ties.
///
/// Returns 0 for an empty slice.
pub fn argmax(xs: &[f32]) -> usize {
    let mut best = 0;
    for (i, &x) in xs.iter().enumerate().skip(1) {
        if x > xs[best] {
            best = i;
        }
    }
    best
}

/// Numerically stable softmax.
pub fn softmax(xs: &[f32]) -> Vec<f32> {
    let max = xs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = xs.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[inline]
fn round2(x: f32) -> f32 {
    (x * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{Cost, NetworkBuilder};

    fn identity_2x2() -> Network {
        NetworkBuilder::new(&[2, 2])
            .activation(crate::Activation::ReLU)
            .build_with_parameters(
                vec![vec![], vec![0.0, 0.0]],
                vec![vec![], vec![vec![1.0, 0.0], vec![0.0, 1.0]]],
            )
            .unwrap()
    }

    #[test]
    fn argmax_prefers_the_first_maximum() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), 1);
        assert_eq!(argmax(&[0.5, 0.5, 0.1]), 0);
        assert_eq!(argmax(&[-3.0, -1.0, -1.0]), 1);
        assert_eq!(argmax(&[]), 0);
    }

    #[test]
    fn softmax_sums_to_one_and_survives_large_inputs() {
        let p = softmax(&[1000.0, 1000.0]);
        assert_eq!(p, vec![0.5, 0.5]);

        let p = softmax(&[1.0, 2.0, 3.0]);
        let total: f32 = p.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!(p[2] > p[1] && p[1] > p[0]);
    }

    #[test]
    fn accuracy_is_rounded_to_two_decimals() {
        let net = identity_2x2();
        let data = vec![
            Sample::new(vec![1.0, 0.0], vec![1.0, 0.0]),
            Sample::new(vec![0.0, 1.0], vec![1.0, 0.0]),
            Sample::new(vec![3.0, 0.0], vec![1.0, 0.0]),
        ];
        assert_eq!(net.evaluate_accuracy(&data).unwrap(), 0.67);
        assert_eq!(net.evaluate(&data, 0.0).unwrap().accuracy, 0.67);
    }

    #[test]
    fn cost_is_mean_sample_cost_plus_weight_penalty() {
        let net = identity_2x2();
        let data = vec![
            Sample::new(vec![1.0, 0.0], vec![1.0, 0.0]),
            Sample::new(vec![0.0, 1.0], vec![1.0, 0.0]),
        ];

        // Sample costs are 0 and 0.5 * (1 + 1); sum(w^2) = 2.
        let plain = net.evaluate(&data, 0.0).unwrap();
        assert_eq!(plain.cost, 0.5);
        assert_eq!(plain.accuracy, 0.5);

        let penalized = net.evaluate(&data, 4.0).unwrap();
        assert_eq!(penalized.cost, 0.5 * (4.0 / 2.0) * 2.0 + 0.5);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let net = NetworkBuilder::new(&[3, 6, 3])
            .cost(Cost::CrossEntropy)
            .seed(21)
            .build()
            .unwrap();
        let data: Vec<Sample> = (0..64)
            .map(|i| {
                let x = i as f32 / 64.0;
                let mut expected = vec![0.0; 3];
                expected[i % 3] = 1.0;
                Sample::new(vec![x, 1.0 - x, x * x], expected)
            })
            .collect();

        let a = net.evaluate(&data, 0.3).unwrap();
        let b = net.evaluate(&data, 0.3).unwrap();
        assert_eq!(a, b);
        assert!((0.0..=1.0).contains(&a.accuracy));
        assert!(a.cost.is_finite());
    }

    #[test]
    fn evaluation_rejects_bad_input() {
        let net = identity_2x2();
        let empty: Vec<Sample> = Vec::new();
        assert!(matches!(net.evaluate(&empty, 0.0), Err(Error::InvalidData(_))));
        assert!(matches!(net.evaluate_accuracy(&empty), Err(Error::InvalidData(_))));

        let bad = vec![Sample::new(vec![1.0], vec![1.0, 0.0])];
        assert!(matches!(net.evaluate(&bad, 0.0), Err(Error::InvalidShape(_))));
        let good = vec![Sample::new(vec![1.0, 0.0], vec![1.0, 0.0])];
        assert!(matches!(net.evaluate(&good, -1.0), Err(Error::InvalidConfig(_))));
    }
}
