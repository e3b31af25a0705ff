//! Dataset helpers.
//!
//! A training set is a slice of [`Sample`]s. The helpers here turn raw feature
//! rows and class labels into that form:
//!
//! - [`one_hot`] encodes integer labels against their sorted distinct values
//! - [`Standardizer`] rescales features with one global mean and standard deviation
//! - [`samples`] zips inputs and expected outputs

use crate::{Error, Result};

/// One labelled example.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub input: Vec<f32>,
    pub expected: Vec<f32>,
}

impl Sample {
    pub fn new(input: Vec<f32>, expected: Vec<f32>) -> Self {
        Self { input, expected }
    }
}

impl From<(Vec<f32>, Vec<f32>)> for Sample {
    fn from((input, expected): (Vec<f32>, Vec<f32>)) -> Self {
        Self::new(input, expected)
    }
}

/// Pair up inputs with expected outputs.
pub fn samples(inputs: Vec<Vec<f32>>, expected: Vec<Vec<f32>>) -> Result<Vec<Sample>> {
    if inputs.len() != expected.len() {
        return Err(Error::InvalidData(format!(
            "{} inputs but {} expected outputs",
            inputs.len(),
            expected.len()
        )));
    }
    Ok(inputs.into_iter().zip(expected).map(Sample::from).collect())
}

/// One-hot encode `labels`.
///
/// Classes are the distinct labels in ascending order, so label `k` maps to the
/// position of `k` among them (not to index `k`).
pub fn one_hot(labels: &[u32]) -> Vec<Vec<f32>> {
    let mut classes = labels.to_vec();
    classes.sort_unstable();
    classes.dedup();

    labels
        .iter()
        .map(|label| {
            let mut row = vec![0.0; classes.len()];
            if let Ok(idx) = classes.binary_search(label) {
                row[idx] = 1.0;
            }
            row
        })
        .collect()
}

/// Feature scaling with a single mean and population standard deviation
/// computed over every value of every row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Standardizer {
    mean: f32,
    std_dev: f32,
}

impl Standardizer {
    pub fn fit(rows: &[Vec<f32>]) -> Result<Self> {
        let count: usize = rows.iter().map(Vec::len).sum();
        if count == 0 {
            return Err(Error::InvalidData(
                "cannot standardize an empty dataset".to_owned(),
            ));
        }

        let n = count as f64;
        let mean = rows.iter().flatten().map(|&v| v as f64).sum::<f64>() / n;
        let var = rows
            .iter()
            .flatten()
            .map(|&v| (v as f64 - mean).powi(2))
            .sum::<f64>()
            / n;
        if !(mean.is_finite() && var.is_finite()) {
            return Err(Error::InvalidData("features must be finite".to_owned()));
        }

        Ok(Self {
            mean: mean as f32,
            std_dev: var.sqrt() as f32,
        })
    }

    #[inline]
    pub fn mean(&self) -> f32 {
        self.mean
    }

    #[inline]
    pub fn std_dev(&self) -> f32 {
        self.std_dev
    }

    /// `(v - mean) / std_dev`, or 0 everywhere when every value was equal.
    pub fn transform(&self, rows: &[Vec<f32>]) -> Vec<Vec<f32>> {
        rows.iter()
            .map(|row| row.iter().map(|&v| self.scale(v)).collect())
            .collect()
    }

    #[inline]
    fn scale(&self, v: f32) -> f32 {
        if self.std_dev == 0.0 {
            0.0
        } else {
            (v - self.mean) / self.std_dev
        }
    }
}
