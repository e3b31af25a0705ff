use std::time::{Duration, Instant};

use log::{debug, info};
use rand::seq::SliceRandom;

use crate::optim::Sgd;
use crate::{Error, Evaluation, Network, Result, Sample};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
/// Hyperparameters for [`Network::fit`].
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
    pub regularization: f32,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 10,
            learning_rate: 0.05,
            regularization: 0.0,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be > 0".to_owned()));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be > 0".to_owned()));
        }
        Sgd::new(self.learning_rate, self.regularization).map(|_| ())
    }

    /// Parse a config from JSON. Missing fields take their default values.
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Outcome of one training epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochReport {
    /// Zero-based epoch index.
    pub epoch: usize,
    /// `None` when the validation slice is empty.
    pub validation: Option<Evaluation>,
    /// Wall time spent on the epoch's parameter updates.
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    pub epochs: Vec<EpochReport>,
}

impl FitReport {
    /// Validation result of the last epoch, if any.
    pub fn final_validation(&self) -> Option<Evaluation> {
        self.epochs.last().and_then(|e| e.validation)
    }
}

impl Network {
    /// Train with mini-batch SGD.
    ///
    /// The data is shuffled once and the first tenth (rounded down) is held out
    /// for validation. Every epoch reshuffles the remaining samples, updates the
    /// parameters once per batch of `batch_size` samples (the last batch may be
    /// shorter) and then evaluates on the held-out slice.
    pub fn fit(&mut self, data: &[Sample], cfg: &TrainConfig) -> Result<FitReport> {
        cfg.validate()?;
        if data.is_empty() {
            return Err(Error::InvalidData(
                "training data must not be empty".to_owned(),
            ));
        }
        self.check_samples(data)?;
        let sgd = Sgd::new(cfg.learning_rate, cfg.regularization)?;

        let mut shuffled: Vec<&Sample> = data.iter().collect();
        shuffled.shuffle(self.rng_mut());
        let (validation, working) = shuffled.split_at(data.len() / 10);
        let mut working = working.to_vec();
        let batches = working.len().div_ceil(cfg.batch_size);

        info!(
            "training {:?} on {} samples ({} held out), {} epochs of {} batches, seed={}",
            self.sizes(),
            working.len(),
            validation.len(),
            cfg.epochs,
            batches,
            self.seed()
        );

        let mut epochs = Vec::with_capacity(cfg.epochs);
        for epoch in 0..cfg.epochs {
            let start = Instant::now();
            working.shuffle(self.rng_mut());

            for (idx, batch) in working.chunks(cfg.batch_size).enumerate() {
                debug!("epoch {} batch {}/{}", epoch + 1, idx + 1, batches);
                self.apply_batch(batch, &sgd);
            }
            let elapsed = start.elapsed();

            let evaluation = if validation.is_empty() {
                None
            } else {
                Some(self.evaluate_unchecked(validation, cfg.regularization))
            };

            match evaluation {
                Some(ev) => info!(
                    "epoch {}/{}: accuracy={:.2} cost={:.4} ({elapsed:?})",
                    epoch + 1,
                    cfg.epochs,
                    ev.accuracy,
                    ev.cost
                ),
                None => {
                    info!("epoch {}/{} ({elapsed:?})", epoch + 1, cfg.epochs);
                    debug!("no validation samples, evaluation skipped");
                }
            }

            epochs.push(EpochReport {
                epoch,
                validation: evaluation,
                elapsed,
            });
        }

        Ok(FitReport { epochs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::NetworkBuilder;

    fn clusters(n: usize) -> Vec<Sample> {
        (0..n)
            .map(|i| {
                let offset = (i % 7) as f32 * 0.05;
                if i % 2 == 0 {
                    Sample::new(vec![0.1 + offset, 0.2 - offset], vec![1.0, 0.0])
                } else {
                    Sample::new(vec![0.9 - offset, 0.8 + offset], vec![0.0, 1.0])
                }
            })
            .collect()
    }

    #[test]
    fn config_validation() {
        assert!(TrainConfig::default().validate().is_ok());

        let bad = [
            TrainConfig {
                epochs: 0,
                ..TrainConfig::default()
            },
            TrainConfig {
                batch_size: 0,
                ..TrainConfig::default()
            },
            TrainConfig {
                learning_rate: 0.0,
                ..TrainConfig::default()
            },
            TrainConfig {
                regularization: -0.5,
                ..TrainConfig::default()
            },
        ];
        for cfg in bad {
            assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))), "{cfg:?}");
        }
    }

    #[test]
    fn fit_reports_every_epoch() {
        let data = clusters(40);
        let mut net = NetworkBuilder::new(&[2, 4, 2]).seed(0).build().unwrap();
        let cfg = TrainConfig {
            epochs: 3,
            batch_size: 8,
            learning_rate: 0.5,
            regularization: 0.1,
        };

        let report = net.fit(&data, &cfg).unwrap();
        assert_eq!(report.epochs.len(), 3);
        for (i, epoch) in report.epochs.iter().enumerate() {
            assert_eq!(epoch.epoch, i);
            let ev = epoch.validation.unwrap();
            assert!((0.0..=1.0).contains(&ev.accuracy));
            assert!(ev.cost.is_finite());
        }
        assert_eq!(report.final_validation(), report.epochs[2].validation);
    }

    #[test]
    fn fit_without_validation_slice_skips_evaluation() {
        let data = clusters(9);
        let mut net = NetworkBuilder::new(&[2, 2]).seed(1).build().unwrap();
        let before = net.parameters().clone();

        let report = net.fit(&data, &TrainConfig::default()).unwrap();
        assert!(report.epochs.iter().all(|e| e.validation.is_none()));
        assert_eq!(report.final_validation(), None);
        assert_ne!(net.parameters(), &before);
    }

    #[test]
    fn fit_is_reproducible_from_the_seed() {
        let data = clusters(30);
        let cfg = TrainConfig {
            epochs: 2,
            batch_size: 4,
            ..TrainConfig::default()
        };

        let mut a = NetworkBuilder::new(&[2, 3, 2]).seed(17).build().unwrap();
        let mut b = NetworkBuilder::new(&[2, 3, 2]).seed(17).build().unwrap();
        let ra = a.fit(&data, &cfg).unwrap();
        let rb = b.fit(&data, &cfg).unwrap();

        assert_eq!(a.parameters(), b.parameters());
        assert_eq!(ra.final_validation(), rb.final_validation());
    }

    #[test]
    fn fit_holds_out_a_tenth_and_reshuffles_the_rest_every_epoch() {
        use rand::SeedableRng;
        use rand::rngs::StdRng;

        let data = clusters(25);
        let cfg = TrainConfig {
            epochs: 3,
            batch_size: 10,
            learning_rate: 0.3,
            regularization: 0.2,
        };
        let biases = vec![vec![], vec![0.1, -0.2, 0.05], vec![0.3, -0.1]];
        let weights = vec![
            vec![],
            vec![vec![0.4, -0.3], vec![0.2, 0.6], vec![-0.5, 0.1]],
            vec![vec![0.7, -0.2, 0.3], vec![-0.4, 0.5, 0.1]],
        ];
        let build = || {
            NetworkBuilder::new(&[2, 3, 2])
                .seed(23)
                .build_with_parameters(biases.clone(), weights.clone())
                .unwrap()
        };

        let mut trained = build();
        let report = trained.fit(&data, &cfg).unwrap();

        let mut replay = build();
        let sgd = Sgd::new(cfg.learning_rate, cfg.regularization).unwrap();
        let mut rng = StdRng::seed_from_u64(23);
        let mut shuffled: Vec<&Sample> = data.iter().collect();
        shuffled.shuffle(&mut rng);
        let (validation, working) = shuffled.split_at(data.len() / 10);
        assert_eq!(validation.len(), 2);
        let mut working = working.to_vec();
        assert_eq!(working.len(), 23);

        for epoch in 0..cfg.epochs {
            working.shuffle(&mut rng);
            let sizes: Vec<usize> = working.chunks(cfg.batch_size).map(<[_]>::len).collect();
            assert_eq!(sizes, vec![10, 10, 3]);
            for batch in working.chunks(cfg.batch_size) {
                replay
                    .update_parameters(batch, sgd.learning_rate(), sgd.regularization())
                    .unwrap();
            }
            let ev = replay.evaluate(validation, sgd.regularization()).unwrap();
            assert_eq!(report.epochs[epoch].validation, Some(ev), "epoch {epoch}");
        }

        assert_eq!(trained.parameters(), replay.parameters());
    }

    #[test]
    fn fit_rejects_bad_data() {
        let mut net = NetworkBuilder::new(&[2, 2]).seed(1).build().unwrap();
        assert!(matches!(
            net.fit(&[], &TrainConfig::default()),
            Err(Error::InvalidData(_))
        ));

        let mut data = clusters(4);
        data.push(Sample::new(vec![1.0, 2.0, 3.0], vec![1.0, 0.0]));
        assert!(matches!(
            net.fit(&data, &TrainConfig::default()),
            Err(Error::InvalidShape(_))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_from_json_fills_defaults() {
        let cfg = TrainConfig::from_json_str(r#"{ "epochs": 3, "learning_rate": 0.5 }"#).unwrap();
        assert_eq!(cfg.epochs, 3);
        assert_eq!(cfg.learning_rate, 0.5);
        assert_eq!(cfg.batch_size, TrainConfig::default().batch_size);

        assert!(matches!(
            TrainConfig::from_json_str(r#"{ "batch_size": 0 }"#),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            TrainConfig::from_json_str("not json"),
            Err(Error::InvalidData(_))
        ));
    }
}
