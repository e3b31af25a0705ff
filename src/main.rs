use std::env;

use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

use scratch_nn::init::gaussian;
use scratch_nn::{
    Activation, Cost, NetworkBuilder, Result, Standardizer, TrainConfig, one_hot, samples,
};

const SEED: u64 = 42;
const SAMPLES_PER_CLASS: usize = 200;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = load_config(env::args().nth(1))?;
    info!("config: {cfg:?}");

    let (features, labels) = two_clusters(SAMPLES_PER_CLASS, SEED);
    let scaler = Standardizer::fit(&features)?;
    info!(
        "standardizing with mean={:.4} std={:.4}",
        scaler.mean(),
        scaler.std_dev()
    );
    let data = samples(scaler.transform(&features), one_hot(&labels))?;

    let mut net = NetworkBuilder::new(&[2, 8, 2])
        .activation(Activation::Sigmoid)
        .cost(Cost::CrossEntropy)
        .seed(SEED)
        .build()?;

    let report = net.fit(&data, &cfg)?;
    match report.final_validation() {
        Some(ev) => info!("final validation: accuracy={:.2} cost={:.4}", ev.accuracy, ev.cost),
        None => warn!("no validation samples"),
    }

    let overall = net.evaluate(&data, cfg.regularization)?;
    info!(
        "full dataset: accuracy={:.2} cost={:.4}",
        overall.accuracy, overall.cost
    );
    Ok(())
}

#[cfg(feature = "serde")]
fn load_config(path: Option<String>) -> Result<TrainConfig> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .map_err(|e| scratch_nn::Error::InvalidConfig(format!("reading {path}: {e}")))?;
            TrainConfig::from_json_str(&json)
        }
        None => Ok(demo_config()),
    }
}

#[cfg(not(feature = "serde"))]
fn load_config(path: Option<String>) -> Result<TrainConfig> {
    if let Some(path) = path {
        warn!("ignoring {path}: config files need the `serde` feature");
    }
    Ok(demo_config())
}

fn demo_config() -> TrainConfig {
    TrainConfig {
        epochs: 30,
        learning_rate: 0.5,
        ..TrainConfig::default()
    }
}

/// Two Gaussian blobs centered at (-1, -1) and (2, 2), labelled 0 and 1.
fn two_clusters(per_class: usize, seed: u64) -> (Vec<Vec<f32>>, Vec<u32>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(2 * per_class);
    let mut labels = Vec::with_capacity(2 * per_class);

    for (label, center) in [(0_u32, -1.0_f64), (1, 2.0)] {
        for _ in 0..per_class {
            features.push(vec![
                gaussian(&mut rng, center, 0.5),
                gaussian(&mut rng, center, 0.5),
            ]);
            labels.push(label);
        }
    }
    (features, labels)
}
