//! A from-scratch feed-forward neural network.
//!
//! `scratch-nn` implements a fully-connected multi-layer perceptron trained with
//! mini-batch stochastic gradient descent and hand-written backpropagation. It
//! is meant to be read: every step of the forward pass, the backward pass and
//! the regularized update is plain loops over `f32` slices.
//!
//! # Data layout and shapes
//!
//! - Scalars are `f32`.
//! - A network is described by its layer schedule `sizes`: input width, hidden
//!   widths, output width. At least two entries, none of them zero.
//! - Per-layer tensors are indexed by layer. Index 0 is the input layer and
//!   carries no parameters; its slots are empty.
//! - Layer `l` weights are row-major with shape `(sizes[l], sizes[l - 1])`, so
//!   row `n` holds the incoming weights of neuron `n`.
//!
//! # Errors
//!
//! Public operations validate shapes and hyperparameters and return [`Result`].
//! Numeric blow-ups (non-finite parameters after a huge learning rate) are not
//! treated as errors.
//!
//! # Quick start
//!
//! ```rust
//! use scratch_nn::{Activation, Cost, NetworkBuilder, Sample, TrainConfig};
//!
//! # fn main() -> scratch_nn::Result<()> {
//! let data: Vec<Sample> = (0..40)
//!     .map(|i| {
//!         let x = (i % 10) as f32 / 10.0;
//!         if i % 2 == 0 {
//!             Sample::new(vec![x, 0.0], vec![1.0, 0.0])
//!         } else {
//!             Sample::new(vec![0.0, x], vec![0.0, 1.0])
//!         }
//!     })
//!     .collect();
//!
//! let mut net = NetworkBuilder::new(&[2, 8, 2])
//!     .activation(Activation::Sigmoid)
//!     .cost(Cost::CrossEntropy)
//!     .seed(0)
//!     .build()?;
//!
//! let report = net.fit(
//!     &data,
//!     &TrainConfig {
//!         epochs: 5,
//!         batch_size: 4,
//!         learning_rate: 0.5,
//!         regularization: 0.0,
//!     },
//! )?;
//! assert_eq!(report.epochs.len(), 5);
//!
//! let probabilities = net.predict(&[0.9, 0.0])?;
//! assert_eq!(probabilities.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! # Lower-level steps
//!
//! The pieces `fit` is made of are public too:
//!
//! ```rust
//! use scratch_nn::{NetworkBuilder, Sample};
//!
//! # fn main() -> scratch_nn::Result<()> {
//! let mut net = NetworkBuilder::new(&[3, 4, 2]).seed(7).build()?;
//!
//! let pass = net.feed_forward(&[0.1, -0.2, 0.3])?;
//! assert_eq!(pass.output().len(), 2);
//!
//! let grads = net.backprop(&[0.1, -0.2, 0.3], &[0.0, 1.0])?;
//! assert_eq!(grads.d_weights(2).len(), 2 * 4);
//!
//! let batch = [Sample::new(vec![0.1, -0.2, 0.3], vec![0.0, 1.0])];
//! net.update_parameters(&batch, 0.1, 0.0)?;
//! let eval = net.evaluate(&batch, 0.0)?;
//! assert!((0.0..=1.0).contains(&eval.accuracy));
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod builder;
pub mod cost;
pub mod data;
pub mod error;
pub mod init;
pub mod metrics;
pub mod network;
pub mod optim;
pub mod params;
pub mod train;

pub use activation::Activation;
pub use builder::NetworkBuilder;
pub use cost::Cost;
pub use data::{Sample, Standardizer, one_hot, samples};
pub use error::{Error, Result};
pub use init::{BiasInit, WeightInit};
pub use metrics::{Evaluation, argmax, softmax};
pub use network::{ForwardPass, Network};
pub use optim::Sgd;
pub use params::{Gradients, Parameters};
pub use train::{EpochReport, FitReport, TrainConfig};
