//! Network builder.
//!
//! `NetworkBuilder` is the way to construct a [`Network`]. It takes the layer
//! schedule up front and lets the strategies be swapped before building:
//!
//! - activation (default: sigmoid)
//! - cost (default: quadratic)
//! - bias initializer (default: standard normal)
//! - weight initializer (default: picked from the activation, Xavier for
//!   sigmoid and He for ReLU)
//! - seed (default: drawn from the OS entropy source and recorded on the network)

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::params::validate_sizes;
use crate::{Activation, BiasInit, Cost, Network, Parameters, Result, WeightInit};

#[derive(Debug, Clone)]
/// Builder for a `Network`.
///
/// Example:
///
/// ```rust
/// use scratch_nn::{Activation, Cost, NetworkBuilder};
///
/// # fn main() -> scratch_nn::Result<()> {
/// let net = NetworkBuilder::new(&[784, 100, 10])
///     .activation(Activation::ReLU)
///     .cost(Cost::CrossEntropy)
///     .seed(0)
///     .build()?;
/// assert_eq!(net.sizes(), &[784, 100, 10]);
/// # Ok(())
/// # }
/// ```
pub struct NetworkBuilder {
    sizes: Vec<usize>,
    activation: Activation,
    cost: Cost,
    bias_init: BiasInit,
    weight_init: Option<WeightInit>,
    seed: Option<u64>,
}

impl NetworkBuilder {
    /// Start from a layer schedule: input width, hidden widths, output width.
    ///
    /// The schedule is validated by [`NetworkBuilder::build`].
    pub fn new(sizes: &[usize]) -> Self {
        Self {
            sizes: sizes.to_vec(),
            activation: Activation::default(),
            cost: Cost::default(),
            bias_init: BiasInit::default(),
            weight_init: None,
            seed: None,
        }
    }

    pub fn activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn cost(mut self, cost: Cost) -> Self {
        self.cost = cost;
        self
    }

    pub fn bias_init(mut self, init: BiasInit) -> Self {
        self.bias_init = init;
        self
    }

    pub fn weight_init(mut self, init: WeightInit) -> Self {
        self.weight_init = Some(init);
        self
    }

    /// Fix the seed of the network's random source.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build with freshly initialized parameters.
    ///
    /// Biases are drawn first (layer by layer), then weights (layer by layer,
    /// row-major), all from the same seeded source.
    pub fn build(self) -> Result<Network> {
        validate_sizes(&self.sizes)?;
        self.bias_init.validate()?;
        let weight_init = self
            .weight_init
            .unwrap_or_else(|| WeightInit::for_activation(self.activation));
        weight_init.validate()?;

        let (seed, mut rng) = self.rng();
        let params = Parameters::init_with_rng(&self.sizes, self.bias_init, weight_init, &mut rng)?;
        Ok(Network::from_parts(params, self.activation, self.cost, seed, rng))
    }

    /// Build around existing parameters.
    ///
    /// `biases[l]` has `sizes[l]` entries and `weights[l]` has `sizes[l]` rows of
    /// `sizes[l - 1]` entries; index 0 must be empty in both. The seed still
    /// drives shuffling during training.
    pub fn build_with_parameters(
        self,
        biases: Vec<Vec<f32>>,
        weights: Vec<Vec<Vec<f32>>>,
    ) -> Result<Network> {
        let params = Parameters::from_nested(&self.sizes, biases, weights)?;
        let (seed, rng) = self.rng();
        Ok(Network::from_parts(params, self.activation, self.cost, seed, rng))
    }

    fn rng(&self) -> (u64, StdRng) {
        let seed = self.seed.unwrap_or_else(rand::random);
        (seed, StdRng::seed_from_u64(seed))
    }
}
