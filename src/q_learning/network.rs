//! Feed-forward Q-network trained with Adam on mean squared error
//!
//! A small multilayer perceptron: 18 inputs (see
//! [`features`](super::features)), ReLU hidden layers, one linear output.
//! Layers are `ndarray` matrices and every minibatch runs as one matrix
//! product per layer.

use log::debug;
use ndarray::{Array, Array1, Array2, ArrayView1, Axis, Dimension, Zip};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use super::features::{self, FEATURE_LEN};
use crate::{
    Error, Result,
    ports::{Approximator, CheckpointId, CheckpointStore, FitReport, TrainingExample},
    tictactoe::{Action, EncodedState},
};

/// Hyperparameters of the Q-network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Width of each hidden layer
    pub hidden_layers: Vec<usize>,
    /// Adam step size
    pub learning_rate: f64,
    /// Examples per gradient step
    pub batch_size: usize,
    /// Passes over the examples per call to `fit`
    pub passes: usize,
    /// Seed for weight initialization and shuffling
    pub seed: Option<u64>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![18, 10],
            learning_rate: 0.001,
            batch_size: 128,
            passes: 5,
            seed: None,
        }
    }
}

impl NetworkConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_hidden_layers(mut self, hidden_layers: Vec<usize>) -> Self {
        self.hidden_layers = hidden_layers;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_passes(mut self, passes: usize) -> Self {
        self.passes = passes;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Check the configuration before building a network
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(Error::InvalidConfiguration { message });

        if self.hidden_layers.contains(&0) {
            return invalid(format!(
                "hidden layer widths must be positive, got {:?}",
                self.hidden_layers
            ));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return invalid(format!(
                "learning rate {} must be positive and finite",
                self.learning_rate
            ));
        }
        if self.batch_size == 0 {
            return invalid("batch size must be positive".to_string());
        }
        Ok(())
    }

    /// Layer widths including the input and output layers
    fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.hidden_layers.len() + 2);
        sizes.push(FEATURE_LEN);
        sizes.extend_from_slice(&self.hidden_layers);
        sizes.push(1);
        sizes
    }
}

/// Fully connected layer; `weights` has shape `(outputs, inputs)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Dense {
    weights: Array2<f64>,
    biases: Array1<f64>,
}

impl Dense {
    /// Glorot-uniform weights, zero biases
    fn init(inputs: usize, outputs: usize, rng: &mut StdRng) -> Self {
        let limit = (6.0 / (inputs + outputs) as f64).sqrt();
        Self {
            weights: Array2::from_shape_simple_fn((outputs, inputs), || {
                rng.random_range(-limit..limit)
            }),
            biases: Array1::zeros(outputs),
        }
    }

    fn zeros_like(&self) -> Self {
        Self {
            weights: Array2::zeros(self.weights.raw_dim()),
            biases: Array1::zeros(self.biases.raw_dim()),
        }
    }

    fn inputs(&self) -> usize {
        self.weights.ncols()
    }

    fn outputs(&self) -> usize {
        self.weights.nrows()
    }

    /// Forward pass for a batch laid out one example per row
    fn forward(&self, input: &Array2<f64>, relu: bool) -> Array2<f64> {
        let z = input.dot(&self.weights.t()) + &self.biases;
        if relu { z.mapv_into(|v| v.max(0.0)) } else { z }
    }
}

/// First and second moment estimates for one layer
#[derive(Debug, Clone)]
struct Moments {
    first: Dense,
    second: Dense,
}

/// Serialized form of the network parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NetworkParameters {
    layers: Vec<Dense>,
}

/// Multilayer perceptron approximating Q(state, action)
#[derive(Debug, Clone)]
pub struct QNetwork {
    config: NetworkConfig,
    layers: Vec<Dense>,
    moments: Vec<Moments>,
    step: i32,
    rng: StdRng,
}

const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const EPSILON: f64 = 1e-7;

fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

impl QNetwork {
    /// Create a freshly initialized network
    pub fn new(config: NetworkConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = build_rng(config.seed);
        let sizes = config.layer_sizes();
        let layers: Vec<Dense> = sizes
            .windows(2)
            .map(|pair| Dense::init(pair[0], pair[1], &mut rng))
            .collect();
        let moments = Self::zero_moments(&layers);

        Ok(Self {
            config,
            layers,
            moments,
            step: 0,
            rng,
        })
    }

    /// Create a network from a stored checkpoint.
    ///
    /// `None` and `Some(0)` both mean "no checkpoint requested" and yield a
    /// freshly initialized network.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CheckpointNotFound`] if `checkpoint` names an id the
    /// store does not hold.
    pub fn load(
        store: &dyn CheckpointStore,
        checkpoint: Option<CheckpointId>,
        config: NetworkConfig,
    ) -> Result<Self> {
        let mut network = Self::new(config)?;
        match checkpoint {
            None | Some(0) => {}
            Some(id) => {
                let checkpoint = store.load(id)?;
                network.restore(&checkpoint.parameters)?;
                debug!("restored q-network from checkpoint {id}");
            }
        }
        Ok(network)
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Mean squared error of the network over a set of examples
    pub fn loss(&self, examples: &[TrainingExample]) -> f64 {
        if examples.is_empty() {
            return 0.0;
        }
        let total: f64 = examples
            .iter()
            .map(|ex| {
                let error = self.q_value(&ex.state, ex.action) - ex.target;
                error * error
            })
            .sum();
        total / examples.len() as f64
    }

    fn zero_moments(layers: &[Dense]) -> Vec<Moments> {
        layers
            .iter()
            .map(|layer| Moments {
                first: layer.zeros_like(),
                second: layer.zeros_like(),
            })
            .collect()
    }

    fn predict(&self, input: &[f64]) -> f64 {
        let activations = self.trace(ArrayView1::from(input).insert_axis(Axis(0)).to_owned());
        activations
            .last()
            .and_then(|output| output.get((0, 0)).copied())
            .unwrap_or(f64::NAN)
    }

    /// Activations of every layer for a batch, input included
    fn trace(&self, input: Array2<f64>) -> Vec<Array2<f64>> {
        let last = self.layers.len() - 1;
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        activations.push(input);
        for (l, layer) in self.layers.iter().enumerate() {
            let next = layer.forward(&activations[l], l < last);
            activations.push(next);
        }
        activations
    }

    /// One Adam step on the mean squared error of a minibatch
    fn train_batch(&mut self, inputs: Array2<f64>, targets: &Array1<f64>) {
        let scale = 2.0 / targets.len() as f64;
        let activations = self.trace(inputs);
        let output = &activations[self.layers.len()];
        let mut delta = (output - &targets.view().insert_axis(Axis(1))) * scale;

        let mut grads = Vec::with_capacity(self.layers.len());
        for l in (0..self.layers.len()).rev() {
            let layer_input = &activations[l];
            let grad = Dense {
                weights: delta.t().dot(layer_input),
                biases: delta.sum_axis(Axis(0)),
            };

            if l > 0 {
                let mut previous = delta.dot(&self.layers[l].weights);
                // ReLU derivative of the hidden layer feeding this one
                previous.zip_mut_with(layer_input, |p, &a| {
                    if a <= 0.0 {
                        *p = 0.0;
                    }
                });
                delta = previous;
            }
            grads.push(grad);
        }
        grads.reverse();

        self.step += 1;
        let correction = (1.0 - BETA2.powi(self.step)).sqrt() / (1.0 - BETA1.powi(self.step));
        let step_size = self.config.learning_rate * correction;

        for ((layer, moments), grad) in self.layers.iter_mut().zip(&mut self.moments).zip(&grads) {
            adam_update(
                &mut layer.weights,
                &mut moments.first.weights,
                &mut moments.second.weights,
                &grad.weights,
                step_size,
            );
            adam_update(
                &mut layer.biases,
                &mut moments.first.biases,
                &mut moments.second.biases,
                &grad.biases,
                step_size,
            );
        }
    }
}

fn adam_update<D: Dimension>(
    params: &mut Array<f64, D>,
    first: &mut Array<f64, D>,
    second: &mut Array<f64, D>,
    grads: &Array<f64, D>,
    step: f64,
) {
    Zip::from(params)
        .and(first)
        .and(second)
        .and(grads)
        .for_each(|p, m, v, &g| {
            *m = BETA1 * *m + (1.0 - BETA1) * g;
            *v = BETA2 * *v + (1.0 - BETA2) * g * g;
            *p -= step * *m / (v.sqrt() + EPSILON);
        });
}

impl Approximator for QNetwork {
    fn q_value(&self, state: &EncodedState, action: Action) -> f64 {
        self.predict(&features::encode(state, action))
    }

    fn fit(&mut self, examples: &[TrainingExample]) -> Result<FitReport> {
        if examples.is_empty() {
            return Ok(FitReport::default());
        }
        if let Some(bad) = examples.iter().find(|ex| !ex.target.is_finite()) {
            return Err(Error::InvalidConfiguration {
                message: format!("non-finite training target {} for {}", bad.target, bad.action),
            });
        }

        let initial_loss = self.loss(examples);
        let inputs: Vec<[f64; FEATURE_LEN]> = examples
            .iter()
            .map(|ex| features::encode(&ex.state, ex.action))
            .collect();

        let mut order: Vec<usize> = (0..examples.len()).collect();
        for pass in 0..self.config.passes {
            order.shuffle(&mut self.rng);
            for chunk in order.chunks(self.config.batch_size) {
                let batch = Array2::from_shape_fn((chunk.len(), FEATURE_LEN), |(r, c)| {
                    inputs[chunk[r]][c]
                });
                let targets: Array1<f64> = chunk.iter().map(|&i| examples[i].target).collect();
                self.train_batch(batch, &targets);
            }
            debug!("pass {}/{}: loss {:.5}", pass + 1, self.config.passes, self.loss(examples));
        }

        Ok(FitReport {
            examples: examples.len(),
            initial_loss,
            final_loss: self.loss(examples),
        })
    }

    fn snapshot(&self) -> Result<Vec<u8>> {
        let parameters = NetworkParameters {
            layers: self.layers.clone(),
        };
        rmp_serde::to_vec(&parameters).map_err(|e| Error::SerializationContext {
            operation: "serialize q-network parameters".to_string(),
            message: e.to_string(),
        })
    }

    fn restore(&mut self, snapshot: &[u8]) -> Result<()> {
        let parameters: NetworkParameters =
            rmp_serde::from_slice(snapshot).map_err(|e| Error::SerializationContext {
                operation: "deserialize q-network parameters".to_string(),
                message: e.to_string(),
            })?;

        let expected = self.config.layer_sizes();
        let shapes_match = parameters.layers.len() + 1 == expected.len()
            && parameters.layers.iter().zip(expected.windows(2)).all(|(layer, pair)| {
                layer.inputs() == pair[0] && layer.outputs() == pair[1] && layer.biases.len() == pair[1]
            });
        if !shapes_match {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "checkpoint layer shapes do not match network layout {expected:?}"
                ),
            });
        }

        self.moments = Self::zero_moments(&parameters.layers);
        self.layers = parameters.layers;
        self.step = 0;
        Ok(())
    }

    fn name(&self) -> &str {
        "QNetwork"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::InMemoryCheckpointStore,
        ports::{Checkpoint, CheckpointMetadata},
        tictactoe::{Board, Seat},
    };

    fn seeded(seed: u64) -> QNetwork {
        QNetwork::new(NetworkConfig::default().with_seed(seed)).unwrap()
    }

    fn examples() -> Vec<TrainingExample> {
        let board = Board::from_string("XO.X.O...").unwrap();
        let state = board.encode(Seat::One);
        board
            .legal_actions()
            .into_iter()
            .enumerate()
            .map(|(i, action)| TrainingExample {
                state,
                action,
                target: if i % 2 == 0 { 1.0 } else { -1.0 },
            })
            .collect()
    }

    #[test]
    fn test_same_seed_same_weights() {
        let state = Board::new().encode(Seat::One);
        let action = Action::new(1, 1).unwrap();
        assert_eq!(
            seeded(5).q_value(&state, action),
            seeded(5).q_value(&state, action)
        );
    }

    #[test]
    fn test_q_value_is_pure() {
        let network = seeded(1);
        let state = Board::from_string("X...O....").unwrap().encode(Seat::One);
        let action = Action::new(2, 2).unwrap();
        let first = network.q_value(&state, action);
        for _ in 0..10 {
            assert_eq!(network.q_value(&state, action), first);
        }
    }

    #[test]
    fn test_batched_forward_matches_single_predictions() {
        let network = seeded(6);
        let examples = examples();
        let rows: Vec<[f64; FEATURE_LEN]> = examples
            .iter()
            .map(|ex| features::encode(&ex.state, ex.action))
            .collect();
        let batch = Array2::from_shape_fn((rows.len(), FEATURE_LEN), |(r, c)| rows[r][c]);

        let outputs = network.trace(batch).pop().unwrap();
        assert_eq!(outputs.dim(), (examples.len(), 1));
        for (row, example) in examples.iter().enumerate() {
            let single = network.q_value(&example.state, example.action);
            assert!((outputs[[row, 0]] - single).abs() < 1e-12);
        }
    }

    #[test]
    fn test_gradient_step_moves_toward_target() {
        let mut network = seeded(8);
        let example = examples()[0];
        let before = (network.q_value(&example.state, example.action) - example.target).abs();

        let input = ArrayView1::from(&features::encode(&example.state, example.action)[..])
            .insert_axis(Axis(0))
            .to_owned();
        network.train_batch(input, &Array1::from_elem(1, example.target));

        let after = (network.q_value(&example.state, example.action) - example.target).abs();
        assert!(after < before, "error went from {before} to {after}");
    }

    #[test]
    fn test_fit_reduces_loss() {
        let mut network = QNetwork::new(
            NetworkConfig::default()
                .with_seed(7)
                .with_learning_rate(0.01)
                .with_passes(300)
                .with_batch_size(4),
        )
        .unwrap();
        let examples = examples();

        let report = network.fit(&examples).unwrap();
        assert_eq!(report.examples, examples.len());
        assert!(
            report.final_loss < report.initial_loss * 0.5,
            "loss went from {} to {}",
            report.initial_loss,
            report.final_loss
        );
    }

    #[test]
    fn test_fit_empty_is_noop() {
        let mut network = seeded(2);
        let before = network.snapshot().unwrap();
        let report = network.fit(&[]).unwrap();
        assert_eq!(report, FitReport::default());
        assert_eq!(network.snapshot().unwrap(), before);
    }

    #[test]
    fn test_fit_rejects_non_finite_targets() {
        let mut network = seeded(2);
        let mut examples = examples();
        examples[0].target = f64::NAN;
        assert!(network.fit(&examples).is_err());
    }

    #[test]
    fn test_snapshot_restore_reproduces_q_values() {
        let mut trained = seeded(3);
        trained.fit(&examples()).unwrap();
        let snapshot = trained.snapshot().unwrap();

        let mut fresh = seeded(99);
        fresh.restore(&snapshot).unwrap();

        for example in examples() {
            assert_eq!(
                fresh.q_value(&example.state, example.action),
                trained.q_value(&example.state, example.action)
            );
        }
    }

    #[test]
    fn test_restore_rejects_mismatched_layout() {
        let snapshot = seeded(3).snapshot().unwrap();
        let mut wider =
            QNetwork::new(NetworkConfig::default().with_hidden_layers(vec![32])).unwrap();
        assert!(matches!(
            wider.restore(&snapshot),
            Err(Error::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_load_checkpoint_semantics() {
        let store = InMemoryCheckpointStore::new();
        let trained = seeded(4);
        store
            .save(&Checkpoint::new(
                2,
                trained.snapshot().unwrap(),
                CheckpointMetadata::default(),
            ))
            .unwrap();

        let config = NetworkConfig::default().with_seed(10);
        assert!(QNetwork::load(&store, None, config.clone()).is_ok());
        assert!(QNetwork::load(&store, Some(0), config.clone()).is_ok());
        assert!(matches!(
            QNetwork::load(&store, Some(4), config.clone()),
            Err(Error::CheckpointNotFound { id: 4 })
        ));

        let loaded = QNetwork::load(&store, Some(2), config).unwrap();
        let state = Board::new().encode(Seat::One);
        let action = Action::new(0, 0).unwrap();
        assert_eq!(
            loaded.q_value(&state, action),
            trained.q_value(&state, action)
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(QNetwork::new(NetworkConfig::default().with_hidden_layers(vec![0])).is_err());
        assert!(QNetwork::new(NetworkConfig::default().with_learning_rate(-1.0)).is_err());
        assert!(QNetwork::new(NetworkConfig::default().with_batch_size(0)).is_err());
    }
}
