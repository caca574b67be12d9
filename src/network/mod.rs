pub mod construction;
pub mod feed_forward;

pub use self::construction::{LinearBuilder, LinearConstruction};
pub use self::feed_forward::{ConsError, FeedForward};

use crate::storage::{GradStorage, WeightStorage};

/// Trait all neural network architectures must implement
pub trait Network {
    /// Predict the value corresponding to `input`.
    /// Panics if `input` isn't exactly `in_size` long.
    fn predict(&mut self, input: &[f64]) -> &[f64];

    /// Get network output.
    fn output(&self) -> &[f64];

    /// Get network weights.
    fn weights(&self) -> &WeightStorage;

    /// Get mutable weights.
    fn weights_mut(&mut self) -> &mut WeightStorage;

    /// Returns input size of the network
    fn in_size(&self) -> usize;

    /// Return output size of the network
    fn out_size(&self) -> usize;

    /// Width of every layer, input layer first.
    fn topology(&self) -> Vec<usize>;

    /// Accumulates into `gradients` the weight gradients that follow from `output_gradients`,
    /// the derivatives of the loss with respect to the output of the last `predict`.
    fn calc_gradients(&mut self, gradients: &mut GradStorage, output_gradients: &[f64]);
}
