pub use gradient_descent::{GradDescBuilder, GradientDescent};
pub mod gradient_descent;

/// This trait provides interface which must be implemented by optimization
/// algorithms so that they can be used by a [NeuralNet](crate::net::NeuralNet).
pub trait OptimizerAlg {
    /// Modifies the weights based on the gradients such that a minimum can be reached.
    fn update_weights(&mut self, weights: &mut [f64], gradients: &[f64]);

    /// Forget any state carried between updates.
    fn reset(&mut self) {}
}

/// Structs implementing this trait can be constructed into an instance of OptimizerAlg
/// by being provided the length of the data they work on.
pub trait AlgBuilder {
    type Output: OptimizerAlg;
    /// Receives data length and constructs Self::Output
    fn build(self, len: usize) -> Self::Output;
}
