pub mod dense_layer;
pub mod input_layer;

pub use dense_layer::{DenseBuilder, DenseLayer};
pub use input_layer::{InputBuilder, InputLayer};

use crate::storage::{Allocator, GradStorage, Handle, WeightStorage};

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

#[enum_dispatch]
pub trait Layer {
    /// Reallocate memory needed for evaluation.
    /// Used after deserialization as this memory doesnt need to be serialized.
    fn rebuild(&mut self);

    /// Evaluate the layer's output.
    fn eval(&mut self, input: &[f64], weights: &WeightStorage) -> &[f64];

    /// Accumulates the gradients of the layer's weights into `gradients`. `in_grads` are the
    /// derivatives of the loss with respect to this layer's output, the derivatives with respect
    /// to its input are added to `out_grads`, which the caller zeroes beforehand.
    fn calc_gradients(
        &mut self,
        input: &[f64],
        weights: &WeightStorage,
        gradients: &mut GradStorage,
        in_grads: &[f64],
        out_grads: &mut [f64],
    );

    /// Get layer's output
    fn output(&self) -> &[f64];
    /// Get layer's input size
    fn in_size(&self) -> usize;
    /// Get layer's output size
    fn out_size(&self) -> usize;
    /// Get number of weights in the layer
    fn weight_count(&self) -> usize;
    /// Blocks of the weight storage owned by the layer, paired with their expected lengths.
    fn handles(&self) -> Vec<(Handle, usize)>;

    /// This function should panic for all non-input layer types
    fn set_activations(&mut self, _activations: &[f64]) {
        unimplemented!(
            "set_activations not implemented for {}",
            std::any::type_name::<Self>()
        )
    }
}

/// Trait all layer builders must implement in order to be added to a LinearBuilder.
pub trait LayerBuilder {
    type Output: Layer;
    /// Connect a layer to the previous one. `in_size` will be None if there are no layers before.
    fn connect(self, in_size: Option<usize>, alloc: &mut Allocator) -> Self::Output;
}

/// This enum describes the architecture of a layer so it can be easily serialized and deserialized.
#[enum_dispatch(Layer)]
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BasicLayer {
    Input(InputLayer),
    Dense(DenseLayer),
}

#[cfg(test)]
pub(crate) mod tests {
    /// Compares two arrays with the given error tolerance. Returns None if either of the arrays contains NaN.
    pub(crate) fn is_equal_ish(left: &[f64], right: &[f64], tolerance: f64) -> Option<bool> {
        assert_eq!(left.len(), right.len());
        let err = left
            .iter()
            .zip(right)
            .map(|(l, r)| f64::abs(l - r))
            .try_fold(0., |a: f64, b| a.partial_cmp(&b).map(|_| a.max(b)));
        err.map(|e| e < tolerance)
    }

    pub(crate) fn check(expected: &[f64], output: &[f64], tolerance: f64, id: &str) {
        let diag = || format!("expected: {:?}\nreceived: {:?}", expected, output);

        match is_equal_ish(expected, output, tolerance) {
            Some(true) => {}
            Some(false) => panic!("Evaluation produced incorrect {}.\n{}", id, diag()),
            None => panic!("Evaluation produced a NaN\n{}", diag()),
        }
    }
}
