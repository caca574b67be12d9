use super::{Layer, LayerBuilder};
use crate::storage::{Allocator, GradStorage, Handle, WeightStorage};

use serde::{Deserialize, Serialize};

/// First layer of every network. Holds the values last fed to the network.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct InputLayer {
    size: usize,
    #[serde(skip)]
    activations: Vec<f64>,
}

impl Layer for InputLayer {
    fn rebuild(&mut self) {
        self.activations = vec![0.; self.size]
    }

    fn eval(&mut self, _input: &[f64], _weights: &WeightStorage) -> &[f64] {
        &self.activations
    }

    fn calc_gradients(
        &mut self,
        _input: &[f64],
        _weights: &WeightStorage,
        _gradients: &mut GradStorage,
        _in_grads: &[f64],
        _out_grads: &mut [f64],
    ) {
    }

    fn output(&self) -> &[f64] {
        &self.activations
    }
    fn in_size(&self) -> usize {
        self.size
    }
    fn out_size(&self) -> usize {
        self.size
    }
    fn weight_count(&self) -> usize {
        0
    }
    fn handles(&self) -> Vec<(Handle, usize)> {
        Vec::new()
    }

    /// Force set the layer's activations
    fn set_activations(&mut self, activations: &[f64]) {
        self.activations.copy_from_slice(activations);
    }
}

impl InputLayer {
    pub fn new(size: usize) -> InputLayer {
        InputLayer {
            size,
            activations: vec![0.; size],
        }
    }
}

pub struct InputBuilder {
    size: usize,
}
impl InputBuilder {
    pub fn new(size: usize) -> Self {
        InputBuilder { size }
    }
}

impl LayerBuilder for InputBuilder {
    type Output = InputLayer;
    fn connect(self, in_size: Option<usize>, _alloc: &mut Allocator) -> Self::Output {
        if in_size.is_some() {
            panic!("There can't be any layers before InputLayer")
        }
        InputLayer::new(self.size)
    }
}
