use super::ConsError;
use crate::{
    layers::{BasicLayer, Layer, LayerBuilder},
    storage::{Allocator, WeightStorage},
};

/// This trait allows network architectures to be build using the LinearBuilder
pub trait LinearConstruction<L>: Sized {
    fn construct(weights: WeightStorage, layers: Vec<L>) -> Result<Self, ConsError>;
}

/// Builder for networks where all layers have only a single input and output.
pub struct LinearBuilder<L = BasicLayer> {
    allocator: Allocator,
    layers: Vec<L>,
}

impl<L> Default for LinearBuilder<L> {
    fn default() -> Self {
        LinearBuilder {
            allocator: Allocator::new(),
            layers: Vec::new(),
        }
    }
}

impl LinearBuilder {
    pub fn new() -> Self {
        Default::default()
    }
}

impl<L> LinearBuilder<L>
where
    L: Layer,
{
    fn last_out_size(&self) -> Option<usize> {
        self.layers.last().map(|l| l.out_size())
    }

    /// Adds a single layer to the network.
    pub fn layer<T>(mut self, layer: T) -> Self
    where
        T: LayerBuilder,
        T::Output: Into<L>,
    {
        let in_size = self.last_out_size();
        let layer = layer.connect(in_size, &mut self.allocator).into();
        self.layers.push(layer);
        self
    }

    /// Builds the network. Fails if the layers don't form a valid network.
    pub fn build<T>(self) -> Result<T, ConsError>
    where
        T: LinearConstruction<L>,
    {
        T::construct(self.allocator.finish(), self.layers)
    }
}
