use crate::{
    a_funcs::{ActivFunc, Activation},
    initializer::Initializer,
    layers::{Layer, LayerBuilder},
    storage::{Allocator, GradStorage, Handle, WeightStorage},
};
use serde::{Deserialize, Serialize};

/// Your run of the mill fully connected (dense) layer
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DenseLayer {
    in_size: usize,
    size: usize,

    /// `size` rows of `in_size` weights, one row per neuron.
    weights: Handle,
    biases: Handle,

    activation: Activation,

    #[serde(skip)]
    weighted_inputs: Vec<f64>,
    #[serde(skip)]
    activations: Vec<f64>,
    #[serde(skip)]
    temp: Vec<f64>,
}

impl Layer for DenseLayer {
    fn rebuild(&mut self) {
        self.weighted_inputs = vec![0.; self.size];
        self.activations = vec![0.; self.size];
        self.temp = vec![0.; self.size];
    }

    fn eval(&mut self, input: &[f64], weights: &WeightStorage) -> &[f64] {
        let biases = weights.get(self.biases);
        let weights = weights.get(self.weights);

        // assert dominance
        assert_eq!(weights.len(), self.in_size * self.size);
        assert_eq!(biases.len(), self.size);
        assert_eq!(input.len(), self.in_size);

        for ((row, b), wi) in weights
            .chunks_exact(self.in_size)
            .zip(biases)
            .zip(&mut self.weighted_inputs)
        {
            *wi = row.iter().zip(input).map(|(w, i)| w * i).sum::<f64>() + b;
        }

        for (wi, o) in self.weighted_inputs.iter().zip(&mut self.activations) {
            *o = self.activation.evaluate(*wi);
        }

        &self.activations
    }

    fn calc_gradients(
        &mut self,
        input: &[f64],
        weights: &WeightStorage,
        gradients: &mut GradStorage,
        in_grads: &[f64],
        out_grads: &mut [f64],
    ) {
        let weights = weights.get(self.weights);

        assert_eq!(weights.len(), self.in_size * self.size);
        assert_eq!(input.len(), self.in_size);
        assert_eq!(in_grads.len(), self.size);
        assert_eq!(out_grads.len(), self.in_size);

        // compute activation function derivatives
        for (((temp, inp), out), id) in self
            .temp
            .iter_mut()
            .zip(&self.weighted_inputs)
            .zip(&self.activations)
            .zip(in_grads)
        {
            *temp = self.activation.derivative(*inp, *out) * id;
        }

        // compute bias derivatives
        for (bd, temp) in gradients.get_mut(self.biases).iter_mut().zip(&self.temp) {
            *bd += *temp;
        }

        // compute weight derivative
        for (wds, temp) in gradients
            .get_mut(self.weights)
            .chunks_exact_mut(self.in_size)
            .zip(&self.temp)
        {
            for (wd, inp) in wds.iter_mut().zip(input) {
                *wd += inp * temp;
            }
        }

        //compute output derivatives
        for (row, temp) in weights.chunks_exact(self.in_size).zip(&self.temp) {
            for (od, w) in out_grads.iter_mut().zip(row) {
                *od += w * temp;
            }
        }
    }

    fn output(&self) -> &[f64] {
        &self.activations
    }

    fn in_size(&self) -> usize {
        self.in_size
    }

    fn out_size(&self) -> usize {
        self.size
    }

    fn weight_count(&self) -> usize {
        self.in_size
            .saturating_mul(self.size)
            .saturating_add(self.size)
    }

    // saturating so that absurd sizes read from a file fail validation instead of overflowing
    fn handles(&self) -> Vec<(Handle, usize)> {
        vec![
            (self.weights, self.in_size.saturating_mul(self.size)),
            (self.biases, self.size),
        ]
    }
}

impl DenseLayer {
    pub fn new<I>(
        activation: Activation,
        mut init: I,
        alloc: &mut Allocator,
        in_size: usize,
        size: usize,
    ) -> Self
    where
        I: Initializer,
    {
        let weights = alloc.allocate(
            in_size * size,
            std::iter::repeat_with(|| init.get(in_size, size)),
        );
        let biases = alloc.allocate_zeroed(size);

        Self {
            in_size,
            size,
            weights,
            biases,
            activation,
            weighted_inputs: vec![0.; size],
            activations: vec![0.; size],
            temp: vec![0.; size],
        }
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }
}

pub struct DenseBuilder<I> {
    activation: Activation,
    init: I,
    size: usize,
}

impl<I> DenseBuilder<I> {
    pub fn new(activation: Activation, init: I, size: usize) -> Self {
        DenseBuilder {
            activation,
            init,
            size,
        }
    }
}

impl<I> LayerBuilder for DenseBuilder<I>
where
    I: Initializer,
{
    type Output = DenseLayer;

    fn connect(self, in_size: Option<usize>, alloc: &mut Allocator) -> Self::Output {
        let in_size = in_size.expect("A dense layer needs a layer before it");
        DenseLayer::new(self.activation, self.init, alloc, in_size, self.size)
    }
}
