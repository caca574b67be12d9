use std::convert::TryFrom;
use std::error;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{construction::LinearConstruction, Network};
use crate::layers::{BasicLayer, Layer};
use crate::storage::{GradStorage, WeightStorage};

/// This struct represents a neural network and supports the basic functionality of giving predictions based on provided input.
/// Additionally, it can be both serialized and deserialized; deserialization validates the structure.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(into = "NetworkUnvalidated", try_from = "NetworkUnvalidated")]
pub struct FeedForward {
    weights: WeightStorage,
    layers: Vec<BasicLayer>,
    buffers: Buffers,
}

impl Network for FeedForward {
    fn predict(&mut self, input: &[f64]) -> &[f64] {
        assert_eq!(
            input.len(),
            self.in_size(),
            "Input size mismatch. Network input size is {}, received {}",
            self.in_size(),
            input.len()
        );
        if let Some((first, layers)) = self.layers.split_first_mut() {
            first.set_activations(input);
            let mut input = first.output();
            for l in layers {
                input = l.eval(input, &self.weights);
            }
        }
        self.output()
    }

    fn output(&self) -> &[f64] {
        match self.layers.last() {
            Some(l) => l.output(),
            None => &[],
        }
    }

    fn weights(&self) -> &WeightStorage {
        &self.weights
    }

    fn weights_mut(&mut self) -> &mut WeightStorage {
        &mut self.weights
    }

    fn in_size(&self) -> usize {
        self.layers.first().map_or(0, |l| l.out_size())
    }

    fn out_size(&self) -> usize {
        self.layers.last().map_or(0, |l| l.out_size())
    }

    fn topology(&self) -> Vec<usize> {
        self.layers.iter().map(|l| l.out_size()).collect()
    }

    fn calc_gradients(&mut self, gradients: &mut GradStorage, output_gradients: &[f64]) {
        let size = self.out_size();
        assert_eq!(output_gradients.len(), size);
        assert_eq!(gradients.len(), self.weights.len());

        let Buffers { buffer1, buffer2 } = &mut self.buffers;
        buffer1[..size].copy_from_slice(output_gradients);

        let mut buffer1 = buffer1;
        let mut buffer2 = buffer2;

        let mut iter = self.layers.iter_mut().rev().peekable();

        while let Some(layer) = iter.next() {
            if let Some(prev_layer) = iter.peek() {
                let in_size = prev_layer.out_size();
                let out_size = layer.out_size();
                let out_deriv = &mut buffer2[..in_size];
                out_deriv.iter_mut().for_each(|d| *d = 0.); //zero out space needed in the buffer

                layer.calc_gradients(
                    prev_layer.output(),
                    &self.weights,
                    gradients,
                    &buffer1[..out_size],
                    out_deriv,
                );

                // swap the buffers without copying the contents
                std::mem::swap(&mut buffer1, &mut buffer2);
            }
        }
    }
}

impl FeedForward {
    pub fn layers(&self) -> &[BasicLayer] {
        &self.layers
    }
}

impl LinearConstruction<BasicLayer> for FeedForward {
    fn construct(weights: WeightStorage, layers: Vec<BasicLayer>) -> Result<Self, ConsError> {
        Self::try_from(NetworkUnvalidated { weights, layers })
    }
}

impl From<FeedForward> for NetworkUnvalidated {
    fn from(network: FeedForward) -> Self {
        NetworkUnvalidated {
            weights: network.weights,
            layers: network.layers,
        }
    }
}

/// Scratch space for back propagation, each buffer as wide as the widest layer.
#[derive(Clone, Debug, Default)]
struct Buffers {
    buffer1: Vec<f64>,
    buffer2: Vec<f64>,
}

impl Buffers {
    fn new(layers: &[BasicLayer]) -> Self {
        let max = layers.iter().map(|l| l.out_size()).max().unwrap_or(0);
        Self {
            buffer1: vec![0.; max],
            buffer2: vec![0.; max],
        }
    }
}

/// When deserializing, we first construct this object, validate that it's structure is correct and convert to Network
#[derive(Serialize, Deserialize)]
struct NetworkUnvalidated {
    weights: WeightStorage,
    layers: Vec<BasicLayer>,
}

/// An Error during the construction of a network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsError {
    /// A layer is incompatible with the previous one
    Incompatible {
        index: usize,
        received_input: usize,
        expected_input: usize,
    },
    /// The number of weights doesn't match what the layers need.
    WeightCount { weights: usize, expected: usize },
    /// A layer refers to weights outside the storage or to a block of the wrong length.
    BadHandle { index: usize },
    /// The first layer must be an input layer and no other layer may be one.
    MisplacedInput { index: usize },
    /// Every layer needs at least one neuron.
    ZeroWidth { index: usize },
    /// Networks need an input and an output layer.
    TooShallow { layers: usize },
}
impl error::Error for ConsError {}
impl fmt::Display for ConsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsError::Incompatible {
                index,
                received_input,
                expected_input,
            } => write!(
                f,
                "Layer {} is incompatible with layer {}: expected input length of {} but received {}.",
                index,
                index - 1,
                expected_input,
                received_input,
            ),
            ConsError::WeightCount { weights, expected } => write!(
                f,
                "Expected {} weights but {} were provided.",
                expected, weights
            ),
            ConsError::BadHandle { index } => {
                write!(f, "Layer {} refers to weights it doesn't own.", index)
            }
            ConsError::MisplacedInput { index } => write!(
                f,
                "Layer {} is misplaced: only the first layer may be, and must be, an input layer.",
                index
            ),
            ConsError::ZeroWidth { index } => write!(f, "Layer {} has no neurons.", index),
            ConsError::TooShallow { layers } => write!(
                f,
                "The network must have at least an input and an output layer, but it had {}.",
                layers
            ),
        }
    }
}

impl TryFrom<NetworkUnvalidated> for FeedForward {
    type Error = ConsError;
    fn try_from(mut value: NetworkUnvalidated) -> Result<Self, Self::Error> {
        if value.layers.len() < 2 {
            return Err(ConsError::TooShallow {
                layers: value.layers.len(),
            });
        }

        let mut weights: usize = 0;
        for (index, l) in value.layers.iter().enumerate() {
            let is_input = matches!(l, BasicLayer::Input(_));
            if is_input != (index == 0) {
                return Err(ConsError::MisplacedInput { index });
            }
            if l.out_size() == 0 {
                return Err(ConsError::ZeroWidth { index });
            }
            if index > 0 {
                let prev = &value.layers[index - 1];
                if prev.out_size() != l.in_size() {
                    return Err(ConsError::Incompatible {
                        index,
                        received_input: prev.out_size(),
                        expected_input: l.in_size(),
                    });
                }
            }
            for (handle, len) in l.handles() {
                if handle.len() != len || !value.weights.contains(handle) {
                    return Err(ConsError::BadHandle { index });
                }
            }
            weights += l.weight_count();
        }
        if weights != value.weights.len() {
            return Err(ConsError::WeightCount {
                weights: value.weights.len(),
                expected: weights,
            });
        }

        for l in &mut value.layers {
            l.rebuild();
        }

        Ok(FeedForward {
            buffers: Buffers::new(&value.layers),
            weights: value.weights,
            layers: value.layers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        a_funcs::Activation,
        initializer::{Ones, WeightInit},
        layers::{tests::check, DenseBuilder, InputBuilder},
        network::LinearBuilder,
    };

    fn network() -> FeedForward {
        LinearBuilder::new()
            .layer(InputBuilder::new(2))
            .layer(DenseBuilder::new(
                Activation::Identity,
                WeightInit::new(vec![1., 2., 3., 4., 5., 6.]),
                3,
            ))
            .layer(DenseBuilder::new(Activation::Identity, Ones, 1))
            .build()
            .unwrap()
    }

    #[test]
    fn predict_chains_layers() {
        let mut net = network();
        // hidden: [1+4, 3+8, 5+12] = [5, 11, 17], output: 33
        check(&[33.], net.predict(&[1., 2.]), 1e-12, "output");
        assert_eq!(net.topology(), vec![2, 3, 1]);
        assert_eq!(net.weights().len(), 6 + 3 + 3 + 1);
    }

    #[test]
    fn gradients_reach_first_layer() {
        let mut net = network();
        let mut grads = GradStorage::zeroed(net.weights().len());
        net.predict(&[1., 2.]);
        net.calc_gradients(&mut grads, &[1.]);

        // first dense layer: weight grads are input * 1 (identity, ones above)
        check(
            &[1., 2., 1., 2., 1., 2.],
            &grads.raw()[..6],
            1e-12,
            "first layer weight gradients",
        );
        // second dense layer: weight grads are the hidden activations
        check(&[5., 11., 17.], &grads.raw()[9..12], 1e-12, "second layer");
    }

    #[test]
    fn serde_round_trip_keeps_predictions() {
        let mut net = network();
        let json = serde_json::to_string(&net).unwrap();
        let mut loaded: FeedForward = serde_json::from_str(&json).unwrap();
        assert_eq!(net.predict(&[0.5, -1.]), loaded.predict(&[0.5, -1.]));
    }

    #[test]
    fn tampered_weights_are_rejected() {
        let net = network();
        let mut value = serde_json::to_value(&net).unwrap();
        value["weights"].as_array_mut().unwrap().pop();
        let err = serde_json::from_value::<FeedForward>(value).unwrap_err();
        assert!(err.to_string().contains("refers to weights"), "{}", err);
    }

    #[test]
    fn input_must_come_first() {
        let net = network();
        let mut value = serde_json::to_value(&net).unwrap();
        value["layers"].as_array_mut().unwrap().remove(0);
        assert!(serde_json::from_value::<FeedForward>(value).is_err());
    }

    #[test]
    fn single_layer_is_too_shallow() {
        let res = LinearBuilder::new()
            .layer(InputBuilder::new(2))
            .build::<FeedForward>();
        assert_eq!(res.unwrap_err(), ConsError::TooShallow { layers: 1 });
    }
}
