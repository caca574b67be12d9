use std::path::Path;

use log::debug;

use crate::config::NetConfig;
use crate::error::{NetError, Op, Result};
use crate::layers::{DenseBuilder, InputBuilder};
use crate::loss::{Loss, LossFunc, MeanSquared};
use crate::network::{FeedForward, LinearBuilder, Network};
use crate::optimizer::{AlgBuilder, GradDescBuilder, GradientDescent, OptimizerAlg};
use crate::persist;
use crate::storage::GradStorage;

/// Networks needing more weights than this are refused instead of exhausting memory.
pub const MAX_WEIGHTS: usize = 1 << 27;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Nothing has been fed yet.
    Fresh,
    /// Activations reflect the last input and may be back propagated.
    Forwarded,
    /// The last forward pass has been consumed by a back propagation.
    Trained,
}

/// A single network instance: the network itself, the optimizer training it and the
/// bookkeeping needed to enforce the feed forward, back propagation ordering.
#[derive(Clone, Debug)]
pub struct NeuralNet {
    network: FeedForward,
    optimizer: GradientDescent,
    loss: MeanSquared,
    grads: GradStorage,
    config: NetConfig,
    state: State,
    recent_average_error: f64,
}

impl NeuralNet {
    /// Builds a network with the given layer widths, input layer first.
    pub fn new(topology: &[usize], config: NetConfig) -> Result<Self> {
        config.validate()?;
        check_topology(topology)?;

        let seed = config.seed.unwrap_or_else(rand::random);
        let mut init = config.init.build(seed);

        let mut builder = LinearBuilder::new().layer(InputBuilder::new(topology[0]));
        for size in &topology[1..] {
            builder = builder.layer(DenseBuilder::new(config.activation, &mut init, *size));
        }
        let network = builder
            .build::<FeedForward>()
            .map_err(|e| NetError::InvalidTopology(e.to_string()))?;

        debug!(
            "created network {:?} ({} weights, seed {})",
            topology,
            network.weights().len(),
            seed
        );
        Ok(Self::from_parts(network, config, 0.))
    }

    pub(crate) fn from_parts(
        network: FeedForward,
        config: NetConfig,
        recent_average_error: f64,
    ) -> Self {
        let len = network.weights().len();
        Self {
            optimizer: GradDescBuilder::new()
                .l_rate(config.learning_rate)
                .momentum(config.momentum)
                .build(len),
            grads: GradStorage::zeroed(len),
            loss: MeanSquared,
            network,
            config,
            state: State::Fresh,
            recent_average_error,
        }
    }

    /// Loads a network previously written by [save](Self::save).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let net = persist::load(path.as_ref())?;
        debug!(
            "loaded network {:?} from {}",
            net.topology(),
            path.as_ref().display()
        );
        Ok(net)
    }

    /// Writes the network to `path`, replacing whatever was there.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persist::save(self, path.as_ref())?;
        debug!("saved network to {}", path.as_ref().display());
        Ok(())
    }

    /// Propagates `input` through the network. Weights are left untouched.
    pub fn feed_forward(&mut self, input: &[f64]) -> Result<()> {
        check_len(Op::FeedForward, self.in_size(), input.len())?;
        check_finite("input", input)?;
        self.network.predict(input);
        self.state = State::Forwarded;
        Ok(())
    }

    /// Trains the network towards `target` for the input of the preceding feed forward.
    /// Returns the mean squared error of that prediction.
    pub fn back_prop(&mut self, target: &[f64]) -> Result<f64> {
        if self.state != State::Forwarded {
            return Err(NetError::OutOfOrder { op: Op::BackProp });
        }
        check_len(Op::BackProp, self.out_size(), target.len())?;
        check_finite("target", target)?;

        let Loss { loss, grads } = self.loss.eval(self.network.output(), target);

        self.grads.zero();
        self.network.calc_gradients(&mut self.grads, &grads);
        self.optimizer
            .update_weights(self.network.weights_mut().raw_mut(), self.grads.raw());

        let s = self.config.error_smoothing;
        self.recent_average_error = (self.recent_average_error * s + loss.sqrt()) / (s + 1.);
        self.state = State::Trained;
        Ok(loss)
    }

    /// Copies the output of the last feed forward into `output`.
    pub fn results(&self, output: &mut [f64]) -> Result<()> {
        if self.state == State::Fresh {
            return Err(NetError::OutOfOrder { op: Op::GetResults });
        }
        check_len(Op::GetResults, self.out_size(), output.len())?;
        output.copy_from_slice(self.network.output());
        Ok(())
    }

    /// Running average of the root mean squared error of recent back propagations,
    /// 0 before the first one.
    pub fn recent_average_error(&self) -> f64 {
        self.recent_average_error
    }

    pub fn topology(&self) -> Vec<usize> {
        self.network.topology()
    }

    pub fn in_size(&self) -> usize {
        self.network.in_size()
    }

    pub fn out_size(&self) -> usize {
        self.network.out_size()
    }

    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    pub fn network(&self) -> &FeedForward {
        &self.network
    }
}

fn check_topology(topology: &[usize]) -> Result<()> {
    if topology.len() < 2 {
        return Err(NetError::InvalidTopology(format!(
            "need at least an input and an output layer, got {} layers",
            topology.len()
        )));
    }
    if let Some(i) = topology.iter().position(|s| *s == 0) {
        return Err(NetError::InvalidTopology(format!("layer {} is empty", i)));
    }
    let weights = topology
        .windows(2)
        .try_fold(0usize, |acc, w| {
            w[0].checked_mul(w[1])?.checked_add(w[1])?.checked_add(acc)
        })
        .filter(|w| *w <= MAX_WEIGHTS);
    if weights.is_none() {
        return Err(NetError::InvalidTopology(format!(
            "{:?} needs more than {} weights",
            topology, MAX_WEIGHTS
        )));
    }
    Ok(())
}

fn check_len(op: Op, expected: usize, received: usize) -> Result<()> {
    if expected == received {
        Ok(())
    } else {
        Err(NetError::ShapeMismatch {
            op,
            expected,
            received,
        })
    }
}

fn check_finite(what: &str, values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(NetError::InvalidArgument(format!(
            "{}[{}] is not a finite number",
            what, i
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::a_funcs::Activation;
    use crate::layers::tests::check;

    fn net(topology: &[usize]) -> NeuralNet {
        NeuralNet::new(topology, NetConfig::new().seed(11)).unwrap()
    }

    #[test]
    fn topology_is_validated() {
        let cases: [&[usize]; 4] = [&[], &[3], &[2, 0, 1], &[usize::MAX, 2]];
        for t in cases.iter() {
            match NeuralNet::new(t, NetConfig::new()) {
                Err(NetError::InvalidTopology(_)) => {}
                other => panic!("{:?} was accepted: {:?}", t, other.map(|n| n.topology())),
            }
        }
        assert_eq!(net(&[2, 3, 1]).topology(), vec![2, 3, 1]);
    }

    #[test]
    fn same_seed_same_network() {
        let mut a = net(&[3, 4, 2]);
        let mut b = net(&[3, 4, 2]);
        let (mut out_a, mut out_b) = ([0.; 2], [0.; 2]);
        a.feed_forward(&[0.1, 0.2, 0.3]).unwrap();
        b.feed_forward(&[0.1, 0.2, 0.3]).unwrap();
        a.results(&mut out_a).unwrap();
        b.results(&mut out_b).unwrap();
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn back_prop_needs_a_fresh_forward_pass() {
        let mut n = net(&[2, 2, 1]);
        let before = n.network().weights().clone();

        match n.back_prop(&[1.]) {
            Err(NetError::OutOfOrder { op: Op::BackProp }) => {}
            other => panic!("{:?}", other),
        }
        assert_eq!(n.network().weights(), &before);

        n.feed_forward(&[1., 0.]).unwrap();
        n.back_prop(&[1.]).unwrap();
        assert_ne!(n.network().weights(), &before);
        assert!(n.back_prop(&[1.]).is_err());

        // results stay readable after training on them
        let mut out = [0.];
        n.results(&mut out).unwrap();
    }

    #[test]
    fn results_need_a_forward_pass() {
        let n = net(&[2, 1]);
        let mut out = [0.];
        assert!(matches!(
            n.results(&mut out),
            Err(NetError::OutOfOrder { op: Op::GetResults })
        ));
    }

    #[test]
    fn lengths_are_checked() {
        let mut n = net(&[2, 3]);
        assert!(matches!(
            n.feed_forward(&[1.]),
            Err(NetError::ShapeMismatch {
                expected: 2,
                received: 1,
                ..
            })
        ));
        n.feed_forward(&[1., 2.]).unwrap();
        assert!(matches!(
            n.results(&mut [0.; 4]),
            Err(NetError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            n.back_prop(&[0.; 2]),
            Err(NetError::ShapeMismatch { .. })
        ));
        // a rejected back propagation doesn't consume the forward pass
        n.back_prop(&[0.; 3]).unwrap();
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut n = net(&[1, 1]);
        assert!(matches!(
            n.feed_forward(&[f64::NAN]),
            Err(NetError::InvalidArgument(_))
        ));
        n.feed_forward(&[0.5]).unwrap();
        assert!(n.back_prop(&[f64::INFINITY]).is_err());
    }

    #[test]
    fn recent_average_error_is_smoothed_rms() {
        let config = NetConfig::new()
            .activation(Activation::Identity)
            .init(crate::initializer::InitKind::Ones)
            .error_smoothing(3.);
        let mut n = NeuralNet::new(&[1, 1], config).unwrap();
        assert_eq!(n.recent_average_error(), 0.);

        // output = 2 * 1 + 0, target 0: rms 2, average (0 * 3 + 2) / 4
        n.feed_forward(&[2.]).unwrap();
        let loss = n.back_prop(&[0.]).unwrap();
        check(&[4.], &[loss], 1e-12, "loss");
        check(&[0.5], &[n.recent_average_error()], 1e-12, "recent average error");
    }

    #[test]
    fn training_reduces_error() {
        let samples = (0..10).map(|i| i as f64 / 10.).collect::<Vec<_>>();
        let epoch_loss = |n: &mut NeuralNet| {
            let mut out = [0.];
            let mut loss = 0.;
            for x in &samples {
                n.feed_forward(&[*x]).unwrap();
                n.results(&mut out).unwrap();
                loss += (out[0] - x * 0.5).powi(2);
            }
            loss / samples.len() as f64
        };

        let mut n = net(&[1, 4, 1]);
        let before = epoch_loss(&mut n);
        for _ in 0..500 {
            for x in &samples {
                n.feed_forward(&[*x]).unwrap();
                n.back_prop(&[x * 0.5]).unwrap();
            }
        }
        let after = epoch_loss(&mut n);
        assert!(after < before, "{} >= {}", after, before);
        assert!(after < 1e-2, "failed to converge, loss was {}", after);
    }
}
