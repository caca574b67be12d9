//! Epoch based training of a [NeuralNet] over an in-memory data set.

use log::debug;

use crate::error::{NetError, Op, Result};
use crate::helpers::IndexShuffler;
use crate::net::NeuralNet;

/// A single training sample.
#[derive(Clone, Debug, PartialEq)]
pub struct Data {
    pub input: Vec<f64>,
    pub target: Vec<f64>,
}

impl Data {
    pub fn new<I, T>(input: I, target: T) -> Self
    where
        I: Into<Vec<f64>>,
        T: Into<Vec<f64>>,
    {
        Self {
            input: input.into(),
            target: target.into(),
        }
    }
}

/// Drives a network through the samples in a freshly shuffled order every epoch.
///
/// Iterating yields the mean squared error of each epoch, measured on the predictions made
/// before each sample's update. The iterator never ends on its own.
pub struct Trainer {
    net: NeuralNet,
    data: Vec<Data>,
    order: IndexShuffler,
    epoch: usize,
}

impl Trainer {
    /// Fails if any sample doesn't fit the network's input or output width.
    pub fn new(net: NeuralNet, data: Vec<Data>) -> Result<Self> {
        Self::with_seed(net, data, 0)
    }

    pub fn with_seed(net: NeuralNet, data: Vec<Data>, seed: u64) -> Result<Self> {
        check_data(&net, &data)?;
        Ok(Self {
            order: IndexShuffler::new(data.len(), seed),
            net,
            data,
            epoch: 0,
        })
    }

    /// Runs one pass over the data and returns its mean loss.
    pub fn do_epoch(&mut self) -> Result<f64> {
        self.order.reset();
        let mut acc = 0.;
        for idx in &mut self.order {
            let sample = &self.data[idx];
            self.net.feed_forward(&sample.input)?;
            acc += self.net.back_prop(&sample.target)?;
        }
        self.epoch += 1;
        let loss = acc / self.data.len().max(1) as f64;
        debug!("epoch {}: loss {}", self.epoch, loss);
        Ok(loss)
    }

    /// Trains for `epochs` epochs and returns the loss of the last one.
    pub fn train(&mut self, epochs: usize) -> Result<f64> {
        let mut loss = f64::NAN;
        for _ in 0..epochs {
            loss = self.do_epoch()?;
        }
        Ok(loss)
    }

    /// Mean squared error over `data` without touching the weights.
    pub fn test(&mut self, data: &[Data]) -> Result<f64> {
        check_data(&self.net, data)?;
        let mut output = vec![0.; self.net.out_size()];
        let mut acc = 0.;
        for sample in data {
            self.net.feed_forward(&sample.input)?;
            self.net.results(&mut output)?;
            acc += output
                .iter()
                .zip(&sample.target)
                .map(|(o, t)| (o - t).powi(2))
                .sum::<f64>()
                / output.len() as f64;
        }
        Ok(acc / data.len().max(1) as f64)
    }

    /// Number of completed epochs.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    pub fn net(&self) -> &NeuralNet {
        &self.net
    }

    pub fn into_net(self) -> NeuralNet {
        self.net
    }
}

impl Iterator for Trainer {
    type Item = Result<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.do_epoch())
    }
}

fn check_data(net: &NeuralNet, data: &[Data]) -> Result<()> {
    for sample in data {
        if sample.input.len() != net.in_size() {
            return Err(NetError::ShapeMismatch {
                op: Op::FeedForward,
                expected: net.in_size(),
                received: sample.input.len(),
            });
        }
        if sample.target.len() != net.out_size() {
            return Err(NetError::ShapeMismatch {
                op: Op::BackProp,
                expected: net.out_size(),
                received: sample.target.len(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetConfig;
    use crate::network::Network;

    fn line() -> Vec<Data> {
        (0..20)
            .map(|x| x as f64 / 20.)
            .map(|x| Data::new([x], [0.8 * x - 0.2]))
            .collect()
    }

    #[test]
    fn misshapen_samples_are_rejected() {
        let net = NeuralNet::new(&[2, 1], NetConfig::new().seed(0)).unwrap();
        let data = vec![Data::new([1., 2.], [1.]), Data::new([1.], [1.])];
        assert!(matches!(
            Trainer::new(net, data),
            Err(NetError::ShapeMismatch {
                op: Op::FeedForward,
                ..
            })
        ));
    }

    #[test]
    fn loss_decreases() {
        let net = NeuralNet::new(&[1, 3, 1], NetConfig::new().seed(2)).unwrap();
        let data = line();
        let mut trainer = Trainer::with_seed(net, data.clone(), 7).unwrap();

        let before = trainer.test(&data).unwrap();
        let losses = (&mut trainer)
            .take(200)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        let after = trainer.test(&data).unwrap();

        assert_eq!(trainer.epoch(), 200);
        assert_eq!(losses.len(), 200);
        assert!(after < before, "{} >= {}", after, before);
        assert!(after < 5e-3, "failed to converge, loss was {}", after);
    }

    #[test]
    fn testing_leaves_weights_alone() {
        let net = NeuralNet::new(&[1, 2, 1], NetConfig::new().seed(4)).unwrap();
        let weights = net.network().weights().clone();
        let mut trainer = Trainer::new(net, line()).unwrap();
        trainer.test(&line()).unwrap();
        assert_eq!(trainer.net().network().weights(), &weights);
    }
}
