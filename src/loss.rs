pub struct Loss {
    pub loss: f64,
    pub grads: Vec<f64>,
}

pub trait LossFunc {
    /// Loss of `val` against `target` and its derivative with respect to each value.
    fn eval(&self, val: &[f64], target: &[f64]) -> Loss;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MeanSquared;

impl LossFunc for MeanSquared {
    fn eval(&self, val: &[f64], target: &[f64]) -> Loss {
        assert_eq!(
            val.len(),
            target.len(),
            "Value vector must be the same length as target vector. val: {}, target: {}",
            val.len(),
            target.len()
        );

        let recip = 1. / val.len() as f64;
        let mut grads = Vec::with_capacity(val.len());
        let mut loss = 0.;
        for (val, target) in val.iter().copied().zip(target.iter().copied()) {
            let diff = val - target;
            loss += diff * diff;
            grads.push(2. * diff * recip);
        }

        Loss {
            loss: loss * recip,
            grads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::tests::check;

    #[test]
    fn mean_squared() {
        let Loss { loss, grads } = MeanSquared.eval(&[1., 2.], &[0., 4.]);
        assert!((loss - 2.5).abs() < 1e-12);
        check(&[1., -2.], &grads, 1e-12, "gradients");
    }
}
