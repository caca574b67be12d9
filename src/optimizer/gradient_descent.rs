use super::*;

/// Gradient descent steps the weights against their derivatives, re-applying a fraction
/// of the previous step as momentum.
#[derive(Clone, Debug)]
pub struct GradientDescent {
    l_rate: f64,
    momentum: f64,
    deltas: Vec<f64>,
}

impl OptimizerAlg for GradientDescent {
    fn update_weights(&mut self, weights: &mut [f64], gradients: &[f64]) {
        assert_eq!(weights.len(), gradients.len());
        assert_eq!(weights.len(), self.deltas.len());
        for ((w, d), delta) in weights.iter_mut().zip(gradients).zip(&mut self.deltas) {
            *delta = -self.l_rate * d + self.momentum * *delta;
            *w += *delta;
        }
    }

    fn reset(&mut self) {
        self.deltas.iter_mut().for_each(|d| *d = 0.);
    }
}

impl GradientDescent {
    pub fn new(l_rate: f64, momentum: f64, len: usize) -> Self {
        Self {
            l_rate,
            momentum,
            deltas: vec![0.; len],
        }
    }
}

/// Constructor for [GradientDescent](self::GradientDescent)
#[derive(Clone, Debug)]
pub struct GradDescBuilder {
    l_rate: f64,
    momentum: f64,
}

impl Default for GradDescBuilder {
    fn default() -> Self {
        Self {
            l_rate: 0.15,
            momentum: 0.5,
        }
    }
}

impl GradDescBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn l_rate(mut self, l_rate: f64) -> Self {
        self.l_rate = l_rate;
        self
    }

    pub fn momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }
}

impl AlgBuilder for GradDescBuilder {
    type Output = GradientDescent;

    fn build(self, len: usize) -> Self::Output {
        GradientDescent::new(self.l_rate, self.momentum, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::tests::check;

    #[test]
    fn momentum_accumulates() {
        let mut gd = GradDescBuilder::new().l_rate(0.1).momentum(0.5).build(2);
        let mut weights = [1., 1.];

        gd.update_weights(&mut weights, &[1., -2.]);
        check(&[0.9, 1.2], &weights, 1e-12, "first step");

        // second delta = -0.1 * g + 0.5 * first delta
        gd.update_weights(&mut weights, &[1., -2.]);
        check(&[0.75, 1.5], &weights, 1e-12, "second step");

        gd.reset();
        gd.update_weights(&mut weights, &[0., 0.]);
        check(&[0.75, 1.5], &weights, 1e-12, "after reset");
    }
}
