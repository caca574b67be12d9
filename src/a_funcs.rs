use serde::{Deserialize, Serialize};

pub trait ActivFunc {
    fn evaluate(&self, x: f64) -> f64;
    /// Derivative at `inp`, `out` being `evaluate(inp)`.
    fn derivative(&self, inp: f64, out: f64) -> f64;
}

#[derive(Clone, Copy, Debug)]
pub struct Sigmoid;
impl ActivFunc for Sigmoid {
    fn evaluate(&self, x: f64) -> f64 {
        1. / (1. + (-x).exp())
    }
    fn derivative(&self, _: f64, out: f64) -> f64 {
        out * (1. - out)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Identity;
impl ActivFunc for Identity {
    fn evaluate(&self, x: f64) -> f64 {
        x
    }
    fn derivative(&self, _: f64, _: f64) -> f64 {
        1.
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TanH;
impl ActivFunc for TanH {
    fn evaluate(&self, x: f64) -> f64 {
        x.tanh()
    }
    fn derivative(&self, _inp: f64, out: f64) -> f64 {
        1. - out * out
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ReLU;
impl ActivFunc for ReLU {
    fn evaluate(&self, x: f64) -> f64 {
        f64::max(x, 0.)
    }
    fn derivative(&self, inp: f64, _out: f64) -> f64 {
        if inp > 0. {
            1.
        } else {
            0.
        }
    }
}

/// Activation function selectable at runtime and stored alongside the layer in model files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Sigmoid,
    TanH,
    ReLU,
    Identity,
}

impl Default for Activation {
    fn default() -> Self {
        Activation::TanH
    }
}

impl ActivFunc for Activation {
    fn evaluate(&self, x: f64) -> f64 {
        match self {
            Activation::Sigmoid => Sigmoid.evaluate(x),
            Activation::TanH => TanH.evaluate(x),
            Activation::ReLU => ReLU.evaluate(x),
            Activation::Identity => Identity.evaluate(x),
        }
    }

    fn derivative(&self, inp: f64, out: f64) -> f64 {
        match self {
            Activation::Sigmoid => Sigmoid.derivative(inp, out),
            Activation::TanH => TanH.derivative(inp, out),
            Activation::ReLU => ReLU.derivative(inp, out),
            Activation::Identity => Identity.derivative(inp, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivatives_match_finite_differences() {
        let h = 1e-6;
        for a in [
            Activation::Sigmoid,
            Activation::TanH,
            Activation::ReLU,
            Activation::Identity,
        ]
        .iter()
        {
            for &x in [-1.3, -0.2, 0.4, 2.1].iter() {
                let numeric = (a.evaluate(x + h) - a.evaluate(x - h)) / (2. * h);
                let analytic = a.derivative(x, a.evaluate(x));
                assert!(
                    (numeric - analytic).abs() < 1e-6,
                    "{:?} at {}: {} vs {}",
                    a,
                    x,
                    numeric,
                    analytic
                );
            }
        }
    }

    #[test]
    fn names_in_json() {
        let s = serde_json::to_string(&Activation::TanH).unwrap();
        assert_eq!(s, "\"tanh\"");
        let a: Activation = serde_json::from_str("\"relu\"").unwrap();
        assert_eq!(a, Activation::ReLU);
    }
}
