//! Engine parameters. None of them are implied by the handle interface itself, so every one
//! has a stated default and can be overridden from JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::a_funcs::Activation;
use crate::error::{NetError, Result};
use crate::initializer::InitKind;

/// Configuration of a single network instance.
///
/// ```json
/// { "activation": "tanh", "init": "xavier", "seed": 42,
///   "learning_rate": 0.15, "momentum": 0.5, "error_smoothing": 100.0 }
/// ```
///
/// Missing fields take their default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetConfig {
    /// Activation of every non-input layer.
    pub activation: Activation,
    pub init: InitKind,
    /// Seed of the weight initializer, drawn from entropy when absent.
    pub seed: Option<u64>,
    pub learning_rate: f64,
    /// Fraction of the previous weight step applied again on the next one.
    pub momentum: f64,
    /// Number of past samples the recent average error is smoothed over.
    pub error_smoothing: f64,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            activation: Activation::TanH,
            init: InitKind::Xavier,
            seed: None,
            learning_rate: 0.15,
            momentum: 0.5,
            error_smoothing: 100.,
        }
    }
}

impl NetConfig {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn init(mut self, init: InitKind) -> Self {
        self.init = init;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }

    pub fn error_smoothing(mut self, error_smoothing: f64) -> Self {
        self.error_smoothing = error_smoothing;
        self
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| NetError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            NetError::InvalidConfig(format!("reading {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(NetError::InvalidConfig(msg));
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.) {
            return invalid(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            ));
        }
        if !(self.momentum.is_finite() && self.momentum >= 0. && self.momentum < 1.) {
            return invalid(format!("momentum must be in [0, 1), got {}", self.momentum));
        }
        if !(self.error_smoothing.is_finite() && self.error_smoothing >= 0.) {
            return invalid(format!(
                "error_smoothing must not be negative, got {}",
                self.error_smoothing
            ));
        }
        Ok(())
    }
}
