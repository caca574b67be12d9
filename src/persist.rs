//! Model files.
//!
//! A model is a single JSON document:
//!
//! ```json
//! {
//!   "format": "nn-handle/model",
//!   "version": 1,
//!   "topology": [2, 4, 1],
//!   "config": { "activation": "tanh", ... },
//!   "recent_average_error": 0.0123,
//!   "network": { "weights": [...], "layers": [...] }
//! }
//! ```
//!
//! `format` and `version` are checked before anything else is parsed. Floats are written in
//! their shortest round trip form, so loading reproduces the saved weights exactly.
//! Momentum is not part of the file.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};

use crate::config::NetConfig;
use crate::error::{NetError, Result};
use crate::layers::BasicLayer;
use crate::net::NeuralNet;
use crate::network::{FeedForward, Network};

pub const FORMAT: &str = "nn-handle/model";
pub const VERSION: u32 = 1;

#[derive(Serialize)]
struct ModelOut<'a> {
    format: &'a str,
    version: u32,
    topology: Vec<usize>,
    config: &'a NetConfig,
    recent_average_error: f64,
    network: &'a FeedForward,
}

#[derive(Deserialize)]
struct Header {
    format: String,
    version: u32,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ModelIn {
    #[allow(dead_code)]
    format: String,
    #[allow(dead_code)]
    version: u32,
    topology: Vec<usize>,
    config: NetConfig,
    recent_average_error: f64,
    network: FeedForward,
}

pub(crate) fn to_string(net: &NeuralNet) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ModelOut {
        format: FORMAT,
        version: VERSION,
        topology: net.topology(),
        config: net.config(),
        recent_average_error: net.recent_average_error(),
        network: net.network(),
    })
}

/// Writes `net` next to `path` and moves it into place, so readers never see half a model.
/// A network whose weights or error are no longer finite is refused, JSON can't hold them.
pub(crate) fn save(net: &NeuralNet, path: &Path) -> Result<()> {
    if let Some(i) = first_non_finite(net.network()) {
        return Err(NetError::InvalidArgument(format!(
            "network has diverged, weight {} is not a finite number",
            i
        )));
    }
    if !net.recent_average_error().is_finite() {
        return Err(NetError::InvalidArgument(format!(
            "network has diverged, recent average error is {}",
            net.recent_average_error()
        )));
    }

    let json = to_string(net)
        .context("serializing network")
        .map_err(NetError::Io)?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let write = || -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("creating temporary file in {}", dir.display()))?;
        file.write_all(json.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(path)
            .with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    };
    write().map_err(NetError::Io)
}

pub(crate) fn load(path: &Path) -> Result<NeuralNet> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))
        .map_err(NetError::Io)?;
    from_str(&json)
        .with_context(|| format!("loading {}", path.display()))
        .map_err(NetError::ModelFile)
}

pub(crate) fn from_str(json: &str) -> anyhow::Result<NeuralNet> {
    let header: Header = serde_json::from_str(json).context("reading model header")?;
    if header.format != FORMAT {
        bail!("expected format {:?}, found {:?}", FORMAT, header.format);
    }
    if header.version != VERSION {
        bail!("unsupported model version {}", header.version);
    }

    let model: ModelIn = serde_json::from_str(json)?;
    if model.topology != model.network.topology() {
        bail!(
            "topology {:?} disagrees with the stored layers {:?}",
            model.topology,
            model.network.topology()
        );
    }
    model
        .config
        .validate()
        .map_err(|e| anyhow!("stored configuration: {}", e))?;
    if !(model.recent_average_error.is_finite() && model.recent_average_error >= 0.) {
        bail!(
            "recent average error {} is not a non-negative number",
            model.recent_average_error
        );
    }
    if let Some(i) = first_non_finite(&model.network) {
        bail!("weight {} is not a finite number", i);
    }
    for (index, layer) in model.network.layers().iter().enumerate() {
        if let BasicLayer::Dense(dense) = layer {
            if dense.activation() != model.config.activation {
                bail!(
                    "layer {} uses {:?} but the configuration says {:?}",
                    index,
                    dense.activation(),
                    model.config.activation
                );
            }
        }
    }

    Ok(NeuralNet::from_parts(
        model.network,
        model.config,
        model.recent_average_error,
    ))
}

fn first_non_finite(network: &FeedForward) -> Option<usize> {
    network.weights().raw().iter().position(|w| !w.is_finite())
}
