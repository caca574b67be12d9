//! A feed forward neural network engine reached through opaque integer handles.
//!
//! The engine can be used three ways:
//! * directly, through [NeuralNet],
//! * through a [Registry] which hands out handles to the networks it owns,
//! * over the C interface in [ffi], which drives the process wide [registry::global].

pub mod a_funcs;
pub mod config;
pub mod error;
pub mod ffi;
pub mod helpers;
pub mod initializer;
pub mod layers;
pub mod loss;
pub mod net;
pub mod network;
pub mod optimizer;
mod persist;
pub mod registry;
pub mod storage;
pub mod trainer;

pub use config::NetConfig;
pub use error::{NetError, Status};
pub use net::NeuralNet;
pub use registry::{NetworkHandle, Registry};
