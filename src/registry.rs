//! Maps opaque integer handles to live network instances.

use std::collections::HashMap;
use std::convert::TryFrom;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lazy_static::lazy_static;
use log::debug;

use crate::config::NetConfig;
use crate::error::{NetError, Result};
use crate::net::NeuralNet;

/// Identifies a network registered in a [Registry]. Always positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetworkHandle(i32);

impl NetworkHandle {
    pub fn id(self) -> i32 {
        self.0
    }
}

impl From<i32> for NetworkHandle {
    fn from(id: i32) -> Self {
        NetworkHandle(id)
    }
}

impl fmt::Display for NetworkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type Shared = Arc<Mutex<NeuralNet>>;

/// A set of networks addressed by handle.
///
/// The map is locked only long enough to find, insert or remove an entry, after which the
/// call works on that instance alone. Calls on distinct handles therefore proceed in parallel
/// while calls on the same handle take turns. Handles are handed out in increasing order and
/// are never reused, so a stale handle can never reach a newer network.
pub struct Registry {
    nets: Mutex<HashMap<NetworkHandle, Shared>>,
    next_id: AtomicI32,
}

impl Default for Registry {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl Registry {
    pub fn new() -> Self {
        Default::default()
    }

    fn starting_at(id: i32) -> Self {
        Self {
            nets: Mutex::new(HashMap::new()),
            next_id: AtomicI32::new(id),
        }
    }

    /// Creates a network with default parameters. `count` must equal the number of layers.
    pub fn create(&self, topology: &[i32], count: i32) -> Result<NetworkHandle> {
        self.create_with_config(topology, count, NetConfig::new())
    }

    pub fn create_with_config(
        &self,
        topology: &[i32],
        count: i32,
        config: NetConfig,
    ) -> Result<NetworkHandle> {
        let topology = to_topology(topology, count)?;
        self.insert(NeuralNet::new(&topology, config)?)
    }

    pub fn create_from_file<P: AsRef<Path>>(&self, path: P) -> Result<NetworkHandle> {
        self.insert(NeuralNet::load(path)?)
    }

    /// Registers an existing network under a fresh handle.
    pub fn insert(&self, net: NeuralNet) -> Result<NetworkHandle> {
        let id = self
            .next_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| id.checked_add(1))
            .map_err(|_| NetError::HandlesExhausted)?;
        let handle = NetworkHandle(id);
        let topology = net.topology();
        self.lock().insert(handle, Arc::new(Mutex::new(net)));
        debug!("registered network {} with topology {:?}", handle, topology);
        Ok(handle)
    }

    /// Removes the network. Calls already running on it finish first.
    pub fn destroy(&self, handle: NetworkHandle) -> Result<()> {
        match self.lock().remove(&handle) {
            Some(_) => {
                debug!("destroyed network {}", handle);
                Ok(())
            }
            None => Err(NetError::InvalidHandle(handle.id())),
        }
    }

    /// Runs `f` with exclusive access to the network behind `handle`.
    pub fn with<T, F>(&self, handle: NetworkHandle, f: F) -> Result<T>
    where
        F: FnOnce(&mut NeuralNet) -> Result<T>,
    {
        let net = self
            .lock()
            .get(&handle)
            .cloned()
            .ok_or_else(|| NetError::InvalidHandle(handle.id()))?;
        let mut net = net.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut net)
    }

    pub fn feed_forward(&self, handle: NetworkHandle, input: &[f64]) -> Result<()> {
        self.with(handle, |net| net.feed_forward(input))
    }

    /// Returns the mean squared error of the prediction being corrected.
    pub fn back_prop(&self, handle: NetworkHandle, target: &[f64]) -> Result<f64> {
        self.with(handle, |net| net.back_prop(target))
    }

    pub fn get_results(&self, handle: NetworkHandle, output: &mut [f64]) -> Result<()> {
        self.with(handle, |net| net.results(output))
    }

    pub fn recent_average_error(&self, handle: NetworkHandle) -> Result<f64> {
        self.with(handle, |net| Ok(net.recent_average_error()))
    }

    pub fn save<P: AsRef<Path>>(&self, handle: NetworkHandle, path: P) -> Result<()> {
        self.with(handle, |net| net.save(path))
    }

    pub fn contains(&self, handle: NetworkHandle) -> bool {
        self.lock().contains_key(&handle)
    }

    /// Number of live networks.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<NetworkHandle, Shared>> {
        self.nets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

lazy_static! {
    static ref GLOBAL: Registry = Registry::new();
}

/// The process wide registry behind the C interface.
pub fn global() -> &'static Registry {
    &GLOBAL
}

fn to_topology(topology: &[i32], count: i32) -> Result<Vec<usize>> {
    if usize::try_from(count).ok() != Some(topology.len()) {
        return Err(NetError::InvalidTopology(format!(
            "layer count {} does not match the {} sizes given",
            count,
            topology.len()
        )));
    }
    topology
        .iter()
        .enumerate()
        .map(|(i, size)| match usize::try_from(*size) {
            Ok(size) if size > 0 => Ok(size),
            _ => Err(NetError::InvalidTopology(format!(
                "layer {} has size {}",
                i, size
            ))),
        })
        .collect()
}
