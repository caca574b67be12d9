#![allow(dead_code)]

use nn_handle::trainer::Data;
use nn_handle::NetConfig;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Deterministic parameters so runs are reproducible.
pub fn seeded(seed: u64) -> NetConfig {
    NetConfig::new().seed(seed)
}

pub fn xor() -> Vec<Data> {
    vec![
        Data::new([0., 0.], [0.]),
        Data::new([0., 1.], [1.]),
        Data::new([1., 0.], [1.]),
        Data::new([1., 1.], [0.]),
    ]
}
