//! Teaches a network XOR through the handle interface, saves it and reloads it.
//!
//! Run with `RUST_LOG=debug` to see the registry at work.

use std::env;

use log::info;
use nn_handle::{NetConfig, Registry};

fn data() -> Vec<([f64; 2], [f64; 1])> {
    vec![
        ([0., 0.], [0.]),
        ([0., 1.], [1.]),
        ([1., 0.], [1.]),
        ([1., 1.], [0.]),
    ]
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let registry = Registry::new();
    let net = registry.create_with_config(&[2, 4, 1], 3, NetConfig::new().seed(7))?;

    for epoch in 1..=2000 {
        for (input, target) in data() {
            registry.feed_forward(net, &input)?;
            registry.back_prop(net, &target)?;
        }
        if epoch % 200 == 0 {
            info!(
                "epoch {}: recent average error {:.5}",
                epoch,
                registry.recent_average_error(net)?
            );
        }
    }

    let path = env::temp_dir().join("xor-model.json");
    registry.save(net, &path)?;
    registry.destroy(net)?;
    println!("Saved model to {}", path.display());

    let loaded = registry.create_from_file(&path)?;
    let mut output = [0.];
    for (input, target) in data() {
        registry.feed_forward(loaded, &input)?;
        registry.get_results(loaded, &mut output)?;
        println!("{:?} -> {:.4} (expected {})", input, output[0], target[0]);
    }
    registry.destroy(loaded)?;

    Ok(())
}
