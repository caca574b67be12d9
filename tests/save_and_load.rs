mod common;

use std::fs;

use nn_handle::{NetError, NeuralNet, Registry};

use common::{init_logging, seeded};

fn outputs(registry: &Registry, h: nn_handle::NetworkHandle, inputs: &[[f64; 3]]) -> Vec<f64> {
    let mut all = Vec::new();
    let mut out = [0.; 2];
    for input in inputs {
        registry.feed_forward(h, input).unwrap();
        registry.get_results(h, &mut out).unwrap();
        all.extend_from_slice(&out);
    }
    all
}

#[test]
fn save_and_load() -> anyhow::Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("model.json");

    let registry = Registry::new();
    let original = registry.create_with_config(&[3, 5, 4, 2], 4, seeded(21))?;
    for i in 0..50 {
        let x = i as f64 / 50.;
        registry.feed_forward(original, &[x, -x, 0.5])?;
        registry.back_prop(original, &[x, 1. - x])?;
    }
    registry.save(original, &path)?;

    let loaded = registry.create_from_file(&path)?;
    assert_ne!(original, loaded);
    assert_eq!(
        registry.recent_average_error(original)?,
        registry.recent_average_error(loaded)?
    );

    let inputs = [[0.1, 0.2, 0.3], [-1., 0., 1.], [5., -3., 0.25]];
    let expected = outputs(&registry, original, &inputs);
    let received = outputs(&registry, loaded, &inputs);
    for (e, r) in expected.iter().zip(&received) {
        assert!((e - r).abs() <= 1e-9, "{} != {}", e, r);
    }
    Ok(())
}

#[test]
fn save_replaces_existing_file() -> anyhow::Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("model.json");
    fs::write(&path, "stale")?;

    let net = NeuralNet::new(&[2, 2], seeded(1))?;
    net.save(&path)?;
    let loaded = NeuralNet::load(&path)?;
    assert_eq!(loaded.topology(), vec![2, 2]);
    assert_eq!(loaded.config(), net.config());

    // nothing but the model is left behind
    assert_eq!(fs::read_dir(dir.path())?.count(), 1);
    Ok(())
}

#[test]
fn missing_and_malformed_files() -> anyhow::Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;

    match NeuralNet::load(dir.path().join("absent.json")) {
        Err(NetError::Io(_)) => {}
        other => panic!("{:?}", other.map(|n| n.topology())),
    }

    let garbage = dir.path().join("garbage.json");
    fs::write(&garbage, "{\"format\": \"nn-handle/model\", \"version\": 1}")?;
    match NeuralNet::load(&garbage) {
        Err(NetError::ModelFile(_)) => {}
        other => panic!("{:?}", other.map(|n| n.topology())),
    }

    // a weight vector that doesn't fit the layers
    let good = dir.path().join("good.json");
    NeuralNet::new(&[2, 3, 1], seeded(0))?.save(&good)?;
    let mut model: serde_json::Value = serde_json::from_str(&fs::read_to_string(&good)?)?;
    model["network"]["weights"]
        .as_array_mut()
        .ok_or_else(|| anyhow::anyhow!("weights are not an array"))?
        .pop();
    let tampered = dir.path().join("tampered.json");
    fs::write(&tampered, model.to_string())?;
    assert!(matches!(
        NeuralNet::load(&tampered),
        Err(NetError::ModelFile(_))
    ));
    Ok(())
}

#[test]
fn saving_into_missing_directory_fails() {
    init_logging();
    let registry = Registry::new();
    let h = registry.create(&[1, 1], 2).unwrap();
    let path = std::env::temp_dir()
        .join("nn-handle-no-such-dir")
        .join("deeper")
        .join("model.json");
    assert!(matches!(registry.save(h, &path), Err(NetError::Io(_))));
}
