use rand::distributions::{Distribution, Uniform as UniformDist};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

//I used this blog post as reference to the initialization methods ->
//https://towardsdatascience.com/weight-initialization-in-neural-networks-a-journey-from-the-basics-to-kaiming-954fb9b47c79

pub trait Initializer {
    /// Produce the next weight of a layer with `in_size` inputs and `size` neurons.
    fn get(&mut self, in_size: usize, size: usize) -> f64;
}

impl<T: Initializer + ?Sized> Initializer for &mut T {
    fn get(&mut self, in_size: usize, size: usize) -> f64 {
        (**self).get(in_size, size)
    }
}

impl<T: Initializer + ?Sized> Initializer for Box<T> {
    fn get(&mut self, in_size: usize, size: usize) -> f64 {
        (**self).get(in_size, size)
    }
}

///Xavier initialization should be used for layers with symetric activation functions such as sigmoid or tanH
pub struct Xavier {
    rng: SmallRng,
}
impl Xavier {
    pub fn new(seed: u64) -> Xavier {
        Xavier {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Initializer for Xavier {
    fn get(&mut self, in_size: usize, _size: usize) -> f64 {
        self.rng.sample::<f64, _>(StandardNormal) / (in_size as f64).sqrt()
    }
}

///Kaiming initialization should be used for layers with asymetric activation functions such as RELU
pub struct Kaiming {
    rng: SmallRng,
}
impl Kaiming {
    pub fn new(seed: u64) -> Kaiming {
        Kaiming {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}
impl Initializer for Kaiming {
    fn get(&mut self, in_size: usize, _: usize) -> f64 {
        self.rng.sample::<f64, _>(StandardNormal) * (2. / (in_size as f64)).sqrt()
    }
}

/// Draws every weight uniformly from [-1, 1).
pub struct Uniform {
    rng: SmallRng,
    dist: UniformDist<f64>,
}
impl Uniform {
    pub fn new(seed: u64) -> Uniform {
        Uniform {
            rng: SmallRng::seed_from_u64(seed),
            dist: UniformDist::new(-1., 1.),
        }
    }
}
impl Initializer for Uniform {
    fn get(&mut self, _: usize, _: usize) -> f64 {
        self.dist.sample(&mut self.rng)
    }
}

///Always initializes weights to one
pub struct Ones;
impl Initializer for Ones {
    fn get(&mut self, _: usize, _: usize) -> f64 {
        1.
    }
}

/// This initializer accepts an iterator over f64 values and uses them to initialize the weights.
/// Panics if a weight is requested but the iterator returns None.
pub struct WeightInit<T: Iterator<Item = f64>> {
    iter: T,
}
impl<I: Iterator<Item = f64>> WeightInit<I> {
    pub fn new<T: IntoIterator<Item = f64, IntoIter = I>>(weights: T) -> Self {
        Self {
            iter: weights.into_iter(),
        }
    }
}

impl<I: Iterator<Item = f64>> Initializer for WeightInit<I> {
    fn get(&mut self, _in_size: usize, _size: usize) -> f64 {
        self.iter.next().expect("Ran out of weights")
    }
}

/// Serializable choice of initializer, turned into a seeded instance by [InitKind::build].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitKind {
    Xavier,
    Kaiming,
    Uniform,
    Ones,
}

impl Default for InitKind {
    fn default() -> Self {
        InitKind::Xavier
    }
}

impl InitKind {
    pub fn build(self, seed: u64) -> Box<dyn Initializer> {
        match self {
            InitKind::Xavier => Box::new(Xavier::new(seed)),
            InitKind::Kaiming => Box::new(Kaiming::new(seed)),
            InitKind::Uniform => Box::new(Uniform::new(seed)),
            InitKind::Ones => Box::new(Ones),
        }
    }
}
