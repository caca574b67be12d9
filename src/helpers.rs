use rand::{rngs::SmallRng, seq::SliceRandom, SeedableRng};

/// Shuffles the integers `0..size` and iterates through them, reshuffling on every
/// [reset](IndexShuffler::reset).
#[derive(Clone, Debug)]
pub struct IndexShuffler {
    idxs: Box<[usize]>,
    idx: usize,
    rng: SmallRng,
}

impl IndexShuffler {
    pub fn new(size: usize, seed: u64) -> Self {
        let mut t = IndexShuffler {
            idxs: (0..size).collect(),
            idx: 0,
            rng: SmallRng::seed_from_u64(seed),
        };
        t.reset();
        t
    }

    pub fn reset(&mut self) {
        self.idxs.shuffle(&mut self.rng);
        self.idx = 0;
    }
}

impl Iterator for IndexShuffler {
    type Item = usize;
    fn next(&mut self) -> Option<Self::Item> {
        let i = self.idxs.get(self.idx).copied();
        self.idx += 1;
        i
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visits_every_index_once() {
        let mut shuffler = IndexShuffler::new(50, 3);
        for _ in 0..3 {
            let mut seen = (&mut shuffler).collect::<Vec<_>>();
            seen.sort_unstable();
            assert_eq!(seen, (0..50).collect::<Vec<_>>());
            shuffler.reset();
        }
    }
}
