use serde::{Deserialize, Serialize};

pub type WeightStorage = Storage;
pub type GradStorage = Storage;

pub use handle::Handle;
mod handle {
    use super::*;

    /// Generic handle for accesing blocks of memory stored within the matching Storage
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Handle {
        start: usize,
        end: usize,
    }

    impl Handle {
        pub(super) fn new(start: usize, end: usize) -> Self {
            Self { start, end }
        }

        pub fn start(&self) -> usize {
            self.start
        }

        pub fn end(&self) -> usize {
            self.end
        }

        pub fn len(&self) -> usize {
            self.end.saturating_sub(self.start)
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }
}

pub use allocator::Allocator;
mod allocator {
    use super::*;

    /// Hands out consecutive blocks of a single weight buffer while a network is being built.
    #[derive(Debug, Clone, Default)]
    pub struct Allocator {
        mem: Vec<f64>,
    }

    impl Allocator {
        pub fn new() -> Self {
            Self { mem: Vec::new() }
        }

        fn new_handle(&self, len: usize) -> Handle {
            let start = self.mem.len();
            Handle::new(start, start + len)
        }

        pub fn allocate_zeroed(&mut self, len: usize) -> Handle {
            let handle = self.new_handle(len);
            self.mem.resize(self.mem.len() + len, 0.);
            handle
        }

        pub fn allocate<I>(&mut self, len: usize, iter: I) -> Handle
        where
            I: Iterator<Item = f64>,
        {
            let len_before = self.mem.len();
            let handle = self.new_handle(len);
            self.mem.extend(iter.take(len));
            let received = self.mem.len() - len_before;
            assert_eq!(
                len, received,
                "Provided iterator did not yield enough elements. Expected: {}, Received: {}",
                len, received
            );
            handle
        }

        pub fn len(&self) -> usize {
            self.mem.len()
        }

        pub fn is_empty(&self) -> bool {
            self.mem.is_empty()
        }

        pub fn finish(self) -> Storage {
            Storage::new(self.mem)
        }
    }
}

pub use storage::Storage;
mod storage {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Storage {
        storage: Vec<f64>,
    }

    impl Storage {
        pub(super) fn new(storage: Vec<f64>) -> Self {
            Self { storage }
        }

        /// Storage of `len` zeros, used for gradients and momentum mirroring a weight storage.
        pub fn zeroed(len: usize) -> Self {
            Self {
                storage: vec![0.; len],
            }
        }

        pub fn get(&self, handle: Handle) -> &[f64] {
            &self.storage[handle.start()..handle.end()]
        }

        pub fn get_mut(&mut self, handle: Handle) -> &mut [f64] {
            &mut self.storage[handle.start()..handle.end()]
        }

        /// Whether `handle` points inside this storage.
        pub fn contains(&self, handle: Handle) -> bool {
            handle.start() <= handle.end() && handle.end() <= self.storage.len()
        }

        pub fn len(&self) -> usize {
            self.storage.len()
        }

        pub fn is_empty(&self) -> bool {
            self.storage.is_empty()
        }

        /// Overwrites the contents with zeros
        pub fn zero(&mut self) {
            self.storage.iter_mut().for_each(|f| *f = 0.);
        }

        /// Get a reference to the raw contents of the storage
        pub fn raw(&self) -> &[f64] {
            &self.storage
        }

        /// Get a mutable reference to the raw contents of the storage
        pub fn raw_mut(&mut self) -> &mut [f64] {
            &mut self.storage
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_address_consecutive_blocks() {
        let mut alloc = Allocator::new();
        let a = alloc.allocate(3, (1..).map(|x| x as f64));
        let b = alloc.allocate_zeroed(2);
        let storage = alloc.finish();

        assert_eq!(storage.get(a), &[1., 2., 3.]);
        assert_eq!(storage.get(b), &[0., 0.]);
        assert_eq!(storage.len(), 5);
        assert!(storage.contains(b));
        assert!(!Storage::zeroed(4).contains(b));
    }

    #[test]
    #[should_panic]
    fn short_iterator_panics() {
        let mut alloc = Allocator::new();
        alloc.allocate(3, vec![1.].into_iter());
    }
}
