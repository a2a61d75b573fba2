//! Fixed-capacity rolling window over the most recent samples.
//!
//! Storage is allocated once at construction and never resized. `push` is
//! O(1); `snapshot` is O(N) and always yields samples oldest-first, whatever
//! the cursor position.

#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    storage: Box<[T]>,
    cursor: usize,
    full: bool,
}

impl<T: Copy + Default> RollingWindow<T> {
    /// Returns `None` for a zero capacity.
    pub fn new(capacity: usize) -> Option<Self> {
        if capacity == 0 {
            return None;
        }
        Some(Self {
            storage: vec![T::default(); capacity].into_boxed_slice(),
            cursor: 0,
            full: false,
        })
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub fn len(&self) -> usize {
        if self.full {
            self.storage.len()
        } else {
            self.cursor
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    pub fn push(&mut self, value: T) {
        self.storage[self.cursor] = value;
        self.cursor = (self.cursor + 1) % self.storage.len();
        if self.cursor == 0 {
            self.full = true;
        }
    }

    pub fn snapshot(&self) -> Vec<T> {
        if !self.full {
            return self.storage[..self.cursor].to_vec();
        }
        let mut out = Vec::with_capacity(self.storage.len());
        out.extend_from_slice(&self.storage[self.cursor..]);
        out.extend_from_slice(&self.storage[..self.cursor]);
        out
    }

    pub fn clear(&mut self) {
        self.storage.fill(T::default());
        self.cursor = 0;
        self.full = false;
    }
}
