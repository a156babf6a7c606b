//! Bounded top-k selector: a fixed-capacity binary max-heap over candidates.
//!
//! The heap keeps the `capacity` smallest keys offered so far, with the worst
//! (largest) kept key at the root so it can be compared against in O(1).

use crate::error::{KnnError, Result};

/// A candidate with a distance key and the dataset position it refers to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub key: f64,
    pub value: usize,
}

impl Candidate {
    pub fn new(key: f64, value: usize) -> Self {
        Self { key, value }
    }
}

/// Array-backed max-heap holding at most `capacity` candidates.
///
/// Storage is reserved once at creation and never grows. The first `len()`
/// slots always form a valid max-heap over `key`.
#[derive(Debug)]
pub struct BoundedMaxHeap {
    nodes: Vec<Candidate>,
    capacity: usize,
}

impl BoundedMaxHeap {
    /// Create an empty selector able to hold `capacity` candidates.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(KnnError::ZeroCapacity);
        }

        let mut nodes = Vec::new();
        nodes
            .try_reserve_exact(capacity)
            .map_err(|_| KnnError::AllocationFailed {
                what: "selector storage",
                requested: capacity,
            })?;

        Ok(Self { nodes, capacity })
    }

    /// Insert a candidate while there is room left.
    ///
    /// Returns `Ok(false)` without touching the heap once it is full; callers
    /// must then go through [`BoundedMaxHeap::replace_maximum`]. The new slot
    /// starts from a placeholder key of 0 and is only ever sifted upward, so
    /// negative or NaN keys are rejected.
    pub fn insert(&mut self, key: f64, value: usize) -> Result<bool> {
        if self.is_full() {
            return Ok(false);
        }

        let slot = self.nodes.len();
        if !(key >= 0.0) {
            return Err(KnnError::KeyDecrease {
                slot,
                current: 0.0,
                requested: key,
            });
        }

        self.nodes.push(Candidate::new(key, value));
        self.sift_up(slot);
        Ok(true)
    }

    /// Overwrite the root (current maximum) and restore heap order.
    pub fn replace_maximum(&mut self, key: f64, value: usize) -> Result<()> {
        debug_assert!(!key.is_nan(), "NaN keys cannot be ordered");

        match self.nodes.first_mut() {
            Some(root) => *root = Candidate::new(key, value),
            None => {
                return Err(KnnError::EmptySelector {
                    operation: "replace_maximum",
                })
            }
        }
        self.sift_down(0);
        Ok(())
    }

    /// Keep the candidate if it belongs among the `capacity` smallest keys.
    ///
    /// Inserts while the heap has room, otherwise replaces the maximum only
    /// when `key` is strictly smaller. Returns whether the candidate was kept.
    pub fn offer(&mut self, key: f64, value: usize) -> Result<bool> {
        if !self.is_full() {
            return self.insert(key, value);
        }
        if key < self.maximum_key()? {
            self.replace_maximum(key, value)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Key of the worst kept candidate.
    pub fn maximum_key(&self) -> Result<f64> {
        self.peek().map(|c| c.key).ok_or(KnnError::EmptySelector {
            operation: "maximum_key",
        })
    }

    pub fn peek(&self) -> Option<&Candidate> {
        self.nodes.first()
    }

    /// Stored values in heap array order (not sorted by key).
    pub fn extract_values(&self) -> Result<Vec<usize>> {
        let mut values = Vec::new();
        values
            .try_reserve_exact(self.nodes.len())
            .map_err(|_| KnnError::AllocationFailed {
                what: "extracted values",
                requested: self.nodes.len(),
            })?;
        values.extend(self.nodes.iter().map(|c| c.value));
        Ok(values)
    }

    /// Stored candidates in heap array order.
    pub fn as_slice(&self) -> &[Candidate] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.nodes.len() == self.capacity
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.nodes[parent].key >= self.nodes[i].key {
                break;
            }
            self.nodes.swap(parent, i);
            i = parent;
        }
    }

    // On equal children the left one is promoted.
    fn sift_down(&mut self, mut i: usize) {
        let size = self.nodes.len();
        loop {
            let left = 2 * i + 1;
            let right = left + 1;
            let mut largest = i;

            if left < size && self.nodes[left].key > self.nodes[largest].key {
                largest = left;
            }
            if right < size && self.nodes[right].key > self.nodes[largest].key {
                largest = right;
            }
            if largest == i {
                break;
            }
            self.nodes.swap(i, largest);
            i = largest;
        }
    }
}
