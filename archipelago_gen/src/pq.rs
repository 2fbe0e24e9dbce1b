// Indexed min-priority queue.
//
// Each of `max_n` integer slots (`0..max_n`) holds at most one key. The queue
// is a 1-based binary heap of slot indices (`pq`), with the inverse map
// (`qp`: slot -> heap position) kept alongside so a slot's key can be
// changed in place. Prim and Dijkstra in `graph.rs` both drive it.
//
// Unlike the scheduler-style `BinaryHeap` wrappers used elsewhere, entries
// here are addressed by slot, which is what decrease-key needs. Keys only
// need `PartialOrd`; graph code uses `f64` distances.
//
// All operations panic on misuse (slot out of range, inserting a present
// slot, touching an absent one, extracting from an empty queue, a
// `decrease_key` that does not decrease). These are caller bugs, never
// recoverable conditions.
//
// **Critical constraint: determinism.** Ties between equal keys resolve by
// heap position, which depends only on the sequence of calls.

#[derive(Clone, Debug)]
pub struct IndexMinPq<K> {
    /// Heap of slots, 1-based: `pq[0]` is unused.
    pq: Vec<usize>,
    /// Heap position of each slot, `None` when absent.
    qp: Vec<Option<usize>>,
    keys: Vec<Option<K>>,
    n: usize,
}

impl<K: PartialOrd + Copy> IndexMinPq<K> {
    /// Empty queue with slots `0..max_n`.
    pub fn new(max_n: usize) -> Self {
        Self {
            pq: vec![0; max_n + 1],
            qp: vec![None; max_n],
            keys: vec![None; max_n],
            n: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.qp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn contains(&self, i: usize) -> bool {
        self.validate(i);
        self.qp[i].is_some()
    }

    /// Associate `key` with slot `i`.
    ///
    /// Panics if `i` is out of range or already present.
    pub fn insert(&mut self, i: usize, key: K) {
        assert!(!self.contains(i), "insert: index {i} is already in the priority queue");
        self.n += 1;
        self.qp[i] = Some(self.n);
        self.pq[self.n] = i;
        self.keys[i] = Some(key);
        self.swim(self.n);
    }

    /// Slot with the smallest key. Panics if empty.
    pub fn min_index(&self) -> usize {
        assert!(self.n > 0, "min_index: priority queue underflow");
        self.pq[1]
    }

    /// Smallest key. Panics if empty.
    pub fn min_key(&self) -> K {
        self.key_unchecked(self.min_index())
    }

    /// Remove the slot with the smallest key and return it. Panics if empty.
    pub fn extract_min(&mut self) -> usize {
        assert!(self.n > 0, "extract_min: priority queue underflow");
        let min = self.pq[1];
        self.exch(1, self.n);
        self.n -= 1;
        self.sink(1);
        self.qp[min] = None;
        self.keys[min] = None;
        min
    }

    /// Key of slot `i`. Panics if `i` is absent.
    pub fn key_of(&self, i: usize) -> K {
        assert!(self.contains(i), "key_of: index {i} is not in the priority queue");
        self.key_unchecked(i)
    }

    /// Replace the key of slot `i`, moving it either way.
    pub fn change_key(&mut self, i: usize, key: K) {
        let pos = self.position(i, "change_key");
        self.keys[i] = Some(key);
        self.swim(pos);
        self.sink(self.position(i, "change_key"));
    }

    /// Lower the key of slot `i`.
    ///
    /// Panics if `i` is absent or `key` is not strictly smaller.
    pub fn decrease_key(&mut self, i: usize, key: K) {
        let pos = self.position(i, "decrease_key");
        assert!(
            key < self.key_unchecked(i),
            "decrease_key: new key must be strictly smaller than the current key"
        );
        self.keys[i] = Some(key);
        self.swim(pos);
    }

    /// Raise the key of slot `i`.
    ///
    /// Panics if `i` is absent or `key` is not strictly larger.
    pub fn increase_key(&mut self, i: usize, key: K) {
        let pos = self.position(i, "increase_key");
        assert!(
            key > self.key_unchecked(i),
            "increase_key: new key must be strictly larger than the current key"
        );
        self.keys[i] = Some(key);
        self.sink(pos);
    }

    /// Remove slot `i` wherever it sits in the heap. Panics if absent.
    pub fn delete(&mut self, i: usize) {
        let pos = self.position(i, "delete");
        self.exch(pos, self.n);
        self.n -= 1;
        if pos <= self.n {
            self.swim(pos);
            self.sink(pos);
        }
        self.qp[i] = None;
        self.keys[i] = None;
    }

    // -----------------------------------------------------------------------
    // Heap helpers
    // -----------------------------------------------------------------------

    fn validate(&self, i: usize) {
        assert!(
            i < self.capacity(),
            "index {i} out of range for priority queue of capacity {}",
            self.capacity()
        );
    }

    fn position(&self, i: usize, op: &str) -> usize {
        self.validate(i);
        match self.qp[i] {
            Some(pos) => pos,
            None => panic!("{op}: index {i} is not in the priority queue"),
        }
    }

    fn key_unchecked(&self, i: usize) -> K {
        match self.keys[i] {
            Some(k) => k,
            None => panic!("index {i} has no key"),
        }
    }

    fn greater(&self, a: usize, b: usize) -> bool {
        self.key_unchecked(self.pq[a]) > self.key_unchecked(self.pq[b])
    }

    fn exch(&mut self, a: usize, b: usize) {
        self.pq.swap(a, b);
        let (ia, ib) = (self.pq[a], self.pq[b]);
        self.qp[ia] = Some(a);
        self.qp[ib] = Some(b);
    }

    fn swim(&mut self, mut k: usize) {
        while k > 1 && self.greater(k / 2, k) {
            self.exch(k, k / 2);
            k /= 2;
        }
    }

    fn sink(&mut self, mut k: usize) {
        while 2 * k <= self.n {
            let mut j = 2 * k;
            if j < self.n && self.greater(j, j + 1) {
                j += 1;
            }
            if !self.greater(k, j) {
                break;
            }
            self.exch(k, j);
            k = j;
        }
    }
}
