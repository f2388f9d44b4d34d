/// Single-slot cache keyed on the exact input tuple of a derivation.
///
/// Derived views are always recomputed from source state; this only skips the
/// recomputation when the key is identical to the previous call.
#[derive(Debug)]
pub struct Memo<K, V> {
    slot: Option<(K, V)>,
    computations: u64,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            slot: None,
            computations: 0,
        }
    }
}

impl<K: PartialEq, V> Memo<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute<F>(&mut self, key: K, compute: F) -> &V
    where
        F: FnOnce() -> V,
    {
        let hit = matches!(&self.slot, Some((k, _)) if *k == key);
        if !hit {
            self.computations += 1;
            self.slot = None;
        }
        let (_, value) = self.slot.get_or_insert_with(|| (key, compute()));
        value
    }

    pub fn invalidate(&mut self) {
        self.slot = None;
    }

    /// Number of times the derivation actually ran.
    pub fn computations(&self) -> u64 {
        self.computations
    }
}
