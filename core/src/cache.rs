use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::config::{ChannelConfig, Dimensionality, NoiseKind};
use crate::field::ScalarField;

/// Identity of a generated field. Holds every input that changes the output,
/// with floats kept as bit patterns so equality and hashing are exact.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: NoiseKind,
    pub dimensionality: Dimensionality,
    pub seed: i64,
    pub resolution: u32,
    pub params: Vec<u64>,
}

impl CacheKey {
    pub fn new(
        config: &ChannelConfig,
        dimensionality: Dimensionality,
        resolution: u32,
        seed: i64,
    ) -> Self {
        Self {
            kind: config.kind(),
            dimensionality,
            seed,
            resolution,
            params: config.canonical_params(),
        }
    }
}

struct Entries {
    fields: HashMap<CacheKey, Arc<ScalarField>>,
    order: VecDeque<CacheKey>, // oldest insert first
}

/// Shared field cache. Lookups take a read lock; inserts take the write lock
/// and evict the oldest entry once `capacity` is reached. Entries are never
/// modified after insertion.
pub struct FieldCache {
    capacity: usize,
    entries: RwLock<Entries>,
}

impl FieldCache {
    pub const DEFAULT_CAPACITY: usize = 16;

    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: RwLock::new(Entries {
                fields: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<ScalarField>> {
        self.entries.read().fields.get(key).cloned()
    }

    /// Store `field` under `key`. If another thread inserted the same key in
    /// the meantime, the existing entry is kept and returned.
    pub fn insert(&self, key: CacheKey, field: ScalarField) -> Arc<ScalarField> {
        let mut entries = self.entries.write();
        if let Some(existing) = entries.fields.get(&key) {
            return Arc::clone(existing);
        }
        while entries.fields.len() >= self.capacity {
            let Some(oldest) = entries.order.pop_front() else {
                break;
            };
            entries.fields.remove(&oldest);
            debug!(kind = ?oldest.kind, "evicted cached field");
        }
        let field = Arc::new(field);
        entries.order.push_back(key.clone());
        entries.fields.insert(key, Arc::clone(&field));
        field
    }

    pub fn len(&self) -> usize {
        self.entries.read().fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write();
        entries.fields.clear();
        entries.order.clear();
    }
}

impl Default for FieldCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
