use super::result::SearchResult;
use crate::core::models::ids::{LinkerId, Position};
use crate::core::models::tree::Cut;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// One cell of the edge-link cache: the synthons at `position` that attach through
/// `linker_id`, matched against the query subtree on the kept side of `cut`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub linker_id: LinkerId,
    pub position: Position,
    pub cut: Cut,
}

impl CellKey {
    pub fn new(linker_id: LinkerId, position: Position, cut: Cut) -> Self {
        Self {
            linker_id,
            position,
            cut,
        }
    }

    /// The cell holding the partner synthons across the same bond-forming cut.
    pub fn complementary(&self, position: Position) -> Self {
        Self {
            linker_id: self.linker_id,
            position,
            cut: self.cut.complement(),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct EdgeLinkCache {
    data: HashMap<CellKey, Arc<SearchResult>>,
    pending: HashSet<CellKey>,
}

impl EdgeLinkCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: CellKey, result: SearchResult) -> Arc<SearchResult> {
        self.pending.remove(&key);
        let result = Arc::new(result);
        self.data.insert(key, result.clone());
        result
    }

    pub fn get(&self, key: &CellKey) -> Option<Arc<SearchResult>> {
        self.data.get(key).cloned()
    }

    pub fn contains(&self, key: &CellKey) -> bool {
        self.data.contains_key(key)
    }

    /// Marks a cell as being computed. Returns `false` if it already was.
    pub fn begin(&mut self, key: CellKey) -> bool {
        self.pending.insert(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Cached cells in ascending key order.
    pub fn sorted_keys(&self) -> Vec<CellKey> {
        let mut keys: Vec<CellKey> = self.data.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}
