use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Maps the layer identifiers of the source system to the identifiers the target system assigned
/// when the layer was saved. Lives for one migration run and only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierMap {
    inner: BTreeMap<i64, i64>,
}

impl IdentifierMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a migrated layer. A source id which was already mapped keeps its first target id.
    pub fn insert(&mut self, source_id: i64, target_id: i64) {
        match self.inner.get(&source_id) {
            Some(existing) => warn!(
                "Source layer {source_id} was already migrated as {existing}, ignoring new id {target_id}"
            ),
            None => {
                self.inner.insert(source_id, target_id);
            }
        }
    }

    pub fn resolve(&self, source_id: i64) -> Option<i64> {
        self.inner.get(&source_id).copied()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.inner.iter().map(|(k, v)| (*k, *v))
    }
}

impl FromIterator<(i64, i64)> for IdentifierMap {
    fn from_iter<T: IntoIterator<Item = (i64, i64)>>(iter: T) -> Self {
        let mut map = IdentifierMap::new();
        for (source_id, target_id) in iter {
            map.insert(source_id, target_id);
        }
        map
    }
}
