//! Unique tag index: `(tag key, value) -> node key`

use crate::graph::{GraphError, GraphResult, TagKey};
use rustc_hash::FxHashMap;

/// Tag key -> value -> owning node. A null value is a value like any other.
#[derive(Debug, Clone, Default)]
pub struct UniqueIndex {
    entries: FxHashMap<TagKey, FxHashMap<Option<String>, String>>,
}

impl UniqueIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tag: &TagKey, value: Option<&str>) -> Option<&str> {
        self.entries
            .get(tag)
            .and_then(|values| values.get(&value.map(str::to_string)))
            .map(String::as_str)
    }

    /// True when at least one node currently claims a value for `tag`
    pub fn has_tag(&self, tag: &TagKey) -> bool {
        self.entries.contains_key(tag)
    }

    /// Number of nodes claiming a value for `tag`
    pub fn count(&self, tag: &TagKey) -> usize {
        self.entries.get(tag).map(|values| values.len()).unwrap_or(0)
    }

    /// Fail if any of `claims` already belongs to a node other than `owner`
    pub fn check(&self, owner: &str, claims: &[(TagKey, Option<String>)]) -> GraphResult<()> {
        for (tag, value) in claims {
            if let Some(existing) = self.get(tag, value.as_deref()) {
                if existing != owner {
                    return Err(GraphError::UniqueIndexViolation {
                        tag: tag.to_string(),
                        value: value.clone().unwrap_or_default(),
                        existing: existing.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn insert(&mut self, tag: TagKey, value: Option<String>, owner: &str) {
        self.entries
            .entry(tag)
            .or_default()
            .insert(value, owner.to_string());
    }

    /// Remove the entry only if it still belongs to `owner`
    pub fn remove(&mut self, tag: &TagKey, value: &Option<String>, owner: &str) {
        if let Some(values) = self.entries.get_mut(tag) {
            if values.get(value).map(String::as_str) == Some(owner) {
                values.remove(value);
            }
            if values.is_empty() {
                self.entries.remove(tag);
            }
        }
    }

    /// Total number of `(tag, value)` entries
    pub fn len(&self) -> usize {
        self.entries.values().map(|values| values.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
