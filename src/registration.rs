//! Per-scope service registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::service::ServiceEntry;

#[cfg(feature = "ahash")]
type EntryMap = HashMap<String, Arc<dyn ServiceEntry>, ahash::RandomState>;
#[cfg(not(feature = "ahash"))]
type EntryMap = HashMap<String, Arc<dyn ServiceEntry>>;

/// Name to descriptor mapping owned by one scope.
///
/// The first few entries live in a small vector (linear search is faster than
/// hashing for typical scopes); the rest spill into a hash map.
pub(crate) struct Registry {
    small: Vec<(String, Arc<dyn ServiceEntry>)>,
    large: EntryMap,
    small_threshold: usize,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            small: Vec::new(),
            large: EntryMap::default(),
            small_threshold: 16,
        }
    }

    /// Adds a descriptor, failing if the name is already taken locally.
    pub(crate) fn insert(&mut self, entry: Arc<dyn ServiceEntry>) -> DiResult<()> {
        if self.contains(entry.name()) {
            return Err(DiError::DuplicateService(entry.name().to_string()));
        }
        self.put(entry);
        Ok(())
    }

    /// Adds or replaces a descriptor. Returns the replaced one, if any.
    pub(crate) fn replace(
        &mut self,
        entry: Arc<dyn ServiceEntry>,
    ) -> Option<Arc<dyn ServiceEntry>> {
        let name = entry.name();
        if let Some(slot) = self.small.iter_mut().find(|(n, _)| n == name) {
            return Some(std::mem::replace(&mut slot.1, entry));
        }
        if let Some(previous) = self.large.get_mut(name) {
            return Some(std::mem::replace(previous, entry));
        }
        self.put(entry);
        None
    }

    fn put(&mut self, entry: Arc<dyn ServiceEntry>) {
        let name = entry.name().to_string();
        if self.small.len() < self.small_threshold {
            self.small.push((name, entry));
        } else {
            self.large.insert(name, entry);
        }
    }

    #[inline]
    pub(crate) fn get(&self, name: &str) -> Option<&Arc<dyn ServiceEntry>> {
        for (n, entry) in &self.small {
            if n == name {
                return Some(entry);
            }
        }
        self.large.get(name)
    }

    #[inline]
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names, sorted.
    pub(crate) fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.iter().map(|(name, _)| name.to_string()).collect();
        names.sort();
        names
    }

    /// Snapshot of every descriptor, so callers can run hooks without
    /// holding the registry lock.
    pub(crate) fn entries(&self) -> Vec<Arc<dyn ServiceEntry>> {
        self.iter().map(|(_, entry)| entry.clone()).collect()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn ServiceEntry>)> {
        self.small
            .iter()
            .map(|(name, entry)| (name.as_str(), entry))
            .chain(self.large.iter().map(|(name, entry)| (name.as_str(), entry)))
    }

    pub(crate) fn len(&self) -> usize {
        self.small.len() + self.large.len()
    }
}
