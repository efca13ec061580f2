//! Include cache keyed by canonical path.
//!
//! Each file is compiled at most once per [`Compiler`](crate::Compiler); every
//! schema that includes it shares the same `Arc`. A slot is marked
//! [`CacheSlot::Compiling`] while its file is being compiled, so a lookup that
//! hits such a slot has found an include cycle.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use restgen_core::Schema;

#[derive(Debug, Clone)]
pub enum CacheSlot {
    Compiling,
    Ready(Arc<Schema>),
}

#[derive(Debug, Default)]
pub struct SchemaCache {
    slots: HashMap<PathBuf, CacheSlot>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, path: &Path) -> Option<&CacheSlot> {
        self.slots.get(path)
    }

    /// Returns the compiled schema for `path`, if compilation has finished.
    pub fn get(&self, path: &Path) -> Option<Arc<Schema>> {
        match self.slots.get(path) {
            Some(CacheSlot::Ready(schema)) => Some(Arc::clone(schema)),
            _ => None,
        }
    }

    pub(crate) fn mark_compiling(&mut self, path: PathBuf) {
        self.slots.insert(path, CacheSlot::Compiling);
    }

    pub(crate) fn store(&mut self, path: PathBuf, schema: Arc<Schema>) {
        self.slots.insert(path, CacheSlot::Ready(schema));
    }

    /// Drops the slot for `path`; used when its compilation fails.
    pub(crate) fn forget(&mut self, path: &Path) {
        self.slots.remove(path);
    }

    pub fn contains(&self, path: &Path) -> bool {
        matches!(self.slots.get(path), Some(CacheSlot::Ready(_)))
    }

    /// Number of fully compiled files.
    pub fn len(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot, CacheSlot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_lifecycle() {
        let mut cache = SchemaCache::new();
        let path = PathBuf::from("/schemas/geo.sdl");
        assert!(cache.lookup(&path).is_none());

        cache.mark_compiling(path.clone());
        assert!(matches!(cache.lookup(&path), Some(CacheSlot::Compiling)));
        assert!(cache.get(&path).is_none());
        assert!(cache.is_empty());

        let schema = Arc::new(Schema::default());
        cache.store(path.clone(), Arc::clone(&schema));
        assert!(cache.contains(&path));
        assert!(Arc::ptr_eq(&cache.get(&path).unwrap(), &schema));
        assert_eq!(cache.len(), 1);

        cache.forget(&path);
        assert!(cache.lookup(&path).is_none());
    }
}
