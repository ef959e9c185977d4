use std::any::Any;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::{InjectError, KeyId};

/// Type-erased instance. The boxed value is always an `Arc<T>` for the key
/// type `T`, which keeps unsized interface types storable.
pub(crate) type Erased = Arc<dyn Any + Send + Sync>;

/// Policy governing instance reuse across resolutions of the same key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// A new instance is produced for every request.
    #[default]
    Unscoped,
    /// One instance is produced per injector and reused afterwards.
    Singleton,
}

/// Per-injector cache of singleton instances.
///
/// Each key owns a once-cell, so concurrent first requests for the same key
/// run the factory at most once and every caller observes the same instance.
#[derive(Default)]
pub(crate) struct SingletonCache {
    cells: DashMap<KeyId, Arc<OnceCell<Erased>>>,
}

impl SingletonCache {
    pub(crate) fn scoped<F>(&self, key: &KeyId, scope: Scope, factory: F) -> Result<Erased, InjectError>
    where
        F: FnOnce() -> Result<Erased, InjectError>,
    {
        match scope {
            Scope::Unscoped => factory(),
            Scope::Singleton => {
                // The map guard must not be held while the factory resolves
                // other keys, which may live in the same shard.
                let cell = self.cells.entry(key.clone()).or_default().value().clone();
                let instance = cell.get_or_try_init(|| {
                    tracing::debug!("Creating singleton {key}");
                    factory()
                })?;
                Ok(instance.clone())
            }
        }
    }

    #[cfg(test)]
    fn contains(&self, key: &KeyId) -> bool {
        self.cells.get(key).is_some_and(|cell| cell.value().get().is_some())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::Key;

    fn counting_factory(counter: &AtomicUsize) -> Result<Erased, InjectError> {
        let value = counter.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(Arc::new(value)))
    }

    #[test]
    fn test_unscoped_runs_factory_every_time() {
        let cache = SingletonCache::default();
        let key = Key::<usize>::get();
        let counter = AtomicUsize::new(0);
        for _ in 0..3 {
            cache
                .scoped(key.id(), Scope::Unscoped, || counting_factory(&counter))
                .unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert!(!cache.contains(key.id()));
    }

    #[test]
    fn test_singleton_runs_factory_once() {
        let cache = SingletonCache::default();
        let key = Key::<usize>::get();
        let counter = AtomicUsize::new(0);
        let first = cache
            .scoped(key.id(), Scope::Singleton, || counting_factory(&counter))
            .unwrap();
        let second = cache
            .scoped(key.id(), Scope::Singleton, || counting_factory(&counter))
            .unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.contains(key.id()));
    }

    #[test]
    fn test_singleton_failure_is_not_cached() {
        let cache = SingletonCache::default();
        let key = Key::<usize>::get();
        let result = cache.scoped(key.id(), Scope::Singleton, || {
            Err(InjectError::provision::<usize>("boom"))
        });
        assert!(matches!(result, Err(InjectError::Provision { .. })));
        assert!(!cache.contains(key.id()));
        let counter = AtomicUsize::new(7);
        cache
            .scoped(key.id(), Scope::Singleton, || counting_factory(&counter))
            .unwrap();
        assert!(cache.contains(key.id()));
    }
}
