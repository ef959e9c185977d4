use std::fmt;
use std::sync::Arc;

use crate::{InjectError, Injectable, Key, WeakInjector};

/// Deferred, on-demand producer of instances for a key.
///
/// A provider changes only when production happens: each [`get`](Self::get)
/// resolves the key again, so unscoped bindings yield a new instance per
/// call and singleton bindings yield the cached one.
///
/// Providers hold a weak reference to their injector and fail with
/// [`InjectError::InjectorClosed`] once it is dropped.
pub struct Provider<T>
where
    T: ?Sized,
{
    injector: WeakInjector,
    key: Key<T>,
}

impl<T> Provider<T>
where
    T: Injectable + ?Sized,
{
    pub(crate) fn new(injector: WeakInjector, key: Key<T>) -> Self {
        Self { injector, key }
    }

    pub fn get(&self) -> Result<Arc<T>, InjectError> {
        self.injector.get_instance_with(&self.key)
    }

    pub fn key(&self) -> &Key<T> {
        &self.key
    }
}

impl<T> Clone for Provider<T>
where
    T: ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            injector: self.injector.clone(),
            key: self.key.clone(),
        }
    }
}

impl<T> fmt::Debug for Provider<T>
where
    T: ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider").field("key", &self.key).finish()
    }
}
