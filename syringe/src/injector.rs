use std::cell::RefCell;
use std::collections::{HashMap, hash_map};
use std::fmt;
use std::mem::take;
use std::sync::{Arc, Weak};

use dashmap::DashMap;

use crate::binder::{Binder, Binding, Target};
use crate::scope::{Erased, SingletonCache};
use crate::{
    InjectError, Injectable, InjectorConfig, Key, KeyId, Module, Provider, Scope, Stage,
};

/// Dependency injection container.
///
/// An injector owns the bindings declared by its modules and a singleton
/// cache that is never shared with other injectors. It is cheap to clone;
/// clones refer to the same container.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use syringe::{Injectable, Injector, implements};
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// impl Injectable for dyn Greeter {}
///
/// struct English;
///
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "Hello".to_string()
///     }
/// }
///
/// impl Injectable for English {
///     fn constructor() -> Option<syringe::Constructor<Self>> {
///         Some(syringe::Constructor::new(|_| Ok(Arc::new(English))))
///     }
/// }
///
/// implements!(English => dyn Greeter);
///
/// # fn main() -> Result<(), syringe::InjectError> {
/// let injector = Injector::builder()
///     .configure(|binder| {
///         binder.bind::<dyn Greeter>().to::<English>().in_singleton_scope();
///     })
///     .build()?;
///
/// let greeter = injector.get_instance::<dyn Greeter>()?;
/// assert_eq!(greeter.greet(), "Hello");
/// assert!(Arc::ptr_eq(&greeter, &injector.get_instance::<dyn Greeter>()?));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Injector {
    pub(crate) inner: Arc<InjectorInner>,
}

pub(crate) struct InjectorInner {
    bindings: HashMap<KeyId, Arc<Binding>>,
    jit_bindings: DashMap<KeyId, Arc<Binding>>,
    singletons: SingletonCache,
    config: InjectorConfig,
}

impl Injector {
    /// Creates a new builder for configuring an injector.
    pub fn builder() -> InjectorBuilder {
        InjectorBuilder {
            modules: Vec::new(),
            config: InjectorConfig::default(),
        }
    }

    /// Resolves an instance of `T` for the unqualified key.
    pub fn get_instance<T>(&self) -> Result<Arc<T>, InjectError>
    where
        T: Injectable + ?Sized,
    {
        self.get_instance_with(&Key::get())
    }

    /// Resolves an instance for the given key.
    pub fn get_instance_with<T>(&self, key: &Key<T>) -> Result<Arc<T>, InjectError>
    where
        T: Injectable + ?Sized,
    {
        Resolver::new(self).get_key(key)
    }

    /// Returns a provider producing instances of `T` on demand.
    pub fn get_provider<T>(&self) -> Provider<T>
    where
        T: Injectable + ?Sized,
    {
        self.get_provider_with(Key::get())
    }

    pub fn get_provider_with<T>(&self, key: Key<T>) -> Provider<T>
    where
        T: Injectable + ?Sized,
    {
        Provider::new(self.downgrade(), key)
    }

    /// Creates a handle that does not keep the injector alive.
    pub fn downgrade(&self) -> WeakInjector {
        WeakInjector {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Checks if the key has an explicit binding.
    ///
    /// Just-in-time bindings are not reported.
    pub fn has_binding<T>(&self, key: &Key<T>) -> bool
    where
        T: ?Sized + 'static,
    {
        self.inner.bindings.contains_key(key.id())
    }

    pub fn config(&self) -> &InjectorConfig {
        &self.inner.config
    }

    fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    fn initialize_eager_singletons(&self) -> Result<(), InjectError> {
        let production = self.inner.config.stage == Stage::Production;
        for binding in self.inner.bindings.values() {
            if binding.scope != Scope::Singleton || !(binding.eager || production) {
                continue;
            }
            tracing::debug!("Initializing eager singleton {}", binding.key);
            Resolver::new(self).provision(binding)?;
        }
        Ok(())
    }
}

/// Non-owning handle to an [`Injector`].
///
/// Instances that need the injector after construction hold this handle,
/// so cached singletons never keep their own injector alive. Every call
/// fails with [`InjectError::InjectorClosed`] once the injector is dropped.
#[derive(Clone)]
pub struct WeakInjector {
    inner: Weak<InjectorInner>,
}

impl WeakInjector {
    pub fn upgrade(&self) -> Result<Injector, InjectError> {
        self.inner
            .upgrade()
            .map(|inner| Injector { inner })
            .ok_or(InjectError::InjectorClosed)
    }

    pub fn get_instance<T>(&self) -> Result<Arc<T>, InjectError>
    where
        T: Injectable + ?Sized,
    {
        self.upgrade()?.get_instance()
    }

    pub fn get_instance_with<T>(&self, key: &Key<T>) -> Result<Arc<T>, InjectError>
    where
        T: Injectable + ?Sized,
    {
        self.upgrade()?.get_instance_with(key)
    }

    pub fn get_provider<T>(&self) -> Provider<T>
    where
        T: Injectable + ?Sized,
    {
        Provider::new(self.clone(), Key::get())
    }
}

impl fmt::Debug for WeakInjector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakInjector")
            .field("closed", &(self.inner.strong_count() == 0))
            .finish()
    }
}

impl InjectorInner {
    fn binding<T>(&self, key: &Key<T>) -> Result<Arc<Binding>, InjectError>
    where
        T: Injectable + ?Sized,
    {
        if let Some(binding) = self.bindings.get(key.id()) {
            return Ok(binding.clone());
        }
        if let Some(binding) = self.jit_bindings.get(key.id()) {
            return Ok(binding.value().clone());
        }
        if key.qualifier().is_some() {
            return Err(InjectError::unresolvable(
                key.id(),
                "qualified keys require an explicit binding",
            ));
        }
        if self.config.require_explicit_bindings {
            return Err(InjectError::unresolvable(
                key.id(),
                "explicit bindings are required",
            ));
        }
        let constructor = T::constructor().ok_or_else(|| {
            InjectError::unresolvable(key.id(), "no implementation is bound")
        })?;
        tracing::trace!("Creating just-in-time binding for {key}");
        let binding = Arc::new(Binding::constructed(key.id().clone(), constructor));
        Ok(self
            .jit_bindings
            .entry(key.id().clone())
            .or_insert(binding)
            .value()
            .clone())
    }
}

/// Builder for constructing an [`Injector`] from modules.
pub struct InjectorBuilder {
    modules: Vec<Box<dyn Module>>,
    config: InjectorConfig,
}

impl InjectorBuilder {
    /// Adds a module whose bindings are applied when the injector is built.
    ///
    /// Modules are applied in installation order; a later binding for the
    /// same key overrides an earlier one.
    pub fn install<M>(&mut self, module: M) -> &mut Self
    where
        M: Module + 'static,
    {
        self.modules.push(Box::new(module));
        self
    }

    /// Adds a module written as a closure.
    pub fn configure<F>(&mut self, configure: F) -> &mut Self
    where
        F: Fn(&mut Binder) + 'static,
    {
        self.install(configure)
    }

    pub fn config(&mut self, config: InjectorConfig) -> &mut Self {
        self.config = config;
        self
    }

    pub fn stage(&mut self, stage: Stage) -> &mut Self {
        self.config.stage = stage;
        self
    }

    /// Builds the injector.
    ///
    /// Fails if a binding has no usable target or an eager singleton cannot
    /// be created.
    pub fn build(&mut self) -> Result<Injector, InjectError> {
        let mut binder = Binder::new();
        for module in take(&mut self.modules) {
            module.configure(&mut binder);
        }
        let mut bindings = HashMap::new();
        for binding in binder.bindings {
            match bindings.entry(binding.key.clone()) {
                hash_map::Entry::Occupied(mut v) => {
                    tracing::debug!("Overriding binding for {}", binding.key);
                    v.insert(Arc::new(binding));
                }
                hash_map::Entry::Vacant(v) => {
                    v.insert(Arc::new(binding));
                }
            }
        }
        if let Some(binding) = bindings
            .values()
            .find(|binding| matches!(binding.target, Target::Missing))
        {
            return Err(InjectError::unresolvable(
                &binding.key,
                "binding has no target and the type is not constructible",
            ));
        }
        let mut config = self.config.clone();
        config.require_explicit_bindings |= binder.require_explicit_bindings;
        let injector = Injector {
            inner: Arc::new(InjectorInner {
                bindings,
                jit_bindings: DashMap::new(),
                singletons: SingletonCache::default(),
                config,
            }),
        };
        injector.initialize_eager_singletons()?;
        tracing::debug!(
            "Created injector with {} bindings in {:?} stage",
            injector.inner.bindings.len(),
            injector.inner.config.stage,
        );
        Ok(injector)
    }
}

thread_local! {
    /// Keys under construction on the current thread, tagged by injector.
    ///
    /// Shared by every resolver on the thread, so resolutions started from
    /// providers or injector handles inside a constructor still see the
    /// keys their caller is building.
    static RESOLUTION_PATH: RefCell<Vec<(usize, KeyId)>> = const { RefCell::new(Vec::new()) };
}

/// Pops the key pushed by [`Resolver::enter`].
struct PathGuard;

impl Drop for PathGuard {
    fn drop(&mut self) {
        RESOLUTION_PATH.with_borrow_mut(|path| {
            path.pop();
        });
    }
}

/// Resolution context of a single request.
///
/// Constructors and providers receive a resolver to pull their own
/// dependencies. Cycles are detected across every resolution running on
/// the current thread for the same injector.
pub struct Resolver<'a> {
    injector: &'a Injector,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(injector: &'a Injector) -> Self {
        Self { injector }
    }

    pub fn injector(&self) -> &'a Injector {
        self.injector
    }

    /// Resolves an instance of `T` for the unqualified key.
    pub fn get<T>(&self) -> Result<Arc<T>, InjectError>
    where
        T: Injectable + ?Sized,
    {
        self.get_key(&Key::get())
    }

    /// Resolves an instance for the given key.
    pub fn get_key<T>(&self, key: &Key<T>) -> Result<Arc<T>, InjectError>
    where
        T: Injectable + ?Sized,
    {
        let binding = self.injector.inner.binding(key)?;
        let instance = self.provision(&binding)?;
        instance
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or_else(|| InjectError::TypeMismatch {
                key: key.id().clone(),
            })
    }

    /// Returns a provider for the given key, deferring its production.
    pub fn provider<T>(&self, key: Key<T>) -> Provider<T>
    where
        T: Injectable + ?Sized,
    {
        self.injector.get_provider_with(key)
    }

    fn provision(&self, binding: &Binding) -> Result<Erased, InjectError> {
        // Must run before the singleton cell is entered, re-entrant
        // initialization of a cell never returns.
        let _guard = self.enter(&binding.key)?;
        self.produce(binding)
    }

    fn enter(&self, key: &KeyId) -> Result<PathGuard, InjectError> {
        let injector = self.injector.id();
        RESOLUTION_PATH.with_borrow_mut(|path| {
            if let Some(start) = path
                .iter()
                .position(|(owner, v)| *owner == injector && v == key)
            {
                let mut cycle: Vec<_> = path[start..]
                    .iter()
                    .filter(|(owner, _)| *owner == injector)
                    .map(|(_, v)| v.clone())
                    .collect();
                cycle.push(key.clone());
                return Err(InjectError::CyclicDependency { path: cycle });
            }
            path.push((injector, key.clone()));
            Ok(PathGuard)
        })
    }

    fn produce(&self, binding: &Binding) -> Result<Erased, InjectError> {
        let singletons = &self.injector.inner.singletons;
        match &binding.target {
            Target::Instance(instance) => Ok(instance.clone()),
            Target::Implementation { type_name, factory } => {
                tracing::trace!("Resolving {} with {type_name}", binding.key);
                singletons.scoped(&binding.key, binding.scope, || factory(self))
            }
            Target::Provider(factory) => {
                tracing::trace!("Resolving {} with provider", binding.key);
                singletons.scoped(&binding.key, binding.scope, || factory(self))
            }
            Target::Missing => Err(InjectError::unresolvable(
                &binding.key,
                "binding has no target and the type is not constructible",
            )),
        }
    }
}
