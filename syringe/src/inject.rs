//! Injection points and dependency extraction.
//!
//! Rust has no runtime reflection over constructors, so every type the
//! injector can produce declares itself through [`Injectable`]. Concrete
//! types describe how they are built with an [`InjectionPlan`]; interfaces
//! and plain values implement [`Injectable`] without a constructor and can
//! only be produced through explicit bindings.
//!
//! # Core Traits
//!
//! - [`Injectable`] - Declares a requestable type, its constructor and scope
//! - [`Dependency`] - Extracts a constructor parameter or field from a [`Resolver`]
//!
//! # Examples
//!
//! Declaring an interface and a constructible implementation by hand:
//!
//! ```rust
//! use std::sync::Arc;
//! use syringe::{Constructor, Dependency, Injectable, InjectionPlan, Injector};
//!
//! trait Repository: Send + Sync {}
//!
//! impl Injectable for dyn Repository {}
//!
//! #[derive(Default)]
//! struct MemoryRepository;
//!
//! impl Repository for MemoryRepository {}
//!
//! syringe::implements!(MemoryRepository => dyn Repository);
//!
//! impl Injectable for MemoryRepository {
//!     fn constructor() -> Option<Constructor<Self>> {
//!         Some(InjectionPlan::new().default_constructor(Self::default).into())
//!     }
//! }
//!
//! struct Handler {
//!     repository: Arc<dyn Repository>,
//! }
//!
//! impl Injectable for Handler {
//!     fn constructor() -> Option<Constructor<Self>> {
//!         Some(
//!             InjectionPlan::new()
//!                 .constructor("new", |resolver| {
//!                     Ok(Self {
//!                         repository: Dependency::resolve(resolver, None)?,
//!                     })
//!                 })
//!                 .into(),
//!         )
//!     }
//! }
//!
//! # fn main() -> Result<(), syringe::InjectError> {
//! let injector = Injector::builder()
//!     .install(|binder: &mut syringe::Binder| {
//!         binder.bind::<dyn Repository>().to::<MemoryRepository>();
//!     })
//!     .build()?;
//! let handler = injector.get_instance::<Handler>()?;
//! # let _ = &handler.repository;
//! # Ok(())
//! # }
//! ```

use std::any::type_name;
use std::sync::Arc;

use crate::{InjectError, Key, Provider, Qualifier, Resolver, Scope, WeakInjector};

/// Trait for types that can be requested from an [`Injector`](crate::Injector).
///
/// The default implementation describes a type the injector cannot build
/// on its own: interfaces (`dyn Trait`) and plain values, which must be
/// bound explicitly. Types returning a [`Constructor`] are eligible for
/// just-in-time binding.
pub trait Injectable: Send + Sync + 'static {
    /// Returns how to build a new instance, if the type is constructible.
    fn constructor() -> Option<Constructor<Self>> {
        None
    }

    /// Scope applied to just-in-time and untargetted bindings of this type.
    fn scope() -> Scope {
        Scope::Unscoped
    }
}

type BuildFn<T> = dyn Fn(&Resolver<'_>) -> Result<Arc<T>, InjectError> + Send + Sync;

/// Type-erased constructor of `T`.
pub struct Constructor<T>
where
    T: ?Sized,
{
    build: Box<BuildFn<T>>,
}

impl<T> Constructor<T>
where
    T: ?Sized + 'static,
{
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(&Resolver<'_>) -> Result<Arc<T>, InjectError> + Send + Sync + 'static,
    {
        Self {
            build: Box::new(build),
        }
    }

    pub(crate) fn construct(&self, resolver: &Resolver<'_>) -> Result<Arc<T>, InjectError> {
        (self.build)(resolver)
    }
}

impl<T> From<InjectionPlan<T>> for Constructor<T>
where
    T: Send + Sync + 'static,
{
    fn from(plan: InjectionPlan<T>) -> Self {
        Constructor::new(move |resolver| plan.instantiate(resolver).map(Arc::new))
    }
}

type PointFn<T> = Box<dyn Fn(&Resolver<'_>) -> Result<T, InjectError> + Send + Sync>;
type MemberFn<T> = Box<dyn Fn(&mut T, &Resolver<'_>) -> Result<(), InjectError> + Send + Sync>;

/// Injection points of a constructible type.
///
/// Construction selects exactly one point, in order of preference:
///
/// 1. The single constructor registered with [`InjectionPlan::constructor`].
///    Registering more than one makes every resolution fail with
///    [`InjectError::AmbiguousInjectionPoint`].
/// 2. The field initializer registered with [`InjectionPlan::fields`].
/// 3. The no-argument constructor registered with
///    [`InjectionPlan::default_constructor`].
///
/// Setters then run in registration order on the constructed value.
pub struct InjectionPlan<T> {
    constructors: Vec<(&'static str, PointFn<T>)>,
    fields: Option<PointFn<T>>,
    default_constructor: Option<fn() -> T>,
    setters: Vec<(&'static str, MemberFn<T>)>,
}

impl<T> InjectionPlan<T>
where
    T: 'static,
{
    pub fn new() -> Self {
        Self {
            constructors: Vec::new(),
            fields: None,
            default_constructor: None,
            setters: Vec::new(),
        }
    }

    /// Registers a constructor marked for injection.
    pub fn constructor<F>(mut self, name: &'static str, build: F) -> Self
    where
        F: Fn(&Resolver<'_>) -> Result<T, InjectError> + Send + Sync + 'static,
    {
        self.constructors.push((name, Box::new(build)));
        self
    }

    /// Registers an initializer that resolves every injected field.
    pub fn fields<F>(mut self, build: F) -> Self
    where
        F: Fn(&Resolver<'_>) -> Result<T, InjectError> + Send + Sync + 'static,
    {
        self.fields = Some(Box::new(build));
        self
    }

    /// Registers the fallback no-argument constructor.
    pub fn default_constructor(mut self, build: fn() -> T) -> Self {
        self.default_constructor = Some(build);
        self
    }

    /// Registers a setter marked for injection.
    pub fn setter<F>(mut self, name: &'static str, inject: F) -> Self
    where
        F: Fn(&mut T, &Resolver<'_>) -> Result<(), InjectError> + Send + Sync + 'static,
    {
        self.setters.push((name, Box::new(inject)));
        self
    }

    pub(crate) fn instantiate(&self, resolver: &Resolver<'_>) -> Result<T, InjectError> {
        let mut instance = match self.constructors.as_slice() {
            [(name, build)] => {
                tracing::trace!("Constructing {} with {name}", type_name::<T>());
                build(resolver)?
            }
            [] => match (&self.fields, self.default_constructor) {
                (Some(build), _) => {
                    tracing::trace!("Constructing {} with injected fields", type_name::<T>());
                    build(resolver)?
                }
                (None, Some(build)) => build(),
                (None, None) => {
                    return Err(InjectError::MissingConstructor {
                        type_name: type_name::<T>(),
                    });
                }
            },
            constructors => {
                return Err(InjectError::AmbiguousInjectionPoint {
                    type_name: type_name::<T>(),
                    count: constructors.len(),
                });
            }
        };
        for (name, inject) in &self.setters {
            tracing::trace!("Injecting {}::{name}", type_name::<T>());
            inject(&mut instance, resolver)?;
        }
        Ok(instance)
    }
}

impl<T> Default for InjectionPlan<T>
where
    T: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for values that can be extracted as a constructor parameter,
/// injected field or setter argument.
///
/// `qualifier` is the qualifier declared on the injection point, if any.
pub trait Dependency: Sized {
    fn resolve(resolver: &Resolver<'_>, qualifier: Option<Qualifier>) -> Result<Self, InjectError>;
}

impl<T> Dependency for Arc<T>
where
    T: Injectable + ?Sized,
{
    fn resolve(resolver: &Resolver<'_>, qualifier: Option<Qualifier>) -> Result<Self, InjectError> {
        resolver.get_key(&Key::new(qualifier))
    }
}

impl<T> Dependency for Provider<T>
where
    T: Injectable + ?Sized,
{
    fn resolve(resolver: &Resolver<'_>, qualifier: Option<Qualifier>) -> Result<Self, InjectError> {
        Ok(resolver.provider(Key::new(qualifier)))
    }
}

/// Optional injection: resolves to `None` when the requested key itself has
/// no binding. Failures of its transitive dependencies are still reported.
impl<T> Dependency for Option<Arc<T>>
where
    T: Injectable + ?Sized,
{
    fn resolve(resolver: &Resolver<'_>, qualifier: Option<Qualifier>) -> Result<Self, InjectError> {
        let key = Key::<T>::new(qualifier);
        match resolver.get_key(&key) {
            Ok(instance) => Ok(Some(instance)),
            Err(InjectError::UnresolvableBinding { key: missing, .. }) if &missing == key.id() => {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

/// Instances receive a weak handle, a strong one held by a singleton would
/// keep its own injector alive.
impl Dependency for WeakInjector {
    fn resolve(resolver: &Resolver<'_>, _qualifier: Option<Qualifier>) -> Result<Self, InjectError> {
        Ok(resolver.injector().downgrade())
    }
}

macro_rules! value_dependencies {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Injectable for $ty {}

            impl Dependency for $ty {
                fn resolve(
                    resolver: &Resolver<'_>,
                    qualifier: Option<Qualifier>,
                ) -> Result<Self, InjectError> {
                    let value = resolver.get_key(&Key::<$ty>::new(qualifier))?;
                    Ok(<$ty>::clone(&value))
                }
            }
        )*
    };
}

value_dependencies!(
    String, bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
);
