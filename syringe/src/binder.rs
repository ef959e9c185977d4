use std::any::type_name;
use std::borrow::Cow;
use std::sync::Arc;

use crate::scope::Erased;
use crate::{Constructor, InjectError, Injectable, Key, KeyId, Qualifier, Resolver, Scope};

pub(crate) type Factory = Arc<dyn Fn(&Resolver<'_>) -> Result<Erased, InjectError> + Send + Sync>;

fn factory<F>(f: F) -> Factory
where
    F: Fn(&Resolver<'_>) -> Result<Erased, InjectError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Production strategy of a binding.
pub(crate) enum Target {
    /// Builds an implementing type, either the key type itself or a linked one.
    Implementation {
        type_name: &'static str,
        factory: Factory,
    },
    /// Returns a pre-built instance. Never scoped.
    Instance(Erased),
    /// Invokes a user provider.
    Provider(Factory),
    /// Untargetted binding of a type without a constructor.
    Missing,
}

pub(crate) struct Binding {
    pub(crate) key: KeyId,
    pub(crate) target: Target,
    pub(crate) scope: Scope,
    pub(crate) eager: bool,
}

impl Binding {
    pub(crate) fn constructed<T>(key: KeyId, constructor: Constructor<T>) -> Self
    where
        T: Injectable + ?Sized,
    {
        Self {
            key,
            target: Target::Implementation {
                type_name: type_name::<T>(),
                factory: factory(move |resolver| {
                    constructor
                        .construct(resolver)
                        .map(|instance| Arc::new(instance) as Erased)
                }),
            },
            scope: T::scope(),
            eager: false,
        }
    }
}

/// Unit of injector configuration contributing binding declarations.
///
/// Any `Fn(&mut Binder)` closure is a module.
///
/// # Examples
///
/// ```rust
/// use syringe::{Binder, Injector, Module};
///
/// struct SettingsModule {
///     role: String,
/// }
///
/// impl Module for SettingsModule {
///     fn configure(&self, binder: &mut Binder) {
///         binder
///             .bind::<String>()
///             .named("role")
///             .to_instance(self.role.clone());
///     }
/// }
///
/// # fn main() -> Result<(), syringe::InjectError> {
/// let injector = Injector::builder()
///     .install(SettingsModule {
///         role: "Project Developer".to_string(),
///     })
///     .build()?;
/// let role = injector.get_instance_with(&syringe::Key::<String>::named("role"))?;
/// assert_eq!(role.as_str(), "Project Developer");
/// # Ok(())
/// # }
/// ```
pub trait Module {
    fn configure(&self, binder: &mut Binder);
}

impl<F> Module for F
where
    F: Fn(&mut Binder),
{
    fn configure(&self, binder: &mut Binder) {
        self(binder)
    }
}

/// Collects binding declarations from modules.
pub struct Binder {
    pub(crate) bindings: Vec<Binding>,
    pub(crate) require_explicit_bindings: bool,
}

impl Binder {
    pub(crate) fn new() -> Self {
        Self {
            bindings: Vec::new(),
            require_explicit_bindings: false,
        }
    }

    /// Starts a binding declaration for `T`.
    ///
    /// Without a target the binding builds `T` itself, which requires `T`
    /// to have a constructor; injector creation fails otherwise.
    pub fn bind<T>(&mut self) -> BindingBuilder<'_, T>
    where
        T: Injectable + ?Sized,
    {
        let key = Key::<T>::get();
        let binding = match T::constructor() {
            Some(constructor) => Binding::constructed(key.id().clone(), constructor),
            None => Binding {
                key: key.id().clone(),
                target: Target::Missing,
                scope: T::scope(),
                eager: false,
            },
        };
        self.bindings.push(binding);
        let index = self.bindings.len() - 1;
        BindingBuilder {
            binding: &mut self.bindings[index],
            key,
            explicit_scope: false,
        }
    }

    /// Applies the bindings of another module.
    pub fn install<M>(&mut self, module: M) -> &mut Self
    where
        M: Module,
    {
        module.configure(self);
        self
    }

    /// Disables just-in-time bindings for the injector being built.
    pub fn require_explicit_bindings(&mut self) -> &mut Self {
        self.require_explicit_bindings = true;
        self
    }
}

/// Trait for types that can stand in for the interface `I`.
///
/// Implemented reflexively for every type; implementations for interfaces
/// are usually generated with [`implements!`](crate::implements) or
/// `#[inject(implements(...))]` on derived types.
pub trait Implements<I>
where
    I: ?Sized,
{
    fn upcast(this: Arc<Self>) -> Arc<I>;
}

impl<T> Implements<T> for T
where
    T: ?Sized,
{
    fn upcast(this: Arc<Self>) -> Arc<T> {
        this
    }
}

/// Fluent declaration of a single binding.
pub struct BindingBuilder<'a, T>
where
    T: ?Sized,
{
    binding: &'a mut Binding,
    key: Key<T>,
    explicit_scope: bool,
}

impl<T> BindingBuilder<'_, T>
where
    T: Injectable + ?Sized,
{
    /// Qualifies the key by name.
    pub fn named(self, name: impl Into<Cow<'static, str>>) -> Self {
        self.qualified(Qualifier::named(name))
    }

    /// Qualifies the key by the marker type `A`.
    pub fn annotated_with<A>(self) -> Self
    where
        A: ?Sized + 'static,
    {
        self.qualified(Qualifier::annotated::<A>())
    }

    /// Links the key to the implementing type `U`.
    ///
    /// `U` is resolved through the injector, so its own binding and scope
    /// apply.
    pub fn to<U>(mut self) -> Self
    where
        U: Injectable + Implements<T>,
    {
        self.binding.target = Target::Implementation {
            type_name: type_name::<U>(),
            factory: factory(|resolver| {
                let instance = resolver.get::<U>()?;
                Ok(Arc::new(U::upcast(instance)) as Erased)
            }),
        };
        self.reset_implied_scope();
        self
    }

    /// Binds the key to a fixed instance.
    pub fn to_instance(self, instance: impl Into<Arc<T>>) -> Self {
        let instance: Arc<T> = instance.into();
        self.binding.target = Target::Instance(Arc::new(instance));
        self
    }

    /// Binds the key to a provider invoked on every production.
    ///
    /// The provider receives a [`Resolver`] to pull its own dependencies.
    pub fn to_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn(&Resolver<'_>) -> Result<Arc<T>, InjectError> + Send + Sync + 'static,
    {
        self.binding.target = Target::Provider(factory(move |resolver| {
            provider(resolver).map(|instance| Arc::new(instance) as Erased)
        }));
        self.reset_implied_scope();
        self
    }

    pub fn in_scope(mut self, scope: Scope) -> Self {
        self.binding.scope = scope;
        self.explicit_scope = true;
        self
    }

    pub fn in_singleton_scope(self) -> Self {
        self.in_scope(Scope::Singleton)
    }

    /// Singleton instantiated while the injector is built.
    pub fn as_eager_singleton(self) -> Self {
        self.binding.eager = true;
        self.in_singleton_scope()
    }

    pub fn key(&self) -> &Key<T> {
        &self.key
    }

    fn qualified(mut self, qualifier: Qualifier) -> Self {
        self.key = self.key.with_qualifier(qualifier);
        self.binding.key = self.key.id().clone();
        self
    }

    // Type-level scopes only apply when the type builds itself.
    fn reset_implied_scope(&mut self) {
        if !self.explicit_scope {
            self.binding.scope = Scope::Unscoped;
        }
    }
}
