//! # syringe
//!
//! A Guice-style dependency injection container for Rust applications with
//! type-safe keys, qualifiers, scopes and lazy providers.
//!
//! ## Core Concepts
//!
//! - **Injector**: The container that resolves instances from its bindings
//! - **Module**: A unit of configuration that declares bindings on a [`Binder`]
//! - **Key**: A requested type, optionally distinguished by a [`Qualifier`]
//! - **Injectable**: A type the injector can produce, with its injection points
//! - **Provider**: A deferred, on-demand producer of instances
//!
//! ## Just-in-time Bindings
//!
//! Constructible types do not need to be bound at all:
//!
//! ```rust
//! use std::sync::Arc;
//! use syringe::{Injectable, Injector};
//!
//! #[derive(Injectable)]
//! struct SimpleEditor;
//!
//! # fn main() -> Result<(), syringe::InjectError> {
//! let injector = Injector::builder().build()?;
//!
//! let editor = injector.get_instance::<SimpleEditor>()?;
//! let other = injector.get_instance::<SimpleEditor>()?;
//! assert!(!Arc::ptr_eq(&editor, &other));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules and Qualifiers
//!
//! Interfaces are bound to implementations in modules, optionally under a
//! name or a marker type:
//!
//! ```rust
//! use std::sync::Arc;
//! use syringe::{Injectable, Injector, injectable};
//!
//! trait DependencyService: Send + Sync {}
//!
//! impl Injectable for dyn DependencyService {}
//!
//! #[derive(Injectable)]
//! #[inject(implements(dyn DependencyService))]
//! struct Local;
//!
//! impl DependencyService for Local {}
//!
//! #[derive(Injectable)]
//! #[inject(implements(dyn DependencyService))]
//! struct Cached;
//!
//! impl DependencyService for Cached {}
//!
//! struct Editor {
//!     local: Arc<dyn DependencyService>,
//!     cached: Arc<dyn DependencyService>,
//! }
//!
//! #[injectable]
//! impl Editor {
//!     #[inject]
//!     fn new(
//!         local: Arc<dyn DependencyService>,
//!         #[named("Cached")] cached: Arc<dyn DependencyService>,
//!     ) -> Self {
//!         Self { local, cached }
//!     }
//! }
//!
//! # fn main() -> Result<(), syringe::InjectError> {
//! let injector = Injector::builder()
//!     .configure(|binder| {
//!         binder.bind::<dyn DependencyService>().to::<Local>();
//!         binder
//!             .bind::<dyn DependencyService>()
//!             .named("Cached")
//!             .to::<Cached>()
//!             .in_singleton_scope();
//!     })
//!     .build()?;
//!
//! let editor = injector.get_instance::<Editor>()?;
//! # let _ = (&editor.local, &editor.cached);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `macros` (default): Enables `#[derive(Injectable)]` and `#[injectable]`

mod binder;
mod config;
mod error;
mod inject;
mod injector;
mod key;
mod provider;
mod scope;

pub use binder::{Binder, BindingBuilder, Implements, Module};
pub use config::*;
pub use error::*;
pub use inject::*;
pub use injector::{Injector, InjectorBuilder, Resolver, WeakInjector};
pub use key::*;
pub use provider::*;
pub use scope::Scope;

#[cfg(feature = "macros")]
pub use syringe_macros::*;

/// Declares that a type can stand in for one or more interfaces.
///
/// ```rust
/// use syringe::implements;
///
/// trait Storage: Send + Sync {}
///
/// struct MemoryStorage;
///
/// impl Storage for MemoryStorage {}
///
/// implements!(MemoryStorage => dyn Storage);
/// ```
#[macro_export]
macro_rules! implements {
    ($ty:ty => $($interface:ty),+ $(,)?) => {
        $(
            impl $crate::Implements<$interface> for $ty {
                fn upcast(this: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$interface> {
                    this
                }
            }
        )+
    };
}
