//! Request keys identifying what is asked of the injector.
//!
//! A key combines the identity of the requested type with an optional
//! [`Qualifier`]. Two keys are equal when both parts are equal, so the same
//! type can be bound several times under different qualifiers.

use std::any::{TypeId, type_name};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Secondary discriminator distinguishing bindings of the same type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Qualifier {
    /// Qualifies a key by name, like `@Named("Cached")`.
    Named(Cow<'static, str>),
    /// Qualifies a key by a marker type, like `@Cached`.
    Annotated(Annotation),
}

impl Qualifier {
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Named(name.into())
    }

    pub fn annotated<A>() -> Self
    where
        A: ?Sized + 'static,
    {
        Self::Annotated(Annotation::of::<A>())
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Qualifier::Named(name) => write!(f, "@Named({name:?})"),
            Qualifier::Annotated(annotation) => write!(f, "@{}", annotation.name()),
        }
    }
}

/// Identity of a marker type used as a qualifier.
///
/// Only the type identity takes part in comparisons; the name is kept for
/// diagnostics.
#[derive(Clone, Copy, Debug)]
pub struct Annotation {
    type_id: TypeId,
    type_name: &'static str,
}

impl Annotation {
    pub fn of<A>() -> Self
    where
        A: ?Sized + 'static,
    {
        Self {
            type_id: TypeId::of::<A>(),
            type_name: type_name::<A>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for Annotation {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for Annotation {}

impl Hash for Annotation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

/// Type-erased request key, used by the binding registry and diagnostics.
#[derive(Clone, Debug)]
pub struct KeyId {
    type_id: TypeId,
    type_name: &'static str,
    qualifier: Option<Qualifier>,
}

impl KeyId {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.qualifier.as_ref()
    }
}

impl PartialEq for KeyId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.qualifier == other.qualifier
    }
}

impl Eq for KeyId {}

impl Hash for KeyId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.qualifier.hash(state);
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{qualifier} {}", self.type_name),
            None => f.write_str(self.type_name),
        }
    }
}

/// Typed request key for instances of `T`.
///
/// `T` may be unsized, so `Key<dyn Service>` requests an implementation of
/// the `Service` interface.
///
/// # Examples
///
/// ```rust
/// use syringe::Key;
///
/// struct Cached;
///
/// let plain = Key::<String>::get();
/// let named = Key::<String>::named("role");
/// let annotated = Key::<String>::annotated_with::<Cached>();
///
/// assert_ne!(plain, named);
/// assert_ne!(named, annotated);
/// assert_eq!(named, Key::<String>::named("role"));
/// ```
pub struct Key<T>
where
    T: ?Sized,
{
    id: KeyId,
    _type: PhantomData<fn() -> Box<T>>,
}

impl<T> Key<T>
where
    T: ?Sized + 'static,
{
    /// Creates an unqualified key.
    pub fn get() -> Self {
        Self::new(None)
    }

    pub fn new(qualifier: Option<Qualifier>) -> Self {
        Self {
            id: KeyId {
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
                qualifier,
            },
            _type: PhantomData,
        }
    }

    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Some(Qualifier::named(name)))
    }

    pub fn annotated_with<A>() -> Self
    where
        A: ?Sized + 'static,
    {
        Self::new(Some(Qualifier::annotated::<A>()))
    }

    pub fn id(&self) -> &KeyId {
        &self.id
    }

    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.id.qualifier.as_ref()
    }

    pub(crate) fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.id.qualifier = Some(qualifier);
        self
    }
}

impl<T> Clone for Key<T>
where
    T: ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            _type: PhantomData,
        }
    }
}

impl<T> PartialEq for Key<T>
where
    T: ?Sized,
{
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Key<T> where T: ?Sized {}

impl<T> fmt::Debug for Key<T>
where
    T: ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key").field(&self.id).finish()
    }
}

impl<T> fmt::Display for Key<T>
where
    T: ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.id.fmt(f)
    }
}
