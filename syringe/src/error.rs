use crate::KeyId;

/// Type alias for boxed errors that can be sent across threads.
///
/// Constructors and providers may fail with any error convertible into this
/// type; the injector wraps it into [`InjectError::Provision`].
pub type StdError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while building an injector or resolving a key.
#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    /// No binding exists for the key and no instance can be synthesized.
    #[error("Unable to resolve {key}: {reason}")]
    UnresolvableBinding { key: KeyId, reason: &'static str },
    /// The type declares more than one injectable constructor.
    #[error("{type_name} declares {count} injectable constructors")]
    AmbiguousInjectionPoint {
        type_name: &'static str,
        count: usize,
    },
    /// The type declares neither an injectable nor a default constructor.
    #[error("{type_name} has no injectable or default constructor")]
    MissingConstructor { type_name: &'static str },
    /// Resolving a key required resolving the same key again.
    #[error("Cyclic dependency detected: {}", format_path(.path))]
    CyclicDependency { path: Vec<KeyId> },
    /// A constructor or provider returned an error.
    #[error("Provision of {type_name} failed: {source}")]
    Provision {
        type_name: &'static str,
        source: StdError,
    },
    /// A provider outlived the injector it was created by.
    #[error("Injector has been dropped")]
    InjectorClosed,
    /// A binding produced an instance of a type other than its key type.
    #[error("Binding for {key} produced an instance of unexpected type")]
    TypeMismatch { key: KeyId },
    /// The injector configuration could not be parsed.
    #[error("Invalid injector config: {0}")]
    Config(#[from] serde_json::Error),
}

impl InjectError {
    /// Wraps a user error raised while producing an instance of `T`.
    ///
    /// Injection errors returned by nested resolutions pass through as is.
    pub fn provision<T>(source: impl Into<StdError>) -> Self
    where
        T: ?Sized,
    {
        let source: StdError = source.into();
        match source.downcast::<InjectError>() {
            Ok(err) => *err,
            Err(source) => Self::Provision {
                type_name: std::any::type_name::<T>(),
                source,
            },
        }
    }

    pub(crate) fn unresolvable(key: &KeyId, reason: &'static str) -> Self {
        Self::UnresolvableBinding {
            key: key.clone(),
            reason,
        }
    }
}

fn format_path(path: &[KeyId]) -> String {
    path.iter()
        .map(|key| key.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
