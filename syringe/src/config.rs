use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{InjectError, StdError};

/// Development stage of the application using the injector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Singletons are created lazily on first request.
    #[default]
    Development,
    /// Every singleton binding is created while the injector is built,
    /// surfacing construction errors early.
    Production,
}

/// Injector settings, usually loaded from a JSON document:
///
/// ```json
/// {
///     "stage": "production",
///     "require_explicit_bindings": true
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectorConfig {
    pub stage: Stage,
    /// Disables just-in-time bindings.
    pub require_explicit_bindings: bool,
}

impl InjectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    pub fn with_explicit_bindings(mut self, require: bool) -> Self {
        self.require_explicit_bindings = require;
        self
    }

    pub fn parse<T>(text: T) -> Result<Self, InjectError>
    where
        T: AsRef<str>,
    {
        Ok(serde_json::from_str(text.as_ref())?)
    }

    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self, StdError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(text)?)
    }
}
