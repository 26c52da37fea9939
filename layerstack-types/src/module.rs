//! Module identifiers.
//!
//! A module is an independently loaded unit of configuration. Every item it
//! contributes to a collection is owned by its [`ModuleId`], which is the unit
//! of bulk teardown and export.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Identifier of the module that owns the built-in configuration.
const DEFAULT_MODULE: &str = "_defaultModule";

/// Unique identifier for a configuration module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    /// Creates a module ID from any string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The module owning items that were added without an explicit module.
    #[must_use]
    pub fn default_module() -> Self {
        Self(DEFAULT_MODULE.to_owned())
    }

    /// Returns true if this is the default module.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_MODULE
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses a module ID, rejecting blank identifiers.
    pub fn parse(s: &str) -> crate::Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidModuleId(s.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl Default for ModuleId {
    fn default() -> Self {
        Self::default_module()
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ModuleId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&str> for ModuleId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ModuleId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for ModuleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
