//! Identifier wrappers for nations and citizens.
//!
//! Nations are keyed by stable string IDs chosen by the nation store (the
//! engine never mints them). Citizens are players and carry a UUID. Both
//! are newtypes so the two can never be mixed up at compile time.

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Stable identifier of a nation.
///
/// Ordering is the lexicographic ordering of the underlying string, which
/// is what the canonical pair key relies on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct NationId(pub String);

impl NationId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl core::fmt::Display for NationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NationId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for NationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for NationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Identifier of a citizen (player) belonging to a nation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct CitizenId(pub Uuid);

impl CitizenId {
    /// Create a fresh random citizen identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for CitizenId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for CitizenId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}
