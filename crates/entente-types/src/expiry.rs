//! Expiry timestamps with a permanent sentinel.
//!
//! On disk an expiry is a plain number of epoch milliseconds, with
//! [`PERMANENT_SENTINEL`] (`i64::MAX`) reserved for "never expires". Older
//! files also used zero or negative values for the same meaning, so every
//! non-positive value decodes as [`Expiry::Permanent`].

use serde::{Deserialize, Serialize};

/// Reserved persisted value meaning "never expires".
pub const PERMANENT_SENTINEL: i64 = i64::MAX;

/// When a relation or sanction stops being in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Expiry {
    /// Never expires on its own.
    Permanent,
    /// Expires at the given epoch milliseconds.
    At(i64),
}

impl Expiry {
    /// Decode a persisted millisecond value.
    pub const fn from_millis(millis: i64) -> Self {
        if millis <= 0 || millis == PERMANENT_SENTINEL {
            Self::Permanent
        } else {
            Self::At(millis)
        }
    }

    /// Encode as persisted milliseconds.
    pub const fn as_millis(self) -> i64 {
        match self {
            Self::Permanent => PERMANENT_SENTINEL,
            Self::At(millis) => millis,
        }
    }

    /// Whether this expiry is the permanent sentinel.
    pub const fn is_permanent(self) -> bool {
        matches!(self, Self::Permanent)
    }

    /// Whether the expiry has been reached at `now` (inclusive).
    pub const fn is_expired(self, now: i64) -> bool {
        match self {
            Self::Permanent => false,
            Self::At(millis) => millis <= now,
        }
    }

    /// Milliseconds left until expiry, `None` when permanent.
    pub const fn remaining_millis(self, now: i64) -> Option<i64> {
        match self {
            Self::Permanent => None,
            Self::At(millis) => Some(millis.saturating_sub(now)),
        }
    }
}

impl From<i64> for Expiry {
    fn from(millis: i64) -> Self {
        Self::from_millis(millis)
    }
}

impl From<Expiry> for i64 {
    fn from(expiry: Expiry) -> Self {
        expiry.as_millis()
    }
}
