//! Duration requests and expiry resolution.
//!
//! All expiry arithmetic goes through [`resolve_expiry`], which uses a
//! checked add and saturates to [`Expiry::Permanent`] on overflow.

use chrono::TimeDelta;

use entente_types::{Expiry, RelationStatus};

/// Default length of a war when no duration is given, in milliseconds.
pub const DEFAULT_WAR_DURATION_MS: i64 = 24 * 60 * 60 * 1000;

/// How long a relation or sanction should last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    /// Use the default for the status (default war length, else permanent).
    Default,
    /// Never expire.
    Permanent,
    /// Expire after the given duration. Non-positive durations behave
    /// like [`Term::Default`].
    For(TimeDelta),
}

/// Expiry defaults for relations whose term is not explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    /// Length of a war with no explicit duration.
    pub war_default: TimeDelta,
    /// When set, wars with no explicit duration are permanent.
    pub permanent_wars: bool,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            war_default: TimeDelta::milliseconds(DEFAULT_WAR_DURATION_MS),
            permanent_wars: false,
        }
    }
}

/// Compute when a record entering `status` at `now` should expire.
pub fn resolve_expiry(
    status: RelationStatus,
    term: Term,
    now: i64,
    policy: &ExpiryPolicy,
) -> Expiry {
    let duration = match term {
        Term::Permanent => return Expiry::Permanent,
        Term::For(duration) if duration > TimeDelta::zero() => duration,
        Term::For(_) | Term::Default => {
            if status != RelationStatus::War || policy.permanent_wars {
                return Expiry::Permanent;
            }
            policy.war_default
        }
    };

    expiry_after(now, duration)
}

/// Compute when a sanction imposed at `now` should expire.
///
/// Sanctions are permanent unless a positive duration is given.
pub fn resolve_sanction_expiry(term: Term, now: i64) -> Expiry {
    match term {
        Term::For(duration) if duration > TimeDelta::zero() => expiry_after(now, duration),
        Term::For(_) | Term::Default | Term::Permanent => Expiry::Permanent,
    }
}

fn expiry_after(now: i64, duration: TimeDelta) -> Expiry {
    now.checked_add(duration.num_milliseconds())
        .map_or(Expiry::Permanent, Expiry::from_millis)
}
