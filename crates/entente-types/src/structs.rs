//! Core records: relations, sanctions, and the nation entity.
//!
//! Field names are serialized in camelCase to match the JSON files the
//! game server has always written.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::RelationStatus;
use crate::expiry::Expiry;
use crate::ids::{CitizenId, NationId};

// ---------------------------------------------------------------------------
// Relation
// ---------------------------------------------------------------------------

/// The undirected diplomatic state between exactly two nations.
///
/// `nation_a` is always the lexicographically smaller identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Relation {
    /// Canonically first nation of the pair.
    pub nation_a: NationId,
    /// Canonically second nation of the pair.
    pub nation_b: NationId,
    /// Current status. Never `Neutral` for a stored record.
    pub status: RelationStatus,
    /// Epoch milliseconds when the status was entered.
    pub started_at: i64,
    /// When the status lapses back to neutral.
    #[ts(as = "i64")]
    pub expires_at: Expiry,
    /// Free-text origin of the record (`declareWar`, `bootstrap`, `legacy`...).
    pub reason: String,
}

impl Relation {
    /// Whether `id` is one of the two parties.
    pub fn involves(&self, id: &NationId) -> bool {
        self.nation_a == *id || self.nation_b == *id
    }

    /// The party opposite `id`, if `id` is a party at all.
    pub fn counterpart(&self, id: &NationId) -> Option<&NationId> {
        if self.nation_a == *id {
            Some(&self.nation_b)
        } else if self.nation_b == *id {
            Some(&self.nation_a)
        } else {
            None
        }
    }

    /// Whether the relation has lapsed at `now`.
    pub const fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_expired(now)
    }
}

// ---------------------------------------------------------------------------
// Sanction
// ---------------------------------------------------------------------------

/// A directed economic sanction from one nation against another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Sanction {
    /// The nation imposing the sanction.
    pub sanctioner_id: NationId,
    /// The nation being sanctioned.
    pub target_id: NationId,
    /// Epoch milliseconds when the sanction was imposed.
    pub started_at: i64,
    /// When the sanction lapses.
    #[ts(as = "i64")]
    pub expires_at: Expiry,
    /// Free-text origin of the record.
    pub reason: String,
}

impl Sanction {
    /// Whether `id` is either the sanctioner or the target.
    pub fn involves(&self, id: &NationId) -> bool {
        self.sanctioner_id == *id || self.target_id == *id
    }

    /// Whether the sanction has lapsed at `now`.
    pub const fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_expired(now)
    }
}

// ---------------------------------------------------------------------------
// Nation
// ---------------------------------------------------------------------------

/// A nation as held by the nation store.
///
/// The diplomacy engine does not own this record's lifecycle. It updates
/// the ally/enemy sets, treasury, history, pending alliance tokens and
/// reputation, and nothing else. Callers must not edit `allies` or
/// `enemies` directly: those sets are derived from the relation store and
/// are overwritten at the next reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Nation {
    /// Stable identifier.
    pub id: NationId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Treasury balance.
    #[serde(default)]
    #[ts(as = "String")]
    pub treasury: Decimal,
    /// Nations currently allied with this one.
    #[serde(default)]
    pub allies: BTreeSet<NationId>,
    /// Nations currently at war with this one.
    #[serde(default)]
    pub enemies: BTreeSet<NationId>,
    /// Citizens (players) of the nation.
    #[serde(default)]
    pub citizens: BTreeSet<CitizenId>,
    /// Pending alliance tokens, `out:<id>` for sent and `in:<id>` for received.
    #[serde(default)]
    pub pending_alliance: BTreeSet<String>,
    /// Reputation toward other nations, clamped to `[-100, 100]`.
    #[serde(default)]
    pub reputation: BTreeMap<NationId, i32>,
    /// Append-only chronicle of notable events.
    #[serde(default)]
    pub history: Vec<String>,
}

impl Nation {
    /// Create a nation with empty diplomatic state.
    pub fn new(id: impl Into<NationId>, name: impl Into<String>, treasury: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            treasury,
            allies: BTreeSet::new(),
            enemies: BTreeSet::new(),
            citizens: BTreeSet::new(),
            pending_alliance: BTreeSet::new(),
            reputation: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    /// Reputation toward `other`, zero when never set.
    pub fn reputation_toward(&self, other: &NationId) -> i32 {
        self.reputation.get(other).copied().unwrap_or(0)
    }
}
