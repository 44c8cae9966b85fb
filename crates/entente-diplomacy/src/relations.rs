//! In-memory relation store.
//!
//! Holds at most one [`Relation`] per unordered pair. The store is pure
//! state: it never touches disk or the nation store, and every time-based
//! query takes `now` explicitly. Expired records stay in the map until a
//! caller evicts them ([`RelationStore::take_if_expired`] on read,
//! [`RelationStore::drain_expired`] from the sweeper), so that the caller
//! can run the expiry side effects exactly once.

use std::collections::{BTreeMap, BTreeSet};

use entente_types::{NationId, Relation, RelationStatus};

use crate::error::DiplomacyError;
use crate::pair::PairKey;
use crate::term::{ExpiryPolicy, Term, resolve_expiry};
use crate::transition::validate_transition;

// ---------------------------------------------------------------------------
// Transition request / outcome
// ---------------------------------------------------------------------------

/// A requested status change for a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest<'a> {
    /// One party.
    pub a: &'a NationId,
    /// The other party.
    pub b: &'a NationId,
    /// Status to enter.
    pub status: RelationStatus,
    /// Requested duration.
    pub term: Term,
    /// Free-text origin stored on the record.
    pub reason: &'a str,
}

/// Result of an applied transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    /// Status before the change.
    pub previous: RelationStatus,
    /// The stored record, or `None` when the pair became neutral.
    pub relation: Option<Relation>,
}

/// Ally and enemy sets implied by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NationLinks {
    /// Nation -> nations it is allied with.
    pub allies: BTreeMap<NationId, BTreeSet<NationId>>,
    /// Nation -> nations it is at war with.
    pub enemies: BTreeMap<NationId, BTreeSet<NationId>>,
}

impl NationLinks {
    /// Allies of `id` according to the store.
    pub fn allies_of(&self, id: &NationId) -> BTreeSet<NationId> {
        self.allies.get(id).cloned().unwrap_or_default()
    }

    /// Enemies of `id` according to the store.
    pub fn enemies_of(&self, id: &NationId) -> BTreeSet<NationId> {
        self.enemies.get(id).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// RelationStore
// ---------------------------------------------------------------------------

/// Canonical pair -> current relation.
#[derive(Debug, Clone, Default)]
pub struct RelationStore {
    relations: BTreeMap<PairKey, Relation>,
}

impl RelationStore {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            relations: BTreeMap::new(),
        }
    }

    /// Number of stored records, expired ones included.
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Iterate over every stored record, expired ones included.
    pub fn iter(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }

    /// The raw record for a pair, without expiry filtering.
    pub fn get(&self, a: &NationId, b: &NationId) -> Option<&Relation> {
        self.relations.get(&PairKey::new(a, b))
    }

    /// Status of a pair at `now`. Absent or expired records read as neutral.
    pub fn status_at(&self, a: &NationId, b: &NationId, now: i64) -> RelationStatus {
        self.get(a, b)
            .filter(|rel| !rel.is_expired(now))
            .map_or(RelationStatus::Neutral, |rel| rel.status)
    }

    /// Remove and return the pair's record if it has expired at `now`.
    pub fn take_if_expired(&mut self, a: &NationId, b: &NationId, now: i64) -> Option<Relation> {
        let key = PairKey::new(a, b);
        if self.relations.get(&key).is_some_and(|rel| rel.is_expired(now)) {
            return self.relations.remove(&key);
        }
        None
    }

    /// Store a record under its canonical key, normalizing the party order.
    ///
    /// Neutral records are not stored; inserting one removes the pair.
    /// Returns the record previously held for the pair.
    pub fn insert(&mut self, mut relation: Relation) -> Option<Relation> {
        let key = PairKey::of(&relation);
        if relation.status == RelationStatus::Neutral {
            return self.relations.remove(&key);
        }
        relation.nation_a = key.first().clone();
        relation.nation_b = key.second().clone();
        self.relations.insert(key, relation)
    }

    /// Remove the pair's record.
    pub fn remove(&mut self, a: &NationId, b: &NationId) -> Option<Relation> {
        self.relations.remove(&PairKey::new(a, b))
    }

    /// Validate and apply a status change.
    ///
    /// The caller must already have evicted an expired record for the pair
    /// (so its side effects run) and checked that both parties exist.
    pub fn transition(
        &mut self,
        request: &TransitionRequest<'_>,
        sanctioned_either_direction: bool,
        now: i64,
        policy: &ExpiryPolicy,
    ) -> Result<TransitionOutcome, DiplomacyError> {
        let previous = self.status_at(request.a, request.b, now);
        validate_transition(previous, request.status, sanctioned_either_direction)?;

        if request.status == RelationStatus::Neutral {
            self.remove(request.a, request.b);
            return Ok(TransitionOutcome {
                previous,
                relation: None,
            });
        }

        let expires_at = resolve_expiry(request.status, request.term, now, policy);
        if request.status == RelationStatus::Ceasefire && expires_at.is_expired(now) {
            return Err(DiplomacyError::InvalidCeasefireDuration);
        }

        let key = PairKey::new(request.a, request.b);
        let relation = Relation {
            nation_a: key.first().clone(),
            nation_b: key.second().clone(),
            status: request.status,
            started_at: now,
            expires_at,
            reason: request.reason.to_owned(),
        };
        self.relations.insert(key, relation.clone());

        Ok(TransitionOutcome {
            previous,
            relation: Some(relation),
        })
    }

    /// Every unexpired relation touching `id`.
    pub fn relations_for(&self, id: &NationId, now: i64) -> Vec<Relation> {
        self.relations
            .values()
            .filter(|rel| rel.involves(id) && !rel.is_expired(now))
            .cloned()
            .collect()
    }

    /// Number of unexpired relations with the given status.
    pub fn count_by_status(&self, status: RelationStatus, now: i64) -> usize {
        self.relations
            .values()
            .filter(|rel| rel.status == status && !rel.is_expired(now))
            .count()
    }

    /// Number of unexpired relations of `id` with the given status.
    pub fn count_for(&self, id: &NationId, status: RelationStatus, now: i64) -> usize {
        self.relations
            .values()
            .filter(|rel| rel.status == status && rel.involves(id) && !rel.is_expired(now))
            .count()
    }

    /// Whether `id` is in an unexpired war with anyone.
    pub fn has_active_war_with_anyone(&self, id: &NationId, now: i64) -> bool {
        self.relations
            .values()
            .any(|rel| rel.status == RelationStatus::War && rel.involves(id) && !rel.is_expired(now))
    }

    /// Remove and return every record expired at `now`.
    pub fn drain_expired(&mut self, now: i64) -> Vec<Relation> {
        let expired: Vec<PairKey> = self
            .relations
            .iter()
            .filter(|(_, rel)| rel.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        expired
            .iter()
            .filter_map(|key| self.relations.remove(key))
            .collect()
    }

    /// Remove and return every record touching `id`.
    pub fn remove_involving(&mut self, id: &NationId) -> Vec<Relation> {
        let keys: Vec<PairKey> = self
            .relations
            .iter()
            .filter(|(_, rel)| rel.involves(id))
            .map(|(key, _)| key.clone())
            .collect();

        keys.iter()
            .filter_map(|key| self.relations.remove(key))
            .collect()
    }

    /// Ally and enemy sets implied by the unexpired records.
    pub fn links(&self, now: i64) -> NationLinks {
        let mut links = NationLinks::default();
        for rel in self.relations.values() {
            if rel.is_expired(now) {
                continue;
            }
            let target = match rel.status {
                RelationStatus::Alliance => &mut links.allies,
                RelationStatus::War => &mut links.enemies,
                RelationStatus::Neutral | RelationStatus::Ceasefire => continue,
            };
            target
                .entry(rel.nation_a.clone())
                .or_default()
                .insert(rel.nation_b.clone());
            target
                .entry(rel.nation_b.clone())
                .or_default()
                .insert(rel.nation_a.clone());
        }
        links
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
