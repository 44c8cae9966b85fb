//! In-memory sanction store.
//!
//! Sanctions are directed: `A -> B` and `B -> A` are separate records.
//! As with relations, expired entries linger until evicted so the caller
//! can decide when to persist the removal.

use std::collections::BTreeMap;

use entente_types::{NationId, Sanction};

use crate::error::DiplomacyError;
use crate::pair::SanctionKey;
use crate::term::{Term, resolve_sanction_expiry};

/// Ordered pair -> sanction.
#[derive(Debug, Clone, Default)]
pub struct SanctionStore {
    sanctions: BTreeMap<SanctionKey, Sanction>,
}

impl SanctionStore {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            sanctions: BTreeMap::new(),
        }
    }

    /// Number of stored records, expired ones included.
    pub fn len(&self) -> usize {
        self.sanctions.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.sanctions.is_empty()
    }

    /// Iterate over every stored record, expired ones included.
    pub fn iter(&self) -> impl Iterator<Item = &Sanction> {
        self.sanctions.values()
    }

    /// The raw record for `sanctioner -> target`.
    pub fn get(&self, sanctioner: &NationId, target: &NationId) -> Option<&Sanction> {
        self.sanctions.get(&SanctionKey::new(sanctioner, target))
    }

    /// Whether a record exists for the ordered pair, expired or not.
    pub fn contains(&self, sanctioner: &NationId, target: &NationId) -> bool {
        self.sanctions
            .contains_key(&SanctionKey::new(sanctioner, target))
    }

    /// Store a record, replacing any previous one for the ordered pair.
    pub fn insert(&mut self, sanction: Sanction) -> Option<Sanction> {
        self.sanctions.insert(SanctionKey::of(&sanction), sanction)
    }

    /// Impose a new sanction.
    ///
    /// `allied` is whether the pair is currently in an alliance; the caller
    /// reads it from the relation store. An expired record for the pair is
    /// replaced.
    pub fn impose(
        &mut self,
        sanctioner: &NationId,
        target: &NationId,
        term: Term,
        reason: &str,
        allied: bool,
        now: i64,
    ) -> Result<Sanction, DiplomacyError> {
        if sanctioner == target {
            return Err(DiplomacyError::SelfSanction);
        }
        if self.is_sanctioned(sanctioner, target, now) {
            return Err(DiplomacyError::SanctionAlreadyActive(target.clone()));
        }
        if allied {
            return Err(DiplomacyError::SanctionAgainstAlly);
        }

        let sanction = Sanction {
            sanctioner_id: sanctioner.clone(),
            target_id: target.clone(),
            started_at: now,
            expires_at: resolve_sanction_expiry(term, now),
            reason: reason.to_owned(),
        };
        self.insert(sanction.clone());
        Ok(sanction)
    }

    /// Lift the sanction `sanctioner -> target`.
    pub fn lift(
        &mut self,
        sanctioner: &NationId,
        target: &NationId,
    ) -> Result<Sanction, DiplomacyError> {
        self.sanctions
            .remove(&SanctionKey::new(sanctioner, target))
            .ok_or_else(|| DiplomacyError::NoSanction(target.clone()))
    }

    /// Whether an unexpired sanction `sanctioner -> target` exists.
    pub fn is_sanctioned(&self, sanctioner: &NationId, target: &NationId, now: i64) -> bool {
        self.get(sanctioner, target)
            .is_some_and(|s| !s.is_expired(now))
    }

    /// Whether either side sanctions the other.
    pub fn sanctioned_either_direction(&self, a: &NationId, b: &NationId, now: i64) -> bool {
        self.is_sanctioned(a, b, now) || self.is_sanctioned(b, a, now)
    }

    /// Whether both sides sanction each other.
    pub fn has_mutual(&self, a: &NationId, b: &NationId, now: i64) -> bool {
        self.is_sanctioned(a, b, now) && self.is_sanctioned(b, a, now)
    }

    /// Remove and return the record if it has expired at `now`.
    pub fn take_if_expired(
        &mut self,
        sanctioner: &NationId,
        target: &NationId,
        now: i64,
    ) -> Option<Sanction> {
        let key = SanctionKey::new(sanctioner, target);
        if self.sanctions.get(&key).is_some_and(|s| s.is_expired(now)) {
            return self.sanctions.remove(&key);
        }
        None
    }

    /// Unexpired sanctions imposed by `id`.
    pub fn imposed_by(&self, id: &NationId, now: i64) -> Vec<Sanction> {
        self.sanctions
            .values()
            .filter(|s| s.sanctioner_id == *id && !s.is_expired(now))
            .cloned()
            .collect()
    }

    /// Nations with an unexpired sanction against `id`.
    pub fn sanctioning(&self, id: &NationId, now: i64) -> Vec<NationId> {
        self.sanctions
            .values()
            .filter(|s| s.target_id == *id && !s.is_expired(now))
            .map(|s| s.sanctioner_id.clone())
            .collect()
    }

    /// Every unexpired sanction.
    pub fn active(&self, now: i64) -> Vec<Sanction> {
        self.sanctions
            .values()
            .filter(|s| !s.is_expired(now))
            .cloned()
            .collect()
    }

    /// Remove and return every record expired at `now`.
    pub fn drain_expired(&mut self, now: i64) -> Vec<Sanction> {
        let expired: Vec<SanctionKey> = self
            .sanctions
            .iter()
            .filter(|(_, s)| s.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        expired
            .iter()
            .filter_map(|key| self.sanctions.remove(key))
            .collect()
    }

    /// Remove and return every record touching `id`.
    pub fn remove_involving(&mut self, id: &NationId) -> Vec<Sanction> {
        let keys: Vec<SanctionKey> = self
            .sanctions
            .keys()
            .filter(|key| key.sanctioner == *id || key.target == *id)
            .cloned()
            .collect();

        keys.iter()
            .filter_map(|key| self.sanctions.remove(key))
            .collect()
    }
}
