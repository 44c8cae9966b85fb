//! The nation store seam.
//!
//! The diplomacy engine reads and writes nations through
//! [`NationRepository`] and never owns their lifecycle. Two
//! implementations are provided: [`JsonNationRepository`](crate::JsonNationRepository)
//! for the server and [`InMemoryNationRepository`] for tests and embedding.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use entente_types::{Nation, NationId};

use crate::error::StoreError;

/// Read and write access to nation records.
pub trait NationRepository: Send + Sync {
    /// Look up a nation by identifier.
    fn get(&self, id: &NationId) -> Option<Nation>;

    /// Every known nation, ordered by identifier.
    fn list(&self) -> Vec<Nation>;

    /// Insert or replace a nation.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the record could not be persisted. The
    /// in-memory view may already reflect the new record.
    fn save(&self, nation: &Nation) -> Result<(), StoreError>;

    /// Whether a nation with this identifier exists.
    fn exists(&self, id: &NationId) -> bool {
        self.get(id).is_some()
    }
}

/// A [`NationRepository`] held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryNationRepository {
    nations: RwLock<BTreeMap<NationId, Nation>>,
}

impl InMemoryNationRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository seeded with `nations`.
    pub fn with_nations(nations: impl IntoIterator<Item = Nation>) -> Self {
        let map = nations
            .into_iter()
            .map(|nation| (nation.id.clone(), nation))
            .collect();
        Self {
            nations: RwLock::new(map),
        }
    }

    /// Remove a nation, returning it if it existed.
    pub fn remove(&self, id: &NationId) -> Option<Nation> {
        self.nations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }
}

impl NationRepository for InMemoryNationRepository {
    fn get(&self, id: &NationId) -> Option<Nation> {
        self.nations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn list(&self) -> Vec<Nation> {
        self.nations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    fn save(&self, nation: &Nation) -> Result<(), StoreError> {
        self.nations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(nation.id.clone(), nation.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn save_then_get() {
        let repo = InMemoryNationRepository::new();
        let nation = Nation::new("gondor", "Gondor", Decimal::new(100, 0));
        repo.save(&nation).unwrap();

        assert_eq!(repo.get(&nation.id), Some(nation.clone()));
        assert!(repo.exists(&nation.id));
        assert_eq!(repo.list().len(), 1);
        assert_eq!(repo.remove(&nation.id), Some(nation));
        assert!(!repo.exists(&NationId::from("gondor")));
    }

    #[test]
    fn list_is_ordered_by_id() {
        let repo = InMemoryNationRepository::with_nations([
            Nation::new("b", "B", Decimal::ZERO),
            Nation::new("a", "A", Decimal::ZERO),
        ]);
        let ids: Vec<_> = repo.list().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![NationId::from("a"), NationId::from("b")]);
    }
}
