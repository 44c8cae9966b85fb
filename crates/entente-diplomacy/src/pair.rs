//! Storage keys for pairwise records.
//!
//! Relations are undirected, so their key orders the two identifiers and
//! `(a, b)` and `(b, a)` land on the same entry. Sanctions are directed and
//! keep the literal order.

use entente_types::{NationId, Relation, Sanction};

use crate::error::DiplomacyError;

/// Canonical key for an undirected relation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey {
    first: NationId,
    second: NationId,
}

impl PairKey {
    /// Build the key for `a` and `b` in either order.
    pub fn new(a: &NationId, b: &NationId) -> Self {
        if a <= b {
            Self {
                first: a.clone(),
                second: b.clone(),
            }
        } else {
            Self {
                first: b.clone(),
                second: a.clone(),
            }
        }
    }

    /// The key a stored relation lives under.
    pub fn of(relation: &Relation) -> Self {
        Self::new(&relation.nation_a, &relation.nation_b)
    }

    /// The lexicographically smaller identifier.
    pub const fn first(&self) -> &NationId {
        &self.first
    }

    /// The lexicographically larger identifier.
    pub const fn second(&self) -> &NationId {
        &self.second
    }
}

/// Key for a directed sanction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SanctionKey {
    /// The nation imposing the sanction.
    pub sanctioner: NationId,
    /// The nation being sanctioned.
    pub target: NationId,
}

impl SanctionKey {
    /// Build the key for `sanctioner -> target`.
    pub fn new(sanctioner: &NationId, target: &NationId) -> Self {
        Self {
            sanctioner: sanctioner.clone(),
            target: target.clone(),
        }
    }

    /// The key a stored sanction lives under.
    pub fn of(sanction: &Sanction) -> Self {
        Self::new(&sanction.sanctioner_id, &sanction.target_id)
    }
}

/// Reject blank identifiers and self-pairs.
///
/// Existence in the nation store is checked separately by the caller,
/// which owns the repository handle.
pub fn validate_participants(a: &NationId, b: &NationId) -> Result<(), DiplomacyError> {
    if a.is_blank() || b.is_blank() || a == b {
        return Err(DiplomacyError::InvalidParties);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_key_is_order_independent() {
        let a = NationId::from("alpha");
        let b = NationId::from("beta");
        assert_eq!(PairKey::new(&a, &b), PairKey::new(&b, &a));
        assert_eq!(PairKey::new(&b, &a).first(), &a);
        assert_eq!(PairKey::new(&b, &a).second(), &b);
    }

    #[test]
    fn sanction_key_keeps_direction() {
        let a = NationId::from("alpha");
        let b = NationId::from("beta");
        assert_ne!(SanctionKey::new(&a, &b), SanctionKey::new(&b, &a));
    }

    #[test]
    fn participants_must_be_distinct_and_non_blank() {
        let a = NationId::from("a");
        assert_eq!(
            validate_participants(&a, &a),
            Err(DiplomacyError::InvalidParties)
        );
        assert_eq!(
            validate_participants(&a, &NationId::from(" ")),
            Err(DiplomacyError::InvalidParties)
        );
        assert!(validate_participants(&a, &NationId::from("b")).is_ok());
    }
}
