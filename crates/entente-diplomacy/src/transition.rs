//! Relation status transition rules.
//!
//! Rules are evaluated in order and the first match wins:
//!
//! 1. Re-entering the active non-neutral status is rejected.
//! 2. `Ceasefire` requires a current `War`.
//! 3. `Alliance` is rejected during `War`.
//! 4. `War` is rejected during `Alliance`.
//! 5. `Alliance` is rejected while either side sanctions the other.
//!
//! Moving to `Neutral` is always allowed.

use entente_types::RelationStatus;

use crate::error::TransitionError;

/// Decide whether `current -> requested` is a legal transition.
pub const fn validate_transition(
    current: RelationStatus,
    requested: RelationStatus,
    sanctioned_either_direction: bool,
) -> Result<(), TransitionError> {
    use RelationStatus::{Alliance, Ceasefire, Neutral, War};

    match (current, requested) {
        (_, Neutral) => Ok(()),
        (Alliance, Alliance) | (War, War) | (Ceasefire, Ceasefire) => {
            Err(TransitionError::AlreadyInState(requested))
        }
        (Neutral | Alliance, Ceasefire) => Err(TransitionError::CeasefireRequiresWar),
        (War, Alliance) => Err(TransitionError::MustEndWarFirst),
        (Alliance, War) => Err(TransitionError::MustBreakAllianceFirst),
        (_, Alliance) if sanctioned_either_direction => Err(TransitionError::SanctionsActive),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RelationStatus::{Alliance, Ceasefire, Neutral, War};

    /// Expected outcome for every `(current, requested, sanctioned)` cell.
    fn expected(
        current: RelationStatus,
        requested: RelationStatus,
        sanctioned: bool,
    ) -> Result<(), TransitionError> {
        match (current, requested, sanctioned) {
            (_, Neutral, _) => Ok(()),

            (Neutral, Alliance, false) => Ok(()),
            (Neutral, Alliance, true) => Err(TransitionError::SanctionsActive),
            (Neutral, War, _) => Ok(()),
            (Neutral, Ceasefire, _) => Err(TransitionError::CeasefireRequiresWar),

            (Alliance, Alliance, _) => Err(TransitionError::AlreadyInState(Alliance)),
            (Alliance, War, _) => Err(TransitionError::MustBreakAllianceFirst),
            (Alliance, Ceasefire, _) => Err(TransitionError::CeasefireRequiresWar),

            (War, Alliance, _) => Err(TransitionError::MustEndWarFirst),
            (War, War, _) => Err(TransitionError::AlreadyInState(War)),
            (War, Ceasefire, _) => Ok(()),

            (Ceasefire, Alliance, false) => Ok(()),
            (Ceasefire, Alliance, true) => Err(TransitionError::SanctionsActive),
            (Ceasefire, War, _) => Ok(()),
            (Ceasefire, Ceasefire, _) => Err(TransitionError::AlreadyInState(Ceasefire)),
        }
    }

    #[test]
    fn full_truth_table() {
        let mut cells = 0_u32;
        for current in RelationStatus::ALL {
            for requested in RelationStatus::ALL {
                for sanctioned in [false, true] {
                    assert_eq!(
                        validate_transition(current, requested, sanctioned),
                        expected(current, requested, sanctioned),
                        "{current} -> {requested} (sanctioned: {sanctioned})"
                    );
                    cells = cells.saturating_add(1);
                }
            }
        }
        assert_eq!(cells, 32);
    }

    #[test]
    fn neutral_to_neutral_is_allowed() {
        assert!(validate_transition(Neutral, Neutral, true).is_ok());
    }

    #[test]
    fn war_check_precedes_sanction_check() {
        assert_eq!(
            validate_transition(War, Alliance, true),
            Err(TransitionError::MustEndWarFirst)
        );
    }
}
