//! Enumeration types for the Entente diplomacy engine.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Relation status
// ---------------------------------------------------------------------------

/// Undirected diplomatic state between two nations.
///
/// `Neutral` is never stored: the absence of a relation record means the
/// pair is neutral.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum RelationStatus {
    /// No special relation.
    #[default]
    Neutral,
    /// Permanent mutual alliance.
    Alliance,
    /// Open war.
    War,
    /// Time-bounded truce following a war.
    Ceasefire,
}

impl RelationStatus {
    /// All statuses, in declaration order.
    pub const ALL: [Self; 4] = [Self::Neutral, Self::Alliance, Self::War, Self::Ceasefire];

    /// The persisted name of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "NEUTRAL",
            Self::Alliance => "ALLIANCE",
            Self::War => "WAR",
            Self::Ceasefire => "CEASEFIRE",
        }
    }
}

impl core::fmt::Display for RelationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Reporting enums
// ---------------------------------------------------------------------------

/// How one nation regards another, as shown on diplomacy screens.
///
/// Store-backed statuses take precedence; otherwise the band is derived
/// from the enemy list and the reputation score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum DiplomaticStanding {
    /// Active war relation.
    War,
    /// Active ceasefire relation.
    Ceasefire,
    /// Active alliance relation.
    Alliance,
    /// Listed as an enemy without an active war.
    Enemy,
    /// Reputation of 50 or more.
    Friendly,
    /// Reputation from 0 to 49.
    Neutral,
    /// Reputation from -50 to -1.
    Tense,
    /// Reputation below -50.
    Hostile,
}

impl DiplomaticStanding {
    /// Band a reputation score when no stronger signal applies.
    pub const fn from_reputation(reputation: i32) -> Self {
        if reputation >= 50 {
            Self::Friendly
        } else if reputation >= 0 {
            Self::Neutral
        } else if reputation >= -50 {
            Self::Tense
        } else {
            Self::Hostile
        }
    }
}

/// Severity of the sanctions a nation is subject to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum SanctionSeverity {
    /// Nobody sanctions the nation.
    None,
    /// One or two sanctioning nations.
    Moderate,
    /// Three or four sanctioning nations.
    Strong,
    /// Five or more sanctioning nations.
    Critical,
}

impl SanctionSeverity {
    /// Rate the number of nations currently sanctioning a target.
    pub const fn from_count(sanctioning: usize) -> Self {
        match sanctioning {
            0 => Self::None,
            1 | 2 => Self::Moderate,
            3 | 4 => Self::Strong,
            _ => Self::Critical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_screaming_case_on_the_wire() {
        let json = serde_json::to_string(&RelationStatus::Ceasefire).unwrap_or_default();
        assert_eq!(json, "\"CEASEFIRE\"");
        let parsed: Result<RelationStatus, _> = serde_json::from_str("\"WAR\"");
        assert_eq!(parsed.ok(), Some(RelationStatus::War));
    }

    #[test]
    fn display_matches_wire_name() {
        for status in RelationStatus::ALL {
            let json = serde_json::to_string(&status).unwrap_or_default();
            assert_eq!(json, format!("\"{status}\""));
        }
    }

    #[test]
    fn reputation_bands() {
        assert_eq!(DiplomaticStanding::from_reputation(100), DiplomaticStanding::Friendly);
        assert_eq!(DiplomaticStanding::from_reputation(50), DiplomaticStanding::Friendly);
        assert_eq!(DiplomaticStanding::from_reputation(49), DiplomaticStanding::Neutral);
        assert_eq!(DiplomaticStanding::from_reputation(0), DiplomaticStanding::Neutral);
        assert_eq!(DiplomaticStanding::from_reputation(-1), DiplomaticStanding::Tense);
        assert_eq!(DiplomaticStanding::from_reputation(-50), DiplomaticStanding::Tense);
        assert_eq!(DiplomaticStanding::from_reputation(-51), DiplomaticStanding::Hostile);
    }

    #[test]
    fn sanction_severity_thresholds() {
        assert_eq!(SanctionSeverity::from_count(0), SanctionSeverity::None);
        assert_eq!(SanctionSeverity::from_count(1), SanctionSeverity::Moderate);
        assert_eq!(SanctionSeverity::from_count(3), SanctionSeverity::Strong);
        assert_eq!(SanctionSeverity::from_count(5), SanctionSeverity::Critical);
        assert_eq!(SanctionSeverity::from_count(12), SanctionSeverity::Critical);
    }
}
