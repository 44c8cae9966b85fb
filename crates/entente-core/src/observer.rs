//! Side-effect notifications.
//!
//! Every state change that players should hear about produces a
//! [`DiplomacyEvent`]. Events are buffered while the engine lock is held
//! and handed to the injected [`DiplomacyObserver`] after it is released,
//! so an observer may call back into the service without deadlocking.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use entente_types::{Expiry, NationId};

/// A notable diplomatic event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiplomacyEvent {
    /// A war was declared.
    #[serde(rename_all = "camelCase")]
    WarDeclared {
        /// The declaring nation.
        attacker: NationId,
        /// The nation war was declared on.
        defender: NationId,
        /// When the war lapses.
        expires_at: Expiry,
    },
    /// A war expired on its own.
    #[serde(rename_all = "camelCase")]
    WarEnded {
        /// One party.
        nation_a: NationId,
        /// The other party.
        nation_b: NationId,
    },
    /// An alliance was proposed.
    AllianceRequested {
        /// The proposing nation.
        from: NationId,
        /// The nation asked.
        to: NationId,
    },
    /// An alliance request was accepted.
    #[serde(rename_all = "camelCase")]
    AllianceFormed {
        /// The accepting nation.
        nation_a: NationId,
        /// The requesting nation.
        nation_b: NationId,
    },
    /// An alliance request was turned down.
    AllianceDenied {
        /// The requesting nation.
        from: NationId,
        /// The nation that refused.
        to: NationId,
    },
    /// An alliance was dissolved.
    AllianceBroken {
        /// The nation that broke the alliance.
        initiator: NationId,
        /// The former ally.
        partner: NationId,
    },
    /// Two nations returned to neutral terms.
    #[serde(rename_all = "camelCase")]
    PeaceDeclared {
        /// One party.
        nation_a: NationId,
        /// The other party.
        nation_b: NationId,
    },
    /// A sanction was imposed.
    SanctionImposed {
        /// The imposing nation.
        sanctioner: NationId,
        /// The sanctioned nation.
        target: NationId,
    },
    /// A sanction was lifted.
    SanctionLifted {
        /// The nation that had imposed it.
        sanctioner: NationId,
        /// The formerly sanctioned nation.
        target: NationId,
    },
    /// A nation's reputation toward another moved noticeably.
    ReputationChanged {
        /// The nation whose opinion changed.
        from: NationId,
        /// The nation the opinion is about.
        toward: NationId,
        /// Previous value.
        old: i32,
        /// New value.
        new: i32,
    },
}

impl DiplomacyEvent {
    /// Nations that should be told about the event.
    pub fn audience(&self) -> [&NationId; 2] {
        match self {
            Self::WarDeclared {
                attacker: a,
                defender: b,
                ..
            }
            | Self::WarEnded {
                nation_a: a,
                nation_b: b,
            }
            | Self::AllianceRequested { from: a, to: b }
            | Self::AllianceFormed {
                nation_a: a,
                nation_b: b,
            }
            | Self::AllianceDenied { from: a, to: b }
            | Self::AllianceBroken {
                initiator: a,
                partner: b,
            }
            | Self::PeaceDeclared {
                nation_a: a,
                nation_b: b,
            }
            | Self::SanctionImposed {
                sanctioner: a,
                target: b,
            }
            | Self::SanctionLifted {
                sanctioner: a,
                target: b,
            }
            | Self::ReputationChanged {
                from: a, toward: b, ..
            } => [a, b],
        }
    }
}

impl core::fmt::Display for DiplomacyEvent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::WarDeclared {
                attacker, defender, ..
            } => write!(f, "{attacker} declared war on {defender}"),
            Self::WarEnded { nation_a, nation_b } => {
                write!(f, "the war between {nation_a} and {nation_b} has ended")
            }
            Self::AllianceRequested { from, to } => {
                write!(f, "{from} proposed an alliance to {to}")
            }
            Self::AllianceFormed { nation_a, nation_b } => {
                write!(f, "{nation_a} and {nation_b} formed an alliance")
            }
            Self::AllianceDenied { from, to } => {
                write!(f, "{to} declined the alliance proposed by {from}")
            }
            Self::AllianceBroken { initiator, partner } => {
                write!(f, "{initiator} broke its alliance with {partner}")
            }
            Self::PeaceDeclared { nation_a, nation_b } => {
                write!(f, "{nation_a} and {nation_b} made peace")
            }
            Self::SanctionImposed { sanctioner, target } => {
                write!(f, "{sanctioner} imposed sanctions on {target}")
            }
            Self::SanctionLifted { sanctioner, target } => {
                write!(f, "{sanctioner} lifted sanctions on {target}")
            }
            Self::ReputationChanged {
                from,
                toward,
                old,
                new,
            } => write!(f, "{from}'s reputation toward {toward}: {old} -> {new}"),
        }
    }
}

/// Receives events after the engine lock has been released.
pub trait DiplomacyObserver: Send + Sync {
    /// Handle one event. Must not block for long.
    fn on_event(&self, event: &DiplomacyEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl DiplomacyObserver for NoOpObserver {
    fn on_event(&self, _event: &DiplomacyEvent) {}
}

/// Keeps every event in memory, in delivery order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<DiplomacyEvent>>,
}

impl RecordingObserver {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<DiplomacyEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of events recorded and not yet taken.
    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been recorded since the last [`take`](Self::take).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiplomacyObserver for RecordingObserver {
    fn on_event(&self, event: &DiplomacyEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = DiplomacyEvent::WarEnded {
            nation_a: NationId::from("a"),
            nation_b: NationId::from("b"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "WAR_ENDED");
        assert_eq!(json["nationA"], "a");
    }

    #[test]
    fn display_reads_as_a_sentence() {
        let event = DiplomacyEvent::SanctionImposed {
            sanctioner: NationId::from("gondor"),
            target: NationId::from("mordor"),
        };
        assert_eq!(event.to_string(), "gondor imposed sanctions on mordor");
        let [_, target] = event.audience();
        assert_eq!(target.as_str(), "mordor");
    }

    #[test]
    fn recorder_keeps_order() {
        let recorder = RecordingObserver::new();
        let first = DiplomacyEvent::AllianceRequested {
            from: NationId::from("a"),
            to: NationId::from("b"),
        };
        let second = DiplomacyEvent::AllianceDenied {
            from: NationId::from("a"),
            to: NationId::from("b"),
        };
        recorder.on_event(&first);
        recorder.on_event(&second);
        assert_eq!(recorder.take(), vec![first, second]);
        assert!(recorder.is_empty());
    }
}
