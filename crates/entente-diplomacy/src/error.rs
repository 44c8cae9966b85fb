//! Error types for diplomacy operations.
//!
//! Every rejection is a value, never a panic. The `Display` text of each
//! variant is the reason shown to the player, so callers can surface
//! `err.to_string()` directly.

use rust_decimal::Decimal;

use entente_types::{NationId, RelationStatus};

/// Rejections produced by the transition validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The requested non-neutral status is already active.
    #[error("relation is already {0}")]
    AlreadyInState(RelationStatus),

    /// A ceasefire can only follow a war.
    #[error("a ceasefire is only possible during a war")]
    CeasefireRequiresWar,

    /// An alliance cannot be formed while at war.
    #[error("cannot form an alliance during a war -- end the war first")]
    MustEndWarFirst,

    /// A war cannot be declared on an ally.
    #[error("cannot declare war on an ally -- break the alliance first")]
    MustBreakAllianceFirst,

    /// An alliance cannot be formed while either side sanctions the other.
    #[error("cannot form an alliance while sanctions are active")]
    SanctionsActive,
}

/// Errors that can occur during diplomacy operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiplomacyError {
    /// Blank identifiers, or a nation paired with itself.
    #[error("invalid parties to the agreement")]
    InvalidParties,

    /// A referenced nation does not exist in the nation store.
    #[error("nation not found: {0}")]
    NationNotFound(NationId),

    /// The status change is not a legal transition.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// A ceasefire was requested with an expiry that is not in the future.
    #[error("invalid ceasefire duration")]
    InvalidCeasefireDuration,

    /// A nation tried to sanction itself.
    #[error("a nation cannot sanction itself")]
    SelfSanction,

    /// A nation tried to sanction an ally.
    #[error("cannot impose sanctions on an ally")]
    SanctionAgainstAlly,

    /// An unexpired sanction already exists for this ordered pair.
    #[error("sanctions are already in force against {0}")]
    SanctionAlreadyActive(NationId),

    /// There is no sanction to lift.
    #[error("no sanctions in force against {0}")]
    NoSanction(NationId),

    /// A cost was negative.
    #[error("invalid cost: {0}")]
    InvalidCost(Decimal),

    /// The treasury cannot cover the cost of the action.
    #[error("insufficient funds: {required} required, {available} available")]
    InsufficientFunds {
        /// Cost of the action.
        required: Decimal,
        /// Current treasury balance.
        available: Decimal,
    },

    /// The nation declared a war too recently.
    #[error("nation is on war cooldown for another {remaining_minutes} minutes")]
    WarCooldown {
        /// Whole minutes until another war may be declared.
        remaining_minutes: i64,
    },

    /// The pair is in a ceasefire, which blocks alliance requests.
    #[error("cannot form an alliance during a ceasefire")]
    CeasefireActive,

    /// An identical alliance request is already waiting for an answer.
    #[error("an alliance request to {0} is already pending")]
    RequestAlreadyPending(NationId),

    /// No incoming alliance request from the given nation.
    #[error("no alliance request from {0}")]
    NoPendingRequest(NationId),

    /// The nations are not allied.
    #[error("{0} and {1} are not allied")]
    NotAllied(NationId, NationId),
}
