//! Relation and sanction state machine for the Entente diplomacy engine.
//!
//! This crate holds the pure, lock-free half of the engine: the in-memory
//! stores and the rules that decide whether a change is allowed. It never
//! touches disk or the nation store and never reads the wall clock; the
//! `entente-core` crate wraps it with locking, persistence, and effects.
//!
//! # Modules
//!
//! - [`pair`] -- Canonical keys for undirected relations and directed sanctions
//! - [`transition`] -- The status transition rules
//! - [`term`] -- Requested durations and expiry resolution
//! - [`relations`] -- The [`RelationStore`]
//! - [`sanctions`] -- The [`SanctionStore`]
//! - [`reputation`] -- Clamped reputation arithmetic
//! - [`pending`] -- Pending alliance request tokens
//! - [`error`] -- [`DiplomacyError`] and [`TransitionError`]

pub mod error;
pub mod pair;
pub mod pending;
pub mod relations;
pub mod reputation;
pub mod sanctions;
pub mod term;
pub mod transition;

pub use error::{DiplomacyError, TransitionError};
pub use pair::{PairKey, SanctionKey, validate_participants};
pub use relations::{NationLinks, RelationStore, TransitionOutcome, TransitionRequest};
pub use sanctions::SanctionStore;
pub use term::{
    DEFAULT_WAR_DURATION_MS, ExpiryPolicy, Term, resolve_expiry, resolve_sanction_expiry,
};
pub use transition::validate_transition;
