//! Locked diplomacy service for the Entente engine.
//!
//! [`DiplomacyService`] owns the relation and sanction stores behind a
//! single mutex, persists them through `entente-store`, keeps nation
//! ally and enemy sets in step with the relation store, and reports every
//! notable change to a [`DiplomacyObserver`]. [`DiplomacySystem`] layers
//! the player-facing rules (war cost, cooldown, alliance requests,
//! reputation) on top.
//!
//! # Modules
//!
//! - [`clock`] -- Injectable wall clock.
//! - [`config`] -- Configuration loading from `entente-config.yaml`.
//! - [`observer`] -- [`DiplomacyEvent`] and the observer seam.
//! - [`service`] -- [`DiplomacyService`], the locked core.
//! - [`reconcile`] -- Startup load, legacy import, and bootstrap.
//! - [`facade`] -- [`DiplomacySystem`], the player-facing operations.
//! - [`stats`] -- Read-only reports.
//! - [`sweeper`] -- Background expiration task.

pub mod clock;
pub mod config;
mod engine;
pub mod facade;
pub mod observer;
pub mod reconcile;
pub mod service;
pub mod stats;
pub mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, EntenteConfig};
pub use engine::SweepReport;
pub use facade::DiplomacySystem;
pub use observer::{DiplomacyEvent, DiplomacyObserver, NoOpObserver, RecordingObserver};
pub use reconcile::StartupReport;
pub use service::{CleanupReport, DiplomacyService, DiplomacySettings};
pub use stats::{
    GlobalSanctionStatistics, GlobalStatistics, NationCount, NationStatistics,
    SanctionStatistics, WarRecord,
};
pub use sweeper::spawn_sweeper;
