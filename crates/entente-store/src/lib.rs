//! JSON file persistence for the Entente diplomacy engine.
//!
//! Everything lives under one data directory:
//!
//! ```text
//! <data_dir>/
//!     diplomacy/relations.json   (DiplomacyFiles)
//!     diplomacy/sanctions.json   (DiplomacyFiles)
//!     diplomacy/legacy-import.json   (written once the legacy files are imported)
//!     nations/<id>.json          (JsonNationRepository)
//!     sanctions/, treaties/, ceasefires/   (legacy, read once)
//! ```
//!
//! # Modules
//!
//! - [`repository`] -- The [`NationRepository`] seam and an in-memory implementation
//! - [`nations`] -- One-file-per-nation repository
//! - [`records`] -- Relation and sanction array files
//! - [`legacy`] -- Readers for the older sanction and ceasefire layouts
//! - [`error`] -- Shared error types

pub mod error;
mod fs;
pub mod legacy;
pub mod nations;
pub mod records;
pub mod repository;

pub use error::StoreError;
pub use legacy::{LegacyCeasefire, LegacyData, LegacySanction};
pub use nations::JsonNationRepository;
pub use records::DiplomacyFiles;
pub use repository::{InMemoryNationRepository, NationRepository};
