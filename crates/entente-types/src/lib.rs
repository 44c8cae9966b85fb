//! Shared type definitions for the Entente diplomacy engine.
//!
//! This crate is the single source of truth for the records exchanged
//! between the engine, its persistence layer, and reporting consumers.
//! Types flow downstream to `TypeScript` via `ts-rs` for admin dashboards.
//!
//! # Modules
//!
//! - [`ids`] -- Nation and citizen identifier newtypes
//! - [`enums`] -- Relation status and reporting enumerations
//! - [`expiry`] -- Expiry timestamps with the permanent sentinel
//! - [`structs`] -- Relation, sanction, and nation records

pub mod enums;
pub mod expiry;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{DiplomaticStanding, RelationStatus, SanctionSeverity};
pub use expiry::{Expiry, PERMANENT_SENTINEL};
pub use ids::{CitizenId, NationId};
pub use structs::{Nation, Relation, Sanction};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs writes the bindings into `bindings/` relative to the crate
        // root when `export_all` is called.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::NationId::export_all();
        let _ = crate::ids::CitizenId::export_all();

        // Enums
        let _ = crate::enums::RelationStatus::export_all();
        let _ = crate::enums::DiplomaticStanding::export_all();
        let _ = crate::enums::SanctionSeverity::export_all();

        // Structs
        let _ = crate::structs::Relation::export_all();
        let _ = crate::structs::Sanction::export_all();
        let _ = crate::structs::Nation::export_all();
    }
}
