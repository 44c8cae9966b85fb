//! Integration tests for the on-disk layout.
//!
//! Every test works in its own temporary directory.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::missing_const_for_fn
)]

use entente_store::{DiplomacyFiles, JsonNationRepository, NationRepository, StoreError};
use entente_types::{Expiry, Nation, NationId, Relation, RelationStatus, Sanction};
use rust_decimal::Decimal;

const NOW: i64 = 1_700_000_000_000;

#[test]
fn relations_and_sanctions_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let files = DiplomacyFiles::new(dir.path());

    let relations = vec![Relation {
        nation_a: NationId::from("a"),
        nation_b: NationId::from("b"),
        status: RelationStatus::War,
        started_at: NOW,
        expires_at: Expiry::At(NOW + 1),
        reason: String::from("declareWar"),
    }];
    let sanctions = vec![Sanction {
        sanctioner_id: NationId::from("b"),
        target_id: NationId::from("a"),
        started_at: NOW,
        expires_at: Expiry::Permanent,
        reason: String::from("imposeSanction"),
    }];

    files.save_relations(&relations).unwrap();
    files.save_sanctions(&sanctions).unwrap();

    assert_eq!(files.load_relations(0).unwrap(), relations);
    assert_eq!(files.load_sanctions(0).unwrap(), sanctions);
    assert!(files.relations_path().ends_with("diplomacy/relations.json"));
}

#[test]
fn written_files_use_camel_case_and_numeric_expiry() {
    let dir = tempfile::tempdir().unwrap();
    let files = DiplomacyFiles::new(dir.path());
    files
        .save_sanctions(&[Sanction {
            sanctioner_id: NationId::from("a"),
            target_id: NationId::from("b"),
            started_at: 5,
            expires_at: Expiry::Permanent,
            reason: String::new(),
        }])
        .unwrap();

    let text = std::fs::read_to_string(files.sanctions_path()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value[0]["sanctionerId"], "a");
    assert_eq!(value[0]["expiresAt"], i64::MAX);
}

#[test]
fn nation_repository_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let nations_dir = dir.path().join("nations");

    {
        let repo = JsonNationRepository::open(&nations_dir).unwrap();
        let mut nation = Nation::new("gondor", "Gondor", Decimal::new(12_500, 0));
        nation.enemies.insert(NationId::from("mordor"));
        repo.save(&nation).unwrap();
    }

    let repo = JsonNationRepository::open(&nations_dir).unwrap();
    let nation = repo.get(&NationId::from("gondor")).expect("nation reloaded");
    assert_eq!(nation.treasury, Decimal::new(12_500, 0));
    assert!(nation.enemies.contains(&NationId::from("mordor")));
    assert!(nations_dir.join("gondor.json").is_file());
}

#[test]
fn nation_repository_skips_corrupt_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.json"), "[").unwrap();
    std::fs::write(dir.path().join("ok.json"), r#"{"id":"ok","name":"Ok"}"#).unwrap();

    let repo = JsonNationRepository::open(dir.path()).unwrap();
    assert_eq!(repo.list().len(), 1);
    assert_eq!(repo.get(&NationId::from("ok")).map(|n| n.treasury), Some(Decimal::ZERO));
}

#[test]
fn nation_ids_must_be_safe_file_names() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonNationRepository::open(dir.path()).unwrap();
    let result = repo.save(&Nation::new("../escape", "Escape", Decimal::ZERO));
    assert!(matches!(result, Err(StoreError::InvalidNationId(_))));
}
