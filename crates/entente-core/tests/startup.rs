//! Integration tests for persistence and startup reconciliation.
//!
//! Every test works in its own temporary data directory and restarts the
//! service by building a fresh one over the same files.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::missing_const_for_fn
)]

use std::path::Path;
use std::sync::Arc;

use chrono::TimeDelta;
use rust_decimal::Decimal;
use serde_json::json;

use entente_core::{
    Clock, DiplomacyEvent, DiplomacyObserver, DiplomacyService, DiplomacySettings,
    DiplomacySystem, EntenteConfig, ManualClock, RecordingObserver,
};
use entente_diplomacy::Term;
use entente_store::{
    DiplomacyFiles, InMemoryNationRepository, JsonNationRepository, NationRepository,
};
use entente_types::{Expiry, Nation, NationId, RelationStatus};

const START: i64 = 1_700_000_000_000;
const HOUR_MS: i64 = 3_600_000;

fn id(s: &str) -> NationId {
    NationId::from(s)
}

fn nation(s: &str) -> Nation {
    Nation::new(s, s.to_uppercase(), Decimal::new(10_000, 0))
}

fn service_over(
    nations: Arc<dyn NationRepository>,
    data_dir: &Path,
    now: i64,
) -> Arc<DiplomacyService> {
    Arc::new(
        DiplomacyService::new(
            nations,
            Arc::new(ManualClock::new(now)) as Arc<dyn Clock>,
            DiplomacySettings::default(),
        )
        .with_files(DiplomacyFiles::new(data_dir)),
    )
}

fn watched_service_over(
    nations: Arc<dyn NationRepository>,
    data_dir: &Path,
    now: i64,
) -> (Arc<DiplomacyService>, Arc<RecordingObserver>) {
    let events = Arc::new(RecordingObserver::new());
    let service = DiplomacyService::new(
        nations,
        Arc::new(ManualClock::new(now)) as Arc<dyn Clock>,
        DiplomacySettings::default(),
    )
    .with_files(DiplomacyFiles::new(data_dir))
    .with_observer(Arc::clone(&events) as Arc<dyn DiplomacyObserver>);
    (Arc::new(service), events)
}

fn write(path: &Path, value: &serde_json::Value) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

#[test]
fn state_survives_a_restart_without_lapsed_records() {
    let dir = tempfile::tempdir().unwrap();
    let nations_dir = dir.path().join("nations");
    {
        let repo = JsonNationRepository::open(&nations_dir).unwrap();
        for n in ["a", "b", "c"] {
            repo.save(&nation(n)).unwrap();
        }
        let service = service_over(Arc::new(repo), dir.path(), START);
        service.startup();

        let system = DiplomacySystem::new(Arc::clone(&service));
        system.declare_war(&id("a"), &id("b")).unwrap();
        service
            .set_status(&id("a"), &id("c"), RelationStatus::Alliance, Term::Permanent, "pact")
            .unwrap();
        service
            .impose_sanction(&id("c"), &id("b"), Term::For(TimeDelta::hours(1)), "embargo")
            .unwrap();
    }

    let repo = JsonNationRepository::open(&nations_dir).unwrap();
    assert!(repo.get(&id("b")).unwrap().enemies.contains(&id("a")));
    assert_eq!(repo.get(&id("a")).unwrap().treasury, Decimal::new(5_000, 0));

    let service = service_over(Arc::new(repo), dir.path(), START + 2 * HOUR_MS);
    let report = service.startup();

    assert_eq!(report.relations_loaded, 2);
    assert_eq!(report.sanctions_loaded, 0);
    assert_eq!(report.records_dropped, 1);
    assert_eq!(report.nations_reconciled, 0);
    assert!(service.is_at_war(&id("b"), &id("a")));
    assert!(service.is_allied(&id("c"), &id("a")));
    assert!(!service.is_sanctioned(&id("c"), &id("b")));

    let files = DiplomacyFiles::new(dir.path());
    assert!(files.load_sanctions(0).unwrap().is_empty());
    assert_eq!(files.load_relations(0).unwrap().len(), 2);
}

#[test]
fn startup_drops_unusable_records() {
    let dir = tempfile::tempdir().unwrap();
    let files = DiplomacyFiles::new(dir.path());
    write(
        &files.relations_path(),
        &json!([
            { "nationA": "a", "nationB": "ghost", "status": "WAR" },
            { "nationA": "a", "nationB": "a", "status": "ALLIANCE" },
            { "nationA": "a", "nationB": "b", "status": "NEUTRAL" },
            { "nationA": "b", "nationB": "a", "status": "ALLIANCE", "reason": "pact" },
            { "nationA": "a", "nationB": "b", "status": "WAR" },
            { "nationA": "a", "nationB": "b", "status": "WAR", "expiresAt": START - 1 },
        ]),
    );
    write(
        &files.sanctions_path(),
        &json!([
            { "sanctionerId": "a", "targetId": "a" },
            { "sanctionerId": "b", "targetId": "ghost" },
            { "sanctionerId": "b", "targetId": "a", "expiresAt": START + HOUR_MS },
        ]),
    );

    let nations = Arc::new(InMemoryNationRepository::with_nations([
        nation("a"),
        nation("b"),
    ]));
    let service = service_over(
        Arc::clone(&nations) as Arc<dyn NationRepository>,
        dir.path(),
        START,
    );
    let report = service.startup();

    assert_eq!(report.relations_loaded, 1);
    assert_eq!(report.sanctions_loaded, 1);
    assert_eq!(report.records_dropped, 7);
    assert_eq!(report.nations_reconciled, 2);
    assert!(service.is_allied(&id("a"), &id("b")));
    assert!(service.is_sanctioned(&id("b"), &id("a")));
    assert!(nations.get(&id("a")).unwrap().allies.contains(&id("b")));

    let relations = files.load_relations(0).unwrap();
    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0].nation_a, id("a"));
    assert_eq!(relations[0].reason, "pact");
    assert_eq!(files.load_sanctions(0).unwrap().len(), 1);
}

#[test]
fn war_lapsing_while_down_ends_on_restart() {
    let dir = tempfile::tempdir().unwrap();
    let nations_dir = dir.path().join("nations");
    {
        let repo = JsonNationRepository::open(&nations_dir).unwrap();
        for n in ["a", "b"] {
            repo.save(&nation(n)).unwrap();
        }
        let service = service_over(Arc::new(repo), dir.path(), START);
        service.startup();
        DiplomacySystem::new(service).declare_war(&id("a"), &id("b")).unwrap();
    }

    let repo = Arc::new(JsonNationRepository::open(&nations_dir).unwrap());
    assert!(repo.get(&id("a")).unwrap().enemies.contains(&id("b")));

    let (service, events) = watched_service_over(
        Arc::clone(&repo) as Arc<dyn NationRepository>,
        dir.path(),
        START + 25 * HOUR_MS,
    );
    let report = service.startup();

    assert_eq!(report.bootstrapped, 0);
    assert_eq!(report.expired.wars_ended, 1);
    assert!(!service.is_at_war(&id("a"), &id("b")));
    assert!(service.relations_for(&id("a")).is_empty());
    assert!(repo.get(&id("a")).unwrap().enemies.is_empty());
    assert!(repo.get(&id("b")).unwrap().enemies.is_empty());
    assert_eq!(
        events.take(),
        vec![DiplomacyEvent::WarEnded {
            nation_a: id("a"),
            nation_b: id("b"),
        }]
    );
    assert!(DiplomacyFiles::new(dir.path()).load_relations(0).unwrap().is_empty());

    // A further restart finds nothing left to end.
    let (again, events) = watched_service_over(repo, dir.path(), START + 26 * HOUR_MS);
    let second = again.startup();
    assert_eq!(second.relations_loaded, 0);
    assert_eq!(second.bootstrapped, 0);
    assert!(events.is_empty());
}

#[test]
fn live_record_wins_over_a_lapsed_one_for_the_same_pair() {
    let dir = tempfile::tempdir().unwrap();
    let files = DiplomacyFiles::new(dir.path());
    write(
        &files.relations_path(),
        &json!([
            { "nationA": "a", "nationB": "b", "status": "WAR", "expiresAt": START - 1 },
            { "nationA": "b", "nationB": "a", "status": "ALLIANCE" },
        ]),
    );

    let nations = Arc::new(InMemoryNationRepository::with_nations([
        nation("a"),
        nation("b"),
    ]));
    let service = service_over(nations, dir.path(), START);
    let report = service.startup();

    assert_eq!(report.relations_loaded, 1);
    assert_eq!(report.records_dropped, 1);
    assert!(service.is_allied(&id("a"), &id("b")));
}

#[test]
fn legacy_files_are_imported_once() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(&root.join("sanctions/a.json"), &json!({ "sanctioned": ["b"] }));
    write(
        &root.join("treaties/sanctions.json"),
        &json!({ "a": ["b"], "b": ["c"] }),
    );
    write(
        &root.join("ceasefires/live.json"),
        &json!({ "nationA": "a", "nationB": "c", "expiresAt": START + HOUR_MS }),
    );
    write(
        &root.join("ceasefires/stale.json"),
        &json!({ "nationA": "b", "nationB": "c", "expiresAt": START - 1 }),
    );

    let nations = Arc::new(InMemoryNationRepository::with_nations([
        nation("a"),
        nation("b"),
        nation("c"),
    ]));
    let service = service_over(
        Arc::clone(&nations) as Arc<dyn NationRepository>,
        root,
        START,
    );
    let report = service.startup();

    assert_eq!(report.legacy_imported, 3);
    assert!(DiplomacyFiles::new(root).legacy_imported());
    assert!(service.is_sanctioned(&id("a"), &id("b")));
    assert!(service.is_sanctioned(&id("b"), &id("c")));
    assert!(service.is_ceasefire(&id("c"), &id("a")));
    assert_eq!(service.status(&id("b"), &id("c")), RelationStatus::Neutral);

    let sanctions = service.all_sanctions();
    assert_eq!(sanctions.len(), 2);
    assert!(sanctions.iter().all(|s| s.expires_at == Expiry::Permanent));
    assert!(sanctions.iter().all(|s| s.reason == "legacy"));

    // Move on from the imported state before restarting.
    service
        .set_status(&id("a"), &id("c"), RelationStatus::Alliance, Term::Permanent, "pact")
        .unwrap();
    service.lift_sanction(&id("a"), &id("b")).unwrap();

    let again = service_over(nations, root, START);
    let second = again.startup();
    assert_eq!(second.legacy_imported, 0);
    assert_eq!(second.sanctions_loaded, 1);
    assert_eq!(second.relations_loaded, 1);
    assert!(again.is_allied(&id("a"), &id("c")));
    assert!(!again.is_sanctioned(&id("a"), &id("b")));
    assert!(again.is_sanctioned(&id("b"), &id("c")));
}

#[test]
fn legacy_ceasefire_never_replaces_a_settled_relation() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let files = DiplomacyFiles::new(root);
    write(
        &files.relations_path(),
        &json!([
            { "nationA": "a", "nationB": "b", "status": "ALLIANCE" },
            { "nationA": "a", "nationB": "c", "status": "WAR" },
        ]),
    );
    write(
        &root.join("ceasefires/ab.json"),
        &json!({ "nationA": "a", "nationB": "b", "permanent": true }),
    );
    write(
        &root.join("ceasefires/ac.json"),
        &json!({ "nationA": "c", "nationB": "a", "permanent": true }),
    );

    let nations = Arc::new(InMemoryNationRepository::with_nations([
        nation("a"),
        nation("b"),
        nation("c"),
    ]));
    let service = service_over(nations, root, START);
    let report = service.startup();

    assert_eq!(report.legacy_imported, 1);
    assert!(service.is_allied(&id("a"), &id("b")));
    assert!(service.is_ceasefire(&id("a"), &id("c")));
}

#[test]
fn bootstrap_turns_nation_lists_into_relations() {
    let dir = tempfile::tempdir().unwrap();
    let mut a = nation("a");
    a.enemies.insert(id("b"));
    a.allies.insert(id("c"));
    let mut c = nation("c");
    c.allies.insert(id("a"));
    let nations = Arc::new(InMemoryNationRepository::with_nations([a, nation("b"), c]));

    let service = service_over(
        Arc::clone(&nations) as Arc<dyn NationRepository>,
        dir.path(),
        START,
    );
    let report = service.startup();

    assert_eq!(report.bootstrapped, 2);
    assert_eq!(report.nations_reconciled, 1);
    assert!(service.is_at_war(&id("a"), &id("b")));
    assert!(service.is_allied(&id("a"), &id("c")));
    assert!(nations.get(&id("b")).unwrap().enemies.contains(&id("a")));

    let war = service
        .relations_for(&id("b"))
        .into_iter()
        .find(|rel| rel.status == RelationStatus::War)
        .unwrap();
    assert_eq!(war.expires_at, Expiry::At(START + 24 * HOUR_MS));
    assert_eq!(war.reason, "bootstrap");
}

#[test]
fn conflicting_lists_settle_on_war_and_converge() {
    let dir = tempfile::tempdir().unwrap();
    let mut a = nation("a");
    a.allies.insert(id("b"));
    let mut b = nation("b");
    b.enemies.insert(id("a"));
    let nations = Arc::new(InMemoryNationRepository::with_nations([a, b]));

    let service = service_over(
        Arc::clone(&nations) as Arc<dyn NationRepository>,
        dir.path(),
        START,
    );
    service.startup();

    assert!(service.is_at_war(&id("a"), &id("b")));
    let a = nations.get(&id("a")).unwrap();
    assert!(a.allies.is_empty());
    assert!(a.enemies.contains(&id("b")));
    assert_eq!(service.reconcile(), 0);
}

#[test]
fn configured_rules_drive_the_engine() {
    let config = EntenteConfig::parse(
        "diplomacy:\n  war_cost: 250\n  advanced_war: true\n",
    )
    .unwrap();
    let nations = Arc::new(InMemoryNationRepository::with_nations([
        nation("a"),
        nation("b"),
    ]));
    let service = DiplomacyService::new(
        Arc::clone(&nations) as Arc<dyn NationRepository>,
        Arc::new(ManualClock::new(START)) as Arc<dyn Clock>,
        DiplomacySettings::from(&config.diplomacy),
    );
    let system = DiplomacySystem::new(Arc::new(service));

    let expires = system.declare_war(&id("a"), &id("b")).unwrap();
    assert_eq!(expires, Expiry::Permanent);
    assert_eq!(
        nations.get(&id("a")).unwrap().treasury,
        Decimal::new(9_750, 0)
    );
}
