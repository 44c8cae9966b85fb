//! Startup reconciliation.
//!
//! Runs once before the service takes traffic:
//!
//! 1. Load relations and sanctions, dropping records that are neutral,
//!    orphaned, self-referencing, or duplicated. Expired sanctions are
//!    dropped too; expired relations are kept for the next step.
//! 2. Expire relations that lapsed while the engine was down, with the same
//!    side effects as a live sweep (nation sets cleared, wars reported).
//! 3. Import legacy sanction and ceasefire files, unless a previous start
//!    already did.
//! 4. Bootstrap relations from the nations' own ally and enemy lists,
//!    wars first, then alliances.
//! 5. Prune anything that expired along the way.
//! 6. Rewrite every nation's ally and enemy sets from the relation store.

use tracing::{debug, info, warn};

use entente_diplomacy::{Term, resolve_expiry};
use entente_types::{Expiry, Relation, RelationStatus, Sanction};

use crate::engine::{SweepReport, Tx};
use crate::service::DiplomacyService;

const LEGACY_REASON: &str = "legacy";
const BOOTSTRAP_REASON: &str = "bootstrap";

/// What startup did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartupReport {
    /// Relations kept from the relations file.
    pub relations_loaded: usize,
    /// Sanctions kept from the sanctions file.
    pub sanctions_loaded: usize,
    /// Persisted records discarded while loading.
    pub records_dropped: usize,
    /// Records created from legacy files.
    pub legacy_imported: usize,
    /// Relations created from nations' ally and enemy lists.
    pub bootstrapped: usize,
    /// Everything expired during startup, including relations that lapsed
    /// while the engine was down.
    pub expired: SweepReport,
    /// Nations whose ally or enemy sets were rewritten.
    pub nations_reconciled: usize,
}

impl DiplomacyService {
    /// Load persisted state and bring nations in line with it.
    ///
    /// Intended to run once, before any other call. Loading replaces the
    /// in-memory stores.
    pub fn startup(&self) -> StartupReport {
        let report = self.transact(|tx| {
            let (relations_loaded, sanctions_loaded, records_dropped) = load_persisted(tx);
            let mut expired = tx.sweep();
            let legacy_imported = import_legacy(tx);
            let bootstrapped = bootstrap(tx);
            expired.absorb(tx.sweep());
            let nations_reconciled = tx.reconcile_nations();
            StartupReport {
                relations_loaded,
                sanctions_loaded,
                records_dropped,
                legacy_imported,
                bootstrapped,
                expired,
                nations_reconciled,
            }
        });

        info!(
            relations = report.relations_loaded,
            sanctions = report.sanctions_loaded,
            dropped = report.records_dropped,
            legacy = report.legacy_imported,
            expired = report.expired.relations_expired,
            wars_ended = report.expired.wars_ended,
            bootstrapped = report.bootstrapped,
            reconciled = report.nations_reconciled,
            "Diplomacy state loaded"
        );
        report
    }
}

/// Step 1. Returns `(relations kept, sanctions kept, records dropped)`.
///
/// Lapsed relations count as kept; the sweep that follows removes them.
fn load_persisted(tx: &mut Tx<'_>) -> (usize, usize, usize) {
    let Some(files) = tx.files().cloned() else {
        return (0, 0, 0);
    };
    let now = tx.now();

    let relations = files.load_relations(now).unwrap_or_else(|err| {
        warn!(error = %err, "Cannot read relations file, starting empty");
        Vec::new()
    });
    let sanctions = files.load_sanctions(now).unwrap_or_else(|err| {
        warn!(error = %err, "Cannot read sanctions file, starting empty");
        Vec::new()
    });

    let mut dropped = 0_usize;
    let mut relations_kept = 0_usize;
    for relation in relations {
        if let Some(why) = reject_relation(tx, &relation) {
            debug!(
                nation_a = %relation.nation_a,
                nation_b = %relation.nation_b,
                why,
                "Dropping persisted relation"
            );
            dropped = dropped.saturating_add(1);
            continue;
        }
        let replaced = tx
            .state
            .relations
            .get(&relation.nation_a, &relation.nation_b)
            .is_some();
        tx.state.relations.insert(relation);
        if replaced {
            dropped = dropped.saturating_add(1);
        } else {
            relations_kept = relations_kept.saturating_add(1);
        }
    }

    let mut sanctions_kept = 0_usize;
    for sanction in sanctions {
        if let Some(why) = reject_sanction(tx, &sanction) {
            debug!(
                sanctioner = %sanction.sanctioner_id,
                target = %sanction.target_id,
                why,
                "Dropping persisted sanction"
            );
            dropped = dropped.saturating_add(1);
            continue;
        }
        tx.state.sanctions.insert(sanction);
        sanctions_kept = sanctions_kept.saturating_add(1);
    }

    if dropped > 0 {
        tx.mark_relations_dirty();
        tx.mark_sanctions_dirty();
    }
    (relations_kept, sanctions_kept, dropped)
}

fn reject_relation(tx: &Tx<'_>, relation: &Relation) -> Option<&'static str> {
    if relation.status == RelationStatus::Neutral {
        return Some("neutral");
    }
    if relation.nation_a == relation.nation_b {
        return Some("self-relation");
    }
    if !tx.exists(&relation.nation_a) || !tx.exists(&relation.nation_b) {
        return Some("unknown nation");
    }
    // A lapsed record gives way to a live one for the same pair.
    if tx
        .state
        .relations
        .get(&relation.nation_a, &relation.nation_b)
        .is_some_and(|existing| !existing.is_expired(tx.now()) || relation.is_expired(tx.now()))
    {
        return Some("duplicate pair");
    }
    None
}

fn reject_sanction(tx: &Tx<'_>, sanction: &Sanction) -> Option<&'static str> {
    if sanction.sanctioner_id == sanction.target_id {
        return Some("self-sanction");
    }
    if !tx.exists(&sanction.sanctioner_id) || !tx.exists(&sanction.target_id) {
        return Some("unknown nation");
    }
    if sanction.is_expired(tx.now()) {
        return Some("expired");
    }
    if tx
        .state
        .sanctions
        .contains(&sanction.sanctioner_id, &sanction.target_id)
    {
        return Some("duplicate pair");
    }
    None
}

/// Step 3. Returns the number of records created.
///
/// The unified files are written before the import is marked done, so a
/// failed write leaves the legacy files to be imported again next start.
fn import_legacy(tx: &mut Tx<'_>) -> usize {
    let Some(files) = tx.files().cloned() else {
        return 0;
    };
    if files.legacy_imported() {
        debug!("Legacy diplomacy files already imported");
        return 0;
    }
    let legacy = files.read_legacy();
    let now = tx.now();
    let mut imported = 0_usize;

    for entry in &legacy.sanctions {
        let usable = entry.sanctioner != entry.target
            && tx.exists(&entry.sanctioner)
            && tx.exists(&entry.target);
        if !usable || tx.state.sanctions.contains(&entry.sanctioner, &entry.target) {
            continue;
        }
        tx.state.sanctions.insert(Sanction {
            sanctioner_id: entry.sanctioner.clone(),
            target_id: entry.target.clone(),
            started_at: now,
            expires_at: Expiry::Permanent,
            reason: LEGACY_REASON.to_owned(),
        });
        tx.mark_sanctions_dirty();
        imported = imported.saturating_add(1);
    }

    for entry in &legacy.ceasefires {
        let usable = entry.nation_a != entry.nation_b
            && tx.exists(&entry.nation_a)
            && tx.exists(&entry.nation_b)
            && !entry.expires_at.is_expired(now);
        if !usable {
            continue;
        }
        // A ceasefire only settles a war; a pair that has moved on keeps
        // its relation.
        let current = tx
            .state
            .relations
            .status_at(&entry.nation_a, &entry.nation_b, now);
        if !matches!(current, RelationStatus::Neutral | RelationStatus::War) {
            debug!(
                nation_a = %entry.nation_a,
                nation_b = %entry.nation_b,
                current = ?current,
                "Skipping legacy ceasefire"
            );
            continue;
        }
        tx.state.relations.insert(Relation {
            nation_a: entry.nation_a.clone(),
            nation_b: entry.nation_b.clone(),
            status: RelationStatus::Ceasefire,
            started_at: now,
            expires_at: entry.expires_at,
            reason: LEGACY_REASON.to_owned(),
        });
        tx.mark_relations_dirty();
        imported = imported.saturating_add(1);
    }

    if imported > 0 {
        info!(imported, "Imported legacy diplomacy records");
    }

    let marked = tx
        .flush()
        .and_then(|()| files.mark_legacy_imported(now, &legacy));
    if let Err(err) = marked {
        warn!(error = %err, "Cannot record legacy import, it will run again");
    }
    imported
}

/// Step 4. Returns the number of relations created.
fn bootstrap(tx: &mut Tx<'_>) -> usize {
    let now = tx.now();
    let policy = tx.settings().expiry_policy;
    let nations = tx.nations().list();
    let mut created = 0_usize;

    for nation in &nations {
        for enemy in &nation.enemies {
            if *enemy == nation.id || !tx.exists(enemy) {
                continue;
            }
            if tx.state.relations.status_at(&nation.id, enemy, now) == RelationStatus::War {
                continue;
            }
            tx.state.relations.insert(Relation {
                nation_a: nation.id.clone(),
                nation_b: enemy.clone(),
                status: RelationStatus::War,
                started_at: now,
                expires_at: resolve_expiry(RelationStatus::War, Term::Default, now, &policy),
                reason: BOOTSTRAP_REASON.to_owned(),
            });
            created = created.saturating_add(1);
        }
    }

    for nation in &nations {
        for ally in &nation.allies {
            if *ally == nation.id || !tx.exists(ally) {
                continue;
            }
            if tx.state.relations.status_at(&nation.id, ally, now) != RelationStatus::Neutral {
                continue;
            }
            tx.state.relations.insert(Relation {
                nation_a: nation.id.clone(),
                nation_b: ally.clone(),
                status: RelationStatus::Alliance,
                started_at: now,
                expires_at: Expiry::Permanent,
                reason: BOOTSTRAP_REASON.to_owned(),
            });
            created = created.saturating_add(1);
        }
    }

    if created > 0 {
        tx.mark_relations_dirty();
        debug!(created, "Bootstrapped relations from nation records");
    }
    created
}
