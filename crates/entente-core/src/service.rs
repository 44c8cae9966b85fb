//! The shared diplomacy service.
//!
//! [`DiplomacyService`] owns the relation store, the sanction store, and
//! the war cooldowns behind one mutex. It is built once at startup and
//! shared as `Arc<DiplomacyService>`; every collaborator receives it by
//! constructor injection.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::TimeDelta;
use rust_decimal::Decimal;

use entente_diplomacy::{DiplomacyError, ExpiryPolicy, Term, TransitionOutcome};
use entente_store::{DiplomacyFiles, NationRepository};
use entente_types::{NationId, Relation, RelationStatus, Sanction};

use crate::clock::Clock;
use crate::config::DiplomacyConfig;
use crate::engine::{EngineContext, EngineState, SweepReport, Tx};
use crate::observer::{DiplomacyEvent, DiplomacyObserver, NoOpObserver};

/// Game rules the engine applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiplomacySettings {
    /// Expiry defaults for relations.
    pub expiry_policy: ExpiryPolicy,
    /// Treasury cost of declaring war.
    pub war_cost: Decimal,
    /// Minimum time between two war declarations by the same nation.
    pub war_cooldown: TimeDelta,
    /// Declared wars are permanent until peace.
    pub advanced_war: bool,
    /// Reputation each side loses when an alliance is broken.
    pub alliance_break_penalty: i32,
}

impl Default for DiplomacySettings {
    fn default() -> Self {
        Self::from(&DiplomacyConfig::default())
    }
}

impl From<&DiplomacyConfig> for DiplomacySettings {
    fn from(config: &DiplomacyConfig) -> Self {
        Self {
            expiry_policy: config.expiry_policy(),
            war_cost: config.war_cost,
            war_cooldown: config.war_cooldown(),
            advanced_war: config.advanced_war,
            alliance_break_penalty: config.alliance_break_penalty,
        }
    }
}

/// Counts from removing a disbanded nation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Relations that touched the nation.
    pub relations_removed: usize,
    /// Sanctions imposed by or on the nation.
    pub sanctions_removed: usize,
    /// Other nations whose records referenced it.
    pub nations_updated: usize,
}

/// The diplomacy engine.
pub struct DiplomacyService {
    state: Mutex<EngineState>,
    ctx: EngineContext,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn DiplomacyObserver>,
}

impl core::fmt::Debug for DiplomacyService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DiplomacyService")
            .field("settings", &self.ctx.settings)
            .field("persistent", &self.ctx.files.is_some())
            .finish_non_exhaustive()
    }
}

impl DiplomacyService {
    /// Create an empty, in-memory service.
    ///
    /// Call [`with_files`](Self::with_files) to persist state and
    /// [`startup`](Self::startup) to load it.
    pub fn new(
        nations: Arc<dyn NationRepository>,
        clock: Arc<dyn Clock>,
        settings: DiplomacySettings,
    ) -> Self {
        Self {
            state: Mutex::new(EngineState::default()),
            ctx: EngineContext {
                nations,
                files: None,
                settings,
            },
            clock,
            observer: Arc::new(NoOpObserver),
        }
    }

    /// Persist relations and sanctions under `files`.
    #[must_use]
    pub fn with_files(mut self, files: DiplomacyFiles) -> Self {
        self.ctx.files = Some(files);
        self
    }

    /// Deliver events to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn DiplomacyObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// The rules in force.
    pub const fn settings(&self) -> &DiplomacySettings {
        &self.ctx.settings
    }

    /// The nation store the service reads and writes.
    pub fn nations(&self) -> &Arc<dyn NationRepository> {
        &self.ctx.nations
    }

    /// Run `f` under the engine lock, then deliver its events.
    pub(crate) fn transact<T>(&self, f: impl FnOnce(&mut Tx<'_>) -> T) -> T {
        let now = self.clock.now_millis();
        let (result, effects) = {
            let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let mut tx = Tx::new(&mut guard, &self.ctx, now);
            let result = f(&mut tx);
            (result, tx.finish())
        };
        self.dispatch(&effects);
        result
    }

    fn dispatch(&self, effects: &[DiplomacyEvent]) {
        for event in effects {
            self.observer.on_event(event);
        }
    }

    // -----------------------------------------------------------------------
    // Relations
    // -----------------------------------------------------------------------

    /// Status between two nations. Blank identifiers and expired records
    /// read as neutral; an expired record is evicted by the read.
    pub fn status(&self, a: &NationId, b: &NationId) -> RelationStatus {
        self.transact(|tx| tx.status(a, b))
    }

    /// Whether the pair is at war.
    pub fn is_at_war(&self, a: &NationId, b: &NationId) -> bool {
        self.status(a, b) == RelationStatus::War
    }

    /// Whether the pair is allied.
    pub fn is_allied(&self, a: &NationId, b: &NationId) -> bool {
        self.status(a, b) == RelationStatus::Alliance
    }

    /// Whether the pair is in a ceasefire.
    pub fn is_ceasefire(&self, a: &NationId, b: &NationId) -> bool {
        self.status(a, b) == RelationStatus::Ceasefire
    }

    /// Change the status between two nations.
    ///
    /// Both nations must exist. On success both nations' ally and enemy
    /// sets match the new status and the change has been persisted.
    pub fn set_status(
        &self,
        a: &NationId,
        b: &NationId,
        status: RelationStatus,
        term: Term,
        reason: &str,
    ) -> Result<TransitionOutcome, DiplomacyError> {
        self.transact(|tx| tx.set_status(a, b, status, term, reason))
    }

    /// Every active relation touching `id`.
    pub fn relations_for(&self, id: &NationId) -> Vec<Relation> {
        self.transact(|tx| tx.state.relations.relations_for(id, tx.now()))
    }

    /// Number of active relations with `status`.
    pub fn count_by_status(&self, status: RelationStatus) -> usize {
        self.transact(|tx| tx.state.relations.count_by_status(status, tx.now()))
    }

    /// Number of active relations of `id` with `status`.
    pub fn count_for(&self, id: &NationId, status: RelationStatus) -> usize {
        self.transact(|tx| tx.state.relations.count_for(id, status, tx.now()))
    }

    /// Whether `id` is at war with any nation.
    pub fn has_active_war_with_anyone(&self, id: &NationId) -> bool {
        self.transact(|tx| tx.state.relations.has_active_war_with_anyone(id, tx.now()))
    }

    // -----------------------------------------------------------------------
    // Sanctions
    // -----------------------------------------------------------------------

    /// Whether `sanctioner` currently sanctions `target`.
    pub fn is_sanctioned(&self, sanctioner: &NationId, target: &NationId) -> bool {
        self.transact(|tx| tx.is_sanctioned(sanctioner, target))
    }

    /// Whether both nations sanction each other.
    pub fn has_mutual_sanctions(&self, a: &NationId, b: &NationId) -> bool {
        self.transact(|tx| {
            let forward = tx.is_sanctioned(a, b);
            let backward = tx.is_sanctioned(b, a);
            forward && backward
        })
    }

    /// Active sanctions imposed by `id`.
    pub fn sanctions_imposed_by(&self, id: &NationId) -> Vec<Sanction> {
        self.transact(|tx| tx.state.sanctions.imposed_by(id, tx.now()))
    }

    /// Nations actively sanctioning `id`.
    pub fn sanctioning_nations(&self, id: &NationId) -> Vec<NationId> {
        self.transact(|tx| tx.state.sanctions.sanctioning(id, tx.now()))
    }

    /// Every active sanction.
    pub fn all_sanctions(&self) -> Vec<Sanction> {
        self.transact(|tx| tx.state.sanctions.active(tx.now()))
    }

    /// Impose a sanction without any treasury cost.
    pub fn impose_sanction(
        &self,
        sanctioner: &NationId,
        target: &NationId,
        term: Term,
        reason: &str,
    ) -> Result<Sanction, DiplomacyError> {
        self.transact(|tx| {
            let sanction = tx.impose_sanction(sanctioner, target, term, reason)?;
            tx.emit(DiplomacyEvent::SanctionImposed {
                sanctioner: sanctioner.clone(),
                target: target.clone(),
            });
            Ok(sanction)
        })
    }

    /// Lift a sanction.
    pub fn lift_sanction(
        &self,
        sanctioner: &NationId,
        target: &NationId,
    ) -> Result<Sanction, DiplomacyError> {
        self.transact(|tx| {
            let sanction = tx.lift_sanction(sanctioner, target)?;
            tx.emit(DiplomacyEvent::SanctionLifted {
                sanctioner: sanctioner.clone(),
                target: target.clone(),
            });
            Ok(sanction)
        })
    }

    // -----------------------------------------------------------------------
    // Maintenance
    // -----------------------------------------------------------------------

    /// Remove every lapsed relation and sanction. Safe to call repeatedly.
    pub fn sweep(&self) -> SweepReport {
        self.transact(|tx| tx.sweep())
    }

    /// Recompute every nation's ally and enemy sets from the relation
    /// store. Returns the number of nations rewritten.
    pub fn reconcile(&self) -> usize {
        self.transact(|tx| tx.reconcile_nations())
    }

    /// Forget a disbanded nation: drop its relations, sanctions, and
    /// cooldown, and remove it from every other nation's records.
    pub fn cleanup_nation(&self, id: &NationId) -> CleanupReport {
        self.transact(|tx| {
            let relations = tx.state.relations.remove_involving(id);
            let sanctions = tx.state.sanctions.remove_involving(id);
            tx.state.war_cooldowns.remove(id);
            if !relations.is_empty() {
                tx.mark_relations_dirty();
            }
            if !sanctions.is_empty() {
                tx.mark_sanctions_dirty();
            }

            let mut nations_updated = 0_usize;
            for mut other in tx.nations().list() {
                if other.id == *id {
                    continue;
                }
                let was_ally = other.allies.remove(id);
                let was_enemy = other.enemies.remove(id);
                let had_request = entente_diplomacy::pending::forget(&mut other, id);
                if was_ally || was_enemy || had_request {
                    tx.save_nation(&other);
                    nations_updated = nations_updated.saturating_add(1);
                }
            }

            tracing::info!(
                nation = %id,
                relations = relations.len(),
                sanctions = sanctions.len(),
                nations_updated,
                "Nation removed from diplomacy"
            );
            CleanupReport {
                relations_removed: relations.len(),
                sanctions_removed: sanctions.len(),
                nations_updated,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use entente_store::InMemoryNationRepository;
    use entente_types::Nation;

    use super::*;
    use crate::clock::ManualClock;
    use crate::observer::RecordingObserver;

    const START: i64 = 1_700_000_000_000;

    fn service() -> (DiplomacyService, Arc<ManualClock>, Arc<RecordingObserver>) {
        let nations = Arc::new(InMemoryNationRepository::with_nations([
            Nation::new("a", "Alpha", Decimal::new(10_000, 0)),
            Nation::new("b", "Beta", Decimal::new(10_000, 0)),
        ]));
        let clock = Arc::new(ManualClock::new(START));
        let observer = Arc::new(RecordingObserver::new());
        let service = DiplomacyService::new(nations, clock.clone(), DiplomacySettings::default())
            .with_observer(observer.clone());
        (service, clock, observer)
    }

    #[test]
    fn set_status_requires_existing_nations() {
        let (service, _, _) = service();
        let result = service.set_status(
            &NationId::from("a"),
            &NationId::from("ghost"),
            RelationStatus::War,
            Term::Default,
            "test",
        );
        assert_eq!(
            result.err(),
            Some(DiplomacyError::NationNotFound(NationId::from("ghost")))
        );
    }

    #[test]
    fn blank_ids_read_neutral() {
        let (service, _, _) = service();
        assert_eq!(
            service.status(&NationId::from(""), &NationId::from("a")),
            RelationStatus::Neutral
        );
    }

    #[test]
    fn lazy_expiry_emits_war_ended_once() {
        let (service, clock, observer) = service();
        let (a, b) = (NationId::from("a"), NationId::from("b"));
        service
            .set_status(&a, &b, RelationStatus::War, Term::Default, "test")
            .unwrap();

        clock.advance(TimeDelta::hours(25));
        assert_eq!(service.status(&b, &a), RelationStatus::Neutral);
        assert_eq!(service.status(&a, &b), RelationStatus::Neutral);

        let ended: Vec<_> = observer
            .take()
            .into_iter()
            .filter(|e| matches!(e, DiplomacyEvent::WarEnded { .. }))
            .collect();
        assert_eq!(ended.len(), 1);
        assert!(service.sweep().is_empty());
    }

    #[test]
    fn debug_output_hides_collaborators() {
        let (service, _, _) = service();
        let text = format!("{service:?}");
        assert!(text.contains("DiplomacyService"));
        assert!(text.contains("persistent: false"));
    }
}
