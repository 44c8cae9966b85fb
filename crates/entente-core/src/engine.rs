//! The locked transaction context.
//!
//! Every public operation of [`DiplomacyService`](crate::DiplomacyService)
//! runs inside one [`Tx`] while the engine mutex is held. A transaction
//! collects events instead of delivering them, remembers which stores it
//! touched, and on [`Tx::finish`] writes each touched store to disk once.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::DateTime;
use tracing::{debug, info, warn};

use entente_diplomacy::{
    DiplomacyError, RelationStore, SanctionStore, Term, TransitionOutcome, TransitionRequest,
    validate_participants,
};
use entente_store::{DiplomacyFiles, NationRepository, StoreError};
use entente_types::{Nation, NationId, Relation, RelationStatus, Sanction};

use crate::observer::DiplomacyEvent;
use crate::service::DiplomacySettings;

/// State guarded by the engine mutex.
#[derive(Debug, Default)]
pub(crate) struct EngineState {
    pub(crate) relations: RelationStore,
    pub(crate) sanctions: SanctionStore,
    /// Nation -> epoch milliseconds of its last war declaration.
    pub(crate) war_cooldowns: BTreeMap<NationId, i64>,
}

/// Collaborators shared by every transaction.
pub(crate) struct EngineContext {
    pub(crate) nations: Arc<dyn NationRepository>,
    pub(crate) files: Option<DiplomacyFiles>,
    pub(crate) settings: DiplomacySettings,
}

/// Counts from one expiration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Relations removed because they lapsed.
    pub relations_expired: usize,
    /// Of those, how many were wars.
    pub wars_ended: usize,
    /// Sanctions removed because they lapsed.
    pub sanctions_expired: usize,
}

impl SweepReport {
    /// Whether the pass removed nothing.
    pub const fn is_empty(&self) -> bool {
        self.relations_expired == 0 && self.sanctions_expired == 0
    }

    /// Fold a later pass into this one.
    pub(crate) const fn absorb(&mut self, later: Self) {
        self.relations_expired = self.relations_expired.saturating_add(later.relations_expired);
        self.wars_ended = self.wars_ended.saturating_add(later.wars_ended);
        self.sanctions_expired = self.sanctions_expired.saturating_add(later.sanctions_expired);
    }
}

/// One critical section.
pub(crate) struct Tx<'a> {
    pub(crate) state: &'a mut EngineState,
    ctx: &'a EngineContext,
    now: i64,
    effects: Vec<DiplomacyEvent>,
    relations_dirty: bool,
    sanctions_dirty: bool,
}

impl<'a> Tx<'a> {
    pub(crate) const fn new(state: &'a mut EngineState, ctx: &'a EngineContext, now: i64) -> Self {
        Self {
            state,
            ctx,
            now,
            effects: Vec::new(),
            relations_dirty: false,
            sanctions_dirty: false,
        }
    }

    pub(crate) const fn now(&self) -> i64 {
        self.now
    }

    pub(crate) const fn settings(&self) -> &DiplomacySettings {
        &self.ctx.settings
    }

    pub(crate) fn nations(&self) -> &dyn NationRepository {
        self.ctx.nations.as_ref()
    }

    pub(crate) const fn files(&self) -> Option<&DiplomacyFiles> {
        self.ctx.files.as_ref()
    }

    pub(crate) fn emit(&mut self, event: DiplomacyEvent) {
        self.effects.push(event);
    }

    pub(crate) const fn mark_relations_dirty(&mut self) {
        self.relations_dirty = true;
    }

    pub(crate) const fn mark_sanctions_dirty(&mut self) {
        self.sanctions_dirty = true;
    }

    // -----------------------------------------------------------------------
    // Nations
    // -----------------------------------------------------------------------

    pub(crate) fn nation(&self, id: &NationId) -> Result<Nation, DiplomacyError> {
        self.ctx
            .nations
            .get(id)
            .ok_or_else(|| DiplomacyError::NationNotFound(id.clone()))
    }

    pub(crate) fn exists(&self, id: &NationId) -> bool {
        !id.is_blank() && self.ctx.nations.exists(id)
    }

    /// Validate a pair of parties and load both nations.
    pub(crate) fn require_pair(
        &self,
        a: &NationId,
        b: &NationId,
    ) -> Result<(Nation, Nation), DiplomacyError> {
        validate_participants(a, b)?;
        Ok((self.nation(a)?, self.nation(b)?))
    }

    /// Save a nation, logging and swallowing a persistence failure.
    pub(crate) fn save_nation(&self, nation: &Nation) {
        if let Err(err) = self.ctx.nations.save(nation) {
            warn!(nation = %nation.id, error = %err, "Failed to save nation");
        }
    }

    /// Append a timestamped line to a nation's chronicle and save it.
    pub(crate) fn append_history(&self, id: &NationId, entry: &str) {
        let Some(mut nation) = self.ctx.nations.get(id) else {
            return;
        };
        nation
            .history
            .push(format!("{} -- {entry}", history_stamp(self.now)));
        self.save_nation(&nation);
    }

    /// Bring both nations' ally and enemy sets in line with `status`.
    pub(crate) fn sync_pair(&self, a: &NationId, b: &NationId, status: RelationStatus) {
        self.sync_side(a, b, status);
        self.sync_side(b, a, status);
    }

    fn sync_side(&self, id: &NationId, other: &NationId, status: RelationStatus) {
        let Some(mut nation) = self.ctx.nations.get(id) else {
            return;
        };
        let allies_changed = set_membership(
            &mut nation.allies,
            other,
            status == RelationStatus::Alliance,
        );
        let enemies_changed =
            set_membership(&mut nation.enemies, other, status == RelationStatus::War);
        if allies_changed || enemies_changed {
            self.save_nation(&nation);
        }
    }

    // -----------------------------------------------------------------------
    // Relations
    // -----------------------------------------------------------------------

    /// Current status of a pair, evicting an expired record first.
    pub(crate) fn status(&mut self, a: &NationId, b: &NationId) -> RelationStatus {
        if a.is_blank() || b.is_blank() {
            return RelationStatus::Neutral;
        }
        if let Some(expired) = self.state.relations.take_if_expired(a, b, self.now) {
            self.expire_relation(&expired);
        }
        self.state.relations.status_at(a, b, self.now)
    }

    /// Validate and apply a status change for an existing pair of nations.
    pub(crate) fn set_status(
        &mut self,
        a: &NationId,
        b: &NationId,
        status: RelationStatus,
        term: Term,
        reason: &str,
    ) -> Result<TransitionOutcome, DiplomacyError> {
        self.require_pair(a, b)?;
        self.status(a, b);

        let sanctioned = if status == RelationStatus::Alliance {
            let forward = self.is_sanctioned(a, b);
            let backward = self.is_sanctioned(b, a);
            forward || backward
        } else {
            false
        };

        let request = TransitionRequest {
            a,
            b,
            status,
            term,
            reason,
        };
        let outcome = self.state.relations.transition(
            &request,
            sanctioned,
            self.now,
            &self.ctx.settings.expiry_policy,
        )?;
        self.relations_dirty = true;
        self.sync_pair(a, b, status);

        info!(
            nation_a = %a,
            nation_b = %b,
            from = ?outcome.previous,
            to = ?status,
            reason,
            "Relation changed"
        );
        Ok(outcome)
    }

    /// Run the side effects of a lapsed relation that has already been
    /// removed from the store.
    fn expire_relation(&mut self, relation: &Relation) {
        self.relations_dirty = true;
        info!(
            nation_a = %relation.nation_a,
            nation_b = %relation.nation_b,
            status = ?relation.status,
            "Relation expired"
        );
        if relation.status == RelationStatus::War {
            self.emit(DiplomacyEvent::WarEnded {
                nation_a: relation.nation_a.clone(),
                nation_b: relation.nation_b.clone(),
            });
        }
        self.sync_pair(
            &relation.nation_a,
            &relation.nation_b,
            RelationStatus::Neutral,
        );
    }

    // -----------------------------------------------------------------------
    // Sanctions
    // -----------------------------------------------------------------------

    /// Whether `sanctioner -> target` is in force, evicting an expired record.
    pub(crate) fn is_sanctioned(&mut self, sanctioner: &NationId, target: &NationId) -> bool {
        if let Some(expired) = self
            .state
            .sanctions
            .take_if_expired(sanctioner, target, self.now)
        {
            debug!(
                sanctioner = %expired.sanctioner_id,
                target = %expired.target_id,
                "Sanction expired"
            );
            self.sanctions_dirty = true;
        }
        self.state.sanctions.is_sanctioned(sanctioner, target, self.now)
    }

    /// Impose a sanction between two existing nations.
    pub(crate) fn impose_sanction(
        &mut self,
        sanctioner: &NationId,
        target: &NationId,
        term: Term,
        reason: &str,
    ) -> Result<Sanction, DiplomacyError> {
        if sanctioner.is_blank() || target.is_blank() {
            return Err(DiplomacyError::InvalidParties);
        }
        self.nation(sanctioner)?;
        self.nation(target)?;

        let allied = self.status(sanctioner, target) == RelationStatus::Alliance;
        self.is_sanctioned(sanctioner, target);
        let sanction =
            self.state
                .sanctions
                .impose(sanctioner, target, term, reason, allied, self.now)?;
        self.sanctions_dirty = true;

        info!(sanctioner = %sanctioner, target = %target, reason, "Sanction imposed");
        Ok(sanction)
    }

    /// Lift a sanction.
    pub(crate) fn lift_sanction(
        &mut self,
        sanctioner: &NationId,
        target: &NationId,
    ) -> Result<Sanction, DiplomacyError> {
        let sanction = self.state.sanctions.lift(sanctioner, target)?;
        self.sanctions_dirty = true;
        info!(sanctioner = %sanctioner, target = %target, "Sanction lifted");
        Ok(sanction)
    }

    // -----------------------------------------------------------------------
    // Batch passes
    // -----------------------------------------------------------------------

    /// Remove every lapsed relation and sanction.
    pub(crate) fn sweep(&mut self) -> SweepReport {
        let relations = self.state.relations.drain_expired(self.now);
        let wars_ended = relations
            .iter()
            .filter(|rel| rel.status == RelationStatus::War)
            .count();
        for relation in &relations {
            self.expire_relation(relation);
        }

        let sanctions = self.state.sanctions.drain_expired(self.now);
        if !sanctions.is_empty() {
            self.sanctions_dirty = true;
        }

        SweepReport {
            relations_expired: relations.len(),
            wars_ended,
            sanctions_expired: sanctions.len(),
        }
    }

    /// Overwrite every nation's ally and enemy sets with what the relation
    /// store implies. Returns the number of nations that changed.
    pub(crate) fn reconcile_nations(&self) -> usize {
        let links = self.state.relations.links(self.now);
        let mut updated = 0_usize;
        for mut nation in self.ctx.nations.list() {
            let allies = links.allies_of(&nation.id);
            let enemies = links.enemies_of(&nation.id);
            if nation.allies == allies && nation.enemies == enemies {
                continue;
            }
            debug!(nation = %nation.id, "Reconciling ally and enemy sets");
            nation.allies = allies;
            nation.enemies = enemies;
            self.save_nation(&nation);
            updated = updated.saturating_add(1);
        }
        updated
    }

    // -----------------------------------------------------------------------
    // Commit
    // -----------------------------------------------------------------------

    /// Write every touched store now and clear its dirty flag.
    ///
    /// Both stores are attempted; the first failure is returned and the
    /// failed store stays dirty so [`Tx::finish`] tries it again.
    pub(crate) fn flush(&mut self) -> Result<(), StoreError> {
        let Some(files) = &self.ctx.files else {
            return Ok(());
        };
        let mut outcome = Ok(());
        if self.relations_dirty {
            let relations: Vec<Relation> = self.state.relations.iter().cloned().collect();
            match files.save_relations(&relations) {
                Ok(()) => self.relations_dirty = false,
                Err(err) => outcome = Err(err),
            }
        }
        if self.sanctions_dirty {
            let sanctions: Vec<Sanction> = self.state.sanctions.iter().cloned().collect();
            match files.save_sanctions(&sanctions) {
                Ok(()) => self.sanctions_dirty = false,
                Err(err) => outcome = outcome.and(Err(err)),
            }
        }
        outcome
    }

    /// Persist touched stores and hand back the buffered events.
    pub(crate) fn finish(mut self) -> Vec<DiplomacyEvent> {
        if let Err(err) = self.flush() {
            warn!(error = %err, "Failed to persist diplomacy state");
        }
        self.effects
    }
}

/// Insert or remove `id` so that its membership matches `present`.
/// Returns whether the set changed.
fn set_membership(set: &mut BTreeSet<NationId>, id: &NationId, present: bool) -> bool {
    if present {
        set.insert(id.clone())
    } else {
        set.remove(id)
    }
}

/// `YYYY-MM-DD HH:MM` in UTC.
pub(crate) fn history_stamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis).map_or_else(
        || millis.to_string(),
        |at| at.format("%Y-%m-%d %H:%M").to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_stamp_is_minute_precision_utc() {
        assert_eq!(history_stamp(0), "1970-01-01 00:00");
        assert_eq!(history_stamp(1_700_000_000_000), "2023-11-14 22:13");
    }

    #[test]
    fn membership_reports_changes() {
        let mut set = BTreeSet::new();
        let id = NationId::from("a");
        assert!(set_membership(&mut set, &id, true));
        assert!(!set_membership(&mut set, &id, true));
        assert!(set_membership(&mut set, &id, false));
        assert!(!set_membership(&mut set, &id, false));
    }
}
