//! Read-only reporting.
//!
//! Every report is a typed, serializable snapshot taken under the engine
//! lock. Reports feed admin dashboards and chat commands; nothing here
//! changes state except the lazy eviction done by status reads.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use rust_decimal::Decimal;
use serde::Serialize;

use entente_diplomacy::DiplomacyError;
use entente_diplomacy::pending;
use entente_types::{DiplomaticStanding, Expiry, NationId, RelationStatus, SanctionSeverity};

use crate::service::DiplomacyService;

/// Treasury output lost per sanction received, in percent.
pub const SANCTION_IMPACT_PERCENT: i64 = -8;

/// Length of the leaderboards in [`GlobalSanctionStatistics`].
pub const LEADERBOARD_SIZE: usize = 10;

/// Diplomatic summary of one nation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NationStatistics {
    /// Size of the nation's ally set.
    pub allies: usize,
    /// Size of the nation's enemy set.
    pub enemies: usize,
    /// Incoming alliance requests awaiting an answer.
    pub pending_alliances: usize,
    /// Active wars in the relation store.
    pub active_wars: usize,
    /// Mean reputation toward other nations, two decimal places.
    pub average_reputation: Decimal,
}

/// World-wide diplomatic summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStatistics {
    /// Alliances, counted once per pair, from nation records.
    pub total_alliances: usize,
    /// Wars, counted once per pair, from nation records.
    pub total_war_relations: usize,
    /// Reputation entries across all nations.
    pub total_reputation_relations: usize,
    /// Known nations.
    pub total_nations: usize,
    /// Active wars in the relation store.
    pub active_wars: usize,
    /// Nations still on war-declaration cooldown.
    pub nations_on_war_cooldown: usize,
}

/// One war a nation is fighting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarRecord {
    /// The other side.
    pub opponent: NationId,
    /// When the war lapses.
    pub active_until: Expiry,
    /// Whole minutes left, `None` for a permanent war.
    pub minutes_remaining: Option<i64>,
}

/// Sanction summary of one nation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SanctionStatistics {
    /// Nations this one sanctions.
    pub imposed: Vec<NationId>,
    /// Nations sanctioning this one.
    pub targeted_by: Vec<NationId>,
    /// Estimated economic effect in percent (negative).
    pub economic_impact_percent: i64,
    /// Rating derived from the number of sanctions received.
    pub severity: SanctionSeverity,
}

/// A nation with a count, for leaderboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NationCount {
    /// The nation.
    pub nation: NationId,
    /// How many.
    pub count: usize,
}

/// World-wide sanction summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSanctionStatistics {
    /// Active sanctions.
    pub total_sanctions: usize,
    /// Distinct nations imposing at least one sanction.
    pub unique_sanctioners: usize,
    /// Distinct nations under at least one sanction.
    pub unique_targets: usize,
    /// Sanctions per sanctioning nation, two decimal places.
    pub average_per_sanctioner: Decimal,
    /// Nations imposing the most sanctions.
    pub top_sanctioners: Vec<NationCount>,
    /// Nations receiving the most sanctions.
    pub most_sanctioned: Vec<NationCount>,
    /// Pairs sanctioning each other.
    pub mutual_pairs: usize,
}

impl DiplomacyService {
    /// How `a` regards `b`.
    ///
    /// Active relations win; otherwise an enemy listing, otherwise a band
    /// of `a`'s reputation toward `b`.
    pub fn diplomatic_standing(
        &self,
        a: &NationId,
        b: &NationId,
    ) -> Result<DiplomaticStanding, DiplomacyError> {
        self.transact(|tx| {
            tx.require_pair(a, b)?;
            let standing = match tx.status(a, b) {
                RelationStatus::War => DiplomaticStanding::War,
                RelationStatus::Ceasefire => DiplomaticStanding::Ceasefire,
                RelationStatus::Alliance => DiplomaticStanding::Alliance,
                RelationStatus::Neutral => {
                    let nation = tx.nation(a)?;
                    if nation.enemies.contains(b) {
                        DiplomaticStanding::Enemy
                    } else {
                        DiplomaticStanding::from_reputation(nation.reputation_toward(b))
                    }
                }
            };
            Ok(standing)
        })
    }

    /// Nations allied with `id`.
    pub fn alliances(&self, id: &NationId) -> Vec<NationId> {
        self.transact(|tx| {
            tx.state
                .relations
                .relations_for(id, tx.now())
                .iter()
                .filter(|rel| rel.status == RelationStatus::Alliance)
                .filter_map(|rel| rel.counterpart(id).cloned())
                .collect()
        })
    }

    /// Nations that have asked `id` for an alliance.
    pub fn pending_alliance_requests(&self, id: &NationId) -> Vec<NationId> {
        self.nations()
            .get(id)
            .map_or_else(Vec::new, |nation| pending::incoming_requests(&nation))
    }

    /// Diplomatic summary of `id`, or `None` for an unknown nation.
    pub fn nation_statistics(&self, id: &NationId) -> Option<NationStatistics> {
        self.transact(|tx| {
            let nation = tx.nation(id).ok()?;
            let active_wars = tx
                .state
                .relations
                .count_for(id, RelationStatus::War, tx.now());
            let total: i64 = nation.reputation.values().map(|&v| i64::from(v)).sum();
            Some(NationStatistics {
                allies: nation.allies.len(),
                enemies: nation.enemies.len(),
                pending_alliances: pending::incoming_requests(&nation).len(),
                active_wars,
                average_reputation: average(total, nation.reputation.len()),
            })
        })
    }

    /// World-wide diplomatic summary.
    pub fn global_statistics(&self) -> GlobalStatistics {
        self.transact(|tx| {
            let nations = tx.nations().list();
            let ally_links: usize = nations.iter().map(|n| n.allies.len()).sum();
            let enemy_links: usize = nations.iter().map(|n| n.enemies.len()).sum();
            let reputation: usize = nations.iter().map(|n| n.reputation.len()).sum();

            let now = tx.now();
            let cooldown_ms = tx.settings().war_cooldown.num_milliseconds();
            let on_cooldown = tx
                .state
                .war_cooldowns
                .values()
                .filter(|&&last| last.saturating_add(cooldown_ms) > now)
                .count();

            GlobalStatistics {
                total_alliances: ally_links.checked_div(2).unwrap_or(0),
                total_war_relations: enemy_links.checked_div(2).unwrap_or(0),
                total_reputation_relations: reputation,
                total_nations: nations.len(),
                active_wars: tx.state.relations.count_by_status(RelationStatus::War, now),
                nations_on_war_cooldown: on_cooldown,
            }
        })
    }

    /// Wars `id` is currently fighting.
    pub fn war_history(&self, id: &NationId) -> Vec<WarRecord> {
        self.transact(|tx| {
            let now = tx.now();
            tx.state
                .relations
                .relations_for(id, now)
                .iter()
                .filter(|rel| rel.status == RelationStatus::War)
                .filter_map(|rel| {
                    Some(WarRecord {
                        opponent: rel.counterpart(id)?.clone(),
                        active_until: rel.expires_at,
                        minutes_remaining: rel
                            .expires_at
                            .remaining_millis(now)
                            .map(|ms| ms.checked_div(60_000).unwrap_or(0)),
                    })
                })
                .collect()
        })
    }

    /// Every nation reachable from `id` through alliances, excluding `id`.
    pub fn alliance_network(&self, id: &NationId) -> BTreeSet<NationId> {
        self.transact(|tx| {
            let links = tx.state.relations.links(tx.now());
            let mut seen = BTreeSet::new();
            let mut queue = VecDeque::from([id.clone()]);
            while let Some(current) = queue.pop_front() {
                for ally in links.allies_of(&current) {
                    if ally != *id && seen.insert(ally.clone()) {
                        queue.push_back(ally);
                    }
                }
            }
            seen
        })
    }

    /// Sanction summary of `id`.
    pub fn sanction_statistics(&self, id: &NationId) -> SanctionStatistics {
        self.transact(|tx| {
            let now = tx.now();
            let imposed = tx
                .state
                .sanctions
                .imposed_by(id, now)
                .into_iter()
                .map(|s| s.target_id)
                .collect();
            let targeted_by = tx.state.sanctions.sanctioning(id, now);
            let received = i64::try_from(targeted_by.len()).unwrap_or(i64::MAX);
            SanctionStatistics {
                imposed,
                economic_impact_percent: received.saturating_mul(SANCTION_IMPACT_PERCENT),
                severity: SanctionSeverity::from_count(targeted_by.len()),
                targeted_by,
            }
        })
    }

    /// World-wide sanction summary.
    pub fn global_sanction_statistics(&self) -> GlobalSanctionStatistics {
        self.transact(|tx| {
            let now = tx.now();
            let active = tx.state.sanctions.active(now);

            let mut by_sanctioner: BTreeMap<NationId, usize> = BTreeMap::new();
            let mut by_target: BTreeMap<NationId, usize> = BTreeMap::new();
            for sanction in &active {
                let imposed = by_sanctioner.entry(sanction.sanctioner_id.clone()).or_default();
                *imposed = imposed.saturating_add(1);
                let received = by_target.entry(sanction.target_id.clone()).or_default();
                *received = received.saturating_add(1);
            }

            let mutual_pairs = active
                .iter()
                .filter(|s| s.sanctioner_id < s.target_id)
                .filter(|s| {
                    tx.state
                        .sanctions
                        .is_sanctioned(&s.target_id, &s.sanctioner_id, now)
                })
                .count();

            let total = i64::try_from(active.len()).unwrap_or(i64::MAX);
            GlobalSanctionStatistics {
                total_sanctions: active.len(),
                unique_sanctioners: by_sanctioner.len(),
                unique_targets: by_target.len(),
                average_per_sanctioner: average(total, by_sanctioner.len()),
                top_sanctioners: leaderboard(by_sanctioner),
                most_sanctioned: leaderboard(by_target),
                mutual_pairs,
            }
        })
    }
}

/// `total / count` to two decimal places, zero when `count` is zero.
fn average(total: i64, count: usize) -> Decimal {
    Decimal::from(total)
        .checked_div(Decimal::from(count))
        .unwrap_or_default()
        .round_dp(2)
}

/// Highest counts first, ties by identifier, at most [`LEADERBOARD_SIZE`].
fn leaderboard(counts: BTreeMap<NationId, usize>) -> Vec<NationCount> {
    let mut entries: Vec<NationCount> = counts
        .into_iter()
        .map(|(nation, count)| NationCount { nation, count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.nation.cmp(&b.nation)));
    entries.truncate(LEADERBOARD_SIZE);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_handles_empty() {
        assert_eq!(average(0, 0), Decimal::ZERO);
        assert_eq!(average(10, 3), Decimal::new(333, 2));
    }

    #[test]
    fn leaderboard_orders_and_truncates() {
        let counts: BTreeMap<NationId, usize> = (0..12_usize)
            .map(|i| (NationId::new(format!("n{i:02}")), i % 3))
            .collect();
        let board = leaderboard(counts);
        assert_eq!(board.len(), LEADERBOARD_SIZE);
        assert_eq!(board.first().map(|e| e.count), Some(2));
        assert_eq!(board.first().map(|e| e.nation.as_str()), Some("n02"));
    }
}
