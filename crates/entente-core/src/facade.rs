//! Player-facing diplomatic actions.
//!
//! [`DiplomacySystem`] composes the service primitives into the game's
//! actions: declaring war, the alliance request handshake, peace,
//! reputation, and paid sanctions. Each action runs in a single engine
//! transaction, so a caller never observes half of one. A rejection is a
//! [`DiplomacyError`] whose `Display` text is the reason shown to players.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use entente_diplomacy::pending::{self, incoming_token, outgoing_token};
use entente_diplomacy::reputation::{adjust_reputation, clamp_reputation, is_notable_change};
use entente_diplomacy::{DiplomacyError, Term, TransitionError, validate_transition};
use entente_types::{Expiry, NationId, RelationStatus, Sanction};

use crate::engine::Tx;
use crate::observer::DiplomacyEvent;
use crate::service::DiplomacyService;

const MILLIS_PER_MINUTE: i64 = 60_000;

/// The diplomatic actions available to nations.
#[derive(Debug, Clone)]
pub struct DiplomacySystem {
    service: Arc<DiplomacyService>,
}

impl DiplomacySystem {
    /// Build the facade over a shared service.
    pub const fn new(service: Arc<DiplomacyService>) -> Self {
        Self { service }
    }

    /// The underlying service.
    pub const fn service(&self) -> &Arc<DiplomacyService> {
        &self.service
    }

    /// `attacker` declares war on `defender`.
    ///
    /// Costs the configured war cost and starts the attacker's cooldown.
    /// Returns when the war lapses.
    pub fn declare_war(
        &self,
        attacker: &NationId,
        defender: &NationId,
    ) -> Result<Expiry, DiplomacyError> {
        self.service.transact(|tx| declare_war(tx, attacker, defender))
    }

    /// Whether two nations are at war.
    pub fn is_at_war(&self, a: &NationId, b: &NationId) -> bool {
        self.service.is_at_war(a, b)
    }

    /// `from` proposes an alliance to `to`.
    pub fn request_alliance(&self, from: &NationId, to: &NationId) -> Result<(), DiplomacyError> {
        self.service.transact(|tx| {
            tx.require_pair(from, to)?;
            match tx.status(from, to) {
                RelationStatus::Alliance => {
                    return Err(TransitionError::AlreadyInState(RelationStatus::Alliance).into());
                }
                RelationStatus::War => return Err(TransitionError::MustEndWarFirst.into()),
                RelationStatus::Ceasefire => return Err(DiplomacyError::CeasefireActive),
                RelationStatus::Neutral => {}
            }
            let mut requester = tx.nation(from)?;
            let mut recipient = tx.nation(to)?;
            if pending::has_outgoing(&requester, to) {
                return Err(DiplomacyError::RequestAlreadyPending(to.clone()));
            }

            requester.pending_alliance.insert(outgoing_token(to));
            recipient.pending_alliance.insert(incoming_token(from));
            tx.save_nation(&requester);
            tx.save_nation(&recipient);
            tx.emit(DiplomacyEvent::AllianceRequested {
                from: from.clone(),
                to: to.clone(),
            });
            info!(from = %from, to = %to, "Alliance requested");
            Ok(())
        })
    }

    /// `acceptor` accepts the pending request from `requester`.
    ///
    /// The request stays pending when the alliance is rejected, for
    /// example because a sanction is in force.
    pub fn accept_alliance(
        &self,
        acceptor: &NationId,
        requester: &NationId,
    ) -> Result<(), DiplomacyError> {
        self.service.transact(|tx| {
            let (accepting, _) = tx.require_pair(acceptor, requester)?;
            if !pending::has_incoming(&accepting, requester) {
                return Err(DiplomacyError::NoPendingRequest(requester.clone()));
            }

            tx.set_status(
                acceptor,
                requester,
                RelationStatus::Alliance,
                Term::Permanent,
                "acceptAlliance",
            )?;

            clear_request(tx, acceptor, requester);
            let acceptor_name = display_name(tx, acceptor);
            let requester_name = display_name(tx, requester);
            tx.append_history(acceptor, &format!("Alliance formed with {requester_name}"));
            tx.append_history(requester, &format!("Alliance formed with {acceptor_name}"));
            tx.emit(DiplomacyEvent::AllianceFormed {
                nation_a: acceptor.clone(),
                nation_b: requester.clone(),
            });
            Ok(())
        })
    }

    /// `refuser` turns down the pending request from `requester`.
    pub fn deny_alliance(
        &self,
        refuser: &NationId,
        requester: &NationId,
    ) -> Result<(), DiplomacyError> {
        self.service.transact(|tx| {
            let (refusing, _) = tx.require_pair(refuser, requester)?;
            if !pending::has_incoming(&refusing, requester) {
                return Err(DiplomacyError::NoPendingRequest(requester.clone()));
            }
            clear_request(tx, refuser, requester);
            tx.emit(DiplomacyEvent::AllianceDenied {
                from: requester.clone(),
                to: refuser.clone(),
            });
            info!(from = %requester, to = %refuser, "Alliance request denied");
            Ok(())
        })
    }

    /// `initiator` ends its alliance with `partner`.
    ///
    /// Both sides lose the configured reputation penalty toward each other.
    pub fn break_alliance(
        &self,
        initiator: &NationId,
        partner: &NationId,
    ) -> Result<(), DiplomacyError> {
        self.service.transact(|tx| {
            tx.require_pair(initiator, partner)?;
            if tx.status(initiator, partner) != RelationStatus::Alliance {
                return Err(DiplomacyError::NotAllied(initiator.clone(), partner.clone()));
            }
            tx.set_status(
                initiator,
                partner,
                RelationStatus::Neutral,
                Term::Default,
                "breakAlliance",
            )?;

            let penalty = tx.settings().alliance_break_penalty;
            for (id, other) in [(initiator, partner), (partner, initiator)] {
                let Ok(mut nation) = tx.nation(id) else {
                    continue;
                };
                let current = nation.reputation_toward(other);
                nation
                    .reputation
                    .insert(other.clone(), adjust_reputation(current, penalty.saturating_neg()));
                tx.save_nation(&nation);
            }

            let initiator_name = display_name(tx, initiator);
            let partner_name = display_name(tx, partner);
            tx.append_history(initiator, &format!("Alliance with {partner_name} broken"));
            tx.append_history(partner, &format!("Alliance broken by {initiator_name}"));
            tx.emit(DiplomacyEvent::AllianceBroken {
                initiator: initiator.clone(),
                partner: partner.clone(),
            });
            Ok(())
        })
    }

    /// Force the pair back to neutral, whatever their current status.
    pub fn declare_peace(&self, a: &NationId, b: &NationId) -> Result<(), DiplomacyError> {
        self.service.transact(|tx| {
            tx.set_status(a, b, RelationStatus::Neutral, Term::Default, "declarePeace")?;
            let a_name = display_name(tx, a);
            let b_name = display_name(tx, b);
            tx.append_history(a, &format!("Peace made with {b_name}"));
            tx.append_history(b, &format!("Peace made with {a_name}"));
            tx.emit(DiplomacyEvent::PeaceDeclared {
                nation_a: a.clone(),
                nation_b: b.clone(),
            });
            Ok(())
        })
    }

    /// Set `from`'s reputation toward `toward`, clamped to `[-100, 100]`.
    ///
    /// Returns the stored value.
    pub fn set_reputation(
        &self,
        from: &NationId,
        toward: &NationId,
        value: i32,
    ) -> Result<i32, DiplomacyError> {
        self.service.transact(|tx| {
            let (mut nation, _) = tx.require_pair(from, toward)?;
            let old = nation.reputation_toward(toward);
            let new = clamp_reputation(value);
            nation.reputation.insert(toward.clone(), new);
            tx.save_nation(&nation);

            if is_notable_change(old, new) {
                tx.emit(DiplomacyEvent::ReputationChanged {
                    from: from.clone(),
                    toward: toward.clone(),
                    old,
                    new,
                });
            }
            Ok(new)
        })
    }

    /// `sanctioner` pays `cost` to sanction `target` for `term`.
    pub fn impose_sanction(
        &self,
        sanctioner: &NationId,
        target: &NationId,
        cost: Decimal,
        term: Term,
    ) -> Result<Sanction, DiplomacyError> {
        self.service.transact(|tx| {
            if cost < Decimal::ZERO {
                return Err(DiplomacyError::InvalidCost(cost));
            }
            let payer = tx.nation(sanctioner)?;
            if payer.treasury < cost {
                return Err(DiplomacyError::InsufficientFunds {
                    required: cost,
                    available: payer.treasury,
                });
            }

            let sanction = tx.impose_sanction(sanctioner, target, term, "imposeSanction")?;

            if let Ok(mut payer) = tx.nation(sanctioner) {
                payer.treasury = payer.treasury.checked_sub(cost).unwrap_or(Decimal::ZERO);
                tx.save_nation(&payer);
            }
            let sanctioner_name = display_name(tx, sanctioner);
            tx.append_history(target, &format!("Sanctioned by {sanctioner_name}"));
            tx.emit(DiplomacyEvent::SanctionImposed {
                sanctioner: sanctioner.clone(),
                target: target.clone(),
            });
            Ok(sanction)
        })
    }

    /// `sanctioner` lifts its sanction on `target`.
    pub fn lift_sanction(
        &self,
        sanctioner: &NationId,
        target: &NationId,
    ) -> Result<Sanction, DiplomacyError> {
        self.service.lift_sanction(sanctioner, target)
    }
}

fn declare_war(
    tx: &mut Tx<'_>,
    attacker: &NationId,
    defender: &NationId,
) -> Result<Expiry, DiplomacyError> {
    tx.require_pair(attacker, defender)?;
    let current = tx.status(attacker, defender);
    validate_transition(current, RelationStatus::War, false)?;

    let now = tx.now();
    let cooldown_ms = tx.settings().war_cooldown.num_milliseconds();
    if let Some(&last) = tx.state.war_cooldowns.get(attacker) {
        let remaining = last.saturating_add(cooldown_ms).saturating_sub(now);
        if remaining > 0 {
            return Err(DiplomacyError::WarCooldown {
                remaining_minutes: minutes_rounded_up(remaining),
            });
        }
    }

    let cost = tx.settings().war_cost;
    let mut payer = tx.nation(attacker)?;
    let available = payer.treasury;
    let insufficient = DiplomacyError::InsufficientFunds {
        required: cost,
        available,
    };
    if available < cost {
        return Err(insufficient);
    }
    payer.treasury = available.checked_sub(cost).ok_or(insufficient)?;
    tx.save_nation(&payer);

    let term = if tx.settings().advanced_war {
        Term::Permanent
    } else {
        Term::Default
    };
    let outcome = match tx.set_status(attacker, defender, RelationStatus::War, term, "declareWar") {
        Ok(outcome) => outcome,
        Err(err) => {
            refund(tx, attacker, cost);
            return Err(err);
        }
    };

    tx.state.war_cooldowns.insert(attacker.clone(), now);

    let attacker_name = display_name(tx, attacker);
    let defender_name = display_name(tx, defender);
    tx.append_history(attacker, &format!("War declared on {defender_name}"));
    tx.append_history(defender, &format!("War declared by {attacker_name}"));

    let expires_at = outcome
        .relation
        .map_or(Expiry::Permanent, |relation| relation.expires_at);
    tx.emit(DiplomacyEvent::WarDeclared {
        attacker: attacker.clone(),
        defender: defender.clone(),
        expires_at,
    });
    Ok(expires_at)
}

/// Give back a war cost after the relation store refused the war.
fn refund(tx: &Tx<'_>, attacker: &NationId, cost: Decimal) {
    match tx.nation(attacker) {
        Ok(mut nation) => {
            nation.treasury = nation.treasury.checked_add(cost).unwrap_or(Decimal::MAX);
            tx.save_nation(&nation);
        }
        Err(err) => warn!(nation = %attacker, error = %err, "Cannot refund war cost"),
    }
}

/// Drop the request tokens between `recipient` and `requester` on both sides.
fn clear_request(tx: &Tx<'_>, recipient: &NationId, requester: &NationId) {
    for (id, other) in [(recipient, requester), (requester, recipient)] {
        if let Ok(mut nation) = tx.nation(id) {
            if pending::forget(&mut nation, other) {
                tx.save_nation(&nation);
            }
        }
    }
}

fn display_name(tx: &Tx<'_>, id: &NationId) -> String {
    tx.nation(id)
        .ok()
        .map(|n| n.name)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| id.to_string())
}

fn minutes_rounded_up(millis: i64) -> i64 {
    let whole = millis.checked_div(MILLIS_PER_MINUTE).unwrap_or(0);
    if millis.checked_rem(MILLIS_PER_MINUTE).unwrap_or(0) > 0 {
        whole.saturating_add(1)
    } else {
        whole
    }
}
