//! Pending alliance tokens.
//!
//! A request from A to B is recorded as `out:B` on A and `in:A` on B.
//! The tokens live on the nation records so they survive restarts.

use entente_types::{Nation, NationId};

const OUTGOING_PREFIX: &str = "out:";
const INCOMING_PREFIX: &str = "in:";

/// Token stored on the requester for a request sent to `target`.
pub fn outgoing_token(target: &NationId) -> String {
    format!("{OUTGOING_PREFIX}{target}")
}

/// Token stored on the recipient for a request received from `requester`.
pub fn incoming_token(requester: &NationId) -> String {
    format!("{INCOMING_PREFIX}{requester}")
}

/// Whether `nation` has sent a request to `target`.
pub fn has_outgoing(nation: &Nation, target: &NationId) -> bool {
    nation.pending_alliance.contains(&outgoing_token(target))
}

/// Whether `nation` has received a request from `requester`.
pub fn has_incoming(nation: &Nation, requester: &NationId) -> bool {
    nation.pending_alliance.contains(&incoming_token(requester))
}

/// Nations that have sent `nation` a request still awaiting an answer.
pub fn incoming_requests(nation: &Nation) -> Vec<NationId> {
    nation
        .pending_alliance
        .iter()
        .filter_map(|token| token.strip_prefix(INCOMING_PREFIX))
        .map(NationId::from)
        .collect()
}

/// Drop every token on `nation` that refers to `other`. Returns whether
/// anything was removed.
pub fn forget(nation: &mut Nation, other: &NationId) -> bool {
    let outgoing = outgoing_token(other);
    let incoming = incoming_token(other);
    let before = nation.pending_alliance.len();
    nation
        .pending_alliance
        .retain(|token| *token != outgoing && *token != incoming);
    nation.pending_alliance.len() != before
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn tokens_use_direction_prefixes() {
        let id = NationId::from("gondor");
        assert_eq!(outgoing_token(&id), "out:gondor");
        assert_eq!(incoming_token(&id), "in:gondor");
    }

    #[test]
    fn incoming_requests_only_lists_received() {
        let mut nation = Nation::new("rohan", "Rohan", Decimal::ZERO);
        nation.pending_alliance.insert(incoming_token(&NationId::from("gondor")));
        nation.pending_alliance.insert(outgoing_token(&NationId::from("shire")));

        assert_eq!(incoming_requests(&nation), vec![NationId::from("gondor")]);
        assert!(has_incoming(&nation, &NationId::from("gondor")));
        assert!(has_outgoing(&nation, &NationId::from("shire")));
    }

    #[test]
    fn forget_clears_both_directions() {
        let other = NationId::from("gondor");
        let mut nation = Nation::new("rohan", "Rohan", Decimal::ZERO);
        nation.pending_alliance.insert(incoming_token(&other));
        nation.pending_alliance.insert(outgoing_token(&other));

        assert!(forget(&mut nation, &other));
        assert!(nation.pending_alliance.is_empty());
        assert!(!forget(&mut nation, &other));
    }
}
