//! Folding transfer events into the set of token ids a wallet holds.

use crate::events::TransferEvent;
use alloy_primitives::U256;
use std::collections::BTreeSet;

pub type TokenSet = BTreeSet<U256>;

// Outgoing sorts first so a self-transfer, reported by both queries at the
// same log position, leaves the token held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Direction {
    Outgoing,
    Incoming,
}

/// Adds incoming token ids and removes outgoing ones.
///
/// Both slices are merged and applied in `(block_number, log_index)` order, so
/// the last event in block order decides membership. When no token both leaves
/// and re-enters within one call this equals "add all incoming, then remove all
/// outgoing". Callers must feed successive calls in ascending block order.
pub fn apply(
    mut current: TokenSet,
    incoming: &[TransferEvent],
    outgoing: &[TransferEvent],
) -> TokenSet {
    let mut ordered: Vec<(&TransferEvent, Direction)> = incoming
        .iter()
        .map(|e| (e, Direction::Incoming))
        .chain(outgoing.iter().map(|e| (e, Direction::Outgoing)))
        .collect();
    ordered.sort_by_key(|(e, direction)| (e.block_number, e.log_index, *direction));

    for (event, direction) in ordered {
        match direction {
            Direction::Incoming => {
                current.insert(event.token_id);
            }
            Direction::Outgoing => {
                current.remove(&event.token_id);
            }
        }
    }

    current
}
