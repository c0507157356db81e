//! Canonical encoding and digest of serialized battle states.

use battle_core::SerializedGameState;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Fields that depend on what a particular client has received so far
/// rather than on the simulation itself.
const LOCAL_ONLY_FIELDS: [&str; 1] = ["pendingOrders"];

/// JSON form of `state` used for hashing and diffing.
///
/// Object keys come out sorted, so equal states encode to equal bytes.
pub fn canonical_value(state: &SerializedGameState) -> serde_json::Result<Value> {
    let mut value = state.to_json()?;
    if let Value::Object(fields) = &mut value {
        for field in LOCAL_ONLY_FIELDS {
            fields.remove(field);
        }
    }
    Ok(value)
}

/// SHA-256 of the canonical encoding, as lowercase hex.
pub fn state_hash(state: &SerializedGameState) -> serde_json::Result<String> {
    let bytes = serde_json::to_vec(&canonical_value(state)?)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

#[cfg(test)]
mod tests {
    use battle_core::{Order, TimedOrder};
    use battle_content::{BattleContent, CharacterSelection, ContentFactory};

    use super::*;

    fn fresh_state() -> SerializedGameState {
        let content = BattleContent::load(&ContentFactory::bundled(), "training_grounds")
            .expect("bundled content loads");
        content
            .new_battle(&[CharacterSelection::new("alice", "knight")], 7)
            .expect("battle builds")
            .serialize()
    }

    #[test]
    fn hash_is_stable_sha256_hex() {
        let state = fresh_state();
        let first = state_hash(&state).unwrap();
        let second = state_hash(&state.clone()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hash_ignores_orders_not_yet_applied() {
        let state = fresh_state();
        let mut received = state.clone();
        received.pending_orders.push(TimedOrder {
            tick: 120,
            seq: 0,
            order: Order::wait(state.units[0].id),
        });
        assert_eq!(state_hash(&state).unwrap(), state_hash(&received).unwrap());
    }

    #[test]
    fn hash_changes_with_simulation_fields() {
        let state = fresh_state();
        let mut moved = state.clone();
        moved.units[0].x += 1.0;
        assert_ne!(state_hash(&state).unwrap(), state_hash(&moved).unwrap());
    }
}
