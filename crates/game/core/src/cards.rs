//! Per-player card piles cycling hand → exile → deck → hand.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::state::{AbilityId, PlayerId};

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum CardLocation {
    Hand,
    Deck,
    Exile,
}

/// Card template: how many copies of an ability card a player starts with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub id: String,
    pub ability: AbilityId,
    #[serde(default = "default_copies")]
    pub copies: u32,
}

fn default_copies() -> u32 {
    1
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardInstance {
    pub card_def_id: String,
    pub ability_id: AbilityId,
    pub location: CardLocation,
    /// Round boundaries spent in exile so far.
    pub exile_rounds: u32,
}

/// Every player's cards, in creation order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardPiles {
    players: BTreeMap<PlayerId, Vec<CardInstance>>,
}

impl CardPiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a player's cards in the deck and draws an opening hand.
    pub fn add_player(&mut self, player: PlayerId, definitions: &[CardDefinition], hand_size: usize) {
        let cards = definitions
            .iter()
            .flat_map(|definition| {
                (0..definition.copies).map(|_| CardInstance {
                    card_def_id: definition.id.clone(),
                    ability_id: definition.ability.clone(),
                    location: CardLocation::Deck,
                    exile_rounds: 0,
                })
            })
            .collect();
        self.players.insert(player.clone(), cards);
        self.draw(&player, hand_size);
    }

    pub fn has_player(&self, player: &PlayerId) -> bool {
        self.players.contains_key(player)
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerId> {
        self.players.keys()
    }

    pub fn cards(&self, player: &PlayerId) -> &[CardInstance] {
        self.players.get(player).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn in_location(
        &self,
        player: &PlayerId,
        location: CardLocation,
    ) -> impl Iterator<Item = &CardInstance> {
        self.cards(player)
            .iter()
            .filter(move |card| card.location == location)
    }

    pub fn hand_len(&self, player: &PlayerId) -> usize {
        self.in_location(player, CardLocation::Hand).count()
    }

    pub fn has_in_hand(&self, player: &PlayerId, ability: &AbilityId) -> bool {
        self.in_location(player, CardLocation::Hand)
            .any(|card| &card.ability_id == ability)
    }

    /// Moves the first matching hand card to exile. Returns whether one moved.
    pub fn exile_from_hand(&mut self, player: &PlayerId, ability: &AbilityId) -> bool {
        let Some(card) = self.players.get_mut(player).and_then(|cards| {
            cards
                .iter_mut()
                .find(|card| card.location == CardLocation::Hand && &card.ability_id == ability)
        }) else {
            return false;
        };
        card.location = CardLocation::Exile;
        card.exile_rounds = 0;
        true
    }

    /// Draws deck cards in list order until the hand holds `hand_size`.
    pub fn draw(&mut self, player: &PlayerId, hand_size: usize) -> usize {
        let Some(cards) = self.players.get_mut(player) else {
            return 0;
        };
        let mut in_hand = cards
            .iter()
            .filter(|card| card.location == CardLocation::Hand)
            .count();
        let mut drawn = 0;
        for card in cards.iter_mut() {
            if in_hand >= hand_size {
                break;
            }
            if card.location == CardLocation::Deck {
                card.location = CardLocation::Hand;
                in_hand += 1;
                drawn += 1;
            }
        }
        drawn
    }

    /// Round-boundary processing for every player.
    ///
    /// Exiled cards age by one round and return to the deck once they have
    /// spent `recharge_turns(ability)` rounds in exile; hands are then
    /// replenished to `hand_size`.
    pub fn end_round(&mut self, recharge_turns: impl Fn(&AbilityId) -> u32, hand_size: usize) {
        for cards in self.players.values_mut() {
            for card in cards
                .iter_mut()
                .filter(|card| card.location == CardLocation::Exile)
            {
                card.exile_rounds += 1;
                if card.exile_rounds >= recharge_turns(&card.ability_id) {
                    card.location = CardLocation::Deck;
                    card.exile_rounds = 0;
                }
            }
        }

        let players: Vec<PlayerId> = self.players.keys().cloned().collect();
        for player in &players {
            self.draw(player, hand_size);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> PlayerId {
        PlayerId::new("alice")
    }

    fn piles(copies: u32) -> CardPiles {
        let mut piles = CardPiles::new();
        piles.add_player(
            alice(),
            &[
                CardDefinition {
                    id: "slash_card".into(),
                    ability: AbilityId::new("slash"),
                    copies,
                },
                CardDefinition {
                    id: "guard_card".into(),
                    ability: AbilityId::new("guard"),
                    copies,
                },
            ],
            4,
        );
        piles
    }

    #[test]
    fn opening_hand_is_capped() {
        let piles = piles(3);
        assert_eq!(piles.hand_len(&alice()), 4);
        assert_eq!(piles.in_location(&alice(), CardLocation::Deck).count(), 2);
    }

    #[test]
    fn exiled_card_returns_after_recharge_and_is_drawn() {
        let mut piles = piles(2);
        let slash = AbilityId::new("slash");
        assert!(piles.exile_from_hand(&alice(), &slash));
        assert_eq!(piles.hand_len(&alice()), 3);

        piles.end_round(|_| 1, 4);

        // Back in the deck after one boundary and immediately drawn again.
        assert_eq!(piles.in_location(&alice(), CardLocation::Exile).count(), 0);
        assert_eq!(piles.hand_len(&alice()), 4);
        assert!(piles.has_in_hand(&alice(), &slash));
    }

    #[test]
    fn longer_recharge_waits_extra_rounds() {
        let mut piles = piles(1);
        let guard = AbilityId::new("guard");
        assert!(piles.exile_from_hand(&alice(), &guard));

        piles.end_round(|_| 2, 4);
        assert!(!piles.has_in_hand(&alice(), &guard));
        assert_eq!(piles.in_location(&alice(), CardLocation::Exile).count(), 1);

        piles.end_round(|_| 2, 4);
        assert!(piles.has_in_hand(&alice(), &guard));
    }

    #[test]
    fn exile_requires_card_in_hand() {
        let mut piles = piles(1);
        assert!(!piles.exile_from_hand(&alice(), &AbilityId::new("fireball")));
        assert!(!piles.exile_from_hand(&PlayerId::new("bob"), &AbilityId::new("slash")));
    }
}
