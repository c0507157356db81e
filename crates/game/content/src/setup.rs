//! Fresh battles from character selections.

use std::collections::BTreeMap;
use std::sync::Arc;

use battle_core::{
    AbilityId, AbilityRegistry, BattleConfig, BattleEngine, CardDefinition, PlayerId,
    RestoreError, SerializedGameState, Team, TerrainGrid,
};
use serde::{Deserialize, Serialize};

use crate::loaders::{Arena, ContentFactory, LoadResult, UnitTemplate};

/// A player's pick, supplied by the lobby at battle start.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSelection {
    pub player: PlayerId,
    pub character: String,
}

impl CharacterSelection {
    pub fn new(player: impl Into<String>, character: impl Into<String>) -> Self {
        Self {
            player: PlayerId::new(player),
            character: character.into(),
        }
    }
}

/// Everything needed to start or restore battles in one arena.
#[derive(Debug, Clone)]
pub struct BattleContent {
    pub config: BattleConfig,
    pub registry: Arc<AbilityRegistry>,
    pub grid: Arc<TerrainGrid>,
    pub arena: Arena,
    pub characters: BTreeMap<String, UnitTemplate>,
    pub enemies: BTreeMap<String, UnitTemplate>,
}

impl BattleContent {
    /// Loads all content for `arena_name` and checks cross references.
    pub fn load(factory: &ContentFactory, arena_name: &str) -> LoadResult<Self> {
        let config = factory.load_config()?;
        let registry = factory.load_registry()?;
        let arena = factory.load_arena(arena_name)?;
        let characters = by_id(factory.load_characters()?);
        let enemies = by_id(factory.load_enemies()?);

        for template in characters.values().chain(enemies.values()) {
            let unknown = template
                .abilities
                .iter()
                .chain(template.cards.iter().map(|card| &card.ability))
                .find(|ability| !registry.contains(ability));
            if let Some(ability) = unknown {
                anyhow::bail!(
                    "unit template '{}' references unknown ability '{}'",
                    template.id,
                    ability
                );
            }
        }
        if let Some(placement) = arena
            .enemies
            .iter()
            .find(|placement| !enemies.contains_key(&placement.template))
        {
            anyhow::bail!(
                "arena '{}' places unknown enemy '{}'",
                arena.name,
                placement.template
            );
        }

        tracing::info!(
            arena = %arena.name,
            abilities = registry.len(),
            characters = characters.len(),
            enemies = enemies.len(),
            "content loaded"
        );

        Ok(Self {
            config,
            registry: Arc::new(registry),
            grid: Arc::new(arena.grid.clone()),
            arena,
            characters,
            enemies,
        })
    }

    /// Spawns the selected characters, gives their players cards, and places
    /// the arena's enemies.
    pub fn new_battle(&self, selections: &[CharacterSelection], seed: u64) -> LoadResult<BattleEngine> {
        if selections.len() > self.arena.player_spawns.len() {
            anyhow::bail!(
                "arena '{}' has {} player spawns, {} players selected",
                self.arena.name,
                self.arena.player_spawns.len(),
                selections.len()
            );
        }

        let mut engine = BattleEngine::new(
            self.config.clone(),
            Arc::clone(&self.registry),
            Arc::clone(&self.grid),
            seed,
        );

        for (selection, spawn) in selections.iter().zip(&self.arena.player_spawns) {
            if engine.cards().has_player(&selection.player) {
                anyhow::bail!("player '{}' selected more than once", selection.player);
            }
            let template = self.characters.get(&selection.character).ok_or_else(|| {
                anyhow::anyhow!("unknown character '{}'", selection.character)
            })?;

            engine.spawn_unit(template.spawn_spec(
                *spawn,
                Team::PLAYERS,
                Some(selection.player.clone()),
            ));
            engine.add_player_cards(selection.player.clone(), &starting_cards(template));
        }

        for placement in &self.arena.enemies {
            let template = self.enemies.get(&placement.template).ok_or_else(|| {
                anyhow::anyhow!("unknown enemy '{}'", placement.template)
            })?;
            engine.spawn_unit(template.spawn_spec(placement.position(), Team::ENEMIES, None));
        }

        tracing::info!(
            seed,
            players = selections.len(),
            units = engine.units().len(),
            "battle created"
        );
        Ok(engine)
    }

    /// Rebuilds an engine from a snapshot with this content's rules.
    pub fn restore(&self, state: &SerializedGameState) -> Result<BattleEngine, RestoreError> {
        BattleEngine::restore(
            self.config.clone(),
            Arc::clone(&self.registry),
            Arc::clone(&self.grid),
            state,
        )
    }
}

fn by_id(templates: Vec<UnitTemplate>) -> BTreeMap<String, UnitTemplate> {
    templates
        .into_iter()
        .map(|template| (template.id.clone(), template))
        .collect()
}

/// The template's card list, or one card per ability when it declares none.
fn starting_cards(template: &UnitTemplate) -> Vec<CardDefinition> {
    if !template.cards.is_empty() {
        return template.cards.clone();
    }
    template
        .abilities
        .iter()
        .map(|ability: &AbilityId| CardDefinition {
            id: format!("{}_card", ability),
            ability: ability.clone(),
            copies: 1,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::{CardLocation, Order, Point, ResolvedTarget, TimedOrder};

    fn content() -> BattleContent {
        BattleContent::load(&ContentFactory::bundled(), "training_grounds").expect("content loads")
    }

    #[test]
    fn selections_spawn_players_then_enemies() {
        let content = content();
        let engine = content
            .new_battle(
                &[
                    CharacterSelection::new("alice", "knight"),
                    CharacterSelection::new("bob", "mage"),
                ],
                7,
            )
            .expect("battle");

        let units = engine.units();
        assert_eq!(units.len(), 2 + content.arena.enemies.len());
        assert_eq!(units[0].template(), "knight");
        assert_eq!(units[1].owner(), Some(&PlayerId::new("bob")));
        assert!(units[2..].iter().all(|unit| unit.team() == Team::ENEMIES));

        let alice = PlayerId::new("alice");
        assert_eq!(engine.cards().hand_len(&alice), content.config.hand_size);
        assert_eq!(
            engine.cards().in_location(&alice, CardLocation::Deck).count(),
            1
        );
    }

    #[test]
    fn unknown_character_is_an_error() {
        let err = content()
            .new_battle(&[CharacterSelection::new("alice", "bard")], 1)
            .err()
            .expect("bard is not a character");
        assert!(err.to_string().contains("bard"));
    }

    #[test]
    fn same_player_twice_is_an_error() {
        let selections = [
            CharacterSelection::new("alice", "knight"),
            CharacterSelection::new("alice", "mage"),
        ];
        assert!(content().new_battle(&selections, 1).is_err());
    }

    #[test]
    fn fresh_battle_round_trips_through_restore() {
        let content = content();
        let engine = content
            .new_battle(&[CharacterSelection::new("alice", "ranger")], 3)
            .expect("battle");
        let restored = content.restore(&engine.serialize()).expect("restores");
        assert_eq!(restored.serialize(), engine.serialize());
    }

    /// A mage battle `ticks` after casting fireball, with the next turn's
    /// order already queued.
    fn mid_fireball(content: &BattleContent, ticks: u64) -> BattleEngine {
        let mut engine = content
            .new_battle(&[CharacterSelection::new("alice", "mage")], 5)
            .expect("battle");
        engine.run_until_paused(1_000);
        let mage = engine.waiting_for_orders().expect("mage pauses").unit_id;

        let aim = ResolvedTarget::pixel(Point::new(300.0, 192.0));
        let cast = engine
            .submit_order(Order::ability(mage, "fireball", vec![aim]))
            .expect("fireball card in hand");
        engine.queue_orders([TimedOrder {
            tick: cast.tick + 120,
            seq: 0,
            order: Order::wait(mage),
        }]);
        engine.run_until_paused(ticks);
        engine
    }

    #[test]
    fn battle_in_motion_round_trips_and_continues_identically() {
        let content = content();
        let alice = PlayerId::new("alice");

        for ticks in [45, 75] {
            let mut live = mid_fireball(&content, ticks);
            if ticks == 45 {
                assert!(live.effects().iter().any(|effect| effect.kind() == "fireball_lock"));
                assert!(
                    live.units()[0]
                        .active_abilities()
                        .iter()
                        .any(|active| active.ability.as_str() == "fireball")
                );
            } else {
                assert!(!live.projectiles().is_empty());
            }
            assert_eq!(live.cards().in_location(&alice, CardLocation::Exile).count(), 1);
            assert_eq!(live.pending_orders().len(), 1);

            let state = live.serialize();
            let json = state.to_json().expect("state encodes");
            let decoded = SerializedGameState::from_json(json).expect("state decodes");
            assert_eq!(decoded, state);

            let mut restored = content.restore(&decoded).expect("restores");
            assert_eq!(restored.serialize(), state);

            live.catch_up(1_000);
            restored.catch_up(1_000);
            assert!(restored.tick() > state.game_tick);
            assert_eq!(restored.serialize(), live.serialize());
        }
    }
}
