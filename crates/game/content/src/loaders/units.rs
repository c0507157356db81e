//! Character and enemy template loader.

use std::path::Path;

use battle_core::{
    AbilityId, AiRange, CardDefinition, PlayerId, Point, ResourceSpec, Team, UnitSpec,
};
use serde::{Deserialize, Serialize};

use crate::loaders::{read_file, LoadResult};

/// A spawnable unit type, shared by player characters and enemies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitTemplate {
    pub id: String,
    pub name: String,
    pub radius: f64,
    pub max_hp: f64,
    pub speed: f64,
    pub abilities: Vec<AbilityId>,
    #[serde(default)]
    pub resources: Vec<ResourceSpec>,
    #[serde(default)]
    pub ai_range: AiRange,
    #[serde(default)]
    pub initial_cooldown: f64,
    /// Starting cards for the controlling player. Ignored for enemies.
    #[serde(default)]
    pub cards: Vec<CardDefinition>,
}

impl UnitTemplate {
    pub fn spawn_spec(&self, position: Point, team: Team, owner: Option<PlayerId>) -> UnitSpec {
        UnitSpec {
            template: self.id.clone(),
            position,
            radius: self.radius,
            max_hp: self.max_hp,
            speed: self.speed,
            team,
            owner,
            abilities: self.abilities.clone(),
            resources: self.resources.clone(),
            ai_range: self.ai_range,
            initial_cooldown: self.initial_cooldown,
        }
    }
}

/// Loader for unit templates (`characters.ron`, `enemies.ron`).
pub struct UnitLoader;

impl UnitLoader {
    /// RON format: `Vec<UnitTemplate>`
    pub fn load(path: &Path) -> LoadResult<Vec<UnitTemplate>> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("{} ({})", e, path.display()))
    }

    pub fn parse(content: &str) -> LoadResult<Vec<UnitTemplate>> {
        let templates: Vec<UnitTemplate> = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse unit template RON: {}", e))?;

        for template in &templates {
            if template.max_hp <= 0.0 {
                anyhow::bail!("unit template '{}' must have positive max_hp", template.id);
            }
            if template.ai_range.min > template.ai_range.max {
                anyhow::bail!("unit template '{}' has an inverted ai_range", template.id);
            }
        }
        Ok(templates)
    }
}
