//! Ability catalog loader.

use std::path::Path;

use battle_core::AbilityRegistry;

use crate::abilities::ContentAbility;
use crate::loaders::{read_file, LoadResult};

/// Loader for the ability catalog (`abilities.ron`).
pub struct AbilityLoader;

impl AbilityLoader {
    /// Load ability definitions from a RON file.
    ///
    /// RON format: `Vec<ContentAbility>`
    pub fn load(path: &Path) -> LoadResult<Vec<ContentAbility>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<Vec<ContentAbility>> {
        ron::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse ability RON: {}", e))
    }

    /// Registers every definition. Duplicate ids and the reserved `wait` id fail.
    pub fn build_registry(abilities: Vec<ContentAbility>) -> LoadResult<AbilityRegistry> {
        let mut builder = AbilityRegistry::builder();
        for ability in abilities {
            if ability.descriptor.prefire_time < 0.0 {
                anyhow::bail!(
                    "ability '{}' has a negative prefire time",
                    ability.descriptor.id
                );
            }
            builder = builder.register(ability)?;
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_SLASHES: &str = r#"[
        (descriptor: (id: "slash", name: "Slash", cooldown: 1.0, targets: [unit], prefire_time: 0.2),
         effect: Strike(damage: 10.0)),
        (descriptor: (id: "slash", name: "Slash", cooldown: 1.0), effect: Mend(amount: 1.0)),
    ]"#;

    #[test]
    fn duplicate_ids_are_rejected() {
        let abilities = AbilityLoader::parse(TWO_SLASHES).expect("parses");
        assert_eq!(abilities.len(), 2);
        let err = AbilityLoader::build_registry(abilities).unwrap_err();
        assert!(err.to_string().contains("slash"));
    }

    #[test]
    fn omitted_prefire_means_an_instant_effect() {
        let abilities = AbilityLoader::parse(
            r#"[(descriptor: (id: "jab", name: "Jab", cooldown: 1.0, targets: [unit]),
                 effect: Strike(damage: 8.0))]"#,
        )
        .expect("parses");
        assert_eq!(abilities[0].descriptor.prefire_time, 0.0);

        let registry = AbilityLoader::build_registry(abilities).expect("registers");
        assert!(registry.contains(&battle_core::AbilityId::new("jab")));
    }
}
