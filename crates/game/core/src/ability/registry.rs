use std::collections::BTreeMap;
use std::sync::Arc;

use super::{Ability, AbilityDescriptor};
use crate::error::{ErrorSeverity, GameError};
use crate::state::AbilityId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("ability `{0}` registered twice")]
    Duplicate(AbilityId),

    #[error("ability id `{0}` is reserved")]
    Reserved(AbilityId),
}

impl GameError for RegistryError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Duplicate(_) => "REGISTRY_DUPLICATE",
            Self::Reserved(_) => "REGISTRY_RESERVED",
        }
    }
}

/// Immutable map from ability id to behaviour.
///
/// Built once per battle and shared (behind an `Arc`) by every engine
/// instance that simulates it.
#[derive(Debug, Default, Clone)]
pub struct AbilityRegistry {
    abilities: BTreeMap<AbilityId, Arc<dyn Ability>>,
}

impl AbilityRegistry {
    pub fn builder() -> AbilityRegistryBuilder {
        AbilityRegistryBuilder::default()
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &AbilityId) -> Option<&dyn Ability> {
        self.abilities.get(id).map(Arc::as_ref)
    }

    pub fn descriptor(&self, id: &AbilityId) -> Option<&AbilityDescriptor> {
        self.get(id).map(Ability::descriptor)
    }

    pub fn contains(&self, id: &AbilityId) -> bool {
        self.abilities.contains_key(id)
    }

    /// Known ability or the reserved wait sentinel.
    pub fn is_known(&self, id: &AbilityId) -> bool {
        id.is_wait() || self.contains(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &AbilityId> {
        self.abilities.keys()
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct AbilityRegistryBuilder {
    abilities: BTreeMap<AbilityId, Arc<dyn Ability>>,
}

impl AbilityRegistryBuilder {
    pub fn register(mut self, ability: impl Ability + 'static) -> Result<Self, RegistryError> {
        let id = ability.id().clone();
        if id.is_wait() {
            return Err(RegistryError::Reserved(id));
        }
        if self.abilities.contains_key(&id) {
            return Err(RegistryError::Duplicate(id));
        }
        self.abilities.insert(id, Arc::new(ability));
        Ok(self)
    }

    pub fn build(self) -> AbilityRegistry {
        AbilityRegistry {
            abilities: self.abilities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Strike;

    #[test]
    fn rejects_duplicates_and_wait() {
        let builder = AbilityRegistry::builder()
            .register(Strike::new("strike", 10.0))
            .expect("first registration");
        let err = builder.register(Strike::new("strike", 5.0)).unwrap_err();
        assert_eq!(err, RegistryError::Duplicate(AbilityId::new("strike")));

        let err = AbilityRegistry::builder()
            .register(Strike::new("wait", 1.0))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Reserved(_)));
    }

    #[test]
    fn wait_is_always_known() {
        let registry = AbilityRegistry::empty();
        assert!(registry.is_known(&AbilityId::wait()));
        assert!(!registry.is_known(&AbilityId::new("fireball")));
    }
}
