//! Ability descriptors, the immutable registry, targeting, and the context
//! time-phased effects run against.
//!
//! An ability is a value implementing [`Ability`]. While active it is invoked
//! once per tick with the elapsed-time window `(prev_time, current_time]` since
//! activation; one-shot sub-effects fire when a fixed threshold falls inside
//! that window (see [`crossed`]), so each fires exactly once however frames
//! are paced.

mod context;
mod descriptor;
mod registry;
mod targeting;

use std::fmt;

pub use context::EffectContext;
pub use descriptor::{
    AbilityDescriptor, AbilityState, AiRange, ResolvedTarget, ResourceCost, TargetKind,
};
pub use registry::{AbilityRegistry, AbilityRegistryBuilder, RegistryError};
pub use targeting::{
    validate_targets, ClickCandidate, SelectionProgress, TargetResolver, TargetSelection,
    TargetingError,
};

use crate::entity::Unit;
use crate::state::{AbilityId, EntityId};

/// Tolerance for comparing elapsed ability time against thresholds.
pub const TIME_EPSILON: f64 = 1e-9;

/// Behaviour of a registered ability.
pub trait Ability: Send + Sync + fmt::Debug {
    fn descriptor(&self) -> &AbilityDescriptor;

    fn id(&self) -> &AbilityId {
        &self.descriptor().id
    }

    /// Player-facing text. `caster` lets numbers reflect the caster's state.
    fn description(&self, caster: Option<&Unit>) -> String;

    /// Runs the part of the effect that falls in `(prev_time, current_time]`.
    fn apply(
        &self,
        ctx: &mut EffectContext<'_>,
        caster: EntityId,
        targets: &[ResolvedTarget],
        prev_time: f64,
        current_time: f64,
    );

    /// States imposed on the caster `elapsed` seconds after activation.
    fn states(&self, _elapsed: f64) -> Vec<AbilityState> {
        Vec::new()
    }

    /// Past prefire and no lingering state left.
    fn is_finished(&self, elapsed: f64) -> bool {
        elapsed + TIME_EPSILON >= self.descriptor().prefire_time && self.states(elapsed).is_empty()
    }
}

/// True when `threshold` lies in the window `(prev, current]`.
///
/// The first window after activation is closed at `0`, so a zero threshold
/// fires on the activation tick.
pub fn crossed(prev: f64, current: f64, threshold: f64) -> bool {
    let opened = prev < threshold - TIME_EPSILON || (prev <= 0.0 && threshold <= TIME_EPSILON);
    opened && current + TIME_EPSILON >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_fires_once_across_windows() {
        let dt = 1.0 / 60.0;
        let fired = (0..120)
            .filter(|step| {
                let prev = *step as f64 / 60.0;
                crossed(prev, prev + dt, 0.5)
            })
            .count();
        assert_eq!(fired, 1);
    }

    #[test]
    fn zero_threshold_fires_in_the_first_window_only() {
        let dt = 1.0 / 60.0;
        assert!(crossed(0.0, dt, 0.0));
        assert!(!crossed(dt, 2.0 * dt, 0.0));
    }

    #[test]
    fn boundary_belongs_to_earlier_window() {
        assert!(crossed(0.45, 0.5, 0.5));
        assert!(!crossed(0.5, 0.55, 0.5));
    }
}
