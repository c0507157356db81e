//! Converting clicks into targets and validating them against requirements.

use super::descriptor::{ResolvedTarget, TargetKind};
use crate::entity::{Entity, Unit};
use crate::error::{ErrorSeverity, GameError};
use crate::state::{EntityId, Point};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TargetingError {
    #[error("no unit under {point}")]
    NoUnitAtPoint { point: Point },

    #[error("unit {unit} is not player controlled")]
    NotPlayerControlled { unit: EntityId },

    #[error("target {unit} is not a living unit")]
    UnknownUnit { unit: EntityId },

    #[error("expected {expected} targets, got {actual}")]
    WrongTargetCount { expected: usize, actual: usize },

    #[error("target {index} should be {expected}, got {actual}")]
    ShapeMismatch {
        index: usize,
        expected: TargetKind,
        actual: TargetKind,
    },

    #[error("all targets already selected")]
    SelectionComplete,
}

impl GameError for TargetingError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NoUnitAtPoint { .. } => "TARGET_NO_UNIT",
            Self::NotPlayerControlled { .. } => "TARGET_NOT_PLAYER",
            Self::UnknownUnit { .. } => "TARGET_UNKNOWN_UNIT",
            Self::WrongTargetCount { .. } => "TARGET_WRONG_COUNT",
            Self::ShapeMismatch { .. } => "TARGET_SHAPE_MISMATCH",
            Self::SelectionComplete => "TARGET_SELECTION_COMPLETE",
        }
    }
}

/// What a click landed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickCandidate {
    Unit(EntityId),
    Point(Point),
}

/// Stateless click resolver.
pub struct TargetResolver;

impl TargetResolver {
    /// Nearest living unit whose radius contains `click`, else the bare point.
    /// Ties go to the unit that comes first.
    pub fn candidate(click: Point, units: &[Unit]) -> ClickCandidate {
        units
            .iter()
            .filter(|unit| unit.is_active())
            .map(|unit| (unit, unit.position().distance(click)))
            .filter(|(unit, distance)| *distance <= unit.radius())
            .fold(None::<(&Unit, f64)>, |best, (unit, distance)| match best {
                Some((_, best_distance)) if best_distance <= distance => best,
                _ => Some((unit, distance)),
            })
            .map_or(ClickCandidate::Point(click), |(unit, _)| {
                ClickCandidate::Unit(unit.id())
            })
    }

    /// Resolves a click against one target requirement.
    pub fn resolve(
        required: TargetKind,
        click: Point,
        units: &[Unit],
    ) -> Result<ResolvedTarget, TargetingError> {
        match (required, Self::candidate(click, units)) {
            (TargetKind::Pixel, _) => Ok(ResolvedTarget::pixel(click)),
            (TargetKind::Unit, ClickCandidate::Unit(unit)) => Ok(ResolvedTarget::Unit { unit }),
            (TargetKind::Unit, ClickCandidate::Point(point))
            | (TargetKind::Player, ClickCandidate::Point(point)) => {
                Err(TargetingError::NoUnitAtPoint { point })
            }
            (TargetKind::Player, ClickCandidate::Unit(unit)) => {
                let controlled = units
                    .iter()
                    .any(|candidate| candidate.id() == unit && candidate.is_controllable());
                if controlled {
                    Ok(ResolvedTarget::Player { unit })
                } else {
                    Err(TargetingError::NotPlayerControlled { unit })
                }
            }
        }
    }
}

/// Checks a complete target list against an ability's requirements.
pub fn validate_targets(
    required: &[TargetKind],
    targets: &[ResolvedTarget],
    units: &[Unit],
) -> Result<(), TargetingError> {
    if required.len() != targets.len() {
        return Err(TargetingError::WrongTargetCount {
            expected: required.len(),
            actual: targets.len(),
        });
    }

    for (index, (expected, target)) in required.iter().zip(targets).enumerate() {
        if *expected != target.kind() {
            return Err(TargetingError::ShapeMismatch {
                index,
                expected: *expected,
                actual: target.kind(),
            });
        }

        let Some(unit_id) = target.unit() else {
            continue;
        };
        let unit = units
            .iter()
            .find(|unit| unit.id() == unit_id && unit.is_active())
            .ok_or(TargetingError::UnknownUnit { unit: unit_id })?;
        if *expected == TargetKind::Player && !unit.is_controllable() {
            return Err(TargetingError::NotPlayerControlled { unit: unit_id });
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionProgress {
    NeedMore(TargetKind),
    Complete,
}

/// Click-by-click collection of an ability's ordered targets.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSelection {
    required: Vec<TargetKind>,
    collected: Vec<ResolvedTarget>,
}

impl TargetSelection {
    pub fn new(required: Vec<TargetKind>) -> Self {
        Self {
            required,
            collected: Vec::new(),
        }
    }

    pub fn progress(&self) -> SelectionProgress {
        self.required
            .get(self.collected.len())
            .map_or(SelectionProgress::Complete, |kind| {
                SelectionProgress::NeedMore(*kind)
            })
    }

    /// Resolves `click` against the next requirement. A rejected click leaves
    /// the selection unchanged.
    pub fn click(
        &mut self,
        click: Point,
        units: &[Unit],
    ) -> Result<SelectionProgress, TargetingError> {
        let SelectionProgress::NeedMore(kind) = self.progress() else {
            return Err(TargetingError::SelectionComplete);
        };
        let target = TargetResolver::resolve(kind, click, units)?;
        self.collected.push(target);
        Ok(self.progress())
    }

    /// Drops the most recent target.
    pub fn undo(&mut self) -> Option<ResolvedTarget> {
        self.collected.pop()
    }

    pub fn targets(&self) -> &[ResolvedTarget] {
        &self.collected
    }

    pub fn into_targets(self) -> Vec<ResolvedTarget> {
        self.collected
    }
}
