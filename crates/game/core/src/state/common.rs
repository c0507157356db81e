use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Unique identifier for any entity tracked by a simulation.
///
/// Identifiers are handed out by [`EntityIdAllocator`] and are never reused
/// for the lifetime of a battle.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Sequential entity id allocator owned by a single simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityIdAllocator {
    next: u32,
}

impl EntityIdAllocator {
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Resumes allocation from a previously serialized counter.
    pub const fn starting_at(next: u32) -> Self {
        Self { next }
    }

    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.wrapping_add(1).max(1);
        id
    }

    /// The id the next call to [`allocate`](Self::allocate) will return.
    pub const fn peek(&self) -> u32 {
        self.next
    }
}

impl Default for EntityIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Lobby-level player identifier. Supplied by the lobby layer at battle start.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Side a unit fights for. Units on different teams are enemies.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Team(pub u8);

impl Team {
    pub const PLAYERS: Self = Self(0);
    pub const ENEMIES: Self = Self(1);
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team {}", self.0)
    }
}

/// Registry key of an ability.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityId(pub String);

impl AbilityId {
    /// Reserved id meaning "end the turn without using an ability".
    pub const WAIT: &'static str = "wait";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn wait() -> Self {
        Self(Self::WAIT.to_owned())
    }

    pub fn is_wait(&self) -> bool {
        self.0 == Self::WAIT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AbilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AbilityId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for AbilityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Continuous world-space position or direction, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Point) -> f64 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or `None` for a zero-length vector.
    pub fn normalized(self) -> Option<Point> {
        let len = self.length();
        (len > f64::EPSILON).then(|| Point::new(self.x / len, self.y / len))
    }

    /// Moves from `self` toward `target` by at most `max_step` without passing it.
    pub fn move_toward(self, target: Point, max_step: f64) -> Point {
        let delta = target - self;
        let dist = delta.length();
        if dist <= max_step || dist <= f64::EPSILON {
            target
        } else {
            self + delta * (max_step / dist)
        }
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_never_repeats() {
        let mut ids = EntityIdAllocator::new();
        let a = ids.allocate();
        let b = ids.allocate();
        assert_ne!(a, b);
        assert_eq!(ids.peek(), 3);

        let mut resumed = EntityIdAllocator::starting_at(ids.peek());
        assert_eq!(resumed.allocate(), EntityId(3));
    }

    #[test]
    fn move_toward_never_overshoots() {
        let start = Point::new(0.0, 0.0);
        let target = Point::new(3.0, 4.0);
        assert_eq!(start.move_toward(target, 10.0), target);

        let mid = start.move_toward(target, 2.5);
        assert!((mid.distance(start) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn wait_is_reserved() {
        assert!(AbilityId::wait().is_wait());
        assert!(!AbilityId::new("slash").is_wait());
    }
}
