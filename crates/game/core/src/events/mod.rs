//! Synchronous event bus used to decouple resources, cooldown effects and
//! death/turn notifications from the objects that trigger them.

mod bus;
mod types;

pub use bus::{EventBus, Subscription};
pub use types::{BattleEvent, Topic};
