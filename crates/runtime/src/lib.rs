//! Multi-client synchronization for deterministic battles.
//!
//! Every client runs its own [`battle_core::BattleEngine`]; consistency comes
//! from a shared order log and periodic checkpoints, never shared memory.
//!
//! Modules are organized by responsibility:
//! - [`transport`] defines the store contract and an in-memory store
//! - [`session`] drives one client: frames, polling, pre-act checks, reloads
//! - [`sync`] hashes, diffs and remembers checkpoints
//! - [`clock`] supplies time for poll scheduling
//! - [`config`] and [`error`] hold session settings and error types
pub mod clock;
pub mod config;
pub mod error;
pub mod session;
pub mod sync;
pub mod transport;

pub use clock::{Clock, ManualClock, PollSchedule, SystemClock};
pub use config::SessionConfig;
pub use error::{Result, SessionError, TransportError};
pub use session::{
    BattleSession, OrderNotifier, OrdersReady, SessionContext, SessionParams,
};
pub use sync::{
    CheckpointHistory, LocalCheckpoint, SyncReport, canonical_value, diff_states, diff_values,
    state_hash,
};
pub use transport::{
    BattleTransport, InMemoryTransport, OrderBatch, StoredSnapshot, TransportResult,
    stored_snapshot,
};
