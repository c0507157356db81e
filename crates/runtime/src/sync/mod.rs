//! Divergence detection between a client and the authoritative store.
//!
//! - [`hash`] digests canonical state encodings
//! - [`diff`] lists differing field paths
//! - [`history`] keeps recent local checkpoints to compare against

pub mod diff;
pub mod hash;
pub mod history;

pub use diff::{diff_states, diff_values};
pub use hash::{canonical_value, state_hash};
pub use history::{CheckpointHistory, LocalCheckpoint};

/// Result of the pre-act comparison with the latest stored snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncReport {
    /// The stored snapshot matches the local checkpoint at its tick.
    InSync { tick: u64 },
    /// Nothing to compare against; the local state was kept.
    Unverified { reason: String },
    /// Local state was replaced by the stored snapshot and replayed forward.
    Reloaded { tick: u64, paths: Vec<String> },
}

impl SyncReport {
    pub fn is_reloaded(&self) -> bool {
        matches!(self, Self::Reloaded { .. })
    }
}
