use std::collections::VecDeque;

use battle_core::SerializedGameState;

/// A checkpoint this client produced itself.
#[derive(Clone, Debug)]
pub struct LocalCheckpoint {
    pub tick: u64,
    pub hash: String,
    pub state: Box<SerializedGameState>,
}

/// The most recent local checkpoints, oldest first.
#[derive(Clone, Debug)]
pub struct CheckpointHistory {
    depth: usize,
    entries: VecDeque<LocalCheckpoint>,
}

impl CheckpointHistory {
    pub fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        Self {
            depth,
            entries: VecDeque::with_capacity(depth),
        }
    }

    /// Records a checkpoint, replacing any entry at the same tick and
    /// dropping everything later than it.
    pub fn push(&mut self, checkpoint: LocalCheckpoint) {
        self.entries.retain(|entry| entry.tick < checkpoint.tick);
        self.entries.push_back(checkpoint);
        while self.entries.len() > self.depth {
            self.entries.pop_front();
        }
    }

    pub fn get(&self, tick: u64) -> Option<&LocalCheckpoint> {
        self.entries.iter().find(|entry| entry.tick == tick)
    }

    pub fn latest(&self) -> Option<&LocalCheckpoint> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocalCheckpoint> {
        self.entries.iter()
    }
}
