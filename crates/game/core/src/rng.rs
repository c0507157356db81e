//! Deterministic random number generation.
//!
//! Every client runs its own copy of the battle, so any random choice (AI
//! target selection, for instance) must be a pure function of replicated
//! state. Seeds are derived from the battle seed, the tick, the acting unit,
//! and a per-decision context value.

/// Source of seeded randomness for AI decisions.
pub trait RngOracle: Send + Sync {
    /// One pseudo-random word per seed; equal seeds give equal words.
    fn next_u32(&self, seed: u64) -> u32;

    /// Random value in `[min, max]` inclusive.
    fn range(&self, seed: u64, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        let span = max - min + 1;
        min + (self.next_u32(seed) % span)
    }

    /// Picks one element of `items`, or `None` when empty.
    fn pick<'a, T>(&self, seed: u64, items: &'a [T]) -> Option<&'a T>
    where
        Self: Sized,
    {
        let last = u32::try_from(items.len().checked_sub(1)?).ok()?;
        items.get(self.range(seed, 0, last) as usize)
    }
}

/// PCG-XSH-RR generator: 64-bit state, 32-bit output.
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn pcg_step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn pcg_output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::pcg_output(Self::pcg_step(seed))
    }
}

/// Compute a decision seed from replicated battle state.
///
/// Use distinct `context` values when one decision needs several independent
/// rolls (e.g. `0` for the movement target, `1` for the ability target).
pub fn compute_seed(battle_seed: u64, tick: u64, unit: u32, context: u32) -> u64 {
    let mut hash = battle_seed;
    hash ^= tick.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= u64::from(unit).wrapping_mul(0x517cc1b727220a95);
    hash ^= u64::from(context).wrapping_mul(0x85ebca6b);

    // SplitMix-style avalanche
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_choice() {
        let rng = PcgRng;
        let items = [10, 20, 30, 40];
        let seed = compute_seed(42, 120, 3, 0);
        assert_eq!(rng.pick(seed, &items), rng.pick(seed, &items));
    }

    #[test]
    fn pick_from_empty_is_none() {
        let empty: [u8; 0] = [];
        assert_eq!(PcgRng.pick(7, &empty), None);
    }

    #[test]
    fn range_stays_in_bounds() {
        let rng = PcgRng;
        for tick in 0..200 {
            let v = rng.range(compute_seed(1, tick, 1, 1), 2, 5);
            assert!((2..=5).contains(&v));
        }
    }
}
