use crate::events::BattleEvent;

use super::{BattleEngine, BattleOutcome, EngineOutput, STEP_EPSILON};

/// Round and battle lifecycle for BattleEngine.
impl BattleEngine {
    /// Ends every round whose boundary the current time has reached.
    ///
    /// Round `r` ends once `time >= r * round_seconds`.
    pub(super) fn process_round_ends(&mut self) {
        let round_seconds = self.config.round_seconds;
        if round_seconds.is_nan() || round_seconds <= 0.0 {
            return;
        }

        while self.time() + STEP_EPSILON >= f64::from(self.round) * round_seconds {
            let round = self.round;
            let registry = &self.registry;
            self.cards.end_round(
                |ability| {
                    registry
                        .descriptor(ability)
                        .map_or(0, |descriptor| descriptor.recharge_turns)
                },
                self.config.hand_size,
            );

            tracing::info!(round, tick = self.tick, "round ended");
            self.world.bus.emit(&BattleEvent::RoundEnded { round });
            self.outputs.push(EngineOutput::RoundEnded { round });
            self.round += 1;
        }
    }

    /// Finishes the battle once at most one team has living units.
    pub(super) fn check_outcome(&mut self) -> bool {
        if self.outcome.is_some() {
            return true;
        }
        let teams = self.world.teams_alive();
        if teams.len() > 1 {
            return false;
        }

        let outcome = BattleOutcome {
            winner: teams.into_iter().next(),
            tick: self.tick,
        };
        tracing::info!(winner = ?outcome.winner, tick = self.tick, "battle ended");
        self.outcome = Some(outcome);
        self.waiting = None;
        self.outputs.push(EngineOutput::BattleEnded(outcome));
        true
    }
}
