//! Monte-Carlo equity against a single random opponent hand.

use crate::cards::Card;
use crate::config::PolicyConfig;
use crate::deck::{shuffle_tail, Deck};
use crate::evaluator::{EvalError, HandRanker};
use crate::game::Phase;
use crate::hand::{Board, HoleCards};
use crate::rng::RandomSource;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::trace;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct EquityCounts {
    pub win: u64,
    pub tie: u64,
    pub lose: u64,
}

impl EquityCounts {
    pub fn total(&self) -> u64 {
        self.win + self.tie + self.lose
    }

    /// Win plus half of ties, in `[0, 1]`.
    pub fn equity(&self) -> f64 {
        let t = self.total() as f64;
        if t == 0.0 {
            return 0.0;
        }
        (self.win as f64 + 0.5 * self.tie as f64) / t
    }

    fn record(&mut self, ord: Ordering) {
        match ord {
            Ordering::Greater => self.win += 1,
            Ordering::Equal => self.tie += 1,
            Ordering::Less => self.lose += 1,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EquityError {
    #[error("hole card {0} is also on the board")]
    DuplicateCard(Card),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Equity estimates for computer seats.
///
/// Stateless between calls apart from the shared ranker; the unseen-card
/// pool is built and dropped inside each call.
#[derive(Debug, Clone)]
pub struct EquityEstimator {
    ranker: Arc<dyn HandRanker>,
    config: PolicyConfig,
}

impl EquityEstimator {
    pub fn new(ranker: Arc<dyn HandRanker>, config: PolicyConfig) -> Self {
        Self { ranker, config }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Trials to run at `phase`.
    pub fn trials_for(&self, phase: Phase) -> usize {
        match phase {
            Phase::River | Phase::Showdown => self.config.trials_river,
            _ => self.config.trials_pre_river,
        }
    }

    /// Raw win/tie/loss tally over `trials` random run-outs.
    pub fn simulate(
        &self,
        hole: HoleCards,
        board: &Board,
        trials: usize,
        rng: &mut dyn RandomSource,
    ) -> Result<EquityCounts, EquityError> {
        if let Some(&dup) = board.as_slice().iter().find(|c| hole.contains(**c)) {
            return Err(EquityError::DuplicateCard(dup));
        }
        let mut known = hole.as_array().to_vec();
        known.extend_from_slice(board.as_slice());
        let mut pool: Vec<Card> = Deck::remaining_excluding(&known).as_slice().to_vec();

        let missing = board.missing();
        let need = 2 + missing;
        let mut hero = Vec::with_capacity(7);
        let mut villain = Vec::with_capacity(7);
        let mut counts = EquityCounts::default();

        for _ in 0..trials {
            shuffle_tail(&mut pool, need, rng);
            let drawn = &pool[pool.len() - need..];

            hero.clear();
            hero.extend_from_slice(&hole.as_array());
            hero.extend_from_slice(board.as_slice());
            hero.extend_from_slice(&drawn[2..]);

            villain.clear();
            villain.extend_from_slice(&drawn[..2]);
            villain.extend_from_slice(board.as_slice());
            villain.extend_from_slice(&drawn[2..]);

            let h = self.ranker.evaluate(&hero)?;
            let v = self.ranker.evaluate(&villain)?;
            counts.record(h.cmp(&v));
        }
        Ok(counts)
    }

    /// Adjusted equity for a decision at `phase` after `raise_count` raises.
    pub fn estimate(
        &self,
        hole: HoleCards,
        board: &Board,
        phase: Phase,
        raise_count: u32,
        rng: &mut dyn RandomSource,
    ) -> Result<f64, EquityError> {
        let counts = self.simulate(hole, board, self.trials_for(phase), rng)?;
        let adjusted = self.adjust(counts.equity(), phase, raise_count);
        trace!(%phase, raise_count, win = counts.win, tie = counts.tie, lose = counts.lose, adjusted, "equity estimate");
        Ok(adjusted)
    }

    /// Damp a raw win rate by street and compress it by betting aggression.
    ///
    /// `f·r·d / (1 − r + r·d)` with `f` the street damping and
    /// `d = 1 / (raise_count + 1)`.
    pub fn adjust(&self, raw: f64, phase: Phase, raise_count: u32) -> f64 {
        let street = match phase {
            Phase::Flop => self.config.flop_damping,
            Phase::Turn => self.config.turn_damping,
            _ => 1.0,
        };
        let d = 1.0 / (f64::from(raise_count) + 1.0);
        let denom = 1.0 - raw + raw * d;
        if denom <= 0.0 {
            return 0.0;
        }
        (street * raw * d / denom).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::StandardRanker;
    use crate::rng::RngSource;

    fn estimator() -> EquityEstimator {
        EquityEstimator::new(Arc::new(StandardRanker), PolicyConfig::default())
    }

    #[test]
    fn adjust_without_raises_only_damps_by_street() {
        let e = estimator();
        assert!((e.adjust(0.6, Phase::River, 0) - 0.6).abs() < 1e-12);
        assert!((e.adjust(0.6, Phase::Flop, 0) - 0.42).abs() < 1e-12);
        assert!((e.adjust(0.6, Phase::Turn, 0) - 0.51).abs() < 1e-12);
    }

    #[test]
    fn adjust_compresses_with_raises() {
        let e = estimator();
        // 0.5 * 0.5 / (0.5 + 0.25)
        assert!((e.adjust(0.5, Phase::Preflop, 1) - 1.0 / 3.0).abs() < 1e-12);
        assert!(e.adjust(0.8, Phase::River, 3) < e.adjust(0.8, Phase::River, 1));
        assert_eq!(e.adjust(0.0, Phase::River, 2), 0.0);
        assert!((e.adjust(1.0, Phase::River, 5) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn trial_schedule() {
        let e = estimator();
        assert_eq!(e.trials_for(Phase::Preflop), 800);
        assert_eq!(e.trials_for(Phase::Turn), 800);
        assert_eq!(e.trials_for(Phase::River), 3000);
    }

    #[test]
    fn river_nuts_always_win() {
        let e = estimator();
        let hole: HoleCards = "As Ks".parse().unwrap();
        let board: Board = "Qs Js Ts 2d 3c".parse().unwrap();
        let counts = e.simulate(hole, &board, 200, &mut RngSource::seeded(3)).unwrap();
        assert_eq!(counts.win, 200);
        assert_eq!(counts.equity(), 1.0);
    }

    #[test]
    fn board_plays_for_both_is_a_tie() {
        let e = estimator();
        let hole: HoleCards = "2c 3d".parse().unwrap();
        let board: Board = "As Ks Qs Js Ts".parse().unwrap();
        let counts = e.simulate(hole, &board, 100, &mut RngSource::seeded(3)).unwrap();
        assert_eq!(counts.tie, 100);
        assert!((counts.equity() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn seeded_simulation_is_reproducible() {
        let e = estimator();
        let hole: HoleCards = "9h 8h".parse().unwrap();
        let board: Board = "7h 2c Kd".parse().unwrap();
        let a = e.simulate(hole, &board, 300, &mut RngSource::seeded(9)).unwrap();
        let b = e.simulate(hole, &board, 300, &mut RngSource::seeded(9)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.total(), 300);
    }

    #[test]
    fn overlapping_hole_and_board_is_rejected() {
        let e = estimator();
        let hole: HoleCards = "As Kd".parse().unwrap();
        let board: Board = "As 2c 3d".parse().unwrap();
        let err = e.simulate(hole, &board, 10, &mut RngSource::seeded(1)).unwrap_err();
        assert!(matches!(err, EquityError::DuplicateCard(_)));
    }
}
