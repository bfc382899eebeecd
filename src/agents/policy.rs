use crate::config::PolicyConfig;
use crate::engine::GameEngine;
use crate::equity::{EquityError, EquityEstimator};
use crate::evaluator::HandRanker;
use crate::game::{Action, Phase, SkillLevel};
use crate::hand::{Board, HoleCards};
use crate::rng::RandomSource;
use core::fmt;
use std::sync::Arc;
use tracing::trace;

/// Chance that a single opponent folds to a raise.
pub trait FoldModel: fmt::Debug + Send + Sync {
    fn fold_probability(&self, raise: u64, pot: u64) -> f64;
}

/// The same fold chance whatever the bet size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedFoldProbability(pub f64);

impl FoldModel for FixedFoldProbability {
    fn fold_probability(&self, _raise: u64, _pot: u64) -> f64 {
        self.0
    }
}

/// Fold chance that grows with the raise relative to the pot, up to `cap`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PotScaledFoldProbability {
    pub base: f64,
    pub cap: f64,
}

impl Default for PotScaledFoldProbability {
    fn default() -> Self {
        Self { base: 0.15, cap: 0.6 }
    }
}

impl FoldModel for PotScaledFoldProbability {
    fn fold_probability(&self, raise: u64, pot: u64) -> f64 {
        (self.base + raise as f64 / (pot as f64 + 1.0)).min(self.cap)
    }
}

/// Everything a decision reads from the table, captured once per decision.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionContext {
    pub hole: HoleCards,
    pub board: Board,
    pub phase: Phase,
    pub pot: u64,
    /// Chips needed to call.
    pub cost: u64,
    pub current_bet: u64,
    pub raise_unit: u64,
    /// Unfolded seats besides the one deciding.
    pub opponents: usize,
    pub raise_count: u32,
}

impl DecisionContext {
    pub fn capture(engine: &dyn GameEngine, seat: usize) -> Option<Self> {
        Some(Self {
            hole: engine.hole_cards(seat)?,
            board: engine.board().clone(),
            phase: engine.phase(),
            pot: engine.pot(),
            cost: engine.to_call(seat),
            current_bet: engine.current_bet(),
            raise_unit: engine.raise_unit(),
            opponents: engine.opponents_in_hand(seat),
            raise_count: engine.raise_count(),
        })
    }

    fn raise_action(&self) -> Action {
        Action::Raise(self.current_bet + self.raise_unit)
    }

    /// Equity needed for a call to break even.
    pub fn pot_odds(&self) -> f64 {
        if self.cost == 0 {
            return 0.0;
        }
        self.cost as f64 / (self.pot + self.cost) as f64
    }
}

/// Expected chip outcome of each action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionEvs {
    pub fold: f64,
    pub call: f64,
    pub raise: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    /// Equity below pot odds; EVs never computed.
    PotOdds,
    /// Fold or call had the best EV.
    BestEv,
    /// Raise had the best EV but a random downgrade fired.
    Downgraded,
    /// Raise had the best EV but the hand already hit the raise cap.
    RaiseCap,
    /// Softmax draw between call and raise.
    Softmax,
    /// Novice random draw.
    Novice,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub action: Action,
    pub equity: Option<f64>,
    pub evs: Option<ActionEvs>,
    pub reason: DecisionReason,
}

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum PolicyError {
    #[error("seat {0} has no hole cards")]
    NoHoleCards(usize),
    #[error(transparent)]
    Equity(#[from] EquityError),
}

/// EV-guided action selection for computer seats.
#[derive(Debug)]
pub struct DecisionPolicy {
    estimator: EquityEstimator,
    fold_model: Box<dyn FoldModel>,
    config: PolicyConfig,
}

impl DecisionPolicy {
    pub fn new(ranker: Arc<dyn HandRanker>, config: PolicyConfig) -> Self {
        let fold_model = Box::new(FixedFoldProbability(config.fold_probability));
        Self { estimator: EquityEstimator::new(ranker, config.clone()), fold_model, config }
    }

    pub fn with_fold_model(mut self, model: impl FoldModel + 'static) -> Self {
        self.fold_model = Box::new(model);
        self
    }

    pub fn estimator(&self) -> &EquityEstimator {
        &self.estimator
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Pick an action for `seat`, which must be on turn in `engine`.
    pub fn decide(
        &self,
        engine: &dyn GameEngine,
        seat: usize,
        level: SkillLevel,
        rng: &mut dyn RandomSource,
    ) -> Result<Decision, PolicyError> {
        let ctx = DecisionContext::capture(engine, seat).ok_or(PolicyError::NoHoleCards(seat))?;
        match level {
            SkillLevel::Novice => Ok(self.novice(&ctx, rng)),
            SkillLevel::Standard => {
                let equity =
                    self.estimator.estimate(ctx.hole, &ctx.board, ctx.phase, ctx.raise_count, rng)?;
                Ok(self.choose(&ctx, equity, rng))
            }
        }
    }

    /// Random player: one uniform draw against two thresholds.
    pub fn novice(&self, ctx: &DecisionContext, rng: &mut dyn RandomSource) -> Decision {
        let r = rng.next_f64();
        let action = if r < self.config.novice_fold_below {
            Action::Fold
        } else if r < self.config.novice_raise_above {
            Action::Call
        } else {
            ctx.raise_action()
        };
        Decision { action, equity: None, evs: None, reason: DecisionReason::Novice }
    }

    /// Choose given an already adjusted `equity`.
    pub fn choose(&self, ctx: &DecisionContext, equity: f64, rng: &mut dyn RandomSource) -> Decision {
        let decision = |action, evs, reason| Decision { action, equity: Some(equity), evs, reason };

        if equity < ctx.pot_odds() {
            return decision(Action::Fold, None, DecisionReason::PotOdds);
        }
        let evs = self.evs(ctx, equity);
        trace!(equity, fold = evs.fold, call = evs.call, raise = evs.raise, "action evs");

        // Ties keep fold < call < raise order. Folding is never better than a free check.
        let mut best = (Action::Call, evs.call);
        if ctx.cost > 0 && evs.fold > best.1 {
            best = (Action::Fold, evs.fold);
        }
        if evs.raise > best.1 {
            best = (ctx.raise_action(), evs.raise);
        }
        let (top, _) = best;
        if !matches!(top, Action::Raise(_)) {
            return decision(top, Some(evs), DecisionReason::BestEv);
        }

        if rng.next_f64() < self.config.downgrade_probability {
            return decision(Action::Call, Some(evs), DecisionReason::Downgraded);
        }
        if ctx.raise_count >= self.config.raise_cap {
            return decision(Action::Call, Some(evs), DecisionReason::RaiseCap);
        }

        let action = softmax_pick(
            &[(Action::Call, evs.call), (ctx.raise_action(), evs.raise)],
            self.config.temperature,
            rng,
        );
        decision(action, Some(evs), DecisionReason::Softmax)
    }

    pub fn evs(&self, ctx: &DecisionContext, equity: f64) -> ActionEvs {
        let pot = ctx.pot as f64;
        let cost = ctx.cost as f64;
        let call = equity * (pot + cost) - (1.0 - equity) * cost;

        let raise_cost = cost + ctx.raise_unit as f64;
        let pot_after = pot + 2.0 * raise_cost;
        let per_opp = self.fold_model.fold_probability(ctx.raise_unit, ctx.pot);
        let mut fold_prob = per_opp.powi(ctx.opponents as i32);
        if ctx.phase == Phase::River {
            fold_prob *= self.config.river_fold_discount;
        }
        let reraise = (self.config.reraise_base + ctx.raise_unit as f64 / (pot + 1.0)).min(1.0);
        let penalty = reraise * raise_cost * self.config.reraise_penalty;
        let raise = fold_prob * pot
            + (1.0 - fold_prob) * (equity * pot_after - (1.0 - equity) * raise_cost)
            - penalty;

        ActionEvs { fold: 0.0, call, raise }
    }
}

/// One uniform draw against the cumulative `exp((ev - max) / temperature)` weights.
fn softmax_pick(candidates: &[(Action, f64)], temperature: f64, rng: &mut dyn RandomSource) -> Action {
    let max = candidates.iter().map(|&(_, ev)| ev).fold(f64::NEG_INFINITY, f64::max);
    let weights: Vec<f64> = candidates.iter().map(|&(_, ev)| ((ev - max) / temperature).exp()).collect();
    let sum: f64 = weights.iter().sum();
    let mut r = rng.next_f64() * sum;
    for (&(action, _), w) in candidates.iter().zip(&weights) {
        r -= w;
        if r <= 0.0 {
            return action;
        }
    }
    candidates[0].0
}
