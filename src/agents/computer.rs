use crate::engine::GameEngine;
use crate::game::{Action, Phase, SkillLevel};
use crate::rng::RandomSource;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use super::policy::DecisionPolicy;
use super::{AgentError, AgentKind, PlayerAgent};

/// Identifies one decision point; a pending action is stale once this changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TurnKey {
    hand: u64,
    phase: Phase,
    turn: usize,
    actions: u32,
}

impl TurnKey {
    fn of(engine: &dyn GameEngine) -> Self {
        Self {
            hand: engine.hand_number(),
            phase: engine.phase(),
            turn: engine.turn(),
            actions: engine.actions(),
        }
    }
}

#[derive(Debug)]
struct Pending {
    key: TurnKey,
    action: Action,
    ready_at: Instant,
}

/// A computer-controlled seat.
///
/// The first tick on its turn decides immediately and holds the action until
/// the think delay has passed; the time spent deciding counts toward the
/// delay. A held action is dropped once any action lands after it was decided.
pub struct ComputerSeat {
    level: SkillLevel,
    policy: Arc<DecisionPolicy>,
    rng: Box<dyn RandomSource + Send>,
    think: Duration,
    pending: Option<Pending>,
}

impl std::fmt::Debug for ComputerSeat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputerSeat")
            .field("level", &self.level)
            .field("think", &self.think)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl ComputerSeat {
    pub fn new(level: SkillLevel, policy: Arc<DecisionPolicy>, rng: Box<dyn RandomSource + Send>) -> Self {
        Self { level, policy, rng, think: Duration::ZERO, pending: None }
    }

    pub fn with_think_time(mut self, think: Duration) -> Self {
        self.think = think;
        self
    }

    pub fn level(&self) -> SkillLevel {
        self.level
    }

    pub fn is_thinking(&self) -> bool {
        self.pending.is_some()
    }
}

impl PlayerAgent for ComputerSeat {
    fn kind(&self) -> AgentKind {
        AgentKind::Computer
    }

    fn on_turn(&mut self, engine: &mut dyn GameEngine, seat: usize) -> Result<bool, AgentError> {
        if engine.phase() == Phase::Showdown || engine.turn() != seat {
            self.pending = None;
            return Ok(false);
        }
        let key = TurnKey::of(engine);
        let now = Instant::now();

        match self.pending.take() {
            Some(p) if p.key == key => {
                if now < p.ready_at {
                    self.pending = Some(p);
                    return Ok(false);
                }
                engine.apply_action(seat, p.action)?;
                return Ok(true);
            }
            Some(stale) => debug!(seat, key = ?stale.key, "dropping stale decision"),
            None => {}
        }

        let decision = self.policy.decide(&*engine, seat, self.level, self.rng.as_mut())?;
        debug!(
            seat,
            action = ?decision.action,
            reason = ?decision.reason,
            equity = ?decision.equity,
            "computer decision"
        );
        let ready_at = now + self.think;
        if Instant::now() >= ready_at {
            engine.apply_action(seat, decision.action)?;
            return Ok(true);
        }
        self.pending = Some(Pending { key, action: decision.action, ready_at });
        Ok(false)
    }
}
