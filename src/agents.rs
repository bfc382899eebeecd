//! Seat controllers.
//!
//! `PlayerAgent` is the trait a seat controller implements; `SeatTable`
//! holds one controller per seat and drives whichever one is on turn. The
//! host calls [`SeatTable::on_turn`] on every tick.

use crate::engine::GameEngine;
use crate::game::{Action, ActionError, HandEngine, Phase, SeatKind};
use crate::rng::RngSource;
use core::fmt;
use std::sync::Arc;

mod computer;
mod policy;

pub use computer::ComputerSeat;
pub use policy::{
    ActionEvs, Decision, DecisionContext, DecisionPolicy, DecisionReason, FixedFoldProbability, FoldModel,
    PolicyError, PotScaledFoldProbability,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum AgentKind {
    Human,
    Computer,
}

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum AgentError {
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// A seat controller that can act for a player when it is their turn.
pub trait PlayerAgent: fmt::Debug {
    /// Called whenever `seat` may be on turn. Returns whether an action was applied.
    fn on_turn(&mut self, engine: &mut dyn GameEngine, seat: usize) -> Result<bool, AgentError>;

    fn kind(&self) -> AgentKind {
        AgentKind::Human
    }

    /// Offer an action from outside; default is to ignore it.
    fn receive(&mut self, _action: Action) -> bool {
        false
    }
}

/// Holds at most one action submitted by a person and plays it on their turn.
#[derive(Debug, Default)]
pub struct HumanSeat {
    pending: Option<Action>,
}

impl HumanSeat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<Action> {
        self.pending
    }
}

impl PlayerAgent for HumanSeat {
    fn kind(&self) -> AgentKind {
        AgentKind::Human
    }

    fn receive(&mut self, action: Action) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(action);
        true
    }

    fn on_turn(&mut self, engine: &mut dyn GameEngine, seat: usize) -> Result<bool, AgentError> {
        if engine.phase() == Phase::Showdown {
            self.pending = None;
            return Ok(false);
        }
        if engine.turn() != seat {
            return Ok(false);
        }
        match self.pending.take() {
            Some(action) => engine.apply_action(seat, action).map(|_| true).map_err(AgentError::from),
            None => Ok(false),
        }
    }
}

/// One optional controller per seat.
pub struct SeatTable {
    seats: Vec<Option<Box<dyn PlayerAgent>>>,
}

impl fmt::Debug for SeatTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags: String = self
            .seats
            .iter()
            .map(|a| match a.as_deref().map(|ag| ag.kind()) {
                Some(AgentKind::Human) => 'H',
                Some(AgentKind::Computer) => 'C',
                None => '-',
            })
            .collect();
        write!(f, "SeatTable({flags})")
    }
}

impl SeatTable {
    pub fn for_seats(n: usize) -> Self {
        let mut seats = Vec::with_capacity(n);
        seats.resize_with(n, || None);
        Self { seats }
    }

    /// A controller for every seat at `engine`, chosen by its [`SeatKind`].
    ///
    /// Computer seats share one policy built from the table config and each
    /// get their own random stream: `seed + seat` when seeded, else entropy.
    pub fn for_engine(engine: &HandEngine, seed: Option<u64>) -> Self {
        let config = engine.config();
        let policy = Arc::new(DecisionPolicy::new(engine.ranker(), config.policy.clone()));
        let think = config.think_time(engine.seats().len());
        let mut table = Self::for_seats(engine.seats().len());
        for (i, seat) in engine.seats().iter().enumerate() {
            table.set_agent(i, Some(make_agent(seat.kind(), &policy, think, seed, i)));
        }
        table
    }

    /// Add controllers for seats that joined the engine since this table was built.
    pub fn sync_with(&mut self, engine: &HandEngine, seed: Option<u64>) {
        let n = engine.seats().len();
        if self.seats.len() >= n {
            return;
        }
        let config = engine.config();
        let policy = Arc::new(DecisionPolicy::new(engine.ranker(), config.policy.clone()));
        let think = config.think_time(n);
        for i in self.seats.len()..n {
            let agent = make_agent(engine.seats()[i].kind(), &policy, think, seed, i);
            self.set_agent(i, Some(agent));
        }
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Assign an agent to a seat (or remove when `None`).
    pub fn set_agent(&mut self, seat: usize, agent: Option<Box<dyn PlayerAgent>>) {
        if seat >= self.seats.len() {
            self.seats.resize_with(seat + 1, || None);
        }
        self.seats[seat] = agent;
    }

    pub fn agent_kind(&self, seat: usize) -> Option<AgentKind> {
        self.seats.get(seat).and_then(|a| a.as_deref().map(|ag| ag.kind()))
    }

    /// Send an action to a specific seat's agent, if any.
    pub fn receive(&mut self, seat: usize, action: Action) -> bool {
        match self.seats.get_mut(seat) {
            Some(Some(agent)) => agent.receive(action),
            _ => false,
        }
    }

    /// Drive the agent at the seat on turn, if any.
    pub fn on_turn(&mut self, engine: &mut dyn GameEngine) -> Result<bool, AgentError> {
        let seat = engine.turn();
        match self.seats.get_mut(seat) {
            Some(Some(agent)) => agent.on_turn(engine, seat),
            _ => Ok(false),
        }
    }
}

fn make_agent(
    kind: SeatKind,
    policy: &Arc<DecisionPolicy>,
    think: std::time::Duration,
    seed: Option<u64>,
    seat: usize,
) -> Box<dyn PlayerAgent> {
    match kind {
        SeatKind::Human => Box::new(HumanSeat::new()),
        SeatKind::Computer(level) => {
            let rng = match seed {
                Some(s) => RngSource::seeded(s.wrapping_add(seat as u64)),
                None => RngSource::from_entropy(),
            };
            Box::new(ComputerSeat::new(level, Arc::clone(policy), Box::new(rng)).with_think_time(think))
        }
    }
}
