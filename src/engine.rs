// Host-facing engine boundary. Seat controllers and front ends drive a hand
// through this trait so they never touch `HandEngine` internals. It is
// implemented for `HandEngine`.

use crate::game::{Action, ActionError, HandEngine, Phase};
use crate::hand::{Board, HoleCards};

pub trait GameEngine {
    // Mutation
    fn apply_action(&mut self, seat: usize, action: Action) -> Result<(), ActionError>;

    // Queries
    fn hand_number(&self) -> u64;
    fn phase(&self) -> Phase;
    fn turn(&self) -> usize;
    fn pot(&self) -> u64;
    fn current_bet(&self) -> u64;
    fn raise_count(&self) -> u32;
    /// Actions applied so far this hand.
    fn actions(&self) -> u32;
    fn raise_unit(&self) -> u64;
    fn to_call(&self, seat: usize) -> u64;
    fn hole_cards(&self, seat: usize) -> Option<HoleCards>;
    fn board(&self) -> &Board;
    fn stack(&self, seat: usize) -> u64;
    fn opponents_in_hand(&self, seat: usize) -> usize;
    fn num_seats(&self) -> usize;
}

impl GameEngine for HandEngine {
    fn apply_action(&mut self, seat: usize, action: Action) -> Result<(), ActionError> {
        HandEngine::apply_action(self, seat, action)
    }

    fn hand_number(&self) -> u64 {
        self.state.hand_number
    }
    fn phase(&self) -> Phase {
        self.state.phase
    }
    fn turn(&self) -> usize {
        self.state.turn
    }
    fn pot(&self) -> u64 {
        self.state.pot
    }
    fn current_bet(&self) -> u64 {
        self.state.current_bet
    }
    fn raise_count(&self) -> u32 {
        self.state.raise_count
    }
    fn actions(&self) -> u32 {
        self.state.actions
    }
    fn raise_unit(&self) -> u64 {
        self.config.raise_unit
    }
    fn to_call(&self, seat: usize) -> u64 {
        HandEngine::to_call(self, seat)
    }
    fn hole_cards(&self, seat: usize) -> Option<HoleCards> {
        HandEngine::hole_cards(self, seat)
    }
    fn board(&self) -> &Board {
        &self.state.board
    }
    fn stack(&self, seat: usize) -> u64 {
        self.seats.get(seat).map_or(0, |s| s.stack)
    }
    fn opponents_in_hand(&self, seat: usize) -> usize {
        HandEngine::opponents_in_hand(self, seat)
    }
    fn num_seats(&self) -> usize {
        self.seats.len()
    }
}
