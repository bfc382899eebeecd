//! Notifications queued by the engine for a presentation layer.
//!
//! Events pile up in emission order until drained with
//! [`HandEngine::take_events`](crate::game::HandEngine::take_events).

use crate::cards::Card;
use crate::game::{ActionLabel, Phase};
use crate::pots::Payout;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HandEvent {
    HandStarted { hand_number: u64, button: usize, small_blind_seat: usize, big_blind_seat: usize },
    ActionApplied { seat: usize, label: ActionLabel },
    PhaseAdvanced { phase: Phase, board: Vec<Card> },
    /// Everyone else folded.
    SingleWinner { seat: usize, amount: u64 },
    SettlementComplete { payouts: Vec<Payout> },
}
