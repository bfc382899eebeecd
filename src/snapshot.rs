//! Read-only views of the table for rendering and transport.
//!
//! A snapshot is an owned copy; it never aliases engine state. Taking two
//! snapshots with no mutation in between gives equal values.

use crate::cards::Card;
use crate::game::{ActionLabel, HandEngine, HandResult, Phase, SeatKind};
use crate::hand::HoleCards;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatSnapshot {
    pub id: u32,
    pub name: String,
    pub kind: SeatKind,
    pub stack: u64,
    pub bet: u64,
    pub contributed: u64,
    /// `None` when not dealt or hidden from the viewer.
    pub hole: Option<HoleCards>,
    pub folded: bool,
    pub all_in: bool,
    pub acted: bool,
    pub last_action: Option<ActionLabel>,
    pub result: Option<HandResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub hand_number: u64,
    pub phase: Phase,
    pub board: Vec<Card>,
    pub pot: u64,
    pub current_bet: u64,
    pub turn: usize,
    pub raise_count: u32,
    pub button: usize,
    pub small_blind_seat: Option<usize>,
    pub big_blind_seat: Option<usize>,
    pub seats: Vec<SeatSnapshot>,
}

impl HandEngine {
    /// Full view with every dealt hole card. For the host only.
    pub fn snapshot(&self) -> TableSnapshot {
        self.build_snapshot(|_| true)
    }

    /// What `viewer` may see: its own hole cards, plus unfolded hands once a
    /// contested showdown has revealed them. `None` gives a spectator view.
    pub fn snapshot_for(&self, viewer: Option<usize>) -> TableSnapshot {
        let revealed = self.state.revealed;
        self.build_snapshot(|i| Some(i) == viewer || (revealed && !self.seats[i].folded))
    }

    fn build_snapshot(&self, show: impl Fn(usize) -> bool) -> TableSnapshot {
        let st = &self.state;
        let seats = self
            .seats
            .iter()
            .enumerate()
            .map(|(i, s)| SeatSnapshot {
                id: s.id,
                name: s.name.clone(),
                kind: s.kind,
                stack: s.stack,
                bet: s.bet,
                contributed: s.contributed,
                hole: if show(i) { s.hole } else { None },
                folded: s.folded,
                all_in: s.is_all_in(),
                acted: s.acted,
                last_action: s.last_action,
                result: s.result.clone(),
            })
            .collect();
        TableSnapshot {
            hand_number: st.hand_number,
            phase: st.phase,
            board: st.board.as_slice().to_vec(),
            pot: st.pot,
            current_bet: st.current_bet,
            turn: st.turn,
            raise_count: st.raise_count,
            button: st.button,
            small_blind_seat: st.small_blind_seat,
            big_blind_seat: st.big_blind_seat,
            seats,
        }
    }
}
