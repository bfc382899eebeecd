//! Pot partitioning and payout.
//!
//! Pots are cut at every distinct contribution level. Folded chips stay in
//! the pots they were paid into but folded seats are never eligible to win.
//! Odd chips from a split go one at a time to the tied winners in seat order
//! starting left of the button.

use crate::cards::Card;
use crate::evaluator::{EvalError, Evaluation, HandRanker};
use crate::game::HandResult;
use crate::hand::HoleCards;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One seat's chips in the pot at settlement time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contribution {
    pub seat: usize,
    pub amount: u64,
    pub folded: bool,
    pub hole: Option<HoleCards>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidePot {
    pub amount: u64,
    /// Seats that may win this pot, ascending.
    pub eligible: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub seat: usize,
    pub amount: u64,
}

/// Outcome of settling one hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub pots: Vec<SidePot>,
    /// Total chips won per seat, one entry per winning seat, ascending by seat.
    pub payouts: Vec<Payout>,
    /// Hand description for every seat that reached settlement unfolded.
    pub descriptions: Vec<(usize, String)>,
    /// Everyone else folded; no hands were compared.
    pub uncontested: bool,
}

impl Settlement {
    pub fn won_by(&self, seat: usize) -> u64 {
        self.payouts.iter().filter(|p| p.seat == seat).map(|p| p.amount).sum()
    }

    pub fn total(&self) -> u64 {
        self.payouts.iter().map(|p| p.amount).sum()
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettlementError {
    #[error("no unfolded seat to award the pot to")]
    NoContenders,
    #[error("seat {0} reached showdown without hole cards")]
    MissingHoleCards(usize),
    #[error("evaluating seat {seat}: {source}")]
    Evaluation {
        seat: usize,
        #[source]
        source: EvalError,
    },
}

/// Split contributions into pots by contribution level.
///
/// ```
/// use holdem_engine::pots::{side_pots, Contribution};
///
/// let c = |seat, amount| Contribution { seat, amount, folded: false, hole: None };
/// let pots = side_pots(&[c(0, 10), c(1, 10), c(2, 50)]);
/// assert_eq!(pots[0].amount, 30);
/// assert_eq!(pots[1].amount, 40);
/// assert_eq!(pots[1].eligible, vec![2]);
/// ```
pub fn side_pots(contributions: &[Contribution]) -> Vec<SidePot> {
    let mut levels: Vec<u64> = contributions.iter().map(|c| c.amount).filter(|&a| a > 0).collect();
    levels.sort_unstable();
    levels.dedup();

    let mut pots: Vec<SidePot> = Vec::new();
    let mut orphaned = 0u64;
    let mut prev = 0u64;
    for lvl in levels {
        let amount: u64 = contributions.iter().map(|c| c.amount.min(lvl) - c.amount.min(prev)).sum();
        prev = lvl;
        let mut eligible: Vec<usize> =
            contributions.iter().filter(|c| !c.folded && c.amount >= lvl).map(|c| c.seat).collect();
        eligible.sort_unstable();

        if eligible.is_empty() {
            // Chips above every live stake: fold into the pot below, or carry up.
            match pots.last_mut() {
                Some(last) => last.amount += amount,
                None => orphaned += amount,
            }
            continue;
        }
        let amount = amount + std::mem::take(&mut orphaned);
        match pots.last_mut() {
            Some(last) if last.eligible == eligible => last.amount += amount,
            _ => pots.push(SidePot { amount, eligible }),
        }
    }
    pots
}

/// Settle the hand: build the pots, rank every contender, and pay out.
///
/// `button` fixes the odd-chip order. With a single unfolded seat no hand is
/// evaluated and the board may be incomplete.
pub fn settle(
    contributions: &[Contribution],
    board: &[Card],
    button: usize,
    ranker: &dyn HandRanker,
) -> Result<Settlement, SettlementError> {
    let contenders: Vec<&Contribution> = contributions.iter().filter(|c| !c.folded).collect();
    let total: u64 = contributions.iter().map(|c| c.amount).sum();

    match contenders.as_slice() {
        [] => Err(SettlementError::NoContenders),
        [only] => {
            let payouts =
                if total > 0 { vec![Payout { seat: only.seat, amount: total }] } else { Vec::new() };
            Ok(Settlement {
                pots: side_pots(contributions),
                payouts,
                descriptions: vec![(only.seat, HandResult::UNCONTESTED.to_string())],
                uncontested: true,
            })
        }
        _ => settle_showdown(contributions, &contenders, board, button, ranker),
    }
}

fn settle_showdown(
    contributions: &[Contribution],
    contenders: &[&Contribution],
    board: &[Card],
    button: usize,
    ranker: &dyn HandRanker,
) -> Result<Settlement, SettlementError> {
    let mut evals: Vec<(usize, Evaluation)> = Vec::with_capacity(contenders.len());
    for c in contenders {
        let hole = c.hole.ok_or(SettlementError::MissingHoleCards(c.seat))?;
        let mut cards = hole.as_array().to_vec();
        cards.extend_from_slice(board);
        let eval =
            ranker.evaluate(&cards).map_err(|source| SettlementError::Evaluation { seat: c.seat, source })?;
        evals.push((c.seat, eval));
    }

    let seat_count = contributions.iter().map(|c| c.seat + 1).max().unwrap_or(0).max(1);
    let start = (button + 1) % seat_count;
    let pots = side_pots(contributions);
    let mut winnings: Vec<(usize, u64)> = Vec::new();

    for (i, pot) in pots.iter().enumerate() {
        let hands: Vec<(usize, Evaluation)> =
            evals.iter().copied().filter(|(seat, _)| pot.eligible.contains(seat)).collect();
        let strengths: Vec<Evaluation> = hands.iter().map(|(_, e)| *e).collect();
        let mut winners: Vec<usize> = ranker.winners(&strengths).into_iter().map(|k| hands[k].0).collect();
        if winners.is_empty() {
            continue;
        }
        winners.sort_by_key(|&seat| (seat + seat_count - start) % seat_count);

        let share = pot.amount / winners.len() as u64;
        let mut odd = pot.amount % winners.len() as u64;
        for &seat in &winners {
            let mut amount = share;
            if odd > 0 {
                amount += 1;
                odd -= 1;
            }
            match winnings.iter_mut().find(|(s, _)| *s == seat) {
                Some((_, won)) => *won += amount,
                None => winnings.push((seat, amount)),
            }
        }
        debug!(pot = i, amount = pot.amount, ?winners, "pot awarded");
    }

    winnings.sort_unstable_by_key(|&(seat, _)| seat);
    let payouts = winnings.into_iter().filter(|&(_, a)| a > 0).map(|(seat, amount)| Payout { seat, amount }).collect();
    let descriptions = evals.iter().map(|(seat, e)| (*seat, e.description().to_string())).collect();
    Ok(Settlement { pots, payouts, descriptions, uncontested: false })
}
