//! Hand ranking.
//!
//! The engine only needs two capabilities from a ranker: a totally ordered
//! strength for 5–7 cards, and the set of maximal hands among several. Both
//! live behind [`HandRanker`]; [`StandardRanker`] is the bundled
//! implementation.

use crate::cards::{Card, Rank};
use core::cmp::Ordering;
use std::fmt;

/// Compact, comparable hand strength. Higher is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandValue(u64);

impl HandValue {
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Pack a category and up to five rank tiebreakers.
    fn from_parts(category: Category, ranks_desc: &[u8]) -> Self {
        // [ category (8 bits) | r0 (6) | r1 (6) | r2 (6) | r3 (6) | r4 (6) | 10 zero bits ]
        const CAT_SHIFT: u32 = 48;
        const RANK_STRIDE: u32 = 6;
        let mut v: u64 = (category as u64) << CAT_SHIFT;
        for (i, r) in ranks_desc.iter().take(5).enumerate() {
            let offset = CAT_SHIFT - RANK_STRIDE * (i as u32 + 1);
            v |= (*r as u64) << offset;
        }
        HandValue(v)
    }
}

/// Poker hand category from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
#[repr(u8)]
pub enum Category {
    HighCard = 0,
    Pair = 1,
    TwoPair = 2,
    ThreeOfAKind = 3,
    Straight = 4,
    Flush = 5,
    FullHouse = 6,
    FourOfAKind = 7,
    StraightFlush = 8,
}

impl Category {
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Display name used for showdown results.
    pub const fn description(self) -> &'static str {
        match self {
            Category::HighCard => "High Card",
            Category::Pair => "Pair",
            Category::TwoPair => "Two Pair",
            Category::ThreeOfAKind => "Three of a Kind",
            Category::Straight => "Straight",
            Category::Flush => "Flush",
            Category::FullHouse => "Full House",
            Category::FourOfAKind => "Four of a Kind",
            Category::StraightFlush => "Straight Flush",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Evaluation result. Ordering and equality follow `value` only.
#[derive(Debug, Clone, Copy)]
pub struct Evaluation {
    pub category: Category,
    value: HandValue,
}

impl Evaluation {
    pub const fn value(&self) -> HandValue {
        self.value
    }

    pub fn description(&self) -> &'static str {
        self.category.description()
    }
}

impl Ord for Evaluation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl PartialOrd for Evaluation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Evaluation {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Evaluation {}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EvalError {
    #[error("expected 5 to 7 cards, got {0}")]
    CardCount(usize),
}

/// Capability consumed by settlement and the equity simulation.
pub trait HandRanker: fmt::Debug + Send + Sync {
    /// Strength of the best five-card hand within 5–7 cards.
    fn evaluate(&self, cards: &[Card]) -> Result<Evaluation, EvalError>;

    /// Indices of every hand sharing the maximal strength.
    fn winners(&self, hands: &[Evaluation]) -> Vec<usize> {
        let Some(best) = hands.iter().max() else {
            return Vec::new();
        };
        hands.iter().enumerate().filter(|(_, h)| *h == best).map(|(i, _)| i).collect()
    }
}

/// Exhaustive best-of-combinations ranker.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRanker;

impl HandRanker for StandardRanker {
    fn evaluate(&self, cards: &[Card]) -> Result<Evaluation, EvalError> {
        evaluate_best(cards)
    }
}

/// Best evaluation among every five-card subset of `cards`.
///
/// ```
/// use holdem_engine::cards::parse_cards;
/// use holdem_engine::evaluator::{evaluate_best, Category};
///
/// let cards = parse_cards("As Ah Qc Jd 9h 3s 2c").unwrap();
/// assert_eq!(evaluate_best(&cards).unwrap().category, Category::Pair);
/// ```
pub fn evaluate_best(cards: &[Card]) -> Result<Evaluation, EvalError> {
    let n = cards.len();
    if !(5..=7).contains(&n) {
        return Err(EvalError::CardCount(n));
    }
    let mut best: Option<Evaluation> = None;
    for a in 0..n {
        for b in (a + 1)..n {
            for c in (b + 1)..n {
                for d in (c + 1)..n {
                    for e in (d + 1)..n {
                        let eval = evaluate_five(&[cards[a], cards[b], cards[c], cards[d], cards[e]]);
                        if best.map_or(true, |cur| eval > cur) {
                            best = Some(eval);
                        }
                    }
                }
            }
        }
    }
    best.ok_or(EvalError::CardCount(n))
}

/// Evaluate exactly five cards.
pub fn evaluate_five(cards: &[Card; 5]) -> Evaluation {
    let mut counts = [0u8; 15];
    let mut mask: u16 = 0;
    for c in cards {
        let v = c.rank().value();
        counts[v as usize] += 1;
        mask |= 1 << v;
    }
    let is_flush = cards.iter().all(|c| c.suit() == cards[0].suit());
    let straight_top = straight_top(mask);

    // (count, rank) groups, biggest group first, then highest rank
    let mut groups: Vec<(u8, u8)> =
        (2u8..=14).rev().filter(|&v| counts[v as usize] > 0).map(|v| (counts[v as usize], v)).collect();
    groups.sort_by(|a, b| b.cmp(a));
    let ranks: Vec<u8> = groups.iter().map(|&(_, v)| v).collect();

    let (category, tiebreak) = match (straight_top, is_flush, groups[0].0, groups.get(1).map(|g| g.0)) {
        (Some(top), true, _, _) => (Category::StraightFlush, vec![top]),
        (_, _, 4, _) => (Category::FourOfAKind, ranks),
        (_, _, 3, Some(2)) => (Category::FullHouse, ranks),
        (_, true, _, _) => (Category::Flush, ranks),
        (Some(top), false, _, _) => (Category::Straight, vec![top]),
        (_, _, 3, _) => (Category::ThreeOfAKind, ranks),
        (_, _, 2, Some(2)) => (Category::TwoPair, ranks),
        (_, _, 2, _) => (Category::Pair, ranks),
        _ => (Category::HighCard, ranks),
    };
    Evaluation { category, value: HandValue::from_parts(category, &tiebreak) }
}

fn straight_top(mask: u16) -> Option<u8> {
    const WHEEL: u16 = (1 << 14) | (1 << 2) | (1 << 3) | (1 << 4) | (1 << 5);
    for top in (6u8..=14).rev() {
        let run: u16 = 0b11111 << (top - 4);
        if mask & run == run {
            return Some(top);
        }
    }
    if mask & WHEEL == WHEEL {
        return Some(Rank::Five.value());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::parse_cards;

    fn five(s: &str) -> Evaluation {
        let cards = parse_cards(s).unwrap();
        evaluate_five(&[cards[0], cards[1], cards[2], cards[3], cards[4]])
    }

    #[test]
    fn evaluate_five_categories() {
        assert_eq!(five("As Ks Qs Js Ts").category, Category::StraightFlush);
        assert_eq!(five("Kc Kd Kh Ks 2s").category, Category::FourOfAKind);
        assert_eq!(five("Tc Td Th 2s 2h").category, Category::FullHouse);
        assert_eq!(five("Ah 9h 7h 3h 2h").category, Category::Flush);
        assert_eq!(five("Ac 2d 3h 4s 5c").category, Category::Straight);
        assert_eq!(five("Qc Qd Qh 9s 2c").category, Category::ThreeOfAKind);
        assert_eq!(five("Jc Jd 9c 9h 2s").category, Category::TwoPair);
        assert_eq!(five("Ah Ad Ts 9c 2d").category, Category::Pair);
        assert_eq!(five("Ah Kd 7s 5c 2d").category, Category::HighCard);
    }

    #[test]
    fn wheel_loses_to_six_high_straight() {
        assert!(five("Ac 2d 3h 4s 5c") < five("2d 3h 4s 5c 6d"));
    }

    #[test]
    fn kickers_break_ties() {
        assert!(five("Ah Ad Ks 9c 2d") > five("Ac As Qs 9d 2c"));
        assert_eq!(five("Ah Ad Ks 9c 2d"), five("Ac As Kd 9d 2c"));
        assert!(five("Kh Kd 2s 2c 3d") > five("Qh Qd Js Jc Ad"));
    }

    #[test]
    fn best_of_seven_and_card_count() {
        let cards = parse_cards("As Ah Ks Qs Js Ts 9s").unwrap();
        assert_eq!(evaluate_best(&cards).unwrap().category, Category::StraightFlush);
        let four = parse_cards("As Ah Ks Qs").unwrap();
        assert_eq!(evaluate_best(&four), Err(EvalError::CardCount(4)));
    }

    #[test]
    fn winners_include_ties() {
        let r = StandardRanker;
        let hands = [five("Ah Kd 7s 5c 2d"), five("Ac Kh 7d 5s 2c"), five("Qh Jd 7s 5c 2d")];
        assert_eq!(r.winners(&hands), vec![0, 1]);
        assert!(r.winners(&[]).is_empty());
    }

    #[test]
    fn description_names_category() {
        assert_eq!(five("Tc Td Th 2s 2h").description(), "Full House");
    }
}
