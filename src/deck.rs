use crate::cards::{Card, Rank, Suit};
use crate::rng::RandomSource;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeckError {
    /// Drawing past the last card. Only reachable through a sizing bug.
    #[error("attempted to draw from an empty deck")]
    Empty,
    #[error("duplicate card in deck: {0}")]
    DuplicateCard(Card),
}

/// A standard 52-card deck, consumed from the back.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// The 52 cards in canonical order (suit-major, ranks ascending).
    ///
    /// ```
    /// use holdem_engine::deck::Deck;
    ///
    /// let deck = Deck::build();
    /// assert_eq!(deck.len(), 52);
    /// ```
    pub fn build() -> Self {
        Self { cards: universe().collect() }
    }

    /// Build and shuffle in one step; one of these is made per hand.
    pub fn shuffled(rng: &mut dyn RandomSource) -> Self {
        let mut deck = Self::build();
        deck.shuffle(rng);
        deck
    }

    /// A deck in a caller-chosen order; the last card is drawn first.
    pub fn from_cards(cards: Vec<Card>) -> Result<Self, DeckError> {
        for (i, c) in cards.iter().enumerate() {
            if cards[..i].contains(c) {
                return Err(DeckError::DuplicateCard(*c));
            }
        }
        Ok(Self { cards })
    }

    /// The unseen-card pool: every card not in `known`.
    pub fn remaining_excluding(known: &[Card]) -> Self {
        Self { cards: universe().filter(|c| !known.contains(c)).collect() }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn as_slice(&self) -> &[Card] {
        &self.cards
    }

    /// In-place Fisher–Yates.
    pub fn shuffle(&mut self, rng: &mut dyn RandomSource) {
        shuffle_cards(&mut self.cards, rng);
    }

    /// Remove and return the last card.
    pub fn draw(&mut self) -> Result<Card, DeckError> {
        self.cards.pop().ok_or(DeckError::Empty)
    }

    /// Draw `n` cards; fails without partial effects if fewer remain.
    pub fn draw_n(&mut self, n: usize) -> Result<Vec<Card>, DeckError> {
        if n > self.cards.len() {
            return Err(DeckError::Empty);
        }
        let at = self.cards.len() - n;
        let mut drawn = self.cards.split_off(at);
        drawn.reverse();
        Ok(drawn)
    }
}

fn universe() -> impl Iterator<Item = Card> {
    Suit::ALL.into_iter().flat_map(|s| Rank::ALL.into_iter().map(move |r| Card::new(r, s)))
}

/// Fisher–Yates over any card slice.
pub(crate) fn shuffle_cards(cards: &mut [Card], rng: &mut dyn RandomSource) {
    shuffle_tail(cards, cards.len(), rng);
}

/// Partial Fisher–Yates: only the last `count` slots end up uniformly drawn
/// from the whole slice. The equity simulation draws its run-outs this way.
pub(crate) fn shuffle_tail(cards: &mut [Card], count: usize, rng: &mut dyn RandomSource) {
    let n = cards.len();
    let lo = n.saturating_sub(count).max(1);
    for i in (lo..n).rev() {
        let j = rng.next_index(i + 1);
        cards.swap(i, j);
    }
}
