//! The hand state machine.
//!
//! [`HandEngine`] owns the seats and the per-hand [`HandState`] and is the
//! only writer of either. A hand moves `Preflop → Flop → Turn → River →
//! Showdown`; every transition happens inside [`HandEngine::init_hand`],
//! [`HandEngine::apply_action`] or [`HandEngine::advance_phase`].

use crate::cards::Card;
use crate::config::{ConfigError, TableConfig};
use crate::deck::{Deck, DeckError};
use crate::evaluator::{HandRanker, StandardRanker};
use crate::events::HandEvent;
use crate::hand::{Board, HoleCards};
use crate::pots::{self, Contribution, Settlement, SettlementError};
use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Most seats a 52-card deck can serve with two hole cards each and a full board.
pub const MAX_SEATS: usize = (52 - Board::MAX) / 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl Phase {
    /// Board cards revealed on entering the street after this one.
    const fn reveal_count(self) -> usize {
        match self {
            Phase::Preflop => 3,
            Phase::Flop | Phase::Turn => 1,
            Phase::River | Phase::Showdown => 0,
        }
    }

    pub const fn next(self) -> Phase {
        match self {
            Phase::Preflop => Phase::Flop,
            Phase::Flop => Phase::Turn,
            Phase::Turn => Phase::River,
            Phase::River | Phase::Showdown => Phase::Showdown,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Preflop => "preflop",
            Phase::Flop => "flop",
            Phase::Turn => "turn",
            Phase::River => "river",
            Phase::Showdown => "showdown",
        };
        f.write_str(s)
    }
}

/// How strong a computer seat plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    /// Random caller that never folds.
    Novice,
    /// Monte-Carlo equity with EV-ranked actions.
    Standard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "level")]
pub enum SeatKind {
    Human,
    Computer(SkillLevel),
}

/// A move by the seat on turn. `Raise` carries the raise-to total for the street.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "to")]
pub enum Action {
    Fold,
    Call,
    Raise(u64),
}

/// What a seat last did, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "label", content = "amount")]
pub enum ActionLabel {
    SmallBlind(u64),
    BigBlind(u64),
    Fold,
    Check,
    Call(u64),
    Raise(u64),
    AllIn(u64),
}

impl fmt::Display for ActionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionLabel::SmallBlind(v) => write!(f, "SB {v}"),
            ActionLabel::BigBlind(v) => write!(f, "BB {v}"),
            ActionLabel::Fold => f.write_str("Fold"),
            ActionLabel::Check => f.write_str("Check"),
            ActionLabel::Call(v) => write!(f, "Call {v}"),
            ActionLabel::Raise(v) => write!(f, "Raise to {v}"),
            ActionLabel::AllIn(v) => write!(f, "All-in {v}"),
        }
    }
}

/// Showdown outcome for one seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandResult {
    /// Hand description, or `"Uncontested"` when everyone else folded.
    pub description: String,
    pub won: u64,
}

impl HandResult {
    pub const UNCONTESTED: &'static str = "Uncontested";

    pub fn is_winner(&self) -> bool {
        self.won > 0
    }
}

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum EngineError {
    #[error("need at least two seats with chips, have {0}")]
    NotEnoughPlayers(usize),
    #[error("too many seats: {0} (max {max})", max = MAX_SEATS)]
    TooManySeats(usize),
    #[error("button index {0} is out of range")]
    InvalidButton(usize),
    #[error("a hand is already in progress")]
    HandInProgress,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Deck(#[from] DeckError),
    #[error(transparent)]
    Settlement(#[from] SettlementError),
}

/// Rejected actions. Apart from `Internal`, an error leaves the engine untouched.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ActionError {
    #[error("no hand in progress")]
    HandOver,
    #[error("seat {seat} acted out of turn (turn is {turn})")]
    NotYourTurn { seat: usize, turn: usize },
    #[error("seat {0} cannot act")]
    SeatCannotAct(usize),
    #[error("raise to {got} is below the minimum of {min}")]
    RaiseTooSmall { min: u64, got: u64 },
    #[error(transparent)]
    Internal(#[from] EngineError),
}

/// A player at the table. Stack and identity persist across hands; the rest
/// is reset by every `init_hand`.
#[derive(Debug, Clone)]
pub struct Seat {
    pub(crate) id: u32,
    pub(crate) name: String,
    pub(crate) kind: SeatKind,
    pub(crate) stack: u64,
    pub(crate) bet: u64,
    pub(crate) contributed: u64,
    pub(crate) hole: Option<HoleCards>,
    pub(crate) folded: bool,
    pub(crate) acted: bool,
    pub(crate) last_action: Option<ActionLabel>,
    pub(crate) result: Option<HandResult>,
}

impl Seat {
    pub fn new(id: u32, name: impl Into<String>, kind: SeatKind, stack: u64) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            stack,
            bet: 0,
            contributed: 0,
            hole: None,
            folded: false,
            acted: false,
            last_action: None,
            result: None,
        }
    }

    pub fn human(id: u32, name: impl Into<String>, stack: u64) -> Self {
        Self::new(id, name, SeatKind::Human, stack)
    }

    pub fn computer(id: u32, name: impl Into<String>, stack: u64, level: SkillLevel) -> Self {
        Self::new(id, name, SeatKind::Computer(level), stack)
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SeatKind {
        self.kind
    }

    pub fn stack(&self) -> u64 {
        self.stack
    }

    /// Chips put in on the current street.
    pub fn bet(&self) -> u64 {
        self.bet
    }

    /// Chips put in over the whole hand.
    pub fn contributed(&self) -> u64 {
        self.contributed
    }

    pub fn hole(&self) -> Option<HoleCards> {
        self.hole
    }

    pub fn folded(&self) -> bool {
        self.folded
    }

    pub fn acted(&self) -> bool {
        self.acted
    }

    pub fn is_all_in(&self) -> bool {
        !self.folded && self.stack == 0 && self.contributed > 0
    }

    pub fn last_action(&self) -> Option<ActionLabel> {
        self.last_action
    }

    pub fn result(&self) -> Option<&HandResult> {
        self.result.as_ref()
    }

    fn can_act(&self) -> bool {
        !self.folded && self.stack > 0
    }

    fn reset_for_hand(&mut self) {
        self.bet = 0;
        self.contributed = 0;
        self.hole = None;
        self.acted = false;
        self.last_action = None;
        self.result = None;
        self.folded = self.stack == 0;
    }

    /// Move up to `amount` from stack into the pot; returns what moved.
    fn commit(&mut self, amount: u64) -> u64 {
        let pay = self.stack.min(amount);
        self.stack -= pay;
        self.bet += pay;
        self.contributed += pay;
        pay
    }
}

/// Per-hand state. Rebuilt by every `init_hand`.
#[derive(Debug, Clone)]
pub struct HandState {
    pub(crate) hand_number: u64,
    pub(crate) phase: Phase,
    pub(crate) deck: Deck,
    pub(crate) board: Board,
    pub(crate) pot: u64,
    pub(crate) current_bet: u64,
    pub(crate) turn: usize,
    pub(crate) raise_count: u32,
    /// Actions applied so far this hand, blinds excluded.
    pub(crate) actions: u32,
    pub(crate) button: usize,
    pub(crate) small_blind_seat: Option<usize>,
    pub(crate) big_blind_seat: Option<usize>,
    /// Hole cards of live seats are public once a contested showdown ran.
    pub(crate) revealed: bool,
}

impl HandState {
    fn idle() -> Self {
        Self {
            hand_number: 0,
            phase: Phase::Showdown,
            deck: Deck::build(),
            board: Board::new(),
            pot: 0,
            current_bet: 0,
            turn: 0,
            raise_count: 0,
            actions: 0,
            button: 0,
            small_blind_seat: None,
            big_blind_seat: None,
            revealed: false,
        }
    }

    pub fn hand_number(&self) -> u64 {
        self.hand_number
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn pot(&self) -> u64 {
        self.pot
    }

    pub fn current_bet(&self) -> u64 {
        self.current_bet
    }

    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn raise_count(&self) -> u32 {
        self.raise_count
    }

    pub fn actions(&self) -> u32 {
        self.actions
    }

    pub fn button(&self) -> usize {
        self.button
    }

    pub fn small_blind_seat(&self) -> Option<usize> {
        self.small_blind_seat
    }

    pub fn big_blind_seat(&self) -> Option<usize> {
        self.big_blind_seat
    }
}

/// Owns the table and drives one hand at a time.
///
/// ```
/// use holdem_engine::config::TableConfig;
/// use holdem_engine::game::{Action, HandEngine, Phase, Seat, SkillLevel};
/// use holdem_engine::rng::RngSource;
///
/// let seats = vec![
///     Seat::human(1, "You", 1000),
///     Seat::computer(2, "CPU", 1000, SkillLevel::Standard),
/// ];
/// let mut engine = HandEngine::new(TableConfig::default(), seats).unwrap();
/// engine.init_hand(0, &mut RngSource::seeded(1)).unwrap();
/// let seat = engine.state().turn();
/// engine.apply_action(seat, Action::Fold).unwrap();
/// assert_eq!(engine.state().phase(), Phase::Showdown);
/// ```
#[derive(Debug)]
pub struct HandEngine {
    pub(crate) config: TableConfig,
    pub(crate) ranker: Arc<dyn HandRanker>,
    pub(crate) seats: Vec<Seat>,
    pub(crate) waiting: Vec<Seat>,
    pub(crate) state: HandState,
    pub(crate) events: Vec<HandEvent>,
    pub(crate) last_settlement: Option<Settlement>,
}

impl HandEngine {
    pub fn new(config: TableConfig, seats: Vec<Seat>) -> Result<Self, EngineError> {
        Self::with_ranker(config, seats, Arc::new(StandardRanker))
    }

    pub fn with_ranker(
        config: TableConfig,
        seats: Vec<Seat>,
        ranker: Arc<dyn HandRanker>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        if seats.len() > MAX_SEATS {
            return Err(EngineError::TooManySeats(seats.len()));
        }
        Ok(Self {
            config,
            ranker,
            seats,
            waiting: Vec::new(),
            state: HandState::idle(),
            events: Vec::new(),
            last_settlement: None,
        })
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn ranker(&self) -> Arc<dyn HandRanker> {
        Arc::clone(&self.ranker)
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn state(&self) -> &HandState {
        &self.state
    }

    /// Settlement of the most recently finished hand.
    pub fn last_settlement(&self) -> Option<&Settlement> {
        self.last_settlement.as_ref()
    }

    /// Drain queued notifications in emission order.
    pub fn take_events(&mut self) -> Vec<HandEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_hand_live(&self) -> bool {
        self.state.phase != Phase::Showdown
    }

    /// Queue a seat to join at the next `init_hand`.
    pub fn queue_seat(&mut self, seat: Seat) -> Result<(), EngineError> {
        let total = self.seats.len() + self.waiting.len() + 1;
        if total > MAX_SEATS {
            return Err(EngineError::TooManySeats(total));
        }
        self.waiting.push(seat);
        Ok(())
    }

    /// Rotate the button one seat and start the next hand.
    pub fn start_next_hand(&mut self, rng: &mut dyn RandomSource) -> Result<(), EngineError> {
        let n = self.seats.len() + self.waiting.len();
        let button = if self.state.hand_number == 0 || n == 0 {
            self.state.button
        } else {
            (self.state.button + 1) % n
        };
        self.init_hand(button, rng)
    }

    /// Shuffle a fresh deck, reset seats, deal, and post blinds.
    pub fn init_hand(&mut self, button: usize, rng: &mut dyn RandomSource) -> Result<(), EngineError> {
        let deck = Deck::shuffled(rng);
        self.init_hand_with_deck(button, deck)
    }

    /// As [`init_hand`](Self::init_hand) with a caller-ordered deck (replays, tests).
    pub fn init_hand_with_deck(&mut self, button: usize, deck: Deck) -> Result<(), EngineError> {
        if self.is_hand_live() {
            return Err(EngineError::HandInProgress);
        }
        let n = self.seats.len() + self.waiting.len();
        if button >= n {
            return Err(EngineError::InvalidButton(button));
        }
        let funded = self.seats.iter().chain(&self.waiting).filter(|s| s.stack > 0).count();
        if funded < 2 {
            return Err(EngineError::NotEnoughPlayers(funded));
        }
        // Checked before anything changes so a short deck never strands a live hand.
        if deck.len() < 2 * funded + Board::MAX {
            return Err(EngineError::Deck(DeckError::Empty));
        }
        self.seats.append(&mut self.waiting);

        let hand_number = self.state.hand_number + 1;
        self.state = HandState { hand_number, button, deck, ..HandState::idle() };
        self.state.phase = Phase::Preflop;
        self.last_settlement = None;
        for seat in &mut self.seats {
            seat.reset_for_hand();
        }
        self.deal_hole_cards()?;

        let (sb, bb) = self.blind_positions();
        let blinds = self.config.blinds;
        self.post_blind(sb, blinds.small, ActionLabel::SmallBlind);
        self.post_blind(bb, blinds.big, ActionLabel::BigBlind);
        self.state.small_blind_seat = Some(sb);
        self.state.big_blind_seat = Some(bb);
        self.state.current_bet = blinds.big;
        self.state.turn = self.next_matching(bb, false, Seat::can_act).unwrap_or(bb);

        info!(hand = hand_number, button, sb, bb, pot = self.state.pot, "hand started");
        self.events.push(HandEvent::HandStarted {
            hand_number,
            button,
            small_blind_seat: sb,
            big_blind_seat: bb,
        });

        // Blinds alone can leave nobody able to act.
        if self.round_complete() {
            self.advance_phase()?;
        }
        Ok(())
    }

    fn deal_hole_cards(&mut self) -> Result<(), DeckError> {
        let live: Vec<usize> = (0..self.seats.len()).filter(|&i| !self.seats[i].folded).collect();
        let mut firsts = Vec::with_capacity(live.len());
        for _ in &live {
            firsts.push(self.state.deck.draw()?);
        }
        for (&i, first) in live.iter().zip(firsts) {
            let second = self.state.deck.draw()?;
            // Distinct by construction: both came out of one deck.
            self.seats[i].hole = HoleCards::try_new(first, second).ok();
        }
        Ok(())
    }

    /// Heads-up the button posts the small blind; otherwise the two seats after it.
    fn blind_positions(&self) -> (usize, usize) {
        let live = self.seats.iter().filter(|s| !s.folded).count();
        let button = self.state.button;
        let sb = if live == 2 && !self.seats[button].folded {
            button
        } else {
            self.next_matching(button, false, |s| !s.folded).unwrap_or(button)
        };
        let bb = self.next_matching(sb, false, |s| !s.folded).unwrap_or(sb);
        (sb, bb)
    }

    fn post_blind(&mut self, idx: usize, amount: u64, label: fn(u64) -> ActionLabel) {
        let paid = self.seats[idx].commit(amount);
        self.state.pot += paid;
        self.seats[idx].last_action = Some(label(paid));
    }

    /// First seat satisfying `pred`, walking clockwise from `from`.
    fn next_matching(&self, from: usize, inclusive: bool, pred: impl Fn(&Seat) -> bool) -> Option<usize> {
        let n = self.seats.len();
        let start = if inclusive { 0 } else { 1 };
        (start..start + n).map(|k| (from + k) % n).find(|&i| pred(&self.seats[i]))
    }

    fn live_count(&self) -> usize {
        self.seats.iter().filter(|s| !s.folded).count()
    }

    /// Apply `action` for `seat`, then move the hand forward: settle if one
    /// seat is left, advance the street if betting is closed, otherwise pass
    /// the turn.
    ///
    /// Protocol violations return an error and change nothing. A raise the
    /// seat cannot fully fund puts the whole stack in as a call: the bet to
    /// match and the raise count stay where they were.
    pub fn apply_action(&mut self, seat: usize, action: Action) -> Result<(), ActionError> {
        if let Err(e) = self.check_action(seat, action) {
            debug!(seat, ?action, error = %e, "action rejected");
            return Err(e);
        }

        let label = match action {
            Action::Fold => {
                let s = &mut self.seats[seat];
                s.folded = true;
                ActionLabel::Fold
            }
            Action::Call => self.call(seat),
            Action::Raise(to) => {
                let need = to - self.seats[seat].bet;
                if need > self.seats[seat].stack {
                    debug!(seat, to, stack = self.seats[seat].stack, "raise underfunded, all-in call");
                    self.shove(seat)
                } else {
                    self.raise(seat, to, need)
                }
            }
        };
        self.state.actions += 1;
        let s = &mut self.seats[seat];
        s.acted = true;
        s.last_action = Some(label);
        debug!(seat, %label, pot = self.state.pot, "action applied");
        self.events.push(HandEvent::ActionApplied { seat, label });

        self.progress().map_err(ActionError::from)
    }

    fn check_action(&self, seat: usize, action: Action) -> Result<(), ActionError> {
        if !self.is_hand_live() {
            return Err(ActionError::HandOver);
        }
        if seat != self.state.turn {
            return Err(ActionError::NotYourTurn { seat, turn: self.state.turn });
        }
        if !self.seats[seat].can_act() {
            return Err(ActionError::SeatCannotAct(seat));
        }
        if let Action::Raise(to) = action {
            let min = self.min_raise_to();
            if to < min {
                return Err(ActionError::RaiseTooSmall { min, got: to });
            }
        }
        Ok(())
    }

    /// Smallest legal raise-to total on this street.
    pub fn min_raise_to(&self) -> u64 {
        self.state.current_bet + self.config.raise_unit
    }

    fn call(&mut self, idx: usize) -> ActionLabel {
        let need = self.state.current_bet.saturating_sub(self.seats[idx].bet);
        let paid = self.seats[idx].commit(need);
        self.state.pot += paid;
        if self.seats[idx].stack == 0 && paid > 0 {
            ActionLabel::AllIn(self.seats[idx].bet)
        } else if paid == 0 {
            ActionLabel::Check
        } else {
            ActionLabel::Call(paid)
        }
    }

    /// Commit the whole stack without raising. Chips above the current bet
    /// come back through the side pot only this seat is eligible for.
    fn shove(&mut self, idx: usize) -> ActionLabel {
        let stack = self.seats[idx].stack;
        let paid = self.seats[idx].commit(stack);
        self.state.pot += paid;
        ActionLabel::AllIn(self.seats[idx].bet)
    }

    fn raise(&mut self, idx: usize, to: u64, need: u64) -> ActionLabel {
        let paid = self.seats[idx].commit(need);
        self.state.pot += paid;
        self.state.current_bet = to;
        self.state.raise_count += 1;
        for (i, other) in self.seats.iter_mut().enumerate() {
            if i != idx && !other.folded {
                other.acted = false;
                other.last_action = None;
            }
        }
        if self.seats[idx].stack == 0 {
            ActionLabel::AllIn(to)
        } else {
            ActionLabel::Raise(to)
        }
    }

    fn progress(&mut self) -> Result<(), EngineError> {
        if self.live_count() == 1 {
            return self.finish();
        }
        if self.round_complete() {
            self.advance_phase()?;
        } else {
            self.advance_turn();
        }
        Ok(())
    }

    /// Pass the turn to the next seat that can still act. Stays put if none can.
    pub fn advance_turn(&mut self) {
        if let Some(next) = self.next_matching(self.state.turn, false, Seat::can_act) {
            self.state.turn = next;
        }
    }

    /// Whether the current street's betting is closed.
    ///
    /// Every live seat with chips must have acted and matched the current bet;
    /// all-in seats are exempt. A lone seat with chips that already matches
    /// has nobody left to bet against, so that also closes the street.
    pub fn round_complete(&self) -> bool {
        let current = self.state.current_bet;
        let mut actors = self.seats.iter().filter(|s| s.can_act());
        if self.seats.iter().filter(|s| s.can_act()).count() <= 1 {
            return actors.all(|s| s.bet >= current);
        }
        actors.all(|s| s.acted && s.bet == current)
    }

    /// Close the current street and deal the next one, continuing straight
    /// through streets where nobody can act, down to showdown.
    ///
    /// Returns `false` (and does nothing) while betting is still open.
    pub fn advance_phase(&mut self) -> Result<bool, EngineError> {
        if !self.is_hand_live() || !self.round_complete() {
            return Ok(false);
        }
        if self.live_count() == 1 {
            self.finish()?;
            return Ok(true);
        }
        loop {
            for s in &mut self.seats {
                s.acted = false;
                s.last_action = None;
                s.bet = 0;
            }
            self.state.current_bet = 0;

            let reveal = self.state.phase.reveal_count();
            let cards = self.state.deck.draw_n(reveal)?;
            self.state.board.extend(cards);
            self.state.phase = self.state.phase.next();
            info!(phase = %self.state.phase, board = ?self.state.board.as_slice(), "phase advanced");
            self.events.push(HandEvent::PhaseAdvanced {
                phase: self.state.phase,
                board: self.state.board.as_slice().to_vec(),
            });

            if self.state.phase == Phase::Showdown {
                self.finish()?;
                return Ok(true);
            }
            // Postflop action opens left of the button.
            let button = self.state.button;
            self.state.turn = self.next_matching(button, false, Seat::can_act).unwrap_or(button);
            if !self.round_complete() {
                return Ok(true);
            }
        }
    }

    /// Settle the pot and enter showdown.
    fn finish(&mut self) -> Result<(), EngineError> {
        let contributions: Vec<Contribution> = self
            .seats
            .iter()
            .enumerate()
            .map(|(seat, s)| Contribution {
                seat,
                amount: s.contributed,
                folded: s.folded,
                hole: s.hole,
            })
            .collect();
        let settlement = pots::settle(
            &contributions,
            self.state.board.as_slice(),
            self.state.button,
            self.ranker.as_ref(),
        )?;

        for s in &mut self.seats {
            s.result = None;
        }
        for payout in &settlement.payouts {
            self.seats[payout.seat].stack += payout.amount;
        }
        for (seat, description) in &settlement.descriptions {
            let won = settlement.won_by(*seat);
            self.seats[*seat].result = Some(HandResult { description: description.clone(), won });
        }
        self.state.pot = 0;
        self.state.phase = Phase::Showdown;
        self.state.revealed = !settlement.uncontested;

        if settlement.uncontested {
            if let Some(p) = settlement.payouts.first() {
                info!(seat = p.seat, amount = p.amount, "uncontested win");
                self.events.push(HandEvent::SingleWinner { seat: p.seat, amount: p.amount });
            }
        }
        info!(hand = self.state.hand_number, payouts = ?settlement.payouts, "settlement complete");
        self.events.push(HandEvent::SettlementComplete { payouts: settlement.payouts.clone() });
        self.last_settlement = Some(settlement);
        Ok(())
    }

    /// Hole cards of `seat`, if dealt.
    pub fn hole_cards(&self, seat: usize) -> Option<HoleCards> {
        self.seats.get(seat).and_then(|s| s.hole)
    }

    /// Cards a seat can see: its own hole cards plus the board.
    pub fn known_cards(&self, seat: usize) -> Vec<Card> {
        let mut cards: Vec<Card> = self.hole_cards(seat).map(|h| h.as_array().to_vec()).unwrap_or_default();
        cards.extend_from_slice(self.state.board.as_slice());
        cards
    }

    /// Chips `seat` must add to match the current bet.
    pub fn to_call(&self, seat: usize) -> u64 {
        match self.seats.get(seat) {
            Some(s) if self.is_hand_live() => self.state.current_bet.saturating_sub(s.bet),
            _ => 0,
        }
    }

    /// Live seats other than `seat`.
    pub fn opponents_in_hand(&self, seat: usize) -> usize {
        self.seats.iter().enumerate().filter(|(i, s)| *i != seat && !s.folded).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RngSource;

    fn mk_engine(n: usize) -> HandEngine {
        let seats = (0..n).map(|i| Seat::human(i as u32, format!("P{i}"), 1000)).collect();
        HandEngine::new(TableConfig::default(), seats).unwrap()
    }

    fn started(n: usize, button: usize) -> HandEngine {
        let mut e = mk_engine(n);
        e.init_hand(button, &mut RngSource::seeded(11)).unwrap();
        e
    }

    fn total_chips(e: &HandEngine) -> u64 {
        e.seats.iter().map(|s| s.stack).sum::<u64>() + e.state.pot
    }

    #[test]
    fn init_hand_posts_blinds_and_deals() {
        let e = started(4, 0);
        assert_eq!(e.state.phase, Phase::Preflop);
        assert_eq!(e.seats[1].bet, 5);
        assert_eq!(e.seats[2].bet, 10);
        assert_eq!(e.state.pot, 15);
        assert_eq!(e.state.current_bet, 10);
        assert_eq!(e.state.turn, 3, "first to act is left of the big blind");
        assert!(e.seats.iter().all(|s| s.hole.is_some()));
        assert_eq!(e.state.deck.len(), 52 - 8);
    }

    #[test]
    fn heads_up_button_posts_small_blind_and_acts_first() {
        let e = started(2, 1);
        assert_eq!(e.state.small_blind_seat, Some(1));
        assert_eq!(e.state.big_blind_seat, Some(0));
        assert_eq!(e.state.turn, 1);
    }

    #[test]
    fn busted_seat_is_folded_and_skipped() {
        let mut e = mk_engine(4);
        e.seats[1].stack = 0;
        e.init_hand(0, &mut RngSource::seeded(2)).unwrap();
        assert!(e.seats[1].folded);
        assert!(e.seats[1].hole.is_none());
        assert_eq!(e.state.small_blind_seat, Some(2));
        assert_eq!(e.state.big_blind_seat, Some(3));
        assert_eq!(e.state.turn, 0);
    }

    #[test]
    fn short_stack_posts_all_in_blind() {
        let mut e = mk_engine(3);
        e.seats[2].stack = 4;
        e.init_hand(0, &mut RngSource::seeded(2)).unwrap();
        assert_eq!(e.seats[2].bet, 4);
        assert_eq!(e.seats[2].stack, 0);
        assert_eq!(e.seats[2].last_action, Some(ActionLabel::BigBlind(4)));
        assert_eq!(e.state.current_bet, 10);
    }

    #[test]
    fn out_of_turn_action_is_rejected_without_effect() {
        let mut e = started(3, 0);
        let before = e.state.pot;
        let turn = e.state.turn;
        let other = (turn + 1) % 3;
        assert!(matches!(e.apply_action(other, Action::Call), Err(ActionError::NotYourTurn { .. })));
        assert_eq!(e.state.pot, before);
        assert_eq!(e.state.turn, turn);
        assert!(e.take_events().iter().all(|ev| !matches!(ev, HandEvent::ActionApplied { .. })));
    }

    #[test]
    fn raise_below_minimum_is_rejected() {
        let mut e = started(3, 0);
        let turn = e.state.turn;
        let err = e.apply_action(turn, Action::Raise(15)).unwrap_err();
        assert!(matches!(err, ActionError::RaiseTooSmall { min: 30, got: 15 }));
        assert_eq!(e.state.raise_count, 0);
    }

    #[test]
    fn raise_reopens_action_for_others() {
        let mut e = started(3, 0);
        // seat 0 (button) first with three players
        e.apply_action(0, Action::Call).unwrap();
        e.apply_action(1, Action::Raise(30)).unwrap();
        assert_eq!(e.state.raise_count, 1);
        assert_eq!(e.state.current_bet, 30);
        assert!(!e.seats[0].acted);
        assert!(!e.seats[2].acted);
        assert!(e.seats[1].acted);
        assert!(!e.round_complete());
        assert_eq!(e.state.turn, 2);
    }

    #[test]
    fn underfunded_raise_degrades_to_all_in_call() {
        let mut e = mk_engine(3);
        e.seats[0].stack = 25;
        e.init_hand(0, &mut RngSource::seeded(4)).unwrap();
        e.apply_action(0, Action::Raise(500)).unwrap();
        assert_eq!(e.seats[0].stack, 0);
        assert_eq!(e.seats[0].bet, 25);
        assert!(e.seats[0].is_all_in());
        assert_eq!(e.state.pot, 40);
        assert_eq!(e.state.raise_count, 0);
        assert_eq!(e.state.current_bet, 10);
        assert_eq!(e.seats[0].last_action, Some(ActionLabel::AllIn(25)));
        assert_eq!(e.state.turn, 1);
    }

    #[test]
    fn uncalled_part_of_short_shove_is_returned() {
        let mut e = mk_engine(3);
        e.seats[0].stack = 25;
        e.init_hand(0, &mut RngSource::seeded(4)).unwrap();
        let before = total_chips(&e);
        e.apply_action(0, Action::Raise(500)).unwrap();
        // The big blind already matches the bet and nobody else can act.
        e.apply_action(1, Action::Fold).unwrap();
        assert_eq!(e.state.phase, Phase::Showdown);
        assert_eq!(e.state.board.len(), 5);
        assert_eq!(total_chips(&e), before);

        let settlement = e.last_settlement().unwrap();
        let pots = &settlement.pots;
        assert_eq!(pots.len(), 2);
        assert_eq!(pots[0].amount, 25);
        assert_eq!(pots[1].amount, 15);
        assert_eq!(pots[1].eligible, vec![0]);
        assert!(e.seats[0].stack >= 15);
    }

    #[test]
    fn short_deck_is_rejected_before_the_hand_starts() {
        let mut e = mk_engine(3);
        let short = Deck::from_cards(crate::cards::parse_cards("As Kd Qh Jc").unwrap()).unwrap();
        let err = e.init_hand_with_deck(0, short).unwrap_err();
        assert!(matches!(err, EngineError::Deck(DeckError::Empty)));
        assert!(!e.is_hand_live());
        assert_eq!(e.state.hand_number, 0);
        assert!(e.seats.iter().all(|s| s.hole.is_none() && s.bet == 0));
        assert!(e.take_events().is_empty());

        e.init_hand(0, &mut RngSource::seeded(5)).unwrap();
        assert!(e.is_hand_live());
        assert_eq!(e.state.hand_number, 1);
    }

    #[test]
    fn short_call_goes_all_in() {
        let mut e = mk_engine(3);
        e.seats[0].stack = 6;
        e.init_hand(0, &mut RngSource::seeded(4)).unwrap();
        e.apply_action(0, Action::Call).unwrap();
        assert_eq!(e.seats[0].stack, 0);
        assert_eq!(e.seats[0].last_action, Some(ActionLabel::AllIn(6)));
        assert!(e.seats[0].is_all_in());
    }

    #[test]
    fn calls_around_reach_the_flop_with_fresh_street() {
        let mut e = started(3, 0);
        e.apply_action(0, Action::Call).unwrap();
        e.apply_action(1, Action::Call).unwrap();
        assert_eq!(e.state.phase, Phase::Preflop, "big blind still has the option");
        e.apply_action(2, Action::Call).unwrap();
        assert_eq!(e.state.phase, Phase::Flop);
        assert_eq!(e.state.board.len(), 3);
        assert_eq!(e.state.current_bet, 0);
        assert!(e.seats.iter().all(|s| s.bet == 0 && !s.acted));
        assert_eq!(e.state.turn, 1, "postflop opens left of the button");
        assert_eq!(e.state.pot, 30);
    }

    #[test]
    fn check_down_reaches_showdown_and_conserves_chips() {
        let mut e = started(3, 0);
        let before = total_chips(&e);
        for _ in 0..64 {
            if !e.is_hand_live() {
                break;
            }
            let turn = e.state.turn;
            e.apply_action(turn, Action::Call).unwrap();
        }
        assert_eq!(e.state.phase, Phase::Showdown);
        assert_eq!(e.state.board.len(), 5);
        assert_eq!(total_chips(&e), before);
        assert!(e.state.revealed);
        assert!(e.seats.iter().all(|s| s.result.is_some()));
    }

    #[test]
    fn everyone_folds_to_big_blind() {
        let mut e = started(3, 0);
        e.apply_action(0, Action::Fold).unwrap();
        e.apply_action(1, Action::Fold).unwrap();
        assert_eq!(e.state.phase, Phase::Showdown);
        assert!(e.state.board.is_empty(), "board is never revealed");
        assert_eq!(e.seats[2].stack, 1005);
        let result = e.seats[2].result.as_ref().unwrap();
        assert_eq!(result.description, HandResult::UNCONTESTED);
        assert_eq!(result.won, 15);
        assert!(!e.state.revealed);
        let events = e.take_events();
        assert!(events.iter().any(|ev| matches!(ev, HandEvent::SingleWinner { seat: 2, amount: 15 })));
    }

    #[test]
    fn all_in_preflop_runs_out_the_board() {
        let mut e = started(2, 0);
        e.apply_action(0, Action::Raise(1000)).unwrap();
        e.apply_action(1, Action::Call).unwrap();
        assert_eq!(e.state.phase, Phase::Showdown);
        assert_eq!(e.state.board.len(), 5);
        assert_eq!(e.seats.iter().map(|s| s.stack).sum::<u64>(), 2000);
    }

    #[test]
    fn advance_turn_skips_folded_and_all_in() {
        let mut e = started(4, 0);
        e.seats[0].folded = true;
        e.seats[1].stack = 0;
        e.state.turn = 3;
        e.advance_turn();
        assert_eq!(e.state.turn, 2);
    }

    #[test]
    fn advance_phase_is_noop_while_betting_open() {
        let mut e = started(3, 0);
        assert!(!e.advance_phase().unwrap());
        assert_eq!(e.state.phase, Phase::Preflop);
    }

    #[test]
    fn actions_after_showdown_are_rejected() {
        let mut e = started(2, 0);
        e.apply_action(0, Action::Fold).unwrap();
        let turn = e.state.turn;
        assert!(matches!(e.apply_action(turn, Action::Call), Err(ActionError::HandOver)));
    }

    #[test]
    fn init_rejected_mid_hand_and_queued_seat_joins_next() {
        let mut e = started(2, 0);
        let mut rng = RngSource::seeded(5);
        assert!(matches!(e.init_hand(0, &mut rng), Err(EngineError::HandInProgress)));
        e.queue_seat(Seat::human(9, "Late", 500)).unwrap();
        assert_eq!(e.seats.len(), 2);
        e.apply_action(0, Action::Fold).unwrap();
        e.start_next_hand(&mut rng).unwrap();
        assert_eq!(e.seats.len(), 3);
        assert_eq!(e.state.button, 1);
        assert_eq!(e.state.hand_number, 2);
        assert!(e.seats[2].hole.is_some());
    }

    #[test]
    fn not_enough_funded_seats() {
        let mut e = mk_engine(2);
        e.seats[0].stack = 0;
        let err = e.init_hand(0, &mut RngSource::seeded(1)).unwrap_err();
        assert!(matches!(err, EngineError::NotEnoughPlayers(1)));
    }
}
