//! holdem-engine: a no-limit Texas Hold'em hand engine
//!
//! Goals:
//! - One owned [`game::HandEngine`] drives a hand from deal to settlement
//! - Side pots with correct eligibility and conserved chips
//! - Computer seats that play from Monte-Carlo equity and EV
//! - Every random draw goes through an injected [`rng::RandomSource`]
//!
//! ## Quick start: play a hand
//! ```
//! use holdem_engine::agents::SeatTable;
//! use holdem_engine::config::TableConfig;
//! use holdem_engine::game::{HandEngine, Seat, SkillLevel};
//! use holdem_engine::rng::RngSource;
//!
//! let mut config = TableConfig::default();
//! config.think_cap_ms = 0;
//! let seats = vec![
//!     Seat::computer(1, "Ann", 1000, SkillLevel::Standard),
//!     Seat::computer(2, "Bo", 1000, SkillLevel::Novice),
//! ];
//! let mut engine = HandEngine::new(config, seats).unwrap();
//! let mut agents = SeatTable::for_engine(&engine, Some(7));
//! engine.start_next_hand(&mut RngSource::seeded(7)).unwrap();
//! while engine.is_hand_live() {
//!     agents.on_turn(&mut engine).unwrap();
//! }
//! let chips: u64 = engine.seats().iter().map(|s| s.stack()).sum();
//! assert_eq!(chips, 2000);
//! ```

pub mod agents;
pub mod cards;
pub mod config;
pub mod deck;
pub mod engine;
pub mod equity;
pub mod evaluator;
pub mod events;
pub mod game;
pub mod hand;
pub mod pots;
pub mod rng;
pub mod snapshot;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
