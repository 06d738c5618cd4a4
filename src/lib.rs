//! badge-2048: a 2048 game engine with score-threshold badges
//!
//! This crate provides:
//! - A compact `Board` type with slide/merge, spawn and game-over detection (`engine` module)
//! - A pure reducer over `GameState` driven by `Action`s (`game` module)
//! - Badge unlock, claim and mint bookkeeping (`badges` module)
//! - A checksummed save format for game + badge state (`snapshot` module)
//! - Random-policy self play for threshold balancing (`sim` module)
//!
//! Quick start:
//! ```
//! use badge_2048::engine::Move;
//! use badge_2048::game::{self, Action};
//! use badge_2048::badges::{unlock_for_score, BadgeSet};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Deterministic game with a seeded RNG
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut state = game::create_initial_state(&mut rng);
//! let mut badges = BadgeSet::default();
//!
//! for dir in [Move::Left, Move::Up, Move::Right, Move::Down] {
//!     state = game::transition(state, Action::Slide(dir), &mut rng);
//!     let unlock = unlock_for_score(state.score, &badges);
//!     badges = unlock.badges;
//! }
//! assert!(state.score < 1024 && badges.unlocked_tiers().is_empty());
//! ```
//!
//! Note: for convenience there are also `*_thread` variants (e.g.
//! `game::transition_thread`) that use thread-local RNG. Prefer the RNG-taking
//! functions when you need determinism.
//!
pub mod badges;
pub mod engine;
pub mod game;
pub mod logging;
pub mod sim;
pub mod snapshot;

pub use badges::{unlock_for_score, Badge, BadgeSet, Tier, Unlock};
pub use engine::{is_game_over, Board, Move};
pub use game::{create_initial_state, transition, Action, GameState, Status};
