//! Pure reducer over a caller-owned [`GameState`].
//!
//! Every transition takes the current state by value and returns the next
//! one; randomness comes from the caller's RNG so seeded runs replay exactly.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::engine::{Board, Move, Tile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Playing,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub board: Board,
    pub score: u64,
    pub status: Status,
}

impl GameState {
    #[inline]
    pub fn is_over(&self) -> bool { self.status == Status::GameOver }

    #[inline]
    pub fn highest_tile(&self) -> Tile { self.board.highest_tile() }
}

/// Input to [`transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Restart,
    Slide(Move),
    /// Manual/debug placement of a single tile.
    SpawnTile { row: usize, col: usize, value: Tile },
}

impl Action {
    /// Parse a single line of player input.
    ///
    /// Accepts `w`/`a`/`s`/`d`, direction names, `r`/`restart` and
    /// `spawn <row> <col> <value>`.
    ///
    /// ```
    /// use badge_2048::engine::Move;
    /// use badge_2048::game::Action;
    /// assert_eq!(Action::parse("a"), Some(Action::Slide(Move::Left)));
    /// assert_eq!(Action::parse("spawn 1 2 4"), Some(Action::SpawnTile { row: 1, col: 2, value: 4 }));
    /// assert_eq!(Action::parse("jump"), None);
    /// ```
    pub fn parse(input: &str) -> Option<Action> {
        let mut parts = input.split_whitespace();
        let head = parts.next()?.to_ascii_lowercase();
        let action = match head.as_str() {
            "w" | "up" => Action::Slide(Move::Up),
            "s" | "down" => Action::Slide(Move::Down),
            "a" | "left" => Action::Slide(Move::Left),
            "d" | "right" => Action::Slide(Move::Right),
            "r" | "restart" => Action::Restart,
            "spawn" => {
                let row = parts.next()?.parse().ok()?;
                let col = parts.next()?.parse().ok()?;
                let value = parts.next()?.parse().ok()?;
                Action::SpawnTile { row, col, value }
            }
            _ => return None,
        };
        match parts.next() {
            Some(_) => None,
            None => Some(action),
        }
    }
}

/// A fresh game: empty board plus two spawned tiles, score 0.
///
/// ```
/// use badge_2048::game::{create_initial_state, Status};
/// use rand::{rngs::StdRng, SeedableRng};
/// let mut rng = StdRng::seed_from_u64(42);
/// let state = create_initial_state(&mut rng);
/// assert_eq!(state.board.count_empty(), 14);
/// assert_eq!(state.score, 0);
/// assert_eq!(state.status, Status::Playing);
/// ```
pub fn create_initial_state<R: Rng + ?Sized>(rng: &mut R) -> GameState {
    let board = Board::EMPTY.with_random_tile(rng).with_random_tile(rng);
    GameState { board, score: 0, status: Status::Playing }
}

/// Convenience: like `create_initial_state` but uses thread-local RNG.
///
/// ```
/// let state = badge_2048::game::create_initial_state_thread();
/// assert_eq!(state.board.count_empty(), 14);
/// assert_eq!(state.score, 0);
/// ```
pub fn create_initial_state_thread() -> GameState {
    let mut rng = rand::thread_rng();
    create_initial_state(&mut rng)
}

/// Apply `action` to `state`.
///
/// Rejected actions (moves on a finished game, slides that change nothing,
/// spawns onto occupied or out-of-range cells) return `state` unchanged.
pub fn transition<R: Rng + ?Sized>(state: GameState, action: Action, rng: &mut R) -> GameState {
    match action {
        Action::Restart => {
            tracing::debug!(previous_score = state.score, "restart");
            create_initial_state(rng)
        }
        Action::Slide(dir) => slide(state, dir, rng),
        Action::SpawnTile { row, col, value } => spawn_tile(state, row, col, value),
    }
}

/// Convenience: like `transition` but uses thread-local RNG.
///
/// ```
/// use badge_2048::game::{create_initial_state_thread, transition_thread, Action, Status};
/// let state = transition_thread(create_initial_state_thread(), Action::Restart);
/// assert_eq!(state.score, 0);
/// assert_eq!(state.status, Status::Playing);
/// ```
pub fn transition_thread(state: GameState, action: Action) -> GameState {
    let mut rng = rand::thread_rng();
    transition(state, action, &mut rng)
}

fn slide<R: Rng + ?Sized>(state: GameState, dir: Move, rng: &mut R) -> GameState {
    if state.is_over() {
        tracing::trace!(%dir, "slide ignored, game over");
        return state;
    }
    let outcome = state.board.slide(dir);
    if !outcome.changed {
        tracing::trace!(%dir, "slide ignored, board unchanged");
        return state;
    }
    let board = outcome.board.with_random_tile(rng);
    let score = state.score + outcome.gained;
    let status = if board.is_game_over() { Status::GameOver } else { Status::Playing };
    tracing::debug!(%dir, gained = outcome.gained, score, ?status, "slide applied");
    GameState { board, score, status }
}

fn spawn_tile(state: GameState, row: usize, col: usize, value: Tile) -> GameState {
    if state.is_over() {
        return state;
    }
    match state.board.with_tile(row, col, value) {
        Some(board) => {
            tracing::debug!(row, col, value, "tile placed");
            GameState { board, ..state }
        }
        None => {
            tracing::trace!(row, col, value, "spawn rejected");
            state
        }
    }
}
