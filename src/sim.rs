//! Random-policy self play, used for balancing badge thresholds.

use std::collections::BTreeMap;

use rand::Rng;

use crate::badges::{unlock_for_score, BadgeSet, Tier};
use crate::engine::{Move, Tile};
use crate::game::{self, Action};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameReport {
    pub score: u64,
    pub highest_tile: Tile,
    pub moves: u32,
    pub unlocked: Vec<Tier>,
}

/// Play one game choosing uniformly among the moves that change the board.
///
/// Stops at game over, or after `max_moves` applied moves when given.
///
/// ```
/// use badge_2048::sim::play_random;
/// use rand::{rngs::StdRng, SeedableRng};
/// let mut rng = StdRng::seed_from_u64(9);
/// let report = play_random(&mut rng, Some(10));
/// assert!(report.moves <= 10);
/// ```
pub fn play_random<R: Rng + ?Sized>(rng: &mut R, max_moves: Option<u32>) -> GameReport {
    let mut state = game::create_initial_state(rng);
    let mut moves = 0u32;
    while !state.is_over() && max_moves.map_or(true, |cap| moves < cap) {
        let legal: Vec<Move> = Move::ALL.into_iter().filter(|&dir| state.board.slide(dir).changed).collect();
        if legal.is_empty() {
            break;
        }
        let dir = legal[rng.gen_range(0..legal.len())];
        state = game::transition(state, Action::Slide(dir), rng);
        moves += 1;
    }
    let unlocked = unlock_for_score(state.score, &BadgeSet::default()).newly_unlocked;
    GameReport { score: state.score, highest_tile: state.highest_tile(), moves, unlocked }
}

/// Aggregate statistics over many [`GameReport`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub games: usize,
    pub mean_score: f64,
    pub max_score: u64,
    pub total_moves: u64,
    /// Number of games ending with each highest tile.
    pub highest_tiles: BTreeMap<Tile, usize>,
    /// Number of games that unlocked each tier.
    pub tier_unlocks: BTreeMap<Tier, usize>,
}

impl Summary {
    pub fn from_reports(reports: &[GameReport]) -> Self {
        let mut summary = Summary { games: reports.len(), ..Default::default() };
        if reports.is_empty() {
            return summary;
        }
        let mut total_score = 0u64;
        for r in reports {
            total_score += r.score;
            summary.max_score = summary.max_score.max(r.score);
            summary.total_moves += r.moves as u64;
            *summary.highest_tiles.entry(r.highest_tile).or_default() += 1;
            for &tier in &r.unlocked {
                *summary.tier_unlocks.entry(tier).or_default() += 1;
            }
        }
        summary.mean_score = total_score as f64 / reports.len() as f64;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn random_game_runs_to_completion() {
        let mut rng = StdRng::seed_from_u64(31);
        let report = play_random(&mut rng, None);
        assert!(report.moves > 0);
        assert!(report.highest_tile >= 4);
        let expected: Vec<Tier> = Tier::ALL.into_iter().filter(|t| report.score >= t.threshold()).collect();
        assert_eq!(report.unlocked, expected);
    }

    #[test]
    fn same_seed_same_game() {
        let a = play_random(&mut StdRng::seed_from_u64(77), None);
        let b = play_random(&mut StdRng::seed_from_u64(77), None);
        assert_eq!(a, b);
    }

    #[test]
    fn summary_aggregates() {
        let reports = vec![
            GameReport { score: 1000, highest_tile: 128, moves: 100, unlocked: vec![] },
            GameReport { score: 3000, highest_tile: 256, moves: 250, unlocked: vec![Tier::Bronze, Tier::Silver] },
            GameReport { score: 1100, highest_tile: 128, moves: 120, unlocked: vec![Tier::Bronze] },
        ];
        let s = Summary::from_reports(&reports);
        assert_eq!(s.games, 3);
        assert_eq!(s.max_score, 3000);
        assert_eq!(s.total_moves, 470);
        assert!((s.mean_score - 1700.0).abs() < 1e-9);
        assert_eq!(s.highest_tiles.get(&128), Some(&2));
        assert_eq!(s.tier_unlocks.get(&Tier::Bronze), Some(&2));
        assert_eq!(s.tier_unlocks.get(&Tier::Gold), None);
    }

    #[test]
    fn empty_summary() {
        assert_eq!(Summary::from_reports(&[]), Summary::default());
    }
}
