use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use badge_2048::badges::{unlock_for_score, BadgeSet, Tier};
use badge_2048::game::{self, Action, GameState};
use badge_2048::{logging, snapshot};
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};

#[derive(Debug, Parser)]
#[command(name = "badge-2048", version, about = "Play 2048 in the terminal and unlock score badges")]
struct Args {
    /// Seed for tile spawns (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Resume from a snapshot file
    #[arg(long, value_name = "FILE")]
    load: Option<PathBuf>,

    /// Write a snapshot here on quit
    #[arg(long, value_name = "FILE")]
    save: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

const HELP: &str = "moves: w/a/s/d (or up/left/down/right), r restart, \
spawn <row> <col> <value>, c <tier> claim badge, b badges, q quit";
const GAME_OVER_HINT: &str = "game over; r to restart, q to quit";

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let (mut state, mut badges) = match &args.load {
        Some(path) => {
            let snap = snapshot::read_from_path(path)
                .with_context(|| format!("failed to load snapshot {}", path.display()))?;
            (snap.game, snap.badges)
        }
        None => (game::create_initial_state(&mut rng), BadgeSet::default()),
    };

    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    writeln!(out, "{HELP}")?;
    render(&mut out, &state)?;

    for line in stdin.lock().lines() {
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        match input.split_once(' ').unwrap_or((input, "")) {
            ("q", _) | ("quit", _) => break,
            ("b", _) | ("badges", _) => {
                print_badges(&mut out, &badges)?;
                continue;
            }
            ("c", tier) | ("claim", tier) => {
                match tier.parse::<Tier>().and_then(|t| badges.claim(t, snapshot::now_unix_seconds())) {
                    Ok(next) => {
                        badges = next;
                        writeln!(out, "claimed {}", tier.trim())?;
                    }
                    Err(e) => writeln!(out, "{e}")?,
                }
                continue;
            }
            _ => {}
        }

        let Some(action) = Action::parse(input) else {
            writeln!(out, "unrecognised input; {HELP}")?;
            continue;
        };
        if let Some(hint) = refusal(&state, action) {
            writeln!(out, "{hint}")?;
            continue;
        }
        let next = game::transition(state, action, &mut rng);
        if next == state && action != Action::Restart {
            writeln!(out, "nothing moved")?;
            continue;
        }
        state = next;

        let unlock = unlock_for_score(state.score, &badges);
        badges = unlock.badges;
        for tier in unlock.newly_unlocked {
            writeln!(out, "*** {tier} badge unlocked ({} points) ***", tier.threshold())?;
        }
        render(&mut out, &state)?;
        if state.is_over() {
            writeln!(out, "{GAME_OVER_HINT}")?;
        }
    }

    if let Some(path) = &args.save {
        snapshot::write_to_path(path, &snapshot::Snapshot::now(state, badges))
            .with_context(|| format!("failed to save snapshot {}", path.display()))?;
        writeln!(out, "saved to {}", path.display())?;
    }
    Ok(())
}

/// Message for an action a finished game will not accept.
fn refusal(state: &GameState, action: Action) -> Option<&'static str> {
    (state.is_over() && action != Action::Restart).then_some(GAME_OVER_HINT)
}

fn render<W: Write>(out: &mut W, state: &GameState) -> io::Result<()> {
    writeln!(out, "{}", state.board)?;
    writeln!(out, "score: {}  best tile: {}", state.score, state.highest_tile())
}

fn print_badges<W: Write>(out: &mut W, badges: &BadgeSet) -> io::Result<()> {
    for badge in badges.iter() {
        let status = match (badge.unlocked, badge.claimed) {
            (_, true) => "claimed",
            (true, false) => "unlocked",
            (false, _) => "locked",
        };
        writeln!(out, "{:<7} {:>5}  {status}", badge.tier, badge.threshold)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use badge_2048::engine::{Board, Move};
    use badge_2048::game::Status;

    #[test]
    fn finished_game_refuses_moves_with_game_over_hint() {
        let board = Board::from_rows([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]).unwrap();
        let over = GameState { board, score: 120, status: Status::GameOver };
        for dir in Move::ALL {
            assert_eq!(refusal(&over, Action::Slide(dir)), Some(GAME_OVER_HINT));
        }
        assert_eq!(refusal(&over, Action::SpawnTile { row: 0, col: 0, value: 2 }), Some(GAME_OVER_HINT));
        assert_eq!(refusal(&over, Action::Restart), None);

        let playing = GameState { status: Status::Playing, ..over };
        assert_eq!(refusal(&playing, Action::Slide(Move::Left)), None);
    }
}
