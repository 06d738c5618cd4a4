use badge_2048::badges::Tier;
use badge_2048::engine;
use badge_2048::logging;
use badge_2048::sim::{self, GameReport, Summary};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;
use std::time::Instant;

#[derive(Debug, Parser)]
#[command(
    name = "autoplay",
    version,
    about = "Play many random-policy 2048 games and report score and badge statistics"
)]
struct Args {
    /// Number of games to play
    #[arg(short = 'n', long, default_value_t = 1000)]
    games: u64,

    /// Base seed; game i uses seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Stop each game after this many moves
    #[arg(long)]
    max_moves: Option<u32>,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);
    engine::init();

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(args.games);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} games ({eta})")?
                .progress_chars("=>-"),
        );
        pb
    };

    let start = Instant::now();
    let reports: Vec<GameReport> = (0..args.games)
        .into_par_iter()
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(args.seed.wrapping_add(i));
            let report = sim::play_random(&mut rng, args.max_moves);
            pb.inc(1);
            report
        })
        .collect();
    pb.finish_and_clear();
    let elapsed = start.elapsed().as_secs_f64().max(1e-6);

    let summary = Summary::from_reports(&reports);
    tracing::info!(games = summary.games, elapsed_s = elapsed, "autoplay finished");

    println!("games: {}  moves/sec: {:.0}", summary.games, summary.total_moves as f64 / elapsed);
    println!("mean score: {:.1}  max score: {}", summary.mean_score, summary.max_score);
    println!("highest tile:");
    for (tile, count) in &summary.highest_tiles {
        println!("  {:>6}: {:>6} ({:.1}%)", tile, count, percent(*count, summary.games));
    }
    println!("badges unlocked:");
    for tier in Tier::ALL {
        let count = summary.tier_unlocks.get(&tier).copied().unwrap_or(0);
        println!("  {:<7} ({:>5}): {:>6} ({:.1}%)", tier, tier.threshold(), count, percent(count, summary.games));
    }
    Ok(())
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 { 0.0 } else { 100.0 * count as f64 / total as f64 }
}
