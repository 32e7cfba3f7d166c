use std::env;
use std::process::ExitCode;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use questsim::config::DEFAULT_SEED;
use questsim::logging;
use questsim::quest::QuestCatalog;

const DEFAULT_QUESTS: usize = 4;

fn main() -> ExitCode {
    logging::init();

    let n: usize = env::args().nth(1).and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_QUESTS);
    let seed: u64 = env::args().nth(2).and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_SEED);

    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let catalog = QuestCatalog::random(n, &mut rng);

    // Pretty JSON on stdout, loadable as the `quests` field of a config.
    match serde_json::to_string_pretty(&catalog.to_specs()) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("error: failed to serialise catalog: {e}");
            return ExitCode::FAILURE;
        }
    }

    // At most 100 points per quest, so the sum only overflows for absurd counts.
    let max_weekly = match catalog.max_weekly_points() {
        Some(points) => points.to_string(),
        None => "overflow".to_string(),
    };
    eprintln!(
        "quest_catalog: {} quests (seed {seed}), max {max_weekly} points/week, expected {:.1} points/week",
        catalog.len(),
        catalog.expected_weekly_points()
    );
    ExitCode::SUCCESS
}
