use std::fs::File;
use std::io::{BufWriter, Write};
use std::process::ExitCode;
use std::str::FromStr;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use questsim::config::SimulationConfig;
use questsim::error::SimError;
use questsim::logging;
use questsim::quest::QuestCatalog;
use questsim::simulation::{self, RngMode, Simulation, SimulationResult, WeekRecord};
use questsim::stats::{self, DistStats, Histogram, SummaryStatistics};
use questsim::types::UserId;

const DEFAULT_BINS: usize = 30;
const HISTOGRAM_WIDTH: usize = 50;

struct Args {
    config_path: Option<String>,
    seed: Option<u64>,
    users: Option<usize>,
    weeks: Option<u32>,
    cap: Option<u64>,
    random_quests: Option<usize>,
    parallel: bool,
    runs: Option<u64>,
    output: Option<String>,
    bins: usize,
    trace_user: Option<u64>,
    quiet: bool,
}

fn main() -> ExitCode {
    logging::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), SimError> {
    let args = parse_args(std::env::args().skip(1))?;

    let mut config = match &args.config_path {
        Some(path) => SimulationConfig::from_path(path)?,
        None => SimulationConfig::canonical(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(users) = args.users {
        config.users = users;
    }
    if let Some(weeks) = args.weeks {
        config.weeks = weeks;
    }
    if let Some(cap) = args.cap {
        config.weekly_cap = cap;
    }
    if let Some(n) = args.random_quests {
        // Catalog draws use their own generator so the run seed stays untouched.
        let mut rng = ChaCha20Rng::seed_from_u64(config.seed);
        rng.set_stream(u64::MAX);
        config.quests = QuestCatalog::random(n, &mut rng);
    }
    config.validate()?;

    // Replaying one user needs that user's own stream.
    let mode = if args.parallel || args.trace_user.is_some() {
        RngMode::PerUser
    } else {
        RngMode::SingleStream
    };

    if let Some(n) = args.runs {
        let runs = simulation::run_many(&config, n, mode)?;
        if !args.quiet {
            print_catalog(&config.quests);
            print_runs(&runs);
            let summaries: Vec<SummaryStatistics> = runs.iter().map(|(_, s)| *s).collect();
            if n < 2 {
                eprintln!("Warning: Distribution requires >= 2 runs");
            } else {
                print_dist("Mean points across runs", &stats::across_runs(&summaries)?, n);
            }
        }
        return Ok(());
    }

    let sim = Simulation::from_config(config.clone())?.with_mode(mode);
    let sim = if args.parallel { sim.parallel() } else { sim };
    let result = sim.run()?;

    if let Some(path) = &args.output {
        write_ndjson(&result, path)?;
    }

    if !args.quiet {
        let summary = result.summarize()?;
        print_catalog(&config.quests);
        println!(
            "\nMean points per user over {} weeks: {:.2} ± {:.2}",
            config.weeks, summary.mean, summary.std_dev
        );
        print_dist("Points distribution", &stats::distribution(result.totals())?, 1);
        print_histogram(&stats::histogram(result.totals(), args.bins)?);
        print_kpis(&config, &summary);
    }
    if let Some(user) = args.trace_user {
        print_trajectory(user, &sim.trajectory(UserId(user))?);
    }
    Ok(())
}

fn parse_args(mut it: impl Iterator<Item = String>) -> Result<Args, SimError> {
    let mut args = Args {
        config_path: None,
        seed: None,
        users: None,
        weeks: None,
        cap: None,
        random_quests: None,
        parallel: false,
        runs: None,
        output: None,
        bins: DEFAULT_BINS,
        trace_user: None,
        quiet: false,
    };

    while let Some(flag) = it.next() {
        match flag.as_str() {
            "--config" => args.config_path = Some(value(&mut it, "config")?),
            "--seed" => args.seed = Some(parsed(&mut it, "seed")?),
            "--users" => args.users = Some(parsed(&mut it, "users")?),
            "--weeks" => args.weeks = Some(parsed(&mut it, "weeks")?),
            "--cap" => args.cap = Some(parsed(&mut it, "weekly_cap")?),
            "--random-quests" => args.random_quests = Some(parsed(&mut it, "random_quests")?),
            "--parallel" => args.parallel = true,
            "--runs" => args.runs = Some(parsed(&mut it, "runs")?),
            "--output" => args.output = Some(value(&mut it, "output")?),
            "--bins" => args.bins = parsed(&mut it, "bins")?,
            "--trace-user" => args.trace_user = Some(parsed(&mut it, "trace_user")?),
            "--quiet" => args.quiet = true,
            other => tracing::warn!(flag = other, "ignoring unknown argument"),
        }
    }

    // Multi-run mode only prints summaries; per-user output has no single run to draw from.
    if args.runs.is_some() {
        if args.output.is_some() {
            return Err(SimError::InvalidConfig {
                field: "output",
                message: "--output cannot be combined with --runs".to_string(),
            });
        }
        if args.trace_user.is_some() {
            return Err(SimError::InvalidConfig {
                field: "trace_user",
                message: "--trace-user cannot be combined with --runs".to_string(),
            });
        }
    }
    Ok(args)
}

fn value(it: &mut impl Iterator<Item = String>, field: &'static str) -> Result<String, SimError> {
    it.next().ok_or_else(|| SimError::InvalidConfig {
        field,
        message: "flag requires a value".to_string(),
    })
}

fn parsed<T: FromStr>(it: &mut impl Iterator<Item = String>, field: &'static str) -> Result<T, SimError> {
    let raw = value(it, field)?;
    raw.parse().map_err(|_| SimError::InvalidConfig {
        field,
        message: format!("cannot parse {raw:?} as a non-negative integer"),
    })
}

fn write_ndjson(result: &SimulationResult, path: &str) -> Result<(), SimError> {
    let io_err = |source: std::io::Error| SimError::Io { path: path.into(), source };
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    for line in result.iter() {
        serde_json::to_writer(&mut writer, &line).map_err(|e| io_err(e.into()))?;
        writeln!(writer).map_err(io_err)?;
    }
    writer.flush().map_err(io_err)?;
    tracing::info!(path, users = result.len(), "wrote per-user totals");
    Ok(())
}

fn print_catalog(quests: &QuestCatalog) {
    println!("=== Quests ===");
    println!("{:<28} | {:>6} | {:>11}", "Name", "Points", "Probability");
    println!("{}", "-".repeat(28 + 3 + 6 + 3 + 11));
    for q in quests {
        println!("{:<28} | {:>6} | {:>11.2}", q.name, q.points, q.probability);
    }
}

fn print_runs(runs: &[(u64, SummaryStatistics)]) {
    println!("\n=== Per-Run Summary ===");
    println!("{:>6} | {:>10} | {:>10}", "Seed", "Mean", "StdDev");
    println!("{}", "-".repeat(32));
    for (seed, s) in runs {
        println!("{:>6} | {:>10.2} | {:>10.2}", seed, s.mean, s.std_dev);
    }
}

fn print_dist(title: &str, ds: &DistStats, n_runs: u64) {
    if n_runs > 1 {
        println!("\n=== {title} (N={n_runs} runs) ===");
    } else {
        println!("\n=== {title} ===");
    }
    println!(
        "{:>8} | {:>8} | {:>8} | {:>8} | {:>8} | {:>8} | {:>8} | {:>8} | {:>8}",
        "min", "p5", "p25", "p50", "p75", "p95", "max", "mean", "stddev"
    );
    println!(
        "{:>8.1} | {:>8.1} | {:>8.1} | {:>8.1} | {:>8.1} | {:>8.1} | {:>8.1} | {:>8.1} | {:>8.1}",
        ds.min, ds.p5, ds.p25, ds.p50, ds.p75, ds.p95, ds.max, ds.mean, ds.std_dev,
    );
}

fn print_histogram(h: &Histogram) {
    println!("\n=== Distribution of accumulated points ===");
    let peak = h.counts.iter().copied().max().unwrap_or(0).max(1);
    for (i, &count) in h.counts.iter().enumerate() {
        let (lo, hi) = h.bin_range(i);
        let bar = "#".repeat(count * HISTOGRAM_WIDTH / peak);
        println!("{lo:>8.1} – {hi:>8.1} | {count:>6} {bar}");
    }
}

fn print_kpis(config: &SimulationConfig, summary: &SummaryStatistics) {
    println!("\n=== Key indicators ===");
    println!("  Simulated users:        {}", config.users);
    println!("  Simulated weeks:        {}", config.weeks);
    println!("  Weekly cap:             {}", config.weekly_cap);
    println!("  Mean points per user:   {:.2}", summary.mean);
    println!("  Std dev of points:      {:.2}", summary.std_dev);
    println!("  Configured quests:      {}", config.quests.len());
}

fn print_trajectory(user: u64, weeks: &[WeekRecord]) {
    println!("\n=== User {user} week by week ===");
    println!("{:>4} | {:>8} | {:>8}", "Week", "Earned", "Credited");
    let mut total = 0_u64;
    for w in weeks {
        total += w.credited;
        println!("{:>4} | {:>8} | {:>8}", w.week.0, w.earned, w.credited);
    }
    println!("Total credited: {total}");
}
