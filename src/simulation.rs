use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;
use crate::error::SimError;
use crate::quest::{Quest, QuestCatalog};
use crate::stats::{self, SummaryStatistics};
use crate::types::{UserId, UserTotal, Week};

/// How random draws are partitioned across users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RngMode {
    /// One ChaCha20 stream consumed in user → week → quest order.
    #[default]
    SingleStream,
    /// Each user draws from stream `user index` of the seeded ChaCha20
    /// generator. Independent of scheduling, so safe to shard.
    PerUser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Execution {
    #[default]
    Sequential,
    /// Shard users across the rayon pool. Requires [`RngMode::PerUser`].
    Parallel,
}

/// Accumulated points per simulated user, in user-index order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SimulationResult {
    totals: Vec<u64>,
}

impl SimulationResult {
    pub fn new(totals: Vec<u64>) -> Self {
        SimulationResult { totals }
    }

    pub fn totals(&self) -> &[u64] {
        &self.totals
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = UserTotal> + '_ {
        self.totals
            .iter()
            .enumerate()
            .map(|(i, &points)| UserTotal { user: UserId(i as u64), points })
    }

    pub fn summarize(&self) -> Result<SummaryStatistics, SimError> {
        stats::summarize(&self.totals)
    }
}

/// One simulated week of one user, before and after the cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekRecord {
    pub week: Week,
    pub earned: u64,
    pub credited: u64,
}

/// A seeded engine bound to one validated config.
pub struct Simulation {
    config: SimulationConfig,
    mode: RngMode,
    execution: Execution,
}

impl Simulation {
    pub fn from_config(config: SimulationConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Simulation { config, mode: RngMode::SingleStream, execution: Execution::Sequential })
    }

    pub fn with_mode(mut self, mode: RngMode) -> Self {
        self.mode = mode;
        self
    }

    /// Shard users across threads. Switches to per-user streams, since a
    /// single stream cannot keep its draw order under parallel execution.
    pub fn parallel(mut self) -> Self {
        self.mode = RngMode::PerUser;
        self.execution = Execution::Parallel;
        self
    }

    pub fn run(&self) -> Result<SimulationResult, SimError> {
        let config = &self.config;
        if config.quests.is_empty() {
            warn!("empty quest catalog: every user will total 0 points");
        }
        info!(
            seed = config.seed,
            users = config.users,
            weeks = config.weeks,
            weekly_cap = config.weekly_cap,
            quests = config.quests.len(),
            mode = ?self.mode,
            execution = ?self.execution,
            "simulation started"
        );
        let started = Instant::now();

        let result = match (self.mode, self.execution) {
            (RngMode::SingleStream, Execution::Sequential) => {
                let mut rng = ChaCha20Rng::seed_from_u64(config.seed);
                simulate_users(&config.quests, config.users, config.weeks, config.weekly_cap, &mut rng)
            }
            (RngMode::SingleStream, Execution::Parallel) => {
                return Err(SimError::config(
                    "execution",
                    "parallel execution requires per-user random streams",
                ));
            }
            (RngMode::PerUser, Execution::Sequential) => {
                let totals = (0..config.users).map(|u| per_user_total(config, u)).collect();
                SimulationResult::new(totals)
            }
            (RngMode::PerUser, Execution::Parallel) => {
                // Indexed parallel collect keeps user-index order.
                let totals = (0..config.users)
                    .into_par_iter()
                    .map(|u| per_user_total(config, u))
                    .collect();
                SimulationResult::new(totals)
            }
        };

        info!(
            users = result.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "simulation finished"
        );
        Ok(result)
    }

    /// Week-by-week record for one user. Only per-user streams can replay a
    /// single user without simulating everyone before them.
    pub fn trajectory(&self, user: UserId) -> Result<Vec<WeekRecord>, SimError> {
        if self.mode != RngMode::PerUser {
            return Err(SimError::config("mode", "trajectories require per-user random streams"));
        }
        if user.0 >= self.config.users as u64 {
            return Err(SimError::config(
                "user",
                format!("{} out of range for {} users", user.0, self.config.users),
            ));
        }
        let mut rng = user_rng(self.config.seed, user);
        let mut out = Vec::with_capacity(self.config.weeks as usize);
        let mut week = Week::first();
        for _ in 0..self.config.weeks {
            let earned = simulate_week(&self.config.quests, &mut rng);
            out.push(WeekRecord { week, earned, credited: earned.min(self.config.weekly_cap) });
            week = week.next();
        }
        Ok(out)
    }
}

/// Run a validated config with the reference single stream.
pub fn simulate(config: &SimulationConfig) -> Result<SimulationResult, SimError> {
    Simulation::from_config(config.clone())?.run()
}

/// Run `runs` independent replicas with seeds `seed, seed + 1, ...` in
/// parallel and summarise each. Replica order follows seed order.
pub fn run_many(
    config: &SimulationConfig,
    runs: u64,
    mode: RngMode,
) -> Result<Vec<(u64, SummaryStatistics)>, SimError> {
    if runs == 0 {
        return Err(SimError::config("runs", "must be at least 1, got 0"));
    }
    config.validate()?;
    (0..runs)
        .into_par_iter()
        .map(|i| {
            let mut replica = config.clone();
            replica.seed = config.seed.wrapping_add(i);
            let seed = replica.seed;
            let summary = Simulation::from_config(replica)?.with_mode(mode).run()?.summarize()?;
            debug!(seed, mean = summary.mean, std_dev = summary.std_dev, "replica complete");
            Ok((seed, summary))
        })
        .collect()
}

/// The accrual kernel: users × weeks × quests, drawn from `rng` in that
/// order. Accepts degenerate counts: no users gives an empty result and no
/// weeks gives all zeros. Point sums must fit in a `u64`, which
/// [`SimulationConfig::validate`] guarantees.
pub fn simulate_users(
    quests: &QuestCatalog,
    users: usize,
    weeks: u32,
    weekly_cap: u64,
    rng: &mut impl Rng,
) -> SimulationResult {
    let totals = (0..users)
        .map(|_| simulate_user(quests, weeks, weekly_cap, rng))
        .collect();
    SimulationResult::new(totals)
}

/// Total points of one user over `weeks`, each week capped independently.
pub fn simulate_user(quests: &QuestCatalog, weeks: u32, weekly_cap: u64, rng: &mut impl Rng) -> u64 {
    let mut total = 0_u64;
    for _ in 0..weeks {
        total += simulate_week(quests, rng).min(weekly_cap);
    }
    total
}

/// Uncapped points of one week. Exactly one draw per quest, in catalog order.
pub fn simulate_week(quests: &QuestCatalog, rng: &mut impl Rng) -> u64 {
    quests
        .iter()
        .filter(|q| completes(q, rng))
        .map(|q| q.points)
        .sum()
}

fn completes(quest: &Quest, rng: &mut impl Rng) -> bool {
    let r: f64 = rng.random();
    r < quest.probability
}

fn user_rng(seed: u64, user: UserId) -> ChaCha20Rng {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    rng.set_stream(user.0);
    rng
}

fn per_user_total(config: &SimulationConfig, user: usize) -> u64 {
    let mut rng = user_rng(config.seed, UserId(user as u64));
    simulate_user(&config.quests, config.weeks, config.weekly_cap, &mut rng)
}
