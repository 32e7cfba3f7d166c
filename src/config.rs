use std::fs;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::Path;

use serde::Deserialize;

use crate::error::SimError;
use crate::quest::{QuestCatalog, QuestSpec};

/// Points a user can bank in one week unless configured otherwise.
pub const DEFAULT_WEEKLY_CAP: u64 = 200;
pub const DEFAULT_USERS: usize = 1_000;
pub const DEFAULT_WEEKS: u32 = 4;
pub const DEFAULT_SEED: u64 = 42;

/// Immutable input to one simulation run.
#[derive(Debug, Clone, PartialEq, Hash)]
pub struct SimulationConfig {
    pub seed: u64,
    pub users: usize,
    pub weeks: u32,
    pub weekly_cap: u64,
    pub quests: QuestCatalog,
}

impl SimulationConfig {
    /// Validating constructor. Users and weeks must be positive.
    pub fn new(
        quests: QuestCatalog,
        users: usize,
        weeks: u32,
        weekly_cap: u64,
        seed: u64,
    ) -> Result<Self, SimError> {
        let config = SimulationConfig { seed, users, weeks, weekly_cap, quests };
        config.validate()?;
        Ok(config)
    }

    /// Reference setup: 1000 users over 4 weeks, 200-point cap, default quests.
    pub fn canonical() -> Self {
        SimulationConfig {
            seed: DEFAULT_SEED,
            users: DEFAULT_USERS,
            weeks: DEFAULT_WEEKS,
            weekly_cap: DEFAULT_WEEKLY_CAP,
            quests: QuestCatalog::default_catalog(),
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.users == 0 {
            return Err(SimError::config("users", "must be at least 1, got 0"));
        }
        if self.weeks == 0 {
            return Err(SimError::config("weeks", "must be at least 1, got 0"));
        }
        if self.quests.max_weekly_points().is_none() {
            return Err(SimError::config("quests", "sum of quest points overflows u64"));
        }
        if self.max_total().is_none() {
            return Err(SimError::config(
                "weeks",
                format!(
                    "{} weeks at up to {} points each overflows u64",
                    self.weeks,
                    self.weekly_cap
                ),
            ));
        }
        Ok(())
    }

    /// Largest total any user can reach: `weeks × min(weekly_cap, Σ points)`.
    /// `None` when that does not fit in a `u64`; such configs fail validation.
    pub fn max_total(&self) -> Option<u64> {
        let weekly = self.quests.max_weekly_points()?.min(self.weekly_cap);
        weekly.checked_mul(self.weeks as u64)
    }

    /// Content hash used as the result-cache key.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Load a JSON config file. Absent fields fall back to [`canonical`].
    ///
    /// [`canonical`]: SimulationConfig::canonical
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|source| SimError::Io { path: path.to_path_buf(), source })?;
        let file: ConfigFile = serde_json::from_str(&text)
            .map_err(|source| SimError::Parse { path: path.to_path_buf(), source })?;
        SimulationConfig::try_from(file)
    }
}

/// On-disk shape of a config. Integers are signed so that negative values
/// are rejected by validation with a field name rather than by serde.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub seed: Option<u64>,
    pub users: Option<i64>,
    pub weeks: Option<i64>,
    pub weekly_cap: Option<i64>,
    pub quests: Option<Vec<QuestSpec>>,
}

impl TryFrom<ConfigFile> for SimulationConfig {
    type Error = SimError;

    fn try_from(file: ConfigFile) -> Result<Self, Self::Error> {
        let base = SimulationConfig::canonical();
        let quests = match file.quests {
            Some(specs) => QuestCatalog::new(specs)?,
            None => base.quests,
        };
        let users = match file.users {
            Some(n) => positive("users", n)?,
            None => base.users,
        };
        let weeks = match file.weeks {
            Some(n) => u32::try_from(positive("weeks", n)?)
                .map_err(|_| SimError::config("weeks", format!("{n} exceeds u32::MAX")))?,
            None => base.weeks,
        };
        let weekly_cap = match file.weekly_cap {
            Some(n) => u64::try_from(n)
                .map_err(|_| SimError::config("weekly_cap", format!("must be >= 0, got {n}")))?,
            None => base.weekly_cap,
        };
        SimulationConfig::new(quests, users, weeks, weekly_cap, file.seed.unwrap_or(base.seed))
    }
}

fn positive(field: &'static str, n: i64) -> Result<usize, SimError> {
    if n < 1 {
        return Err(SimError::config(field, format!("must be at least 1, got {n}")));
    }
    usize::try_from(n).map_err(|_| SimError::config(field, format!("{n} out of range")))
}
