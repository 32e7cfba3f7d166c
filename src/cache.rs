use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::SimulationConfig;
use crate::error::SimError;
use crate::simulation::{RngMode, Simulation, SimulationResult};

/// Memoises results by config content. Runs are deterministic in
/// `(config, mode)`, so a hit is indistinguishable from a fresh run.
///
/// Unbounded: entries are never evicted, only dropped by [`clear`].
///
/// [`clear`]: ResultCache::clear
#[derive(Default)]
pub struct ResultCache {
    entries: HashMap<(u64, RngMode), Vec<(SimulationConfig, Arc<SimulationResult>)>>,
    hits: u64,
    misses: u64,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_run(
        &mut self,
        config: &SimulationConfig,
        mode: RngMode,
    ) -> Result<Arc<SimulationResult>, SimError> {
        let key = (config.fingerprint(), mode);
        // Colliding fingerprints share a bucket; match on the full config.
        if let Some(bucket) = self.entries.get(&key)
            && let Some((_, result)) = bucket.iter().find(|(c, _)| c == config)
        {
            self.hits += 1;
            debug!(fingerprint = key.0, "result cache hit");
            return Ok(Arc::clone(result));
        }

        self.misses += 1;
        let result = Arc::new(Simulation::from_config(config.clone())?.with_mode(mode).run()?);
        self.entries
            .entry(key)
            .or_default()
            .push((config.clone(), Arc::clone(&result)));
        Ok(result)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
