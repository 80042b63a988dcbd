//! Per-wave path requests for the walking agent.

use plot_defence_core::{PlotId, Waypoint};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::{generate_covering_path_from, PlotGraph, DEFAULT_MAX_ATTEMPTS};

const RNG_STREAM_PATH_PREFIX: &str = "path:";

/// Configuration applied by the [`PathDirector`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirectorConfig {
    max_attempts: usize,
    run_seed: Option<u64>,
}

impl DirectorConfig {
    /// Creates a new configuration. A `run_seed` of `None` draws every path
    /// from system entropy.
    #[must_use]
    pub const fn new(max_attempts: usize, run_seed: Option<u64>) -> Self {
        Self {
            max_attempts,
            run_seed,
        }
    }

    /// Attempts made per path request.
    #[must_use]
    pub const fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Seed shared by every path of the run, if any.
    #[must_use]
    pub const fn run_seed(&self) -> Option<u64> {
        self.run_seed
    }
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, None)
    }
}

/// Generates a fresh covering path for every wave.
///
/// Consecutive paths are chained: each one starts at the plot where the agent
/// finished its previous walk, so the agent never teleports between waves.
#[derive(Debug)]
pub struct PathDirector {
    graph: PlotGraph,
    config: DirectorConfig,
    last_end: Option<PlotId>,
    last_path: Vec<PlotId>,
}

impl PathDirector {
    /// Creates a director over the provided plot graph.
    #[must_use]
    pub fn new(graph: PlotGraph, config: DirectorConfig) -> Self {
        Self {
            graph,
            config,
            last_end: None,
            last_path: Vec::new(),
        }
    }

    /// Produces the waypoints the agent should walk during `wave`.
    ///
    /// Returns an empty list when the graph has no plots.
    pub fn begin_wave_path(&mut self, wave: u32) -> Vec<Waypoint> {
        let start = self
            .last_end
            .filter(|plot| self.graph.contains(*plot))
            .or_else(|| self.graph.plots().next());
        let Some(start) = start else {
            warn!(wave, "no plots available for the walking agent");
            self.last_path.clear();
            return Vec::new();
        };

        let mut rng = match self.config.run_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(derive_wave_seed(seed, wave)),
            None => ChaCha8Rng::from_entropy(),
        };
        let path =
            generate_covering_path_from(&self.graph, start, self.config.max_attempts, &mut rng);

        if path.len() < self.graph.len() {
            warn!(
                wave,
                covered = path.len(),
                total = self.graph.len(),
                "wave path does not visit every plot"
            );
        }
        debug!(wave, start = start.get(), len = path.len(), "wave path generated");

        let waypoints = path
            .iter()
            .filter_map(|plot| {
                self.graph.position(*plot).map(|position| Waypoint {
                    plot: *plot,
                    position,
                })
            })
            .collect();
        self.last_path = path;
        waypoints
    }

    /// Records that the agent finished the most recent path.
    pub fn path_completed(&mut self) {
        if let Some(end) = self.last_path.last() {
            self.last_end = Some(*end);
        }
    }

    /// Forgets where previous walks ended so the next path starts at the first
    /// plot again.
    pub fn reset(&mut self) {
        self.last_end = None;
        self.last_path.clear();
    }

    /// Plot where the previous completed walk ended.
    #[must_use]
    pub const fn last_end(&self) -> Option<PlotId> {
        self.last_end
    }

    /// Graph the director plans over.
    #[must_use]
    pub const fn graph(&self) -> &PlotGraph {
        &self.graph
    }

    /// Configuration in effect.
    #[must_use]
    pub const fn config(&self) -> DirectorConfig {
        self.config
    }
}

fn derive_wave_seed(run_seed: u64, wave: u32) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(run_seed.to_le_bytes());
    hasher.update(RNG_STREAM_PATH_PREFIX.as_bytes());
    hasher.update(wave.to_le_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
