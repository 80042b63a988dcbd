//! Simulation settings loaded from TOML.

use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use plot_defence_core::{clamped_seconds, PlotId, WorldPoint};
use plot_defence_system_builder::Config as WalkerConfig;
use plot_defence_system_path_generation::{DirectorConfig, PlotGraph, DEFAULT_MAX_ATTEMPTS};
use plot_defence_system_wave_control::Config as WaveConfig;
use plot_defence_world::WorldConfig;
use serde::Deserialize;

/// Complete settings of a headless run.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SimulationConfig {
    /// Builds the plot graph from proximity instead of authored neighbours.
    pub(crate) nearest_neighbors: Option<usize>,
    pub(crate) session: SessionSettings,
    pub(crate) waves: WaveSettings,
    pub(crate) walker: WalkerSettings,
    pub(crate) enemies: EnemySettings,
    pub(crate) assets: Vec<AssetSettings>,
    pub(crate) plots: Vec<PlotSettings>,
}

/// Player session rules.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SessionSettings {
    pub(crate) starting_health: u32,
    pub(crate) starting_gold: u32,
    pub(crate) upgrade_costs: Vec<u32>,
    pub(crate) max_level: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            starting_health: 20,
            starting_gold: 0,
            upgrade_costs: vec![100, 200, 300],
            max_level: 3,
        }
    }
}

/// Wave sequencing and path generation.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WaveSettings {
    pub(crate) intermission: f32,
    pub(crate) auto_start: bool,
    pub(crate) agent_gates_completion: bool,
    pub(crate) path_attempts: usize,
    pub(crate) run_seed: Option<u64>,
}

impl Default for WaveSettings {
    fn default() -> Self {
        Self {
            intermission: 5.0,
            auto_start: true,
            agent_gates_completion: true,
            path_attempts: DEFAULT_MAX_ATTEMPTS,
            run_seed: None,
        }
    }
}

/// Walking agent movement and input.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WalkerSettings {
    pub(crate) speed: f32,
    pub(crate) dwell: f32,
    pub(crate) snap_epsilon: f32,
    pub(crate) longest_axis_first: bool,
    /// Presses the build button at every dwell.
    pub(crate) auto_build: bool,
}

impl Default for WalkerSettings {
    fn default() -> Self {
        Self {
            speed: 4.0,
            dwell: 1.0,
            snap_epsilon: 0.005,
            longest_axis_first: true,
            auto_build: true,
        }
    }
}

/// Stand-in for combat: every enemy lives for a fixed time and then dies or
/// leaks.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct EnemySettings {
    pub(crate) lifetime: f32,
    pub(crate) death_delay: f32,
    pub(crate) kill_reward: u32,
    pub(crate) leak_damage: u32,
    /// Every n-th spawned enemy leaks; zero means none do.
    pub(crate) leak_every: u32,
}

impl Default for EnemySettings {
    fn default() -> Self {
        Self {
            lifetime: 6.0,
            death_delay: 0.5,
            kill_reward: 5,
            leak_damage: 1,
            leak_every: 4,
        }
    }
}

impl EnemySettings {
    pub(crate) fn lifetime(&self) -> Duration {
        clamped_seconds(self.lifetime)
    }

    pub(crate) fn death_delay(&self) -> Duration {
        clamped_seconds(self.death_delay)
    }
}

/// Asset the entity factory can instantiate.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct AssetSettings {
    #[serde(rename = "ref")]
    pub(crate) asset_ref: String,
}

/// Buildable plot and its authored neighbours.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PlotSettings {
    pub(crate) id: u32,
    pub(crate) x: f32,
    pub(crate) y: f32,
    #[serde(default)]
    pub(crate) neighbors: Vec<u32>,
}

impl SimulationConfig {
    /// Reads and validates the configuration file at `path`.
    pub(crate) fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read simulation config at {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("invalid simulation config at {}", path.display()))
    }

    /// Parses and validates configuration TOML.
    pub(crate) fn from_toml(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).context("failed to parse simulation config toml")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = std::collections::BTreeSet::new();
        for plot in &self.plots {
            if !seen.insert(plot.id) {
                bail!("plot {} is declared twice", plot.id);
            }
            if !plot.x.is_finite() || !plot.y.is_finite() {
                bail!("plot {} has a non-finite anchor", plot.id);
            }
        }
        if !self.walker.speed.is_finite() || self.walker.speed <= 0.0 {
            bail!("walker speed must be positive, got {}", self.walker.speed);
        }
        if !self.walker.snap_epsilon.is_finite() || self.walker.snap_epsilon < 0.0 {
            bail!(
                "walker snap_epsilon must be zero or more, got {}",
                self.walker.snap_epsilon
            );
        }
        Ok(())
    }

    pub(crate) fn world_config(&self) -> WorldConfig {
        WorldConfig::new(
            self.session.starting_health,
            self.session.starting_gold,
            self.session.upgrade_costs.clone(),
            self.session.max_level,
        )
    }

    pub(crate) fn wave_config(&self) -> WaveConfig {
        WaveConfig::new(
            clamped_seconds(self.waves.intermission),
            self.waves.auto_start,
            self.waves.agent_gates_completion,
        )
    }

    pub(crate) fn director_config(&self) -> DirectorConfig {
        DirectorConfig::new(self.waves.path_attempts, self.waves.run_seed)
    }

    pub(crate) fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::new(
            self.walker.speed,
            clamped_seconds(self.walker.dwell),
            self.walker.snap_epsilon,
            self.walker.longest_axis_first,
        )
    }

    pub(crate) fn plot_ids(&self) -> impl Iterator<Item = PlotId> + '_ {
        self.plots.iter().map(|plot| PlotId::new(plot.id))
    }

    pub(crate) fn asset_refs(&self) -> impl Iterator<Item = &str> + '_ {
        self.assets.iter().map(|asset| asset.asset_ref.as_str())
    }

    /// Anchor of the first declared plot, where the walking agent starts.
    pub(crate) fn spawn_point(&self) -> WorldPoint {
        self.plots
            .first()
            .map_or_else(WorldPoint::default, |plot| WorldPoint::new(plot.x, plot.y))
    }

    /// Builds the plot graph from authored neighbours, or from proximity when
    /// `nearest_neighbors` is set.
    pub(crate) fn plot_graph(&self) -> PlotGraph {
        let anchors = self
            .plots
            .iter()
            .map(|plot| (PlotId::new(plot.id), WorldPoint::new(plot.x, plot.y)));

        match self.nearest_neighbors {
            Some(k) => {
                let mut graph = PlotGraph::new();
                for (plot, anchor) in anchors {
                    let _ = graph.add_plot(plot, anchor);
                }
                graph.connect_to_nearest(k);
                graph
            }
            None => {
                let links = self.plots.iter().flat_map(|plot| {
                    plot.neighbors
                        .iter()
                        .map(move |neighbor| (PlotId::new(plot.id), PlotId::new(*neighbor)))
                });
                PlotGraph::from_links(anchors, links)
            }
        }
    }
}
