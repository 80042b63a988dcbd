#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Plot Defence.
//!
//! The world owns the player session, the enemy ledger, the registered enemy
//! assets and the build state of every plot. It is only mutated through
//! [`apply`], which reports every observable change as an [`Event`].

mod assets;
mod enemies;
mod plots;

use plot_defence_core::{BuildRejection, Command, Event, PlotId};
use tracing::{debug, info, warn};

pub use assets::AssetRegistry;
pub use enemies::EnemyStatus;

use enemies::EnemyLedger;
use plots::PlotRegistry;

const DEFAULT_STARTING_HEALTH: u32 = 20;
const DEFAULT_UPGRADE_COSTS: [u32; 3] = [100, 200, 300];
const DEFAULT_MAX_LEVEL: u32 = 3;

/// Session rules applied by the world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldConfig {
    starting_health: u32,
    starting_gold: u32,
    upgrade_costs: Vec<u32>,
    max_level: u32,
}

impl WorldConfig {
    /// Creates a new configuration.
    ///
    /// `upgrade_costs[n]` is the price of building level `n`; levels without a
    /// listed price are free. Plots accept levels `0..max_level`.
    #[must_use]
    pub fn new(
        starting_health: u32,
        starting_gold: u32,
        upgrade_costs: Vec<u32>,
        max_level: u32,
    ) -> Self {
        Self {
            starting_health,
            starting_gold,
            upgrade_costs,
            max_level,
        }
    }

    /// Health the player starts with.
    #[must_use]
    pub const fn starting_health(&self) -> u32 {
        self.starting_health
    }

    /// Gold the player starts with.
    #[must_use]
    pub const fn starting_gold(&self) -> u32 {
        self.starting_gold
    }

    /// Number of levels a plot can be built up to.
    #[must_use]
    pub const fn max_level(&self) -> u32 {
        self.max_level
    }

    /// Price of building `level`.
    #[must_use]
    pub fn cost_of(&self, level: u32) -> u32 {
        usize::try_from(level)
            .ok()
            .and_then(|index| self.upgrade_costs.get(index))
            .copied()
            .unwrap_or(0)
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_STARTING_HEALTH,
            0,
            DEFAULT_UPGRADE_COSTS.to_vec(),
            DEFAULT_MAX_LEVEL,
        )
    }
}

/// Represents the authoritative Plot Defence world state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    health: u32,
    gold: u32,
    defeated: bool,
    all_maxed_reported: bool,
    assets: AssetRegistry,
    enemies: EnemyLedger,
    plots: PlotRegistry,
}

impl World {
    /// Creates a world without assets or plots.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        Self {
            health: config.starting_health,
            gold: config.starting_gold,
            defeated: false,
            all_maxed_reported: false,
            assets: AssetRegistry::new(),
            enemies: EnemyLedger::default(),
            plots: PlotRegistry::default(),
            config,
        }
    }

    /// Registers the enemy assets the entity factory can instantiate.
    #[must_use]
    pub fn with_assets<I, S>(mut self, asset_refs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for asset_ref in asset_refs {
            let _ = self.assets.register(asset_ref.as_ref());
        }
        self
    }

    /// Registers empty buildable plots.
    #[must_use]
    pub fn with_plots<I>(mut self, plots: I) -> Self
    where
        I: IntoIterator<Item = PlotId>,
    {
        for plot in plots {
            if !self.plots.add(plot) {
                debug!(plot = plot.get(), "plot registered twice");
            }
        }
        self
    }

    fn change_gold(&mut self, gold: u32, out_events: &mut Vec<Event>) {
        if gold != self.gold {
            self.gold = gold;
            out_events.push(Event::GoldChanged { gold });
        }
    }

    fn damage(&mut self, amount: u32, out_events: &mut Vec<Event>) {
        if amount == 0 {
            return;
        }

        self.health = self.health.saturating_sub(amount);
        out_events.push(Event::HealthChanged {
            health: self.health,
        });

        if self.health == 0 && !self.defeated {
            self.defeated = true;
            info!("player health depleted");
            out_events.push(Event::Defeated);
        }
    }

    fn build(&mut self, plot: PlotId, out_events: &mut Vec<Event>) {
        let Some(state) = self.plots.state(plot) else {
            warn!(plot = plot.get(), "build requested on an unknown plot");
            out_events.push(Event::BuildRejected {
                plot,
                reason: BuildRejection::UnknownPlot,
            });
            return;
        };

        let level = state.next_level();
        if level >= self.config.max_level {
            out_events.push(Event::BuildRejected {
                plot,
                reason: BuildRejection::MaxLevel,
            });
            return;
        }

        let cost = self.config.cost_of(level);
        if self.gold < cost {
            debug!(plot = plot.get(), cost, gold = self.gold, "not enough gold to build");
            out_events.push(Event::BuildRejected {
                plot,
                reason: BuildRejection::InsufficientGold,
            });
            return;
        }

        self.change_gold(self.gold - cost, out_events);
        self.plots.set_level(plot, level);
        out_events.push(Event::PlotBuilt { plot, level, cost });

        let last_level = self.config.max_level.saturating_sub(1);
        if !self.all_maxed_reported && self.plots.all_at_least(last_level) {
            self.all_maxed_reported = true;
            info!("every plot reached its final level");
            out_events.push(Event::AllPlotsMaxed);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SpawnEnemy { asset, lane } => {
            if !world.assets.contains(asset) {
                warn!(
                    asset = asset.get(),
                    lane = lane.get(),
                    "spawn requested for an unknown asset"
                );
                out_events.push(Event::SpawnRejected { asset, lane });
                return;
            }
            let enemy = world.enemies.insert(asset, lane);
            out_events.push(Event::EnemySpawned { enemy, asset, lane });
        }
        Command::KillEnemy { enemy, reward } => {
            if !world.enemies.begin_dying(enemy) {
                debug!(enemy = enemy.get(), "kill ignored for an enemy that is not alive");
                return;
            }
            out_events.push(Event::EnemyKilled { enemy, reward });
            let gold = world.gold.saturating_add(reward);
            world.change_gold(gold, out_events);
        }
        Command::LeakEnemy { enemy, damage } => {
            if !world.enemies.begin_dying(enemy) {
                debug!(enemy = enemy.get(), "leak ignored for an enemy that is not alive");
                return;
            }
            out_events.push(Event::EnemyLeaked { enemy, damage });
            world.damage(damage, out_events);
        }
        Command::CompleteEnemyDeath { enemy } => {
            if world.enemies.remove_dying(enemy) {
                out_events.push(Event::EnemyRemoved { enemy });
            }
        }
        Command::ApplyDamage { amount } => world.damage(amount, out_events),
        Command::AddGold { amount } => {
            let gold = world.gold.saturating_add(amount);
            world.change_gold(gold, out_events);
        }
        Command::SpendGold { amount } => {
            if world.gold >= amount {
                let gold = world.gold - amount;
                world.change_gold(gold, out_events);
            } else {
                out_events.push(Event::GoldSpendRejected { amount });
            }
        }
        Command::BuildOnPlot { plot } => world.build(plot, out_events),
        Command::BeginPath { waypoints } => {
            // Paths belong to the walking agent; adapters route them there.
            debug!(len = waypoints.len(), "world ignores path requests");
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use plot_defence_core::{AssetHandle, EnemyId, Lane, PlotBuildState, PlotId};

    use super::{AssetRegistry, EnemyStatus, World, WorldConfig};

    /// Remaining player health.
    #[must_use]
    pub fn health(world: &World) -> u32 {
        world.health
    }

    /// Current gold balance.
    #[must_use]
    pub fn gold(world: &World) -> u32 {
        world.gold
    }

    /// Reports whether health reached zero.
    #[must_use]
    pub fn is_defeated(world: &World) -> bool {
        world.defeated
    }

    /// Number of enemies spawned and not yet removed, dying ones included.
    #[must_use]
    pub fn live_enemies(world: &World) -> usize {
        world.enemies.len()
    }

    /// Captures the enemies tracked by the world in identifier order.
    #[must_use]
    pub fn enemies(world: &World) -> Vec<EnemySnapshot> {
        world
            .enemies
            .iter()
            .map(|(id, record)| EnemySnapshot {
                id,
                asset: record.asset,
                lane: record.lane,
                status: record.status,
            })
            .collect()
    }

    /// Build state of a plot, if registered.
    #[must_use]
    pub fn plot_state(world: &World, plot: PlotId) -> Option<PlotBuildState> {
        world.plots.state(plot)
    }

    /// Registered plots with their build state in identifier order.
    #[must_use]
    pub fn plots(world: &World) -> Vec<(PlotId, PlotBuildState)> {
        world.plots.iter().collect()
    }

    /// Price of the next construction on the plot, or `None` when the plot is
    /// unknown or already at its final level.
    #[must_use]
    pub fn upgrade_cost(world: &World, plot: PlotId) -> Option<u32> {
        let level = world.plots.state(plot)?.next_level();
        (level < world.config.max_level).then(|| world.config.cost_of(level))
    }

    /// Assets known to the entity factory.
    #[must_use]
    pub fn asset_registry(world: &World) -> &AssetRegistry {
        &world.assets
    }

    /// Session rules the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &WorldConfig {
        &world.config
    }

    /// Immutable representation of a single enemy used for queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct EnemySnapshot {
        /// Identifier assigned at spawn.
        pub id: EnemyId,
        /// Asset the enemy was created from.
        pub asset: AssetHandle,
        /// Lane the enemy entered on.
        pub lane: Lane,
        /// Lifecycle stage.
        pub status: EnemyStatus,
    }
}
