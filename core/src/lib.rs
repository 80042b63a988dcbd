#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Plot Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Systems and adapters submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that the wave controller and the walking agent drain every tick. Static wave
//! data records live here too so that every crate agrees on a single shape.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Converts authored seconds into a duration, clamping negative and non-finite
/// values to zero.
#[must_use]
pub fn clamped_seconds(seconds: f32) -> Duration {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f32(seconds).unwrap_or(Duration::ZERO)
}

/// Opaque handle to a spawnable enemy asset issued by an [`AssetResolver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetHandle(u32);

impl AssetHandle {
    /// Creates a new asset handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Resolves authored asset references into spawnable handles.
///
/// Implementations return `None` when the reference cannot be loaded; callers
/// treat that as "nothing to spawn" and carry on.
pub trait AssetResolver {
    /// Resolves the asset reference, if it names a known asset.
    fn resolve(&mut self, asset_ref: &str) -> Option<AssetHandle>;
}

/// Spawn lane requested by a wave entry.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Lane(i32);

impl Lane {
    /// Creates a new lane wrapper.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Retrieves the underlying lane index.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }
}

/// Unique identifier assigned to a live enemy by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a buildable plot in the plot graph.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlotId(u32);

impl PlotId {
    /// Creates a new plot identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the plot identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Position of a plot anchor expressed in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    x: f32,
    y: f32,
}

impl WorldPoint {
    /// Creates a new point from its coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }
}

/// Single stop on a walking agent's path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Waypoint {
    /// Plot the agent dwells at.
    pub plot: PlotId,
    /// Anchor the agent walks to.
    pub position: WorldPoint,
}

/// Build state of a plot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PlotBuildState {
    /// Nothing has been constructed yet.
    #[default]
    Empty,
    /// A tower of the given zero-based level stands on the plot.
    Built {
        /// Current level, always below the configured maximum.
        level: u32,
    },
}

impl PlotBuildState {
    /// Level the next construction on this plot would produce.
    #[must_use]
    pub const fn next_level(self) -> u32 {
        match self {
            Self::Empty => 0,
            Self::Built { level } => level + 1,
        }
    }
}

/// Enemy definition from the wave document's catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyCatalogEntry {
    /// Unique key referenced by wave entries.
    pub id: String,
    /// Asset reference passed to the [`AssetResolver`].
    #[serde(rename = "assetRef", alias = "prefab")]
    pub asset_ref: String,
    /// Authored threat cost of a single enemy.
    #[serde(rename = "threatCost")]
    pub threat_cost: i32,
}

/// Spawn group inside a wave.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveEntry {
    /// Catalog id of the enemy to spawn.
    #[serde(rename = "enemy")]
    pub enemy_id: String,
    /// Number of enemies spawned by the group; zero or less spawns nothing.
    pub count: i32,
    /// Seconds between consecutive spawns of the group.
    pub interval: f32,
    /// Seconds from wave start to the first spawn of the group.
    pub delay: f32,
    /// Lane the enemies enter on.
    pub lane: Lane,
}

/// Authored wave made of ordered spawn groups.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveDef {
    /// Identifier used by wave lookups.
    pub id: i32,
    /// Spawn groups in authored order.
    pub entries: Vec<WaveEntry>,
    /// Gold granted once the wave is cleared.
    #[serde(rename = "rewardgold")]
    pub reward_gold: i32,
}

/// Root object of the wave data document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WavesDocument {
    /// Format revision of the document.
    pub version: i32,
    /// Enemy definitions referenced by wave entries.
    #[serde(rename = "enemyCatalog")]
    pub enemy_catalog: Vec<EnemyCatalogEntry>,
    /// Number of hand-authored waves.
    #[serde(rename = "preDeterminedWaves")]
    pub pre_determined_waves: i32,
    /// Authored waves.
    pub waves: Vec<WaveDef>,
}

/// Discrete spawn scheduled relative to the start of a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpawnEvent {
    /// Offset from wave start at which the spawn fires.
    pub time: Duration,
    /// Asset to spawn.
    pub asset: AssetHandle,
    /// Lane to spawn on.
    pub lane: Lane,
}

/// States of the wave run controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WaveState {
    /// Before the run starts; nothing is queued.
    #[default]
    Idle,
    /// Between waves; counting down to the next wave.
    Intermission,
    /// A wave timeline is being replayed.
    Spawning,
    /// Progress is frozen until resumed.
    Paused,
    /// The run ended; only a full restart leaves this state.
    GameOver,
}

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunOutcome {
    /// Every wave was cleared or every plot reached its final level.
    Victory,
    /// The player's health was depleted.
    Defeat,
}

/// Reasons a build request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuildRejection {
    /// The plot is not registered with the world.
    UnknownPlot,
    /// The plot already carries its final level.
    MaxLevel,
    /// The player cannot afford the upgrade.
    InsufficientGold,
}

/// Commands that express all permissible mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Requests that the entity factory spawn an enemy.
    SpawnEnemy {
        /// Asset to instantiate.
        asset: AssetHandle,
        /// Lane the enemy enters on.
        lane: Lane,
    },
    /// Marks an enemy as killed, paying out its reward.
    KillEnemy {
        /// Enemy that died.
        enemy: EnemyId,
        /// Gold awarded to the player.
        reward: u32,
    },
    /// Marks an enemy as having reached the exit, damaging the player.
    LeakEnemy {
        /// Enemy that leaked.
        enemy: EnemyId,
        /// Health removed from the player.
        damage: u32,
    },
    /// Removes a dying enemy once its death sequence completed.
    CompleteEnemyDeath {
        /// Enemy whose death sequence finished.
        enemy: EnemyId,
    },
    /// Removes health from the player.
    ApplyDamage {
        /// Health to remove.
        amount: u32,
    },
    /// Grants gold to the player.
    AddGold {
        /// Gold to add.
        amount: u32,
    },
    /// Attempts to spend gold; succeeds fully or not at all.
    SpendGold {
        /// Gold to deduct.
        amount: u32,
    },
    /// Requests construction or upgrade of the tower on a plot.
    BuildOnPlot {
        /// Plot to build on.
        plot: PlotId,
    },
    /// Hands a fresh path to the walking agent.
    BeginPath {
        /// Ordered stops of the path.
        waypoints: Vec<Waypoint>,
    },
}

/// Events broadcast after processing commands or advancing systems.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that an enemy entered the world.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Asset the enemy was created from.
        asset: AssetHandle,
        /// Lane the enemy entered on.
        lane: Lane,
    },
    /// Reports that a spawn request named an asset the factory does not know.
    SpawnRejected {
        /// Asset that could not be instantiated.
        asset: AssetHandle,
        /// Lane of the rejected spawn.
        lane: Lane,
    },
    /// Confirms that an enemy was killed and started dying.
    EnemyKilled {
        /// Enemy that died.
        enemy: EnemyId,
        /// Gold awarded for the kill.
        reward: u32,
    },
    /// Confirms that an enemy leaked and started dying.
    EnemyLeaked {
        /// Enemy that leaked.
        enemy: EnemyId,
        /// Damage dealt to the player.
        damage: u32,
    },
    /// Confirms that an enemy's death sequence finished and it left the world.
    EnemyRemoved {
        /// Enemy that was removed.
        enemy: EnemyId,
    },
    /// Announces the player's new health.
    HealthChanged {
        /// Remaining health.
        health: u32,
    },
    /// Announces the player's new gold balance.
    GoldChanged {
        /// Current balance.
        gold: u32,
    },
    /// Reports a spend request the balance could not cover.
    GoldSpendRejected {
        /// Amount that was requested.
        amount: u32,
    },
    /// The player's health reached zero.
    Defeated,
    /// Confirms that a tower was built or upgraded.
    PlotBuilt {
        /// Plot that was built on.
        plot: PlotId,
        /// Level the plot carries now.
        level: u32,
        /// Gold spent on the construction.
        cost: u32,
    },
    /// Reports that a build request was refused.
    BuildRejected {
        /// Plot named in the request.
        plot: PlotId,
        /// Specific reason the build failed.
        reason: BuildRejection,
    },
    /// Every registered plot carries its final level.
    AllPlotsMaxed,
    /// Announces that the wave controller entered a new state.
    WaveStateChanged {
        /// State that became active.
        state: WaveState,
    },
    /// Announces that a wave timeline started.
    WaveStarted {
        /// Wave number requested from the catalog.
        wave: u32,
        /// Number of spawn events scheduled for the wave.
        spawns: usize,
    },
    /// Announces that a wave was fully cleared.
    WaveCleared {
        /// Wave number that was cleared.
        wave: u32,
    },
    /// Announces the end of the run.
    RunEnded {
        /// How the run ended.
        outcome: RunOutcome,
    },
    /// The walking agent started a new path.
    PathStarted {
        /// Plots of the path in walking order.
        plots: Vec<PlotId>,
    },
    /// The walking agent reached a node.
    NodeArrived {
        /// Index of the node within the path.
        index: usize,
        /// Plot reached.
        plot: PlotId,
    },
    /// The walking agent started dwelling at a node.
    DwellStarted {
        /// Index of the node within the path.
        index: usize,
        /// Dwell duration.
        duration: Duration,
    },
    /// The walking agent finished dwelling at a node.
    DwellCompleted {
        /// Index of the node within the path.
        index: usize,
        /// Whether a build press was registered during the dwell.
        pressed: bool,
    },
    /// The walking agent finished its path.
    PathCompleted,
    /// The walking agent abandoned its path.
    PathCancelled {
        /// Why the path was abandoned.
        reason: String,
    },
    /// The walking agent asked to build on the plot it dwells at.
    BuildRequested {
        /// Plot to build on.
        plot: PlotId,
    },
}

#[cfg(test)]
mod tests {
    use super::{clamped_seconds, Lane, PlotBuildState, WavesDocument};
    use std::time::Duration;

    #[test]
    fn clamped_seconds_rejects_negative_and_non_finite_values() {
        assert_eq!(clamped_seconds(-1.5), Duration::ZERO);
        assert_eq!(clamped_seconds(f32::NAN), Duration::ZERO);
        assert_eq!(clamped_seconds(f32::INFINITY), Duration::ZERO);
        assert_eq!(clamped_seconds(0.5), Duration::from_millis(500));
    }

    #[test]
    fn next_level_advances_from_empty() {
        assert_eq!(PlotBuildState::Empty.next_level(), 0);
        assert_eq!(PlotBuildState::Built { level: 1 }.next_level(), 2);
    }

    #[test]
    fn wave_document_uses_authored_key_names() {
        let json = r#"{
            "version": 2,
            "enemyCatalog": [{"id": "slime", "prefab": "Enemies/Slime", "threatCost": 3}],
            "preDeterminedWaves": 1,
            "waves": [{"id": 1, "entries": [{"enemy": "slime", "count": 4, "lane": 2}], "rewardgold": 25}]
        }"#;

        let document: WavesDocument = serde_json::from_str(json).expect("document parses");
        assert_eq!(document.enemy_catalog[0].asset_ref, "Enemies/Slime");
        let wave = &document.waves[0];
        assert_eq!(wave.reward_gold, 25);
        assert_eq!(wave.entries[0].enemy_id, "slime");
        assert_eq!(wave.entries[0].lane, Lane::new(2));
        assert_eq!(wave.entries[0].interval, 0.0, "missing fields default");
    }
}
