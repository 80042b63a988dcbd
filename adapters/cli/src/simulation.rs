//! Fixed-step headless driver wiring the world, the wave controller and the
//! walking agent together.

use std::{fmt, mem, time::Duration};

use plot_defence_core::{Command, EnemyId, Event, RunOutcome, WaveState};
use plot_defence_system_builder::{PathOverrides, Walker, WalkerStatus};
use plot_defence_system_catalog::WaveCatalog;
use plot_defence_system_path_generation::PathDirector;
use plot_defence_system_wave_control::{WaveRunController, WaveView};
use plot_defence_world::{self as world, query, AssetRegistry, World};
use tracing::{debug, info};

use crate::config::{EnemySettings, SimulationConfig};

const RUN_ENDED_REASON: &str = "RunEnded";

/// Totals reported once the run stops.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) ticks: u64,
    pub(crate) elapsed: Duration,
    pub(crate) outcome: Option<RunOutcome>,
    pub(crate) waves_started: u32,
    pub(crate) waves_cleared: u32,
    pub(crate) enemies_spawned: u32,
    pub(crate) enemies_killed: u32,
    pub(crate) enemies_leaked: u32,
    pub(crate) plots_built: u32,
    pub(crate) builds_rejected: u32,
    pub(crate) health: u32,
    pub(crate) gold: u32,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = match self.outcome {
            Some(RunOutcome::Victory) => "victory",
            Some(RunOutcome::Defeat) => "defeat",
            None => "unfinished",
        };
        writeln!(
            f,
            "outcome: {outcome} after {} ticks ({:.1}s)",
            self.ticks,
            self.elapsed.as_secs_f32()
        )?;
        writeln!(
            f,
            "waves: {} started, {} cleared",
            self.waves_started, self.waves_cleared
        )?;
        writeln!(
            f,
            "enemies: {} spawned, {} killed, {} leaked",
            self.enemies_spawned, self.enemies_killed, self.enemies_leaked
        )?;
        writeln!(
            f,
            "plots: {} builds, {} rejected",
            self.plots_built, self.builds_rejected
        )?;
        write!(f, "player: {} health, {} gold", self.health, self.gold)
    }
}

#[derive(Debug)]
struct Lifetime {
    enemy: EnemyId,
    remaining: Duration,
    leaks: bool,
}

/// Lifetime model standing in for combat.
#[derive(Debug)]
struct EnemyClock {
    settings: EnemySettings,
    alive: Vec<Lifetime>,
    dying: Vec<(EnemyId, Duration)>,
    spawned: u32,
}

impl EnemyClock {
    fn new(settings: EnemySettings) -> Self {
        Self {
            settings,
            alive: Vec::new(),
            dying: Vec::new(),
            spawned: 0,
        }
    }

    fn track(&mut self, enemy: EnemyId) {
        self.spawned = self.spawned.wrapping_add(1);
        let leak_every = self.settings.leak_every;
        self.alive.push(Lifetime {
            enemy,
            remaining: self.settings.lifetime(),
            leaks: leak_every > 0 && self.spawned % leak_every == 0,
        });
    }

    fn begin_dying(&mut self, enemy: EnemyId) {
        self.alive.retain(|lifetime| lifetime.enemy != enemy);
        self.dying.push((enemy, self.settings.death_delay()));
    }

    fn forget(&mut self, enemy: EnemyId) {
        self.dying.retain(|(id, _)| *id != enemy);
    }

    fn clear(&mut self) {
        self.alive.clear();
        self.dying.clear();
    }

    /// Counts down lifetimes and death sequences, requesting the outcome of
    /// every timer that ran out.
    fn advance(&mut self, dt: Duration, commands: &mut Vec<Command>) {
        for (enemy, remaining) in &mut self.dying {
            *remaining = remaining.saturating_sub(dt);
            if remaining.is_zero() {
                commands.push(Command::CompleteEnemyDeath { enemy: *enemy });
            }
        }

        for lifetime in &mut self.alive {
            lifetime.remaining = lifetime.remaining.saturating_sub(dt);
            if !lifetime.remaining.is_zero() {
                continue;
            }
            commands.push(if lifetime.leaks {
                Command::LeakEnemy {
                    enemy: lifetime.enemy,
                    damage: self.settings.leak_damage,
                }
            } else {
                Command::KillEnemy {
                    enemy: lifetime.enemy,
                    reward: self.settings.kill_reward,
                }
            });
        }
    }
}

/// Headless run of a single session.
#[derive(Debug)]
pub(crate) struct Simulation {
    world: World,
    assets: AssetRegistry,
    controller: WaveRunController,
    walker: Walker,
    enemies: EnemyClock,
    auto_build: bool,
    observed: Vec<Event>,
    summary: Summary,
}

impl Simulation {
    /// Builds every component from `config` and the loaded `catalog`.
    pub(crate) fn new(config: &SimulationConfig, catalog: WaveCatalog) -> Self {
        let world = World::new(config.world_config())
            .with_assets(config.asset_refs())
            .with_plots(config.plot_ids());
        let assets = query::asset_registry(&world).clone();

        let graph = config.plot_graph();
        let director = (!graph.is_empty())
            .then(|| PathDirector::new(graph, config.director_config()));
        let mut controller = WaveRunController::new(config.wave_config(), catalog, director);

        if !config.waves.auto_start {
            let mut started = Vec::new();
            controller.start_run(&mut started);
            debug!(events = started.len(), "run started manually");
        }

        Self {
            world,
            assets,
            controller,
            walker: Walker::new(config.walker_config(), config.spawn_point()),
            enemies: EnemyClock::new(config.enemies.clone()),
            auto_build: config.walker.auto_build,
            observed: Vec::new(),
            summary: Summary::default(),
        }
    }

    /// Steps the run with a fixed `dt` until it ends or `max_ticks` elapse.
    pub(crate) fn run(mut self, dt: Duration, max_ticks: u64) -> Summary {
        while self.summary.ticks < max_ticks && self.controller.state() != WaveState::GameOver {
            self.tick(dt);
        }
        if self.controller.state() != WaveState::GameOver {
            info!(ticks = self.summary.ticks, "tick limit reached before the run ended");
        }

        self.summary.outcome = self.controller.outcome();
        self.summary.health = query::health(&self.world);
        self.summary.gold = query::gold(&self.world);
        self.summary
    }

    /// Advances every component by one step.
    ///
    /// The controller sees what the world and the agent reported during the
    /// previous step, so its decisions lag one step behind them.
    pub(crate) fn tick(&mut self, dt: Duration) {
        self.summary.ticks += 1;
        self.summary.elapsed = self.summary.elapsed.saturating_add(dt);

        let observed = mem::take(&mut self.observed);
        let mut commands = Vec::new();
        let mut controller_events = Vec::new();
        self.controller.update(
            dt,
            WaveView::new(&observed, query::live_enemies(&self.world)),
            &mut self.assets,
            &mut commands,
            &mut controller_events,
        );

        let mut walker_events = Vec::new();
        for event in &controller_events {
            match event {
                Event::WaveStarted { wave, spawns } => {
                    self.summary.waves_started += 1;
                    debug!(wave, spawns, "wave under way");
                }
                Event::WaveCleared { .. } => self.summary.waves_cleared += 1,
                Event::RunEnded { .. } => {
                    self.walker.cancel_path(RUN_ENDED_REASON, &mut walker_events);
                    self.enemies.clear();
                }
                _ => {}
            }
        }

        if self.controller.state() != WaveState::GameOver {
            self.enemies.advance(dt, &mut commands);
        }

        let mut world_events = Vec::new();
        for command in commands {
            match command {
                Command::BeginPath { waypoints } => {
                    self.walker
                        .begin_path(waypoints, PathOverrides::default(), &mut walker_events);
                }
                command => world::apply(&mut self.world, command, &mut world_events),
            }
        }

        self.walker.update(dt, &mut walker_events);
        if self.auto_build && self.walker.status() == WalkerStatus::Dwelling {
            self.walker.register_press(&mut walker_events);
        }
        for event in &walker_events {
            if let Event::BuildRequested { plot } = event {
                world::apply(
                    &mut self.world,
                    Command::BuildOnPlot { plot: *plot },
                    &mut world_events,
                );
            }
        }

        for event in &world_events {
            self.record(event);
        }

        self.observed.extend(world_events);
        self.observed.extend(walker_events);
    }

    fn record(&mut self, event: &Event) {
        match event {
            Event::EnemySpawned { enemy, .. } => {
                self.summary.enemies_spawned += 1;
                self.enemies.track(*enemy);
            }
            Event::EnemyKilled { enemy, .. } => {
                self.summary.enemies_killed += 1;
                self.enemies.begin_dying(*enemy);
            }
            Event::EnemyLeaked { enemy, .. } => {
                self.summary.enemies_leaked += 1;
                self.enemies.begin_dying(*enemy);
            }
            Event::EnemyRemoved { enemy } => self.enemies.forget(*enemy),
            Event::PlotBuilt { plot, level, cost } => {
                self.summary.plots_built += 1;
                info!(plot = plot.get(), level, cost, "plot built");
            }
            Event::BuildRejected { plot, reason } => {
                self.summary.builds_rejected += 1;
                debug!(plot = plot.get(), ?reason, "build rejected");
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAVES: &str = r#"{
        "version": 1,
        "enemyCatalog": [{"id": "grunt", "assetRef": "Enemies/Grunt", "threatCost": 1}],
        "preDeterminedWaves": 2,
        "waves": [
            {"id": 1, "entries": [{"enemy": "grunt", "count": 3, "interval": 0.5, "delay": 0.0, "lane": 0}], "rewardgold": 50},
            {"id": 2, "entries": [{"enemy": "grunt", "count": 4, "interval": 0.5, "delay": 0.0, "lane": 0}], "rewardgold": 50}
        ]
    }"#;

    const CONFIG: &str = r#"
        [session]
        starting_health = 5
        starting_gold = 100

        [waves]
        intermission = 1.0
        run_seed = 42

        [walker]
        speed = 8.0
        dwell = 0.5

        [enemies]
        lifetime = 2.0
        death_delay = 0.25
        leak_every = 0

        [[assets]]
        ref = "Enemies/Grunt"

        [[plots]]
        id = 1
        x = 0.0
        y = 0.0
        neighbors = [2]

        [[plots]]
        id = 2
        x = 2.0
        y = 0.0
        neighbors = [3]

        [[plots]]
        id = 3
        x = 2.0
        y = 2.0
    "#;

    fn simulation(config: &str) -> Simulation {
        let config = SimulationConfig::from_toml(config).expect("config parses");
        let catalog = WaveCatalog::from_json(WAVES).expect("waves parse");
        Simulation::new(&config, catalog)
    }

    #[test]
    fn run_clears_every_wave() {
        let summary = simulation(CONFIG).run(Duration::from_millis(50), 10_000);

        assert_eq!(summary.outcome, Some(RunOutcome::Victory));
        assert_eq!(summary.waves_started, 2);
        assert_eq!(summary.waves_cleared, 2);
        assert_eq!(summary.enemies_spawned, 7);
        assert_eq!(summary.enemies_killed, 7);
        assert_eq!(summary.enemies_leaked, 0);
        assert_eq!(summary.health, 5);
        assert!(summary.plots_built >= 1, "the agent builds while dwelling");
    }

    #[test]
    fn leaking_enemies_defeat_the_player() {
        let config = CONFIG.replace("leak_every = 0", "leak_every = 1");
        let summary = simulation(&config).run(Duration::from_millis(50), 10_000);

        assert_eq!(summary.outcome, Some(RunOutcome::Defeat));
        assert_eq!(summary.health, 0);
        assert_eq!(summary.enemies_killed, 0);
    }

    #[test]
    fn tick_limit_stops_an_unfinished_run() {
        let summary = simulation(CONFIG).run(Duration::from_millis(100), 3);

        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.outcome, None);
        assert_eq!(
            summary.to_string().lines().next(),
            Some("outcome: unfinished after 3 ticks (0.3s)"),
        );
    }

    #[test]
    fn runs_replay_identically_with_a_seed() {
        let first = simulation(CONFIG).run(Duration::from_millis(50), 10_000);
        let second = simulation(CONFIG).run(Duration::from_millis(50), 10_000);
        assert_eq!(first, second);
    }

    #[test]
    fn manual_start_begins_counting_immediately() {
        let config = CONFIG.replace("run_seed = 42", "run_seed = 42\nauto_start = false");
        let mut simulation = simulation(&config);
        assert_eq!(simulation.controller.state(), WaveState::Intermission);

        simulation.tick(Duration::from_millis(500));
        assert_eq!(simulation.controller.state(), WaveState::Intermission);
        simulation.tick(Duration::from_millis(500));
        assert_eq!(simulation.controller.state(), WaveState::Spawning);
    }
}
