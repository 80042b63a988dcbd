#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave run controller orchestrating catalog, scheduler and path director.
//!
//! The controller is a small state machine driven once per frame through
//! [`WaveRunController::update`]. It reads the events the world and the
//! walking agent produced during the previous tick, decides when waves start
//! and clear, and expresses every side effect as a [`Command`] for the world
//! or the walking agent plus an [`Event`] describing its own progress.

use std::time::Duration;

use plot_defence_core::{AssetResolver, Command, Event, RunOutcome, WaveState};
use plot_defence_system_catalog::WaveCatalog;
use plot_defence_system_path_generation::PathDirector;
use plot_defence_system_spawning::{build_timeline, SpawnScheduler};
use tracing::{debug, info, warn};

/// Configuration parameters required to construct the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    intermission: Duration,
    auto_start: bool,
    agent_gates_completion: bool,
}

impl Config {
    /// Creates a new configuration.
    ///
    /// With `agent_gates_completion` set, a wave only clears once the walking
    /// agent finished (or abandoned) the path handed out for it.
    #[must_use]
    pub const fn new(
        intermission: Duration,
        auto_start: bool,
        agent_gates_completion: bool,
    ) -> Self {
        Self {
            intermission,
            auto_start,
            agent_gates_completion,
        }
    }

    /// Time between a cleared wave and the next one.
    #[must_use]
    pub const fn intermission(&self) -> Duration {
        self.intermission
    }

    /// Reports whether the run starts on the first update.
    #[must_use]
    pub const fn auto_start(&self) -> bool {
        self.auto_start
    }

    /// Reports whether the walking agent gates wave completion.
    #[must_use]
    pub const fn agent_gates_completion(&self) -> bool {
        self.agent_gates_completion
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), true, true)
    }
}

/// Observations collected outside the controller since its previous update.
#[derive(Clone, Copy, Debug)]
pub struct WaveView<'a> {
    /// Events emitted by the world and the walking agent.
    ///
    /// Every `SpawnEnemy` command the controller issues must come back here
    /// as `EnemySpawned` or `SpawnRejected`; a wave does not clear while any
    /// spawn is still unconfirmed.
    pub events: &'a [Event],
    /// Enemies spawned and not yet removed, dying ones included.
    pub live_enemies: usize,
}

impl<'a> WaveView<'a> {
    /// Creates a new view.
    #[must_use]
    pub const fn new(events: &'a [Event], live_enemies: usize) -> Self {
        Self {
            events,
            live_enemies,
        }
    }
}

/// State machine sequencing waves from intermission to intermission.
#[derive(Debug)]
pub struct WaveRunController {
    config: Config,
    catalog: WaveCatalog,
    scheduler: SpawnScheduler,
    director: Option<PathDirector>,
    state: WaveState,
    wave: u32,
    wave_reward: u32,
    intermission_left: Duration,
    send_early: bool,
    paused_while_idle: bool,
    path_pending: bool,
    unconfirmed_spawns: usize,
    outcome: Option<RunOutcome>,
}

impl WaveRunController {
    /// Creates an idle controller over `catalog`.
    ///
    /// Without a director no path is handed out and the walking agent never
    /// gates wave completion.
    #[must_use]
    pub fn new(config: Config, catalog: WaveCatalog, director: Option<PathDirector>) -> Self {
        Self {
            config,
            catalog,
            scheduler: SpawnScheduler::new(),
            director,
            state: WaveState::Idle,
            wave: 0,
            wave_reward: 0,
            intermission_left: Duration::ZERO,
            send_early: false,
            paused_while_idle: false,
            path_pending: false,
            unconfirmed_spawns: 0,
            outcome: None,
        }
    }

    /// Leaves [`WaveState::Idle`] and counts down to the first wave.
    pub fn start_run(&mut self, out: &mut Vec<Event>) {
        if self.state != WaveState::Idle {
            return;
        }

        info!(waves = self.catalog.wave_count(), "run started");
        self.wave = 0;
        self.outcome = None;
        self.enter_intermission(out);
    }

    /// Skips the rest of the intermission; the next wave starts on the
    /// following update. Ignored outside [`WaveState::Intermission`].
    pub fn send_next_wave_early(&mut self) {
        if self.state == WaveState::Intermission {
            self.send_early = true;
        }
    }

    /// Freezes the intermission timer and the spawn replay.
    ///
    /// Ignored once paused or after the run ended.
    pub fn pause(&mut self, out: &mut Vec<Event>) {
        if matches!(self.state, WaveState::Paused | WaveState::GameOver) {
            return;
        }

        self.paused_while_idle = self.state == WaveState::Idle;
        self.scheduler.pause();
        self.set_state(WaveState::Paused, out);
    }

    /// Continues after [`Self::pause`].
    ///
    /// A run paused before it started goes back to [`WaveState::Idle`].
    /// Otherwise the run continues spawning when the scheduler still has
    /// events to fire, and falls back to the intermission when it has not.
    pub fn resume(&mut self, out: &mut Vec<Event>) {
        if self.state != WaveState::Paused {
            return;
        }

        self.scheduler.resume();
        if std::mem::take(&mut self.paused_while_idle) {
            self.set_state(WaveState::Idle, out);
        } else if self.scheduler.has_active_timeline() {
            self.set_state(WaveState::Spawning, out);
        } else if self.intermission_left.is_zero() {
            debug!(wave = self.wave, "resumed after the wave timeline ran out");
            self.enter_intermission(out);
        } else {
            self.set_state(WaveState::Intermission, out);
        }
    }

    /// Ends the run. Only [`Self::restart`] leaves [`WaveState::GameOver`].
    pub fn set_game_over(&mut self, outcome: RunOutcome, out: &mut Vec<Event>) {
        if self.state == WaveState::GameOver {
            return;
        }

        info!(wave = self.wave, ?outcome, "run ended");
        self.scheduler.pause();
        self.send_early = false;
        self.outcome = Some(outcome);
        out.push(Event::RunEnded { outcome });
        self.set_state(WaveState::GameOver, out);
    }

    /// Discards all progress and returns to [`WaveState::Idle`].
    pub fn restart(&mut self, out: &mut Vec<Event>) {
        self.scheduler.reset();
        if let Some(director) = &mut self.director {
            director.reset();
        }
        self.wave = 0;
        self.wave_reward = 0;
        self.intermission_left = Duration::ZERO;
        self.send_early = false;
        self.paused_while_idle = false;
        self.path_pending = false;
        self.unconfirmed_spawns = 0;
        self.outcome = None;
        self.set_state(WaveState::Idle, out);
    }

    /// Advances the run by `dt`.
    ///
    /// Spawns are requested through `commands` as the timeline reaches them;
    /// wave paths and wave rewards are requested there too.
    pub fn update<R>(
        &mut self,
        dt: Duration,
        view: WaveView<'_>,
        resolver: &mut R,
        commands: &mut Vec<Command>,
        out: &mut Vec<Event>,
    ) where
        R: AssetResolver + ?Sized,
    {
        self.observe(view.events, out);

        match self.state {
            WaveState::Idle => {
                if self.config.auto_start {
                    self.start_run(out);
                }
            }
            WaveState::Intermission => {
                self.intermission_left = self.intermission_left.saturating_sub(dt);
                if self.intermission_left.is_zero() || self.send_early {
                    self.next_wave(resolver, commands, out);
                }
            }
            WaveState::Spawning => {
                self.spawn_due(dt, commands);
                if self.wave_cleared(view.live_enemies) {
                    self.clear_wave(commands, out);
                }
            }
            WaveState::Paused | WaveState::GameOver => {}
        }
    }

    /// State currently active.
    #[must_use]
    pub const fn state(&self) -> WaveState {
        self.state
    }

    /// Number of the most recently started wave; zero before the first wave.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Time left until the next wave while in intermission.
    #[must_use]
    pub const fn intermission_left(&self) -> Duration {
        self.intermission_left
    }

    /// How the run ended, once it did.
    #[must_use]
    pub const fn outcome(&self) -> Option<RunOutcome> {
        self.outcome
    }

    /// Reports whether the walking agent still owes the current wave a
    /// finished path.
    #[must_use]
    pub const fn is_path_pending(&self) -> bool {
        self.path_pending
    }

    /// Wave data driving the run.
    #[must_use]
    pub const fn catalog(&self) -> &WaveCatalog {
        &self.catalog
    }

    fn observe(&mut self, events: &[Event], out: &mut Vec<Event>) {
        for event in events {
            match event {
                Event::EnemySpawned { .. } | Event::SpawnRejected { .. } => {
                    self.unconfirmed_spawns = self.unconfirmed_spawns.saturating_sub(1);
                }
                Event::PathCompleted => {
                    self.path_pending = false;
                    if let Some(director) = &mut self.director {
                        director.path_completed();
                    }
                }
                Event::PathCancelled { reason } => {
                    if self.path_pending {
                        debug!(%reason, "wave path abandoned");
                    }
                    self.path_pending = false;
                }
                Event::Defeated => self.set_game_over(RunOutcome::Defeat, out),
                Event::AllPlotsMaxed => self.set_game_over(RunOutcome::Victory, out),
                _ => {}
            }
        }
    }

    fn next_wave<R>(
        &mut self,
        resolver: &mut R,
        commands: &mut Vec<Command>,
        out: &mut Vec<Event>,
    ) where
        R: AssetResolver + ?Sized,
    {
        self.send_early = false;
        self.intermission_left = Duration::ZERO;
        self.wave = self.wave.saturating_add(1);

        let Some(wave) = self.catalog.wave(self.wave).cloned() else {
            info!(wave = self.wave, "no wave data left");
            self.set_game_over(RunOutcome::Victory, out);
            return;
        };

        let catalog = &mut self.catalog;
        let timeline = build_timeline(&wave, |enemy| {
            match catalog.resolve_asset(enemy, &mut *resolver) {
                Ok(asset) => Some(asset),
                Err(error) => {
                    debug!(%error, "enemy asset unavailable");
                    None
                }
            }
        });

        let spawns = timeline.len();
        self.wave_reward = u32::try_from(wave.reward_gold).unwrap_or(0);
        self.scheduler.start(timeline);
        info!(wave = self.wave, id = wave.id, spawns, "wave started");
        out.push(Event::WaveStarted {
            wave: self.wave,
            spawns,
        });

        self.path_pending = false;
        if let Some(director) = &mut self.director {
            let waypoints = director.begin_wave_path(self.wave);
            if waypoints.is_empty() {
                warn!(wave = self.wave, "walking agent has no path this wave");
            } else {
                self.path_pending = self.config.agent_gates_completion;
                commands.push(Command::BeginPath { waypoints });
            }
        }

        self.set_state(WaveState::Spawning, out);
        self.spawn_due(Duration::ZERO, commands);
    }

    fn spawn_due(&mut self, dt: Duration, commands: &mut Vec<Command>) {
        let fired = self.scheduler.advance(dt, |event| {
            commands.push(Command::SpawnEnemy {
                asset: event.asset,
                lane: event.lane,
            });
        });
        self.unconfirmed_spawns += fired;
    }

    fn wave_cleared(&self, live_enemies: usize) -> bool {
        self.scheduler.is_done()
            && self.unconfirmed_spawns == 0
            && live_enemies == 0
            && !self.path_pending
    }

    fn clear_wave(&mut self, commands: &mut Vec<Command>, out: &mut Vec<Event>) {
        info!(wave = self.wave, reward = self.wave_reward, "wave cleared");
        out.push(Event::WaveCleared { wave: self.wave });
        if self.wave_reward > 0 {
            commands.push(Command::AddGold {
                amount: self.wave_reward,
            });
        }
        self.enter_intermission(out);
    }

    fn enter_intermission(&mut self, out: &mut Vec<Event>) {
        self.intermission_left = self.config.intermission;
        self.send_early = false;
        self.set_state(WaveState::Intermission, out);
    }

    fn set_state(&mut self, state: WaveState, out: &mut Vec<Event>) {
        if self.state == state {
            return;
        }
        debug!(from = ?self.state, to = ?state, "wave state changed");
        self.state = state;
        out.push(Event::WaveStateChanged { state });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plot_defence_core::AssetHandle;

    struct NoAssets;

    impl AssetResolver for NoAssets {
        fn resolve(&mut self, _asset_ref: &str) -> Option<AssetHandle> {
            None
        }
    }

    #[test]
    fn pausing_before_the_run_starts_resumes_to_idle() {
        let mut controller = WaveRunController::new(
            Config::new(Duration::from_secs(1), true, false),
            WaveCatalog::empty(),
            None,
        );
        let mut commands = Vec::new();
        let mut events = Vec::new();

        controller.pause(&mut events);
        assert_eq!(controller.state(), WaveState::Paused);
        controller.update(
            Duration::from_secs(5),
            WaveView::new(&[], 0),
            &mut NoAssets,
            &mut commands,
            &mut events,
        );
        assert_eq!(controller.state(), WaveState::Paused, "auto start waits");

        controller.resume(&mut events);
        assert_eq!(controller.state(), WaveState::Idle);
        assert!(commands.is_empty());
        assert_eq!(
            events,
            vec![
                Event::WaveStateChanged {
                    state: WaveState::Paused
                },
                Event::WaveStateChanged {
                    state: WaveState::Idle
                },
            ]
        );
    }

    #[test]
    fn empty_catalog_ends_the_run_victorious() {
        let mut controller = WaveRunController::new(
            Config::new(Duration::ZERO, true, false),
            WaveCatalog::empty(),
            None,
        );
        let mut commands = Vec::new();
        let mut events = Vec::new();

        for _ in 0..2 {
            controller.update(
                Duration::ZERO,
                WaveView::new(&[], 0),
                &mut NoAssets,
                &mut commands,
                &mut events,
            );
        }

        assert_eq!(controller.state(), WaveState::GameOver);
        assert_eq!(controller.outcome(), Some(RunOutcome::Victory));
        assert!(commands.is_empty());
    }
}
