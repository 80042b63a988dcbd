#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Walking builder agent that follows an injected path of plots.
//!
//! The agent moves axis-aligned between waypoints, dwells at every node and
//! turns a press registered during the dwell into a build request for the
//! plot it stands on. All progress happens inside [`Walker::update`]; the
//! supplied frame time is consumed across legs, dwells and nodes so a single
//! large step produces the same events as many small ones.

use std::time::Duration;

use glam::Vec2;
use plot_defence_core::{clamped_seconds, Event, PlotId, Waypoint, WorldPoint};
use tracing::{debug, warn};

const MIN_SPEED: f32 = 0.01;

fn sanitized_epsilon(epsilon: f32) -> f32 {
    if epsilon.is_finite() {
        epsilon.max(0.0)
    } else {
        0.0
    }
}

/// Reason reported when a path without waypoints is requested.
pub const EMPTY_PATH_REASON: &str = "EmptyPath";

/// Configuration parameters required to construct the walking agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    speed: f32,
    dwell: Duration,
    snap_epsilon: f32,
    longest_axis_first: bool,
}

impl Config {
    /// Creates a new configuration.
    ///
    /// `speed` is expressed in world units per second and is raised to a small
    /// positive minimum when used. A negative or non-finite `snap_epsilon` is
    /// treated as zero. With `longest_axis_first` unset the agent always walks
    /// the horizontal leg first.
    #[must_use]
    pub const fn new(
        speed: f32,
        dwell: Duration,
        snap_epsilon: f32,
        longest_axis_first: bool,
    ) -> Self {
        Self {
            speed,
            dwell,
            snap_epsilon,
            longest_axis_first,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(4.0, Duration::from_secs(1), 0.005, true)
    }
}

/// Per-path replacements for the configured speed and dwell.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PathOverrides {
    /// Walking speed used for this path only.
    pub speed: Option<f32>,
    /// Dwell duration used for this path only.
    pub dwell: Option<Duration>,
}

/// Coarse progress of the agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkerStatus {
    /// No path was ever started.
    Idle,
    /// Moving towards the current node.
    Walking,
    /// Waiting at the current node.
    Dwelling,
    /// The last path was walked to its end.
    Completed,
    /// The last path was abandoned.
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Idle,
    Walking(Axis),
    Dwelling { remaining: Duration, pressed: bool },
    Completed,
    Cancelled,
}

/// Agent walking the plot path handed out for the current wave.
#[derive(Debug)]
pub struct Walker {
    config: Config,
    speed: f32,
    dwell: Duration,
    path: Vec<Waypoint>,
    index: Option<usize>,
    position: Vec2,
    target: Vec2,
    sub_target: Vec2,
    phase: Phase,
}

impl Walker {
    /// Creates an idle agent standing at `position`.
    #[must_use]
    pub fn new(config: Config, position: WorldPoint) -> Self {
        let config = Config {
            snap_epsilon: sanitized_epsilon(config.snap_epsilon),
            ..config
        };
        let position = to_vec(position);
        Self {
            config,
            speed: config.speed.max(MIN_SPEED),
            dwell: config.dwell,
            path: Vec::new(),
            index: None,
            position,
            target: position,
            sub_target: position,
            phase: Phase::Idle,
        }
    }

    /// Starts walking `waypoints` in order, discarding any path in progress.
    ///
    /// An empty path is refused: any current path is dropped and
    /// `PathCancelled` is reported with [`EMPTY_PATH_REASON`].
    pub fn begin_path(
        &mut self,
        waypoints: Vec<Waypoint>,
        overrides: PathOverrides,
        out: &mut Vec<Event>,
    ) {
        if waypoints.is_empty() {
            warn!("walking agent received an empty path");
            self.abandon(EMPTY_PATH_REASON, out);
            return;
        }
        if self.is_path_running() {
            debug!(
                remaining = self.path.len().saturating_sub(self.index.unwrap_or(0)),
                "replacing path in progress"
            );
        }

        self.speed = overrides.speed.unwrap_or(self.config.speed).max(MIN_SPEED);
        self.dwell = overrides.dwell.unwrap_or(self.config.dwell);
        self.path = waypoints;
        self.index = None;

        out.push(Event::PathStarted {
            plots: self.path.iter().map(|waypoint| waypoint.plot).collect(),
        });
        self.advance_to_next_node(out);
    }

    /// Abandons the current path. Nothing is reported when no path is running.
    pub fn cancel_path(&mut self, reason: &str, out: &mut Vec<Event>) {
        if self.is_path_running() {
            self.abandon(reason, out);
        }
    }

    fn abandon(&mut self, reason: &str, out: &mut Vec<Event>) {
        self.phase = Phase::Cancelled;
        self.path.clear();
        self.index = None;
        out.push(Event::PathCancelled {
            reason: reason.to_owned(),
        });
    }

    /// Registers a build press.
    ///
    /// Presses only count while dwelling; the first press of a dwell requests a
    /// build on the current plot, later ones are absorbed.
    pub fn register_press(&mut self, out: &mut Vec<Event>) {
        let Phase::Dwelling { pressed, .. } = &mut self.phase else {
            return;
        };
        if *pressed {
            return;
        }
        *pressed = true;

        if let Some(plot) = self.current_plot() {
            out.push(Event::BuildRequested { plot });
        }
    }

    /// Advances walking and dwelling by `dt`.
    pub fn update(&mut self, dt: Duration, out: &mut Vec<Event>) {
        let mut budget = dt;
        loop {
            match self.phase {
                Phase::Walking(axis) => {
                    if !self.walk(axis, &mut budget, out) {
                        break;
                    }
                }
                Phase::Dwelling { remaining, pressed } => {
                    if remaining > budget {
                        self.phase = Phase::Dwelling {
                            remaining: remaining - budget,
                            pressed,
                        };
                        break;
                    }
                    budget -= remaining;
                    self.end_dwell(pressed, out);
                }
                Phase::Idle | Phase::Completed | Phase::Cancelled => break,
            }
        }
    }

    /// Coarse progress of the agent.
    #[must_use]
    pub const fn status(&self) -> WalkerStatus {
        match self.phase {
            Phase::Idle => WalkerStatus::Idle,
            Phase::Walking(_) => WalkerStatus::Walking,
            Phase::Dwelling { .. } => WalkerStatus::Dwelling,
            Phase::Completed => WalkerStatus::Completed,
            Phase::Cancelled => WalkerStatus::Cancelled,
        }
    }

    /// Reports whether a path is being walked or dwelt on.
    #[must_use]
    pub const fn is_path_running(&self) -> bool {
        matches!(self.phase, Phase::Walking(_) | Phase::Dwelling { .. })
    }

    /// Current position of the agent.
    #[must_use]
    pub fn position(&self) -> WorldPoint {
        WorldPoint::new(self.position.x, self.position.y)
    }

    /// Index of the node being approached or dwelt at.
    #[must_use]
    pub const fn current_index(&self) -> Option<usize> {
        self.index
    }

    /// Plot of the node being approached or dwelt at.
    #[must_use]
    pub fn current_plot(&self) -> Option<PlotId> {
        self.index
            .and_then(|index| self.path.get(index))
            .map(|waypoint| waypoint.plot)
    }

    /// Moves along the current leg. Returns `true` when the leg was finished
    /// and the budget may be spent on whatever follows.
    fn walk(&mut self, axis: Axis, budget: &mut Duration, out: &mut Vec<Event>) -> bool {
        let (from, to) = match axis {
            Axis::X => (self.position.x, self.sub_target.x),
            Axis::Y => (self.position.y, self.sub_target.y),
        };
        let distance = (to - from).abs();
        let needed = clamped_seconds(distance / self.speed);

        if needed <= *budget || distance <= self.config.snap_epsilon {
            *budget = budget.saturating_sub(needed);
            self.position = self.sub_target;
            self.begin_second_leg_or_arrive(out);
            return true;
        }

        let step = (self.speed * budget.as_secs_f32()).min(distance);
        let moved = from + step.copysign(to - from);
        match axis {
            Axis::X => self.position.x = moved,
            Axis::Y => self.position.y = moved,
        }
        *budget = Duration::ZERO;

        if (to - moved).abs() <= self.config.snap_epsilon {
            self.position = self.sub_target;
            self.begin_second_leg_or_arrive(out);
        }
        false
    }

    fn advance_to_next_node(&mut self, out: &mut Vec<Event>) {
        let index = self.index.map_or(0, |index| index + 1);
        let Some(waypoint) = self.path.get(index) else {
            self.complete_path(out);
            return;
        };
        self.index = Some(index);
        self.target = to_vec(waypoint.position);

        let delta = self.target - self.position;
        let x_first = !self.config.longest_axis_first || delta.x.abs() >= delta.y.abs();
        self.sub_target = if x_first {
            Vec2::new(self.target.x, self.position.y)
        } else {
            Vec2::new(self.position.x, self.target.y)
        };

        let epsilon = self.config.snap_epsilon;
        if self.position.distance_squared(self.sub_target) <= epsilon * epsilon {
            self.position = self.sub_target;
            self.begin_second_leg_or_arrive(out);
        } else {
            self.phase = Phase::Walking(if x_first { Axis::X } else { Axis::Y });
        }
    }

    fn begin_second_leg_or_arrive(&mut self, out: &mut Vec<Event>) {
        let epsilon = self.config.snap_epsilon;
        let x_done = (self.position.x - self.target.x).abs() <= epsilon;
        let y_done = (self.position.y - self.target.y).abs() <= epsilon;

        if x_done && y_done {
            self.position = self.target;
            self.arrive(out);
            return;
        }

        self.sub_target = self.target;
        self.phase = Phase::Walking(if x_done { Axis::Y } else { Axis::X });
    }

    fn arrive(&mut self, out: &mut Vec<Event>) {
        let (Some(index), Some(plot)) = (self.index, self.current_plot()) else {
            return;
        };
        out.push(Event::NodeArrived { index, plot });

        self.phase = Phase::Dwelling {
            remaining: self.dwell,
            pressed: false,
        };
        out.push(Event::DwellStarted {
            index,
            duration: self.dwell,
        });

        if self.dwell.is_zero() {
            self.end_dwell(false, out);
        }
    }

    fn end_dwell(&mut self, pressed: bool, out: &mut Vec<Event>) {
        let Some(index) = self.index else {
            return;
        };
        out.push(Event::DwellCompleted { index, pressed });

        if index + 1 >= self.path.len() {
            self.complete_path(out);
        } else {
            self.advance_to_next_node(out);
        }
    }

    fn complete_path(&mut self, out: &mut Vec<Event>) {
        if self.phase == Phase::Completed {
            return;
        }
        self.phase = Phase::Completed;
        debug!(nodes = self.path.len(), "walking agent completed its path");
        out.push(Event::PathCompleted);
    }
}

fn to_vec(point: WorldPoint) -> Vec2 {
    Vec2::new(point.x(), point.y())
}
