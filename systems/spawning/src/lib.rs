#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system that replays wave timelines.
//!
//! A wave's spawn groups are flattened into an [`EventTimeline`] once, then a
//! [`SpawnScheduler`] replays that timeline against the externally driven
//! clock. Every event crossed by an [`SpawnScheduler::advance`] call fires
//! before the call returns, so the outcome never depends on how the frame
//! time was sliced.

use std::time::Duration;

use plot_defence_core::{clamped_seconds, AssetHandle, SpawnEvent, WaveDef};
use tracing::{debug, warn};

/// Spawn events of a single wave ordered by their scheduled time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventTimeline {
    events: Vec<SpawnEvent>,
}

impl EventTimeline {
    /// Creates a timeline from unordered events.
    ///
    /// The sort is stable: events sharing a time keep their emission order.
    #[must_use]
    pub fn from_events(mut events: Vec<SpawnEvent>) -> Self {
        events.sort_by_key(|event| event.time);
        Self { events }
    }

    /// Number of events on the timeline.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Reports whether the timeline schedules no spawns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events in firing order.
    #[must_use]
    pub fn events(&self) -> &[SpawnEvent] {
        &self.events
    }

    /// Consumes the timeline, yielding the ordered events.
    #[must_use]
    pub fn into_vec(self) -> Vec<SpawnEvent> {
        self.events
    }
}

/// Expands a wave's spawn groups into a time-sorted timeline.
///
/// Each group resolves its enemy asset once through `resolve`; groups whose
/// asset is unavailable are dropped from the wave. A group of `count` enemies
/// spawns at `delay, delay + interval, ...` with both values clamped to zero;
/// a negative `count` spawns nothing.
pub fn build_timeline<F>(wave: &WaveDef, mut resolve: F) -> EventTimeline
where
    F: FnMut(&str) -> Option<AssetHandle>,
{
    let capacity = wave
        .entries
        .iter()
        .map(|entry| usize::try_from(entry.count).unwrap_or(0))
        .sum();
    let mut events = Vec::with_capacity(capacity);

    for entry in &wave.entries {
        let count = u32::try_from(entry.count).unwrap_or(0);
        if count == 0 {
            if entry.count < 0 {
                warn!(
                    wave = wave.id,
                    enemy = %entry.enemy_id,
                    count = entry.count,
                    "skipping spawn group with a negative count"
                );
            }
            continue;
        }

        let Some(asset) = resolve(&entry.enemy_id) else {
            warn!(
                wave = wave.id,
                enemy = %entry.enemy_id,
                count = entry.count,
                "skipping spawn group without a loadable asset"
            );
            continue;
        };

        let interval = clamped_seconds(entry.interval);
        let mut time = clamped_seconds(entry.delay);
        for _ in 0..count {
            events.push(SpawnEvent {
                time,
                asset,
                lane: entry.lane,
            });
            time = time.saturating_add(interval);
        }
    }

    let timeline = EventTimeline::from_events(events);
    debug!(wave = wave.id, spawns = timeline.len(), "timeline built");
    timeline
}

/// Replays an [`EventTimeline`] against accumulated elapsed time.
#[derive(Debug, Default)]
pub struct SpawnScheduler {
    timeline: Option<EventTimeline>,
    cursor: usize,
    elapsed: Duration,
    running: bool,
}

impl SpawnScheduler {
    /// Creates a scheduler without a timeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts replaying `timeline` from its beginning, discarding any
    /// in-progress timeline.
    pub fn start(&mut self, timeline: EventTimeline) {
        self.timeline = Some(timeline);
        self.cursor = 0;
        self.elapsed = Duration::ZERO;
        self.running = true;
    }

    /// Drops the current timeline and returns to the never-started state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advances the replay clock and fires every event whose time was crossed.
    ///
    /// Events fire in timeline order before the call returns. Returns the
    /// number of events fired.
    pub fn advance<F>(&mut self, dt: Duration, mut fire: F) -> usize
    where
        F: FnMut(&SpawnEvent),
    {
        if !self.running {
            return 0;
        }
        let Some(timeline) = &self.timeline else {
            return 0;
        };

        self.elapsed = self.elapsed.saturating_add(dt);

        let mut fired = 0;
        while let Some(event) = timeline.events.get(self.cursor) {
            if event.time > self.elapsed {
                break;
            }
            fire(event);
            self.cursor += 1;
            fired += 1;
        }
        fired
    }

    /// Freezes the replay position.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Continues the replay from where it was paused.
    pub fn resume(&mut self) {
        self.running = true;
    }

    /// Reports whether the scheduler is running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// True once a started timeline has been fully consumed while running.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.running
            && self
                .timeline
                .as_ref()
                .is_some_and(|timeline| self.cursor >= timeline.len())
    }

    /// True while a timeline exists and still has unfired events.
    #[must_use]
    pub fn has_active_timeline(&self) -> bool {
        self.timeline
            .as_ref()
            .is_some_and(|timeline| self.cursor < timeline.len())
    }

    /// Replay time accumulated since the timeline started.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of events still waiting to fire.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.timeline
            .as_ref()
            .map_or(0, |timeline| timeline.len().saturating_sub(self.cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plot_defence_core::Lane;

    fn event(millis: u64, asset: u32) -> SpawnEvent {
        SpawnEvent {
            time: Duration::from_millis(millis),
            asset: AssetHandle::new(asset),
            lane: Lane::new(0),
        }
    }

    #[test]
    fn never_started_scheduler_is_not_done() {
        let mut scheduler = SpawnScheduler::new();
        assert!(!scheduler.is_done());
        assert!(!scheduler.has_active_timeline());

        scheduler.resume();
        assert_eq!(scheduler.advance(Duration::from_secs(1), |_| {}), 0);
        assert!(!scheduler.is_done(), "resume without a timeline stays not done");
    }

    #[test]
    fn empty_timeline_is_done_immediately() {
        let mut scheduler = SpawnScheduler::new();
        scheduler.start(EventTimeline::default());
        assert!(scheduler.is_done());
        assert!(!scheduler.has_active_timeline());
    }

    #[test]
    fn paused_scheduler_is_not_done() {
        let mut scheduler = SpawnScheduler::new();
        scheduler.start(EventTimeline::from_events(vec![event(0, 1)]));
        let _ = scheduler.advance(Duration::ZERO, |_| {});
        assert!(scheduler.is_done());

        scheduler.pause();
        assert!(!scheduler.is_done(), "done requires a running scheduler");
    }

    #[test]
    fn reset_forgets_timeline() {
        let mut scheduler = SpawnScheduler::new();
        scheduler.start(EventTimeline::from_events(vec![event(100, 1)]));
        scheduler.reset();
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.remaining(), 0);
        assert_eq!(scheduler.elapsed(), Duration::ZERO);
    }
}
