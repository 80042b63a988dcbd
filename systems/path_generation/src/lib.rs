#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Covering-path generation over the plot graph.
//!
//! The generator runs a randomized backtracking depth-first search that tries
//! to visit every plot exactly once. Each attempt starts from a fresh node and
//! shuffles neighbour order; the first attempt reaching every plot wins,
//! otherwise the longest simple path seen across all attempts is returned.
//! Backtracking is exponential in the worst case, which is acceptable for the
//! few dozen plots a map carries.

mod director;
mod graph;

use std::collections::HashSet;

use plot_defence_core::PlotId;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

pub use director::{DirectorConfig, PathDirector};
pub use graph::PlotGraph;

/// Attempts used when callers do not configure their own budget.
pub const DEFAULT_MAX_ATTEMPTS: usize = 50;

/// Generates a simple path that covers as many plots as possible.
///
/// Supplying `seed` makes start selection and neighbour order reproducible;
/// `None` draws from system entropy. At least one attempt is always made.
#[must_use]
pub fn generate_covering_path(
    graph: &PlotGraph,
    max_attempts: usize,
    seed: Option<u64>,
) -> Vec<PlotId> {
    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let plots: Vec<PlotId> = graph.plots().collect();
    search(graph, max_attempts, &mut rng, |rng| {
        plots.get(rng.gen_range(0..plots.len())).copied()
    })
}

/// Generates a covering path whose first node is always `start`.
///
/// The backtracking search from one start is exhaustive, so a single attempt
/// is made whatever `max_attempts` allows. Returns an empty path when `start`
/// is not part of the graph.
#[must_use]
pub fn generate_covering_path_from<R>(
    graph: &PlotGraph,
    start: PlotId,
    max_attempts: usize,
    rng: &mut R,
) -> Vec<PlotId>
where
    R: Rng + ?Sized,
{
    if !graph.contains(start) {
        warn!(start = start.get(), "covering path requested from an unknown plot");
        return Vec::new();
    }
    let mut start = Some(start);
    search(graph, max_attempts, rng, |_| start.take())
}

fn search<R, S>(
    graph: &PlotGraph,
    max_attempts: usize,
    rng: &mut R,
    mut pick_start: S,
) -> Vec<PlotId>
where
    R: Rng + ?Sized,
    S: FnMut(&mut R) -> Option<PlotId>,
{
    if graph.is_empty() {
        warn!("covering path requested for an empty plot graph");
        return Vec::new();
    }

    let mut best = Vec::new();
    for attempt in 0..max_attempts.max(1) {
        let Some(start) = pick_start(&mut *rng) else {
            break;
        };

        if let Some(path) = grow_path(graph, start, &mut *rng, &mut best) {
            debug!(attempt, start = start.get(), len = path.len(), "covering path found");
            return path;
        }
    }

    warn!(
        covered = best.len(),
        total = graph.len(),
        "no path covers every plot, using the longest partial path"
    );
    best
}

struct Frame {
    plot: PlotId,
    order: Vec<PlotId>,
    next: usize,
}

impl Frame {
    fn enter<R>(graph: &PlotGraph, plot: PlotId, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut order: Vec<PlotId> = graph.neighbours(plot).collect();
        order.shuffle(rng);
        Self {
            plot,
            order,
            next: 0,
        }
    }
}

/// Depth-first search from `start`; returns the path on full coverage and
/// records every longer partial path in `best`.
fn grow_path<R>(
    graph: &PlotGraph,
    start: PlotId,
    rng: &mut R,
    best: &mut Vec<PlotId>,
) -> Option<Vec<PlotId>>
where
    R: Rng + ?Sized,
{
    let target = graph.len();
    let mut visited = HashSet::with_capacity(target);
    let mut path = Vec::with_capacity(target);
    let mut stack = Vec::with_capacity(target);

    let _ = visited.insert(start);
    path.push(start);
    if path.len() >= target {
        return Some(path);
    }
    if path.len() > best.len() {
        best.clone_from(&path);
    }
    stack.push(Frame::enter(graph, start, rng));

    loop {
        let Some(frame) = stack.last_mut() else {
            return None;
        };

        let mut candidate = None;
        while let Some(&next) = frame.order.get(frame.next) {
            frame.next += 1;
            if !visited.contains(&next) {
                candidate = Some(next);
                break;
            }
        }

        match candidate {
            Some(next) => {
                let _ = visited.insert(next);
                path.push(next);
                if path.len() >= target {
                    return Some(path);
                }
                if path.len() > best.len() {
                    best.clone_from(&path);
                }
                stack.push(Frame::enter(graph, next, rng));
            }
            None => {
                if let Some(done) = stack.pop() {
                    let _ = visited.remove(&done.plot);
                    let _ = path.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plot_defence_core::WorldPoint;

    fn line(len: u32) -> PlotGraph {
        PlotGraph::from_links(
            (0..len).map(|id| (PlotId::new(id), WorldPoint::new(id as f32, 0.0))),
            (1..len).map(|id| (PlotId::new(id - 1), PlotId::new(id))),
        )
    }

    #[test]
    fn single_plot_yields_single_node_path() {
        let path = generate_covering_path(&line(1), 3, Some(1));
        assert_eq!(path, vec![PlotId::new(0)]);
    }

    #[test]
    fn empty_graph_yields_empty_path() {
        assert!(generate_covering_path(&PlotGraph::new(), 3, Some(1)).is_empty());
    }

    #[test]
    fn zero_attempts_still_searches_once() {
        let path = generate_covering_path(&line(2), 0, Some(9));
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn fixed_start_from_middle_of_line_keeps_best_half() {
        let graph = line(5);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let path = generate_covering_path_from(&graph, PlotId::new(2), 4, &mut rng);

        assert_eq!(path.first(), Some(&PlotId::new(2)));
        assert_eq!(path.len(), 3, "a walk from the middle reaches one end only");
        assert!(graph.is_simple_path(&path));
    }

    #[test]
    fn fixed_start_gives_up_after_one_search() {
        let graph = PlotGraph::from_links(
            (0..5).map(|id| (PlotId::new(id), WorldPoint::new(id as f32, 0.0))),
            [
                (PlotId::new(0), PlotId::new(1)),
                (PlotId::new(1), PlotId::new(2)),
                (PlotId::new(2), PlotId::new(0)),
                (PlotId::new(3), PlotId::new(4)),
            ],
        );
        let mut once = ChaCha8Rng::seed_from_u64(5);
        let mut many = ChaCha8Rng::seed_from_u64(5);

        let single = generate_covering_path_from(&graph, PlotId::new(0), 1, &mut once);
        let repeated = generate_covering_path_from(&graph, PlotId::new(0), 50, &mut many);

        assert_eq!(single.len(), 3);
        assert_eq!(single, repeated);
        assert_eq!(once.gen::<u64>(), many.gen::<u64>(), "no extra shuffles were drawn");
    }
}
