//! Undirected adjacency between buildable plots.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use glam::Vec2;
use plot_defence_core::{PlotId, WorldPoint};
use tracing::{debug, warn};

/// Buildable plots with their anchors and an undirected neighbour relation.
///
/// Adjacency is always symmetric and never contains self loops. Ordered maps
/// keep iteration stable so seeded searches replay identically.
#[derive(Clone, Debug, Default)]
pub struct PlotGraph {
    positions: BTreeMap<PlotId, WorldPoint>,
    adjacency: BTreeMap<PlotId, BTreeSet<PlotId>>,
}

impl PlotGraph {
    /// Creates a graph without plots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from plots and authored neighbour links.
    ///
    /// Links are mirrored, self links and links naming unknown plots are
    /// dropped, and plots left without neighbours are reported.
    pub fn from_links<P, L>(plots: P, links: L) -> Self
    where
        P: IntoIterator<Item = (PlotId, WorldPoint)>,
        L: IntoIterator<Item = (PlotId, PlotId)>,
    {
        let mut graph = Self::new();
        for (plot, position) in plots {
            let _ = graph.add_plot(plot, position);
        }
        for (from, to) in links {
            let _ = graph.link(from, to);
        }
        graph.warn_isolated();
        graph
    }

    /// Registers a plot. Returns `false` when the plot already existed, in
    /// which case only its anchor is updated.
    pub fn add_plot(&mut self, plot: PlotId, position: WorldPoint) -> bool {
        let _ = self.positions.insert(plot, position);
        match self.adjacency.entry(plot) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                let _ = slot.insert(BTreeSet::new());
                true
            }
        }
    }

    /// Connects two plots in both directions.
    ///
    /// Returns `false` for self links, unknown plots, or links that already
    /// existed.
    pub fn link(&mut self, a: PlotId, b: PlotId) -> bool {
        if a == b {
            return false;
        }
        if !self.contains(a) || !self.contains(b) {
            warn!(from = a.get(), to = b.get(), "ignoring link to an unknown plot");
            return false;
        }

        let forward = self
            .adjacency
            .get_mut(&a)
            .is_some_and(|neighbours| neighbours.insert(b));
        let backward = self
            .adjacency
            .get_mut(&b)
            .is_some_and(|neighbours| neighbours.insert(a));
        forward || backward
    }

    /// Links every plot with its `k` nearest plots by anchor distance.
    ///
    /// Equal distances are broken by plot id. Because links are mirrored a
    /// plot may end up with more than `k` neighbours.
    pub fn connect_to_nearest(&mut self, k: usize) {
        if k == 0 {
            return;
        }

        let anchors: Vec<(PlotId, Vec2)> = self
            .positions
            .iter()
            .map(|(plot, point)| (*plot, Vec2::new(point.x(), point.y())))
            .collect();

        let mut links = Vec::new();
        for (plot, anchor) in &anchors {
            let mut others: Vec<(f32, PlotId)> = anchors
                .iter()
                .filter(|(other, _)| other != plot)
                .map(|(other, position)| (anchor.distance(*position), *other))
                .collect();
            others.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            links.extend(others.into_iter().take(k).map(|(_, other)| (*plot, other)));
        }

        let mut added = 0;
        for (from, to) in links {
            if self.link(from, to) {
                added += 1;
            }
        }
        debug!(k, added, "proximity links built");
        self.warn_isolated();
    }

    /// Number of plots in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// Reports whether the graph has no plots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Reports whether the plot is registered.
    #[must_use]
    pub fn contains(&self, plot: PlotId) -> bool {
        self.adjacency.contains_key(&plot)
    }

    /// Plots in ascending id order.
    pub fn plots(&self) -> impl Iterator<Item = PlotId> + '_ {
        self.adjacency.keys().copied()
    }

    /// Anchor of the plot, if registered.
    #[must_use]
    pub fn position(&self, plot: PlotId) -> Option<WorldPoint> {
        self.positions.get(&plot).copied()
    }

    /// Neighbours of the plot in ascending id order.
    pub fn neighbours(&self, plot: PlotId) -> impl Iterator<Item = PlotId> + '_ {
        self.adjacency
            .get(&plot)
            .into_iter()
            .flat_map(|neighbours| neighbours.iter().copied())
    }

    /// Reports whether the two plots share an edge.
    #[must_use]
    pub fn are_adjacent(&self, a: PlotId, b: PlotId) -> bool {
        self.adjacency
            .get(&a)
            .is_some_and(|neighbours| neighbours.contains(&b))
    }

    /// Plots without any neighbour.
    #[must_use]
    pub fn isolated_plots(&self) -> Vec<PlotId> {
        self.adjacency
            .iter()
            .filter(|(_, neighbours)| neighbours.is_empty())
            .map(|(plot, _)| *plot)
            .collect()
    }

    /// Plots reachable from `start`, including `start` itself.
    #[must_use]
    pub fn component_of(&self, start: PlotId) -> BTreeSet<PlotId> {
        let mut reached = BTreeSet::new();
        if !self.contains(start) {
            return reached;
        }

        let mut queue = VecDeque::from([start]);
        let _ = reached.insert(start);
        while let Some(plot) = queue.pop_front() {
            for neighbour in self.neighbours(plot) {
                if reached.insert(neighbour) {
                    queue.push_back(neighbour);
                }
            }
        }
        reached
    }

    /// Reports whether `path` is a simple walk along graph edges.
    #[must_use]
    pub fn is_simple_path(&self, path: &[PlotId]) -> bool {
        let mut seen = BTreeSet::new();
        if !path.iter().all(|plot| self.contains(*plot) && seen.insert(*plot)) {
            return false;
        }
        path.windows(2).all(|pair| self.are_adjacent(pair[0], pair[1]))
    }

    fn warn_isolated(&self) {
        let isolated = self.isolated_plots();
        if !isolated.is_empty() && self.len() > 1 {
            warn!(
                count = isolated.len(),
                plots = ?isolated.iter().map(PlotId::get).collect::<Vec<_>>(),
                "plots have no neighbours assigned"
            );
        }
    }
}
