use std::collections::BTreeSet;

use plot_defence_core::{PlotId, WorldPoint};
use plot_defence_system_path_generation::{
    generate_covering_path, DirectorConfig, PathDirector, PlotGraph,
};

fn plot(id: u32) -> PlotId {
    PlotId::new(id)
}

fn grid(width: u32, height: u32) -> PlotGraph {
    let id = |x: u32, y: u32| plot(y * width + x);
    let plots = (0..height).flat_map(|y| {
        (0..width).map(move |x| (id(x, y), WorldPoint::new(x as f32, y as f32)))
    });

    let mut links = Vec::new();
    for y in 0..height {
        for x in 0..width {
            if x + 1 < width {
                links.push((id(x, y), id(x + 1, y)));
            }
            if y + 1 < height {
                links.push((id(x, y), id(x, y + 1)));
            }
        }
    }
    PlotGraph::from_links(plots, links)
}

fn two_islands() -> PlotGraph {
    PlotGraph::from_links(
        (0..7).map(|id| (plot(id), WorldPoint::new(id as f32 * 10.0, 0.0))),
        [
            (plot(0), plot(1)),
            (plot(1), plot(2)),
            (plot(2), plot(0)),
            (plot(3), plot(4)),
            (plot(4), plot(5)),
            (plot(5), plot(6)),
        ],
    )
}

#[test]
fn connected_grid_is_fully_covered() {
    let graph = grid(4, 3);
    for seed in 0..16 {
        let path = generate_covering_path(&graph, 50, Some(seed));
        assert_eq!(path.len(), graph.len(), "seed {seed} left plots unvisited");
        assert!(graph.is_simple_path(&path), "seed {seed} produced an invalid walk");
    }
}

#[test]
fn unseeded_generation_still_covers_the_grid() {
    let graph = grid(3, 3);
    let path = generate_covering_path(&graph, 50, None);
    assert_eq!(path.len(), 9);
    assert!(graph.is_simple_path(&path));
}

#[test]
fn disconnected_graph_stays_inside_start_component() {
    let graph = two_islands();
    for seed in 0..32 {
        let path = generate_covering_path(&graph, 10, Some(seed));
        let first = *path.first().expect("non-empty graph yields a path");
        let component = graph.component_of(first);

        assert!(path.len() <= component.len());
        assert!(path.iter().all(|node| component.contains(node)));
        let unique: BTreeSet<_> = path.iter().copied().collect();
        assert_eq!(unique.len(), path.len(), "path repeats a plot");
        assert!(graph.is_simple_path(&path));
    }
}

#[test]
fn disconnected_graph_returns_longest_partial_path() {
    let graph = two_islands();
    let path = generate_covering_path(&graph, 50, Some(11));
    assert_eq!(path.len(), 4, "the four-plot chain is the longest walk available");
}

#[test]
fn isolated_plots_yield_single_node_paths() {
    let graph = PlotGraph::from_links(
        [
            (plot(0), WorldPoint::new(0.0, 0.0)),
            (plot(1), WorldPoint::new(3.0, 0.0)),
        ],
        Vec::<(PlotId, PlotId)>::new(),
    );
    let path = generate_covering_path(&graph, 5, Some(2));
    assert_eq!(path.len(), 1);
}

#[test]
fn seeded_generation_replays_identically() {
    let graph = grid(5, 4);
    let first = generate_covering_path(&graph, 20, Some(0xDEFE_CE));
    let second = generate_covering_path(&graph, 20, Some(0xDEFE_CE));
    assert_eq!(first, second);
}

#[test]
fn proximity_graph_supports_full_coverage() {
    let mut graph = PlotGraph::from_links(
        (0..6).map(|id| (plot(id), WorldPoint::new(id as f32 * 2.0, (id % 2) as f32))),
        Vec::<(PlotId, PlotId)>::new(),
    );
    graph.connect_to_nearest(2);

    assert!(graph.isolated_plots().is_empty());
    let path = generate_covering_path(&graph, 50, Some(4));
    assert_eq!(path.len(), 6);
    assert!(graph.is_simple_path(&path));
}

#[test]
fn director_chains_paths_between_waves() {
    let graph = grid(3, 2);
    let mut director = PathDirector::new(graph.clone(), DirectorConfig::new(50, Some(99)));

    let first = director.begin_wave_path(1);
    assert_eq!(first.len(), 6);
    assert_eq!(first[0].plot, plot(0), "first walk starts at the first plot");
    assert_eq!(first[0].position, WorldPoint::new(0.0, 0.0));

    director.path_completed();
    let end = first.last().map(|waypoint| waypoint.plot);
    assert_eq!(director.last_end(), end);

    let second = director.begin_wave_path(2);
    assert_eq!(second.first().map(|waypoint| waypoint.plot), end);
    let plots: Vec<_> = second.iter().map(|waypoint| waypoint.plot).collect();
    assert!(graph.is_simple_path(&plots));
}

#[test]
fn director_without_completion_restarts_from_previous_start() {
    let mut director = PathDirector::new(grid(2, 2), DirectorConfig::new(50, Some(5)));
    let first = director.begin_wave_path(1);
    let second = director.begin_wave_path(2);
    assert_eq!(first[0].plot, second[0].plot);
}

#[test]
fn director_paths_replay_for_the_same_run_seed() {
    let collect = || {
        let mut director = PathDirector::new(grid(4, 4), DirectorConfig::new(30, Some(2024)));
        (1..=3)
            .map(|wave| {
                let path = director.begin_wave_path(wave);
                director.path_completed();
                path.into_iter().map(|waypoint| waypoint.plot).collect::<Vec<_>>()
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(collect(), collect());
}
