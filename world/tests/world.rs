use plot_defence_core::{BuildRejection, Command, EnemyId, Event, Lane, PlotBuildState, PlotId};
use plot_defence_world::{apply, query, EnemyStatus, World, WorldConfig};

fn world_with_gold(gold: u32) -> World {
    World::new(WorldConfig::new(20, gold, vec![100, 200, 300], 3))
        .with_assets(["Enemies/Grunt", "Enemies/Brute"])
        .with_plots([PlotId::new(1), PlotId::new(2)])
}

fn run(world: &mut World, commands: impl IntoIterator<Item = Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands {
        apply(world, command, &mut events);
    }
    events
}

fn spawn_grunt(world: &mut World) -> EnemyId {
    let asset = query::asset_registry(world)
        .handle("Enemies/Grunt")
        .expect("grunt registered");
    let events = run(
        world,
        [Command::SpawnEnemy {
            asset,
            lane: Lane::new(1),
        }],
    );
    match events.as_slice() {
        [Event::EnemySpawned { enemy, .. }] => *enemy,
        other => panic!("unexpected spawn events: {other:?}"),
    }
}

#[test]
fn spending_is_all_or_nothing() {
    let mut world = world_with_gold(150);

    let events = run(&mut world, [Command::SpendGold { amount: 200 }]);
    assert_eq!(events, vec![Event::GoldSpendRejected { amount: 200 }]);
    assert_eq!(query::gold(&world), 150, "failed spend must not deduct");

    let events = run(&mut world, [Command::SpendGold { amount: 150 }]);
    assert_eq!(events, vec![Event::GoldChanged { gold: 0 }]);
}

#[test]
fn defeat_is_reported_once() {
    let mut world = world_with_gold(0);
    let events = run(
        &mut world,
        [
            Command::ApplyDamage { amount: 15 },
            Command::ApplyDamage { amount: 15 },
            Command::ApplyDamage { amount: 1 },
        ],
    );

    let defeats = events
        .iter()
        .filter(|event| matches!(event, Event::Defeated))
        .count();
    assert_eq!(defeats, 1);
    assert_eq!(query::health(&world), 0);
    assert!(query::is_defeated(&world));
}

#[test]
fn enemies_count_until_their_death_completes() {
    let mut world = world_with_gold(0);
    let first = spawn_grunt(&mut world);
    let second = spawn_grunt(&mut world);
    assert_eq!(query::live_enemies(&world), 2);

    let events = run(&mut world, [Command::KillEnemy { enemy: first, reward: 5 }]);
    assert_eq!(
        events,
        vec![
            Event::EnemyKilled {
                enemy: first,
                reward: 5,
            },
            Event::GoldChanged { gold: 5 },
        ],
    );
    assert_eq!(query::live_enemies(&world), 2, "dying enemies still count");
    assert_eq!(query::enemies(&world)[0].status, EnemyStatus::Dying);

    let events = run(
        &mut world,
        [
            Command::KillEnemy { enemy: first, reward: 5 },
            Command::CompleteEnemyDeath { enemy: first },
            Command::CompleteEnemyDeath { enemy: second },
        ],
    );
    assert_eq!(
        events,
        vec![Event::EnemyRemoved { enemy: first }],
        "second kill is ignored and alive enemies cannot be removed",
    );
    assert_eq!(query::live_enemies(&world), 1);
}

#[test]
fn leaks_damage_the_player() {
    let mut world = world_with_gold(0);
    let enemy = spawn_grunt(&mut world);

    let events = run(&mut world, [Command::LeakEnemy { enemy, damage: 3 }]);
    assert_eq!(
        events,
        vec![
            Event::EnemyLeaked { enemy, damage: 3 },
            Event::HealthChanged { health: 17 },
        ],
    );
}

#[test]
fn plots_upgrade_through_every_level_then_refuse() {
    let mut world = world_with_gold(1_000);
    let plot = PlotId::new(1);

    for (level, cost) in [(0, 100), (1, 200), (2, 300)] {
        assert_eq!(query::upgrade_cost(&world, plot), Some(cost));
        let events = run(&mut world, [Command::BuildOnPlot { plot }]);
        assert!(events.contains(&Event::PlotBuilt { plot, level, cost }));
    }

    assert_eq!(query::plot_state(&world, plot), Some(PlotBuildState::Built { level: 2 }));
    assert_eq!(query::gold(&world), 400);
    assert_eq!(query::upgrade_cost(&world, plot), None);

    let events = run(&mut world, [Command::BuildOnPlot { plot }]);
    assert_eq!(
        events,
        vec![Event::BuildRejected {
            plot,
            reason: BuildRejection::MaxLevel,
        }],
    );
}

#[test]
fn builds_need_funds_and_known_plots() {
    let mut world = world_with_gold(50);
    let events = run(
        &mut world,
        [
            Command::BuildOnPlot {
                plot: PlotId::new(1),
            },
            Command::BuildOnPlot {
                plot: PlotId::new(9),
            },
        ],
    );

    assert_eq!(
        events,
        vec![
            Event::BuildRejected {
                plot: PlotId::new(1),
                reason: BuildRejection::InsufficientGold,
            },
            Event::BuildRejected {
                plot: PlotId::new(9),
                reason: BuildRejection::UnknownPlot,
            },
        ],
    );
    assert_eq!(query::gold(&world), 50);
    assert_eq!(query::plot_state(&world, PlotId::new(1)), Some(PlotBuildState::Empty));
}

#[test]
fn maxing_every_plot_is_reported_once() {
    let mut world = world_with_gold(10_000);
    let builds = [1, 1, 1, 2, 2, 2]
        .into_iter()
        .map(|id| Command::BuildOnPlot {
            plot: PlotId::new(id),
        });
    let events = run(&mut world, builds);

    assert_eq!(events.last(), Some(&Event::AllPlotsMaxed));
    let reports = events
        .iter()
        .filter(|event| matches!(event, Event::AllPlotsMaxed))
        .count();
    assert_eq!(reports, 1, "plot 1 alone must not trigger the report");
}
