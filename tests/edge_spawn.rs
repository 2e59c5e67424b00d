mod common;

use std::collections::HashSet;

use arena_shooter::common::config::{BAT, GameConfig};
use arena_shooter::common::sequence::Countdown;
use arena_shooter::plugins::enemies::{
    DamageEnemy, EdgeEntering, Enemy, EnemyKind, EnemyLifeState, Health,
};
use arena_shooter::plugins::level::{GameplayMode, LevelPhase};
use arena_shooter::plugins::player::{Player, PlayerMode};
use arena_shooter::plugins::world::{CurrentMap, MapLayout, shifted};
use bevy::prelude::*;

#[derive(Default)]
struct Tally {
    bats: HashSet<Entity>,
    shot_inside: HashSet<Entity>,
}

/// Keeps the player shielded and shoots whatever is reachable: alive, done
/// entering, and inside the walls.
fn shoot_reachable(world: &mut World, tally: &mut Tally) {
    if let Ok(mut mode) = world.query_filtered::<&mut PlayerMode, With<Player>>().single_mut(world) {
        mode.invincible = Countdown::new(5.0);
    }

    let map = world.resource::<CurrentMap>().clone();
    let walkable = shifted(MapLayout::walkable(map.size), map.origin);

    let mut targets = Vec::new();
    let mut q = world.query_filtered::<(
        Entity,
        &EnemyKind,
        &EnemyLifeState,
        &Transform,
        Has<EdgeEntering>,
    ), (With<Enemy>, With<Health>)>();
    for (e, kind, life, tf, entering) in q.iter(world) {
        if kind.0 == BAT {
            tally.bats.insert(e);
        }
        if !life.is_alive() || entering || !walkable.contains(tf.translation.truncate()) {
            continue;
        }
        if kind.0 == BAT {
            tally.shot_inside.insert(e);
        }
        targets.push(e);
    }
    for target in targets {
        world.write_message(DamageEnemy {
            target,
            amount: 100,
            should_drop: false,
        });
    }
}

#[test]
fn bats_fly_in_over_the_walls_and_the_level_still_clears() {
    let mut config = GameConfig::default();
    config.levels[1].duration_secs = 12.0;
    config.levels[1].critter_chance = 0.0;
    let bats_configured: u32 = config.levels[1]
        .waves
        .iter()
        .flat_map(|w| &w.groups)
        .filter(|g| g.enemy == BAT)
        .map(|g| g.count)
        .sum();
    assert!(bats_configured > 0);

    let mut app = common::app_with(config, Some(common::record(1, 3)));
    common::run_until(
        &mut app,
        2.0,
        |_| {},
        |w| common::phase(w) == LevelPhase::Gameplay(GameplayMode::Waves),
    );

    let mut tally = Tally::default();
    common::run_until(
        &mut app,
        60.0,
        |w| shoot_reachable(w, &mut tally),
        |w| common::phase(w) == LevelPhase::AwaitExit,
    );

    assert_eq!(tally.bats.len(), bats_configured as usize);
    assert_eq!(tally.shot_inside, tally.bats, "some bat never made it inside");
}
