//! Unit tests for the enemies module.
//!
//! Submodule tests so private systems can be run directly with `run_system_once`.

use std::time::Duration;

use super::*;

use crate::common::config::{BAT, BossKind, GRUNT, SPIKEBALL};
use crate::common::test_utils::run_system_once;
use crate::plugins::boss::BossBrain;
use crate::plugins::world::MapId;

fn world_with_messages() -> World {
    let mut world = World::new();
    world.init_resource::<Messages<SpawnEnemy>>();
    world.init_resource::<Messages<DamageEnemy>>();
    world.init_resource::<Messages<EnemyDied>>();
    world.init_resource::<Messages<StunEnemies>>();
    world.init_resource::<Messages<LevelCommand>>();
    world.insert_resource(GameConfig::default());
    world.insert_resource(Tunables::default());
    world.insert_resource(CurrentMap::default());
    world.insert_resource(GameRng::seeded(7));
    world
}

fn spawn_one(world: &mut World, kind: EnemyKindId, source: SpawnSource) -> Entity {
    world.write_message(SpawnEnemy {
        kind,
        position: Vec2::new(3.0, 4.0),
        source,
    });
    run_system_once(world, super::spawn_enemies);
    world
        .query_filtered::<(Entity, &EnemyKind), With<Enemy>>()
        .iter(world)
        .filter(|(_, k)| k.0 == kind)
        .map(|(e, _)| e)
        .last()
        .unwrap()
}

// -----------------------------------------------------------------------------
// Health
// -----------------------------------------------------------------------------

#[test]
fn death_fires_exactly_once_and_health_stays_clamped() {
    let sequences: [&[i32]; 4] = [&[10], &[3, 3, 3, 3], &[1, 9, 50], &[9, 0, -4, 1, 1]];

    for hits in sequences {
        let mut hp = Health::new(10);
        let mut kills = 0;
        for &h in hits {
            if hp.take_damage(h) == DamageOutcome::Killed {
                kills += 1;
            }
            assert!((0..=hp.max()).contains(&hp.current()));
        }
        assert_eq!(kills, 1, "hits {hits:?}");
        assert_eq!(hp.current(), 0);

        assert_eq!(hp.take_damage(5), DamageOutcome::Ignored);
        assert_eq!(hp.current(), 0);
    }
}

#[test]
fn weaken_never_kills_or_heals() {
    let mut hp = Health::new(4);
    hp.weaken_to(1);
    assert_eq!(hp.current(), 1);
    assert!(!hp.is_dead());

    let mut low = Health::new(4);
    low.take_damage(3);
    low.weaken_to(2);
    assert_eq!(low.current(), 1);
}

// -----------------------------------------------------------------------------
// Stun
// -----------------------------------------------------------------------------

#[test]
fn unstun_restores_pre_stun_speed() {
    let mut m = Mobility::new(73.0);
    m.stun();
    assert_eq!(m.move_speed, 0.0);
    assert_eq!(m.anim_rate, 0.0);

    // Second stun must not overwrite the snapshot with zero.
    m.stun();
    m.unstun();
    assert_eq!(m.move_speed, 73.0);
    assert_eq!(m.anim_rate, 1.0);

    // Unstun without stun is a no-op.
    m.move_speed = 12.0;
    m.unstun();
    assert_eq!(m.move_speed, 12.0);
}

#[test]
fn stun_message_freezes_and_releases_all_enemies() {
    let mut world = world_with_messages();
    let e = world.spawn((Enemy, Mobility::new(40.0))).id();

    world.write_message(StunEnemies(true));
    run_system_once(&mut world, super::apply_stun);
    assert!(world.get::<Mobility>(e).unwrap().is_stunned());

    world.write_message(StunEnemies(false));
    run_system_once(&mut world, super::apply_stun);
    assert_eq!(world.get::<Mobility>(e).unwrap().move_speed, 40.0);
}

// -----------------------------------------------------------------------------
// Contact rule
// -----------------------------------------------------------------------------

#[test]
fn contact_kills_unprotected_player_only() {
    let plain = PlayerMode::default();
    assert_eq!(contact_outcome(&plain), ContactOutcome::PlayerDies);

    let shielded = PlayerMode {
        invincible: Countdown::new(1.0),
        ..default()
    };
    assert_eq!(contact_outcome(&shielded), ContactOutcome::EnemyHurt);

    let counter = PlayerMode {
        counter: Countdown::new(1.0),
        ..default()
    };
    assert_eq!(contact_outcome(&counter), ContactOutcome::EnemyHurt);
}

// -----------------------------------------------------------------------------
// Systems
// -----------------------------------------------------------------------------

#[test]
fn spawn_tags_follow_source_and_archetype() {
    let mut world = world_with_messages();
    world.resource_mut::<CurrentMap>().id = MapId(3);

    let grunt = spawn_one(&mut world, GRUNT, SpawnSource::Wave);
    assert!(world.get::<WaveIssued>(grunt).is_some());
    assert!(world.get::<InertUnderClear>(grunt).is_none());
    assert_eq!(world.get::<MapPart>(grunt), Some(&MapPart(MapId(3))));

    let spike = spawn_one(&mut world, SPIKEBALL, SpawnSource::Replay);
    assert!(world.get::<WaveIssued>(spike).is_some());
    assert!(world.get::<InertUnderClear>(spike).is_some());

    let critter_kind = world.resource::<GameConfig>().critter_kind;
    let critter = spawn_one(&mut world, critter_kind, SpawnSource::Critter);
    assert!(world.get::<Critter>(critter).is_some());
    assert!(world.get::<WaveIssued>(critter).is_none());
}

#[test]
fn lethal_damage_writes_one_death_message() {
    let mut world = world_with_messages();
    let e = spawn_one(&mut world, GRUNT, SpawnSource::Wave);

    for _ in 0..3 {
        world.write_message(DamageEnemy {
            target: e,
            amount: 5,
            should_drop: true,
        });
    }
    run_system_once(&mut world, super::apply_damage);

    let died = world.resource::<Messages<EnemyDied>>();
    let deaths: Vec<_> = died.iter_current_update_messages().collect();
    assert_eq!(deaths.len(), 1);
    assert_eq!(deaths[0].entity, e);
    assert!(deaths[0].should_drop);
    assert!(matches!(
        world.get::<EnemyLifeState>(e),
        Some(EnemyLifeState::Dying { .. })
    ));
}

#[test]
fn weaken_command_only_touches_inert_enemies() {
    let mut world = world_with_messages();
    let spike = spawn_one(&mut world, SPIKEBALL, SpawnSource::Wave);
    let grunt = spawn_one(&mut world, GRUNT, SpawnSource::Wave);
    world.get_mut::<Health>(grunt).unwrap().take_damage(0);

    world.write_message(LevelCommand::WeakenInert);
    run_system_once(&mut world, super::apply_level_commands);

    assert_eq!(world.get::<Health>(spike).unwrap().current(), 1);
    let grunt_hp = world.get::<Health>(grunt).unwrap();
    assert_eq!(grunt_hp.current(), grunt_hp.max());
}

#[test]
fn census_excludes_dead_and_splits_inert() {
    let alive = EnemyLifeState::Alive;
    let dying = EnemyLifeState::Dying {
        timer: Timer::from_seconds(1.0, TimerMode::Once),
    };

    let c = Census::count([(&alive, true), (&alive, true), (&dying, false)]);
    assert_eq!(c, Census { non_inert: 0, inert: 2 });
    assert!(c.only_inert());

    let c = Census::count([(&alive, true), (&alive, false)]);
    assert!(!c.only_inert());
    assert_eq!(c.total(), 2);

    assert!(!Census::default().only_inert());
}

#[test]
fn marked_entities_are_despawned() {
    let mut world = World::new();
    let e = world.spawn((Enemy, PendingDespawn)).id();
    let keep = world.spawn(Enemy).id();

    run_system_once(&mut world, super::despawn_marked);

    assert!(world.get_entity(e).is_err());
    assert!(world.get_entity(keep).is_ok());
}

// -----------------------------------------------------------------------------
// Edge entry
// -----------------------------------------------------------------------------

fn spawn_at(world: &mut World, kind: EnemyKindId, position: Vec2) -> Entity {
    world.resource_mut::<Messages<SpawnEnemy>>().clear();
    world.write_message(SpawnEnemy {
        kind,
        position,
        source: SpawnSource::Wave,
    });
    run_system_once(world, super::spawn_enemies);
    world
        .query_filtered::<(Entity, &EnemyKind), With<Enemy>>()
        .iter(world)
        .filter(|(_, k)| k.0 == kind)
        .map(|(e, _)| e)
        .last()
        .unwrap()
}

fn collides_with_walls(world: &World, e: Entity) -> bool {
    world.get::<CollisionLayers>(e).unwrap().filters.has_all(Layer::World)
}

#[test]
fn edge_spawner_passes_the_walls_until_fully_inside() {
    let mut world = world_with_messages();
    let h = world.resource::<CurrentMap>().size.y * 0.5;
    let bat = spawn_at(&mut world, BAT, Vec2::new(0.0, h + 24.0));
    let grunt = spawn_at(&mut world, GRUNT, Vec2::ZERO);

    assert!(world.get::<EdgeEntering>(bat).is_some());
    assert!(!collides_with_walls(&world, bat));
    assert!(world.get::<EdgeEntering>(grunt).is_none());
    assert!(collides_with_walls(&world, grunt));

    // Heads for the map center while entering.
    run_system_once(&mut world, super::steer_enemies);
    let vel = world.get::<LinearVelocity>(bat).unwrap().0;
    assert!(vel.y < 0.0 && vel.x.abs() < 1e-3, "{vel:?}");

    // Overlapping the wall band is not inside yet.
    world.get_mut::<Transform>(bat).unwrap().translation.y = h - 35.0;
    run_system_once(&mut world, super::finish_edge_entry);
    assert!(world.get::<EdgeEntering>(bat).is_some());

    world.get_mut::<Transform>(bat).unwrap().translation.y = h - 60.0;
    run_system_once(&mut world, super::finish_edge_entry);
    assert!(world.get::<EdgeEntering>(bat).is_none());
    assert!(collides_with_walls(&world, bat));
}

#[test]
fn entered_critter_keeps_passing_walls() {
    let mut world = world_with_messages();
    let critter_kind = world.resource::<GameConfig>().critter_kind;
    let critter = spawn_at(&mut world, critter_kind, Vec2::ZERO);
    assert!(world.get::<EdgeEntering>(critter).is_some());

    run_system_once(&mut world, super::finish_edge_entry);
    assert!(world.get::<EdgeEntering>(critter).is_none());
    assert!(!collides_with_walls(&world, critter));
}

// -----------------------------------------------------------------------------
// Player contacts
// -----------------------------------------------------------------------------

fn contact_world(mode: PlayerMode) -> (World, Entity, Entity) {
    let mut world = World::new();
    world.init_resource::<Time>();
    world.init_resource::<Messages<CollisionStart>>();
    world.init_resource::<Messages<CollisionEnd>>();
    world.init_resource::<Messages<KillPlayer>>();
    world.init_resource::<Messages<DamageEnemy>>();
    world.init_resource::<PlayerContacts>();
    let player = world.spawn((Player, mode, PlayerLife::Alive)).id();
    let enemy = world.spawn((Enemy, EnemyLifeState::Alive)).id();
    (world, player, enemy)
}

fn shielded() -> PlayerMode {
    PlayerMode {
        invincible: Countdown::new(1.0),
        ..default()
    }
}

/// Contact between `player` and an enemy body reached through a separate collider.
fn touch(world: &mut World, player: Entity, enemy: Entity) {
    let collider = world.spawn_empty().id();
    world.write_message(CollisionStart {
        collider1: collider,
        collider2: player,
        body1: Some(enemy),
        body2: Some(player),
    });
}

fn separate(world: &mut World, player: Entity, enemy: Entity) {
    world.write_message(CollisionEnd {
        collider1: player,
        collider2: enemy,
        body1: Some(player),
        body2: Some(enemy),
    });
}

/// One fixed step; returns (kills, damaged enemies) written by it.
fn step(world: &mut World) -> (usize, Vec<Entity>) {
    world.resource_mut::<Messages<KillPlayer>>().clear();
    world.resource_mut::<Messages<DamageEnemy>>().clear();
    run_system_once(world, super::track_player_contacts);
    world.resource_mut::<Messages<CollisionStart>>().clear();
    world.resource_mut::<Messages<CollisionEnd>>().clear();
    run_system_once(world, super::resolve_player_contacts);

    let kills = world.resource::<Messages<KillPlayer>>().iter_current_update_messages().count();
    let hits = world
        .resource::<Messages<DamageEnemy>>()
        .iter_current_update_messages()
        .map(|d| d.target)
        .collect();
    (kills, hits)
}

#[test]
fn touching_an_enemy_kills_a_plain_player() {
    let (mut world, player, enemy) = contact_world(PlayerMode::default());
    touch(&mut world, player, enemy);
    assert_eq!(step(&mut world), (1, vec![]));
    assert!(world.resource::<PlayerContacts>().contains(enemy));
}

#[test]
fn protection_ending_mid_contact_kills_the_player() {
    let (mut world, player, enemy) = contact_world(shielded());
    touch(&mut world, player, enemy);

    assert_eq!(step(&mut world), (0, vec![enemy]));
    assert_eq!(step(&mut world), (0, vec![]), "counter hits are paced");

    *world.get_mut::<PlayerMode>(player).unwrap() = PlayerMode::default();
    assert_eq!(step(&mut world).0, 1);
}

#[test]
fn counter_mode_keeps_hurting_a_lingering_enemy() {
    let (mut world, player, enemy) = contact_world(PlayerMode {
        counter: Countdown::new(5.0),
        ..default()
    });
    touch(&mut world, player, enemy);
    assert_eq!(step(&mut world).1, vec![enemy]);

    world
        .resource_mut::<Time>()
        .advance_by(Duration::from_secs_f32(COUNTER_CONTACT_REPEAT_SECS + 0.1));
    assert_eq!(step(&mut world).1, vec![enemy]);

    separate(&mut world, player, enemy);
    world
        .resource_mut::<Time>()
        .advance_by(Duration::from_secs_f32(COUNTER_CONTACT_REPEAT_SECS + 0.1));
    assert_eq!(step(&mut world), (0, vec![]));
    assert!(world.resource::<PlayerContacts>().is_empty());
}

#[test]
fn dead_players_and_dying_enemies_are_skipped() {
    let (mut world, player, enemy) = contact_world(PlayerMode::default());
    *world.get_mut::<EnemyLifeState>(enemy).unwrap() = EnemyLifeState::Dying {
        timer: Timer::from_seconds(1.0, TimerMode::Once),
    };
    touch(&mut world, player, enemy);
    assert_eq!(step(&mut world), (0, vec![]));

    let (mut world, player, enemy) = contact_world(PlayerMode::default());
    *world.get_mut::<PlayerLife>(player).unwrap() = PlayerLife::Dead {
        respawn_in: Countdown::new(1.0),
    };
    touch(&mut world, player, enemy);
    assert_eq!(step(&mut world), (0, vec![]));

    // Despawned enemies drop out of the contact set.
    world.despawn(enemy);
    step(&mut world);
    assert!(world.resource::<PlayerContacts>().is_empty());
}

#[test]
fn shielded_player_hurts_a_boss_on_contact() {
    let (mut world, player, _) = contact_world(shielded());
    let profile = GameConfig::default().boss(BossKind::Warden).unwrap().clone();
    let boss = world.spawn((Enemy, EnemyLifeState::Alive, BossBrain::new(&profile))).id();

    touch(&mut world, player, boss);
    assert_eq!(step(&mut world), (0, vec![boss]));
}

#[test]
fn non_enemy_contacts_are_ignored() {
    let (mut world, player, _) = contact_world(PlayerMode::default());
    let wall = world.spawn_empty().id();
    world.write_message(CollisionStart {
        collider1: player,
        collider2: wall,
        body1: Some(player),
        body2: None,
    });
    assert_eq!(step(&mut world), (0, vec![]));
    assert!(world.resource::<PlayerContacts>().is_empty());
}
