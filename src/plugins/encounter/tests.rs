use bevy::prelude::*;

use super::*;
use crate::common::config::GameConfig;
use crate::common::test_utils::run_system_once;
use crate::plugins::loot::{Pickup, PickupKind};
use crate::plugins::world::MapId;

fn arena() -> Arena {
    Arena {
        bounds: Rect::from_center_size(Vec2::ZERO, Vec2::splat(400.0)),
        respawn_point: Vec2::new(0.0, -150.0),
    }
}

fn encounter(variant: VictoryVariant) -> BossEncounter {
    let mut profile = GameConfig::default().bosses[0].clone();
    profile.victory = variant;
    BossEncounter::new(&profile, arena())
}

fn beats_until_idle(enc: &mut BossEncounter, dt: f32, frames: usize) -> Vec<CutsceneBeat> {
    let mut all = Vec::new();
    for _ in 0..frames {
        let frame = enc.advance(dt);
        all.extend(frame.beats);
        if !enc.cutscene_running() {
            break;
        }
    }
    all
}

// -----------------------------------------------------------------------------
// Activation
// -----------------------------------------------------------------------------

#[test]
fn activation_without_a_boss_stays_inactive() {
    let mut enc = encounter(VictoryVariant::FadeOut);
    assert!(!enc.activate(None));
    assert!(!enc.is_active());
    // Nothing downstream fires while inactive.
    assert_eq!(enc.observe(0, 100), Observation::default());
}

#[test]
fn activation_is_an_idempotent_reset() {
    let mut world = World::new();
    let boss = world.spawn_empty().id();
    let other = world.spawn_empty().id();

    let mut enc = encounter(VictoryVariant::FadeOut);
    assert!(enc.activate(Some(boss)));
    assert!(enc.observe(0, 100).victory);
    assert!(enc.victory_triggered());

    // Re-activation clears the flags; the bound boss wins over a new discovery.
    assert!(enc.activate(Some(other)));
    assert_eq!(enc.boss(), Some(boss));
    assert!(!enc.victory_triggered());
    assert!(!enc.cutscene_running());

    let mut pre = encounter(VictoryVariant::FadeOut).with_boss(other);
    assert!(pre.activate(Some(boss)));
    assert_eq!(pre.boss(), Some(other));
}

// -----------------------------------------------------------------------------
// Observation and victory guard
// -----------------------------------------------------------------------------

#[test]
fn health_mirror_reports_changes_only() {
    let mut world = World::new();
    let boss = world.spawn_empty().id();
    let mut enc = encounter(VictoryVariant::CarryOff);
    enc.activate(Some(boss));

    assert_eq!(enc.observe(100, 100).health_bar, Some(1.0));
    assert_eq!(enc.observe(100, 100).health_bar, None);
    assert_eq!(enc.observe(40, 100).health_bar, Some(0.4));
}

#[test]
fn victory_fires_once_while_health_stays_at_zero() {
    let mut world = World::new();
    let boss = world.spawn_empty().id();
    let mut enc = encounter(VictoryVariant::CarryOff);
    enc.activate(Some(boss));

    let victories = (0..5).filter(|_| enc.observe(0, 100).victory).count();
    assert_eq!(victories, 1);
}

#[test]
fn victory_side_effects_run_once_in_the_world() {
    let mut world = World::new();
    world.init_resource::<Messages<HudCommand>>();
    world.insert_resource(CurrentMap::default());
    world.insert_resource(Progress::default());
    world.insert_resource(PlayerBounds(Rect::from_center_size(Vec2::ZERO, Vec2::splat(10.0))));

    let mut brain = BossBrain::new(&GameConfig::default().bosses[0]);
    brain.start_fight();
    brain.tick(10.0, 0.99);
    brain.take_damage(10_000);
    assert_eq!(brain.health(), 0);
    let boss = world.spawn((brain, Transform::from_xyz(5.0, 6.0, 0.0))).id();

    let mut enc = encounter(VictoryVariant::CarryOff);
    enc.activate(Some(boss));
    world.spawn(enc);

    run_system_once(&mut world, super::watch_encounters);
    run_system_once(&mut world, super::watch_encounters);

    assert_eq!(world.resource::<Progress>().areas_cleared, 1);
    let victory_loot = world
        .query::<&Pickup>()
        .iter(&world)
        .filter(|p| p.kind == PickupKind::Victory)
        .count();
    assert_eq!(victory_loot, 1);

    let map = world.resource::<CurrentMap>().clone();
    let expected = world::shifted(MapLayout::walkable(map.size), map.origin);
    assert_eq!(world.resource::<PlayerBounds>().0, expected);
}

#[test]
fn activation_rebinds_arena_and_starts_the_fight() {
    let mut world = World::new();
    world.init_resource::<Messages<LevelCommand>>();
    world.init_resource::<Messages<HudCommand>>();
    world.init_resource::<Messages<AudioCue>>();
    world.init_resource::<PlayerBounds>();
    world.init_resource::<RespawnPoint>();
    world.init_resource::<InputLock>();

    let mut map = CurrentMap::default();
    map.id = MapId(4);
    map.origin = Vec2::new(0.0, 100.0);
    let profile = GameConfig::default().bosses[1].clone();
    let boss = world
        .spawn((BossBrain::new(&profile), MapPart(MapId(4))))
        .id();
    let enc = world.spawn(BossEncounter::new(&profile, arena())).id();
    map.encounter = Some(enc);
    world.insert_resource(map);

    world.write_message(LevelCommand::ActivateEncounter);
    run_system_once(&mut world, super::activate_encounters);

    let e = world.get::<BossEncounter>(enc).unwrap();
    assert!(e.is_active());
    assert_eq!(e.boss(), Some(boss));
    assert_eq!(
        world.get::<BossBrain>(boss).unwrap().phase(),
        crate::plugins::boss::BossPhase::Intro
    );
    assert!(world.resource::<InputLock>().0);
    assert_eq!(world.resource::<RespawnPoint>().0, Vec2::new(0.0, -50.0));
    assert_eq!(
        world.resource::<PlayerBounds>().0,
        Rect::from_center_size(Vec2::new(0.0, 100.0), Vec2::splat(400.0))
    );

    let music: Vec<_> = world
        .resource::<Messages<AudioCue>>()
        .iter_current_update_messages()
        .cloned()
        .collect();
    assert_eq!(music, vec![AudioCue::Music(profile.music.clone())]);
}

// -----------------------------------------------------------------------------
// Post-victory cutscene
// -----------------------------------------------------------------------------

#[test]
fn loot_before_victory_does_nothing() {
    let mut enc = encounter(VictoryVariant::FadeOut);
    assert!(!enc.on_loot_collected());
    assert!(!enc.cutscene_running());
}

#[test]
fn fade_variant_locks_fades_releases_and_hands_off() {
    let mut world = World::new();
    let boss = world.spawn_empty().id();
    let mut enc = encounter(VictoryVariant::FadeOut);
    enc.activate(Some(boss));
    enc.observe(0, 100);

    assert!(enc.on_loot_collected());
    assert!(!enc.on_loot_collected(), "second pickup is ignored");

    let mut beats = Vec::new();
    let mut last_fade = 0.0;
    for _ in 0..200 {
        let frame = enc.advance(0.1);
        if let Some(a) = frame.fade {
            assert!(a >= last_fade);
            last_fade = a;
        }
        for b in frame.beats {
            if b == CutsceneBeat::BeginFade {
                enc.begin_fade();
            }
            beats.push(b);
        }
        if !enc.cutscene_running() {
            break;
        }
    }
    assert_eq!(
        beats,
        vec![
            CutsceneBeat::LockInput,
            CutsceneBeat::StartPose,
            CutsceneBeat::BeginFade,
            CutsceneBeat::ReleaseInput,
            CutsceneBeat::HandOff,
        ]
    );
    assert_eq!(last_fade, 1.0);
}

#[test]
fn carry_off_walk_blocks_until_the_walk_ends() {
    let mut world = World::new();
    let boss = world.spawn_empty().id();
    let mut enc = encounter(VictoryVariant::CarryOff);
    enc.activate(Some(boss));
    enc.observe(0, 100);
    enc.on_loot_collected();

    // Nothing starts the walk: the script holds at the gate.
    let beats = beats_until_idle(&mut enc, 0.1, 100);
    assert_eq!(beats.last(), Some(&CutsceneBeat::BeginWalk));
    assert!(enc.cutscene_running());

    enc.begin_walk(WalkLoop::new(Vec2::ZERO, Vec2::new(0.0, 90.0), 90.0, 30.0));
    let mut steps = 0;
    let mut tail = Vec::new();
    for _ in 0..30 {
        let f = enc.advance(0.1);
        steps += f.footsteps;
        tail.extend(f.beats);
        if !enc.cutscene_running() {
            break;
        }
    }
    assert_eq!(steps, 3);
    assert_eq!(tail, vec![CutsceneBeat::ReleaseInput, CutsceneBeat::HandOff]);
}

#[test]
fn walk_loop_footsteps_follow_distance() {
    let mut walk = WalkLoop::new(Vec2::ZERO, Vec2::new(100.0, 0.0), 50.0, 20.0);
    assert_eq!(walk.advance(0.5), 1);
    assert_eq!(walk.position(), Vec2::new(25.0, 0.0));
    assert_eq!(walk.advance(1.0), 2);
    assert!(!walk.finished());
    assert_eq!(walk.advance(10.0), 2);
    assert!(walk.finished());
    assert_eq!(walk.position(), Vec2::new(100.0, 0.0));

    let still = WalkLoop::new(Vec2::ONE, Vec2::ONE, 10.0, 5.0);
    assert!(still.finished());
    assert_eq!(still.position(), Vec2::ONE);
}
