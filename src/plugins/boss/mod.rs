//! Boss plugin: ECS side of the boss brain.
//!
//! ```text
//! Direct:   drive_bosses       tick brains, move, turn signals into effects
//! Resolve:  apply_boss_damage  DamageEnemy aimed at a boss -> brain.take_damage
//! ```
//!
//! Boss entities carry `Enemy` + `EnemyLifeState` so bullets and the contact rule
//! treat them like any other enemy, but their health lives in `BossBrain`.
//! Signals produced by damage are parked in `BossOutbox` and applied by
//! `drive_bosses` on the next frame; only death takes effect immediately.

pub mod brain;

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy_firefly::prelude::Occluder2d;
use rand::Rng;

use crate::common::config::{BossKind, BossProfile};
use crate::common::layers::Layer;
use crate::common::rng::GameRng;
use crate::common::schedule::GameSet;
use crate::common::tunables::Tunables;
use crate::plugins::enemies::{
    self, BossSummoned, DamageEnemy, Enemy, EnemyLifeState, PendingDespawn, SpawnEnemy, SpawnSource,
};
use crate::plugins::hud::AudioCue;
use crate::plugins::player::{InputLock, Player};
use crate::plugins::projectiles::{BulletKind, FireRequest};
use crate::plugins::world::{self, CurrentMap, MapId};

pub use brain::{BossAction, BossBrain, BossPhase, BossSignal, choose_action, pattern_directions};

/// Damage of one boss bullet.
const BOSS_BULLET_DAMAGE: i32 = 1;

/// Arena rectangle relative to the map center; the boss never leaves it.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct BossArena(pub Rect);

/// Signals from damage, waiting for the next `drive_bosses`.
#[derive(Component, Debug, Default, Clone)]
pub struct BossOutbox(pub Vec<BossSignal>);

pub fn plugin(app: &mut App) {
    app.add_systems(Update, drive_bosses.in_set(GameSet::Direct))
        .add_systems(Update, apply_boss_damage.in_set(GameSet::Resolve));
}

fn boss_color(kind: BossKind) -> Color {
    match kind {
        BossKind::Warden => Color::srgb(0.55, 0.35, 0.2),
        BossKind::Phantom => Color::srgb(0.55, 0.5, 0.85),
    }
}

/// Spawn a waiting boss. It does nothing until its encounter starts the fight.
pub fn spawn_boss(
    commands: &mut Commands,
    profile: &BossProfile,
    position: Vec2,
    arena: Rect,
    id: MapId,
) -> Entity {
    commands
        .spawn((
            Name::new(profile.name.clone()),
            Enemy,
            EnemyLifeState::Alive,
            BossBrain::new(profile),
            BossArena(arena),
            BossOutbox::default(),
            Sprite {
                color: boss_color(profile.kind),
                custom_size: Some(Vec2::splat(profile.radius * 2.0)),
                ..default()
            },
            Transform::from_translation(position.extend(1.0)),
            RigidBody::Kinematic,
            Collider::circle(profile.radius),
            CollisionLayers::new(Layer::Enemy, [Layer::Player, Layer::PlayerBullet]),
            CollisionEventsEnabled,
            LinearVelocity::ZERO,
            Occluder2d::circle(profile.radius),
            world::scoped(id),
        ))
        .id()
}

#[allow(clippy::too_many_arguments)]
pub fn drive_bosses(
    mut commands: Commands,
    time: Res<Time>,
    tunables: Res<Tunables>,
    map: Res<CurrentMap>,
    mut rng: ResMut<GameRng>,
    mut lock: ResMut<InputLock>,
    mut q_boss: Query<
        (
            Entity,
            &mut BossBrain,
            &mut BossOutbox,
            &BossArena,
            &mut Transform,
            &mut LinearVelocity,
            &mut Sprite,
        ),
        (Without<Player>, Without<PendingDespawn>),
    >,
    q_player: Query<&Transform, (With<Player>, Without<BossBrain>)>,
    q_minions: Query<(Entity, &EnemyLifeState), With<BossSummoned>>,
    mut fire: MessageWriter<FireRequest>,
    mut spawn: MessageWriter<SpawnEnemy>,
    mut damage: MessageWriter<DamageEnemy>,
    mut audio: MessageWriter<AudioCue>,
) {
    let dt = time.delta_secs();
    let player = q_player.single().ok().map(|tf| tf.translation.truncate());

    for (e, mut brain, mut outbox, arena, mut tf, mut vel, mut sprite) in &mut q_boss {
        let roll: f32 = rng.0.r#gen();
        let mut signals = std::mem::take(&mut outbox.0);
        signals.extend(brain.tick(dt, roll));

        let bounds = world::shifted(arena.0, map.origin);
        vel.0 = match (brain.phase(), player) {
            (BossPhase::Moving, Some(p)) => {
                (p - tf.translation.truncate()).normalize_or_zero() * brain.profile().move_speed
            }
            _ => Vec2::ZERO,
        };
        let here = tf.translation.truncate().clamp(bounds.min, bounds.max);
        tf.translation.x = here.x;
        tf.translation.y = here.y;

        for signal in signals {
            match signal {
                BossSignal::LockInput => lock.0 = true,
                BossSignal::ReleaseInput => lock.0 = false,
                BossSignal::Fire(pattern) => {
                    let aim = player.map(|p| p - here).unwrap_or(Vec2::NEG_Y);
                    let muzzle = brain.profile().radius + 6.0;
                    for dir in pattern_directions(pattern, aim) {
                        fire.write(FireRequest {
                            kind: BulletKind::Enemy,
                            pos: here + dir * muzzle,
                            vel: dir * tunables.enemy_bullet_speed,
                            damage: BOSS_BULLET_DAMAGE,
                        });
                    }
                }
                BossSignal::Teleport => {
                    let to = Vec2::new(
                        rng.0.gen_range(bounds.min.x..=bounds.max.x),
                        rng.0.gen_range(bounds.min.y..=bounds.max.y),
                    );
                    debug!("{} teleports to {to:?}", brain.name());
                    tf.translation.x = to.x;
                    tf.translation.y = to.y;
                }
                BossSignal::Summon { kind, count } => {
                    info!("{} summons {count} helpers", brain.name());
                    let ring = brain.profile().radius * 2.5;
                    let step = std::f32::consts::TAU / count.max(1) as f32;
                    for i in 0..count {
                        spawn.write(SpawnEnemy {
                            kind,
                            position: here + Vec2::from_angle(i as f32 * step) * ring,
                            source: SpawnSource::Boss,
                        });
                    }
                }
                BossSignal::Died => {
                    // Helpers die with their master, without drops.
                    for (m, life) in &q_minions {
                        if life.is_alive() {
                            damage.write(DamageEnemy {
                                target: m,
                                amount: i32::MAX,
                                should_drop: false,
                            });
                        }
                    }
                }
                BossSignal::DeathBeat(i) => {
                    audio.write(AudioCue::BossDeathBeat);
                    sprite.color.set_alpha(if i % 2 == 0 { 0.35 } else { 1.0 });
                }
                BossSignal::Vanish => {
                    debug!("{} vanished", brain.name());
                    commands.entity(e).insert(PendingDespawn);
                }
            }
        }
    }
}

/// Route hits on bosses into their brains. Death is applied here so nothing
/// touches a dead boss in the meantime.
fn apply_boss_damage(
    mut hits: MessageReader<DamageEnemy>,
    mut q_boss: Query<
        (&mut BossBrain, &mut BossOutbox, &mut EnemyLifeState, &mut CollisionLayers),
        Without<PendingDespawn>,
    >,
) {
    for hit in hits.read() {
        let Ok((mut brain, mut outbox, mut life, mut layers)) = q_boss.get_mut(hit.target) else {
            continue;
        };
        let signals = brain.take_damage(hit.amount);
        if signals.contains(&BossSignal::Died) {
            info!("{} defeated", brain.name());
            *life = EnemyLifeState::Dead;
            *layers = enemies::non_interacting_enemy_layers();
        } else if !signals.is_empty() {
            debug!("{}: {} / {}", brain.name(), brain.health(), brain.max_health());
        }
        outbox.0.extend(signals);
    }
}
