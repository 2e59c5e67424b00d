use avian2d::prelude::*;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;

use super::components::{Bullet, BulletState, PooledBullet};
use super::messages::BulletKind;
use crate::common::layers::Layer;
use crate::plugins::enemies::DamageEnemy;
use crate::plugins::player::{KillCause, KillPlayer};

#[derive(Clone, Copy, Debug)]
struct CollisionTarget {
    collider: Entity,
    body: Option<Entity>,
}

impl CollisionTarget {
    #[inline]
    fn gameplay_owner(self) -> Entity {
        self.body.unwrap_or(self.collider)
    }
}

#[inline]
fn targets(ev: &CollisionStart) -> (CollisionTarget, CollisionTarget) {
    (
        CollisionTarget {
            collider: ev.collider1,
            body: ev.body1,
        },
        CollisionTarget {
            collider: ev.collider2,
            body: ev.body2,
        },
    )
}

#[inline]
fn is_in_layer(layers: &CollisionLayers, layer: Layer) -> bool {
    layers.memberships.has_all(layer)
}

/// Walls absorb every bullet. Player bullets hurt enemies; enemy bullets kill the player.
#[allow(clippy::too_many_arguments)]
pub fn process_bullet_collisions(
    mut started: MessageReader<CollisionStart>,
    q_is_bullet: Query<(), With<PooledBullet>>,
    mut q_bullets: Query<(&Bullet, &mut BulletState), With<PooledBullet>>,
    q_layers: Query<&CollisionLayers>,
    mut damage: MessageWriter<DamageEnemy>,
    mut kill: MessageWriter<KillPlayer>,
    mut seen: Local<HashSet<Entity>>,
) {
    seen.clear();

    for ev in started.read() {
        let (t1, t2) = targets(ev);

        let b1 = q_is_bullet.contains(t1.collider);
        let b2 = q_is_bullet.contains(t2.collider);
        if !(b1 ^ b2) {
            continue;
        }
        let (bullet_side, other_side) = if b1 { (t1, t2) } else { (t2, t1) };

        if !seen.insert(bullet_side.collider) {
            continue;
        }
        let Ok(other_layers) = q_layers.get(other_side.collider) else {
            continue;
        };
        let Ok((bullet, mut state)) = q_bullets.get_mut(bullet_side.collider) else {
            continue;
        };
        if *state != BulletState::Active {
            continue;
        }

        if is_in_layer(other_layers, Layer::World) {
            *state = BulletState::PendingReturn;
            continue;
        }

        match bullet.kind {
            BulletKind::Player if is_in_layer(other_layers, Layer::Enemy) => {
                damage.write(DamageEnemy {
                    target: other_side.gameplay_owner(),
                    amount: bullet.damage,
                    should_drop: true,
                });
                *state = BulletState::PendingReturn;
            }
            BulletKind::Enemy if is_in_layer(other_layers, Layer::Player) => {
                kill.write(KillPlayer {
                    cause: KillCause::Bullet,
                });
                *state = BulletState::PendingReturn;
            }
            _ => {}
        }
    }
}

/// Bullets that flew too long are recalled.
pub fn expire_bullets(time: Res<Time>, mut q: Query<(&mut Bullet, &mut BulletState), With<PooledBullet>>) {
    let dt = time.delta_secs();
    for (mut bullet, mut state) in &mut q {
        if *state != BulletState::Active {
            continue;
        }
        bullet.ttl.tick_down(dt);
        if bullet.ttl.expired() {
            *state = BulletState::PendingReturn;
        }
    }
}
