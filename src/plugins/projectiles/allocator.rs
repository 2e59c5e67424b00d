//! Spawn consumer: activate bullets from the pool.
//!
//! An empty pool drops the request; that is a capacity decision, not an error.

use avian2d::prelude::*;
use bevy::prelude::*;

use super::components::{Bullet, BulletEntity, BulletState, PooledBullet};
use super::messages::FireRequest;
use super::pool::{BulletPool, active_layers, bullet_color};

#[allow(clippy::type_complexity)]
pub fn allocate_bullets_from_pool(
    mut pool: ResMut<BulletPool>,
    mut reader: MessageReader<FireRequest>,
    mut q: Query<
        (
            &mut BulletState,
            &mut Bullet,
            &mut Transform,
            &mut LinearVelocity,
            &mut Visibility,
            &mut CollisionLayers,
            &mut Sprite,
        ),
        With<PooledBullet>,
    >,
) {
    for req in reader.read() {
        let Some(BulletEntity(e)) = pool.pop_free() else {
            debug!("bullet pool exhausted, dropping {:?} shot", req.kind);
            continue;
        };
        let Ok((mut state, mut bullet, mut tf, mut vel, mut vis, mut layers, mut sprite)) = q.get_mut(e) else {
            warn!("pooled bullet {e:?} lost its components");
            continue;
        };

        *state = BulletState::Active;
        bullet.reset_for_fire(req.kind, req.damage);
        tf.translation = req.pos.extend(2.0);
        vel.0 = req.vel;
        *vis = Visibility::Visible;
        *layers = active_layers(req.kind);
        sprite.color = bullet_color(req.kind);
    }
}
