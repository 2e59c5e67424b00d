//! Return commit: recycle bullets back into the pool.
//!
//! This is the only place that writes the parked state: hidden, at rest, and
//! colliding with nothing.

use avian2d::prelude::*;
use bevy::prelude::*;

use super::components::{BulletEntity, BulletState, PooledBullet};
use super::pool::{BulletPool, inactive_bullet_layers};

type PooledParts<'a> = (
    Entity,
    &'a mut BulletState,
    &'a mut Visibility,
    &'a mut LinearVelocity,
    &'a mut CollisionLayers,
);

fn park(
    pool: &mut BulletPool,
    (e, mut state, mut vis, mut vel, mut layers): (
        Entity,
        Mut<BulletState>,
        Mut<Visibility>,
        Mut<LinearVelocity>,
        Mut<CollisionLayers>,
    ),
) {
    *state = BulletState::Inactive;
    *vis = Visibility::Hidden;
    vel.0 = Vec2::ZERO;
    *layers = inactive_bullet_layers();
    pool.push_free(BulletEntity(e));
}

pub fn return_to_pool_commit(mut pool: ResMut<BulletPool>, mut q: Query<PooledParts, With<PooledBullet>>) {
    for parts in &mut q {
        if *parts.1 != BulletState::PendingReturn {
            continue;
        }
        park(&mut pool, parts);
    }
}

/// Leaving the game parks every bullet still in flight.
pub fn recall_all_bullets(mut pool: ResMut<BulletPool>, mut q: Query<PooledParts, With<PooledBullet>>) {
    let mut n = 0;
    for parts in &mut q {
        if *parts.1 == BulletState::Inactive {
            continue;
        }
        park(&mut pool, parts);
        n += 1;
    }
    debug!("recalled {n} bullets");
}
