use avian2d::prelude::*;
use bevy::prelude::*;

use super::components::{Bullet, BulletEntity, BulletState, PooledBullet};
use super::messages::BulletKind;
use crate::common::layers::Layer;
use crate::plugins::world::WorldAnchored;

pub const BULLET_POOL_CAPACITY: usize = 256;
const BULLET_RADIUS: f32 = 4.0;

#[derive(Resource, Debug)]
pub struct BulletPool {
    free: Vec<BulletEntity>,
    capacity: usize,
}

impl BulletPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    #[inline]
    pub fn pop_free(&mut self) -> Option<BulletEntity> {
        self.free.pop()
    }

    #[inline]
    pub fn push_free(&mut self, e: BulletEntity) {
        self.free.push(e);
    }
}

impl Default for BulletPool {
    fn default() -> Self {
        Self::new(BULLET_POOL_CAPACITY)
    }
}

#[inline]
pub fn active_player_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::PlayerBullet, [Layer::World, Layer::Enemy])
}

#[inline]
pub fn active_enemy_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::EnemyBullet, [Layer::World, Layer::Player])
}

#[inline]
pub fn active_layers(kind: BulletKind) -> CollisionLayers {
    match kind {
        BulletKind::Player => active_player_layers(),
        BulletKind::Enemy => active_enemy_layers(),
    }
}

/// Parked bullets collide with nothing.
#[inline]
pub fn inactive_bullet_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::PlayerBullet, [] as [Layer; 0])
}

#[inline]
pub fn bullet_color(kind: BulletKind) -> Color {
    match kind {
        BulletKind::Player => Color::srgb(1.0, 0.85, 0.3),
        BulletKind::Enemy => Color::srgb(0.95, 0.35, 0.6),
    }
}

/// Pre-spawn the whole pool, parked. Bullets live for the whole app, not per run.
pub fn init_bullet_pool(mut commands: Commands, mut pool: ResMut<BulletPool>) {
    pool.free.clear();
    let cap = pool.capacity;
    pool.free.reserve(cap);

    for _ in 0..cap {
        let e = commands
            .spawn((
                Name::new("Bullet(Pooled)"),
                PooledBullet,
                BulletState::Inactive,
                Bullet::new(BulletKind::Player, 1),
                WorldAnchored,
                Sprite {
                    color: bullet_color(BulletKind::Player),
                    custom_size: Some(Vec2::splat(BULLET_RADIUS * 2.0)),
                    ..default()
                },
                Transform::from_xyz(0.0, 0.0, 2.0),
                Visibility::Hidden,
                RigidBody::Dynamic,
                Collider::circle(BULLET_RADIUS),
                Sensor,
                inactive_bullet_layers(),
                LinearVelocity(Vec2::ZERO),
                CollisionEventsEnabled,
            ))
            .id();

        pool.free.push(BulletEntity(e));
    }
    debug!("bullet pool ready ({cap})");
}
