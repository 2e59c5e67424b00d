use bevy::prelude::*;

use super::messages::BulletKind;
use crate::common::sequence::Countdown;

/// Seconds a bullet may fly before it is recalled.
pub const BULLET_TTL_SECS: f32 = 2.5;

#[derive(Component)]
pub struct PooledBullet;

/// A pooled bullet entity. Only the pool and the commit hand these out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulletEntity(pub Entity);

#[derive(Component, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BulletState {
    #[default]
    Inactive,
    Active,
    PendingReturn,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Bullet {
    pub damage: i32,
    pub kind: BulletKind,
    pub ttl: Countdown,
}

impl Bullet {
    pub fn new(kind: BulletKind, damage: i32) -> Self {
        Self {
            damage,
            kind,
            ttl: Countdown::new(BULLET_TTL_SECS),
        }
    }

    #[inline]
    pub fn reset_for_fire(&mut self, kind: BulletKind, damage: i32) {
        *self = Self::new(kind, damage);
    }
}

/// Time until the player may fire again.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct FireCooldown(pub Countdown);
