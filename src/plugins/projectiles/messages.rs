//! Buffered fire requests.
//!
//! Shooters (the player, boss brains) only write intent; the allocator is the
//! single writer of the pool.

use bevy::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BulletKind {
    Player,
    Enemy,
}

#[derive(Message, Clone, Copy, Debug)]
pub struct FireRequest {
    pub kind: BulletKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: i32,
}
