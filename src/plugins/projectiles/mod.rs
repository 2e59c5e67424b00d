//! Projectiles plugin: message-based producer -> consumer spawning over a fixed pool.
//!
//! Every bullet in the game, player or boss, is one pre-spawned entity. Nothing is
//! spawned or despawned while playing; a bullet is parked by giving it empty
//! collision filters and hiding it.
//!
//! ```text
//!   Update (variable dt)
//!   Input    request_player_bullets       arrow keys + cooldown -> FireRequest
//!   Direct   boss brains                  volleys -> FireRequest
//!   Spawn    allocate_bullets_from_pool   FireRequest -> pop pool, activate
//!   Resolve  expire_bullets               ttl -> PendingReturn
//!            return_to_pool_commit        PendingReturn -> parked, pushed back
//!
//!   FixedPostUpdate (fixed dt)
//!            process_bullet_collisions    CollisionStart -> DamageEnemy / KillPlayer
//!
//!   OnExit(InGame)  recall_all_bullets
//! ```
//!
//! Shooters never touch `BulletPool`; the allocator is its single writer on the way
//! out and the commit on the way back.

pub mod allocator;
pub mod collision;
pub mod commit;
pub mod components;
pub mod messages;
pub mod pool;
pub mod request;

use avian2d::collision::narrow_phase::CollisionEventSystems;
use bevy::prelude::*;

use crate::common::schedule::GameSet;
use crate::common::state::GameState;
use crate::plugins::player;

pub use messages::{BulletKind, FireRequest};

pub fn plugin(app: &mut App) {
    app.init_resource::<pool::BulletPool>()
        .init_resource::<components::FireCooldown>()
        .add_message::<FireRequest>()
        .add_systems(Startup, pool::init_bullet_pool)
        .add_systems(OnEnter(GameState::InGame), request::reset_cooldown)
        .add_systems(OnExit(GameState::InGame), commit::recall_all_bullets)
        .add_systems(
            Update,
            request::request_player_bullets
                .after(player::gather_input)
                .in_set(GameSet::Input),
        )
        .add_systems(Update, allocator::allocate_bullets_from_pool.in_set(GameSet::Spawn))
        .add_systems(
            Update,
            (collision::expire_bullets, commit::return_to_pool_commit)
                .chain()
                .in_set(GameSet::Resolve),
        )
        .add_systems(
            FixedPostUpdate,
            collision::process_bullet_collisions
                .after(CollisionEventSystems)
                .run_if(in_state(GameState::InGame)),
        );
}
