//! Feature plugins.

use bevy::prelude::*;

pub mod boss;
pub mod core;
pub mod encounter;
pub mod enemies;
pub mod hud;
pub mod level;
pub mod loot;
pub mod persistence;
pub mod physics;
pub mod player;
pub mod projectiles;
pub mod waves;
pub mod world;

// Render-only
pub mod camera;
pub mod lighting;

/// Register gameplay plugins that work in headless tests.
pub fn register_gameplay(app: &mut App) {
    core::plugin(app);
    physics::plugin(app);
    hud::plugin(app);
    world::plugin(app);
    player::plugin(app);
    enemies::plugin(app);
    waves::plugin(app);
    boss::plugin(app);
    encounter::plugin(app);
    loot::plugin(app);
    projectiles::plugin(app);
    persistence::plugin(app);
    level::plugin(app);
}

/// Register render-only plugins (requires DefaultPlugins / render infra).
pub fn register_render(app: &mut App) {
    lighting::plugin(app);
    camera::plugin(app);
}
