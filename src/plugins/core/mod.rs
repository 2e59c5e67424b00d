//! Core plugin: shared resources, global settings and the frame ordering.
//!
//! `GameConfig` and `GameRng` are only inserted when missing, so a caller can
//! provide a loaded catalog or a seeded generator before the plugins run.

use bevy::prelude::*;

use crate::common::config::GameConfig;
use crate::common::rng::GameRng;
use crate::common::schedule;
use crate::common::tunables::Tunables;

pub fn plugin(app: &mut App) {
    app.insert_resource(Tunables::default());
    app.insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.07)));
    if !app.world().contains_resource::<GameConfig>() {
        app.insert_resource(GameConfig::default());
    }
    if !app.world().contains_resource::<GameRng>() {
        app.insert_resource(GameRng::default());
    }
    schedule::configure(app);
}

#[cfg(test)]
mod tests;
