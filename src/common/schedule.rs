//! Frame ordering.
//!
//! Every gameplay system in `Update` belongs to exactly one of these sets and the
//! sets run in declaration order, so within one frame:
//!
//! ```text
//!   Input    sample intents, pause, held-item use
//!   Direct   level director, encounter watch, boss brains (decide; emit intent)
//!   Apply    consumers of director commands, wave spawner tick (emit spawn intent)
//!   Spawn    materialise enemies / bullets requested this frame
//!   Resolve  damage, deaths, loot, pickups, player hits
//!   Present  despawn marked entities, fold HUD commands
//! ```
//!
//! Raw input sampling and the pause toggle run just before `Input` and outside
//! the sets. The sets themselves stop while virtual time is paused, so no
//! scripted step, spawn or item use happens behind the pause panel.
//!
//! Collision events are produced by Avian in the fixed schedule and read here on
//! the next `Update`, so a clear check never sees a half-resolved hit.

use bevy::prelude::*;

use crate::common::state::GameState;

#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameSet {
    Input,
    Direct,
    Apply,
    Spawn,
    Resolve,
    Present,
}

pub fn configure(app: &mut App) {
    app.configure_sets(
        Update,
        (
            GameSet::Input,
            GameSet::Direct,
            GameSet::Apply,
            GameSet::Spawn,
            GameSet::Resolve,
            GameSet::Present,
        )
            .chain()
            .run_if(in_state(GameState::InGame).and(gameplay_running)),
    );
}

/// False while the pause panel is up.
pub fn gameplay_running(time: Res<Time<Virtual>>) -> bool {
    !time.is_paused()
}
