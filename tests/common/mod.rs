//! Integration test harness.
//!
//! Keep integration tests headless:
//! - `MinimalPlugins` provides the core ECS runtime.
//! - `AssetPlugin` + `ScenePlugin` so `SceneSpawner` exists.
//! - `arena_shooter::game::configure_headless` installs the gameplay plugins.
//!
//! Time advances by a fixed step per `update()`, so simulated seconds are exact.

#![allow(dead_code)]

use std::time::Duration;

use arena_shooter::common::config::GameConfig;
use arena_shooter::common::rng::GameRng;
use arena_shooter::common::state::GameState;
use arena_shooter::common::tunables::Tunables;
use arena_shooter::plugins::level::{LevelDirector, LevelPhase, Progress};
use arena_shooter::plugins::persistence::{MemorySlotStore, SaveRecord, SaveSlots, SlotStore};
use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

pub const DT: f32 = 1.0 / 30.0;

pub fn app_headless() -> App {
    app_with(GameConfig::default(), None)
}

/// Headless app with `config`, a seeded generator and an in-memory slot that
/// optionally already holds `saved`.
pub fn app_with(config: GameConfig, saved: Option<SaveRecord>) -> App {
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins,
        StatesPlugin,
        AssetPlugin::default(),
        ScenePlugin,
    ));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(DT)));
    app.insert_resource(config);
    app.insert_resource(GameRng::seeded(11));

    let mut store = MemorySlotStore::default();
    if let Some(record) = saved {
        store.save(0, &record).expect("memory store never fails");
    }
    app.insert_resource(SaveSlots::new(store));

    arena_shooter::game::configure_headless(&mut app);
    // `update()` skips the plugin lifecycle that `run()` performs.
    app.finish();
    app.cleanup();

    // Short transitions keep the runs small.
    let mut tunables = app.world_mut().resource_mut::<Tunables>();
    tunables.transition_secs = 0.3;
    tunables.settle_secs = 0.2;
    app
}

/// Run `update()` for about `secs` of game time.
pub fn run_for(app: &mut App, secs: f32) {
    let frames = (secs / DT).ceil() as usize;
    for _ in 0..frames {
        app.update();
    }
}

/// Call `each` before every frame and stop once `done` holds. Panics after `max_secs`.
pub fn run_until(
    app: &mut App,
    max_secs: f32,
    mut each: impl FnMut(&mut World),
    mut done: impl FnMut(&mut World) -> bool,
) {
    let frames = (max_secs / DT).ceil() as usize;
    for _ in 0..frames {
        each(app.world_mut());
        app.update();
        if done(app.world_mut()) {
            return;
        }
    }
    panic!(
        "condition not reached within {max_secs}s (phase {:?}, level {})",
        phase(app.world()),
        app.world().resource::<Progress>().level_index
    );
}

pub fn phase(world: &World) -> LevelPhase {
    world.resource::<LevelDirector>().phase()
}

pub fn state(world: &World) -> GameState {
    *world.resource::<State<GameState>>().get()
}

pub fn saved(world: &World) -> Option<SaveRecord> {
    let slots = world.resource::<SaveSlots>();
    slots.store.load(slots.active).expect("memory store never fails")
}

pub fn record(level_index: usize, lives: u32) -> SaveRecord {
    SaveRecord {
        lives,
        coins: 0,
        level_index,
        zombie_mode: false,
        upgrades: [0; 3],
        held_item: None,
        areas_cleared: level_index as u32,
    }
}
