//! Game composition root.
//!
//! - `configure_full`: DefaultPlugins (window/render), the catalog from disk, JSON save slots.
//! - `configure_headless`: gameplay plugins only, built-in catalog, in-memory slots.

use std::fs;
use std::path::Path;

use bevy::prelude::*;
use bevy::window::WindowResolution;

use crate::common::config::GameConfig;
use crate::common::state::GameState;
use crate::plugins;
use crate::plugins::persistence::{JsonSlotStore, SaveSlots};

#[cfg(target_os = "windows")]
use bevy::render::{
    RenderPlugin,
    settings::{Backends, PowerPreference, WgpuSettings},
};

pub const CONFIG_PATH: &str = "assets/game.ron";
pub const SAVE_DIR: &str = "saves";

pub fn run() {
    App::new().add_plugins(configure_full).run();
}

/// Full configuration for `cargo run`.
pub fn configure_full(app: &mut App) {
    let default_plugins = DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Arena Shooter".into(),
            resolution: WindowResolution::new(1280, 720),
            ..default()
        }),
        ..default()
    });

    // Vulkan is unreliable on some Windows drivers; force DX12 there.
    #[cfg(target_os = "windows")]
    let default_plugins = default_plugins.set(RenderPlugin {
        render_creation: WgpuSettings {
            backends: Some(Backends::DX12),
            power_preference: PowerPreference::HighPerformance,
            ..default()
        }
        .into(),
        ..default()
    });

    app.add_plugins(default_plugins);
    app.insert_resource(load_config(Path::new(CONFIG_PATH)));
    app.insert_resource(SaveSlots::new(JsonSlotStore::new(SAVE_DIR)));

    configure_game(app);
    plugins::register_render(app);
}

/// Headless configuration for integration tests.
///
/// - Do NOT add DefaultPlugins.
/// - Do NOT add render-only plugins (Firefly/camera).
pub fn configure_headless(app: &mut App) {
    configure_game(app);
}

/// Configuration shared by both full and headless apps.
fn configure_game(app: &mut App) {
    app.init_state::<GameState>();
    plugins::register_gameplay(app);
}

/// The catalog at `path`, or the built-in one when the file is missing or invalid.
pub fn load_config(path: &Path) -> GameConfig {
    let src = match fs::read_to_string(path) {
        Ok(src) => src,
        Err(e) => {
            info!("no catalog at {} ({e}), using the built-in one", path.display());
            return GameConfig::default();
        }
    };
    match GameConfig::from_ron_str(&src) {
        Ok(config) => {
            info!("loaded catalog from {} ({} levels)", path.display(), config.levels.len());
            config
        }
        Err(e) => {
            warn!("rejected catalog {}: {e}", path.display());
            GameConfig::default()
        }
    }
}
