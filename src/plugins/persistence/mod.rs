//! Save slots.
//!
//! The run is stored as a flat `SaveRecord` behind the `SlotStore` trait. The
//! game uses `JsonSlotStore` (one JSON file per slot); tests and headless apps
//! fall back to `MemorySlotStore`.
//!
//! ```text
//! OnEnter(InGame):   restore_progress   slot -> Progress (fresh run when empty)
//! Apply:             persist            LevelCommand::Persist -> slot
//! GameOver:          wipe_on_new_game   NewGameRequested -> delete slot
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::common::config::{GameConfig, HeldItemKind};
use crate::common::schedule::GameSet;
use crate::common::state::GameState;
use crate::plugins::level::{LevelCommand, NewGameRequested, Progress};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("save slot i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("save slot is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// What survives between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRecord {
    pub lives: u32,
    pub coins: u32,
    pub level_index: usize,
    pub zombie_mode: bool,
    pub upgrades: [u8; 3],
    pub held_item: Option<HeldItemKind>,
    #[serde(default)]
    pub areas_cleared: u32,
}

impl From<&Progress> for SaveRecord {
    fn from(p: &Progress) -> Self {
        Self {
            lives: p.lives,
            coins: p.coins,
            level_index: p.level_index,
            zombie_mode: p.zombie_mode,
            upgrades: p.upgrades,
            held_item: p.held_item,
            areas_cleared: p.areas_cleared,
        }
    }
}

impl SaveRecord {
    pub fn into_progress(self) -> Progress {
        Progress {
            level_index: self.level_index,
            lives: self.lives,
            coins: self.coins,
            areas_cleared: self.areas_cleared,
            upgrades: self.upgrades,
            held_item: self.held_item,
            zombie_mode: self.zombie_mode,
            game_over: false,
        }
    }
}

pub trait SlotStore: Send + Sync {
    fn save(&mut self, slot: u8, record: &SaveRecord) -> Result<(), PersistenceError>;
    /// `Ok(None)` for an empty slot.
    fn load(&self, slot: u8) -> Result<Option<SaveRecord>, PersistenceError>;
    /// Deleting an empty slot is not an error.
    fn delete(&mut self, slot: u8) -> Result<(), PersistenceError>;
}

#[derive(Debug, Default)]
pub struct MemorySlotStore {
    slots: HashMap<u8, SaveRecord>,
}

impl SlotStore for MemorySlotStore {
    fn save(&mut self, slot: u8, record: &SaveRecord) -> Result<(), PersistenceError> {
        self.slots.insert(slot, record.clone());
        Ok(())
    }

    fn load(&self, slot: u8) -> Result<Option<SaveRecord>, PersistenceError> {
        Ok(self.slots.get(&slot).cloned())
    }

    fn delete(&mut self, slot: u8) -> Result<(), PersistenceError> {
        self.slots.remove(&slot);
        Ok(())
    }
}

/// `slot_<n>.json` files under one directory.
#[derive(Debug, Clone)]
pub struct JsonSlotStore {
    dir: PathBuf,
}

impl JsonSlotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, slot: u8) -> PathBuf {
        self.dir.join(format!("slot_{slot}.json"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SlotStore for JsonSlotStore {
    fn save(&mut self, slot: u8, record: &SaveRecord) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(record)?;
        fs::write(self.path(slot), json)?;
        Ok(())
    }

    fn load(&self, slot: u8) -> Result<Option<SaveRecord>, PersistenceError> {
        match fs::read_to_string(self.path(slot)) {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&mut self, slot: u8) -> Result<(), PersistenceError> {
        match fs::remove_file(self.path(slot)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Resource)]
pub struct SaveSlots {
    pub store: Box<dyn SlotStore>,
    pub active: u8,
}

impl SaveSlots {
    pub fn new(store: impl SlotStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            active: 0,
        }
    }
}

impl Default for SaveSlots {
    fn default() -> Self {
        Self::new(MemorySlotStore::default())
    }
}

pub fn plugin(app: &mut App) {
    if !app.world().contains_resource::<SaveSlots>() {
        app.init_resource::<SaveSlots>();
    }
    app.add_systems(OnEnter(GameState::InGame), restore_progress)
        .add_systems(Update, persist.in_set(GameSet::Apply))
        .add_systems(Update, wipe_on_new_game.run_if(in_state(GameState::GameOver)));
}

fn restore_progress(config: Res<GameConfig>, slots: Res<SaveSlots>, mut progress: ResMut<Progress>) {
    let restored = match slots.store.load(slots.active) {
        Ok(Some(record)) => {
            info!("loaded slot {} at level {}", slots.active, record.level_index);
            record.into_progress()
        }
        Ok(None) => {
            debug!("slot {} is empty, starting fresh", slots.active);
            Progress::new(&config)
        }
        Err(e) => {
            warn!("could not load slot {}: {e}", slots.active);
            Progress::new(&config)
        }
    };
    *progress = restored;
}

fn persist(mut cmds: MessageReader<LevelCommand>, progress: Res<Progress>, mut slots: ResMut<SaveSlots>) {
    for cmd in cmds.read() {
        if *cmd != LevelCommand::Persist {
            continue;
        }
        let record = SaveRecord::from(&*progress);
        let slot = slots.active;
        match slots.store.save(slot, &record) {
            Ok(()) => info!("saved slot {slot} at level {}", record.level_index),
            Err(e) => warn!("could not save slot {slot}: {e}"),
        }
    }
}

fn wipe_on_new_game(mut requests: MessageReader<NewGameRequested>, mut slots: ResMut<SaveSlots>) {
    if requests.read().count() == 0 {
        return;
    }
    let slot = slots.active;
    match slots.store.delete(slot) {
        Ok(()) => info!("slot {slot} cleared for a new game"),
        Err(e) => warn!("could not clear slot {slot}: {e}"),
    }
}

#[cfg(test)]
mod tests;
