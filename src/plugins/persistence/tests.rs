use bevy::prelude::*;

use super::*;
use crate::common::test_utils::run_system_once;

fn sample() -> SaveRecord {
    SaveRecord {
        lives: 2,
        coins: 31,
        level_index: 3,
        zombie_mode: true,
        upgrades: [1, 0, 1],
        held_item: Some(HeldItemKind::Freeze),
        areas_cleared: 2,
    }
}

#[test]
fn record_mirrors_progress_and_clears_game_over() {
    let mut p = Progress::default();
    p.level_index = 3;
    p.coins = 31;
    p.game_over = true;
    let restored = SaveRecord::from(&p).into_progress();
    assert_eq!(restored.level_index, 3);
    assert_eq!(restored.coins, 31);
    assert!(!restored.game_over);
}

#[test]
fn records_without_areas_cleared_still_load() {
    let json = r#"{"lives":1,"coins":0,"level_index":2,"zombie_mode":false,"upgrades":[0,0,0],"held_item":null}"#;
    let record: SaveRecord = serde_json::from_str(json).unwrap();
    assert_eq!(record.areas_cleared, 0);
    assert_eq!(record.level_index, 2);
}

#[test]
fn json_store_round_trips_and_deletes() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonSlotStore::new(dir.path().join("saves"));

    assert_eq!(store.load(0).unwrap(), None);
    store.save(0, &sample()).unwrap();
    assert!(store.path(0).exists());
    assert_eq!(store.load(0).unwrap(), Some(sample()));
    assert_eq!(store.load(1).unwrap(), None, "slots are independent");

    store.delete(0).unwrap();
    assert_eq!(store.load(0).unwrap(), None);
    store.delete(0).unwrap();
}

#[test]
fn corrupt_slot_is_a_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonSlotStore::new(dir.path());
    std::fs::write(store.path(0), "not json").unwrap();
    assert!(matches!(store.load(0), Err(PersistenceError::Json(_))));
}

fn slot_world(store: impl SlotStore + 'static) -> World {
    let mut world = World::new();
    world.init_resource::<Messages<LevelCommand>>();
    world.init_resource::<Messages<NewGameRequested>>();
    world.insert_resource(GameConfig::default());
    world.insert_resource(Progress::default());
    world.insert_resource(SaveSlots::new(store));
    world
}

#[test]
fn restore_uses_the_slot_or_starts_fresh() {
    let mut world = slot_world(MemorySlotStore::default());
    world.resource_mut::<Progress>().coins = 99;
    run_system_once(&mut world, restore_progress);
    assert_eq!(*world.resource::<Progress>(), Progress::new(&GameConfig::default()));

    let mut store = MemorySlotStore::default();
    store.save(0, &sample()).unwrap();
    let mut world = slot_world(store);
    run_system_once(&mut world, restore_progress);
    assert_eq!(*world.resource::<Progress>(), sample().into_progress());
}

#[test]
fn unreadable_slot_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonSlotStore::new(dir.path());
    std::fs::write(store.path(0), "{").unwrap();
    let mut world = slot_world(store);
    world.resource_mut::<Progress>().level_index = 5;
    run_system_once(&mut world, restore_progress);
    assert_eq!(world.resource::<Progress>().level_index, 0);
}

#[test]
fn persist_command_writes_the_active_slot() {
    let mut world = slot_world(MemorySlotStore::default());
    world.resource_mut::<SaveSlots>().active = 2;
    world.resource_mut::<Progress>().level_index = 4;

    world.write_message(LevelCommand::OpenGate);
    run_system_once(&mut world, persist);
    assert_eq!(world.resource::<SaveSlots>().store.load(2).unwrap(), None);

    world.write_message(LevelCommand::Persist);
    run_system_once(&mut world, persist);
    let saved = world.resource::<SaveSlots>().store.load(2).unwrap().unwrap();
    assert_eq!(saved.level_index, 4);
}

#[test]
fn new_game_wipes_the_slot() {
    let mut store = MemorySlotStore::default();
    store.save(0, &sample()).unwrap();
    let mut world = slot_world(store);

    run_system_once(&mut world, wipe_on_new_game);
    assert!(world.resource::<SaveSlots>().store.load(0).unwrap().is_some());

    world.write_message(NewGameRequested);
    run_system_once(&mut world, wipe_on_new_game);
    assert_eq!(world.resource::<SaveSlots>().store.load(0).unwrap(), None);
}
