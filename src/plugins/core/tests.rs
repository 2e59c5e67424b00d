use bevy::prelude::*;
use rand::Rng;

use crate::common::config::GameConfig;
use crate::common::rng::GameRng;
use crate::common::tunables::Tunables;
use crate::plugins::core;

#[test]
fn inserts_resources() {
    let mut app = App::new();
    core::plugin(&mut app);
    assert!(app.world().get_resource::<Tunables>().is_some());
    assert!(app.world().get_resource::<ClearColor>().is_some());
    assert!(app.world().get_resource::<GameConfig>().is_some());
    assert!(app.world().get_resource::<GameRng>().is_some());
}

#[test]
fn keeps_a_provided_catalog_and_seed() {
    let mut config = GameConfig::default();
    config.starting_lives = 9;

    let mut app = App::new();
    app.insert_resource(config);
    app.insert_resource(GameRng::seeded(5));
    core::plugin(&mut app);

    assert_eq!(app.world().resource::<GameConfig>().starting_lives, 9);
    let rolled: u32 = app.world_mut().resource_mut::<GameRng>().0.r#gen();
    let expected: u32 = GameRng::seeded(5).0.r#gen();
    assert_eq!(rolled, expected);
}
