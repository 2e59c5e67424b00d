//! Waves plugin: runs the `WaveSpawner` inside the ECS.
//!
//! ```text
//! Apply:  LevelCommand (Load/Run/Stop/Rebind) -> WaveSpawner
//!         PlayerDied  -> roll back wave enemies into the pending queue
//!         PlayerRespawned -> start the replay
//!         tick(census) -> SpawnEnemy messages (placed here)
//! ```

pub mod placement;
pub mod spawner;

use bevy::prelude::*;

use crate::common::config::GameConfig;
use crate::common::rng::GameRng;
use crate::common::schedule::GameSet;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::enemies::{
    Census, EnemyKind, EnemyLifeState, InertUnderClear, PendingDespawn, SpawnEnemy, SpawnSource,
    WaveIssued,
};
use crate::plugins::level::LevelCommand;
use crate::plugins::player::{PlayerDied, PlayerRespawned};
use crate::plugins::world::{self, CurrentMap, MapFrame};

pub use spawner::{SpawnerEvent, SpawnerTuning, WaveSpawner};

pub fn plugin(app: &mut App) {
    let tuning = app
        .world()
        .get_resource::<Tunables>()
        .map(SpawnerTuning::from)
        .unwrap_or_else(|| SpawnerTuning::from(&Tunables::default()));
    app.insert_resource(WaveSpawner::new(tuning))
        .add_systems(OnEnter(GameState::InGame), reset_spawner)
        .add_systems(
            Update,
            (apply_level_commands, handle_player_lifecycle, tick_spawner)
                .chain()
                .after(world::apply_map_commands)
                .in_set(GameSet::Apply),
        );
}

fn reset_spawner(tunables: Res<Tunables>, mut spawner: ResMut<WaveSpawner>) {
    *spawner = WaveSpawner::new(SpawnerTuning::from(&*tunables));
}

fn apply_level_commands(
    mut cmds: MessageReader<LevelCommand>,
    config: Res<GameConfig>,
    map: Res<CurrentMap>,
    mut spawner: ResMut<WaveSpawner>,
) {
    for cmd in cmds.read() {
        match *cmd {
            LevelCommand::LoadWaves { level } | LevelCommand::RebindWaves { level } => {
                let waves = config.level(level).map(|l| l.waves.clone()).unwrap_or_default();
                debug!("wave data for level {level}: {} waves", waves.len());
                spawner.load_level(waves, map.anchors.clone(), map.origin);
            }
            LevelCommand::RunWaves => {
                info!("wave loop started ({} waves)", spawner.wave_count());
                spawner.run();
            }
            LevelCommand::StopWaves => {
                if spawner.is_running() {
                    info!("wave loop stopped");
                }
                spawner.stop_spawning();
            }
            _ => {}
        }
    }
}

fn handle_player_lifecycle(
    mut commands: Commands,
    mut died: MessageReader<PlayerDied>,
    mut respawned: MessageReader<PlayerRespawned>,
    mut spawner: ResMut<WaveSpawner>,
    q_wave: Query<(Entity, &EnemyKind, &EnemyLifeState), (With<WaveIssued>, Without<PendingDespawn>)>,
) {
    if died.read().count() > 0 {
        let rolled_back: Vec<_> = q_wave
            .iter()
            .filter(|(_, _, life)| life.is_alive())
            .map(|(e, kind, _)| {
                commands.entity(e).despawn();
                kind.0
            })
            .collect();
        info!("player died: rolled back {} wave enemies", rolled_back.len());
        spawner.on_player_died(rolled_back);
    }

    if respawned.read().count() > 0 {
        debug!("replaying {} pending spawns", spawner.pending_len());
        spawner.on_player_respawned();
    }
}

fn tick_spawner(
    time: Res<Time>,
    tunables: Res<Tunables>,
    config: Res<GameConfig>,
    mut rng: ResMut<GameRng>,
    mut spawner: ResMut<WaveSpawner>,
    mut spawn: MessageWriter<SpawnEnemy>,
    q_census: Query<(&EnemyLifeState, Has<InertUnderClear>), (With<WaveIssued>, Without<PendingDespawn>)>,
) {
    let census = Census::count(q_census.iter());
    let events = spawner.tick(time.delta_secs(), census);

    let frame = MapFrame {
        origin: spawner.map_offset(),
        size: tunables.map_size,
    };

    for ev in events {
        match ev {
            SpawnerEvent::WaveStarted(i) => info!("wave {} started", i + 1),
            SpawnerEvent::WaveCleared(i) => info!("wave {} cleared", i + 1),
            SpawnerEvent::AllWavesDone => info!("all waves done"),
            SpawnerEvent::Resumed => debug!("wave loop resumed"),
            SpawnerEvent::Spawn { kind, replay } => {
                let edge = config
                    .enemy(kind)
                    .is_some_and(|d| d.archetype.behaviour().edge_spawn);
                let position = if edge {
                    placement::edge_point(&frame, tunables.edge_spawn_offset, &mut rng.0)
                } else {
                    placement::anchor_point(spawner.anchors(), frame.origin, tunables.anchor_jitter, &mut rng.0)
                };
                spawn.write(SpawnEnemy {
                    kind,
                    position,
                    source: if replay {
                        SpawnSource::Replay
                    } else {
                        SpawnSource::Wave
                    },
                });
            }
        }
    }
}

#[cfg(test)]
mod tests;
