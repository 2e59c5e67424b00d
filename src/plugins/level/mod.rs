//! Level plugin: the director and the commands it issues.
//!
//! ```text
//! Direct:   drive_director            census + lifecycle messages -> LevelCommand
//! Apply:    apply_director_commands   input lock, HUD, audio, game over
//! Present:  mirror_progress           lives / coins / area indicators
//! GameOver: await_retry               R or RetryRequested -> back in game
//! ```
//!
//! Every other `LevelCommand` has its own consumer in the plugin that owns the
//! concern (world, waves, enemies, encounter, loot, persistence).

pub mod director;
pub mod progress;

use bevy::prelude::*;

use crate::common::config::GameConfig;
use crate::common::rng::GameRng;
use crate::common::schedule::GameSet;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::enemies::{Census, Critter, Enemy, EnemyLifeState, Health, InertUnderClear, PendingDespawn};
use crate::plugins::hud::{AudioCue, HudCommand, Panel};
use crate::plugins::player::{InputLock, Player, PlayerDied, PlayerIntents, PlayerLife};
use crate::plugins::waves::WaveSpawner;
use crate::plugins::world::{CurrentMap, ExitReached};

pub use director::{DirectorFrame, GameplayMode, LevelDirector, LevelPhase};
pub use progress::Progress;

pub const GAME_OVER_MUSIC: &str = "game_over";

/// One instruction from the director, applied by whichever plugin owns it.
#[derive(Message, Clone, Debug, PartialEq)]
pub enum LevelCommand {
    BuildMap { level: usize, origin: Vec2 },
    /// Rebind bounds and respawn point to the current map; optionally move the player there.
    PlacePlayer { teleport: bool },
    LoadWaves { level: usize },
    RunWaves,
    StopWaves,
    /// Point the spawner at the re-rooted map without restarting it.
    RebindWaves { level: usize },
    ActivateEncounter,
    WeakenInert,
    OpenGate,
    SpawnShop,
    SpawnCritter,
    StartScriptedMove { to: Vec2, secs: f32 },
    DestroyOldMap,
    ReRootWorld { shift: Vec2 },
    LockInput(bool),
    Persist,
    GameOver,
    Hud(HudCommand),
    Audio(AudioCue),
}

/// Written when a boss's post-victory sequence is done.
#[derive(Message, Clone, Copy, Debug)]
pub struct RequestTransition;

/// Leave the game-over screen and replay from the last save.
#[derive(Message, Clone, Copy, Debug)]
pub struct RetryRequested;

/// Leave the game-over screen with a wiped slot.
#[derive(Message, Clone, Copy, Debug)]
pub struct NewGameRequested;

pub fn plugin(app: &mut App) {
    app.add_message::<LevelCommand>()
        .add_message::<RequestTransition>()
        .add_message::<RetryRequested>()
        .add_message::<NewGameRequested>()
        .init_resource::<LevelDirector>()
        .init_resource::<Progress>()
        .add_systems(OnEnter(GameState::InGame), reset_director)
        .add_systems(Update, drive_director.in_set(GameSet::Direct))
        .add_systems(Update, apply_director_commands.in_set(GameSet::Apply))
        .add_systems(Update, mirror_progress.in_set(GameSet::Present))
        .add_systems(Update, await_retry.run_if(in_state(GameState::GameOver)));
}

fn reset_director(mut director: ResMut<LevelDirector>, mut time: ResMut<Time<Virtual>>) {
    director.reset();
    time.unpause();
}

#[allow(clippy::too_many_arguments)]
fn drive_director(
    time: Res<Time>,
    config: Res<GameConfig>,
    tunables: Res<Tunables>,
    map: Res<CurrentMap>,
    spawner: Res<WaveSpawner>,
    intents: Res<PlayerIntents>,
    mut rng: ResMut<GameRng>,
    mut progress: ResMut<Progress>,
    mut director: ResMut<LevelDirector>,
    mut exits: MessageReader<ExitReached>,
    mut transitions: MessageReader<RequestTransition>,
    mut deaths: MessageReader<PlayerDied>,
    q_player: Query<&PlayerLife, With<Player>>,
    q_enemies: Query<
        (&EnemyLifeState, Has<InertUnderClear>),
        (With<Enemy>, With<Health>, Without<Critter>, Without<PendingDespawn>),
    >,
    mut out: MessageWriter<LevelCommand>,
) {
    let frame = DirectorFrame {
        dt: time.delta_secs(),
        player_alive: q_player.single().is_ok_and(|life| life.is_alive()),
        player_died: deaths.read().count() > 0,
        any_input: intents.any(),
        census: Census::count(q_enemies.iter()),
        spawner_holds_open: spawner.holds_level_open(),
        boss_level: map.encounter.is_some(),
        exit_reached: exits.read().count() > 0,
        transition_requested: transitions.read().count() > 0,
    };

    let mut next = progress.clone();
    let cmds = director.tick(&frame, &config, &tunables, &mut next, &mut rng.0);
    progress.set_if_neq(next);
    out.write_batch(cmds);
}

fn apply_director_commands(
    mut cmds: MessageReader<LevelCommand>,
    mut lock: ResMut<InputLock>,
    mut next_state: ResMut<NextState<GameState>>,
    mut hud: MessageWriter<HudCommand>,
    mut audio: MessageWriter<AudioCue>,
) {
    for cmd in cmds.read() {
        match cmd {
            LevelCommand::LockInput(on) => lock.0 = *on,
            LevelCommand::Hud(h) => {
                hud.write(h.clone());
            }
            LevelCommand::Audio(a) => {
                audio.write(a.clone());
            }
            LevelCommand::GameOver => {
                lock.0 = true;
                audio.write(AudioCue::Music(GAME_OVER_MUSIC.into()));
                hud.write(HudCommand::Panel {
                    panel: Panel::GameOver,
                    visible: true,
                });
                next_state.set(GameState::GameOver);
            }
            _ => {}
        }
    }
}

fn mirror_progress(config: Res<GameConfig>, progress: Res<Progress>, mut hud: MessageWriter<HudCommand>) {
    if !progress.is_changed() {
        return;
    }
    hud.write(HudCommand::Lives(progress.lives));
    hud.write(HudCommand::Coins(progress.coins));
    let areas = (0..config.levels.len())
        .map(|i| i < progress.areas_cleared as usize)
        .collect();
    hud.write(HudCommand::AreaIndicators(areas));
}

/// Leaving `GameOver` re-enters `InGame`, whose `OnEnter` reloads the slot.
fn await_retry(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mut retry: MessageReader<RetryRequested>,
    mut new_game: MessageReader<NewGameRequested>,
    mut next_state: ResMut<NextState<GameState>>,
    mut hud: MessageWriter<HudCommand>,
) {
    let pressed = keys.is_some_and(|k| k.just_pressed(KeyCode::KeyR));
    let requested = retry.read().count() > 0;
    let fresh = new_game.read().count() > 0;
    if !(pressed || requested || fresh) {
        return;
    }
    info!("{}", if fresh { "new game" } else { "retry" });
    hud.write(HudCommand::Panel {
        panel: Panel::GameOver,
        visible: false,
    });
    next_state.set(GameState::InGame);
}
