//! Player plugin.
//!
//! Pipeline:
//! - Update/Input: sample keyboard into `PlayerIntents` (skipped headless; tests write intents)
//! - Update/Resolve: apply `KillPlayer` requests, tick modes and the respawn countdown
//! - FixedUpdate: apply velocity to the kinematic body, clamp to `PlayerBounds`
//!
//! Who dies on contact is decided by the player's `PlayerMode`, never by the enemy:
//! see `enemies::contact_outcome`.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::{
    layers::Layer, schedule::GameSet, sequence::Countdown, state::GameState, tunables::Tunables,
};
use crate::plugins::hud::{HudCommand, Panel};
use crate::plugins::world::{ScriptedMove, WorldAnchored};

#[derive(Component)]
pub struct Player;

/// Fire directions, in `PlayerIntents::fire` order.
pub const FIRE_DIRS: [Vec2; 4] = [Vec2::Y, Vec2::NEG_Y, Vec2::NEG_X, Vec2::X];

/// Polled per-frame input. Edge triggers (`use_item`, `pause`) are cleared by their consumer.
#[derive(Resource, Default, Debug, Clone, PartialEq)]
pub struct PlayerIntents {
    pub move_axis: Vec2,
    /// Up, down, left, right.
    pub fire: [bool; 4],
    pub use_item: bool,
    pub pause: bool,
}

impl PlayerIntents {
    pub fn any(&self) -> bool {
        self.move_axis != Vec2::ZERO || self.fire.iter().any(|f| *f) || self.use_item
    }

    /// Sum of the pressed fire directions, normalized.
    pub fn fire_dir(&self) -> Option<Vec2> {
        let dir: Vec2 = FIRE_DIRS
            .iter()
            .zip(self.fire)
            .filter(|(_, pressed)| *pressed)
            .map(|(d, _)| *d)
            .sum();
        dir.try_normalize()
    }
}

/// Set while a cutscene or boss intro owns the player.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputLock(pub bool);

/// Movement rectangle in world space.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct PlayerBounds(pub Rect);

impl Default for PlayerBounds {
    fn default() -> Self {
        Self(Rect::from_center_size(Vec2::ZERO, Tunables::default().map_size))
    }
}

#[derive(Resource, Default, Debug, Clone, Copy, PartialEq)]
pub struct RespawnPoint(pub Vec2);

/// Timed player-side flags.
#[derive(Component, Default, Debug, Clone, Copy)]
pub struct PlayerMode {
    pub invincible: Countdown,
    /// Counter ("zombie") mode: contact hurts the enemy instead.
    pub counter: Countdown,
}

impl PlayerMode {
    #[inline]
    pub fn is_invincible(&self) -> bool {
        self.invincible.is_positive()
    }
    #[inline]
    pub fn is_counter(&self) -> bool {
        self.counter.is_positive()
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub enum PlayerLife {
    Alive,
    Dead { respawn_in: Countdown },
}

impl PlayerLife {
    #[inline]
    pub fn is_alive(&self) -> bool {
        matches!(self, Self::Alive)
    }
}

/// Stats derived from upgrade levels.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Loadout {
    pub fire_cooldown: f32,
    pub speed_mult: f32,
    pub damage: i32,
}

impl Loadout {
    pub const BASE_FIRE_COOLDOWN: f32 = 0.3;
}

impl Default for Loadout {
    fn default() -> Self {
        Self {
            fire_cooldown: Self::BASE_FIRE_COOLDOWN,
            speed_mult: 1.0,
            damage: 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KillCause {
    Contact,
    Bullet,
}

/// Request to kill the player. Resolved once per frame; extra requests are no-ops.
#[derive(Message, Clone, Copy, Debug)]
pub struct KillPlayer {
    pub cause: KillCause,
}

#[derive(Message, Clone, Copy, Debug)]
pub struct PlayerDied {
    pub position: Vec2,
}

#[derive(Message, Clone, Copy, Debug)]
pub struct PlayerRespawned;

pub fn plugin(app: &mut App) {
    app.init_resource::<PlayerIntents>()
        .init_resource::<InputLock>()
        .init_resource::<PlayerBounds>()
        .init_resource::<RespawnPoint>()
        .init_resource::<Loadout>()
        .add_message::<KillPlayer>()
        .add_message::<PlayerDied>()
        .add_message::<PlayerRespawned>()
        .add_systems(OnEnter(GameState::InGame), (reset_session, spawn).chain())
        .add_systems(
            Update,
            (gather_input, toggle_pause)
                .chain()
                .before(GameSet::Input)
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            Update,
            (resolve_kills, tick_modes, tick_respawn).chain().in_set(GameSet::Resolve),
        )
        .add_systems(FixedUpdate, (apply_movement, clamp_to_bounds).chain());
}

fn reset_session(mut lock: ResMut<InputLock>, mut intents: ResMut<PlayerIntents>) {
    lock.0 = false;
    *intents = PlayerIntents::default();
}

fn spawn(mut commands: Commands, respawn: Option<Res<RespawnPoint>>) {
    let layers = CollisionLayers::new(
        Layer::Player,
        [
            Layer::World,
            Layer::Enemy,
            Layer::EnemyBullet,
            Layer::Pickup,
            Layer::Gate,
        ],
    );
    let at = respawn.map(|r| r.0).unwrap_or_default();

    commands.spawn((
        Name::new("Player"),
        Player,
        PlayerLife::Alive,
        PlayerMode::default(),
        WorldAnchored,
        Sprite {
            color: Color::srgb(0.2, 0.75, 0.9),
            custom_size: Some(Vec2::splat(26.0)),
            ..default()
        },
        Transform::from_translation(at.extend(1.0)),
        RigidBody::Kinematic,
        Collider::circle(13.0),
        layers,
        CollisionEventsEnabled,
        LinearVelocity::ZERO,
        DespawnOnExit(GameState::InGame),
    ));
}

pub fn gather_input(keys: Option<Res<ButtonInput<KeyCode>>>, mut input: ResMut<PlayerIntents>) {
    let Some(keys) = keys else {
        return;
    };

    let mut axis = Vec2::ZERO;
    if keys.pressed(KeyCode::KeyW) {
        axis.y += 1.0;
    }
    if keys.pressed(KeyCode::KeyS) {
        axis.y -= 1.0;
    }
    if keys.pressed(KeyCode::KeyA) {
        axis.x -= 1.0;
    }
    if keys.pressed(KeyCode::KeyD) {
        axis.x += 1.0;
    }
    input.move_axis = axis.normalize_or_zero();

    input.fire = [
        keys.pressed(KeyCode::ArrowUp),
        keys.pressed(KeyCode::ArrowDown),
        keys.pressed(KeyCode::ArrowLeft),
        keys.pressed(KeyCode::ArrowRight),
    ];
    input.use_item |= keys.just_pressed(KeyCode::Space);
    input.pause |= keys.just_pressed(KeyCode::Escape);
}

/// Runs outside the gameplay sets, which are stopped while paused.
fn toggle_pause(
    mut intents: ResMut<PlayerIntents>,
    mut time: ResMut<Time<Virtual>>,
    mut hud: MessageWriter<HudCommand>,
) {
    if !std::mem::take(&mut intents.pause) {
        return;
    }
    let paused = !time.is_paused();
    if paused {
        time.pause();
    } else {
        time.unpause();
    }
    debug!("pause toggled: {paused}");
    hud.write(HudCommand::Panel {
        panel: Panel::Pause,
        visible: paused,
    });
}

fn apply_movement(
    tunables: Res<Tunables>,
    input: Res<PlayerIntents>,
    lock: Res<InputLock>,
    loadout: Res<Loadout>,
    scripted: Option<Res<ScriptedMove>>,
    mut q_player: Query<(&mut LinearVelocity, &PlayerLife), With<Player>>,
) {
    let Ok((mut vel, life)) = q_player.single_mut() else {
        return;
    };
    let steered = !lock.0 && life.is_alive() && scripted.is_none();
    vel.0 = if steered {
        input.move_axis * tunables.player_speed * loadout.speed_mult
    } else {
        Vec2::ZERO
    };
}

fn clamp_to_bounds(
    bounds: Res<PlayerBounds>,
    scripted: Option<Res<ScriptedMove>>,
    mut q_player: Query<&mut Transform, With<Player>>,
) {
    if scripted.is_some() {
        return;
    }
    let Ok(mut tf) = q_player.single_mut() else {
        return;
    };
    let p = tf.translation.truncate().clamp(bounds.0.min, bounds.0.max);
    tf.translation.x = p.x;
    tf.translation.y = p.y;
}

/// Apply kill requests. Only a living, non-invincible player dies; the first request wins.
fn resolve_kills(
    tunables: Res<Tunables>,
    mut kills: MessageReader<KillPlayer>,
    mut died: MessageWriter<PlayerDied>,
    mut q_player: Query<(&Transform, &mut PlayerLife, &PlayerMode, &mut Visibility), With<Player>>,
) {
    let Ok((tf, mut life, mode, mut vis)) = q_player.single_mut() else {
        kills.clear();
        return;
    };

    for kill in kills.read() {
        if !life.is_alive() || mode.is_invincible() {
            continue;
        }
        info!("player killed ({:?})", kill.cause);
        *life = PlayerLife::Dead {
            respawn_in: Countdown::new(tunables.respawn_delay),
        };
        *vis = Visibility::Hidden;
        died.write(PlayerDied {
            position: tf.translation.truncate(),
        });
    }
}

fn tick_modes(time: Res<Time>, mut q_player: Query<&mut PlayerMode, With<Player>>) {
    let dt = time.delta_secs();
    for mut mode in &mut q_player {
        mode.invincible.tick_down(dt);
        mode.counter.tick_down(dt);
    }
}

fn tick_respawn(
    time: Res<Time>,
    tunables: Res<Tunables>,
    respawn: Res<RespawnPoint>,
    mut respawned: MessageWriter<PlayerRespawned>,
    mut q_player: Query<(&mut Transform, &mut PlayerLife, &mut PlayerMode, &mut Visibility), With<Player>>,
) {
    let Ok((mut tf, mut life, mut mode, mut vis)) = q_player.single_mut() else {
        return;
    };
    let PlayerLife::Dead { respawn_in } = &mut *life else {
        return;
    };

    respawn_in.tick_down(time.delta_secs());
    if !respawn_in.expired() {
        return;
    }

    *life = PlayerLife::Alive;
    *vis = Visibility::Inherited;
    tf.translation.x = respawn.0.x;
    tf.translation.y = respawn.0.y;
    mode.invincible.set_max(tunables.invincibility_secs);
    debug!("player respawned at {:?}", respawn.0);
    respawned.write(PlayerRespawned);
}
