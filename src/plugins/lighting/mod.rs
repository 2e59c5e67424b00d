//! Lighting plugin (Firefly) (render-only).
//!
//! The player carries a warm light that shrinks while the screen fades between
//! levels. Bosses glow red and the exit gate shows its state in colour.

use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;
use bevy_firefly::prelude::*;

use crate::common::state::GameState;
use crate::plugins::boss::BossBrain;
use crate::plugins::hud::HudState;
use crate::plugins::player::Player;
use crate::plugins::world::ExitGate;

const PLAYER_LIGHT_RANGE: f32 = 450.0;
const GATE_CLOSED: Color = Color::srgb(0.9, 0.35, 0.2);
const GATE_OPEN: Color = Color::srgb(0.35, 1.0, 0.5);

#[derive(Component)]
pub struct PlayerLight;

/// Child light of an exit gate.
#[derive(Component)]
pub struct GateLight;

pub fn plugin(app: &mut App) {
    if !app.is_plugin_added::<FireflyPlugin>() {
        app.add_plugins(FireflyPlugin);
    }

    app.add_systems(OnEnter(GameState::InGame), setup).add_systems(
        Update,
        (follow_player_light, light_bosses, light_gates, tint_gate_lights),
    );
}

fn setup(mut commands: Commands) {
    commands.spawn((
        Name::new("PlayerLight"),
        PlayerLight,
        PointLight2d {
            color: Color::srgb(1.0, 0.9, 0.75),
            range: PLAYER_LIGHT_RANGE,
            ..default()
        },
        Transform::from_xyz(0.0, 0.0, 10.0),
        DespawnOnExit(GameState::InGame),
    ));
}

/// Fully faded out leaves a fifth of the range.
#[inline]
fn faded_range(fade: f32) -> f32 {
    PLAYER_LIGHT_RANGE * (1.0 - 0.8 * fade.clamp(0.0, 1.0))
}

fn follow_player_light(
    hud: Res<HudState>,
    q_player: Query<&Transform, (With<Player>, Without<PlayerLight>)>,
    mut q_light: Query<(&mut Transform, &mut PointLight2d), (With<PlayerLight>, Without<Player>)>,
) {
    let Ok(tf_player) = q_player.single() else {
        return;
    };
    let Ok((mut tf_light, mut light)) = q_light.single_mut() else {
        return;
    };

    tf_light.translation.x = tf_player.translation.x;
    tf_light.translation.y = tf_player.translation.y;
    light.range = faded_range(hud.fade);
}

/// The light is a child, so it dies with the boss.
fn light_bosses(mut commands: Commands, q_new: Query<Entity, Added<BossBrain>>) {
    for boss in &q_new {
        commands.entity(boss).with_child((
            Name::new("BossLight"),
            PointLight2d {
                color: Color::srgb(1.0, 0.3, 0.25),
                range: 260.0,
                ..default()
            },
            Transform::from_xyz(0.0, 0.0, 10.0),
        ));
    }
}

fn light_gates(mut commands: Commands, q_new: Query<(Entity, &ExitGate), Added<ExitGate>>) {
    for (gate, state) in &q_new {
        commands.entity(gate).with_child((
            Name::new("GateLight"),
            GateLight,
            PointLight2d {
                color: gate_color(state.open),
                range: 160.0,
                ..default()
            },
            Transform::from_xyz(0.0, 0.0, 10.0),
        ));
    }
}

#[inline]
fn gate_color(open: bool) -> Color {
    if open { GATE_OPEN } else { GATE_CLOSED }
}

fn tint_gate_lights(
    q_gates: Query<(&ExitGate, &Children), Changed<ExitGate>>,
    mut q_lights: Query<&mut PointLight2d, With<GateLight>>,
) {
    for (gate, children) in &q_gates {
        for child in children.iter() {
            if let Ok(mut light) = q_lights.get_mut(child) {
                light.color = gate_color(gate.open);
            }
        }
    }
}
