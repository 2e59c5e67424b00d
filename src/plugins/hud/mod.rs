//! Presentation contract.
//!
//! The core never reads widgets. It writes `HudCommand` / `AudioCue` messages and
//! a single folding system keeps `HudState` as the last value of every channel.
//! Render-side widgets (and the headless tests) read `HudState`.

use bevy::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Panel {
    Tutorial,
    Shop,
    Pause,
    GameOver,
}

#[derive(Message, Clone, Debug, PartialEq)]
pub enum HudCommand {
    /// Boss health bar, normalised.
    HealthBar { fraction: f32 },
    TimerBar { fraction: f32, color: Color },
    /// One flag per level: cleared or not.
    AreaIndicators(Vec<bool>),
    BossDisplay { name: String, visible: bool },
    Lives(u32),
    Coins(u32),
    /// Full-screen black overlay alpha.
    Fade(f32),
    Panel { panel: Panel, visible: bool },
}

#[derive(Message, Clone, Debug, PartialEq, Eq)]
pub enum AudioCue {
    Music(String),
    StopMusic,
    Footstep,
    BossDeathBeat,
    Pickup,
    GateOpen,
}

pub const TIMER_NORMAL: Color = Color::srgb(0.35, 0.85, 0.4);
pub const TIMER_CRITICAL: Color = Color::srgb(0.95, 0.25, 0.2);

#[derive(Resource, Debug, Default, Clone)]
pub struct HudState {
    pub health: Option<f32>,
    pub timer: Option<(f32, Color)>,
    pub areas: Vec<bool>,
    pub boss_name: Option<String>,
    pub lives: u32,
    pub coins: u32,
    pub fade: f32,
    pub panels: Vec<Panel>,
    pub music: Option<String>,
    pub footsteps: u32,
}

impl HudState {
    pub fn apply(&mut self, cmd: &HudCommand) {
        match cmd {
            HudCommand::HealthBar { fraction } => self.health = Some(fraction.clamp(0.0, 1.0)),
            HudCommand::TimerBar { fraction, color } => {
                self.timer = Some((fraction.clamp(0.0, 1.0), *color))
            }
            HudCommand::AreaIndicators(flags) => self.areas.clone_from(flags),
            HudCommand::BossDisplay { name, visible } => {
                self.boss_name = visible.then(|| name.clone());
                if !visible {
                    self.health = None;
                }
            }
            HudCommand::Lives(n) => self.lives = *n,
            HudCommand::Coins(n) => self.coins = *n,
            HudCommand::Fade(a) => self.fade = a.clamp(0.0, 1.0),
            HudCommand::Panel { panel, visible } => {
                self.panels.retain(|p| p != panel);
                if *visible {
                    self.panels.push(*panel);
                }
            }
        }
    }

    pub fn hear(&mut self, cue: &AudioCue) {
        match cue {
            AudioCue::Music(track) => self.music = Some(track.clone()),
            AudioCue::StopMusic => self.music = None,
            AudioCue::Footstep => self.footsteps += 1,
            AudioCue::BossDeathBeat | AudioCue::Pickup | AudioCue::GateOpen => {}
        }
    }

    #[inline]
    pub fn shows(&self, panel: Panel) -> bool {
        self.panels.contains(&panel)
    }
}

/// Timer colour for a remaining-time fraction.
#[inline]
pub fn timer_color(fraction: f32, critical_below: f32) -> Color {
    if fraction < critical_below {
        TIMER_CRITICAL
    } else {
        TIMER_NORMAL
    }
}

pub fn plugin(app: &mut App) {
    app.add_message::<HudCommand>()
        .add_message::<AudioCue>()
        .init_resource::<HudState>()
        // Folding also runs on the game-over screen.
        .add_systems(PostUpdate, fold_presentation);
}

fn fold_presentation(
    mut hud: ResMut<HudState>,
    mut commands: MessageReader<HudCommand>,
    mut cues: MessageReader<AudioCue>,
) {
    for cmd in commands.read() {
        hud.apply(cmd);
    }
    for cue in cues.read() {
        hud.hear(cue);
    }
}

#[cfg(test)]
mod tests;
