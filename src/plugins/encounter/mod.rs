//! Encounter plugin: one boss fight per boss level.
//!
//! ```text
//! Apply:    LevelCommand::ActivateEncounter -> find boss, rebind arena, start fight
//! Direct:   watch_encounters   mirror boss health, run victory once
//!           run_cutscenes      post-victory script -> RequestTransition
//! Resolve:  VictoryLootCollected -> start the post-victory script
//! ```
//!
//! The encounter never listens for the boss entity going away. Victory is read
//! off the brain's health, which stays at zero for the whole death sequence.

use bevy::prelude::*;

use crate::common::config::{BossProfile, VictoryVariant};
use crate::common::schedule::GameSet;
use crate::common::sequence::Sequence;
use crate::plugins::boss::{self, BossBrain, BossSignal};
use crate::plugins::hud::{AudioCue, HudCommand};
use crate::plugins::level::{LevelCommand, Progress, RequestTransition};
use crate::plugins::loot::{self, VictoryLootCollected};
use crate::plugins::player::{InputLock, Player, PlayerBounds, RespawnPoint};
use crate::plugins::world::{self, CurrentMap, MapLayout, MapPart};

/// Victory pose before the variant body starts.
pub const POSE_SECS: f32 = 1.2;
/// Fade-to-black duration.
pub const FADE_SECS: f32 = 1.5;

const WALK_SPEED: f32 = 90.0;
const WALK_STRIDE: f32 = 28.0;
const PURSUER_OFFSET: Vec2 = Vec2::new(-22.0, -10.0);

/// Boss arena, relative to the map center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub bounds: Rect,
    pub respawn_point: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutsceneBeat {
    LockInput,
    StartPose,
    SpawnPursuer,
    BeginWalk,
    BeginFade,
    ReleaseInput,
    HandOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutsceneGate {
    WalkFinished,
    FadeFinished,
}

pub type Cutscene = Sequence<CutsceneBeat, CutsceneGate>;

/// Post-victory cutscene of a boss variant.
///
/// Every variant shares the frame: lock input, pose, body, release input, hand
/// off to the level transition. Only `body` differs.
pub trait PostVictory {
    fn body(&self, script: Cutscene) -> Cutscene;

    fn script(&self, pose_secs: f32) -> Cutscene {
        let head = Cutscene::new()
            .then(CutsceneBeat::LockInput)
            .then(CutsceneBeat::StartPose)
            .wait(pose_secs);
        self.body(head)
            .then(CutsceneBeat::ReleaseInput)
            .then(CutsceneBeat::HandOff)
    }
}

impl PostVictory for VictoryVariant {
    fn body(&self, script: Cutscene) -> Cutscene {
        match self {
            VictoryVariant::CarryOff => script
                .then(CutsceneBeat::SpawnPursuer)
                .then(CutsceneBeat::BeginWalk)
                .until(CutsceneGate::WalkFinished),
            VictoryVariant::FadeOut => script
                .then(CutsceneBeat::BeginFade)
                .until(CutsceneGate::FadeFinished),
        }
    }
}

/// Straight walk with a footstep every `stride` units travelled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkLoop {
    from: Vec2,
    to: Vec2,
    speed: f32,
    stride: f32,
    travelled: f32,
    next_step: f32,
}

impl WalkLoop {
    pub fn new(from: Vec2, to: Vec2, speed: f32, stride: f32) -> Self {
        let stride = stride.max(1.0);
        Self {
            from,
            to,
            speed: speed.max(0.0),
            stride,
            travelled: 0.0,
            next_step: stride,
        }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.from.distance(self.to)
    }

    /// Move along; returns the footsteps taken this frame.
    pub fn advance(&mut self, dt: f32) -> u32 {
        let length = self.length();
        self.travelled = (self.travelled + self.speed * dt).min(length);
        let mut steps = 0;
        while self.next_step <= self.travelled {
            steps += 1;
            self.next_step += self.stride;
        }
        steps
    }

    pub fn position(&self) -> Vec2 {
        let length = self.length();
        if length <= f32::EPSILON {
            return self.to;
        }
        self.from.lerp(self.to, self.travelled / length)
    }

    #[inline]
    pub fn finished(&self) -> bool {
        self.travelled >= self.length()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Observation {
    /// New health-bar value, when it changed.
    pub health_bar: Option<f32>,
    /// True on exactly one observation per activation.
    pub victory: bool,
}

/// What one cutscene frame asks of the world.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CutsceneFrame {
    pub beats: Vec<CutsceneBeat>,
    pub footsteps: u32,
    pub walker: Option<Vec2>,
    pub fade: Option<f32>,
}

#[derive(Component, Debug, Clone)]
pub struct BossEncounter {
    boss: Option<Entity>,
    name: String,
    music: String,
    variant: VictoryVariant,
    arena: Arena,
    active: bool,
    victory_triggered: bool,
    loot_collected: bool,
    last_fraction: Option<f32>,
    cutscene: Cutscene,
    walk: Option<WalkLoop>,
    fade: Option<f32>,
}

impl BossEncounter {
    pub fn new(profile: &BossProfile, arena: Arena) -> Self {
        Self {
            boss: None,
            name: profile.name.clone(),
            music: profile.music.clone(),
            variant: profile.victory,
            arena,
            active: false,
            victory_triggered: false,
            loot_collected: false,
            last_fraction: None,
            cutscene: Cutscene::new(),
            walk: None,
            fade: None,
        }
    }

    /// Pre-bind the boss; activation then skips discovery.
    pub fn with_boss(mut self, boss: Entity) -> Self {
        self.boss = Some(boss);
        self
    }

    #[inline]
    pub fn boss(&self) -> Option<Entity> {
        self.boss
    }
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
    #[inline]
    pub fn music(&self) -> &str {
        &self.music
    }
    #[inline]
    pub fn arena(&self) -> Arena {
        self.arena
    }
    #[inline]
    pub fn variant(&self) -> VictoryVariant {
        self.variant
    }
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }
    #[inline]
    pub fn victory_triggered(&self) -> bool {
        self.victory_triggered
    }
    #[inline]
    pub fn cutscene_running(&self) -> bool {
        !self.cutscene.is_idle()
    }

    /// Reset every flag and bind the boss (the pre-bound one wins over
    /// `discovered`). Without a boss the encounter stays inactive.
    pub fn activate(&mut self, discovered: Option<Entity>) -> bool {
        self.active = false;
        self.victory_triggered = false;
        self.loot_collected = false;
        self.last_fraction = None;
        self.cutscene.cancel();
        self.walk = None;
        self.fade = None;

        self.boss = self.boss.or(discovered);
        self.active = self.boss.is_some();
        self.active
    }

    pub fn observe(&mut self, health: i32, max_health: i32) -> Observation {
        let mut obs = Observation::default();
        if !self.active {
            return obs;
        }
        let fraction = (health as f32 / max_health.max(1) as f32).clamp(0.0, 1.0);
        if self.last_fraction != Some(fraction) {
            self.last_fraction = Some(fraction);
            obs.health_bar = Some(fraction);
        }
        if health <= 0 && !self.victory_triggered {
            self.victory_triggered = true;
            obs.victory = true;
        }
        obs
    }

    /// Start the variant's cutscene. Only once, and only after victory.
    pub fn on_loot_collected(&mut self) -> bool {
        if !self.victory_triggered || self.loot_collected {
            return false;
        }
        self.loot_collected = true;
        self.cutscene.restart(self.variant.script(POSE_SECS));
        true
    }

    pub fn begin_walk(&mut self, walk: WalkLoop) {
        self.walk = Some(walk);
    }

    pub fn begin_fade(&mut self) {
        self.fade = Some(0.0);
    }

    /// Advance the walk/fade, then the script.
    pub fn advance(&mut self, dt: f32) -> CutsceneFrame {
        let mut frame = CutsceneFrame::default();

        if let Some(walk) = self.walk.as_mut() {
            if !walk.finished() {
                frame.footsteps = walk.advance(dt);
                frame.walker = Some(walk.position());
            }
        }
        if let Some(fade) = self.fade.as_mut() {
            if *fade < 1.0 {
                *fade = if FADE_SECS > 0.0 {
                    (*fade + dt / FADE_SECS).min(1.0)
                } else {
                    1.0
                };
                frame.fade = Some(*fade);
            }
        }

        let walk_done = self.walk.as_ref().is_some_and(WalkLoop::finished);
        let fade_done = self.fade.is_some_and(|f| f >= 1.0);
        frame.beats = self.cutscene.tick(dt, |gate| match gate {
            CutsceneGate::WalkFinished => walk_done,
            CutsceneGate::FadeFinished => fade_done,
        });
        frame
    }
}

/// Walks next to the player during the carry-off cutscene.
#[derive(Component, Debug, Clone, Copy)]
pub struct Pursuer;

pub fn plugin(app: &mut App) {
    app.add_systems(Update, activate_encounters.in_set(GameSet::Apply))
        .add_systems(
            Update,
            (watch_encounters, run_cutscenes)
                .chain()
                .after(boss::drive_bosses)
                .in_set(GameSet::Direct),
        )
        .add_systems(Update, start_cutscenes.in_set(GameSet::Resolve));
}

#[allow(clippy::too_many_arguments)]
fn activate_encounters(
    mut cmds: MessageReader<LevelCommand>,
    map: Res<CurrentMap>,
    mut bounds: ResMut<PlayerBounds>,
    mut respawn: ResMut<RespawnPoint>,
    mut lock: ResMut<InputLock>,
    mut q_enc: Query<&mut BossEncounter>,
    mut q_brain: Query<(Entity, &mut BossBrain, &MapPart)>,
    mut hud: MessageWriter<HudCommand>,
    mut audio: MessageWriter<AudioCue>,
) {
    for cmd in cmds.read() {
        if *cmd != LevelCommand::ActivateEncounter {
            continue;
        }
        let Some(mut enc) = map.encounter.and_then(|e| q_enc.get_mut(e).ok()) else {
            warn!("activation requested but map {:?} has no encounter", map.id);
            continue;
        };

        let discovered = q_brain
            .iter()
            .find(|(_, _, part)| part.0 == map.id)
            .map(|(e, _, _)| e);
        if !enc.activate(discovered) {
            warn!("encounter '{}' found no boss; it stays idle", enc.name());
            continue;
        }

        let arena = enc.arena();
        bounds.0 = world::shifted(arena.bounds, map.origin);
        respawn.0 = map.origin + arena.respawn_point;
        audio.write(AudioCue::Music(enc.music().to_string()));
        hud.write(HudCommand::BossDisplay {
            name: enc.name().to_string(),
            visible: true,
        });

        if let Some(Ok((_, mut brain, _))) = enc.boss().map(|b| q_brain.get_mut(b)) {
            if brain.start_fight().contains(&BossSignal::LockInput) {
                lock.0 = true;
            }
        }
        info!("encounter '{}' active", enc.name());
    }
}

/// Health mirror plus the one-shot victory.
fn watch_encounters(
    mut commands: Commands,
    map: Res<CurrentMap>,
    mut progress: ResMut<Progress>,
    mut bounds: ResMut<PlayerBounds>,
    mut q_enc: Query<&mut BossEncounter>,
    q_brain: Query<(&BossBrain, &Transform)>,
    mut hud: MessageWriter<HudCommand>,
) {
    for mut enc in &mut q_enc {
        if !enc.is_active() {
            continue;
        }
        let Some((brain, tf)) = enc.boss().and_then(|b| q_brain.get(b).ok()) else {
            continue;
        };

        let obs = enc.observe(brain.health(), brain.max_health());
        if let Some(fraction) = obs.health_bar {
            hud.write(HudCommand::HealthBar { fraction });
        }
        if !obs.victory {
            continue;
        }

        info!("victory over '{}'", enc.name());
        loot::spawn_victory_loot(&mut commands, tf.translation.truncate(), map.id);
        bounds.0 = world::shifted(MapLayout::walkable(map.size), map.origin);
        progress.areas_cleared += 1;
        hud.write(HudCommand::BossDisplay {
            name: enc.name().to_string(),
            visible: false,
        });
    }
}

fn start_cutscenes(mut collected: MessageReader<VictoryLootCollected>, mut q_enc: Query<&mut BossEncounter>) {
    if collected.read().count() == 0 {
        return;
    }
    for mut enc in &mut q_enc {
        if enc.on_loot_collected() {
            info!("post-victory sequence for '{}' ({:?})", enc.name(), enc.variant());
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_cutscenes(
    mut commands: Commands,
    time: Res<Time>,
    map: Res<CurrentMap>,
    mut lock: ResMut<InputLock>,
    mut q_enc: Query<&mut BossEncounter>,
    mut q_player: Query<&mut Transform, (With<Player>, Without<Pursuer>)>,
    mut q_pursuer: Query<&mut Transform, (With<Pursuer>, Without<Player>)>,
    mut hud: MessageWriter<HudCommand>,
    mut audio: MessageWriter<AudioCue>,
    mut transition: MessageWriter<RequestTransition>,
) {
    let dt = time.delta_secs();
    for mut enc in &mut q_enc {
        if !enc.cutscene_running() {
            continue;
        }
        let frame = enc.advance(dt);

        if let Some(at) = frame.walker {
            for mut tf in &mut q_player {
                tf.translation.x = at.x;
                tf.translation.y = at.y;
            }
            for mut tf in &mut q_pursuer {
                tf.translation.x = at.x + PURSUER_OFFSET.x;
                tf.translation.y = at.y + PURSUER_OFFSET.y;
            }
        }
        for _ in 0..frame.footsteps {
            audio.write(AudioCue::Footstep);
        }
        if let Some(alpha) = frame.fade {
            hud.write(HudCommand::Fade(alpha));
        }

        let player_at = q_player
            .iter()
            .next()
            .map(|tf| tf.translation.truncate())
            .unwrap_or(map.spawn);

        for beat in frame.beats {
            match beat {
                CutsceneBeat::LockInput => lock.0 = true,
                CutsceneBeat::StartPose => debug!("victory pose"),
                CutsceneBeat::SpawnPursuer => {
                    commands.spawn((
                        Name::new("Pursuer"),
                        Pursuer,
                        Sprite::from_color(Color::srgb(0.85, 0.8, 0.6), Vec2::splat(22.0)),
                        Transform::from_translation((player_at + PURSUER_OFFSET).extend(1.0)),
                        world::scoped(map.id),
                    ));
                }
                CutsceneBeat::BeginWalk => {
                    let exit = map.origin + MapLayout::new(map.size).exit;
                    enc.begin_walk(WalkLoop::new(player_at, exit, WALK_SPEED, WALK_STRIDE));
                }
                CutsceneBeat::BeginFade => enc.begin_fade(),
                CutsceneBeat::ReleaseInput => lock.0 = false,
                CutsceneBeat::HandOff => {
                    info!("'{}' hands off to the next level", enc.name());
                    transition.write(RequestTransition);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
