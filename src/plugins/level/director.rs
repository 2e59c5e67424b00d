//! Level state machine, free of ECS.
//!
//! ```text
//!   Idle -> Setup -> (Tutorial ->) Gameplay(Waves) --time up--> WaitForClear
//!                                  --clear--> AwaitExit --exit--> Transition -> Setup(next)
//!                               \-> Gameplay(Boss) --hand-off--> Transition -> Setup(next)
//!   any phase --death with no lives left--> GameOver
//!   missing level --> Halted
//! ```
//!
//! The director never touches the world. Each `tick` reads a `DirectorFrame`
//! and returns the `LevelCommand`s for the consumers to apply this frame.

use bevy::prelude::*;
use rand::Rng;

use super::{LevelCommand, Progress};
use crate::common::config::GameConfig;
use crate::common::sequence::Sequence;
use crate::common::tunables::Tunables;
use crate::plugins::enemies::Census;
use crate::plugins::hud::{HudCommand, Panel, TIMER_NORMAL, timer_color};
use crate::plugins::world::MapLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameplayMode {
    Waves,
    Boss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelPhase {
    Idle,
    Setup,
    Tutorial,
    Gameplay(GameplayMode),
    WaitForClear,
    AwaitExit,
    Transition,
    /// No level to go to. Nothing progresses any more.
    Halted,
    GameOver,
}

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Emit(LevelCommand),
    EnterGameplay,
    StartLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    AnyInput,
}

type Script = Sequence<Step, Gate>;

/// What the director sees of the world this frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectorFrame {
    pub dt: f32,
    pub player_alive: bool,
    pub player_died: bool,
    pub any_input: bool,
    /// Every living enemy that can hold a level open.
    pub census: Census,
    /// Pending respawns or spawns issued this frame.
    pub spawner_holds_open: bool,
    /// The loaded map has a boss encounter.
    pub boss_level: bool,
    pub exit_reached: bool,
    pub transition_requested: bool,
}

#[derive(Resource, Debug, Clone)]
pub struct LevelDirector {
    phase: LevelPhase,
    script: Script,
    duration: f32,
    remaining: f32,
    elapsed: f32,
    critter_at: Option<f32>,
    weakened: bool,
    tutorial_shown: bool,
}

impl Default for LevelDirector {
    fn default() -> Self {
        Self {
            phase: LevelPhase::Idle,
            script: Script::new(),
            duration: 0.0,
            remaining: 0.0,
            elapsed: 0.0,
            critter_at: None,
            weakened: false,
            tutorial_shown: false,
        }
    }
}

impl LevelDirector {
    #[inline]
    pub fn phase(&self) -> LevelPhase {
        self.phase
    }
    #[inline]
    pub fn remaining(&self) -> f32 {
        self.remaining
    }
    #[inline]
    pub fn critter_at(&self) -> Option<f32> {
        self.critter_at
    }
    #[inline]
    pub fn tutorial_shown(&self) -> bool {
        self.tutorial_shown
    }

    /// Back to `Idle` for a fresh run. The tutorial is only ever shown once.
    pub fn reset(&mut self) {
        let tutorial_shown = self.tutorial_shown;
        *self = Self {
            tutorial_shown,
            ..default()
        };
    }

    pub fn tick(
        &mut self,
        frame: &DirectorFrame,
        config: &GameConfig,
        tunables: &Tunables,
        progress: &mut Progress,
        rng: &mut impl Rng,
    ) -> Vec<LevelCommand> {
        let mut out = Vec::new();
        if matches!(self.phase, LevelPhase::GameOver | LevelPhase::Halted) {
            return out;
        }

        if frame.player_died {
            if progress.lives == 0 {
                self.game_over(progress, &mut out);
                return out;
            }
            progress.lives -= 1;
            info!("player died, {} lives left", progress.lives);
        }

        if self.phase == LevelPhase::Idle {
            self.begin(config, progress, &mut out);
        }

        let before = self.phase;
        let any_input = frame.any_input;
        for step in self.script.tick(frame.dt, |g| match g {
            Gate::AnyInput => any_input,
        }) {
            match step {
                Step::Emit(cmd) => out.push(cmd),
                Step::EnterGameplay => self.enter_gameplay(frame, config, progress, rng, &mut out),
                Step::StartLevel => {
                    self.phase = LevelPhase::Setup;
                    self.script.extend(Script::new().frame().then(Step::EnterGameplay));
                }
            }
        }
        if self.phase != before {
            return out;
        }

        match self.phase {
            LevelPhase::Gameplay(GameplayMode::Waves) => self.tick_timer(frame, tunables, &mut out),
            LevelPhase::Gameplay(GameplayMode::Boss) if frame.transition_requested => {
                self.begin_transition(config, tunables, progress, &mut out);
            }
            LevelPhase::WaitForClear => self.check_clear(frame, config, progress, &mut out),
            LevelPhase::AwaitExit if frame.exit_reached => {
                self.begin_transition(config, tunables, progress, &mut out);
            }
            _ => {}
        }
        out
    }

    fn begin(&mut self, config: &GameConfig, progress: &Progress, out: &mut Vec<LevelCommand>) {
        let level = progress.level_index;
        if config.level(level).is_none() {
            self.halt(level, out);
            return;
        }
        info!("setting up level {level}");
        self.phase = LevelPhase::Setup;
        self.script.restart(
            Script::new()
                .then(Step::Emit(LevelCommand::BuildMap {
                    level,
                    origin: Vec2::ZERO,
                }))
                .then(Step::Emit(LevelCommand::PlacePlayer { teleport: true }))
                .then(Step::Emit(LevelCommand::LoadWaves { level }))
                .frame()
                .then(Step::EnterGameplay),
        );
    }

    fn enter_gameplay(
        &mut self,
        frame: &DirectorFrame,
        config: &GameConfig,
        progress: &Progress,
        rng: &mut impl Rng,
        out: &mut Vec<LevelCommand>,
    ) {
        let level = progress.level_index;
        if level == 0 && !self.tutorial_shown {
            self.tutorial_shown = true;
            self.phase = LevelPhase::Tutorial;
            out.push(LevelCommand::Hud(HudCommand::Panel {
                panel: Panel::Tutorial,
                visible: true,
            }));
            self.script.extend(
                Script::new()
                    .until(Gate::AnyInput)
                    .then(Step::Emit(LevelCommand::Hud(HudCommand::Panel {
                        panel: Panel::Tutorial,
                        visible: false,
                    })))
                    .then(Step::EnterGameplay),
            );
            return;
        }

        if frame.boss_level {
            info!("level {level}: boss encounter");
            self.phase = LevelPhase::Gameplay(GameplayMode::Boss);
            out.push(LevelCommand::ActivateEncounter);
            return;
        }

        let Some(cfg) = config.level(level) else {
            self.halt(level, out);
            return;
        };
        self.duration = cfg.duration_secs.max(0.0);
        self.remaining = self.duration;
        self.elapsed = 0.0;
        self.weakened = false;
        self.critter_at = (rng.r#gen::<f32>() < cfg.critter_chance).then(|| rng.gen_range(0.0..=self.duration));
        if let Some(at) = self.critter_at {
            debug!("critter scheduled at {at:.1}s");
        }

        info!("level {level}: waves for {:.0}s", self.duration);
        self.phase = LevelPhase::Gameplay(GameplayMode::Waves);
        out.push(LevelCommand::RunWaves);
        out.push(LevelCommand::Hud(HudCommand::TimerBar {
            fraction: 1.0,
            color: TIMER_NORMAL,
        }));
    }

    /// The countdown only runs while the player is alive.
    fn tick_timer(&mut self, frame: &DirectorFrame, tunables: &Tunables, out: &mut Vec<LevelCommand>) {
        if frame.player_alive {
            self.remaining = (self.remaining - frame.dt).max(0.0);
            self.elapsed += frame.dt;
        }
        let fraction = if self.duration > 0.0 {
            self.remaining / self.duration
        } else {
            0.0
        };
        out.push(LevelCommand::Hud(HudCommand::TimerBar {
            fraction,
            color: timer_color(fraction, tunables.critical_time_fraction),
        }));

        if self.critter_at.is_some_and(|at| self.elapsed >= at) {
            self.critter_at = None;
            out.push(LevelCommand::SpawnCritter);
        }

        if self.remaining <= 0.0 {
            info!("time up");
            self.phase = LevelPhase::WaitForClear;
            out.push(LevelCommand::StopWaves);
        }
    }

    fn check_clear(
        &mut self,
        frame: &DirectorFrame,
        config: &GameConfig,
        progress: &mut Progress,
        out: &mut Vec<LevelCommand>,
    ) {
        if frame.census.only_inert() && !self.weakened {
            self.weakened = true;
            out.push(LevelCommand::WeakenInert);
        }
        if frame.census.total() > 0 || frame.spawner_holds_open {
            return;
        }

        progress.areas_cleared += 1;
        info!(
            "area cleared (level {}, {} total)",
            progress.level_index, progress.areas_cleared
        );
        out.push(LevelCommand::OpenGate);
        if config.is_shop_level(progress.level_index) {
            out.push(LevelCommand::SpawnShop);
        }
        self.phase = LevelPhase::AwaitExit;
    }

    fn begin_transition(
        &mut self,
        config: &GameConfig,
        tunables: &Tunables,
        progress: &mut Progress,
        out: &mut Vec<LevelCommand>,
    ) {
        let next = progress.level_index + 1;
        if config.level(next).is_none() {
            self.halt(next, out);
            return;
        }
        info!("transition to level {next}");
        progress.level_index = next;
        self.phase = LevelPhase::Transition;

        let above = Vec2::new(0.0, tunables.map_size.y);
        let entry = above + MapLayout::new(tunables.map_size).spawn;
        let secs = tunables.transition_secs;
        self.script.restart(
            Script::new()
                .then(Step::Emit(LevelCommand::Hud(HudCommand::Panel {
                    panel: Panel::Shop,
                    visible: false,
                })))
                .then(Step::Emit(LevelCommand::BuildMap {
                    level: next,
                    origin: above,
                }))
                .then(Step::Emit(LevelCommand::PlacePlayer { teleport: false }))
                .then(Step::Emit(LevelCommand::LockInput(true)))
                .then(Step::Emit(LevelCommand::StartScriptedMove { to: entry, secs }))
                .wait(secs)
                .then(Step::Emit(LevelCommand::DestroyOldMap))
                .then(Step::Emit(LevelCommand::ReRootWorld { shift: -above }))
                .then(Step::Emit(LevelCommand::RebindWaves { level: next }))
                .then(Step::Emit(LevelCommand::Persist))
                .then(Step::Emit(LevelCommand::Hud(HudCommand::Fade(0.0))))
                .then(Step::Emit(LevelCommand::LockInput(false)))
                .wait(tunables.settle_secs)
                .then(Step::StartLevel),
        );
    }

    fn halt(&mut self, level: usize, out: &mut Vec<LevelCommand>) {
        warn!("level {level} is not configured; progression halted");
        self.phase = LevelPhase::Halted;
        self.script.cancel();
        out.push(LevelCommand::StopWaves);
    }

    fn game_over(&mut self, progress: &mut Progress, out: &mut Vec<LevelCommand>) {
        info!("game over on level {}", progress.level_index);
        progress.game_over = true;
        self.phase = LevelPhase::GameOver;
        self.script.cancel();
        out.push(LevelCommand::StopWaves);
        out.push(LevelCommand::GameOver);
    }
}
