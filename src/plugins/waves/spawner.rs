//! Wave spawner state machine, free of ECS.
//!
//! The wave loop is one `Sequence` (the main script); the respawn replay is a
//! second, independent one. The ECS side feeds a `Census` each frame and turns
//! the returned `SpawnerEvent`s into spawn requests.
//!
//! ```text
//!   per wave:  StartWave(i)
//!              Spawn, Wait(rate), Spawn, ...      every group, in order
//!              WaitFrame                          last spawn becomes visible
//!              WaitUntil(Cleared)                 throttled re-check
//!              WaveCleared(i), Wait(inter_wave)
//!   then:      AllWavesDone
//! ```

use std::collections::VecDeque;

use bevy::prelude::*;

use crate::common::config::{EnemyKindId, WaveDef};
use crate::common::sequence::{Countdown, Sequence};
use crate::common::tunables::Tunables;
use crate::plugins::enemies::Census;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveAction {
    StartWave(usize),
    Spawn(EnemyKindId),
    WaveCleared(usize),
    AllWavesDone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveGate {
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReplayAction {
    Spawn,
    Resume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnerEvent {
    WaveStarted(usize),
    Spawn { kind: EnemyKindId, replay: bool },
    WaveCleared(usize),
    AllWavesDone,
    /// Replay finished; the wave loop runs again.
    Resumed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnerTuning {
    pub inter_wave_delay: f32,
    /// Already clamped to the minimum.
    pub clear_recheck: f32,
    pub replay_interval: f32,
}

impl From<&Tunables> for SpawnerTuning {
    fn from(t: &Tunables) -> Self {
        Self {
            inter_wave_delay: t.inter_wave_delay,
            clear_recheck: t.clear_recheck(),
            replay_interval: t.respawn_replay_interval,
        }
    }
}

#[derive(Resource, Debug)]
pub struct WaveSpawner {
    tuning: SpawnerTuning,
    waves: Vec<WaveDef>,
    anchors: Vec<Vec2>,
    map_offset: Vec2,
    paused: bool,
    running: bool,
    pending_respawn: VecDeque<EnemyKindId>,
    main: Sequence<WaveAction, WaveGate>,
    replay: Sequence<ReplayAction>,
    recheck: Countdown,
    spawned_this_frame: usize,
    current_wave: Option<usize>,
}

impl WaveSpawner {
    pub fn new(tuning: SpawnerTuning) -> Self {
        Self {
            tuning,
            waves: Vec::new(),
            anchors: Vec::new(),
            map_offset: Vec2::ZERO,
            paused: false,
            running: false,
            pending_respawn: VecDeque::new(),
            main: Sequence::new(),
            replay: Sequence::new(),
            recheck: Countdown::default(),
            spawned_this_frame: 0,
            current_wave: None,
        }
    }

    /// Replace wave data and anchors. A running script is left alone.
    pub fn load_level(&mut self, waves: Vec<WaveDef>, anchors: Vec<Vec2>, map_offset: Vec2) {
        self.waves = waves;
        self.anchors = anchors;
        self.map_offset = map_offset;
    }

    /// Start the wave loop from the first wave, dropping any earlier script.
    pub fn run(&mut self) {
        let mut script = Sequence::new();
        for (i, wave) in self.waves.iter().enumerate() {
            script = script.then(WaveAction::StartWave(i));
            let mut first = true;
            for group in &wave.groups {
                for _ in 0..group.count {
                    if !first {
                        script = script.wait(group.rate_secs);
                    }
                    first = false;
                    script = script.then(WaveAction::Spawn(group.enemy));
                }
            }
            script = script
                .frame()
                .until(WaveGate::Cleared)
                .then(WaveAction::WaveCleared(i))
                .wait(self.tuning.inter_wave_delay);
        }
        script = script.then(WaveAction::AllWavesDone);

        self.main.restart(script);
        self.running = true;
        self.current_wave = None;
        self.recheck = Countdown::default();
    }

    /// Abort the wave loop. Nothing queued before this call resumes.
    pub fn stop_spawning(&mut self) {
        self.main.cancel();
        self.running = false;
    }

    /// Freeze the wave loop and queue the origin kinds of the rolled-back enemies.
    /// The caller removes the enemies themselves.
    pub fn on_player_died(&mut self, rolled_back: impl IntoIterator<Item = EnemyKindId>) {
        self.paused = true;
        self.replay.cancel();
        self.pending_respawn.extend(rolled_back);
    }

    /// Replay the pending queue, one spawn per interval, then unpause.
    pub fn on_player_respawned(&mut self) {
        let mut replay = Sequence::new();
        for i in 0..self.pending_respawn.len() {
            if i > 0 {
                replay = replay.wait(self.tuning.replay_interval);
            }
            replay = replay.then(ReplayAction::Spawn);
        }
        self.replay.restart(replay.then(ReplayAction::Resume));
    }

    /// No non-inert wave enemy alive and nothing waiting to be replayed.
    #[inline]
    pub fn is_wave_cleared(&self, census: Census) -> bool {
        census.non_inert == 0 && self.pending_respawn.is_empty()
    }

    /// The level must not count as clear while this holds.
    #[inline]
    pub fn holds_level_open(&self) -> bool {
        !self.pending_respawn.is_empty() || self.spawned_this_frame > 0
    }

    pub fn tick(&mut self, dt: f32, census: Census) -> Vec<SpawnerEvent> {
        let mut events = Vec::new();
        self.spawned_this_frame = 0;
        self.recheck.tick_down(dt);

        for action in self.replay.tick(dt, |_| true) {
            match action {
                ReplayAction::Spawn => {
                    if let Some(kind) = self.pending_respawn.pop_front() {
                        self.spawned_this_frame += 1;
                        events.push(SpawnerEvent::Spawn { kind, replay: true });
                    }
                }
                ReplayAction::Resume => {
                    self.paused = false;
                    events.push(SpawnerEvent::Resumed);
                }
            }
        }

        if self.paused || !self.running {
            return events;
        }

        let recheck = &mut self.recheck;
        let recheck_secs = self.tuning.clear_recheck;
        let pending_empty = self.pending_respawn.is_empty();
        let fresh_spawns = self.spawned_this_frame;
        let actions = self.main.tick(dt, |gate| match gate {
            WaveGate::Cleared => {
                if !recheck.expired() {
                    return false;
                }
                *recheck = Countdown::new(recheck_secs);
                census.non_inert == 0 && pending_empty && fresh_spawns == 0
            }
        });

        for action in actions {
            match action {
                WaveAction::StartWave(i) => {
                    self.current_wave = Some(i);
                    events.push(SpawnerEvent::WaveStarted(i));
                }
                WaveAction::Spawn(kind) => {
                    self.spawned_this_frame += 1;
                    events.push(SpawnerEvent::Spawn { kind, replay: false });
                }
                WaveAction::WaveCleared(i) => events.push(SpawnerEvent::WaveCleared(i)),
                WaveAction::AllWavesDone => {
                    self.running = false;
                    events.push(SpawnerEvent::AllWavesDone);
                }
            }
        }
        events
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }
    #[inline]
    pub fn pending_len(&self) -> usize {
        self.pending_respawn.len()
    }
    #[inline]
    pub fn anchors(&self) -> &[Vec2] {
        &self.anchors
    }
    #[inline]
    pub fn map_offset(&self) -> Vec2 {
        self.map_offset
    }
    #[inline]
    pub fn current_wave(&self) -> Option<usize> {
        self.current_wave
    }
    #[inline]
    pub fn wave_count(&self) -> usize {
        self.waves.len()
    }
}
