//! Boss state machine, free of ECS.
//!
//! ```text
//!   Waiting --start_fight--> Intro --timer--> Idle
//!   Idle --timer + roll--> Teleporting | Attacking | Moving --timer--> Idle
//!   any fighting phase --lethal hit--> Dead (absorbing)
//! ```
//!
//! The brain owns the boss's health. Everything it wants the world to do comes
//! back as `BossSignal`s from `start_fight`, `tick` and `take_damage`.

use bevy::prelude::*;

use crate::common::config::{BossKind, BossProfile, EnemyKindId, FirePattern};
use crate::common::sequence::{Countdown, Sequence};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossPhase {
    Waiting,
    Intro,
    Idle,
    Moving,
    Attacking,
    Teleporting,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossAction {
    Special,
    Attack,
    Move,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BossSignal {
    LockInput,
    ReleaseInput,
    Fire(FirePattern),
    Teleport,
    Summon { kind: EnemyKindId, count: u32 },
    Died,
    DeathBeat(u32),
    /// End of the death sequence; the entity may go.
    Vanish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeathStep {
    Beat(u32),
    Vanish,
}

/// Pick the next action from one roll in `[0, 1)`.
///
/// The chances are chained thresholds, not weights: the special ability is
/// checked first, the attack chance is stacked on top of it, and whatever mass
/// is left falls through to movement.
pub fn choose_action(roll: f32, special_chance: f32, attack_chance: f32) -> BossAction {
    if roll < special_chance {
        BossAction::Special
    } else if roll < special_chance + attack_chance {
        BossAction::Attack
    } else {
        BossAction::Move
    }
}

/// Bullet directions for one volley. `aim` is the direction to the player.
pub fn pattern_directions(pattern: FirePattern, aim: Vec2) -> Vec<Vec2> {
    let aim = aim.try_normalize().unwrap_or(Vec2::NEG_Y);
    match pattern {
        FirePattern::Radial { count } => {
            let n = count.max(1) as f32;
            (0..count.max(1))
                .map(|i| Vec2::from_angle(i as f32 * std::f32::consts::TAU / n).rotate(aim))
                .collect()
        }
        FirePattern::Aimed { count, spread_deg } => {
            if count <= 1 {
                return vec![aim];
            }
            let spread = spread_deg.to_radians();
            let step = spread / (count - 1) as f32;
            (0..count)
                .map(|i| Vec2::from_angle(-spread * 0.5 + step * i as f32).rotate(aim))
                .collect()
        }
    }
}

#[derive(Component, Debug, Clone)]
pub struct BossBrain {
    profile: BossProfile,
    phase: BossPhase,
    health: i32,
    /// Pending summon thresholds, descending.
    thresholds: Vec<f32>,
    timer: Countdown,
    fire_timer: Countdown,
    death: Sequence<DeathStep>,
}

impl BossBrain {
    pub fn new(profile: &BossProfile) -> Self {
        let mut thresholds = profile.summon_thresholds.clone();
        thresholds.sort_by(|a, b| b.total_cmp(a));
        thresholds.dedup();

        let mut profile = profile.clone();
        profile.max_health = profile.max_health.max(1);

        Self {
            health: profile.max_health,
            profile,
            phase: BossPhase::Waiting,
            thresholds,
            timer: Countdown::default(),
            fire_timer: Countdown::default(),
            death: Sequence::new(),
        }
    }

    #[inline]
    pub fn phase(&self) -> BossPhase {
        self.phase
    }
    #[inline]
    pub fn kind(&self) -> BossKind {
        self.profile.kind
    }
    #[inline]
    pub fn name(&self) -> &str {
        &self.profile.name
    }
    #[inline]
    pub fn profile(&self) -> &BossProfile {
        &self.profile
    }
    #[inline]
    pub fn health(&self) -> i32 {
        self.health
    }
    #[inline]
    pub fn max_health(&self) -> i32 {
        self.profile.max_health
    }
    #[inline]
    pub fn fraction(&self) -> f32 {
        self.health as f32 / self.profile.max_health as f32
    }
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.phase == BossPhase::Dead
    }
    #[inline]
    pub fn pending_thresholds(&self) -> &[f32] {
        &self.thresholds
    }

    /// Only a waiting boss can be started. Locks player input for the intro.
    pub fn start_fight(&mut self) -> Vec<BossSignal> {
        if self.phase != BossPhase::Waiting {
            return Vec::new();
        }
        self.phase = BossPhase::Intro;
        self.timer = Countdown::new(self.profile.intro_secs);
        vec![BossSignal::LockInput]
    }

    /// One frame. `roll` in `[0, 1)` is used only when an idle period ends.
    pub fn tick(&mut self, dt: f32, roll: f32) -> Vec<BossSignal> {
        let mut out = Vec::new();
        match self.phase {
            BossPhase::Waiting => {}
            BossPhase::Dead => {
                for step in self.death.tick(dt, |_| true) {
                    out.push(match step {
                        DeathStep::Beat(i) => BossSignal::DeathBeat(i),
                        DeathStep::Vanish => BossSignal::Vanish,
                    });
                }
            }
            BossPhase::Intro => {
                self.timer.tick_down(dt);
                if self.timer.expired() {
                    self.enter_idle();
                    out.push(BossSignal::ReleaseInput);
                }
            }
            BossPhase::Idle => {
                self.timer.tick_down(dt);
                if self.timer.expired() {
                    let p = &self.profile;
                    match choose_action(roll, p.special_chance, p.attack_chance) {
                        BossAction::Special => {
                            self.phase = BossPhase::Teleporting;
                            self.timer = Countdown::new(p.teleport_secs);
                            out.push(BossSignal::Teleport);
                        }
                        BossAction::Attack => {
                            self.phase = BossPhase::Attacking;
                            self.timer = Countdown::new(p.attack_secs);
                            self.fire_timer = Countdown::default();
                        }
                        BossAction::Move => {
                            self.phase = BossPhase::Moving;
                            self.timer = Countdown::new(p.move_secs);
                        }
                    }
                }
            }
            BossPhase::Attacking => {
                self.fire_timer.tick_down(dt);
                if self.fire_timer.expired() {
                    out.push(BossSignal::Fire(self.profile.pattern));
                    self.fire_timer = Countdown::new(self.profile.fire_interval);
                }
                self.timer.tick_down(dt);
                if self.timer.expired() {
                    self.enter_idle();
                }
            }
            BossPhase::Moving | BossPhase::Teleporting => {
                self.timer.tick_down(dt);
                if self.timer.expired() {
                    self.enter_idle();
                }
            }
        }
        out
    }

    /// Damage is rejected before the fight starts, during the intro and after death.
    ///
    /// Every threshold crossed by this hit fires its summon, in descending order,
    /// unless the hit is lethal.
    pub fn take_damage(&mut self, amount: i32) -> Vec<BossSignal> {
        let mut out = Vec::new();
        if amount <= 0
            || matches!(
                self.phase,
                BossPhase::Waiting | BossPhase::Intro | BossPhase::Dead
            )
        {
            return out;
        }

        self.health = self.health.saturating_sub(amount).max(0);
        if self.health == 0 {
            self.die();
            out.push(BossSignal::Died);
            return out;
        }

        let fraction = self.fraction();
        while self.thresholds.first().is_some_and(|t| fraction <= *t) {
            self.thresholds.remove(0);
            out.push(BossSignal::Summon {
                kind: self.profile.summon_kind,
                count: self.profile.summon_count,
            });
        }
        out
    }

    fn enter_idle(&mut self) {
        self.phase = BossPhase::Idle;
        self.timer = Countdown::new(self.profile.idle_secs);
    }

    fn die(&mut self) {
        self.phase = BossPhase::Dead;
        self.thresholds.clear();

        let mut seq = Sequence::new();
        for i in 0..self.profile.death_beats {
            seq = seq.then(DeathStep::Beat(i)).wait(self.profile.death_beat_secs);
        }
        self.death.restart(seq.then(DeathStep::Vanish));
    }
}
