//! Enemies plugin: spawn consumer, health + one-shot death, stun, steering,
//! and the player-contact rule.
//!
//! ---------------------------
//! HOW THIS IS DESIGNED (ECS)
//! ---------------------------
//! 1) FACTS live in components:
//!    - `Health`, `EnemyLifeState` are gameplay truth.
//!    - `EnemyKind` is the origin token: enough to recreate the enemy after a
//!      respawn rollback.
//!    - `Mobility` carries the live speed plus the pre-stun snapshot.
//!
//! 2) RULES mutate facts in one place each:
//!    - `SpawnEnemy` messages are the only way enemies enter the world.
//!    - `DamageEnemy` messages are the only way `Health` goes down. Bullets, the
//!      nuke item and counter-mode contact all write them.
//!    - `EnemyDied` is written exactly once per enemy, by `apply_damage`.
//!
//! 3) STRUCTURE changes are deferred:
//!    - death marks `Dying`, the death animation marks `PendingDespawn`,
//!      `despawn_marked` removes the entity in `GameSet::Present`.
//!
//! Edge spawners start outside the walls. They pass through walls until their
//! whole body is inside the walkable area (`EdgeEntering`); critters never stop
//! passing through walls, so they can run off the map again.
//!
//! Player contact is tracked from collision start/end and judged every fixed
//! step against the player's current mode.
//!
//! Boss entities carry `Enemy` (so contact and bullets find them) but no `Health`:
//! their damage goes through the boss brain instead.

use avian2d::collision::narrow_phase::CollisionEventSystems;
use avian2d::prelude::*;
use bevy::platform::collections::HashMap;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;
use bevy_firefly::prelude::Occluder2d;

use crate::common::config::{Behaviour, EnemyArchetype, EnemyKindId, GameConfig};
use crate::common::layers::Layer;
use crate::common::rng::GameRng;
use crate::common::schedule::GameSet;
use crate::common::sequence::Countdown;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::level::LevelCommand;
use crate::plugins::loot::SecondaryTarget;
use crate::plugins::player::{KillCause, KillPlayer, Player, PlayerLife, PlayerMode};
use crate::plugins::waves::placement;
use crate::plugins::world::{CurrentMap, MapLayout, MapPart, WorldAnchored, shifted};

/// Damage a counter-mode player deals by touching an enemy.
pub const COUNTER_CONTACT_DAMAGE: i32 = 10;
/// Seconds between counter-mode hits on an enemy that stays in contact.
pub const COUNTER_CONTACT_REPEAT_SECS: f32 = 0.5;

const DEATH_ANIM_SECS: f32 = 0.35;
const HIT_FLASH_SECS: f32 = 0.08;

// -----------------------------------------------------------------------------
// Components
// -----------------------------------------------------------------------------

#[derive(Component, Debug, Clone, Copy)]
pub struct Enemy;

/// Origin token.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyKind(pub EnemyKindId);

/// Issued by the wave spawner (or its respawn replay). Only these take part in
/// the wave-clear check and the death rollback.
#[derive(Component, Debug, Clone, Copy)]
pub struct WaveIssued;

/// Stationary hazard that never blocks a clear.
#[derive(Component, Debug, Clone, Copy)]
pub struct InertUnderClear;

/// Side-event creature; not part of any clear check.
#[derive(Component, Debug, Clone, Copy)]
pub struct Critter;

/// Summoned by a boss.
#[derive(Component, Debug, Clone, Copy)]
pub struct BossSummoned;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Already dead, or a non-positive amount.
    Ignored,
    Hurt,
    /// This call crossed zero. Returned at most once per `Health`.
    Killed,
}

/// Invariant: `0 <= current <= max`; `dead` latches on the first lethal hit.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    current: i32,
    max: i32,
    dead: bool,
}

impl Health {
    pub fn new(max: i32) -> Self {
        let max = max.max(1);
        Self {
            current: max,
            max,
            dead: false,
        }
    }

    #[inline]
    pub fn current(&self) -> i32 {
        self.current
    }
    #[inline]
    pub fn max(&self) -> i32 {
        self.max
    }
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.dead
    }
    #[inline]
    pub fn fraction(&self) -> f32 {
        self.current as f32 / self.max as f32
    }

    pub fn take_damage(&mut self, amount: i32) -> DamageOutcome {
        if self.dead || amount <= 0 {
            return DamageOutcome::Ignored;
        }
        self.current = self.current.saturating_sub(amount).max(0);
        if self.current == 0 {
            self.dead = true;
            DamageOutcome::Killed
        } else {
            DamageOutcome::Hurt
        }
    }

    /// Drop health to `hp` if it is higher. Never kills.
    pub fn weaken_to(&mut self, hp: i32) {
        if !self.dead {
            self.current = self.current.min(hp.max(1));
        }
    }
}

/// Enemy lifecycle state machine.
///
/// - Alive: normal gameplay.
/// - Dying: short death animation; no collisions.
/// - Dead: terminal.
#[derive(Component, Debug, Clone)]
pub enum EnemyLifeState {
    Alive,
    Dying { timer: Timer },
    Dead,
}

impl EnemyLifeState {
    #[inline]
    pub fn is_alive(&self) -> bool {
        matches!(self, Self::Alive)
    }
}

/// Marker: enemy should be removed from the world.
///
/// We don't despawn inside the damage pass; we mark and despawn in `Present`.
#[derive(Component, Debug, Clone, Copy)]
pub struct PendingDespawn;

/// Spawned past the map edge and still on the way in.
#[derive(Component, Debug, Clone, Copy)]
pub struct EdgeEntering {
    pub radius: f32,
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Mobility {
    pub move_speed: f32,
    pub anim_rate: f32,
    /// Speed before the first stun; `None` while not stunned.
    stunned_from: Option<f32>,
}

impl Mobility {
    pub fn new(move_speed: f32) -> Self {
        Self {
            move_speed,
            anim_rate: 1.0,
            stunned_from: None,
        }
    }

    #[inline]
    pub fn is_stunned(&self) -> bool {
        self.stunned_from.is_some()
    }

    /// Repeated stuns keep the first snapshot.
    pub fn stun(&mut self) {
        if self.stunned_from.is_none() {
            self.stunned_from = Some(self.move_speed);
        }
        self.move_speed = 0.0;
        self.anim_rate = 0.0;
    }

    pub fn unstun(&mut self) {
        if let Some(speed) = self.stunned_from.take() {
            self.move_speed = speed;
            self.anim_rate = 1.0;
        }
    }
}

#[derive(Component, Debug, Clone, Copy)]
pub struct EnemyTraits {
    pub behaviour: Behaviour,
    pub coin_value: u32,
    pub drop_chance: f32,
    pub base_color: Color,
}

#[derive(Component, Debug, Default, Clone, Copy)]
pub struct HitFlash(pub Countdown);

// -----------------------------------------------------------------------------
// Messages
// -----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnSource {
    Wave,
    Replay,
    Boss,
    Critter,
}

#[derive(Message, Clone, Copy, Debug)]
pub struct SpawnEnemy {
    pub kind: EnemyKindId,
    pub position: Vec2,
    pub source: SpawnSource,
}

#[derive(Message, Clone, Copy, Debug)]
pub struct DamageEnemy {
    pub target: Entity,
    pub amount: i32,
    pub should_drop: bool,
}

#[derive(Message, Clone, Copy, Debug)]
pub struct EnemyDied {
    pub entity: Entity,
    pub kind: EnemyKindId,
    pub position: Vec2,
    pub should_drop: bool,
    pub coin_value: u32,
    pub drop_chance: f32,
}

/// Freeze (`true`) or release (`false`) every living enemy.
#[derive(Message, Clone, Copy, Debug)]
pub struct StunEnemies(pub bool);

/// Alive-enemy counts, split by whether the kind blocks a clear.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Census {
    pub non_inert: usize,
    pub inert: usize,
}

impl Census {
    pub fn count<'a>(it: impl IntoIterator<Item = (&'a EnemyLifeState, bool)>) -> Self {
        it.into_iter()
            .filter(|(life, _)| life.is_alive())
            .fold(Self::default(), |mut c, (_, inert)| {
                if inert {
                    c.inert += 1;
                } else {
                    c.non_inert += 1;
                }
                c
            })
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.non_inert + self.inert
    }

    /// Something is alive and all of it is inert.
    #[inline]
    pub fn only_inert(&self) -> bool {
        self.non_inert == 0 && self.inert > 0
    }
}

// -----------------------------------------------------------------------------
// Contact rule
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    PlayerDies,
    /// Player survives; the enemy takes `COUNTER_CONTACT_DAMAGE`.
    EnemyHurt,
}

/// Resolved by the player's mode flags only.
#[inline]
pub fn contact_outcome(mode: &PlayerMode) -> ContactOutcome {
    if mode.is_invincible() || mode.is_counter() {
        ContactOutcome::EnemyHurt
    } else {
        ContactOutcome::PlayerDies
    }
}

// -----------------------------------------------------------------------------
// Plugin wiring
// -----------------------------------------------------------------------------

pub fn plugin(app: &mut App) {
    app.add_message::<SpawnEnemy>()
        .add_message::<DamageEnemy>()
        .add_message::<EnemyDied>()
        .add_message::<StunEnemies>()
        .init_resource::<PlayerContacts>()
        .add_systems(OnEnter(GameState::InGame), reset_contacts);

    app.add_systems(
        Update,
        (
            apply_level_commands,
            finish_edge_entry,
            steer_enemies,
            despawn_escaped_critters,
        )
            .chain()
            .in_set(GameSet::Apply),
    )
    .add_systems(Update, spawn_enemies.in_set(GameSet::Spawn))
    .add_systems(
        Update,
        (apply_damage, apply_stun, enemy_death_progress, tick_hit_flash)
            .chain()
            .in_set(GameSet::Resolve),
    )
    .add_systems(Update, despawn_marked.in_set(GameSet::Present));

    app.add_systems(
        FixedPostUpdate,
        (track_player_contacts, resolve_player_contacts)
            .chain()
            .after(CollisionEventSystems)
            .run_if(in_state(GameState::InGame)),
    );
}

// -----------------------------------------------------------------------------
// Spawn
// -----------------------------------------------------------------------------

#[inline]
fn alive_enemy_layers() -> CollisionLayers {
    CollisionLayers::new(
        Layer::Enemy,
        [Layer::World, Layer::Player, Layer::PlayerBullet, Layer::Enemy],
    )
}

/// Everything but walls: edge spawners on their way in, and critters.
#[inline]
fn wall_passing_enemy_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Enemy, [Layer::Player, Layer::PlayerBullet])
}

/// Keep membership as "Enemy" but clear filters: no further interactions.
#[inline]
pub fn non_interacting_enemy_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Enemy, [] as [Layer; 0])
}

fn spawn_enemies(
    mut commands: Commands,
    config: Res<GameConfig>,
    map: Res<CurrentMap>,
    mut requests: MessageReader<SpawnEnemy>,
) {
    for req in requests.read() {
        let Some(def) = config.enemy(req.kind) else {
            warn!("spawn request for unknown enemy kind {:?}", req.kind);
            continue;
        };
        let behaviour = def.archetype.behaviour();
        let color = Color::srgb(def.color[0], def.color[1], def.color[2]);
        let layers = if behaviour.edge_spawn {
            wall_passing_enemy_layers()
        } else {
            alive_enemy_layers()
        };

        let mut e = commands.spawn((
            Name::new(def.name.clone()),
            Enemy,
            EnemyKind(def.id),
            Health::new(def.max_health),
            EnemyLifeState::Alive,
            Mobility::new(def.move_speed),
            EnemyTraits {
                behaviour,
                coin_value: def.coin_value,
                drop_chance: def.drop_chance,
                base_color: color,
            },
            HitFlash::default(),
            Sprite {
                color,
                custom_size: Some(Vec2::splat(def.radius * 2.0)),
                ..default()
            },
            Transform::from_translation(req.position.extend(1.0)),
            MapPart(map.id),
            WorldAnchored,
            DespawnOnExit(GameState::InGame),
        ));
        e.insert((
            RigidBody::Dynamic,
            LockedAxes::ROTATION_LOCKED,
            Collider::circle(def.radius),
            layers,
            CollisionEventsEnabled,
            LinearVelocity::ZERO,
            Occluder2d::circle(def.radius),
        ));

        match req.source {
            SpawnSource::Wave | SpawnSource::Replay => {
                e.insert(WaveIssued);
            }
            SpawnSource::Boss => {
                e.insert(BossSummoned);
            }
            SpawnSource::Critter => {}
        }
        if behaviour.edge_spawn {
            e.insert(EdgeEntering { radius: def.radius });
        }
        if behaviour.inert_under_clear {
            e.insert(InertUnderClear);
        }
        if def.archetype == EnemyArchetype::Critter {
            e.insert(Critter);
        }
    }
}

fn apply_level_commands(
    mut cmds: MessageReader<LevelCommand>,
    config: Res<GameConfig>,
    tunables: Res<Tunables>,
    map: Res<CurrentMap>,
    mut rng: ResMut<GameRng>,
    mut spawn: MessageWriter<SpawnEnemy>,
    mut q_inert: Query<(&mut Health, &EnemyLifeState), With<InertUnderClear>>,
) {
    for cmd in cmds.read() {
        match cmd {
            LevelCommand::WeakenInert => {
                let mut n = 0;
                for (mut hp, life) in &mut q_inert {
                    if life.is_alive() {
                        hp.weaken_to(1);
                        n += 1;
                    }
                }
                debug!("weakened {n} inert enemies");
            }
            LevelCommand::SpawnCritter => {
                let position = placement::edge_point(&map.frame(), tunables.edge_spawn_offset, &mut rng.0);
                info!("critter released at {position:?}");
                spawn.write(SpawnEnemy {
                    kind: config.critter_kind,
                    position,
                    source: SpawnSource::Critter,
                });
            }
            _ => {}
        }
    }
}

// -----------------------------------------------------------------------------
// Movement
// -----------------------------------------------------------------------------

/// Chase the player, chase loot (runners), or flee (critters). Anything still
/// entering from the edge heads for the map center first.
fn steer_enemies(
    map: Res<CurrentMap>,
    q_player: Query<(&Transform, &PlayerLife), With<Player>>,
    q_loot: Query<&Transform, (With<SecondaryTarget>, Without<Enemy>)>,
    mut q: Query<
        (
            &Transform,
            &Mobility,
            &EnemyTraits,
            &EnemyLifeState,
            Has<EdgeEntering>,
            &mut LinearVelocity,
        ),
        (With<Enemy>, With<Health>, Without<Player>),
    >,
) {
    let player = q_player
        .single()
        .ok()
        .filter(|(_, life)| life.is_alive())
        .map(|(tf, _)| tf.translation.truncate());

    for (tf, mobility, traits, life, entering, mut vel) in &mut q {
        if !life.is_alive() {
            vel.0 = Vec2::ZERO;
            continue;
        }
        let here = tf.translation.truncate();
        if entering {
            vel.0 = (map.origin - here).normalize_or_zero() * mobility.move_speed;
            continue;
        }
        let b = traits.behaviour;

        let target = if b.should_chase_secondary {
            q_loot
                .iter()
                .map(|t| t.translation.truncate())
                .min_by(|a, c| a.distance_squared(here).total_cmp(&c.distance_squared(here)))
                .or(player)
        } else {
            player
        };

        let dir = match target {
            Some(t) if b.should_flee => (here - t).normalize_or_zero(),
            Some(t) => (t - here).normalize_or_zero(),
            None => Vec2::ZERO,
        };
        vel.0 = dir * mobility.move_speed;
    }
}

/// Once the whole body is inside the walls, regular enemies collide with them again.
fn finish_edge_entry(
    mut commands: Commands,
    map: Res<CurrentMap>,
    mut q: Query<
        (
            Entity,
            &Transform,
            &EdgeEntering,
            &EnemyLifeState,
            &mut CollisionLayers,
            Has<Critter>,
        ),
        With<Enemy>,
    >,
) {
    let walkable = shifted(MapLayout::walkable(map.size), map.origin);
    for (e, tf, entering, life, mut layers, critter) in &mut q {
        if !life.is_alive() {
            continue;
        }
        if !walkable.inflate(-entering.radius).contains(tf.translation.truncate()) {
            continue;
        }
        commands.entity(e).remove::<EdgeEntering>();
        if !critter {
            *layers = alive_enemy_layers();
        }
    }
}

/// Critters that run past the map edge are gone for good (no reward).
fn despawn_escaped_critters(
    mut commands: Commands,
    tunables: Res<Tunables>,
    map: Res<CurrentMap>,
    q: Query<(Entity, &Transform), (With<Critter>, Without<PendingDespawn>)>,
) {
    let margin = tunables.edge_spawn_offset * 2.0;
    let outer = map.frame().rect().inflate(margin);
    for (e, tf) in &q {
        if !outer.contains(tf.translation.truncate()) {
            debug!("critter escaped");
            commands.entity(e).insert(PendingDespawn);
        }
    }
}

// -----------------------------------------------------------------------------
// Rules: damage, stun, death lifecycle
// -----------------------------------------------------------------------------

fn apply_damage(
    mut hits: MessageReader<DamageEnemy>,
    mut died: MessageWriter<EnemyDied>,
    mut q: Query<
        (
            &mut Health,
            &mut EnemyLifeState,
            &mut CollisionLayers,
            &mut HitFlash,
            &EnemyKind,
            &EnemyTraits,
            &Transform,
        ),
        Without<PendingDespawn>,
    >,
) {
    for hit in hits.read() {
        let Ok((mut hp, mut life, mut layers, mut flash, kind, traits, tf)) = q.get_mut(hit.target) else {
            continue;
        };
        match hp.take_damage(hit.amount) {
            DamageOutcome::Ignored => {}
            DamageOutcome::Hurt => flash.0 = Countdown::new(HIT_FLASH_SECS),
            DamageOutcome::Killed => {
                *life = EnemyLifeState::Dying {
                    timer: Timer::from_seconds(DEATH_ANIM_SECS, TimerMode::Once),
                };
                *layers = non_interacting_enemy_layers();
                died.write(EnemyDied {
                    entity: hit.target,
                    kind: kind.0,
                    position: tf.translation.truncate(),
                    should_drop: hit.should_drop,
                    coin_value: traits.coin_value,
                    drop_chance: traits.drop_chance,
                });
            }
        }
    }
}

fn apply_stun(mut signals: MessageReader<StunEnemies>, mut q: Query<&mut Mobility, With<Enemy>>) {
    let Some(StunEnemies(stunned)) = signals.read().last().copied() else {
        return;
    };
    for mut m in &mut q {
        if stunned {
            m.stun();
        } else {
            m.unstun();
        }
    }
}

/// Animate Dying state and mark PendingDespawn once finished.
fn enemy_death_progress(
    time: Res<Time>,
    mut commands: Commands,
    mut q: Query<
        (Entity, &mut EnemyLifeState, &mut Sprite, &mut Transform, &mut LinearVelocity),
        (With<Enemy>, Without<PendingDespawn>),
    >,
) {
    for (e, mut life, mut sprite, mut tf, mut vel) in &mut q {
        let EnemyLifeState::Dying { timer } = &mut *life else {
            continue;
        };
        vel.0 = Vec2::ZERO;
        timer.tick(time.delta());

        let dur = timer.duration().as_secs_f32().max(0.0001);
        let t = (timer.elapsed_secs() / dur).clamp(0.0, 1.0);
        tf.scale = Vec3::splat(1.0 - t);
        sprite.color.set_alpha(1.0 - t);

        if timer.is_finished() {
            *life = EnemyLifeState::Dead;
            commands.entity(e).insert(PendingDespawn);
        }
    }
}

fn tick_hit_flash(
    time: Res<Time>,
    mut q: Query<(&mut HitFlash, &EnemyTraits, &EnemyLifeState, &mut Sprite)>,
) {
    let dt = time.delta_secs();
    for (mut flash, traits, life, mut sprite) in &mut q {
        if !life.is_alive() {
            continue;
        }
        if flash.0.is_positive() {
            flash.0.tick_down(dt);
            sprite.color = Color::WHITE;
        } else {
            sprite.color = traits.base_color;
        }
    }
}

/// Enemies currently touching the player.
#[derive(Resource, Debug, Default)]
pub struct PlayerContacts {
    /// Enemy -> seconds until a counter-mode player hurts it again.
    touching: HashMap<Entity, f32>,
}

impl PlayerContacts {
    #[inline]
    pub fn contains(&self, enemy: Entity) -> bool {
        self.touching.contains_key(&enemy)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.touching.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.touching.is_empty()
    }
}

fn reset_contacts(mut contacts: ResMut<PlayerContacts>) {
    contacts.touching.clear();
}

/// Player/enemy pair of a collision, in that order.
#[inline]
fn player_enemy_pair(
    (c1, b1, c2, b2): (Entity, Option<Entity>, Entity, Option<Entity>),
    is_player: impl Fn(Entity) -> bool,
    is_enemy: impl Fn(Entity) -> bool,
) -> Option<(Entity, Entity)> {
    let a = b1.unwrap_or(c1);
    let b = b2.unwrap_or(c2);
    if is_player(a) && is_enemy(b) {
        Some((a, b))
    } else if is_player(b) && is_enemy(a) {
        Some((b, a))
    } else {
        None
    }
}

fn track_player_contacts(
    mut started: MessageReader<CollisionStart>,
    mut ended: MessageReader<CollisionEnd>,
    q_player: Query<(), With<Player>>,
    q_enemy: Query<(), With<Enemy>>,
    mut contacts: ResMut<PlayerContacts>,
) {
    let is_player = |e: Entity| q_player.contains(e);
    let is_enemy = |e: Entity| q_enemy.contains(e);

    for ev in started.read() {
        let pair = (ev.collider1, ev.body1, ev.collider2, ev.body2);
        if let Some((_, enemy)) = player_enemy_pair(pair, is_player, is_enemy) {
            contacts.touching.entry(enemy).or_insert(0.0);
        }
    }
    for ev in ended.read() {
        let pair = (ev.collider1, ev.body1, ev.collider2, ev.body2);
        if let Some((_, enemy)) = player_enemy_pair(pair, is_player, is_enemy) {
            contacts.touching.remove(&enemy);
        }
    }
}

/// Every step, each living enemy in contact either kills the player or, while
/// the player is protected, takes counter damage on a cadence.
fn resolve_player_contacts(
    time: Res<Time>,
    mut contacts: ResMut<PlayerContacts>,
    q_player: Query<(&PlayerMode, &PlayerLife), With<Player>>,
    q_enemy: Query<&EnemyLifeState, With<Enemy>>,
    mut kill: MessageWriter<KillPlayer>,
    mut damage: MessageWriter<DamageEnemy>,
) {
    contacts.touching.retain(|e, _| q_enemy.contains(*e));

    let Ok((mode, plife)) = q_player.single() else {
        return;
    };
    if !plife.is_alive() {
        return;
    }

    let dt = time.delta_secs();
    let outcome = contact_outcome(mode);
    for (&enemy, cooldown) in contacts.touching.iter_mut() {
        let Ok(elife) = q_enemy.get(enemy) else {
            continue;
        };
        if !elife.is_alive() {
            continue;
        }
        match outcome {
            ContactOutcome::PlayerDies => {
                kill.write(KillPlayer {
                    cause: KillCause::Contact,
                });
                return;
            }
            ContactOutcome::EnemyHurt => {
                *cooldown -= dt;
                if *cooldown <= 0.0 {
                    *cooldown = COUNTER_CONTACT_REPEAT_SECS;
                    damage.write(DamageEnemy {
                        target: enemy,
                        amount: COUNTER_CONTACT_DAMAGE,
                        should_drop: true,
                    });
                }
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Cleanup
// -----------------------------------------------------------------------------

/// Despawn entities marked for removal (enemies, bosses, pickups).
fn despawn_marked(mut commands: Commands, q: Query<Entity, With<PendingDespawn>>) {
    for e in &q {
        commands.entity(e).despawn();
    }
}

#[cfg(test)]
mod tests;
