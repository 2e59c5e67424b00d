//! World plugin: builds one map per level, owns the exit gate, the scripted move
//! between maps and the world re-root.
//!
//! Maps are laid out on a vertical strip. The live map always sits at the origin;
//! the next one is built one map-height above, the player is walked up into it,
//! the old map is destroyed and everything is shifted back down ("re-root").
//!
//! ```text
//!   BuildMap{level, origin}   spawn floor/walls/gate/anchors (+ boss and encounter)
//!   PlacePlayer               bounds + respawn point from the map, teleport player
//!   StartScriptedMove         walk the player to a point over N seconds
//!   DestroyOldMap             despawn every `MapPart` of the previous map
//!   ReRootWorld{shift}        shift every `WorldAnchored` transform
//! ```

use avian2d::collision::narrow_phase::CollisionEventSystems;
use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::config::GameConfig;
use crate::common::layers::Layer;
use crate::common::schedule::GameSet;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::boss;
use crate::plugins::encounter::{Arena, BossEncounter};
use crate::plugins::hud::AudioCue;
use crate::plugins::level::LevelCommand;
use crate::plugins::player::{Player, PlayerBounds, RespawnPoint};

const TILE: f32 = 64.0;
const WALL: f32 = 30.0;

/// Serial number of a built map; two builds of the same level get different ids.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapId(pub u32);

/// Belongs to (and dies with) a map.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapPart(pub MapId);

/// Lives in world space; shifted on re-root.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct WorldAnchored;

#[derive(Component, Debug, Clone, Copy)]
pub struct SpawnAnchor;

#[derive(Component, Debug, Default, Clone, Copy)]
pub struct ExitGate {
    pub open: bool,
}

#[derive(Message, Clone, Copy, Debug)]
pub struct ExitReached;

/// Center + size of a map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapFrame {
    pub origin: Vec2,
    pub size: Vec2,
}

impl MapFrame {
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::from_center_size(self.origin, self.size)
    }
}

/// Fixed per-map layout, relative to the map center.
#[derive(Debug, Clone, PartialEq)]
pub struct MapLayout {
    pub anchors: Vec<Vec2>,
    pub spawn: Vec2,
    pub exit: Vec2,
    pub arena: Rect,
    pub boss_at: Vec2,
}

impl MapLayout {
    pub fn new(size: Vec2) -> Self {
        let h = size * 0.5;
        let inner = h - Vec2::splat(WALL + TILE * 0.5);
        Self {
            anchors: vec![
                Vec2::new(-inner.x, inner.y),
                Vec2::new(inner.x, inner.y),
                Vec2::new(-inner.x, -inner.y),
                Vec2::new(inner.x, -inner.y),
                Vec2::new(-inner.x, 0.0),
                Vec2::new(inner.x, 0.0),
            ],
            spawn: Vec2::new(0.0, -h.y * 0.6),
            exit: Vec2::new(0.0, h.y - WALL),
            arena: Rect::from_center_size(Vec2::new(0.0, h.y * 0.1), size * 0.8),
            boss_at: Vec2::new(0.0, h.y * 0.4),
        }
    }

    /// Player movement rectangle inside the walls.
    pub fn walkable(size: Vec2) -> Rect {
        Rect::from_center_size(Vec2::ZERO, size - Vec2::splat(WALL * 2.0))
    }
}

/// The live map, as far as the rest of the core is concerned.
#[derive(Resource, Debug, Clone)]
pub struct CurrentMap {
    pub id: MapId,
    pub level: usize,
    pub origin: Vec2,
    pub size: Vec2,
    /// World-space spawn anchors.
    pub anchors: Vec<Vec2>,
    pub spawn: Vec2,
    /// Encounter entity, when the level is a boss level.
    pub encounter: Option<Entity>,
    previous: Option<MapId>,
    next_id: u32,
}

impl Default for CurrentMap {
    fn default() -> Self {
        let size = Tunables::default().map_size;
        let layout = MapLayout::new(size);
        Self {
            id: MapId(0),
            level: 0,
            origin: Vec2::ZERO,
            size,
            anchors: layout.anchors,
            spawn: layout.spawn,
            encounter: None,
            previous: None,
            next_id: 1,
        }
    }
}

impl CurrentMap {
    #[inline]
    pub fn frame(&self) -> MapFrame {
        MapFrame {
            origin: self.origin,
            size: self.size,
        }
    }

    #[inline]
    pub fn previous(&self) -> Option<MapId> {
        self.previous
    }

    /// Record a fresh map; the old one becomes `previous`.
    fn replace(&mut self, level: usize, origin: Vec2, size: Vec2) -> MapId {
        let id = MapId(self.next_id);
        self.next_id += 1;
        self.previous = Some(self.id);

        let layout = MapLayout::new(size);
        self.id = id;
        self.level = level;
        self.origin = origin;
        self.size = size;
        self.anchors = layout.anchors.iter().map(|a| origin + *a).collect();
        self.spawn = origin + layout.spawn;
        self.encounter = None;
        id
    }

    fn shift(&mut self, by: Vec2) {
        self.origin += by;
        self.spawn += by;
        for a in &mut self.anchors {
            *a += by;
        }
    }
}

/// Scripted walk of the player between two points. Movement input and bounds
/// clamping are suspended while this resource exists.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct ScriptedMove {
    pub from: Vec2,
    pub to: Vec2,
    pub secs: f32,
    pub elapsed: f32,
}

impl ScriptedMove {
    /// Position after `elapsed`; `secs == 0` snaps to the target.
    pub fn position(&self) -> Vec2 {
        let t = if self.secs <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.secs).clamp(0.0, 1.0)
        };
        self.from.lerp(self.to, t)
    }

    #[inline]
    pub fn finished(&self) -> bool {
        self.elapsed >= self.secs
    }
}

pub fn plugin(app: &mut App) {
    app.init_resource::<CurrentMap>()
        .add_message::<ExitReached>()
        .add_systems(OnEnter(GameState::InGame), reset_world)
        .add_systems(
            Update,
            (apply_map_commands, drive_scripted_move)
                .chain()
                .in_set(GameSet::Apply),
        )
        .add_systems(
            FixedPostUpdate,
            detect_exit
                .after(CollisionEventSystems)
                .run_if(in_state(GameState::InGame)),
        );
}

fn reset_world(mut commands: Commands) {
    commands.remove_resource::<ScriptedMove>();
}

// -----------------------------------------------------------------------------
// Command consumer
// -----------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
pub fn apply_map_commands(
    mut commands: Commands,
    mut cmds: MessageReader<LevelCommand>,
    config: Res<GameConfig>,
    tunables: Res<Tunables>,
    mut map: ResMut<CurrentMap>,
    mut bounds: ResMut<PlayerBounds>,
    mut respawn: ResMut<RespawnPoint>,
    mut audio: MessageWriter<AudioCue>,
    mut q_anchored: Query<&mut Transform, With<WorldAnchored>>,
    mut q_gate: Query<(&mut ExitGate, &mut CollisionLayers, &mut Sprite, &MapPart)>,
    q_parts: Query<(Entity, &MapPart)>,
    q_player: Query<Entity, With<Player>>,
    mut scripted: Option<ResMut<ScriptedMove>>,
) {
    for cmd in cmds.read() {
        match *cmd {
            LevelCommand::BuildMap { level, origin } => {
                let id = map.replace(level, origin, tunables.map_size);
                let encounter = build_map(&mut commands, &config, &map, id);
                map.encounter = encounter;
                info!("built map {id:?} for level {level} at {origin:?}");
            }
            LevelCommand::PlacePlayer { teleport } => {
                bounds.0 = shifted(MapLayout::walkable(map.size), map.origin);
                respawn.0 = map.spawn;
                if teleport {
                    for e in &q_player {
                        if let Ok(mut tf) = q_anchored.get_mut(e) {
                            tf.translation.x = map.spawn.x;
                            tf.translation.y = map.spawn.y;
                        }
                    }
                }
            }
            LevelCommand::OpenGate => {
                for (mut gate, mut layers, mut sprite, part) in &mut q_gate {
                    if part.0 != map.id || gate.open {
                        continue;
                    }
                    gate.open = true;
                    *layers = CollisionLayers::new(Layer::Gate, [Layer::Player]);
                    sprite.color = Color::srgb(0.3, 0.9, 0.45);
                    audio.write(AudioCue::GateOpen);
                }
            }
            LevelCommand::StartScriptedMove { to, secs } => {
                let from = q_player
                    .iter()
                    .next()
                    .and_then(|e| q_anchored.get(e).ok())
                    .map(|tf| tf.translation.truncate())
                    .unwrap_or(map.spawn);
                commands.insert_resource(ScriptedMove {
                    from,
                    to,
                    secs,
                    elapsed: 0.0,
                });
            }
            LevelCommand::DestroyOldMap => {
                let Some(old) = map.previous.take() else {
                    continue;
                };
                let mut n = 0;
                for (e, part) in &q_parts {
                    if part.0 == old {
                        commands.entity(e).despawn();
                        n += 1;
                    }
                }
                debug!("destroyed map {old:?} ({n} entities)");
            }
            LevelCommand::ReRootWorld { shift } => {
                for mut tf in &mut q_anchored {
                    tf.translation.x += shift.x;
                    tf.translation.y += shift.y;
                }
                map.shift(shift);
                respawn.0 += shift;
                bounds.0 = shifted(bounds.0, shift);
                if let Some(mv) = scripted.as_deref_mut() {
                    mv.from += shift;
                    mv.to += shift;
                }
                debug!("re-rooted world by {shift:?}");
            }
            _ => {}
        }
    }
}

/// `r` moved by `by`.
#[inline]
pub fn shifted(r: Rect, by: Vec2) -> Rect {
    Rect::from_corners(r.min + by, r.max + by)
}

// -----------------------------------------------------------------------------
// Map construction
// -----------------------------------------------------------------------------

/// Spawn one map. Returns the encounter entity for boss levels.
fn build_map(commands: &mut Commands, config: &GameConfig, map: &CurrentMap, id: MapId) -> Option<Entity> {
    let origin = map.origin;
    let layout = MapLayout::new(map.size);
    spawn_floor(commands, origin, map.size, id);
    spawn_walls(commands, origin, map.size, id);

    for (i, a) in map.anchors.iter().enumerate() {
        commands.spawn((
            Name::new(format!("SpawnAnchor{i}")),
            SpawnAnchor,
            Transform::from_translation(a.extend(0.0)),
            scoped(id),
        ));
    }

    commands.spawn((
        Name::new("ExitGate"),
        ExitGate::default(),
        Sprite::from_color(Color::srgb(0.45, 0.2, 0.2), Vec2::new(TILE * 1.5, WALL)),
        Transform::from_translation((origin + layout.exit).extend(0.5)),
        RigidBody::Static,
        Collider::rectangle(TILE * 1.5, WALL),
        Sensor,
        CollisionLayers::new(Layer::Gate, [] as [Layer; 0]),
        CollisionEventsEnabled,
        scoped(id),
    ));

    let boss_kind = config.level(map.level).and_then(|l| l.boss)?;
    let Some(profile) = config.boss(boss_kind) else {
        warn!("level {} names boss {boss_kind:?} with no profile", map.level);
        return None;
    };

    boss::spawn_boss(commands, profile, origin + layout.boss_at, layout.arena, id);
    let arena = Arena {
        bounds: layout.arena,
        respawn_point: layout.spawn,
    };
    let encounter = commands
        .spawn((
            Name::new(format!("Encounter({})", profile.name)),
            BossEncounter::new(profile, arena),
            scoped(id),
        ))
        .id();
    Some(encounter)
}

/// Tags shared by every entity that belongs to map `id`.
pub fn scoped(id: MapId) -> (MapPart, WorldAnchored, DespawnOnExit<GameState>) {
    (MapPart(id), WorldAnchored, DespawnOnExit(GameState::InGame))
}

fn spawn_walls(commands: &mut Commands, origin: Vec2, size: Vec2, id: MapId) {
    let wall_color = Color::srgb(0.25, 0.27, 0.33);
    let wall_layers = CollisionLayers::new(
        Layer::World,
        [
            Layer::Player,
            Layer::Enemy,
            Layer::PlayerBullet,
            Layer::EnemyBullet,
        ],
    );
    let h = size * 0.5;

    let walls = [
        ("WallTop", Vec2::new(0.0, h.y - WALL * 0.5), Vec2::new(size.x, WALL)),
        ("WallBottom", Vec2::new(0.0, -h.y + WALL * 0.5), Vec2::new(size.x, WALL)),
        ("WallLeft", Vec2::new(-h.x + WALL * 0.5, 0.0), Vec2::new(WALL, size.y)),
        ("WallRight", Vec2::new(h.x - WALL * 0.5, 0.0), Vec2::new(WALL, size.y)),
    ];

    for (name, at, extent) in walls {
        commands.spawn((
            Name::new(name),
            Sprite::from_color(wall_color, extent),
            Transform::from_translation((origin + at).extend(0.0)),
            RigidBody::Static,
            Collider::rectangle(extent.x, extent.y),
            wall_layers,
            scoped(id),
        ));
    }
}

/// Checkerboard floor from solid-color sprites; no assets needed.
fn spawn_floor(commands: &mut Commands, origin: Vec2, size: Vec2, id: MapId) {
    let nx = (size.x / TILE) as i32 / 2;
    let ny = (size.y / TILE) as i32 / 2;

    (-ny..ny)
        .flat_map(|y| (-nx..nx).map(move |x| (x, y)))
        .for_each(|(x, y)| {
            let at = origin + Vec2::new((x as f32 + 0.5) * TILE, (y as f32 + 0.5) * TILE);
            let color = if (x + y).rem_euclid(2) == 0 {
                Color::srgb(0.14, 0.14, 0.16)
            } else {
                Color::srgb(0.12, 0.12, 0.14)
            };
            commands.spawn((
                Sprite::from_color(color, Vec2::splat(TILE)),
                Transform::from_translation(at.extend(-1.0)),
                scoped(id),
            ));
        });
}

// -----------------------------------------------------------------------------
// Scripted move + exit
// -----------------------------------------------------------------------------

fn drive_scripted_move(
    mut commands: Commands,
    time: Res<Time>,
    scripted: Option<ResMut<ScriptedMove>>,
    mut q_player: Query<&mut Transform, With<Player>>,
) {
    let Some(mut mv) = scripted else {
        return;
    };
    mv.elapsed += time.delta_secs();
    let at = mv.position();
    for mut tf in &mut q_player {
        tf.translation.x = at.x;
        tf.translation.y = at.y;
    }
    if mv.finished() {
        commands.remove_resource::<ScriptedMove>();
    }
}

fn detect_exit(
    mut started: MessageReader<CollisionStart>,
    q_player: Query<(), With<Player>>,
    q_gate: Query<&ExitGate>,
    mut reached: MessageWriter<ExitReached>,
) {
    for ev in started.read() {
        let a = ev.body1.unwrap_or(ev.collider1);
        let b = ev.body2.unwrap_or(ev.collider2);
        let gate = if q_player.contains(a) {
            ev.collider2
        } else if q_player.contains(b) {
            ev.collider1
        } else {
            continue;
        };
        if q_gate.get(gate).is_ok_and(|g| g.open) {
            info!("player reached the exit");
            reached.write(ExitReached);
        }
    }
}
