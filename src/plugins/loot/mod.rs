//! Loot plugin: drops, pickups, the held item and the shop.
//!
//! ```text
//! Input:           use_held_item        Space -> Nuke / Shield / Zombie / Freeze
//! Apply:           spawn_shop           LevelCommand::SpawnShop -> one stand per slot
//! Resolve:         roll_drops           EnemyDied -> coins, maybe a pickup
//!                  tick_pickups         timed pickups expire
//!                  tick_freeze, sync_zombie_mode, recompute_loadout
//! FixedPostUpdate: collect_pickups      player touches pickup
//! ```

pub mod items;
pub mod shop;

use avian2d::collision::narrow_phase::CollisionEventSystems;
use avian2d::prelude::*;
use bevy::prelude::*;
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};

use crate::common::config::{GameConfig, LootEntry, LootItem, UpgradeSlot};
use crate::common::layers::Layer;
use crate::common::rng::GameRng;
use crate::common::schedule::GameSet;
use crate::common::sequence::Countdown;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::enemies::{EnemyDied, PendingDespawn};
use crate::plugins::hud::AudioCue;
use crate::plugins::level::Progress;
use crate::plugins::player::Player;
use crate::plugins::world::{self, CurrentMap, MapId};

pub use items::FreezeTimer;

const PICKUP_RADIUS: f32 = 9.0;

/// Something runners chase instead of the player.
#[derive(Component, Debug, Clone, Copy)]
pub struct SecondaryTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupKind {
    Loot(LootItem),
    /// Dropped by a defeated boss; collecting it starts the post-victory sequence.
    Victory,
    /// Shop stand selling the next tier of a slot.
    Shop(UpgradeSlot),
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pickup {
    pub kind: PickupKind,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct PickupLifetime(pub Countdown);

#[derive(Message, Clone, Copy, Debug)]
pub struct VictoryLootCollected;

/// Weighted pick over the table. An empty table gives nothing; a table with no
/// usable weight falls back to its first entry.
pub fn pick_weighted_drop(table: &[LootEntry], rng: &mut impl Rng) -> Option<LootItem> {
    let first = table.first()?;
    match WeightedIndex::new(table.iter().map(|e| e.weight)) {
        Ok(dist) => Some(table[dist.sample(rng)].item),
        Err(err) => {
            debug!("loot table unusable ({err}), falling back to the first entry");
            Some(first.item)
        }
    }
}

/// Apply a collected loot item to the run.
pub fn apply_loot(progress: &mut Progress, item: LootItem) {
    match item {
        LootItem::Coin(n) => progress.coins = progress.coins.saturating_add(n),
        LootItem::Life => progress.lives = progress.lives.saturating_add(1),
        LootItem::Item(kind) => progress.held_item = Some(kind),
    }
}

pub fn plugin(app: &mut App) {
    app.add_message::<VictoryLootCollected>()
        .init_resource::<FreezeTimer>()
        .add_systems(OnEnter(GameState::InGame), items::reset_freeze)
        .add_systems(Update, items::use_held_item.after(crate::plugins::player::gather_input).in_set(GameSet::Input))
        .add_systems(Update, shop::spawn_shop.in_set(GameSet::Apply))
        .add_systems(
            Update,
            (
                roll_drops,
                tick_pickups,
                items::tick_freeze,
                items::sync_zombie_mode,
                shop::recompute_loadout,
            )
                .chain()
                .in_set(GameSet::Resolve),
        )
        .add_systems(
            FixedPostUpdate,
            collect_pickups
                .after(CollisionEventSystems)
                .run_if(in_state(GameState::InGame)),
        );
}

fn pickup_color(kind: PickupKind) -> Color {
    match kind {
        PickupKind::Loot(LootItem::Coin(_)) => Color::srgb(0.95, 0.8, 0.2),
        PickupKind::Loot(LootItem::Life) => Color::srgb(0.9, 0.3, 0.4),
        PickupKind::Loot(LootItem::Item(_)) => Color::srgb(0.4, 0.7, 0.95),
        PickupKind::Victory => Color::srgb(1.0, 0.95, 0.6),
        PickupKind::Shop(_) => Color::srgb(0.6, 0.9, 0.6),
    }
}

/// Spawn a pickup belonging to map `id`. `lifetime` of `None` never expires.
pub fn spawn_pickup(
    commands: &mut Commands,
    kind: PickupKind,
    position: Vec2,
    id: MapId,
    lifetime: Option<f32>,
) -> Entity {
    let mut e = commands.spawn((
        Name::new(format!("Pickup({kind:?})")),
        Pickup { kind },
        Sprite::from_color(pickup_color(kind), Vec2::splat(PICKUP_RADIUS * 2.0)),
        Transform::from_translation(position.extend(0.8)),
        RigidBody::Static,
        Collider::circle(PICKUP_RADIUS),
        Sensor,
        CollisionLayers::new(Layer::Pickup, [Layer::Player]),
        CollisionEventsEnabled,
        world::scoped(id),
    ));
    if let Some(secs) = lifetime {
        e.insert(PickupLifetime(Countdown::new(secs)));
    }
    if matches!(kind, PickupKind::Loot(_)) {
        e.insert(SecondaryTarget);
    }
    e.id()
}

pub fn spawn_victory_loot(commands: &mut Commands, position: Vec2, id: MapId) -> Entity {
    spawn_pickup(commands, PickupKind::Victory, position, id, None)
}

/// Coins for every rewarded kill, plus a loot roll.
fn roll_drops(
    mut commands: Commands,
    config: Res<GameConfig>,
    tunables: Res<Tunables>,
    map: Res<CurrentMap>,
    mut rng: ResMut<GameRng>,
    mut progress: ResMut<Progress>,
    mut died: MessageReader<EnemyDied>,
) {
    for ev in died.read() {
        if !ev.should_drop {
            continue;
        }
        progress.coins = progress.coins.saturating_add(ev.coin_value);
        if rng.0.r#gen::<f32>() >= ev.drop_chance {
            continue;
        }
        let Some(item) = pick_weighted_drop(&config.loot, &mut rng.0) else {
            warn!("loot table is empty");
            continue;
        };
        debug!("{:?} dropped {item:?}", ev.kind);
        spawn_pickup(
            &mut commands,
            PickupKind::Loot(item),
            ev.position,
            map.id,
            Some(tunables.pickup_lifetime_secs),
        );
    }
}

fn tick_pickups(
    mut commands: Commands,
    time: Res<Time>,
    mut q: Query<(Entity, &mut PickupLifetime), Without<PendingDespawn>>,
) {
    let dt = time.delta_secs();
    for (e, mut life) in &mut q {
        life.0.tick_down(dt);
        if life.0.expired() {
            commands.entity(e).insert(PendingDespawn);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn collect_pickups(
    mut commands: Commands,
    config: Res<GameConfig>,
    mut progress: ResMut<Progress>,
    mut started: MessageReader<CollisionStart>,
    q_player: Query<(), With<Player>>,
    q_pickup: Query<&Pickup, Without<PendingDespawn>>,
    mut victory: MessageWriter<VictoryLootCollected>,
    mut audio: MessageWriter<AudioCue>,
) {
    let mut taken: Vec<Entity> = Vec::new();
    for ev in started.read() {
        let a = ev.body1.unwrap_or(ev.collider1);
        let b = ev.body2.unwrap_or(ev.collider2);
        let item = if q_player.contains(a) {
            ev.collider2
        } else if q_player.contains(b) {
            ev.collider1
        } else {
            continue;
        };
        if taken.contains(&item) {
            continue;
        }
        let Ok(pickup) = q_pickup.get(item) else {
            continue;
        };

        let collected = match pickup.kind {
            PickupKind::Loot(loot) => {
                apply_loot(&mut progress, loot);
                true
            }
            PickupKind::Victory => {
                victory.write(VictoryLootCollected);
                true
            }
            PickupKind::Shop(slot) => match shop::try_buy(&mut progress, &config.upgrades, slot) {
                Some(tier) => {
                    info!("bought {}", tier.name);
                    true
                }
                None => {
                    debug!("cannot afford {slot:?}");
                    false
                }
            },
        };
        if collected {
            taken.push(item);
            audio.write(AudioCue::Pickup);
            commands.entity(item).insert(PendingDespawn);
        }
    }
}
