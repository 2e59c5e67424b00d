//! Data-driven game catalog: enemy kinds, levels and their waves, bosses, loot,
//! upgrades, shop levels.
//!
//! Loaded from RON (or the built-in default) and validated once at startup.
//! Everything downstream treats a validated catalog as an invariant: wave data
//! never names an enemy kind that does not exist.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse game config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("game config has no levels")]
    NoLevels,
    #[error("level {level} wave {wave} references unknown enemy kind {kind:?}")]
    UnknownEnemy {
        level: usize,
        wave: usize,
        kind: EnemyKindId,
    },
    #[error("boss {boss:?} summons unknown enemy kind {kind:?}")]
    UnknownSummon { boss: BossKind, kind: EnemyKindId },
    #[error("level {level} references boss {boss:?} which has no profile")]
    UnknownBoss { level: usize, boss: BossKind },
    #[error("boss {boss:?} summon threshold {threshold} is outside (0, 1)")]
    BadThreshold { boss: BossKind, threshold: f32 },
}

/// Identity of an enemy type. Also the origin token used to recreate an enemy
/// after a respawn rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyKindId(pub u16);

/// Closed set of enemy behaviours.
///
/// Flags are resolved here rather than stored per kind, so two kinds sharing an
/// archetype can never disagree about, say, whether they block a wave clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyArchetype {
    /// Walks straight at the player.
    Grunt,
    /// Goes after dropped loot when there is any, the player otherwise.
    Runner,
    /// Flies in from the map edge.
    Flyer,
    /// Stationary hazard; never blocks a wave clear.
    Spikeball,
    /// Runs away from the player; the side-event reward.
    Critter,
    /// Boss helper.
    Minion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Behaviour {
    pub should_flee: bool,
    pub should_chase_secondary: bool,
    pub edge_spawn: bool,
    pub inert_under_clear: bool,
}

impl EnemyArchetype {
    pub fn behaviour(self) -> Behaviour {
        match self {
            Self::Grunt | Self::Minion => Behaviour::default(),
            Self::Runner => Behaviour {
                should_chase_secondary: true,
                ..default()
            },
            Self::Flyer => Behaviour {
                edge_spawn: true,
                ..default()
            },
            Self::Spikeball => Behaviour {
                inert_under_clear: true,
                ..default()
            },
            Self::Critter => Behaviour {
                should_flee: true,
                edge_spawn: true,
                ..default()
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyDef {
    pub id: EnemyKindId,
    pub name: String,
    pub archetype: EnemyArchetype,
    pub max_health: i32,
    pub move_speed: f32,
    pub radius: f32,
    pub color: [f32; 3],
    /// Coins awarded on death.
    pub coin_value: u32,
    /// Probability of rolling the loot table on death.
    pub drop_chance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnGroup {
    pub enemy: EnemyKindId,
    pub count: u32,
    /// Seconds between consecutive spawns of this group.
    pub rate_secs: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveDef {
    pub groups: Vec<SpawnGroup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossKind {
    /// Summoner. Victory: carried off-screen by a pursuing actor.
    Warden,
    /// Teleporter. Victory: fade to black.
    Phantom,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FirePattern {
    /// `count` bullets evenly spread around the boss.
    Radial { count: u8 },
    /// `count` bullets fanned around the direction to the player.
    Aimed { count: u8, spread_deg: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VictoryVariant {
    CarryOff,
    FadeOut,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossProfile {
    pub kind: BossKind,
    pub name: String,
    pub max_health: i32,
    pub move_speed: f32,
    pub radius: f32,
    pub intro_secs: f32,
    pub idle_secs: f32,
    pub move_secs: f32,
    pub attack_secs: f32,
    pub teleport_secs: f32,
    /// Checked first.
    pub special_chance: f32,
    /// Stacked on top of `special_chance`; the rest of the mass is movement.
    pub attack_chance: f32,
    pub fire_interval: f32,
    pub pattern: FirePattern,
    /// Health fractions, any order; normalised to descending on spawn.
    pub summon_thresholds: Vec<f32>,
    pub summon_kind: EnemyKindId,
    pub summon_count: u32,
    pub death_beats: u32,
    pub death_beat_secs: f32,
    pub victory: VictoryVariant,
    pub music: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeldItemKind {
    /// Kills every non-boss enemy, no drops.
    Nuke,
    /// Invincibility window.
    Shield,
    /// Counter mode window: touching enemies hurts them instead.
    Zombie,
    /// Stuns every enemy for the effect window.
    Freeze,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LootItem {
    Coin(u32),
    Life,
    Item(HeldItemKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LootEntry {
    pub item: LootItem,
    pub weight: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeSlot {
    Gun,
    Boots,
    Ammo,
}

impl UpgradeSlot {
    pub const ALL: [UpgradeSlot; 3] = [UpgradeSlot::Gun, UpgradeSlot::Boots, UpgradeSlot::Ammo];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::Gun => 0,
            Self::Boots => 1,
            Self::Ammo => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeTier {
    pub name: String,
    pub price: u32,
    /// Gun: fire cooldown multiplier. Boots: speed multiplier. Ammo: bullet damage.
    pub value: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpgradeCatalog {
    pub gun: Vec<UpgradeTier>,
    pub boots: Vec<UpgradeTier>,
    pub ammo: Vec<UpgradeTier>,
}

impl UpgradeCatalog {
    pub fn tiers(&self, slot: UpgradeSlot) -> &[UpgradeTier] {
        match slot {
            UpgradeSlot::Gun => &self.gun,
            UpgradeSlot::Boots => &self.boots,
            UpgradeSlot::Ammo => &self.ammo,
        }
    }

    /// Tier bought at `level` (level 0 means nothing bought).
    pub fn owned(&self, slot: UpgradeSlot, level: u8) -> Option<&UpgradeTier> {
        (level as usize)
            .checked_sub(1)
            .and_then(|i| self.tiers(slot).get(i))
    }

    pub fn next(&self, slot: UpgradeSlot, level: u8) -> Option<&UpgradeTier> {
        self.tiers(slot).get(level as usize)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    pub duration_secs: f32,
    pub waves: Vec<WaveDef>,
    #[serde(default)]
    pub boss: Option<BossKind>,
    #[serde(default)]
    pub critter_chance: f32,
}

#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub starting_lives: u32,
    pub starting_coins: u32,
    pub enemies: Vec<EnemyDef>,
    pub levels: Vec<LevelConfig>,
    pub bosses: Vec<BossProfile>,
    pub loot: Vec<LootEntry>,
    pub upgrades: UpgradeCatalog,
    /// Level indices after which a shop appears.
    pub shop_levels: Vec<usize>,
    pub critter_kind: EnemyKindId,
}

impl GameConfig {
    pub fn from_ron_str(src: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(src)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.levels.is_empty() {
            return Err(ConfigError::NoLevels);
        }

        for (level, cfg) in self.levels.iter().enumerate() {
            for (wave, def) in cfg.waves.iter().enumerate() {
                if let Some(group) = def.groups.iter().find(|g| self.enemy(g.enemy).is_none()) {
                    return Err(ConfigError::UnknownEnemy {
                        level,
                        wave,
                        kind: group.enemy,
                    });
                }
            }
            if let Some(boss) = cfg.boss {
                if self.boss(boss).is_none() {
                    return Err(ConfigError::UnknownBoss { level, boss });
                }
            }
        }

        for profile in &self.bosses {
            if self.enemy(profile.summon_kind).is_none() {
                return Err(ConfigError::UnknownSummon {
                    boss: profile.kind,
                    kind: profile.summon_kind,
                });
            }
            if let Some(&t) = profile
                .summon_thresholds
                .iter()
                .find(|t| !(**t > 0.0 && **t < 1.0))
            {
                return Err(ConfigError::BadThreshold {
                    boss: profile.kind,
                    threshold: t,
                });
            }
        }

        Ok(())
    }

    pub fn enemy(&self, id: EnemyKindId) -> Option<&EnemyDef> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn boss(&self, kind: BossKind) -> Option<&BossProfile> {
        self.bosses.iter().find(|b| b.kind == kind)
    }

    pub fn level(&self, index: usize) -> Option<&LevelConfig> {
        self.levels.get(index)
    }

    #[inline]
    pub fn is_shop_level(&self, index: usize) -> bool {
        self.shop_levels.contains(&index)
    }
}

pub const GRUNT: EnemyKindId = EnemyKindId(0);
pub const RUNNER: EnemyKindId = EnemyKindId(1);
pub const BAT: EnemyKindId = EnemyKindId(2);
pub const SPIKEBALL: EnemyKindId = EnemyKindId(3);
pub const CRITTER: EnemyKindId = EnemyKindId(4);
pub const IMP: EnemyKindId = EnemyKindId(5);

fn enemy(
    id: EnemyKindId,
    name: &str,
    archetype: EnemyArchetype,
    max_health: i32,
    move_speed: f32,
    color: [f32; 3],
) -> EnemyDef {
    EnemyDef {
        id,
        name: name.into(),
        archetype,
        max_health,
        move_speed,
        radius: 12.0,
        color,
        coin_value: 1,
        drop_chance: 0.08,
    }
}

fn group(enemy: EnemyKindId, count: u32, rate_secs: f32) -> SpawnGroup {
    SpawnGroup {
        enemy,
        count,
        rate_secs,
    }
}

fn tier(name: &str, price: u32, value: f32) -> UpgradeTier {
    UpgradeTier {
        name: name.into(),
        price,
        value,
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        let mut critter = enemy(CRITTER, "Gopher", EnemyArchetype::Critter, 1, 140.0, [0.7, 0.5, 0.3]);
        critter.coin_value = 5;
        critter.drop_chance = 1.0;

        Self {
            starting_lives: 3,
            starting_coins: 0,
            enemies: vec![
                enemy(GRUNT, "Orc", EnemyArchetype::Grunt, 1, 60.0, [0.4, 0.7, 0.3]),
                enemy(RUNNER, "Ogre", EnemyArchetype::Runner, 3, 95.0, [0.6, 0.3, 0.6]),
                enemy(BAT, "Bat", EnemyArchetype::Flyer, 1, 110.0, [0.3, 0.3, 0.5]),
                enemy(SPIKEBALL, "Spikeball", EnemyArchetype::Spikeball, 4, 0.0, [0.8, 0.8, 0.2]),
                critter,
                enemy(IMP, "Imp", EnemyArchetype::Minion, 1, 120.0, [0.9, 0.3, 0.2]),
            ],
            levels: vec![
                LevelConfig {
                    duration_secs: 60.0,
                    waves: vec![
                        WaveDef { groups: vec![group(GRUNT, 4, 0.8)] },
                        WaveDef { groups: vec![group(GRUNT, 6, 0.6)] },
                    ],
                    boss: None,
                    critter_chance: 0.0,
                },
                LevelConfig {
                    duration_secs: 75.0,
                    waves: vec![
                        WaveDef { groups: vec![group(GRUNT, 5, 0.6), group(BAT, 3, 0.9)] },
                        WaveDef { groups: vec![group(RUNNER, 3, 1.2), group(GRUNT, 6, 0.5)] },
                    ],
                    boss: None,
                    critter_chance: 0.4,
                },
                LevelConfig {
                    duration_secs: 90.0,
                    waves: vec![
                        WaveDef { groups: vec![group(SPIKEBALL, 2, 1.0), group(GRUNT, 6, 0.5)] },
                        WaveDef { groups: vec![group(BAT, 6, 0.4), group(RUNNER, 4, 0.8)] },
                        WaveDef { groups: vec![group(GRUNT, 10, 0.3)] },
                    ],
                    boss: None,
                    critter_chance: 0.5,
                },
                LevelConfig {
                    duration_secs: 0.0,
                    waves: Vec::new(),
                    boss: Some(BossKind::Warden),
                    critter_chance: 0.0,
                },
                LevelConfig {
                    duration_secs: 90.0,
                    waves: vec![
                        WaveDef { groups: vec![group(SPIKEBALL, 3, 0.8), group(RUNNER, 5, 0.6)] },
                        WaveDef { groups: vec![group(BAT, 10, 0.3), group(GRUNT, 8, 0.3)] },
                    ],
                    boss: None,
                    critter_chance: 0.5,
                },
                LevelConfig {
                    duration_secs: 0.0,
                    waves: Vec::new(),
                    boss: Some(BossKind::Phantom),
                    critter_chance: 0.0,
                },
            ],
            bosses: vec![
                BossProfile {
                    kind: BossKind::Warden,
                    name: "The Warden".into(),
                    max_health: 100,
                    move_speed: 70.0,
                    radius: 28.0,
                    intro_secs: 2.5,
                    idle_secs: 1.2,
                    move_secs: 2.0,
                    attack_secs: 2.5,
                    teleport_secs: 0.0,
                    special_chance: 0.0,
                    attack_chance: 0.55,
                    fire_interval: 0.45,
                    pattern: FirePattern::Aimed { count: 3, spread_deg: 20.0 },
                    summon_thresholds: vec![0.5, 0.4, 0.3, 0.2, 0.1],
                    summon_kind: IMP,
                    summon_count: 3,
                    death_beats: 5,
                    death_beat_secs: 0.4,
                    victory: VictoryVariant::CarryOff,
                    music: "warden_theme".into(),
                },
                BossProfile {
                    kind: BossKind::Phantom,
                    name: "The Phantom".into(),
                    max_health: 140,
                    move_speed: 90.0,
                    radius: 24.0,
                    intro_secs: 3.0,
                    idle_secs: 0.9,
                    move_secs: 1.5,
                    attack_secs: 2.0,
                    teleport_secs: 0.6,
                    special_chance: 0.25,
                    attack_chance: 0.45,
                    fire_interval: 0.6,
                    pattern: FirePattern::Radial { count: 12 },
                    summon_thresholds: vec![0.5, 0.25],
                    summon_kind: IMP,
                    summon_count: 4,
                    death_beats: 6,
                    death_beat_secs: 0.35,
                    victory: VictoryVariant::FadeOut,
                    music: "phantom_theme".into(),
                },
            ],
            loot: vec![
                LootEntry { item: LootItem::Coin(1), weight: 60 },
                LootEntry { item: LootItem::Coin(5), weight: 15 },
                LootEntry { item: LootItem::Life, weight: 5 },
                LootEntry { item: LootItem::Item(HeldItemKind::Nuke), weight: 6 },
                LootEntry { item: LootItem::Item(HeldItemKind::Shield), weight: 8 },
                LootEntry { item: LootItem::Item(HeldItemKind::Zombie), weight: 6 },
                LootEntry { item: LootItem::Item(HeldItemKind::Freeze), weight: 6 },
            ],
            upgrades: UpgradeCatalog {
                gun: vec![tier("Rapid Gun", 10, 0.75), tier("Gatling", 20, 0.5), tier("Hellfire", 30, 0.35)],
                boots: vec![tier("Boots", 8, 1.15), tier("Spurs", 18, 1.3)],
                ammo: vec![tier("Lead Shot", 15, 2.0), tier("Silver Shot", 30, 3.0)],
            },
            shop_levels: vec![1, 4],
            critter_kind: CRITTER,
        }
    }
}
