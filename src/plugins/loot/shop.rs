//! Shop stands and the upgrade-derived loadout.

use bevy::prelude::*;

use super::{PickupKind, spawn_pickup};
use crate::common::config::{GameConfig, UpgradeCatalog, UpgradeSlot, UpgradeTier};
use crate::plugins::hud::{HudCommand, Panel};
use crate::plugins::level::{LevelCommand, Progress};
use crate::plugins::player::Loadout;
use crate::plugins::world::CurrentMap;

const STAND_SPACING: f32 = 80.0;

/// Buy the next tier of `slot` if there is one and it is affordable.
pub fn try_buy<'a>(progress: &mut Progress, catalog: &'a UpgradeCatalog, slot: UpgradeSlot) -> Option<&'a UpgradeTier> {
    let tier = catalog.next(slot, progress.upgrade(slot))?;
    if !progress.spend(tier.price) {
        return None;
    }
    progress.upgrades[slot.index()] += 1;
    Some(tier)
}

/// Loadout for the bought tiers. Missing tiers leave the base value.
pub fn loadout_for(upgrades: [u8; 3], catalog: &UpgradeCatalog) -> Loadout {
    let value = |slot: UpgradeSlot| catalog.owned(slot, upgrades[slot.index()]).map(|t| t.value);
    let base = Loadout::default();
    Loadout {
        fire_cooldown: value(UpgradeSlot::Gun).map_or(base.fire_cooldown, |m| Loadout::BASE_FIRE_COOLDOWN * m),
        speed_mult: value(UpgradeSlot::Boots).unwrap_or(base.speed_mult),
        damage: value(UpgradeSlot::Ammo).map_or(base.damage, |d| d.round() as i32),
    }
}

pub(super) fn spawn_shop(
    mut commands: Commands,
    mut cmds: MessageReader<LevelCommand>,
    config: Res<GameConfig>,
    map: Res<CurrentMap>,
    progress: Res<Progress>,
    mut hud: MessageWriter<HudCommand>,
) {
    for cmd in cmds.read() {
        if *cmd != LevelCommand::SpawnShop {
            continue;
        }
        let mut stands = 0;
        for (i, slot) in UpgradeSlot::ALL.into_iter().enumerate() {
            if config.upgrades.next(slot, progress.upgrade(slot)).is_none() {
                continue;
            }
            let at = map.origin + Vec2::new((i as f32 - 1.0) * STAND_SPACING, 0.0);
            spawn_pickup(&mut commands, PickupKind::Shop(slot), at, map.id, None);
            stands += 1;
        }
        info!("shop open with {stands} stands");
        hud.write(HudCommand::Panel {
            panel: Panel::Shop,
            visible: true,
        });
    }
}

/// Also covers a load: restored upgrade levels flow back into the loadout here.
pub(super) fn recompute_loadout(config: Res<GameConfig>, progress: Res<Progress>, mut loadout: ResMut<Loadout>) {
    if !progress.is_changed() {
        return;
    }
    loadout.set_if_neq(loadout_for(progress.upgrades, &config.upgrades));
}
