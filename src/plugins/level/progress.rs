use bevy::prelude::*;

use crate::common::config::{GameConfig, HeldItemKind, UpgradeSlot};

/// Counters that outlive a level: lives, coins, cleared areas, upgrades and the
/// held item. Written to the save slot on every transition.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct Progress {
    pub level_index: usize,
    pub lives: u32,
    pub coins: u32,
    pub areas_cleared: u32,
    /// Bought tiers per `UpgradeSlot::index`; 0 means none.
    pub upgrades: [u8; 3],
    pub held_item: Option<HeldItemKind>,
    pub zombie_mode: bool,
    pub game_over: bool,
}

impl Progress {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            level_index: 0,
            lives: config.starting_lives,
            coins: config.starting_coins,
            areas_cleared: 0,
            upgrades: [0; 3],
            held_item: None,
            zombie_mode: false,
            game_over: false,
        }
    }

    #[inline]
    pub fn upgrade(&self, slot: UpgradeSlot) -> u8 {
        self.upgrades[slot.index()]
    }

    /// Deduct `price` if affordable.
    pub fn spend(&mut self, price: u32) -> bool {
        match self.coins.checked_sub(price) {
            Some(left) => {
                self.coins = left;
                true
            }
            None => false,
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new(&GameConfig::default())
    }
}
