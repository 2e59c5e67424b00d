//! Held item effects.

use bevy::prelude::*;

use crate::common::config::HeldItemKind;
use crate::common::sequence::Countdown;
use crate::common::tunables::Tunables;
use crate::plugins::enemies::{DamageEnemy, Enemy, EnemyLifeState, Health, StunEnemies};
use crate::plugins::level::Progress;
use crate::plugins::player::{InputLock, Player, PlayerIntents, PlayerLife, PlayerMode};

/// Time left on a running freeze.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct FreezeTimer(pub Option<Countdown>);

pub(super) fn reset_freeze(mut freeze: ResMut<FreezeTimer>) {
    freeze.0 = None;
}

#[allow(clippy::too_many_arguments)]
pub(super) fn use_held_item(
    tunables: Res<Tunables>,
    lock: Res<InputLock>,
    mut intents: ResMut<PlayerIntents>,
    mut progress: ResMut<Progress>,
    mut freeze: ResMut<FreezeTimer>,
    mut q_player: Query<(&PlayerLife, &mut PlayerMode), With<Player>>,
    q_enemies: Query<(Entity, &EnemyLifeState), (With<Enemy>, With<Health>)>,
    mut damage: MessageWriter<DamageEnemy>,
    mut stun: MessageWriter<StunEnemies>,
) {
    if !std::mem::take(&mut intents.use_item) || lock.0 || progress.held_item.is_none() {
        return;
    }
    let Ok((life, mut mode)) = q_player.single_mut() else {
        return;
    };
    if !life.is_alive() {
        return;
    }
    let Some(item) = progress.held_item.take() else {
        return;
    };
    info!("used {item:?}");

    let secs = tunables.item_effect_secs;
    match item {
        HeldItemKind::Nuke => {
            for (e, state) in &q_enemies {
                if state.is_alive() {
                    damage.write(DamageEnemy {
                        target: e,
                        amount: i32::MAX,
                        should_drop: false,
                    });
                }
            }
        }
        HeldItemKind::Shield => mode.invincible.set_max(secs),
        HeldItemKind::Zombie => {
            mode.counter.set_max(secs);
            progress.zombie_mode = true;
        }
        HeldItemKind::Freeze => {
            stun.write(StunEnemies(true));
            freeze.0 = Some(Countdown::new(secs));
        }
    }
}

pub(super) fn tick_freeze(time: Res<Time>, mut freeze: ResMut<FreezeTimer>, mut stun: MessageWriter<StunEnemies>) {
    let Some(left) = freeze.0.as_mut() else {
        return;
    };
    left.tick_down(time.delta_secs());
    if left.expired() {
        freeze.0 = None;
        stun.write(StunEnemies(false));
    }
}

/// A fresh player entity gets back the counter mode the run was saved with;
/// the flag clears once the window runs out.
pub(super) fn sync_zombie_mode(
    tunables: Res<Tunables>,
    mut progress: ResMut<Progress>,
    mut q_player: Query<(Ref<Player>, &mut PlayerMode)>,
) {
    let Ok((player, mut mode)) = q_player.single_mut() else {
        return;
    };
    if !progress.zombie_mode {
        return;
    }
    if player.is_added() {
        mode.counter.set_max(tunables.item_effect_secs);
    } else if !mode.is_counter() {
        progress.zombie_mode = false;
    }
}
