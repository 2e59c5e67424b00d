use bevy::prelude::*;

use super::components::FireCooldown;
use super::messages::{BulletKind, FireRequest};
use crate::common::sequence::Countdown;
use crate::common::tunables::Tunables;
use crate::plugins::player::{InputLock, Loadout, Player, PlayerIntents, PlayerLife};

/// Bullets leave this far from the player's center.
const MUZZLE_OFFSET: f32 = 18.0;

pub(super) fn reset_cooldown(mut cooldown: ResMut<FireCooldown>) {
    cooldown.0 = Countdown::default();
}

/// Producer: arrow keys -> one `FireRequest` per cooldown window.
pub fn request_player_bullets(
    time: Res<Time>,
    tunables: Res<Tunables>,
    intents: Res<PlayerIntents>,
    lock: Res<InputLock>,
    loadout: Res<Loadout>,
    mut cooldown: ResMut<FireCooldown>,
    q_player: Query<(&Transform, &PlayerLife), With<Player>>,
    mut writer: MessageWriter<FireRequest>,
) {
    cooldown.0.tick_down(time.delta_secs());
    if lock.0 || cooldown.0.is_positive() {
        return;
    }
    let Some(dir) = intents.fire_dir() else {
        return;
    };
    let Ok((tf, life)) = q_player.single() else {
        return;
    };
    if !life.is_alive() {
        return;
    }

    let origin = tf.translation.truncate();
    writer.write(FireRequest {
        kind: BulletKind::Player,
        pos: origin + dir * MUZZLE_OFFSET,
        vel: dir * tunables.bullet_speed,
        damage: loadout.damage,
    });
    cooldown.0 = Countdown::new(loadout.fire_cooldown);
}
