//! Tunable gameplay constants.

use bevy::prelude::*;

/// Floor for the wave-clear recheck period.
pub const MIN_CLEAR_RECHECK_SECS: f32 = 1.0;

#[derive(Resource, Debug, Clone)]
pub struct Tunables {
    pub pixels_per_meter: f32,
    pub player_speed: f32,
    pub bullet_speed: f32,
    pub enemy_bullet_speed: f32,

    /// Arena size in world units (one map).
    pub map_size: Vec2,

    /// Delay between a cleared wave and the next one.
    pub inter_wave_delay: f32,
    /// How often the wave-clear tag scan runs. Clamped to [`MIN_CLEAR_RECHECK_SECS`].
    pub clear_recheck_secs: f32,
    /// Spacing between replayed spawns after the player respawns.
    pub respawn_replay_interval: f32,

    pub respawn_delay: f32,
    pub invincibility_secs: f32,
    pub item_effect_secs: f32,

    /// Duration of the scripted camera/player move into the next map.
    pub transition_secs: f32,
    /// Pause after a transition before the next level starts.
    pub settle_secs: f32,

    /// Below this fraction of remaining time the timer bar turns critical.
    pub critical_time_fraction: f32,

    /// Edge-spawned enemies appear this far outside the map boundary.
    pub edge_spawn_offset: f32,
    /// Anchor-spawned enemies are jittered by up to this much on each axis.
    pub anchor_jitter: f32,

    pub pickup_lifetime_secs: f32,
}

impl Tunables {
    #[inline]
    pub fn clear_recheck(&self) -> f32 {
        self.clear_recheck_secs.max(MIN_CLEAR_RECHECK_SECS)
    }
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            pixels_per_meter: 20.0,
            player_speed: 220.0,
            bullet_speed: 900.0,
            enemy_bullet_speed: 320.0,
            map_size: Vec2::new(768.0, 768.0),
            inter_wave_delay: 2.0,
            clear_recheck_secs: 1.0,
            respawn_replay_interval: 0.25,
            respawn_delay: 2.0,
            invincibility_secs: 3.0,
            item_effect_secs: 8.0,
            transition_secs: 2.5,
            settle_secs: 1.0,
            critical_time_fraction: 0.2,
            edge_spawn_offset: 24.0,
            anchor_jitter: 12.0,
            pickup_lifetime_secs: 10.0,
        }
    }
}
