//! Shared random source.
//!
//! Every random decision in the core (spawn placement, loot rolls, boss action
//! selection, critter scheduling) draws from this one resource so a test can pin
//! the whole run with a seed.

use bevy::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[derive(Resource, Deref, DerefMut)]
pub struct GameRng(pub StdRng);

impl GameRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self(StdRng::from_entropy())
    }
}
