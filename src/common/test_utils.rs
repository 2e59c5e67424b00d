//! Helpers for unit tests that drive single systems against a bare `World`.

use bevy::ecs::system::{IntoSystem, RunSystemOnce};
use bevy::prelude::*;

/// Run `system` once and apply whatever it queued through `Commands`.
///
/// Every call builds a new system, so message readers start from the oldest
/// buffered message. Clear the buffer between sends when that matters.
pub fn run_system_once<T, Out, Marker>(world: &mut World, system: T) -> Out
where
    T: IntoSystem<(), Out, Marker>,
{
    let out = world.run_system_once(system).expect("system run failed");
    world.flush();
    out
}
