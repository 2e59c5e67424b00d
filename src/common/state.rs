//! Global state machine.
//!
//! Level flow (setup, gameplay, clear, transition) lives inside `InGame` and is
//! driven by the level director; only the terminal game-over screen is a
//! separate app state.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, States, Default)]
pub enum GameState {
    #[default]
    InGame,
    GameOver,
}
