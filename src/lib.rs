//! Neon Invaders - a Space Invaders variant with chain-reacting explosive invaders
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, swarm, collisions, game state)
//! - `settings`: Gameplay tuning and preferences
//! - `audio`: Procedural Web Audio sound effects (wasm only)
//! - `renderer`: Canvas 2D drawing of the simulation state (wasm only)

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod error;
#[cfg(target_arch = "wasm32")]
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::ConfigError;
pub use settings::{Settings, Tuning};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep in milliseconds (60 Hz, one tick per display refresh)
    pub const SIM_DT_MS: f32 = 1000.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta fed to the accumulator (ms)
    pub const MAX_FRAME_MS: f32 = 100.0;

    /// Player ship
    pub const PLAYER_WIDTH: f32 = 50.0;
    pub const PLAYER_HEIGHT: f32 = 30.0;

    /// Invaders
    pub const INVADER_WIDTH: f32 = 40.0;
    pub const INVADER_HEIGHT: f32 = 30.0;
    /// Half-period of the invader sprite animation (ms)
    pub const INVADER_ANIM_MS: f64 = 500.0;

    /// Projectiles: player bolts fly up, invader bolts fall
    pub const PLAYER_SHOT_WIDTH: f32 = 4.0;
    pub const PLAYER_SHOT_HEIGHT: f32 = 15.0;
    pub const PLAYER_SHOT_SPEED: f32 = -8.0;
    pub const INVADER_SHOT_WIDTH: f32 = 6.0;
    pub const INVADER_SHOT_HEIGHT: f32 = 12.0;
    pub const INVADER_SHOT_SPEED: f32 = 5.0;

    /// Particles spawned per invader kill / per player hit
    pub const KILL_PARTICLES: usize = 30;
    pub const HIT_PARTICLES: usize = 15;
    /// Number of distinct swarm movement cues
    pub const MOVE_CUES: u8 = 4;
}
