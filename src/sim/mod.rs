//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable entity IDs, collection order preserved
//! - No rendering or platform dependencies

pub mod chain;
pub mod collision;
pub mod events;
pub mod state;
pub mod swarm;
pub mod tick;

pub use chain::blast_set;
pub use collision::{Aabb, Bounds, collides, overlaps};
pub use events::{DeferredCue, GameEvent, SoundEvent};
pub use state::{
    GamePhase, GameState, HudSnapshot, Invader, Owner, Particle, Player, Projectile,
};
pub use swarm::{Swarm, check_wave_clear, generate_wave};
pub use tick::{Action, TickInput, detonate, tick};
