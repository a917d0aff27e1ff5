//! Events published by the simulation for external collaborators
//!
//! The simulation never calls audio or DOM code directly. It queues events,
//! and the front end drains them once per frame.

use super::state::GamePhase;

/// Named sound cues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEvent {
    PlayerShoot,
    InvaderShoot,
    InvaderExplode,
    PlayerHit,
    GameOver,
    /// Swarm step cue, 1..=4 round-robin
    InvaderMove(u8),
}

impl SoundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SoundEvent::PlayerShoot => "playerShoot",
            SoundEvent::InvaderShoot => "invaderShoot",
            SoundEvent::InvaderExplode => "invaderExplode",
            SoundEvent::PlayerHit => "playerHit",
            SoundEvent::GameOver => "gameOver",
            SoundEvent::InvaderMove(1) => "invaderMove1",
            SoundEvent::InvaderMove(2) => "invaderMove2",
            SoundEvent::InvaderMove(3) => "invaderMove3",
            SoundEvent::InvaderMove(_) => "invaderMove4",
        }
    }
}

/// Everything the simulation reports to the outside world
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Sound(SoundEvent),
    /// A wave was cleared and a fresh grid spawned; `wave` is the new index
    WaveCleared { wave: u32 },
    /// An explosive invader detonated, taking `destroyed` invaders with it (origin included)
    ChainReaction { origin: u32, destroyed: usize },
    PhaseChanged { from: GamePhase, to: GamePhase },
}

/// A sound cue due at a point on the simulation clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeferredCue {
    pub due_ms: f64,
    pub sound: SoundEvent,
}
