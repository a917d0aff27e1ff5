//! Invader formation movement and difficulty escalation
//!
//! The swarm moves as one unit on a shared timer. Each step it slides
//! sideways, drops and reverses at the walls, and rolls for invader fire.

use glam::Vec2;
use rand::Rng;

use super::events::{GameEvent, SoundEvent};
use super::state::{GameState, Invader, Owner, Projectile};
use crate::consts::*;
use crate::settings::Tuning;

/// Shared formation state
#[derive(Debug, Clone, PartialEq)]
pub struct Swarm {
    /// +1.0 advancing right, -1.0 advancing left
    pub direction: f32,
    /// Time accumulated toward the next step (ms)
    pub move_timer: f64,
    /// Time between steps (ms), shrinks with difficulty
    pub move_interval: f64,
    /// Per-invader probability of firing on each step
    pub shoot_chance: f64,
    /// Last movement cue played (1..=4); a new swarm starts at 1 so it opens on cue 2
    pub move_cue: u8,
}

/// Result of one formation step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutcome {
    /// Direction reversed and the formation dropped
    pub descended: bool,
    /// Muzzle positions (bottom centre) of invaders that fired
    pub shots: Vec<Vec2>,
}

impl Swarm {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            direction: 1.0,
            move_timer: 0.0,
            move_interval: tuning.initial_move_interval_ms,
            shoot_chance: tuning.initial_shoot_chance,
            move_cue: 1,
        }
    }

    /// Accumulate elapsed time; true when a step is due
    pub fn advance(&mut self, dt_ms: f64) -> bool {
        self.move_timer += dt_ms;
        self.move_timer >= self.move_interval
    }

    /// Horizontal extent (left edge, right edge) of the live formation
    pub fn extents(invaders: &[Invader]) -> Option<(f32, f32)> {
        if invaders.is_empty() {
            return None;
        }
        let left = invaders.iter().map(|inv| inv.pos.x).fold(f32::MAX, f32::min);
        let right = invaders
            .iter()
            .map(|inv| inv.pos.x + inv.size.x)
            .fold(f32::MIN, f32::max);
        Some((left, right))
    }

    /// Perform one formation step: reverse at walls, descend, slide, roll fire.
    /// An empty formation does nothing.
    pub fn step(
        &mut self,
        invaders: &mut [Invader],
        tuning: &Tuning,
        rng: &mut impl Rng,
    ) -> StepOutcome {
        self.move_timer = 0.0;
        let Some((left, right)) = Self::extents(invaders) else {
            return StepOutcome::default();
        };

        let mut descended = false;
        if self.direction > 0.0 && right >= tuning.width - tuning.edge_margin {
            self.direction = -1.0;
            descended = true;
        } else if self.direction < 0.0 && left <= tuning.edge_margin {
            self.direction = 1.0;
            descended = true;
        }

        let dx = tuning.move_speed * self.direction * tuning.step_multiplier;
        let mut shots = Vec::new();
        for invader in invaders.iter_mut() {
            // Every descending invader tightens the shared interval
            if descended {
                invader.pos.y += tuning.descent;
                self.move_interval = (self.move_interval - tuning.descent_speedup_ms)
                    .max(tuning.min_move_interval_ms);
            }
            invader.pos.x += dx;

            if rng.random::<f64>() < self.shoot_chance {
                shots.push(Vec2::new(
                    invader.pos.x + invader.size.x / 2.0,
                    invader.pos.y + invader.size.y,
                ));
            }
        }

        StepOutcome { descended, shots }
    }

    /// Next movement cue, cycling 1..=4
    pub fn next_move_cue(&mut self) -> SoundEvent {
        self.move_cue = self.move_cue % MOVE_CUES + 1;
        SoundEvent::InvaderMove(self.move_cue)
    }

    /// Escalate difficulty after a cleared wave
    pub fn on_wave_cleared(&mut self, tuning: &Tuning) {
        self.move_interval =
            (self.move_interval - tuning.wave_speedup_ms).max(tuning.min_move_interval_ms);
        self.shoot_chance = (self.shoot_chance + tuning.shoot_chance_step).min(1.0);
    }
}

/// Top-left corner of the invader grid, centred horizontally
pub fn grid_origin(tuning: &Tuning) -> Vec2 {
    let cell = INVADER_WIDTH + tuning.invader_padding;
    Vec2::new(
        (tuning.width - tuning.invader_cols as f32 * cell) / 2.0,
        tuning.invader_top,
    )
}

/// Fill the invader collection with a fresh grid
pub fn generate_wave(state: &mut GameState) {
    let origin = grid_origin(&state.tuning);
    let step = Vec2::new(
        INVADER_WIDTH + state.tuning.invader_padding,
        INVADER_HEIGHT + state.tuning.invader_padding,
    );
    let (rows, cols) = (state.tuning.invader_rows, state.tuning.invader_cols);
    let explosive_chance = state.tuning.explosive_chance;

    state.invaders.clear();
    state.invaders.reserve((rows * cols) as usize);
    for row in 0..rows {
        for col in 0..cols {
            let pos = origin + Vec2::new(col as f32 * step.x, row as f32 * step.y);
            let tier = (row % 3) as u8;
            let explosive = state.rng().random_bool(explosive_chance);
            let id = state.next_entity_id();
            let hover = state.fx_phase();
            state.invaders.push(Invader::new(id, pos, tier, explosive, hover));
        }
    }

    let explosive = state.invaders.iter().filter(|inv| inv.is_explosive()).count();
    log::info!(
        "Wave {}: {} invaders ({} explosive), step every {}ms, shoot chance {:.3}",
        state.wave_index + 1,
        state.invaders.len(),
        explosive,
        state.swarm.move_interval,
        state.swarm.shoot_chance
    );
}

/// Respawn the grid if the swarm has been wiped out. Returns true on a clear.
pub fn check_wave_clear(state: &mut GameState) -> bool {
    if !state.invaders.is_empty() {
        return false;
    }
    state.wave_index += 1;
    let tuning = state.tuning.clone();
    state.swarm.on_wave_cleared(&tuning);
    generate_wave(state);
    state.push_event(GameEvent::WaveCleared {
        wave: state.wave_index,
    });
    true
}

/// Advance the swarm by `dt_ms`, stepping when its timer elapses
pub fn update_swarm(state: &mut GameState, dt_ms: f64) {
    for invader in &mut state.invaders {
        invader.animate(dt_ms);
    }

    if !state.swarm.advance(dt_ms) {
        return;
    }
    if state.invaders.is_empty() {
        state.swarm.move_timer = 0.0;
        return;
    }

    let tuning = state.tuning.clone();
    let mut swarm = state.swarm.clone();
    let mut invaders = std::mem::take(&mut state.invaders);
    let outcome = swarm.step(&mut invaders, &tuning, state.rng());
    state.invaders = invaders;
    state.swarm = swarm;

    if outcome.descended {
        log::trace!(
            "Swarm reversed to {:+}, interval now {}ms",
            state.swarm.direction,
            state.swarm.move_interval
        );
    }

    for muzzle in outcome.shots {
        let id = state.next_entity_id();
        state
            .projectiles
            .push(Projectile::new(id, muzzle.x, muzzle.y, Owner::Invader));
        state.play(SoundEvent::InvaderShoot);
    }

    let cue = state.swarm.next_move_cue();
    state.play(cue);
}
