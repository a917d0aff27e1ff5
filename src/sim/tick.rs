//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. Update order per
//! running tick: player, swarm, projectiles, particles, collisions, game-over
//! checks, HUD.

use super::chain::blast_set;
use super::collision::{Bounds, collides};
use super::events::{GameEvent, SoundEvent};
use super::state::{GamePhase, GameState, Owner, Projectile};
use super::swarm::{check_wave_clear, update_swarm};
use crate::consts::*;

/// Keyboard actions understood by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Shoot,
    Pause,
    Start,
    Restart,
    /// Toggle the autopilot
    Idle,
}

impl Action {
    /// Map a `KeyboardEvent.code` to an action
    pub fn from_key_code(code: &str) -> Option<Self> {
        match code {
            "ArrowLeft" | "KeyA" => Some(Action::MoveLeft),
            "ArrowRight" | "KeyD" => Some(Action::MoveRight),
            "Space" => Some(Action::Shoot),
            "KeyP" | "Escape" => Some(Action::Pause),
            "Enter" => Some(Action::Start),
            "KeyR" => Some(Action::Restart),
            "KeyI" => Some(Action::Idle),
            _ => None,
        }
    }
}

/// Input commands for a single tick (deterministic)
///
/// Movement flags are held between ticks; the rest are one-shot and should be
/// cleared by the caller once a tick has consumed them.
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub move_left: bool,
    pub move_right: bool,
    pub shoot: bool,
    /// Pause toggle
    pub pause: bool,
    pub start: bool,
    pub restart: bool,
    /// Idle/demo mode - autopilot plays the game
    pub idle_mode: bool,
}

impl TickInput {
    pub fn press(&mut self, action: Action) {
        match action {
            Action::MoveLeft => self.move_left = true,
            Action::MoveRight => self.move_right = true,
            Action::Shoot => self.shoot = true,
            Action::Pause => self.pause = true,
            Action::Start => self.start = true,
            Action::Restart => self.restart = true,
            Action::Idle => self.idle_mode = !self.idle_mode,
        }
    }

    pub fn release(&mut self, action: Action) {
        match action {
            Action::MoveLeft => self.move_left = false,
            Action::MoveRight => self.move_right = false,
            _ => {}
        }
    }

    /// Clear one-shot inputs after processing
    pub fn clear_one_shots(&mut self) {
        self.shoot = false;
        self.pause = false;
        self.start = false;
        self.restart = false;
    }

    fn wants_start(&self) -> bool {
        self.start || self.shoot || self.move_left || self.move_right
    }
}

/// Advance the game state by one fixed timestep of `dt_ms` milliseconds
pub fn tick(state: &mut GameState, input: &TickInput, dt_ms: f32) {
    let mut input = input.clone();
    if input.idle_mode {
        autopilot(state, &mut input);
    }
    let input = &input;

    match state.phase {
        GamePhase::GameOver => {
            // Shoot doubles as restart on the game-over screen
            if input.restart || input.shoot {
                state.reset();
                if !state.title_screen {
                    state.set_phase(GamePhase::Running);
                }
            }
            state.publish_hud();
            return;
        }
        GamePhase::NotStarted => {
            if input.wants_start() {
                state.set_phase(GamePhase::Running);
            }
        }
        GamePhase::Running => {
            if input.pause {
                state.set_phase(GamePhase::Paused);
            }
        }
        GamePhase::Paused => {
            if input.pause {
                state.set_phase(GamePhase::Running);
            }
        }
    }

    // Clock only advances while running, so every deadline freezes on pause
    if state.phase == GamePhase::Running {
        step(state, input, dt_ms);
    }

    state.publish_hud();
}

fn step(state: &mut GameState, input: &TickInput, dt_ms: f32) {
    let dt = dt_ms as f64;
    state.time_ticks += 1;
    state.time_ms += dt;
    state.fire_due_cues();

    update_player(state, input);
    update_swarm(state, dt);
    update_projectiles(state);
    update_particles(state, dt_ms);

    let breached = resolve_collisions(state);

    if breached || state.lives == 0 {
        log::info!(
            "Game over: score {}, wave {}, lives {}",
            state.score,
            state.wave_index + 1,
            state.lives
        );
        state.set_phase(GamePhase::GameOver);
        state.play(SoundEvent::GameOver);
    }
}

fn update_player(state: &mut GameState, input: &TickInput) {
    let now = state.time_ms;
    state.player.move_left = input.move_left;
    state.player.move_right = input.move_right;
    state.player.update(now, &state.tuning);

    if !input.shoot {
        return;
    }
    if let Some(muzzle) = state.player.try_shoot(now, &state.tuning) {
        let id = state.next_entity_id();
        state
            .projectiles
            .push(Projectile::new(id, muzzle.x, muzzle.y, Owner::Player));
        state.play(SoundEvent::PlayerShoot);
    }
}

fn update_projectiles(state: &mut GameState) {
    let height = state.tuning.height;
    for shot in &mut state.projectiles {
        shot.advance();
    }
    state.projectiles.retain(|shot| shot.in_bounds(height));
}

fn update_particles(state: &mut GameState, dt_ms: f32) {
    for particle in &mut state.particles {
        particle.update(dt_ms);
    }
    state.particles.retain(|p| p.alive());
}

/// Apply every collision outcome for this tick. Returns true when an invader
/// reached the player (overlap or breach line).
fn resolve_collisions(state: &mut GameState) -> bool {
    resolve_player_shots(state);
    resolve_invader_shots(state);

    let breach_line = state.tuning.breach_line();
    state
        .invaders
        .iter()
        .any(|inv| collides(inv, &state.player) || inv.aabb().bottom() >= breach_line)
}

/// Each player shot destroys the first invader it overlaps, or the whole blast
/// set when that invader is explosive.
fn resolve_player_shots(state: &mut GameState) {
    let mut i = 0;
    while i < state.projectiles.len() {
        let shot = &state.projectiles[i];
        if shot.owner != Owner::Player {
            i += 1;
            continue;
        }

        let hit = state
            .invaders
            .iter()
            .find(|inv| collides(*inv, shot))
            .map(|inv| (inv.id, inv.is_explosive()));

        let Some((target, explosive)) = hit else {
            i += 1;
            continue;
        };

        state.projectiles.remove(i);
        if explosive {
            detonate(state, target);
        } else {
            destroy_invaders(state, &[target]);
            state.play(SoundEvent::InvaderExplode);
        }
        check_wave_clear(state);
    }
}

/// Destroy the explosive invader `origin` and everything linked to it
pub fn detonate(state: &mut GameState, origin: u32) {
    let victims = blast_set(&state.invaders, origin, state.tuning.chain_radius());
    if victims.is_empty() {
        return;
    }

    let destroyed = destroy_invaders(state, &victims);
    let chained = destroyed.saturating_sub(1) as u64;
    state.score += chained * state.tuning.chain_bonus;

    // One explosion cue per victim, staggered in blast order
    let spacing = state.tuning.chain_cue_spacing_ms;
    for n in 0..destroyed {
        state.schedule_cue(spacing * n as f64, SoundEvent::InvaderExplode);
    }

    log::debug!("Chain reaction from invader {origin}: {destroyed} destroyed");
    state.push_event(GameEvent::ChainReaction { origin, destroyed });
}

/// Remove the given invaders, crediting score and spawning explosions.
/// Ids no longer in the collection are skipped. Returns how many were removed.
pub fn destroy_invaders(state: &mut GameState, ids: &[u32]) -> usize {
    let mut removed = Vec::with_capacity(ids.len());
    state.invaders.retain(|inv| {
        if ids.contains(&inv.id) {
            removed.push((inv.center(), inv.color(), inv.points()));
            false
        } else {
            true
        }
    });

    for &(center, color, points) in &removed {
        state.score += points;
        state.spawn_explosion(center, color, KILL_PARTICLES);
    }
    removed.len()
}

fn resolve_invader_shots(state: &mut GameState) {
    let shielded = state.tuning.invulnerable_while_hit && state.player.is_hit;
    let mut i = 0;
    while i < state.projectiles.len() {
        let shot = &state.projectiles[i];
        if shot.owner != Owner::Invader || shielded || !collides(shot, &state.player) {
            i += 1;
            continue;
        }

        let shot = state.projectiles.remove(i);
        let now = state.time_ms;
        state.lives = state.lives.saturating_sub(1);
        state.player.hit(now);
        state.spawn_explosion(shot.aabb().center(), 0xff2a6d, HIT_PARTICLES);
        state.play(SoundEvent::PlayerHit);
    }
}

/// Steer under the lowest invader and keep firing
fn autopilot(state: &GameState, input: &mut TickInput) {
    match state.phase {
        GamePhase::NotStarted | GamePhase::GameOver => {
            input.start = true;
            input.restart = true;
            return;
        }
        GamePhase::Paused => return,
        GamePhase::Running => {}
    }

    let target = state
        .invaders
        .iter()
        .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
        .map(|inv| inv.center().x);

    let ship = state.player.center().x;
    let deadzone = state.tuning.player_speed;
    input.move_left = false;
    input.move_right = false;
    if let Some(target) = target {
        if target < ship - deadzone {
            input.move_left = true;
        } else if target > ship + deadzone {
            input.move_right = true;
        }
    }
    input.shoot = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::state::Invader;
    use glam::Vec2;

    fn running_state(seed: u64) -> GameState {
        let mut state = GameState::new(seed);
        state.set_phase(GamePhase::Running);
        state.drain_events();
        state
    }

    /// A running game with no random fire and a hand-placed swarm
    fn scripted_state(invaders: Vec<Invader>) -> GameState {
        let mut state = running_state(42);
        state.swarm.shoot_chance = 0.0;
        state.invaders = invaders;
        state
    }

    fn sounds(events: &[GameEvent]) -> Vec<SoundEvent> {
        events
            .iter()
            .filter_map(|e| match e {
                GameEvent::Sound(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_first_input_starts_game() {
        let mut state = GameState::new(1);
        tick(&mut state, &TickInput::default(), SIM_DT_MS);
        assert_eq!(state.phase, GamePhase::NotStarted);
        assert_eq!(state.time_ticks, 0);
        assert!(!state.hud.started);

        let input = TickInput {
            move_right: true,
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT_MS);
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.player.pos.x, 280.0);
        assert!(state.hud.started);
    }

    #[test]
    fn test_player_stops_at_right_clamp() {
        let mut state = running_state(2);
        state.swarm.shoot_chance = 0.0;
        assert_eq!(state.player.pos.x, 275.0);
        let input = TickInput {
            move_right: true,
            ..Default::default()
        };
        for _ in 0..120 {
            tick(&mut state, &input, SIM_DT_MS);
            assert!(state.player.pos.x <= 540.0);
        }
        assert_eq!(state.player.pos.x, 540.0);
    }

    #[test]
    fn test_pause_freezes_clock_and_cooldown() {
        let mut state = running_state(3);
        let shoot = TickInput {
            shoot: true,
            ..Default::default()
        };
        tick(&mut state, &shoot, SIM_DT_MS);
        assert!(!state.player.can_shoot);
        let clock = state.time_ms;

        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause, SIM_DT_MS);
        assert_eq!(state.phase, GamePhase::Paused);
        assert!(state.hud.paused);

        for _ in 0..120 {
            tick(&mut state, &shoot, SIM_DT_MS);
        }
        assert_eq!(state.time_ms, clock);
        assert!(!state.player.can_shoot);

        tick(&mut state, &pause, SIM_DT_MS);
        assert_eq!(state.phase, GamePhase::Running);
        assert!(state.time_ms > clock);
    }

    #[test]
    fn test_shot_kills_one_invader() {
        let mut state = scripted_state(vec![
            Invader::new(1, Vec2::new(280.0, 560.0), 0, false, 0.0),
            Invader::new(2, Vec2::new(280.0, 560.0), 2, false, 0.0),
        ]);
        let id = state.next_entity_id();
        state
            .projectiles
            .push(Projectile::new(id, 300.0, 590.0, Owner::Player));

        tick(&mut state, &TickInput::default(), SIM_DT_MS);
        assert_eq!(state.invaders.len(), 1);
        assert_eq!(state.invaders[0].id, 2);
        assert_eq!(state.score, 40);
        assert!(state.projectiles.is_empty());
        assert!(sounds(&state.drain_events()).contains(&SoundEvent::InvaderExplode));
    }

    #[test]
    fn test_chain_reaction_scoring() {
        // A(explosive)-B-C within 47.5 of each other, D out of reach
        let mut state = scripted_state(vec![
            Invader::new(1, Vec2::new(100.0, 100.0), 2, true, 0.0),
            Invader::new(2, Vec2::new(140.0, 100.0), 2, false, 0.0),
            Invader::new(3, Vec2::new(180.0, 100.0), 2, false, 0.0),
            Invader::new(4, Vec2::new(400.0, 100.0), 2, false, 0.0),
        ]);
        let id = state.next_entity_id();
        state
            .projectiles
            .push(Projectile::new(id, 110.0, 120.0, Owner::Player));

        tick(&mut state, &TickInput::default(), SIM_DT_MS);

        let left: Vec<_> = state.invaders.iter().map(|inv| inv.id).collect();
        assert_eq!(left, [4]);
        assert_eq!(state.score, 3 * 20 + 2 * state.tuning.chain_bonus);

        let events = state.drain_events();
        assert!(events.contains(&GameEvent::ChainReaction {
            origin: 1,
            destroyed: 3
        }));
        assert_eq!(
            sounds(&events)
                .iter()
                .filter(|s| **s == SoundEvent::InvaderExplode)
                .count(),
            1
        );
        assert_eq!(state.pending_cues.len(), 2);

        // The staggered cues play out over the next ticks
        for _ in 0..12 {
            tick(&mut state, &TickInput::default(), SIM_DT_MS);
        }
        assert!(state.pending_cues.is_empty());
        let later = sounds(&state.drain_events());
        assert_eq!(
            later.iter().filter(|s| **s == SoundEvent::InvaderExplode).count(),
            2
        );
    }

    #[test]
    fn test_chain_clearing_wave_respawns_grid() {
        let mut state = scripted_state(vec![
            Invader::new(1, Vec2::new(100.0, 100.0), 0, true, 0.0),
            Invader::new(2, Vec2::new(100.0, 145.0), 1, false, 0.0),
        ]);
        let id = state.next_entity_id();
        state
            .projectiles
            .push(Projectile::new(id, 120.0, 120.0, Owner::Player));

        tick(&mut state, &TickInput::default(), SIM_DT_MS);
        assert_eq!(state.invaders.len(), 50);
        assert_eq!(state.wave_index, 1);
        assert_eq!(state.score, 40 + 30 + state.tuning.chain_bonus);
        assert!((state.swarm.shoot_chance - 0.002).abs() < 1e-12);
    }

    #[test]
    fn test_invader_shot_costs_a_life() {
        let mut state = scripted_state(vec![Invader::new(
            1,
            Vec2::new(20.0, 50.0),
            0,
            false,
            0.0,
        )]);
        let id = state.next_entity_id();
        state
            .projectiles
            .push(Projectile::new(id, 300.0, 640.0, Owner::Invader));

        tick(&mut state, &TickInput::default(), SIM_DT_MS);
        assert_eq!(state.lives, 2);
        assert!(state.player.is_hit);
        assert!(state.projectiles.is_empty());
        assert_eq!(state.hud.lives, 2);
        assert!(sounds(&state.drain_events()).contains(&SoundEvent::PlayerHit));
    }

    #[test]
    fn test_invulnerable_flicker_ignores_fire() {
        let settings = Settings {
            tuning: crate::Tuning {
                invulnerable_while_hit: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut state = GameState::with_settings(9, &settings);
        state.set_phase(GamePhase::Running);
        state.swarm.shoot_chance = 0.0;
        state.player.hit(0.0);
        let id = state.next_entity_id();
        state
            .projectiles
            .push(Projectile::new(id, 300.0, 640.0, Owner::Invader));

        tick(&mut state, &TickInput::default(), SIM_DT_MS);
        assert_eq!(state.lives, 3);
        assert_eq!(state.projectiles.len(), 1);
    }

    #[test]
    fn test_last_life_ends_game() {
        let mut state = scripted_state(vec![Invader::new(
            1,
            Vec2::new(20.0, 50.0),
            0,
            false,
            0.0,
        )]);
        state.lives = 1;
        let id = state.next_entity_id();
        state
            .projectiles
            .push(Projectile::new(id, 300.0, 640.0, Owner::Invader));

        tick(&mut state, &TickInput::default(), SIM_DT_MS);
        assert_eq!(state.lives, 0);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.hud.game_over);
    }

    #[test]
    fn test_invader_overlap_ends_game_without_losing_life() {
        let mut state = scripted_state(vec![Invader::new(
            1,
            Vec2::new(280.0, 630.0),
            0,
            false,
            0.0,
        )]);
        state.lives = 1;

        tick(&mut state, &TickInput::default(), SIM_DT_MS);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.lives, 1);
        assert!(state.hud.game_over);

        let game_overs = sounds(&state.drain_events())
            .into_iter()
            .filter(|s| *s == SoundEvent::GameOver)
            .count();
        assert_eq!(game_overs, 1);

        // Nothing moves once the game is over
        let clock = state.time_ms;
        tick(&mut state, &TickInput::default(), SIM_DT_MS);
        assert_eq!(state.time_ms, clock);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_breach_line_ends_game() {
        // Far from the ship horizontally, bottom edge exactly on the line
        let mut state = scripted_state(vec![Invader::new(
            1,
            Vec2::new(20.0, 620.0),
            0,
            false,
            0.0,
        )]);
        tick(&mut state, &TickInput::default(), SIM_DT_MS);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.lives, 3);
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut state = scripted_state(vec![Invader::new(
            1,
            Vec2::new(20.0, 620.0),
            0,
            true,
            0.0,
        )]);
        state.score = 1234;
        state.lives = 2;
        state.swarm.move_interval = 300.0;
        state.swarm.shoot_chance = 0.05;
        state.schedule_cue(500.0, SoundEvent::InvaderExplode);
        tick(&mut state, &TickInput::default(), SIM_DT_MS);
        assert_eq!(state.phase, GamePhase::GameOver);

        let restart = TickInput {
            restart: true,
            ..Default::default()
        };
        tick(&mut state, &restart, SIM_DT_MS);
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.score, 0);
        assert_eq!(state.lives, 3);
        assert_eq!(state.invaders.len(), 50);
        assert_eq!(state.swarm.move_interval, 1000.0);
        assert_eq!(state.swarm.shoot_chance, 0.005);
        assert!(state.pending_cues.is_empty());
        assert_eq!(state.time_ms, 0.0);
    }

    #[test]
    fn test_restart_to_title_screen_variant() {
        let settings = Settings {
            title_screen: true,
            ..Default::default()
        };
        let mut state = GameState::with_settings(4, &settings);
        state.set_phase(GamePhase::GameOver);

        let shoot = TickInput {
            shoot: true,
            ..Default::default()
        };
        tick(&mut state, &shoot, SIM_DT_MS);
        assert_eq!(state.phase, GamePhase::NotStarted);
        assert!(state.title_screen);
    }

    #[test]
    fn test_input_press_release() {
        let mut input = TickInput::default();
        input.press(Action::MoveLeft);
        input.press(Action::Shoot);
        assert!(input.move_left && input.shoot);

        input.clear_one_shots();
        assert!(input.move_left);
        assert!(!input.shoot);

        input.release(Action::MoveLeft);
        assert!(!input.move_left);

        input.press(Action::Idle);
        assert!(input.idle_mode);
        input.press(Action::Idle);
        assert!(!input.idle_mode);

        assert_eq!(Action::from_key_code("Space"), Some(Action::Shoot));
        assert_eq!(Action::from_key_code("KeyP"), Some(Action::Pause));
        assert_eq!(Action::from_key_code("KeyQ"), None);
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let mut state1 = GameState::new(99999);
        let mut state2 = GameState::new(99999);

        let mut input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        for _ in 0..3000 {
            tick(&mut state1, &input, SIM_DT_MS);
            tick(&mut state2, &input, SIM_DT_MS);
            input.clear_one_shots();
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.score, state2.score);
        assert_eq!(state1.lives, state2.lives);
        assert_eq!(state1.invaders.len(), state2.invaders.len());
        for (a, b) in state1.invaders.iter().zip(&state2.invaders) {
            assert_eq!(a.pos, b.pos);
            assert_eq!(a.is_explosive(), b.is_explosive());
        }
        assert_eq!(state1.projectiles.len(), state2.projectiles.len());
    }

    #[test]
    fn test_autopilot_scores() {
        let mut state = GameState::new(2024);
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        for _ in 0..600 {
            tick(&mut state, &input, SIM_DT_MS);
        }
        assert_ne!(state.phase, GamePhase::NotStarted);
        assert!(state.score > 0);
    }

    #[test]
    fn test_stale_ids_are_skipped() {
        let mut state = scripted_state(vec![Invader::new(
            1,
            Vec2::new(100.0, 100.0),
            1,
            false,
            0.0,
        )]);
        assert_eq!(destroy_invaders(&mut state, &[7, 8]), 0);
        assert_eq!(state.score, 0);
        detonate(&mut state, 99);
        assert_eq!(state.invaders.len(), 1);
    }
}
