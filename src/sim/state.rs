//! Game state and core simulation types
//!
//! All state that the simulation mutates lives here, owned by `GameState`.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::collision::{Aabb, Bounds};
use super::events::{DeferredCue, GameEvent, SoundEvent};
use super::swarm::{Swarm, generate_wave};
use crate::consts::*;
use crate::settings::{Settings, Tuning};

/// Salt separating the decorative RNG stream from the gameplay stream
const FX_STREAM_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Title screen, waiting for the first input
    NotStarted,
    /// Active gameplay
    Running,
    /// Game is paused
    Paused,
    /// Run ended, waiting for restart
    GameOver,
}

/// The player's ship
#[derive(Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    pub size: Vec2,
    pub move_left: bool,
    pub move_right: bool,
    /// Cleared when firing, set again once `cooldown_until` passes
    pub can_shoot: bool,
    cooldown_until: f64,
    /// Hit flicker active
    pub is_hit: bool,
    hit_at: f64,
}

impl Player {
    /// Ship centred horizontally near the bottom of the playfield
    pub fn spawn(tuning: &Tuning) -> Self {
        Self {
            pos: Vec2::new(
                (tuning.width - PLAYER_WIDTH) / 2.0,
                tuning.height - tuning.breach_margin,
            ),
            size: Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT),
            move_left: false,
            move_right: false,
            can_shoot: true,
            cooldown_until: 0.0,
            is_hit: false,
            hit_at: 0.0,
        }
    }

    /// Leftmost and rightmost x the ship may occupy
    pub fn x_bounds(&self, tuning: &Tuning) -> (f32, f32) {
        (
            tuning.edge_margin,
            tuning.width - self.size.x - tuning.edge_margin,
        )
    }

    /// Apply movement intents and expire deadlines
    pub fn update(&mut self, now_ms: f64, tuning: &Tuning) {
        let (min_x, max_x) = self.x_bounds(tuning);
        if self.move_left {
            self.pos.x = (self.pos.x - tuning.player_speed).max(min_x);
        }
        if self.move_right {
            self.pos.x = (self.pos.x + tuning.player_speed).min(max_x);
        }

        if !self.can_shoot && now_ms >= self.cooldown_until {
            self.can_shoot = true;
        }
        if self.is_hit && now_ms - self.hit_at >= tuning.hit_flicker_ms {
            self.is_hit = false;
        }
    }

    /// Consume the shot if the cooldown allows it; returns the muzzle position
    pub fn try_shoot(&mut self, now_ms: f64, tuning: &Tuning) -> Option<Vec2> {
        if !self.can_shoot {
            return None;
        }
        self.can_shoot = false;
        self.cooldown_until = now_ms + tuning.shoot_cooldown_ms;
        Some(Vec2::new(self.pos.x + self.size.x / 2.0, self.pos.y))
    }

    /// Start the hit flicker
    pub fn hit(&mut self, now_ms: f64) {
        self.is_hit = true;
        self.hit_at = now_ms;
    }

    /// Whether the ship is drawn this frame (blinks every 100 ms while hit)
    pub fn visible(&self, now_ms: f64) -> bool {
        !self.is_hit || ((now_ms - self.hit_at) / 100.0).floor() as u64 % 2 == 1
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }
}

impl Bounds for Player {
    fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }
}

/// An invader in the swarm
#[derive(Debug, Clone)]
pub struct Invader {
    pub id: u32,
    pub pos: Vec2,
    pub size: Vec2,
    /// Visual tier and point value: 0 elite, 1 standard, 2 basic
    pub tier: u8,
    explosive: bool,
    /// Sprite frame (0/1), toggled every `INVADER_ANIM_MS`
    pub anim_frame: u8,
    anim_timer: f64,
    /// Hover bob phase (radians)
    pub hover_phase: f32,
}

impl Invader {
    pub fn new(id: u32, pos: Vec2, tier: u8, explosive: bool, hover_phase: f32) -> Self {
        Self {
            id,
            pos,
            size: Vec2::new(INVADER_WIDTH, INVADER_HEIGHT),
            tier: tier.min(2),
            explosive,
            anim_frame: 0,
            anim_timer: 0.0,
            hover_phase,
        }
    }

    /// Fixed at creation; detonates a chain reaction when shot
    pub fn is_explosive(&self) -> bool {
        self.explosive
    }

    /// Score for destroying this invader
    pub fn points(&self) -> u64 {
        (3 - self.tier as u64) * 10 + 10
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Decorative animation only
    pub fn animate(&mut self, dt_ms: f64) {
        self.anim_timer += dt_ms;
        if self.anim_timer >= INVADER_ANIM_MS {
            self.anim_timer = 0.0;
            self.anim_frame ^= 1;
        }
        self.hover_phase += 0.05;
    }

    /// Explosion particle color for this tier
    pub fn color(&self) -> u32 {
        match self.tier {
            0 => 0xff2a6d,
            1 => 0x05ffa1,
            _ => 0x6e44ff,
        }
    }
}

impl Bounds for Invader {
    fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }
}

/// Who fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Player,
    Invader,
}

/// A projectile moving straight up or down
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    pub size: Vec2,
    pub owner: Owner,
    /// Signed vertical speed in pixels per tick
    pub speed: f32,
}

impl Projectile {
    /// Create a projectile horizontally centred on `center_x` with its top at `y`
    pub fn new(id: u32, center_x: f32, y: f32, owner: Owner) -> Self {
        let (size, speed) = match owner {
            Owner::Player => (
                Vec2::new(PLAYER_SHOT_WIDTH, PLAYER_SHOT_HEIGHT),
                PLAYER_SHOT_SPEED,
            ),
            Owner::Invader => (
                Vec2::new(INVADER_SHOT_WIDTH, INVADER_SHOT_HEIGHT),
                INVADER_SHOT_SPEED,
            ),
        };
        Self {
            id,
            pos: Vec2::new(center_x - size.x / 2.0, y),
            size,
            owner,
            speed,
        }
    }

    pub fn advance(&mut self) {
        self.pos.y += self.speed;
    }

    /// Still inside the playfield on the side it travels toward
    pub fn in_bounds(&self, height: f32) -> bool {
        match self.owner {
            Owner::Player => self.pos.y > 0.0,
            Owner::Invader => self.pos.y < height,
        }
    }
}

impl Bounds for Projectile {
    fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }
}

/// A particle for visual effects
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: u32,
    /// 1.0 fully opaque, removed at 0
    pub alpha: f32,
    pub decay: f32,
    pub size: f32,
}

impl Particle {
    /// Advance by `dt_ms`; speeds are tuned per 16 ms frame
    pub fn update(&mut self, dt_ms: f32) {
        let frames = dt_ms / 16.0;
        self.pos += self.vel * frames;
        self.alpha -= self.decay * frames;
        self.size -= 0.05 * frames;
    }

    pub fn alive(&self) -> bool {
        self.alpha > 0.0 && self.size > 0.0
    }
}

/// What the UI shows each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HudSnapshot {
    pub score: u64,
    pub lives: u8,
    pub wave: u32,
    pub game_over: bool,
    pub paused: bool,
    pub started: bool,
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    pub phase: GamePhase,
    pub score: u64,
    pub lives: u8,
    /// Current wave index (0-based)
    pub wave_index: u32,
    /// Simulation clock (ms); frozen while not running
    pub time_ms: f64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub player: Player,
    /// Live invaders (the swarm)
    pub invaders: Vec<Invader>,
    /// Live projectiles of both owners
    pub projectiles: Vec<Projectile>,
    /// Visual particles (not gameplay-affecting)
    pub particles: Vec<Particle>,
    pub swarm: Swarm,
    /// Sound cues waiting for their deadline
    pub pending_cues: Vec<DeferredCue>,
    /// Last published UI snapshot
    pub hud: HudSnapshot,
    /// Particle cap (0 disables particles)
    pub particle_cap: usize,
    /// Restart lands on the title screen
    pub title_screen: bool,
    events: Vec<GameEvent>,
    rng: Pcg32,
    fx_rng: Pcg32,
    next_id: u32,
}

impl GameState {
    /// Create a new game with default settings
    pub fn new(seed: u64) -> Self {
        Self::with_settings(seed, &Settings::default())
    }

    /// Create a new game with the given settings; the first wave is spawned immediately.
    /// Tuning that fails validation is replaced by the defaults.
    pub fn with_settings(seed: u64, settings: &Settings) -> Self {
        let tuning = match settings.tuning.validate() {
            Ok(()) => settings.tuning.clone(),
            Err(err) => {
                log::warn!("{err}; using default tuning");
                Tuning::default()
            }
        };
        let mut state = Self {
            seed,
            phase: GamePhase::NotStarted,
            score: 0,
            lives: tuning.starting_lives,
            wave_index: 0,
            time_ms: 0.0,
            time_ticks: 0,
            player: Player::spawn(&tuning),
            invaders: Vec::new(),
            projectiles: Vec::new(),
            particles: Vec::new(),
            swarm: Swarm::new(&tuning),
            pending_cues: Vec::new(),
            hud: HudSnapshot::default(),
            particle_cap: settings.particle_cap(),
            title_screen: settings.title_screen,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            fx_rng: Pcg32::seed_from_u64(seed ^ FX_STREAM_SALT),
            next_id: 1,
            tuning,
        };

        generate_wave(&mut state);
        state.publish_hud();
        state
    }

    /// Throw away the current run and start over with fresh entities and difficulty.
    /// Pending deferred cues and queued events are dropped with the old state.
    pub fn reset(&mut self) {
        let previous = self.seed;
        let seed = self.rng.random::<u64>();
        let settings = Settings {
            tuning: self.tuning.clone(),
            particles: self.particle_cap > 0,
            max_particles: self.particle_cap,
            title_screen: self.title_screen,
            ..Settings::default()
        };
        *self = Self::with_settings(seed, &settings);
        log::info!("Game reset: seed {previous} -> {seed}");
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Gameplay RNG
    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn play(&mut self, sound: SoundEvent) {
        self.events.push(GameEvent::Sound(sound));
    }

    /// Take all events queued since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Move to a new phase, publishing the transition
    pub fn set_phase(&mut self, phase: GamePhase) {
        if self.phase == phase {
            return;
        }
        let from = self.phase;
        self.phase = phase;
        self.events.push(GameEvent::PhaseChanged { from, to: phase });
    }

    /// Schedule a sound `delay_ms` from now on the simulation clock
    pub fn schedule_cue(&mut self, delay_ms: f64, sound: SoundEvent) {
        if delay_ms <= 0.0 {
            self.play(sound);
        } else {
            self.pending_cues.push(DeferredCue {
                due_ms: self.time_ms + delay_ms,
                sound,
            });
        }
    }

    /// Emit every cue whose deadline has passed, in deadline order
    pub fn fire_due_cues(&mut self) {
        if self.pending_cues.is_empty() {
            return;
        }
        let now = self.time_ms;
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.pending_cues.drain(..).partition(|cue| cue.due_ms <= now);
        self.pending_cues = pending;
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms));
        for cue in due {
            self.play(cue.sound);
        }
    }

    /// Spawn a burst of explosion particles at `pos`
    pub fn spawn_explosion(&mut self, pos: Vec2, color: u32, count: usize) {
        for _ in 0..count {
            if self.particles.len() >= self.particle_cap {
                break;
            }
            let angle = self.fx_rng.random_range(0.0..std::f32::consts::TAU);
            let speed = self.fx_rng.random_range(1.0..4.0);
            self.particles.push(Particle {
                pos,
                vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                color,
                alpha: 1.0,
                decay: self.fx_rng.random_range(0.02..0.04),
                size: self.fx_rng.random_range(1.0..4.0),
            });
        }
    }

    /// Decorative random value for new invaders (hover phase)
    pub(crate) fn fx_phase(&mut self) -> f32 {
        self.fx_rng.random_range(0.0..std::f32::consts::TAU)
    }

    /// Refresh the UI snapshot
    pub fn publish_hud(&mut self) {
        self.hud = HudSnapshot {
            score: self.score,
            lives: self.lives,
            wave: self.wave_index + 1,
            game_over: self.phase == GamePhase::GameOver,
            paused: self.phase == GamePhase::Paused,
            started: self.phase != GamePhase::NotStarted,
        };
    }
}
