//! Game settings and gameplay tuning
//!
//! `Tuning` holds every gameplay constant; its defaults reproduce the classic
//! arcade feel. `Settings` wraps it together with front-end preferences.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Gameplay constants. Times are in milliseconds, distances in pixels,
/// speeds in pixels per simulation tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Playfield ===
    pub width: f32,
    pub height: f32,
    /// Gap kept between the ship/swarm and the side walls
    pub edge_margin: f32,
    /// Distance above the bottom edge that counts as an invader breach
    pub breach_margin: f32,
    pub starting_lives: u8,

    // === Player ===
    pub player_speed: f32,
    pub shoot_cooldown_ms: f64,
    pub hit_flicker_ms: f64,
    /// Ship ignores invader fire while flickering
    pub invulnerable_while_hit: bool,

    // === Swarm ===
    pub invader_rows: u32,
    pub invader_cols: u32,
    pub invader_padding: f32,
    pub invader_top: f32,
    pub move_speed: f32,
    pub step_multiplier: f32,
    pub descent: f32,
    pub initial_move_interval_ms: f64,
    pub min_move_interval_ms: f64,
    /// Interval reduction applied on each descent
    pub descent_speedup_ms: f64,
    /// Interval reduction applied on each cleared wave
    pub wave_speedup_ms: f64,
    pub initial_shoot_chance: f64,
    pub shoot_chance_step: f64,
    pub explosive_chance: f64,

    // === Scoring ===
    pub chain_bonus: u64,
    /// Delay between successive explosion cues in a chain reaction
    pub chain_cue_spacing_ms: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 700.0,
            edge_margin: 10.0,
            breach_margin: 50.0,
            starting_lives: 3,

            player_speed: 5.0,
            shoot_cooldown_ms: 500.0,
            hit_flicker_ms: 1000.0,
            invulnerable_while_hit: false,

            invader_rows: 5,
            invader_cols: 10,
            invader_padding: 15.0,
            invader_top: 50.0,
            move_speed: 1.0,
            step_multiplier: 10.0,
            descent: 20.0,
            initial_move_interval_ms: 1000.0,
            min_move_interval_ms: 200.0,
            descent_speedup_ms: 50.0,
            wave_speedup_ms: 100.0,
            initial_shoot_chance: 0.005,
            shoot_chance_step: 0.002,
            explosive_chance: 0.30,

            chain_bonus: 50,
            chain_cue_spacing_ms: 80.0,
        }
    }
}

impl Tuning {
    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: &'static str) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid { field, reason })
        }

        if !(self.width > 0.0) {
            return invalid("width", "must be positive");
        }
        if !(self.height > 0.0) {
            return invalid("height", "must be positive");
        }
        if self.starting_lives == 0 {
            return invalid("starting_lives", "must be at least 1");
        }
        if self.invader_rows == 0 || self.invader_cols == 0 {
            return invalid("invader_rows", "grid must not be empty");
        }
        if !(self.invader_padding >= 0.0) {
            return invalid("invader_padding", "must not be negative");
        }
        let grid_width = self.invader_cols as f32 * crate::consts::INVADER_WIDTH
            + (self.invader_cols - 1) as f32 * self.invader_padding;
        if grid_width > self.width {
            return invalid("invader_cols", "grid is wider than the playfield");
        }
        if !(0.0..=1.0).contains(&self.initial_shoot_chance) {
            return invalid("initial_shoot_chance", "must be within [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.explosive_chance) {
            return invalid("explosive_chance", "must be within [0, 1]");
        }
        if self.shoot_chance_step < 0.0 {
            return invalid("shoot_chance_step", "must not be negative");
        }
        if !(self.min_move_interval_ms > 0.0) {
            return invalid("min_move_interval_ms", "must be positive");
        }
        if self.min_move_interval_ms > self.initial_move_interval_ms {
            return invalid("min_move_interval_ms", "exceeds initial_move_interval_ms");
        }
        Ok(())
    }

    /// Proximity radius linking invaders in a chain reaction
    pub fn chain_radius(&self) -> f32 {
        crate::consts::INVADER_WIDTH + self.invader_padding / 2.0
    }

    /// Invader bottom edge at or past this y ends the game
    pub fn breach_line(&self) -> f32 {
        self.height - self.breach_margin
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tuning: Tuning,

    // === Visual Effects ===
    /// Particle effects (explosions)
    pub particles: bool,
    pub max_particles: usize,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,

    /// Restart returns to the title screen instead of straight into play
    pub title_screen: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tuning: Tuning::default(),
            particles: true,
            max_particles: 600,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            title_screen: false,
        }
    }
}

impl Settings {
    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.tuning.validate()?;
        Ok(settings)
    }

    /// Effective particle count cap
    pub fn particle_cap(&self) -> usize {
        if self.particles { self.max_particles } else { 0 }
    }

    /// Load settings from the page's `#settings` JSON block (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let json = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("settings"))
            .and_then(|el| el.text_content());

        match json {
            Some(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from page");
                    settings
                }
                Err(err) => {
                    log::warn!("{err}; using default settings");
                    Self::default()
                }
            },
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}
