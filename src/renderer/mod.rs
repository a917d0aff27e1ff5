//! Canvas 2D rendering
//!
//! Reads the simulation state and draws it; never mutates gameplay state.

use std::f64::consts::TAU;

use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::sim::{GamePhase, GameState, Invader, Owner, Particle, Player, Projectile};

fn css(color: u32) -> String {
    format!("#{color:06x}")
}

pub struct CanvasRenderer {
    ctx: CanvasRenderingContext2d,
    width: f64,
    height: f64,
}

impl CanvasRenderer {
    pub fn new(canvas: &HtmlCanvasElement) -> Option<Self> {
        use wasm_bindgen::JsCast;

        let ctx = canvas
            .get_context("2d")
            .ok()??
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        Some(Self {
            ctx,
            width: canvas.width() as f64,
            height: canvas.height() as f64,
        })
    }

    /// Draw a full frame
    pub fn render(&self, state: &GameState) {
        let ctx = &self.ctx;
        ctx.set_global_alpha(1.0);
        ctx.set_fill_style_str("#0a0b1a");
        ctx.fill_rect(0.0, 0.0, self.width, self.height);
        self.draw_grid();

        let now = state.time_ms;
        if state.phase != GamePhase::GameOver && state.player.visible(now) {
            self.draw_player(&state.player);
        }
        for invader in &state.invaders {
            self.draw_invader(invader);
        }
        for shot in &state.projectiles {
            self.draw_projectile(shot);
        }
        for particle in &state.particles {
            self.draw_particle(particle);
        }
        ctx.set_global_alpha(1.0);

        if state.phase == GamePhase::Paused {
            self.draw_banner("PAUSED");
        }
    }

    /// Dim the playfield and print a centred caption
    fn draw_banner(&self, text: &str) {
        let ctx = &self.ctx;
        ctx.set_fill_style_str("rgba(10, 11, 26, 0.6)");
        ctx.fill_rect(0.0, 0.0, self.width, self.height);
        ctx.set_fill_style_str("#00eeff");
        ctx.set_font("bold 36px monospace");
        ctx.set_text_align("center");
        let _ = ctx.fill_text(text, self.width / 2.0, self.height / 2.0);
    }

    fn draw_grid(&self) {
        let ctx = &self.ctx;
        ctx.set_stroke_style_str("rgba(110, 68, 255, 0.1)");
        ctx.set_line_width(0.5);
        ctx.begin_path();
        let mut y = 0.0;
        while y < self.height {
            ctx.move_to(0.0, y);
            ctx.line_to(self.width, y);
            y += 50.0;
        }
        let mut x = 0.0;
        while x < self.width {
            ctx.move_to(x, 0.0);
            ctx.line_to(x, self.height);
            x += 50.0;
        }
        ctx.stroke();
    }

    fn draw_player(&self, player: &Player) {
        let ctx = &self.ctx;
        let (x, y) = (player.pos.x as f64, player.pos.y as f64);
        let (w, h) = (player.size.x as f64, player.size.y as f64);

        ctx.set_fill_style_str(if player.is_hit { "#ff2a6d" } else { "#00eeff" });
        ctx.begin_path();
        ctx.move_to(x + w / 2.0, y);
        ctx.line_to(x + w - 5.0, y + h - 5.0);
        ctx.line_to(x + 5.0, y + h - 5.0);
        ctx.close_path();
        ctx.fill();

        // Cannon
        ctx.set_fill_style_str("#ffffff");
        ctx.fill_rect(x + w / 2.0 - 2.0, y - 5.0, 4.0, 10.0);
    }

    fn draw_invader(&self, invader: &Invader) {
        let ctx = &self.ctx;
        let center = invader.center();
        let hover = (invader.hover_phase.sin() * 2.0) as f64;
        let (cx, cy) = (center.x as f64, center.y as f64 + hover);

        ctx.set_fill_style_str(&css(invader.color()));
        ctx.begin_path();
        match invader.tier {
            0 => {
                // Hexagon, rotated a little on alternate frames
                let spin = invader.anim_frame as f64 * std::f64::consts::PI / 12.0;
                for i in 0..6 {
                    let angle = TAU / 6.0 * i as f64 + spin;
                    let (px, py) = (cx + angle.cos() * 15.0, cy + angle.sin() * 15.0);
                    if i == 0 {
                        ctx.move_to(px, py);
                    } else {
                        ctx.line_to(px, py);
                    }
                }
                ctx.close_path();
            }
            1 => {
                let wing = invader.anim_frame as f64 * 5.0;
                ctx.move_to(cx, cy - 15.0);
                ctx.line_to(cx + 15.0 + wing, cy);
                ctx.line_to(cx, cy + 15.0);
                ctx.line_to(cx - 15.0 - wing, cy);
                ctx.close_path();
            }
            _ => {
                let _ = ctx.arc(cx, cy, 15.0, 0.0, TAU);
            }
        }
        ctx.fill();

        if invader.is_explosive() {
            ctx.set_fill_style_str("#ff9e00");
            ctx.begin_path();
            let _ = ctx.arc(cx, cy, 6.0, 0.0, TAU);
            ctx.fill();
        }
    }

    fn draw_projectile(&self, shot: &Projectile) {
        let color = match shot.owner {
            Owner::Player => "#00eeff",
            Owner::Invader => "#ff2a6d",
        };
        self.ctx.set_fill_style_str(color);
        self.ctx.fill_rect(
            shot.pos.x as f64,
            shot.pos.y as f64,
            shot.size.x as f64,
            shot.size.y as f64,
        );
    }

    fn draw_particle(&self, particle: &Particle) {
        let ctx = &self.ctx;
        ctx.set_global_alpha(particle.alpha.clamp(0.0, 1.0) as f64);
        ctx.set_fill_style_str(&css(particle.color));
        ctx.begin_path();
        let _ = ctx.arc(
            particle.pos.x as f64,
            particle.pos.y as f64,
            particle.size.max(0.0) as f64,
            0.0,
            TAU,
        );
        ctx.fill();
    }
}
