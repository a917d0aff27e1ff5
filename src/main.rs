//! Neon Invaders entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent};

    use neon_invaders::Settings;
    use neon_invaders::audio::AudioManager;
    use neon_invaders::consts::*;
    use neon_invaders::renderer::CanvasRenderer;
    use neon_invaders::sim::{Action, GameEvent, GamePhase, GameState, HudSnapshot, TickInput, tick};

    /// Game instance holding all state
    struct Game {
        state: GameState,
        renderer: CanvasRenderer,
        audio: AudioManager,
        accumulator: f32,
        last_time: f64,
        input: TickInput,
        document: Document,
        /// Last HUD written to the DOM
        shown_hud: Option<HudSnapshot>,
    }

    impl Game {
        /// Run simulation ticks
        fn update(&mut self, dt_ms: f32) {
            self.accumulator += dt_ms.min(MAX_FRAME_MS);

            let mut substeps = 0;
            while self.accumulator >= SIM_DT_MS && substeps < MAX_SUBSTEPS {
                tick(&mut self.state, &self.input, SIM_DT_MS);
                self.accumulator -= SIM_DT_MS;
                substeps += 1;
                self.input.clear_one_shots();
            }
            if substeps == MAX_SUBSTEPS {
                // Drop the backlog rather than spiral
                self.accumulator = 0.0;
            }

            for event in self.state.drain_events() {
                match event {
                    GameEvent::Sound(sound) => self.audio.play(sound),
                    GameEvent::WaveCleared { wave } => log::info!("Wave {} reached", wave + 1),
                    GameEvent::ChainReaction { destroyed, .. } => {
                        log::debug!("Chain reaction took {destroyed} invaders")
                    }
                    GameEvent::PhaseChanged { from, to } => log::debug!("{from:?} -> {to:?}"),
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&mut self) {
            let hud = self.state.hud;
            if self.shown_hud == Some(hud) {
                return;
            }
            self.shown_hud = Some(hud);

            self.set_text("#score", &hud.score.to_string());
            self.set_text("#lives", &hud.lives.to_string());
            self.set_text("#wave", &hud.wave.to_string());

            self.set_visible("#gameOver", hud.game_over);
            if hud.game_over {
                self.set_text("#finalScore", &format!("Final Score: {}", hud.score));
            }
            self.set_visible("#controls", !hud.started);
        }

        fn set_text(&self, selector: &str, text: &str) {
            if let Some(el) = self.document.query_selector(selector).ok().flatten() {
                el.set_text_content(Some(text));
            }
        }

        fn set_visible(&self, selector: &str, visible: bool) {
            if let Some(el) = self.document.query_selector(selector).ok().flatten() {
                let _ = el.class_list().toggle_with_force("hidden", !visible);
            }
        }

        /// Pause if a game is in progress
        fn auto_pause(&mut self, why: &str) {
            if self.state.phase == GamePhase::Running {
                self.input.pause = true;
                log::info!("Auto-paused ({why})");
            }
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Neon Invaders starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let settings = Settings::load();

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("gameCanvas")
            .ok_or("no canvas")?
            .dyn_into()?;
        canvas.set_width(settings.tuning.width as u32);
        canvas.set_height(settings.tuning.height as u32);
        let renderer = CanvasRenderer::new(&canvas).ok_or("canvas 2d context unavailable")?;

        // Initialize game
        let seed = js_sys::Date::now() as u64;
        let mut state = GameState::with_settings(seed, &settings);
        state.publish_hud();
        log::info!("Game initialized with seed: {}", seed);

        let game = Rc::new(RefCell::new(Game {
            state,
            renderer,
            audio: AudioManager::new(&settings),
            accumulator: 0.0,
            last_time: 0.0,
            input: TickInput::default(),
            document,
            shown_hud: None,
        }));

        setup_input_handlers(game.clone())?;
        setup_auto_pause(game.clone())?;

        // Start game loop
        request_animation_frame(game);

        log::info!("Neon Invaders running!");
        Ok(())
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let Some(action) = Action::from_key_code(&event.code()) else {
                    return;
                };
                event.prevent_default();
                // Auto-repeat keeps firing; toggles only react to the first press
                if event.repeat() && action != Action::Shoot {
                    return;
                }
                let mut g = game.borrow_mut();
                g.input.press(action);
                if action == Action::Idle {
                    log::info!("Idle mode: {}", g.input.idle_mode);
                }
            });
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(action) = Action::from_key_code(&event.code()) {
                    event.prevent_default();
                    game.borrow_mut().input.release(action);
                }
            });
            window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt_ms = if g.last_time > 0.0 {
                (time - g.last_time) as f32
            } else {
                SIM_DT_MS
            };
            g.last_time = time;

            g.update(dt_ms);
            g.renderer.render(&g.state);
            g.update_hud();
        }

        request_animation_frame(game);
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    game.borrow_mut().auto_pause("tab hidden");
                }
            });
            document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            )?;
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().auto_pause("window blur");
            });
            window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Neon Invaders (native) starting...");
    log::info!("Native mode runs a headless autopilot demo - build for wasm32 to play");

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    let ticks: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(60 * 60);

    let settings = match args.next() {
        Some(path) => load_settings_file(&path),
        None => neon_invaders::Settings::load(),
    };

    demo(seed, ticks, &settings);
}

#[cfg(not(target_arch = "wasm32"))]
fn load_settings_file(path: &str) -> neon_invaders::Settings {
    let result = std::fs::read_to_string(path)
        .map_err(|err| err.to_string())
        .and_then(|json| neon_invaders::Settings::from_json(&json).map_err(|err| err.to_string()));
    match result {
        Ok(settings) => {
            log::info!("Loaded settings from {path}");
            settings
        }
        Err(err) => {
            log::warn!("{path}: {err}; using default settings");
            neon_invaders::Settings::default()
        }
    }
}

/// Let the autopilot play for `ticks` fixed steps and report the outcome
#[cfg(not(target_arch = "wasm32"))]
fn demo(seed: u64, ticks: u64, settings: &neon_invaders::Settings) {
    use neon_invaders::consts::SIM_DT_MS;
    use neon_invaders::sim::{GameEvent, GamePhase, GameState, TickInput, tick};

    let mut state = GameState::with_settings(seed, settings);
    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };

    let mut chains = 0;
    let mut sounds = 0;
    for _ in 0..ticks {
        tick(&mut state, &input, SIM_DT_MS);
        for event in state.drain_events() {
            match event {
                GameEvent::Sound(sound) => {
                    sounds += 1;
                    log::trace!("sound {}", sound.name());
                }
                GameEvent::WaveCleared { wave } => log::info!("Wave {} reached", wave + 1),
                GameEvent::ChainReaction { destroyed, .. } => {
                    chains += 1;
                    log::debug!("Chain reaction took {destroyed} invaders");
                }
                GameEvent::PhaseChanged { from, to } => {
                    log::debug!("{from:?} -> {to:?}");
                    if to == GamePhase::GameOver {
                        log::info!("Game over at score {}", state.score);
                    }
                }
            }
        }
    }

    println!(
        "seed {seed} (current run {}): score {} wave {} lives {} after {} ticks ({chains} chain reactions, {sounds} sounds)",
        state.seed,
        state.score,
        state.wave_index + 1,
        state.lives,
        state.time_ticks,
    );
}
