//! Paper Toss entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, TouchEvent};

    use paper_toss::Settings;
    use paper_toss::ar::ArSession;
    use paper_toss::audio::AudioManager;
    use paper_toss::platform::webvr::WebArSession;
    use paper_toss::renderer::{RenderState, scene_vertices};
    use paper_toss::sim::{GameEvent, InputEvent, Session};
    use paper_toss::ui::{LOCK_BUTTON_ID, MESSAGE_ID, Ui};

    /// Game instance holding all state
    struct Game {
        session: Session,
        ar: WebArSession,
        render_state: Option<RenderState>,
        audio: AudioManager,
        ui: Ui,
        canvas: HtmlCanvasElement,
    }

    impl Game {
        fn input(&mut self, event: InputEvent) {
            let Game { session, ar, .. } = self;
            session.handle_input(ar, event);
        }

        /// Advance the session and route what it produced
        fn update(&mut self, time: f64) {
            {
                let Game { session, ar, .. } = self;
                session.frame(ar, time);
            }

            for sound in self.audio.drain_completed() {
                self.input(InputEvent::SoundFinished(sound));
            }

            let events: Vec<GameEvent> = self.session.drain_events().collect();
            for event in &events {
                match event {
                    GameEvent::PlaySound(sound) => self.audio.play(*sound),
                    other => self.ui.apply(other),
                }
            }
        }

        /// Keep the drawing buffer matched to the displayed size
        fn sync_canvas_size(&mut self) {
            let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
            let width = (self.canvas.client_width() as f64 * dpr) as u32;
            let height = (self.canvas.client_height() as f64 * dpr) as u32;
            if width == 0 || height == 0 {
                return;
            }
            if self.canvas.width() != width || self.canvas.height() != height {
                self.canvas.set_width(width);
                self.canvas.set_height(height);
            }
            if let Some(render_state) = self.render_state.as_mut() {
                render_state.resize(width, height);
            }
        }

        /// Render the current frame
        fn render(&mut self) {
            self.ar.render_camera_feed();
            self.sync_canvas_size();

            let vertices = self
                .session
                .camera()
                .map(|camera| scene_vertices(self.session.scene(), camera))
                .unwrap_or_default();

            if let Some(render_state) = self.render_state.as_mut() {
                match render_state.render(&vertices) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }
    }

    fn viewport_size() -> Vec2 {
        let Some(window) = web_sys::window() else {
            return Vec2::ONE;
        };
        let w = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(1.0);
        let h = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(1.0);
        Vec2::new(w as f32, h as f32)
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Failed to init logger: {e}").into());
        }

        log::info!("Paper Toss starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document to attach to");
            return;
        };
        let ui = Ui::new(document.clone());

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let ar = match WebArSession::connect().await {
            Ok(ar) => ar,
            Err(e) => {
                ui.show_unsupported(&e.to_string());
                return;
            }
        };

        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No canvas element");
            return;
        };

        let settings = Settings::load();
        // Write back the sanitized values so every field is present for editing
        settings.save();
        let seed = js_sys::Date::now() as u64;
        let mut session = Session::new(settings.clone(), seed);
        // The intro banner is queued before anything listens
        for event in session.drain_events() {
            ui.apply(&event);
        }

        let game = Rc::new(RefCell::new(Game {
            session,
            ar,
            render_state: None,
            audio: AudioManager::new(&settings),
            ui,
            canvas: canvas.clone(),
        }));
        game.borrow_mut().sync_canvas_size();

        log::info!("Game initialized with seed: {}", seed);

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
            Ok(surface) => {
                let adapter = instance
                    .request_adapter(&wgpu::RequestAdapterOptions {
                        power_preference: wgpu::PowerPreference::HighPerformance,
                        compatible_surface: Some(&surface),
                        force_fallback_adapter: false,
                    })
                    .await;
                match adapter {
                    Ok(adapter) => {
                        log::info!("Using adapter: {:?}", adapter.get_info().name);
                        let (width, height) = (canvas.width(), canvas.height());
                        match RenderState::new(surface, &adapter, width, height).await {
                            Ok(render_state) => game.borrow_mut().render_state = Some(render_state),
                            Err(e) => log::error!("Failed to create device: {}", e),
                        }
                    }
                    Err(e) => log::error!("Failed to get adapter: {}", e),
                }
            }
            Err(e) => log::error!("Failed to create surface: {}", e),
        }

        setup_input_handlers(&canvas, game.clone());
        setup_buttons(&document, game.clone());

        // Start game loop
        request_animation_frame(game);

        log::info!("Paper Toss running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Touch start (start game, place basket, begin swipe)
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let Some(touch) = event.touches().get(0) else {
                    return;
                };
                let mut g = game.borrow_mut();
                g.audio.resume();
                g.input(InputEvent::TouchStart {
                    page: Vec2::new(touch.page_x() as f32, touch.page_y() as f32),
                    viewport: viewport_size(),
                    timestamp: event.time_stamp(),
                });
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch end (throw)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let Some(touch) = event.changed_touches().get(0) else {
                    return;
                };
                game.borrow_mut().input(InputEvent::TouchEnd {
                    page: Vec2::new(touch.page_x() as f32, touch.page_y() as f32),
                    viewport: viewport_size(),
                    timestamp: event.time_stamp(),
                });
            });
            let _ = canvas
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(document: &web_sys::Document, game: Rc<RefCell<Game>>) {
        let bindings = [
            (LOCK_BUTTON_ID, InputEvent::ToggleLock),
            (MESSAGE_ID, InputEvent::DismissMessage),
        ];
        for (id, input) in bindings {
            let Some(el) = document.get_element_by_id(id) else {
                log::warn!("Missing #{} element", id);
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                event.stop_propagation();
                game.borrow_mut().input(input);
            });
            let _ =
                el.add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }
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
            g.update(time);
            g.render();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Paper Toss (native) starting...");
    log::info!("Native mode has no AR device - run with `trunk serve` for the web version");

    headless_demo();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Place a basket in front of a simulated camera and throw a few balls at it
#[cfg(not(target_arch = "wasm32"))]
fn headless_demo() {
    use glam::{Quat, Vec2, Vec3};
    use paper_toss::Settings;
    use paper_toss::ar::FloorSession;
    use paper_toss::sim::{GameEvent, InputEvent, Session};

    const VIEWPORT: Vec2 = Vec2::new(360.0, 640.0);
    const FRAME_MS: f64 = 1000.0 / 60.0;

    fn pump(session: &mut Session, ar: &mut FloorSession, frames: usize) {
        for _ in 0..frames {
            let now = session.now_ms() + FRAME_MS;
            session.frame(ar, now);
            for event in session.drain_events() {
                match event {
                    GameEvent::ShowMessage { text, .. } => println!("  [banner] {text}"),
                    GameEvent::ScoreChanged { total, points } => {
                        println!("  [score] +{points} (total {total})")
                    }
                    GameEvent::Missed { streak } => println!("  [miss] streak {streak}"),
                    other => log::debug!("{:?}", other),
                }
            }
        }
    }

    fn touch(session: &mut Session, ar: &mut FloorSession, page: Vec2, start: bool) {
        let timestamp = session.now_ms();
        let event = if start {
            InputEvent::TouchStart {
                page,
                viewport: VIEWPORT,
                timestamp,
            }
        } else {
            InputEvent::TouchEnd {
                page,
                viewport: VIEWPORT,
                timestamp,
            }
        };
        session.handle_input(ar, event);
    }

    let mut ar = FloorSession::new(1.4, VIEWPORT.x / VIEWPORT.y);
    ar.set_pose(Vec3::new(0.0, 1.4, 0.0), Quat::from_rotation_x(-0.6));
    let mut session = Session::new(Settings::default(), 42);
    pump(&mut session, &mut ar, 1);

    // Start, then place the basket under the screen centre
    let centre = VIEWPORT * 0.5;
    touch(&mut session, &mut ar, centre, true);
    touch(&mut session, &mut ar, centre, true);
    touch(&mut session, &mut ar, centre, false);
    pump(&mut session, &mut ar, 1);

    if let Some(basket) = session.basket() {
        println!("Basket placed at {:?}", basket.position);
    }
    match session.toggle_lock() {
        Ok(locked) => println!("Basket locked: {locked}"),
        Err(e) => {
            println!("Could not lock: {e}");
            return;
        }
    }
    pump(&mut session, &mut ar, 2);

    // Swipes of increasing length
    for length in [80.0, 140.0, 200.0, 260.0, 320.0] {
        touch(&mut session, &mut ar, Vec2::new(180.0, 600.0), true);
        pump(&mut session, &mut ar, 12);
        touch(&mut session, &mut ar, Vec2::new(180.0, 600.0 - length), false);
        println!("Swipe {length}px");
        pump(&mut session, &mut ar, 150);
    }

    let score = session.score();
    println!(
        "Final score {} ({} consecutive misses, taunt stage {})",
        score.total, score.consecutive_misses, score.taunt_stage
    );
}
