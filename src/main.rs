//! Galton Board entry point
//!
//! On the web this wires the page controls to the simulation and runs the
//! animation loop. Natively it runs one headless simulation and prints the
//! resulting histogram.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, HtmlInputElement};

    use galton_board::config::{SimConfig, parse_count};
    use galton_board::renderer::{CanvasRenderer, Scene};
    use galton_board::sim::Simulation;

    /// Frame time assumed for the first frame after (re)starting the loop
    const FIRST_FRAME_MS: f64 = 1000.0 / 60.0;
    /// Longest frame fed to the simulation (tab switches, debugger pauses)
    const MAX_FRAME_MS: f64 = 100.0;

    /// Application instance holding all state
    struct App {
        sim: Simulation,
        renderer: CanvasRenderer,
        last_time: f64,
        /// An animation frame callback is pending
        frame_scheduled: bool,
    }

    impl App {
        fn redraw(&self) {
            self.renderer.draw(&Scene::from_simulation(&self.sim));
        }

        /// Canvas was resized by the page layout
        fn resize(&mut self) {
            let (width, height) = self.renderer.fit_to_client();
            self.sim.resize(width, height);
            self.redraw();
        }

        /// Read the row and ball fields into the simulation config
        fn apply_inputs(&mut self, document: &Document) {
            let config = self.sim.config().clone();
            if let Some(input) = input_element(document, "rows-input") {
                let rows = parse_count(&input.value(), config.rows);
                if rows != self.sim.board().rows {
                    self.sim.set_rows(rows);
                }
            }
            if let Some(input) = input_element(document, "balls-input") {
                self.sim.set_balls(parse_count(&input.value(), config.balls));
            }
        }

        fn start(&mut self, document: &Document) {
            self.apply_inputs(document);
            self.sim.set_seed(js_sys::Date::now() as u64);
            self.sim.start();
            self.sim.config().save();
            self.redraw();
        }

        fn reset(&mut self) {
            self.sim.reset();
            self.redraw();
            log::info!("Board reset");
        }
    }

    fn input_element(document: &Document, id: &str) -> Option<HtmlInputElement> {
        document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
    }

    /// Show the restored config in the page controls
    fn populate_inputs(document: &Document, config: &SimConfig) {
        if let Some(input) = input_element(document, "rows-input") {
            input.set_value(&config.rows.to_string());
        }
        if let Some(input) = input_element(document, "balls-input") {
            input.set_value(&config.balls.to_string());
        }
        if let Some(input) = input_element(document, "speed-slider") {
            input.set_value(&config.speed.to_string());
        }
        set_speed_label(document, config.speed);
    }

    fn set_speed_label(document: &Document, speed: u32) {
        if let Some(el) = document.get_element_by_id("speed-value") {
            el.set_text_content(Some(&format!("{}x", speed)));
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Failed to init logger: {}", e).into());
        }

        log::info!("Galton Board starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document available");
            return;
        };

        let Some(canvas) = document
            .get_element_by_id("galton-canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No #galton-canvas element");
            return;
        };

        let renderer = match CanvasRenderer::new(canvas) {
            Ok(renderer) => renderer,
            Err(e) => {
                log::error!("Canvas setup failed: {:?}", e);
                return;
            }
        };

        let config = SimConfig::load();
        populate_inputs(&document, &config);

        let (width, height) = renderer.fit_to_client();
        let app = Rc::new(RefCell::new(App {
            sim: Simulation::new(config, width, height),
            renderer,
            last_time: 0.0,
            frame_scheduled: false,
        }));
        app.borrow().redraw();

        setup_controls(&document, app.clone());
        setup_resize(app);

        log::info!("Galton Board ready");
    }

    fn on_click(document: &Document, id: &str, handler: impl FnMut(web_sys::Event) + 'static) {
        match document.get_element_by_id(id) {
            Some(el) => {
                let closure = Closure::<dyn FnMut(_)>::new(handler);
                let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
            None => log::warn!("No #{} element", id),
        }
    }

    fn setup_controls(document: &Document, app: Rc<RefCell<App>>) {
        // Start button
        {
            let app = app.clone();
            let start_document = document.clone();
            on_click(document, "start-btn", move |_event| {
                app.borrow_mut().start(&start_document);
                ensure_animation(app.clone());
            });
        }

        // Reset button
        {
            let app = app.clone();
            on_click(document, "reset-btn", move |_event| {
                app.borrow_mut().reset();
            });
        }

        // Row count change resets the board
        if let Some(input) = input_element(document, "rows-input") {
            let app = app.clone();
            let input_clone = input.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let mut a = app.borrow_mut();
                let rows = parse_count(&input_clone.value(), a.sim.config().rows);
                a.sim.set_rows(rows);
                a.redraw();
                log::info!("Rows set to {}", a.sim.config().rows);
            });
            let _ = input.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Speed slider applies immediately
        if let Some(input) = input_element(document, "speed-slider") {
            let document = document.clone();
            let input_clone = input.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let mut a = app.borrow_mut();
                let speed = parse_count(&input_clone.value(), a.sim.config().speed);
                a.sim.set_speed(speed);
                set_speed_label(&document, a.sim.config().speed);
            });
            let _ = input.add_event_listener_with_callback("input", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            app.borrow_mut().resize();
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Start the animation loop unless a frame is already pending
    fn ensure_animation(app: Rc<RefCell<App>>) {
        {
            let mut a = app.borrow_mut();
            if a.frame_scheduled || !a.sim.is_running() {
                return;
            }
            a.frame_scheduled = true;
            a.last_time = 0.0;
        }
        request_animation_frame(app);
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            animation_frame(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn animation_frame(app: Rc<RefCell<App>>, time: f64) {
        let keep_running = {
            let mut a = app.borrow_mut();

            let dt = if a.last_time > 0.0 {
                time - a.last_time
            } else {
                FIRST_FRAME_MS
            };
            a.last_time = time;

            a.sim.advance(dt.min(MAX_FRAME_MS));
            a.redraw();

            // Stop scheduling once the run is settled, stopped or reset
            let running = a.sim.is_running();
            if !running {
                a.frame_scheduled = false;
            }
            running
        };

        if keep_running {
            request_animation_frame(app);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_app::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use galton_board::{SimConfig, Simulation};

    env_logger::init();
    log::info!("Galton Board (native) starting...");

    let config = match std::env::args().nth(1) {
        Some(path) => match SimConfig::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => SimConfig::load(),
    };

    let mut sim = Simulation::new(config, headless::WIDTH, headless::HEIGHT);
    sim.set_seed(headless::clock_seed());
    sim.start();

    match sim.run_until_settled(headless::FRAME_MS, headless::MAX_FRAMES) {
        Some(frames) => log::info!("Settled after {} frames", frames),
        None => log::warn!("Gave up after {} frames", headless::MAX_FRAMES),
    }

    print!("{}", headless::histogram(sim.bin_counts()));
    println!("{}", sim.stats());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::fmt::Write;

    /// Virtual canvas size
    pub const WIDTH: f32 = 800.0;
    pub const HEIGHT: f32 = 600.0;
    /// One 60 Hz frame
    pub const FRAME_MS: f64 = 1000.0 / 60.0;
    /// About an hour of animation
    pub const MAX_FRAMES: u64 = 60 * 60 * 60;
    /// Width of the longest histogram bar
    const BAR_COLUMNS: u32 = 50;

    pub fn clock_seed() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }

    /// One text line per bin, bars scaled to the fullest bin
    pub fn histogram(counts: &[u32]) -> String {
        let max = counts.iter().copied().max().unwrap_or(0).max(1);
        let mut out = String::new();
        for (i, &count) in counts.iter().enumerate() {
            let len = (count as u64 * BAR_COLUMNS as u64 / max as u64) as usize;
            let _ = writeln!(out, "{:>3} | {:<width$} {}", i, "#".repeat(len), count, width = BAR_COLUMNS as usize);
        }
        out
    }
}
