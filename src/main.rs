//! Grid Invaders entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlInputElement, KeyboardEvent, MouseEvent};

    use grid_invaders::highscores::{LocalScoreStore, ScoreStore};
    use grid_invaders::hud::{self, HitFlashes};
    use grid_invaders::platform;
    use grid_invaders::sim::{GameEvent, GameSession, Input, SessionState};
    use grid_invaders::{Settings, format_elapsed};

    /// Game instance holding all state
    struct Game {
        session: GameSession,
        store: LocalScoreStore,
        /// One div per grid cell
        cells: Vec<Element>,
        flashes: HitFlashes,
    }

    impl Game {
        fn now() -> u64 {
            platform::now_ms() as u64
        }

        fn build_grid(&mut self, document: &Document) {
            let Some(grid) = document.query_selector(".grid").ok().flatten() else {
                log::warn!("Grid element not found");
                return;
            };
            grid.set_inner_html("");
            self.cells.clear();
            for _ in 0..self.session.grid().size() {
                if let Ok(cell) = document.create_element("div") {
                    let _ = grid.append_child(&cell);
                    self.cells.push(cell);
                }
            }
        }

        fn start(&mut self) {
            let document = web_sys::window().unwrap().document().unwrap();
            self.build_grid(&document);
            self.flashes.clear();
            self.session.start(Self::now());
            set_reload_bar(&document, 1.0, true);
            set_text(&document, "#game-timer", "Time: 0.0s");
            set_text(&document, ".results", "0");
            log::info!("Game started");
        }

        /// Advance timers and push everything that changed to the DOM
        fn update(&mut self) {
            let now = Self::now();
            self.session.advance_to(now);
            let document = web_sys::window().unwrap().document().unwrap();

            for event in self.session.drain_events() {
                self.flashes.observe(&event, now);
                match event {
                    GameEvent::EnemyDestroyed { score, .. } => {
                        set_text(&document, ".results", &score.to_string());
                    }
                    GameEvent::ElapsedTime { elapsed_ms } => {
                        let text = format!("Time: {}", format_elapsed(elapsed_ms));
                        set_text(&document, "#game-timer", &text);
                    }
                    GameEvent::ReloadProgress { ratio } => set_reload_bar(&document, ratio, false),
                    GameEvent::Reloaded => set_reload_bar(&document, 1.0, true),
                    GameEvent::GameOver {
                        outcome,
                        score,
                        elapsed_ms,
                    } => self.show_game_over(&document, outcome, score, elapsed_ms),
                    _ => {}
                }
            }

            self.flashes.expire(now);
            self.render();
        }

        /// Apply the current snapshot as cell classes
        fn render(&self) {
            let snapshot = self.session.snapshot();
            for (index, (cell, state)) in self.cells.iter().zip(snapshot.cells.iter()).enumerate() {
                let classes = cell.class_list();
                for class in ["invader", "shooter", "laser", "boom"] {
                    let _ = classes.remove_1(class);
                }
                if let Some(class) = state.css_class() {
                    let _ = classes.add_1(class);
                }
                if self.flashes.is_flashing(index) {
                    let _ = classes.add_1("boom");
                }
            }
        }

        fn show_game_over(
            &self,
            document: &Document,
            outcome: SessionState,
            score: u32,
            elapsed_ms: u64,
        ) {
            if outcome == SessionState::Won {
                set_text(document, ".results", "VICTORY!");
                set_text(document, "#final-invaders-score", &score.to_string());
                set_text(document, "#final-invaders-time", &format_elapsed(elapsed_ms));
                set_hidden(document, "#invaders-game-active-elements", true);
                set_hidden(document, "#invaders-win-dialog", false);
            } else {
                set_text(document, ".results", "OVERRUN");
                set_hidden(document, "#start-invaders-button", false);
            }
        }

        fn save_score(&mut self) {
            let window = web_sys::window().unwrap();
            let document = window.document().unwrap();
            let name = document
                .get_element_by_id("invader-player-name")
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
                .map(|input| input.value())
                .unwrap_or_default();

            let rank = self
                .store
                .rank_for(self.session.score() as u64)
                .unwrap_or(0);
            let message = match self.session.submit_score(&mut self.store, &name) {
                Ok(record) => {
                    set_hidden(&document, "#invaders-win-dialog", true);
                    set_hidden(&document, "#start-invaders-button", false);
                    format!(
                        "Score saved! ({} - {}, rank {})",
                        record.name, record.score, rank
                    )
                }
                Err(e) => format!("Error: {}", e),
            };
            let _ = window.alert_with_message(&message);
        }
    }

    fn set_text(document: &Document, selector: &str, text: &str) {
        if let Some(el) = document.query_selector(selector).ok().flatten() {
            el.set_text_content(Some(text));
        }
    }

    fn set_hidden(document: &Document, selector: &str, hidden: bool) {
        if let Some(el) = document.query_selector(selector).ok().flatten() {
            let classes = el.class_list();
            let _ = if hidden {
                classes.add_1("hidden")
            } else {
                classes.remove_1("hidden")
            };
        }
    }

    fn set_reload_bar(document: &Document, ratio: f32, ready: bool) {
        if let Some(el) = document.get_element_by_id("reload-bar-progress") {
            let _ = el.set_attribute("style", &hud::reload_bar_style(ratio, ready));
        }
    }

    pub fn run() {
        platform::init_logging();
        log::info!("Grid Invaders starting...");

        let settings = Settings::load();
        let session = match GameSession::with_settings(settings) {
            Ok(session) => session,
            Err(e) => {
                log::warn!("Settings rejected ({}), using defaults", e);
                GameSession::new()
            }
        };

        let game = Rc::new(RefCell::new(Game {
            session,
            store: LocalScoreStore::new(),
            cells: Vec::new(),
            flashes: HitFlashes::new(),
        }));

        setup_input_handlers(game.clone());
        setup_buttons(game.clone());
        request_animation_frame(game);

        log::info!("Grid Invaders running!");
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let document = web_sys::window().unwrap().document().unwrap();

        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            let input = match event.key().as_str() {
                "ArrowLeft" => Input::Left,
                "ArrowRight" => Input::Right,
                "ArrowUp" => Input::Fire,
                _ => return,
            };
            let mut g = game.borrow_mut();
            if !g.session.is_active() {
                return;
            }
            event.prevent_default();
            g.session.advance_to(Game::now());
            g.session.handle_input(input);
            g.render();
        });
        let _ =
            document.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let document = web_sys::window().unwrap().document().unwrap();

        if let Some(btn) = document.get_element_by_id("start-invaders-button") {
            let game = game.clone();
            let doc = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                set_hidden(&doc, "#invaders-game-active-elements", false);
                set_hidden(&doc, "#invaders-win-dialog", true);
                set_hidden(&doc, "#start-invaders-button", true);
                game.borrow_mut().start();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        } else {
            log::warn!("Start button not found, game will not start");
        }

        if let Some(btn) = document.get_element_by_id("save-invaders-score-button") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().save_score();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("play-again-from-win-button") {
            let doc = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                set_hidden(&doc, "#invaders-win-dialog", true);
                set_hidden(&doc, "#start-invaders-button", false);
                game.borrow_mut().session.reset();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |_time: f64| {
            game.borrow_mut().update();
            request_animation_frame(game);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    grid_invaders::platform::init_logging();
    log::info!("Grid Invaders (native) starting...");
    log::info!("Native mode runs a headless autopilot - use `trunk serve` for the web version");

    demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless autopilot session for native builds
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::cmp::{Ordering, Reverse};

    use grid_invaders::consts::PROJECTILE_TICK_MS;
    use grid_invaders::format_elapsed;
    use grid_invaders::highscores::{MemoryScoreStore, ScoreStore};
    use grid_invaders::hud::HitFlashes;
    use grid_invaders::sim::{CellState, GameSession, Grid, Input, Snapshot};

    /// A formation that slips past the shooter never ends the session
    const DEMO_LIMIT_MS: u64 = 10 * 60 * 1000;

    /// Chase the live member closest to the shooter's row, fire when aligned
    fn autopilot(session: &GameSession) -> Option<Input> {
        let grid = session.grid();
        let shooter_col = grid.col_of(session.shooter().index());
        let target = session.formation().live_cells().max_by_key(|&cell| {
            (
                grid.row_of(cell),
                Reverse(grid.col_of(cell).abs_diff(shooter_col)),
            )
        })?;

        match grid.col_of(target).cmp(&shooter_col) {
            Ordering::Less => Some(Input::Left),
            Ordering::Greater => Some(Input::Right),
            Ordering::Equal => Some(Input::Fire),
        }
    }

    fn glyph(cell: CellState) -> char {
        match cell {
            CellState::Empty => '.',
            CellState::Enemy => 'W',
            CellState::Shooter => 'A',
            CellState::Projectile => '|',
        }
    }

    /// ASCII board, recently destroyed enemies shown as `*`
    fn draw(grid: Grid, snapshot: &Snapshot, flashes: &HitFlashes) -> String {
        let mut rows = vec![vec!['.'; grid.width()]; snapshot.cells.len() / grid.width()];
        for (index, &cell) in snapshot.cells.iter().enumerate() {
            let at = grid.cell_coords(index);
            rows[at.y as usize][at.x as usize] = if flashes.is_flashing(index) {
                '*'
            } else {
                glyph(cell)
            };
        }
        rows.into_iter()
            .map(|row| row.into_iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn run() {
        let mut session = GameSession::new();
        let mut flashes = HitFlashes::new();
        session.start(0);

        let mut now = 0;
        while session.is_active() && now < DEMO_LIMIT_MS {
            now += PROJECTILE_TICK_MS;
            session.advance_to(now);
            for event in session.drain_events() {
                flashes.observe(&event, now);
            }
            flashes.expire(now);
            if let Some(input) = autopilot(&session) {
                session.handle_input(input);
            }
        }

        println!("{}\n", draw(session.grid(), &session.snapshot(), &flashes));
        let Some(result) = session.final_result() else {
            log::warn!("Demo stopped after {} without a result", format_elapsed(now));
            return;
        };
        println!(
            "{:?}: score {} in {}",
            result.outcome,
            result.score,
            format_elapsed(result.elapsed_ms)
        );

        let mut store = MemoryScoreStore::new();
        match session.submit_score(&mut store, "autopilot") {
            Ok(record) => println!("Recorded {} ({})", record.score, record.id),
            Err(e) => log::info!("Score not recorded: {}", e),
        }
        if let Ok(records) = store.list() {
            for (rank, record) in records.iter().enumerate() {
                println!("{:>3}. {:<20} {}", rank + 1, record.name, record.score);
            }
        }
    }

}
