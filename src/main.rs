//! Stellar Vanguard entry point
//!
//! Browser: wires the canvas, DOM screens and backend to the orchestrator and
//! drives it from `requestAnimationFrame`. Native: plays one seeded match
//! headless with an autopilot against the in-memory backend.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, HtmlInputElement, KeyboardEvent, PointerEvent};

    use stellar_vanguard::config::BackendConfig;
    use stellar_vanguard::leaderboard::{
        EMPTY_MESSAGE, LEADERBOARD_LIMIT, LeaderboardCache, LeaderboardView,
    };
    use stellar_vanguard::overlay::assets::fetch_model;
    use stellar_vanguard::persistence::tasks::WasmSpawner;
    use stellar_vanguard::persistence::{
        LeaderboardEntry, MemoryGateway, Pending, PersistenceClient, PersistenceGateway,
        RestGateway, UserRef,
    };
    use stellar_vanguard::renderer::{RenderState, frame_vertices};
    use stellar_vanguard::sim::{GameEvent, Orchestrator, SaveStatus};
    use stellar_vanguard::ui::{self, Screen, ScreenFlow, UiAction};
    use stellar_vanguard::{Difficulty, ScreenPos, Settings, Viewport};

    /// Game instance holding all state
    struct Game {
        orch: Orchestrator,
        flow: ScreenFlow,
        shown: Option<Screen>,
        settings: Settings,
        client: PersistenceClient,
        http: reqwest::Client,
        asset_base: String,
        render_state: Option<RenderState>,
        canvas_size: (f32, f32),

        board: LeaderboardView,
        board_cache: LeaderboardCache,
        board_request: Option<Pending<Vec<LeaderboardEntry>>>,
        /// Fetch the board once the pending score submission settles
        board_after_save: bool,
        auth_request: Option<Pending<UserRef>>,
        name_update: Option<Pending<()>>,
        account_status: String,

        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        fn new(seed: u64, client: PersistenceClient, asset_base: String) -> Self {
            let settings = Settings::load();
            let viewport = Viewport::default();
            let orch = Orchestrator::new(settings.tuning(), viewport, seed)
                .with_persistence(client.clone());
            let account_status = ui::account_text(client.current_user().as_ref());
            Self {
                orch,
                flow: ScreenFlow::new(),
                shown: None,
                settings,
                client,
                http: reqwest::Client::new(),
                asset_base,
                render_state: None,
                canvas_size: (viewport.width, viewport.height),
                board: LeaderboardView::loading(),
                board_cache: LeaderboardCache::load(),
                board_request: None,
                board_after_save: false,
                auth_request: None,
                name_update: None,
                account_status,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            }
        }

        /// Canvas-relative CSS pixels -> screen space
        fn to_screen(&self, x: f32, y: f32) -> ScreenPos {
            let vp = self.orch.viewport();
            let (w, h) = self.canvas_size;
            ScreenPos::new(x * vp.width / w.max(1.0), y * vp.height / h.max(1.0))
        }

        fn start_match(&mut self, action: UiAction) {
            if !self.flow.apply(action) {
                return;
            }
            self.orch.set_tuning(self.settings.tuning());
            self.orch.set_scrolling(self.settings.effective_scrolling());
            self.orch.set_flash_enabled(self.settings.effective_damage_flash());
            self.orch.set_pilot_name(self.settings.display_name.clone());
            self.orch.restart();
        }

        fn to_main_menu(&mut self) {
            if self.flow.apply(UiAction::MainMenu) {
                self.orch.restart();
            }
        }

        fn open_leaderboard(&mut self) {
            self.board = LeaderboardView::loading();
            let saving = self
                .orch
                .result()
                .is_some_and(|r| r.save == SaveStatus::Pending);
            if saving {
                self.board_after_save = true;
            } else {
                self.board_request = Some(self.client.leaderboard(LEADERBOARD_LIMIT));
            }
        }

        fn submit_name(&mut self, raw: &str) -> Result<(), ui::NameError> {
            let name = ui::validate_name(raw)?;
            self.settings.remember_name(&name);
            self.settings.save();
            self.orch.set_pilot_name(Some(name.clone()));

            // A held score carries the name with it; otherwise just rename
            if !self.orch.submit_with_name(&name) {
                if let Some(user) = self.client.current_user() {
                    self.name_update = Some(self.client.update_display_name(&user.id, &name));
                }
            }
            if self.flow.apply(UiAction::NameSubmitted) {
                self.open_leaderboard();
            }
            Ok(())
        }

        fn cycle_difficulty(&mut self) {
            self.settings.difficulty = match self.settings.difficulty {
                Difficulty::Recruit => Difficulty::Veteran,
                Difficulty::Veteran => Difficulty::Ace,
                Difficulty::Ace => Difficulty::Recruit,
            };
            self.settings.save();
        }

        /// Hand queued model loads to the browser
        fn dispatch_asset_loads(&mut self) {
            for req in self.orch.overlay_mut().loader.take_requests() {
                let http = self.http.clone();
                let base = self.asset_base.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    let result = fetch_model(&http, &base, &req.path).await;
                    req.resolve(result);
                });
            }
        }

        fn poll_requests(&mut self) {
            if self.board_after_save
                && !self
                    .orch
                    .result()
                    .is_some_and(|r| r.save == SaveStatus::Pending)
            {
                self.board_after_save = false;
                self.board_request = Some(self.client.leaderboard(LEADERBOARD_LIMIT));
            }

            if let Some(result) = self.board_request.as_mut().and_then(Pending::poll_ready) {
                self.board_request = None;
                self.board = LeaderboardView::from_result(
                    result,
                    &mut self.board_cache,
                    chrono::Utc::now(),
                );
                self.render_leaderboard();
            }

            if let Some(result) = self.auth_request.as_mut().and_then(Pending::poll_ready) {
                self.auth_request = None;
                self.account_status = match result {
                    Ok(user) => ui::account_text(Some(&user)),
                    Err(e) => {
                        log::warn!("Sign-in failed: {e}");
                        format!("Sign-in failed: {e}")
                    }
                };
            }

            if let Some(result) = self.name_update.as_mut().and_then(Pending::poll_ready) {
                self.name_update = None;
                if let Err(e) = result {
                    log::warn!("Updating display name failed: {e}");
                }
            }
        }

        fn update(&mut self, time: f64) {
            self.poll_requests();
            self.dispatch_asset_loads();

            let playing = self.flow.current() == Screen::Gameplay;
            // Terminal phases only poll the score submission
            if playing || self.orch.phase().is_terminal() {
                self.orch.tick(time);
            }
            for event in self.orch.drain_events() {
                match event {
                    GameEvent::Victory { score } | GameEvent::GameOver { score } => {
                        log::info!("Final score {score}");
                    }
                    GameEvent::ScoreSaveFailed(e) => log::warn!("Score not saved: {e}"),
                    _ => {}
                }
            }
            if playing && self.orch.phase().is_terminal() {
                self.flow.apply(UiAction::MatchEnded);
            }
        }

        fn render(&mut self) {
            let vertices = frame_vertices(&self.orch);
            if let Some(rs) = self.render_state.as_mut() {
                if let Err(e) = rs.render(&vertices) {
                    log::warn!("Render failed: {e:?}");
                    let (w, h) = rs.size;
                    rs.resize(w, h);
                }
            }
        }

        fn track_fps(&mut self, time: f64) {
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % self.frame_times.len();
            let oldest = self.frame_times[self.frame_index];
            if oldest > 0.0 && time > oldest {
                self.fps = ((self.frame_times.len() - 1) as f64 * 1000.0 / (time - oldest)) as u32;
            }
        }

        fn update_hud(&mut self) {
            let Some(document) = dom() else {
                return;
            };

            let current = self.flow.current();
            if self.shown != Some(current) {
                for screen in Screen::ALL {
                    set_visible(&document, screen.element_id(), screen == current);
                }
                self.shown = Some(current);
            }

            set_text(&document, "hud-score", &ui::score_text(self.orch.score()));
            set_text(&document, "hud-health", &ui::health_text(self.orch.health()));
            set_visible(&document, "hud-fps", self.settings.show_fps);
            if self.settings.show_fps {
                set_text(&document, "hud-fps", &format!("{} FPS", self.fps));
            }
            set_text(&document, "account-status", &self.account_status);
            set_text(
                &document,
                "difficulty-btn",
                &format!("Difficulty: {}", self.settings.difficulty.as_str()),
            );

            if let Some(result) = self.orch.result() {
                let (title, body) = ui::results_text(result);
                set_text(&document, "results-title", &title);
                set_text(&document, "results-body", &body);
                set_text(&document, "results-save", ui::save_status_text(&result.save));
            }
        }

        fn render_leaderboard(&self) {
            let Some(document) = dom() else {
                return;
            };
            set_text(
                &document,
                "leaderboard-status",
                self.board.status.as_deref().unwrap_or(""),
            );
            set_visible(&document, "leaderboard-empty", self.board.is_empty());
            set_text(&document, "leaderboard-empty", EMPTY_MESSAGE);

            let Some(list) = document.get_element_by_id("leaderboard-rows") else {
                return;
            };
            list.set_inner_html("");
            let you = self.client.current_user().map(|u| u.id);
            for row in self.board.rows(chrono::Utc::now(), you.as_deref()) {
                let Ok(li) = document.create_element("li") else {
                    continue;
                };
                if row.is_you {
                    let _ = li.class_list().add_1("you");
                }
                let score = row.score.to_string();
                for (class, text) in [
                    ("rank", row.rank_label.as_str()),
                    ("name", row.name.as_str()),
                    ("score", score.as_str()),
                    ("played", row.last_played.as_str()),
                ] {
                    let Ok(span) = document.create_element("span") else {
                        continue;
                    };
                    let _ = span.set_attribute("class", class);
                    span.set_text_content(Some(text));
                    if class == "rank" {
                        if let Some(medal) = row.medal {
                            let _ = span.set_attribute("style", &format!("color: {}", medal.color()));
                        }
                    }
                    let _ = li.append_child(&span);
                }
                let _ = list.append_child(&li);
            }
        }
    }

    fn dom() -> Option<Document> {
        web_sys::window().and_then(|w| w.document())
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", !visible);
        }
    }

    fn input_value(document: &Document, id: &str) -> String {
        document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            .map(|input| input.value())
            .unwrap_or_default()
    }

    /// Build the backend: hosted if configured at build time, in-memory otherwise
    fn connect_backend(settings: &Settings) -> Rc<dyn PersistenceGateway> {
        match BackendConfig::from_build_env() {
            Some(config) => {
                log::info!("Using hosted leaderboard at {}", config.database_url);
                Rc::new(RestGateway::new(config))
            }
            None => {
                log::warn!("No backend configured; scores stay in this tab");
                let name = settings.display_name.as_deref().unwrap_or("Pilot");
                Rc::new(MemoryGateway::with_guest("local-guest", name))
            }
        }
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Stellar Vanguard starting...");

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or_else(|| JsValue::from_str("no canvas"))?
            .dyn_into()?;

        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width();
        let client_h = canvas.client_height();
        let width = (client_w as f64 * dpr) as u32;
        let height = (client_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let asset_base = window.location().origin()?;
        let seed = js_sys::Date::now() as u64;
        let gateway = connect_backend(&Settings::load());
        let client = PersistenceClient::new(gateway.clone(), Rc::new(WasmSpawner));
        wasm_bindgen_futures::spawn_local(async move {
            let report = gateway.probe_access().await;
            match &report.error {
                Some(e) => log::warn!("Backend access check: {e}"),
                None => log::info!(
                    "Backend access: signed in {}, read {}, write {}",
                    report.authenticated,
                    report.can_read_users,
                    report.can_write_own_data
                ),
            }
        });
        let game = Rc::new(RefCell::new(Game::new(seed, client, asset_base)));
        game.borrow_mut().canvas_size = (client_w as f32, client_h as f32);

        log::info!("Game initialized with seed: {}", seed);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });
        match init_renderer(&instance, canvas.clone(), width, height, &game).await {
            Ok(rs) => game.borrow_mut().render_state = Some(rs),
            Err(e) => log::error!("Rendering unavailable: {e}"),
        }

        setup_input_handlers(&canvas, game.clone());
        setup_buttons(&document, game.clone());

        game.borrow_mut().flow.apply(UiAction::BootComplete);
        request_animation_frame(game);

        log::info!("Stellar Vanguard running!");
        Ok(())
    }

    async fn init_renderer(
        instance: &wgpu::Instance,
        canvas: HtmlCanvasElement,
        width: u32,
        height: u32,
        game: &Rc<RefCell<Game>>,
    ) -> Result<RenderState, String> {
        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas))
            .map_err(|e| e.to_string())?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| e.to_string())?;
        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let camera = game.borrow().orch.overlay().camera;
        RenderState::new(surface, &adapter, width, height, camera)
            .await
            .map_err(|e| e.to_string())
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Press starts a drag and jumps the ship to the pointer
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.prevent_default();
                let _ = canvas_clone.set_pointer_capture(event.pointer_id());
                let mut g = game.borrow_mut();
                let pos = g.to_screen(event.offset_x() as f32, event.offset_y() as f32);
                g.orch.pointer_down(pos);
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let mut g = game.borrow_mut();
                let pos = g.to_screen(event.offset_x() as f32, event.offset_y() as f32);
                g.orch.pointer_move(pos);
            });
            let _ = canvas
                .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        for kind in ["pointerup", "pointercancel"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                game.borrow_mut().orch.pointer_up();
            });
            let _ = canvas.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Track CSS size for pointer scaling
        {
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let mut g = game.borrow_mut();
                g.canvas_size = (
                    canvas_clone.client_width() as f32,
                    canvas_clone.client_height() as f32,
                );
            });
            if let Some(window) = web_sys::window() {
                let _ = window
                    .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            }
            closure.forget();
        }
    }

    fn on_click(document: &Document, id: &str, game: &Rc<RefCell<Game>>, f: fn(&mut Game)) {
        let Some(btn) = document.get_element_by_id(id) else {
            log::warn!("Missing #{id}; button disabled");
            return;
        };
        let game = game.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            f(&mut game.borrow_mut());
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn submit_name_form(g: &mut Game) {
        let Some(document) = dom() else {
            return;
        };
        let raw = input_value(&document, "name-input");
        let message = match g.submit_name(&raw) {
            Ok(()) => String::new(),
            Err(e) => e.to_string(),
        };
        set_text(&document, "name-error", &message);
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        on_click(document, "start-btn", &game, |g| g.start_match(UiAction::StartGame));
        on_click(document, "restart-btn", &game, |g| g.start_match(UiAction::Restart));
        on_click(document, "results-menu-btn", &game, Game::to_main_menu);
        on_click(document, "leaderboard-menu-btn", &game, Game::to_main_menu);
        on_click(document, "difficulty-btn", &game, Game::cycle_difficulty);
        for id in ["menu-leaderboard-btn", "results-leaderboard-btn"] {
            on_click(document, id, &game, |g| {
                if g.flow.apply(UiAction::OpenLeaderboard) {
                    g.open_leaderboard();
                }
            });
        }
        on_click(document, "leaderboard-back-btn", &game, |g| {
            g.flow.apply(UiAction::Back);
        });
        on_click(document, "enter-name-btn", &game, |g| {
            if g.flow.apply(UiAction::EnterName) {
                if let (Some(document), Some(name)) = (dom(), g.settings.display_name.as_deref())
                {
                    if let Some(input) = document
                        .get_element_by_id("name-input")
                        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
                    {
                        input.set_value(name);
                    }
                }
            }
        });
        on_click(document, "name-cancel-btn", &game, |g| {
            g.flow.apply(UiAction::Back);
        });
        on_click(document, "name-submit-btn", &game, submit_name_form);

        on_click(document, "sign-in-btn", &game, |g| {
            if let Some(document) = dom() {
                let email = input_value(&document, "email-input");
                let password = input_value(&document, "password-input");
                g.account_status = "Signing in...".to_string();
                g.auth_request = Some(g.client.sign_in_with_email(email.trim(), &password));
            }
        });
        on_click(document, "create-account-btn", &game, |g| {
            if let Some(document) = dom() {
                let email = input_value(&document, "email-input");
                let password = input_value(&document, "password-input");
                g.account_status = "Creating account...".to_string();
                g.auth_request = Some(g.client.create_account(email.trim(), &password));
            }
        });
        on_click(document, "sign-out-btn", &game, |g| {
            // Session is cleared synchronously; the pending result is not needed
            drop(g.client.sign_out());
            g.account_status = ui::account_text(None);
        });

        // Enter in the name field submits
        if let Some(input) = document.get_element_by_id("name-input") {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if event.key() == "Enter" {
                    event.prevent_default();
                    submit_name_form(&mut game.borrow_mut());
                }
            });
            let _ = input.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
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
            g.track_fps(time);
            g.update(time);
            g.render();
            g.update_hud();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    if let Err(e) = wasm_game::run().await {
        log::error!("Startup failed: {e:?}");
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::rc::Rc;

    use chrono::Utc;
    use futures::executor::LocalPool;

    use stellar_vanguard::consts::PLAYER_START_Y;
    use stellar_vanguard::leaderboard::{LEADERBOARD_LIMIT, LeaderboardCache, LeaderboardView};
    use stellar_vanguard::overlay::assets::bundled_model;
    use stellar_vanguard::persistence::tasks::PoolSpawner;
    use stellar_vanguard::persistence::{MemoryGateway, PersistenceClient};
    use stellar_vanguard::sim::{Faction, GameEvent, Orchestrator};
    use stellar_vanguard::ui;
    use stellar_vanguard::{Difficulty, Tuning, Viewport, VisualPos};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Give up after five simulated minutes
    const MATCH_LIMIT_MS: f64 = 300_000.0;

    /// Steer under the lowest enemy, sidestepping incoming fire
    fn autopilot_target(orch: &Orchestrator) -> VisualPos {
        let viewport = orch.viewport();
        let ship_x = orch.player().map_or(0.0, |p| p.position().x());

        let mut x = orch
            .enemy_positions()
            .filter(|e| e.y() > PLAYER_START_Y)
            .min_by(|a, b| a.y().total_cmp(&b.y()))
            .map_or(ship_x, |e| e.x());

        let threat = orch
            .bullets()
            .filter(|(faction, _)| *faction == Faction::Enemy)
            .map(|(_, b)| viewport.to_visual(b.pos))
            .find(|b| (b.x() - x).abs() < 30.0 && b.y() > PLAYER_START_Y && b.y() - PLAYER_START_Y < 120.0);
        if let Some(bullet) = threat {
            x = if bullet.x() >= x { x - 45.0 } else { x + 45.0 };
        }
        VisualPos::new(x.clamp(-380.0, 380.0), PLAYER_START_Y)
    }

    pub fn run(seed: u64, difficulty: Difficulty) {
        let mut pool = LocalPool::new();
        let gateway = Rc::new(MemoryGateway::with_guest("local-pilot", "Autopilot"));
        let client = PersistenceClient::new(gateway, Rc::new(PoolSpawner::new(&pool)));
        let viewport = Viewport::default();
        let mut orch = Orchestrator::new(Tuning::for_difficulty(difficulty), viewport, seed)
            .with_persistence(client.clone());

        log::info!("Headless match: seed {seed}, {}", difficulty.as_str());

        let mut now = 0.0;
        let mut pressed = false;
        while now < MATCH_LIMIT_MS {
            for req in orch.overlay_mut().loader.take_requests() {
                let result = bundled_model(&req.path);
                req.resolve(result);
            }

            orch.tick(now);
            pool.run_until_stalled();

            for event in orch.drain_events() {
                match event {
                    GameEvent::EnemyDestroyed { id, score } => {
                        log::debug!("Enemy {id} down, score {score}");
                    }
                    GameEvent::PlayerHit { health } => log::debug!("Hit! health {health}"),
                    _ => {}
                }
            }
            if orch.phase().is_terminal() {
                break;
            }

            let target = viewport.to_screen(autopilot_target(&orch));
            if pressed {
                orch.pointer_move(target);
            } else {
                orch.pointer_down(target);
                pressed = true;
            }
            now += FRAME_MS;
        }

        // One more tick collects the score submission
        pool.run_until_stalled();
        orch.tick(now + FRAME_MS);

        let Some(result) = orch.result() else {
            log::warn!("Match did not finish within {} s", MATCH_LIMIT_MS / 1000.0);
            return;
        };
        let (title, body) = ui::results_text(result);
        println!("{title} {body}");
        println!("{}", ui::save_status_text(&result.save));

        let mut board = client.leaderboard(LEADERBOARD_LIMIT);
        pool.run_until_stalled();
        let Some(fetched) = board.poll_ready() else {
            log::warn!("Leaderboard request did not complete");
            return;
        };
        let mut cache = LeaderboardCache::new();
        let view = LeaderboardView::from_result(fetched, &mut cache, Utc::now());
        for row in view.rows(Utc::now(), Some("local-pilot")) {
            println!(
                "{:>4}  {:<16} {:>5}  {}",
                row.rank_label, row.name, row.score, row.last_played
            );
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Stellar Vanguard (native) starting...");

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(2024);
    let difficulty = args
        .next()
        .and_then(|s| stellar_vanguard::Difficulty::parse(&s))
        .unwrap_or_default();
    headless::run(seed, difficulty);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
