//! App: terminal init, main loop, screens, key and mouse handling.

use crate::game::tile::{Tile, TileId};
use crate::game::{GameEvent, GameState};
use crate::input::{Action, key_to_action, mouse_click};
use crate::leaderboard::{
    FileLeaderboard, LeaderboardEntry, ScoreBoard, leaderboard_or_placeholder, submit_in_background,
};
use crate::profile::{MAX_NAME_LEN, Profile, normalize_name};
use crate::theme::Theme;
use crate::{GameConfig, GameMode, ui};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Menu,
    Playing,
    GameOver,
    Leaderboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Normal,
    Endless,
    Leaderboard,
    SwitchPlayer,
    Quit,
}

impl MenuItem {
    pub const ALL: [MenuItem; 5] = [
        MenuItem::Normal,
        MenuItem::Endless,
        MenuItem::Leaderboard,
        MenuItem::SwitchPlayer,
        MenuItem::Quit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal game",
            Self::Endless => "Endless game",
            Self::Leaderboard => "Leaderboard",
            Self::SwitchPlayer => "Switch player",
            Self::Quit => "Quit",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|&i| i == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    state: GameState,
    screen: Screen,
    menu_selected: MenuItem,
    profile: Profile,
    player: Option<String>,
    /// Name being typed on the login screen.
    name_input: String,
    scoreboard: Arc<dyn ScoreBoard>,
    leaderboard: Vec<LeaderboardEntry>,
    /// Screen to go back to when the leaderboard closes.
    leaderboard_return: Screen,
    /// Keyboard cursor over a pickable tile.
    cursor: Option<TileId>,
    /// Whether the finished game's score went to the leaderboard.
    submitted: bool,
    /// Background leaderboard writes not yet joined.
    submissions: Vec<JoinHandle<()>>,
    /// TachyonFX flash over the tray after a match.
    match_flash: Option<Effect>,
    /// Last time we processed the flash (for delta).
    match_flash_time: Option<Instant>,
    /// Terminal area of the last frame, for mouse hit-testing.
    area: Rect,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Result<Self> {
        let state = GameState::new(config.rules.clone(), config.seed)?;
        let profile = Profile::new(&config.profile_path);
        let player = config.player.clone().or_else(|| profile.load());
        let board = FileLeaderboard::new(&config.leaderboard_path);
        log::debug!(
            "leaderboard at {}, profile at {}",
            board.path().display(),
            profile.path().display()
        );
        let scoreboard: Arc<dyn ScoreBoard> = Arc::new(board);
        let mut app = Self {
            config,
            theme,
            state,
            screen: Screen::Login,
            menu_selected: MenuItem::Normal,
            profile,
            player,
            name_input: String::new(),
            scoreboard,
            leaderboard: Vec::new(),
            leaderboard_return: Screen::Menu,
            cursor: None,
            submitted: false,
            submissions: Vec::new(),
            match_flash: None,
            match_flash_time: None,
            area: Rect::default(),
        };
        if app.player.is_some() {
            app.after_login()?;
        }
        Ok(app)
    }

    /// Menu, or straight into a game when one was requested on the command line.
    fn after_login(&mut self) -> Result<()> {
        match self.config.start_mode.take() {
            Some(mode) => self.start_game(mode),
            None => {
                self.screen = Screen::Menu;
                Ok(())
            }
        }
    }

    fn start_game(&mut self, mode: GameMode) -> Result<()> {
        self.state.init_game(mode)?;
        self.screen = Screen::Playing;
        self.submitted = false;
        self.match_flash = None;
        self.match_flash_time = None;
        self.process_events();
        self.cursor = step_cursor(&self.state, None, true);
        Ok(())
    }

    fn to_menu(&mut self) {
        self.state.return_to_menu();
        self.screen = Screen::Menu;
        self.cursor = None;
    }

    fn open_leaderboard(&mut self) {
        self.leaderboard = leaderboard_or_placeholder(self.scoreboard.fetch_leaderboard());
        self.leaderboard_return = self.screen;
        self.screen = Screen::Leaderboard;
    }

    fn switch_player(&mut self) {
        if let Err(e) = self.profile.clear() {
            log::warn!("could not forget player: {}", e);
        }
        self.player = None;
        self.name_input.clear();
        self.screen = Screen::Login;
    }

    fn confirm_login(&mut self) -> Result<()> {
        let Some(name) = normalize_name(&self.name_input) else {
            return Ok(());
        };
        if let Err(e) = self.profile.save(&name) {
            log::warn!("could not remember player: {}", e);
        }
        log::info!("player {} logged in", name);
        self.player = Some(name);
        self.name_input.clear();
        self.after_login()
    }

    fn click(&mut self, id: TileId, now: Instant) {
        let outcome = self.state.on_click(id, now);
        log::trace!("click {:?}: {:?}", id, outcome);
        self.process_events();
        if self.state.phase.is_finished() {
            self.screen = Screen::GameOver;
        }
        let on_pickable = self
            .cursor
            .and_then(|c| self.state.tile(c))
            .is_some_and(|t| !t.hidden);
        if !on_pickable {
            self.cursor = step_cursor(&self.state, None, true);
        }
    }

    fn process_events(&mut self) {
        for event in self.state.drain_events() {
            match event {
                GameEvent::Matched { .. } => {
                    self.match_flash = Some(ui::match_flash_effect(&self.theme));
                    self.match_flash_time = None;
                }
                GameEvent::Finished { mode, score, .. } => self.submit_if_eligible(mode, score),
                _ => {}
            }
        }
    }

    /// Endless scores go to the leaderboard in the background, under the current player.
    fn submit_if_eligible(&mut self, mode: GameMode, score: u32) {
        if mode != GameMode::Endless || score == 0 {
            return;
        }
        let Some(name) = self.player.clone() else {
            return;
        };
        self.reap_submissions(false);
        self.submissions
            .push(submit_in_background(Arc::clone(&self.scoreboard), name, score));
        self.submitted = true;
    }

    /// Join finished submissions, or all of them when `wait` is set. A panicked one is logged.
    fn reap_submissions(&mut self, wait: bool) {
        let (done, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.submissions)
            .into_iter()
            .partition(|h| wait || h.is_finished());
        self.submissions = running;
        for handle in done {
            if handle.join().is_err() {
                log::warn!("score submission thread panicked");
            }
        }
    }

    /// Returns true when the app should exit.
    fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Result<bool> {
        if self.screen == Screen::Login {
            return self.handle_login_key(key);
        }
        let action = key_to_action(key);
        if action == Action::Quit {
            return Ok(true);
        }
        match self.screen {
            Screen::Login => {}
            Screen::Menu => match action {
                Action::Up | Action::Prev => self.menu_selected = self.menu_selected.prev(),
                Action::Down | Action::Next => self.menu_selected = self.menu_selected.next(),
                Action::Leaderboard => self.open_leaderboard(),
                Action::Back => return Ok(true),
                Action::Select => match self.menu_selected {
                    MenuItem::Normal => self.start_game(GameMode::Normal)?,
                    MenuItem::Endless => self.start_game(GameMode::Endless)?,
                    MenuItem::Leaderboard => self.open_leaderboard(),
                    MenuItem::SwitchPlayer => self.switch_player(),
                    MenuItem::Quit => return Ok(true),
                },
                _ => {}
            },
            Screen::Playing => match action {
                Action::Back | Action::Menu => self.to_menu(),
                Action::Restart => self.start_game(self.state.mode)?,
                Action::Prev => self.cursor = step_cursor(&self.state, self.cursor, false),
                Action::Next => self.cursor = step_cursor(&self.state, self.cursor, true),
                Action::Up => self.cursor = nearest_vertical(&self.state, self.cursor, false),
                Action::Down => self.cursor = nearest_vertical(&self.state, self.cursor, true),
                Action::Select => {
                    if let Some(id) = self.cursor {
                        self.click(id, now);
                    }
                }
                _ => {}
            },
            Screen::GameOver => match action {
                Action::Restart => self.start_game(self.state.mode)?,
                Action::Menu | Action::Back | Action::Select => self.to_menu(),
                Action::Leaderboard => self.open_leaderboard(),
                _ => {}
            },
            Screen::Leaderboard => {
                if matches!(action, Action::Back | Action::Select | Action::Leaderboard) {
                    self.screen = self.leaderboard_return;
                }
            }
        }
        Ok(false)
    }

    fn handle_login_key(&mut self, key: KeyEvent) -> Result<bool> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(key.code == KeyCode::Char('c'));
        }
        match key.code {
            KeyCode::Esc => return Ok(true),
            KeyCode::Enter => self.confirm_login()?,
            KeyCode::Backspace => {
                self.name_input.pop();
            }
            KeyCode::Char(c) if !c.is_control() && self.name_input.chars().count() < MAX_NAME_LEN => {
                self.name_input.push(c);
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        if self.screen != Screen::Playing {
            return;
        }
        let Some((col, row)) = mouse_click(mouse) else {
            return;
        };
        if let Some(id) = ui::tile_at(self.area, &self.state, col, row) {
            self.cursor = Some(id);
            self.click(id, now);
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal = ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        // Let pending leaderboard writes land before exiting.
        self.reap_submissions(true);
        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.config.frame_rate);
        loop {
            let now = Instant::now();
            let view = ui::View {
                screen: self.screen,
                state: &self.state,
                theme: &self.theme,
                player: self.player.as_deref(),
                name_input: &self.name_input,
                menu_selected: self.menu_selected,
                leaderboard: &self.leaderboard,
                cursor: self.cursor,
                submitted: self.submitted,
                now,
            };
            let flash = &mut self.match_flash;
            let flash_time = &mut self.match_flash_time;
            let mut area = self.area;
            terminal.draw(|f| {
                area = f.area();
                ui::draw(f, &view, flash, flash_time);
            })?;
            self.area = area;

            if self.match_flash.as_ref().is_some_and(|e| e.done()) {
                self.match_flash = None;
                self.match_flash_time = None;
            }

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            if self.handle_key(key, Instant::now())? {
                                return Ok(());
                            }
                        }
                        Event::Mouse(mouse) => self.handle_mouse(mouse, Instant::now()),
                        _ => {}
                    }
                }
            }
        }
    }
}

/// Pickable tiles in reading order (top to bottom, left to right).
fn reading_order(state: &GameState) -> Vec<TileId> {
    let mut tiles: Vec<_> = state.clickable().collect();
    tiles.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
    tiles.into_iter().map(|t| t.id).collect()
}

/// Next (or previous) pickable tile after `current`, wrapping. Starts at the first one.
fn step_cursor(state: &GameState, current: Option<TileId>, forward: bool) -> Option<TileId> {
    let order = reading_order(state);
    if order.is_empty() {
        return None;
    }
    let Some(pos) = current.and_then(|c| order.iter().position(|&id| id == c)) else {
        return order.first().copied();
    };
    let len = order.len();
    let next = if forward { (pos + 1) % len } else { (pos + len - 1) % len };
    Some(order[next])
}

/// Closest pickable tile strictly below (or above) the cursor; stays put if there is none.
fn nearest_vertical(state: &GameState, current: Option<TileId>, down: bool) -> Option<TileId> {
    let Some(from) = current.and_then(|c| state.tile(c)) else {
        return step_cursor(state, None, true);
    };
    let (fx, fy) = (from.x, from.y);
    state
        .clickable()
        .filter(|t| if down { t.y > fy } else { t.y < fy })
        .min_by(|a, b| {
            let key = |t: &Tile| ((t.y - fy).abs(), (t.x - fx).abs());
            let (ka, kb) = (key(*a), key(*b));
            ka.0.total_cmp(&kb.0).then(ka.1.total_cmp(&kb.1))
        })
        .map(|t| t.id)
        .or(current)
}
