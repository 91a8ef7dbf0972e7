//! Layout and drawing: login, menu, board, sidebar/tray, leaderboard, game over.

use crate::app::{MenuItem, Screen};
use crate::game::tile::{Tile, TileId};
use crate::game::{GameState, Phase};
use crate::leaderboard::LeaderboardEntry;
use crate::theme::Theme;
use crate::GameMode;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

pub const SIDEBAR_WIDTH: u16 = 26;

/// Logical board window drawn on screen: covers the pyramid and every refill position.
const WORLD_MIN: f32 = -10.0;
const WORLD_SPAN: f32 = 570.0;

/// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: f32 = 2.0;

/// Tray flash after a match (TachyonFX fade).
const MATCH_FLASH_MS: u32 = 350;

/// Everything the renderer reads for one frame.
pub struct View<'a> {
    pub screen: Screen,
    pub state: &'a GameState,
    pub theme: &'a Theme,
    pub player: Option<&'a str>,
    pub name_input: &'a str,
    pub menu_selected: MenuItem,
    pub leaderboard: &'a [LeaderboardEntry],
    pub cursor: Option<TileId>,
    pub submitted: bool,
    pub now: Instant,
}

/// Maps logical board coordinates to terminal cells inside the board frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardGeometry {
    inner: Rect,
    scale_x: f32,
    scale_y: f32,
    tile_w: u16,
    tile_h: u16,
}

impl BoardGeometry {
    pub fn new(inner: Rect, tile_size: f32) -> Self {
        let fit_w = f32::from(inner.width) / WORLD_SPAN;
        let fit_h = f32::from(inner.height) * CELL_ASPECT / WORLD_SPAN;
        let scale_x = fit_w.min(fit_h);
        let scale_y = scale_x / CELL_ASPECT;
        Self {
            inner,
            scale_x,
            scale_y,
            tile_w: (tile_size * scale_x).round().max(3.0) as u16,
            tile_h: (tile_size * scale_y).round().max(1.0) as u16,
        }
    }

    /// Screen rect of a tile, clipped to the board.
    pub fn tile_rect(&self, tile: &Tile) -> Rect {
        let col = ((tile.x - WORLD_MIN) * self.scale_x).round().max(0.0) as u16;
        let row = ((tile.y - WORLD_MIN) * self.scale_y).round().max(0.0) as u16;
        Rect {
            x: self.inner.x.saturating_add(col),
            y: self.inner.y.saturating_add(row),
            width: self.tile_w,
            height: self.tile_h,
        }
        .intersection(self.inner)
    }
}

/// Board frame and sidebar for the playing area; shared by drawing and hit-testing.
fn game_areas(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(SIDEBAR_WIDTH)])
        .split(area);
    (chunks[0], chunks[1])
}

fn board_block(title: String, theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, Style::default().fg(theme.title)))
}

fn board_geometry(area: Rect, state: &GameState) -> BoardGeometry {
    let (board_area, _) = game_areas(area);
    let inner = Block::default().borders(Borders::ALL).inner(board_area);
    BoardGeometry::new(inner, state.rules().layout.tile_size)
}

/// Board tiles bottom layer first (draw order).
fn draw_order(state: &GameState) -> Vec<&Tile> {
    let mut tiles: Vec<&Tile> = state.board().iter().collect();
    tiles.sort_by_key(|t| t.layer);
    tiles
}

/// Top-most tile drawn at terminal cell (`col`, `row`), covered or not.
pub fn tile_at(area: Rect, state: &GameState, col: u16, row: u16) -> Option<TileId> {
    let geometry = board_geometry(area, state);
    let point = ratatui::layout::Position { x: col, y: row };
    draw_order(state)
        .into_iter()
        .rev()
        .find(|t| geometry.tile_rect(t).contains(point))
        .map(|t| t.id)
}

pub fn match_flash_effect(theme: &Theme) -> Effect {
    fx::fade_from(theme.title, theme.title, (MATCH_FLASH_MS, Interpolation::Linear))
}

/// Draw the current screen. `match_flash` is processed over the tray while it runs.
pub fn draw(
    frame: &mut Frame,
    view: &View,
    match_flash: &mut Option<Effect>,
    match_flash_time: &mut Option<Instant>,
) {
    let area = frame.area();
    frame.buffer_mut().set_style(area, Style::default().bg(view.theme.bg));
    match view.screen {
        Screen::Login => draw_login(frame, view, area),
        Screen::Menu => draw_menu(frame, view, area),
        Screen::Leaderboard => draw_leaderboard(frame, view, area),
        Screen::Playing | Screen::GameOver => {
            let tray = draw_game(frame, view, area);
            if let Some(effect) = match_flash {
                let delta = match_flash_time
                    .map(|t| view.now.saturating_duration_since(t))
                    .unwrap_or_default();
                let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
                *match_flash_time = Some(view.now);
                frame.render_effect(effect, tray, TfxDuration::from_millis(delta_ms));
            }
            if view.screen == Screen::GameOver {
                draw_game_over(frame, view, area);
            }
        }
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn popup(frame: &mut Frame, theme: &Theme, rect: Rect, title: &str, lines: Vec<Line<'static>>) {
    Clear.render(rect, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(theme.bg))
        .block(board_block(format!(" {} ", title), theme))
        .render(rect, frame.buffer_mut());
}

fn draw_login(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Who is playing? ",
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" > {}_ ", view.name_input),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " ENTER confirm   ESC quit ",
            Style::default().fg(theme.div_line),
        )),
    ];
    popup(frame, theme, centered(area, 40, 9), "Tiletrio", lines);
}

fn draw_menu(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " T I L E T R I O ",
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    if let Some(name) = view.player {
        lines.push(Line::from(Span::styled(
            format!(" Welcome back, {}! ", name),
            Style::default().fg(theme.main_fg),
        )));
        lines.push(Line::from(""));
    }
    for item in MenuItem::ALL {
        let style = if item == view.menu_selected {
            Style::default()
                .fg(Color::Black)
                .bg(theme.title)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.main_fg)
        };
        lines.push(Line::from(Span::styled(format!("  {:^20}  ", item.label()), style)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " ↕ choose   ENTER select ",
        Style::default().fg(theme.div_line),
    )));
    let height = lines.len() as u16 + 2;
    popup(frame, theme, centered(area, 40, height), "Menu", lines);
}

fn draw_leaderboard(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let mut lines = vec![Line::from("")];
    for (rank, entry) in view.leaderboard.iter().enumerate() {
        let rank_style = if rank < 3 {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.main_fg)
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" #{:<3}", rank + 1), rank_style),
            Span::styled(format!("{:<20}", entry.name), Style::default().fg(theme.main_fg)),
            Span::styled(format!("{:>8} ", entry.score), Style::default().fg(theme.title)),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " ESC close ",
        Style::default().fg(theme.div_line),
    )));
    let height = lines.len() as u16 + 2;
    popup(frame, theme, centered(area, 40, height), "Leaderboard", lines);
}

/// Board + sidebar. Returns the tray rect (target of the match flash).
fn draw_game(frame: &mut Frame, view: &View, area: Rect) -> Rect {
    let (board_area, sidebar_area) = game_areas(area);
    let state = view.state;
    let theme = view.theme;

    let block = board_block(format!(" Tiletrio  {} ", state.mode.label()), theme);
    let inner = block.inner(board_area);
    block.render(board_area, frame.buffer_mut());

    let geometry = BoardGeometry::new(inner, state.rules().layout.tile_size);
    for tile in draw_order(state) {
        draw_tile(frame, theme, geometry.tile_rect(tile), tile, view.cursor == Some(tile.id));
    }
    draw_sidebar(frame, view, sidebar_area)
}

fn draw_tile(frame: &mut Frame, theme: &Theme, rect: Rect, tile: &Tile, under_cursor: bool) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    let (face, fg) = if tile.hidden {
        (theme.covered, theme.bg)
    } else {
        (theme.tile_color(tile.kind.0), Color::Black)
    };
    let border = if under_cursor {
        Style::default().fg(Color::White).bg(face).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.bg).bg(face)
    };
    let pad = rect.height.saturating_sub(3) / 2;
    let mut lines: Vec<Line> = (0..pad).map(|_| Line::from("")).collect();
    lines.push(Line::from(Span::styled(
        tile.kind.glyph().to_string(),
        Style::default().fg(fg).add_modifier(Modifier::BOLD),
    )));
    Clear.render(rect, frame.buffer_mut());
    let borders = if rect.height >= 3 { Borders::ALL } else { Borders::LEFT | Borders::RIGHT };
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(face))
        .block(Block::default().borders(borders).border_style(border))
        .render(rect, frame.buffer_mut());
}

/// Sidebar sections; returns the tray rect.
fn draw_sidebar(frame: &mut Frame, view: &View, area: Rect) -> Rect {
    let state = view.state;
    let theme = view.theme;
    let fg = Style::default().fg(theme.main_fg);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Stats
            Constraint::Length(4), // Tray
            Constraint::Min(0),    // Help
        ])
        .split(area);

    let combo_live = state
        .last_match()
        .is_some_and(|t| view.now.saturating_duration_since(t) < state.rules().combo_window);
    let combo_line = if state.combo() > 1 && combo_live {
        Line::from(Span::styled(
            format!(" COMBO x{}! ", state.combo()),
            Style::default().fg(Color::Rgb(255, 107, 107)).add_modifier(Modifier::BOLD),
        ))
    } else {
        Line::from(Span::styled(format!(" Combo: x{} ", state.combo()), fg))
    };
    let mut stats = vec![
        Line::from(Span::styled(
            format!(" Score: {} ", state.score()),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        combo_line,
        Line::from(Span::styled(format!(" Tiles: {} ", state.board().len()), fg)),
        Line::from(Span::styled(
            format!(" Player: {} ", view.player.unwrap_or("guest")),
            fg,
        )),
    ];
    if state.mode == GameMode::Endless {
        stats.push(Line::from(Span::styled(format!(" Layer: {} ", state.top_layer()), fg)));
    }
    Paragraph::new(stats)
        .block(board_block(" Stats ".to_string(), theme))
        .render(chunks[0], frame.buffer_mut());

    let tray = state.tray();
    let mut slots = vec![Span::from(" ")];
    for i in 0..tray.capacity() {
        match tray.tiles().get(i) {
            Some(t) => slots.push(Span::styled(
                format!("{}", t.kind.glyph()),
                Style::default()
                    .fg(Color::Black)
                    .bg(theme.tile_color(t.kind.0))
                    .add_modifier(Modifier::BOLD),
            )),
            None => slots.push(Span::styled("·", Style::default().fg(theme.div_line))),
        }
        slots.push(Span::from(" "));
    }
    let tray_title = format!(" Tray {}/{} ", tray.len(), tray.capacity());
    let hint = if tray.is_empty() {
        Line::from(Span::styled(" three alike clear ", Style::default().fg(theme.div_line)))
    } else {
        Line::from("")
    };
    Paragraph::new(vec![hint, Line::from(slots)])
        .block(board_block(tray_title, theme))
        .render(chunks[1], frame.buffer_mut());

    let help = vec![
        Line::from(Span::styled(" click / ENTER  pick ", fg)),
        Line::from(Span::styled(" ←/→  move cursor ", fg)),
        Line::from(Span::styled(" ESC  menu   Q  quit ", fg)),
    ];
    Paragraph::new(help)
        .block(board_block(" Keys ".to_string(), theme))
        .render(chunks[2], frame.buffer_mut());
    chunks[1]
}

fn draw_game_over(frame: &mut Frame, view: &View, area: Rect) {
    let state = view.state;
    let theme = view.theme;
    let (title, banner) = match state.phase {
        Phase::Won => ("Cleared!", Style::default().fg(Color::Black).bg(Color::Green)),
        _ => ("Tray full!", Style::default().fg(Color::White).bg(Color::Red)),
    };
    let fg = Style::default().fg(theme.main_fg);
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!(" {} ", title), banner)),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", state.score()), fg)),
        Line::from(Span::styled(format!(" Mode: {} ", state.mode.label()), fg)),
    ];
    if state.mode == GameMode::Endless {
        let note = match (view.submitted, view.player) {
            (true, Some(name)) => format!(" Submitted as {} ", name),
            _ => " Not submitted ".to_string(),
        };
        lines.push(Line::from(Span::styled(note, fg)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " R restart   M menu   Q quit ",
        Style::default().fg(theme.main_fg),
    )));
    let height = lines.len() as u16 + 2;
    popup(frame, theme, centered(area, 34, height), "Game over", lines);
}
