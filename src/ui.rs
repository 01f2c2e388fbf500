//! Layout and drawing: board, sidebar, game-over overlay, spawn fade.

use crate::theme::Theme;
use mergetui::game::{Game, Status};
use mergetui::grid::SIZE;
use mergetui::rng::RandomSource;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Tile size in terminal cells; the value sits on the middle row.
const TILE_WIDTH: u16 = 7;
const TILE_HEIGHT: u16 = 3;
/// Empty cells between tiles and around the edge of the board.
const GAP: u16 = 1;

const SIDEBAR_WIDTH: u16 = 22;

/// Fade-in of a freshly spawned tile.
const SPAWN_FADE_MS: u32 = 180;

/// Board size in terminal cells, border included.
fn board_outer_size() -> (u16, u16) {
    let n = SIZE as u16;
    let w = n * TILE_WIDTH + (n + 1) * GAP;
    let h = n * TILE_HEIGHT + (n + 1) * GAP;
    (w + 2, h + 2)
}

/// Board (outer) and sidebar areas, centred in `area`.
fn split_areas(area: Rect) -> (Rect, Rect) {
    let (bw, bh) = board_outer_size();
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(bw + SIDEBAR_WIDTH),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(bh),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(bw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    (inner[0], inner[1])
}

/// Screen rect of the tile at (row, col), clipped to the board interior.
fn tile_rect(board_inner: Rect, row: usize, col: usize) -> Rect {
    Rect {
        x: board_inner.x + GAP + col as u16 * (TILE_WIDTH + GAP),
        y: board_inner.y + GAP + row as u16 * (TILE_HEIGHT + GAP),
        width: TILE_WIDTH,
        height: TILE_HEIGHT,
    }
    .intersection(board_inner)
}

/// Draw the whole screen. When `animate` is set and a tile was just spawned, fades it in
/// and keeps `spawn_effect` / `spawn_process_time` up to date.
pub fn draw<R: RandomSource>(
    frame: &mut Frame,
    game: &Game<R>,
    theme: &Theme,
    area: Rect,
    spawn_effect: &mut Option<Effect>,
    spawn_process_time: &mut Option<Instant>,
    now: Instant,
    animate: bool,
) {
    frame.buffer_mut().set_style(area, Style::default().bg(theme.bg));
    let (board_area, sidebar_area) = split_areas(area);
    let board_inner = draw_board(frame, game, theme, board_area);
    draw_sidebar(frame, game, theme, sidebar_area);

    if animate {
        if let Some((row, col)) = game.last_spawn() {
            apply_spawn_effect(
                frame,
                theme,
                tile_rect(board_inner, row, col),
                spawn_effect,
                spawn_process_time,
                now,
            );
        }
    }

    if game.status().is_terminal() {
        draw_game_over(frame, game, theme, board_area);
    }
}

/// Border plus 4×4 tiles. Returns the board interior.
fn draw_board<R: RandomSource>(frame: &mut Frame, game: &Game<R>, theme: &Theme, area: Rect) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" 2048 ", Style::default().fg(theme.title)));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    for (row, values) in game.grid().rows().iter().enumerate() {
        for (col, &value) in values.iter().enumerate() {
            draw_tile(frame, theme, tile_rect(inner, row, col), value);
        }
    }
    inner
}

fn draw_tile(frame: &mut Frame, theme: &Theme, rect: Rect, value: u32) {
    if rect.is_empty() {
        return;
    }
    let bg = theme.tile_color(value);
    frame.buffer_mut().set_style(rect, Style::default().bg(bg));
    if value == 0 {
        return;
    }
    let label_row = Rect {
        y: rect.y + rect.height / 2,
        height: 1,
        ..rect
    };
    Paragraph::new(value.to_string())
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(theme.tile_fg(value))
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        )
        .render(label_row, frame.buffer_mut());
}

/// Create the spawn fade on first sight of a new spawn and advance it.
fn apply_spawn_effect(
    frame: &mut Frame,
    theme: &Theme,
    rect: Rect,
    spawn_effect: &mut Option<Effect>,
    spawn_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let delta = spawn_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    *spawn_process_time = Some(now);

    let effect = spawn_effect.get_or_insert_with(|| {
        fx::fade_from(theme.bg, theme.bg, (SPAWN_FADE_MS, Interpolation::Linear)).with_area(rect)
    });
    if !effect.done() {
        frame.render_effect(effect, rect, TfxDuration::from_millis(delta_ms));
    }
}

fn draw_sidebar<R: RandomSource>(frame: &mut Frame, game: &Game<R>, theme: &Theme, area: Rect) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let hint_style = Style::default().fg(theme.inactive_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Stats (border + score, moves, best)
            Constraint::Length(1), // gap
            Constraint::Length(8), // Keys
        ])
        .split(area);

    let stats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let stats_inner = stats_block.inner(chunks[0]);
    stats_block.render(chunks[0], frame.buffer_mut());
    let stats_lines = vec![
        Line::from(vec![
            Span::styled("Score: ", title_style),
            Span::styled(game.score().to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Moves: ", title_style),
            Span::styled(game.moves().to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Best tile: ", title_style),
            Span::styled(game.grid().max_tile().to_string(), fg_style),
        ]),
    ];
    Paragraph::new(stats_lines).render(stats_inner, frame.buffer_mut());

    let keys_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled("Keys", title_style));
    let keys_inner = keys_block.inner(chunks[2]);
    keys_block.render(chunks[2], frame.buffer_mut());
    let keys_lines = vec![
        Line::from(Span::styled("↑ w k 8   Up", hint_style)),
        Line::from(Span::styled("← a h 4   Left", hint_style)),
        Line::from(Span::styled("↓ s j 5   Down", hint_style)),
        Line::from(Span::styled("→ d l 6   Right", hint_style)),
        Line::from(Span::styled("r         New game", hint_style)),
        Line::from(Span::styled("q Esc     Quit", hint_style)),
    ];
    Paragraph::new(keys_lines).render(keys_inner, frame.buffer_mut());
}

fn draw_game_over<R: RandomSource>(frame: &mut Frame, game: &Game<R>, theme: &Theme, area: Rect) {
    let popup_w = 28u16;
    let popup_h = 7u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let (banner, banner_bg) = match game.status() {
        Status::Won => (" You win! ", Color::Green),
        _ => (" No moves left ", Color::Red),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            banner,
            Style::default()
                .fg(Color::Black)
                .bg(banner_bg)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("Final score: {}", game.score()),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            " R — New game    Q — Quit ",
            Style::default().fg(theme.inactive_fg),
        )),
    ];
    Clear.render(popup, frame.buffer_mut());
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .style(Style::default().bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}
