//! Layout and drawing: board, sidebar, preferences panel and state labels.

use crate::board::{COLUMNS, Cell, ROWS};
use crate::figure::PieceKind;
use crate::game::{GameSession, SessionState};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Row, Table, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Each board cell is two terminal columns wide so blocks look square.
const CELL_WIDTH: u16 = 2;
const BOARD_WIDTH: u16 = COLUMNS as u16 * CELL_WIDTH + 2;
const BOARD_HEIGHT: u16 = ROWS as u16 + 2;
const SIDEBAR_WIDTH: u16 = 26;
const PANEL_WIDTH: u16 = 44;

/// One fade of the blinking state label, in ms.
const LABEL_FADE_MS: u32 = 900;

/// Front-end state that only matters for drawing.
#[derive(Default)]
pub struct ViewState {
    pub show_panel: bool,
    /// Last non-fatal problem (e.g. record could not be saved).
    pub status: Option<String>,
    /// Fade on the state label; dropped by the app once done so it restarts.
    pub label_effect: Option<Effect>,
    label_process_time: Option<Instant>,
}

impl ViewState {
    pub fn new(show_panel: bool) -> Self {
        Self {
            show_panel,
            ..Self::default()
        }
    }

    pub fn reset_label(&mut self) {
        self.label_effect = None;
        self.label_process_time = None;
    }
}

pub fn draw(frame: &mut Frame, session: &GameSession, theme: &Theme, view: &mut ViewState, now: Instant) {
    let area = frame.area();
    if area.width < BOARD_WIDTH + SIDEBAR_WIDTH || area.height < BOARD_HEIGHT {
        draw_too_small(frame, theme, area);
        return;
    }

    let panel_side_by_side = view.show_panel && area.width >= BOARD_WIDTH + SIDEBAR_WIDTH + PANEL_WIDTH;
    let total_w = BOARD_WIDTH + SIDEBAR_WIDTH + if panel_side_by_side { PANEL_WIDTH } else { 0 };

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(BOARD_HEIGHT),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(BOARD_WIDTH),
            Constraint::Length(SIDEBAR_WIDTH),
            Constraint::Fill(1),
        ])
        .split(vert[1]);
    let (board_area, sidebar_area) = (columns[0], columns[1]);

    draw_board(frame, session, theme, board_area);
    draw_sidebar(frame, session, theme, view, sidebar_area);

    if view.show_panel {
        let panel_area = if panel_side_by_side {
            columns[2]
        } else {
            centered(area, PANEL_WIDTH, BOARD_HEIGHT)
        };
        frame.render_widget(Clear, panel_area);
        draw_preferences(frame, session, theme, panel_area);
    }

    let label = match session.state() {
        SessionState::NotStarted => Some(vec![
            Line::from(Span::styled(" BLOCKFALL ", Style::default().fg(theme.title).bold())),
            Line::from(""),
            Line::from(Span::styled(" Press SPACE to play ", Style::default().fg(theme.main_fg))),
        ]),
        SessionState::Paused => Some(vec![
            Line::from(Span::styled(" Paused ", Style::default().fg(Color::Black).bg(theme.title))),
            Line::from(""),
            Line::from(Span::styled(" P: resume    Q: quit ", Style::default().fg(theme.main_fg))),
        ]),
        SessionState::GameOver => Some(vec![
            Line::from(Span::styled(" Game Over ", Style::default().fg(Color::White).bg(Color::Red))),
            Line::from(""),
            Line::from(Span::styled(
                format!(" Score: {} ", session.current_points()),
                Style::default().fg(theme.main_fg),
            )),
            Line::from(Span::styled(
                format!(" Record: {} ", session.top_points()),
                Style::default().fg(theme.main_fg),
            )),
            Line::from(""),
            Line::from(Span::styled(" N: new game    Q: quit ", Style::default().fg(theme.main_fg))),
        ]),
        SessionState::Running => None,
    };
    match label {
        Some(lines) => {
            let label_area = draw_label(frame, theme, board_area, lines);
            apply_label_effect(frame, theme, view, label_area, now);
        }
        None => view.reset_label(),
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

fn draw_too_small(frame: &mut Frame, theme: &Theme, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(" Terminal too small ", Style::default().fg(theme.title).bold())),
        Line::from(Span::styled(
            format!(
                " need {}x{}, have {}x{} ",
                BOARD_WIDTH + SIDEBAR_WIDTH,
                BOARD_HEIGHT,
                area.width,
                area.height
            ),
            Style::default().fg(theme.main_fg),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(centered(area, area.width, 2), frame.buffer_mut());
}

fn draw_board(frame: &mut Frame, session: &GameSession, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" Blockfall ", theme.title));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let falling = session.figure().map(|f| f.cells());
    let falling_color = session.figure_color();
    let colors = session.colors();
    let buf = frame.buffer_mut();

    for (r, row) in session.board().rows().enumerate() {
        let y = inner.y + r as u16;
        if y >= inner.bottom() {
            break;
        }
        for (c, cell) in row.iter().enumerate() {
            let x = inner.x + c as u16 * CELL_WIDTH;
            if x + CELL_WIDTH > inner.right() {
                break;
            }
            let in_figure = falling.is_some_and(|cells| cells.contains(&(r as i32, c as i32)));
            let (symbol, style) = match (in_figure, cell) {
                (true, _) => (
                    "██",
                    Style::default().fg(falling_color.unwrap_or(theme.main_fg)).bg(theme.bg),
                ),
                (false, Cell::Locked { color, .. }) => {
                    ("██", Style::default().fg(colors.color(*color)).bg(theme.bg))
                }
                (false, Cell::Empty) => (" ·", Style::default().fg(theme.div_line).bg(theme.bg)),
            };
            buf.set_string(x, y, symbol, style);
        }
    }
}

fn draw_sidebar(frame: &mut Frame, session: &GameSession, theme: &Theme, view: &ViewState, area: Rect) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let dim_style = Style::default().fg(theme.inactive_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // score
            Constraint::Length(7), // figure
            Constraint::Fill(1),   // keys
        ])
        .split(area);

    let stat = |label: &'static str, value: String| {
        Line::from(vec![Span::styled(label, title_style), Span::styled(value, fg_style)])
    };

    let score_lines = vec![
        stat("Score:  ", session.current_points().to_string()),
        stat("Record: ", session.top_points().to_string()),
        stat("Lines:  ", session.lines_cleared().to_string()),
        stat(
            "Speed:  ",
            format!("{} ({} ms)", session.speed_level(), session.tick_interval().as_millis()),
        ),
    ];
    let score_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(" Score ", title_style));
    Paragraph::new(score_lines)
        .block(score_block)
        .render(chunks[0], frame.buffer_mut());

    let figure_lines = match session.figure() {
        Some(f) => vec![
            Line::from(vec![
                Span::styled("Type:   ", title_style),
                Span::styled(f.kind.name(), Style::default().fg(session.colors().color(f.color_index)).bold()),
            ]),
            stat("Pos:    ", format!("row {}, col {}", f.row, f.column)),
            stat("Turn:   ", format!("{} / 4", f.rotation)),
            stat("Colour: ", session.colors().name(f.color_index).to_string()),
        ],
        None => vec![Line::from(Span::styled("no piece", dim_style))],
    };
    let figure_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(" Piece ", title_style));
    Paragraph::new(figure_lines)
        .block(figure_block)
        .render(chunks[1], frame.buffer_mut());

    let key = |k: &'static str, what: &'static str| {
        Line::from(vec![Span::styled(k, title_style), Span::styled(what, dim_style)])
    };
    let mut key_lines = vec![
        key(" ← →   ", "move"),
        key(" ↑     ", "rotate"),
        key(" ↓     ", "soft drop"),
        key(" SPACE ", "hard drop"),
        key(" P     ", "pause"),
        key(" N     ", "new game"),
        key(" + -   ", "speed"),
        key(" C  T  ", "colour / type"),
        key(" TAB   ", "preferences"),
        key(" Q     ", "quit"),
    ];
    if let Some(status) = &view.status {
        key_lines.push(Line::from(""));
        key_lines.push(Line::from(Span::styled(status.clone(), Style::default().fg(Color::Red))));
    }
    let keys_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(" Keys ", title_style));
    Paragraph::new(key_lines)
        .block(keys_block)
        .render(chunks[2], frame.buffer_mut());
}

/// Speed, forced type, colour table and the generated-figures log.
fn draw_preferences(frame: &mut Frame, session: &GameSession, theme: &Theme, area: Rect) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let dim_style = Style::default().fg(theme.inactive_fg);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" Preferences ", title_style));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(PieceKind::ALL.len() as u16 + 1),
            Constraint::Fill(1),
        ])
        .split(inner);

    let forced = session.forced_type().map_or("random", PieceKind::name);
    let settings = vec![
        Line::from(vec![
            Span::styled("Speed      ", title_style),
            Span::styled(format!("{} / 10", session.speed_setting()), fg_style),
            Span::styled("   [+/-]", dim_style),
        ]),
        Line::from(vec![
            Span::styled("Next type  ", title_style),
            Span::styled(forced, fg_style),
            Span::styled("   [T]", dim_style),
        ]),
    ];
    Paragraph::new(settings).render(chunks[0], frame.buffer_mut());

    let current = session.figure_type();
    let mut colour_lines = vec![Line::from(vec![
        Span::styled("Colours", title_style),
        Span::styled("   [C] recolours current type", dim_style),
    ])];
    for (kind, slot) in PieceKind::ALL.into_iter().zip(session.colors().iter()) {
        let marker = if current == Some(kind) { "▸ " } else { "  " };
        colour_lines.push(Line::from(vec![
            Span::styled(marker, title_style),
            Span::styled(format!("{}  ", kind.name()), fg_style),
            Span::styled("██ ", Style::default().fg(slot.color)),
            Span::styled(slot.name.clone(), fg_style),
        ]));
    }
    Paragraph::new(colour_lines).render(chunks[1], frame.buffer_mut());

    let log = session.generated_figures();
    let visible = chunks[2].height.saturating_sub(1) as usize;
    let rows: Vec<Row> = log
        .iter()
        .enumerate()
        .rev()
        .take(visible)
        .map(|(i, g)| {
            Row::new(vec![
                (i + 1).to_string(),
                g.name().to_string(),
                g.row.to_string(),
                g.column.to_string(),
                g.rotation.to_string(),
                g.color_name.clone(),
            ])
            .style(fg_style)
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Fill(1),
        ],
    )
    .header(Row::new(vec!["#", "Type", "Row", "Col", "Rot", "Colour"]).style(title_style));
    table.render(chunks[2], frame.buffer_mut());
}

/// Bordered label centred on the board; returns where it was drawn.
fn draw_label(frame: &mut Frame, theme: &Theme, board_area: Rect, lines: Vec<Line>) -> Rect {
    let width = 30u16;
    let height = lines.len() as u16 + 4;
    let popup = centered(board_area, width, height);
    frame.render_widget(Clear, popup);
    let p = Paragraph::new([vec![Line::from("")], lines].concat())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        );
    p.render(popup, frame.buffer_mut());
    popup
}

/// Fade the label towards the background; the app restarts the fade once done, which reads as a blink.
fn apply_label_effect(frame: &mut Frame, theme: &Theme, view: &mut ViewState, area: Rect, now: Instant) {
    let delta = view
        .label_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    view.label_process_time = Some(now);

    let effect = view.label_effect.get_or_insert_with(|| {
        fx::fade_to(theme.inactive_fg, theme.bg, (LABEL_FADE_MS, Interpolation::Linear)).with_area(area)
    });
    frame.render_effect(effect, area, TfxDuration::from_millis(delta_ms));
}
