//! App: terminal init, main loop, gravity timer and key handling.

use crate::GameConfig;
use crate::figure::PieceKind;
use crate::game::{GameSession, SessionConfig, SessionState};
use crate::highscores;
use crate::input::{Action, key_to_action};
use crate::theme::{ColorTable, Theme};
use crate::ui::{self, ViewState};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

pub struct App {
    config: GameConfig,
    theme: Theme,
    session: GameSession,
    view: ViewState,
    last_tick: Instant,
    /// Record already written to disk; avoids rewriting the file every frame.
    saved_top: u32,
    quit: bool,
}

impl App {
    pub fn new(config: GameConfig, session: SessionConfig, theme: Theme) -> Self {
        let saved_top = session.top_points;
        let mut session = GameSession::new(session);
        if config.no_menu {
            session.play_game();
        }
        Self {
            view: ViewState::new(config.show_panel),
            config,
            theme,
            session,
            last_tick: Instant::now(),
            saved_top,
            quit: false,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        // Not every terminal supports this; press/repeat filtering still works without it.
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );

        let mut terminal = ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.config.frame_rate.max(1.0));
        while !self.quit {
            let now = Instant::now();
            terminal.draw(|f| ui::draw(f, &self.session, &self.theme, &mut self.view, now))?;

            if self.view.label_effect.as_ref().is_some_and(|e| e.done()) {
                self.view.reset_label();
            }

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        let action = key_to_action(key);
                        // Held keys repeat movement; everything else fires once per press.
                        let accept = match key.kind {
                            KeyEventKind::Press => true,
                            KeyEventKind::Repeat => matches!(
                                action,
                                Action::MoveLeft | Action::MoveRight | Action::SoftDrop
                            ),
                            KeyEventKind::Release => false,
                        };
                        if accept {
                            self.handle_action(action);
                        }
                    }
                }
            }

            self.tick();
            self.persist_record();
        }
        Ok(())
    }

    /// Gravity: one step down per tick interval while running.
    fn tick(&mut self) {
        if self.session.state() != SessionState::Running {
            self.last_tick = Instant::now();
            return;
        }
        if self.last_tick.elapsed() >= self.session.tick_interval() {
            self.session.move_down();
            self.last_tick = Instant::now();
        }
    }

    /// New record worth writing: at game over, or when quitting mid-game.
    fn unsaved_record(&self) -> Option<u32> {
        let top = self.session.top_points();
        let settled = self.quit || self.session.state() == SessionState::GameOver;
        (settled && top > self.saved_top).then_some(top)
    }

    fn persist_record(&mut self) {
        let Some(top) = self.unsaved_record() else {
            return;
        };
        self.saved_top = top;
        if let Err(e) = highscores::save_top_points(top) {
            self.view.status = Some(format!("record not saved: {e}"));
        }
    }

    fn handle_action(&mut self, action: Action) {
        let state = self.session.state();
        match action {
            Action::Quit => self.quit = true,
            Action::TogglePanel => self.view.show_panel = !self.view.show_panel,
            Action::NewGame => self.start(),
            Action::HardDrop if matches!(state, SessionState::NotStarted | SessionState::GameOver) => {
                self.start();
            }
            Action::Pause => match state {
                SessionState::Running => self.session.stop_game(),
                SessionState::Paused => {
                    self.session.resume_game();
                    self.last_tick = Instant::now();
                }
                _ => {}
            },
            Action::SpeedUp => self.session.set_speed(self.session.speed_setting() + 1),
            Action::SpeedDown => self
                .session
                .set_speed(self.session.speed_setting().saturating_sub(1)),
            Action::CycleColor => self.cycle_color(),
            Action::CycleType => {
                let next = match self.session.forced_type() {
                    None => Some(PieceKind::O),
                    Some(kind) => kind.next(),
                };
                self.session.set_type(next);
            }
            Action::MoveLeft => {
                self.session.move_left();
            }
            Action::MoveRight => {
                self.session.move_right();
            }
            Action::Rotate => {
                self.session.rotate();
            }
            Action::SoftDrop => {
                self.session.move_down();
                self.last_tick = Instant::now();
            }
            Action::HardDrop => {
                self.session.hard_drop();
                self.last_tick = Instant::now();
            }
            Action::None => {}
        }
    }

    fn start(&mut self) {
        self.session.play_game();
        self.view.status = None;
        self.view.reset_label();
        self.last_tick = Instant::now();
    }

    /// Move the falling figure's colour slot to the next preset.
    fn cycle_color(&mut self) {
        let Some(kind) = self.session.figure_type() else {
            return;
        };
        let index = kind.color_index();
        let current = self.session.colors().color(index);
        let presets: Vec<_> = ColorTable::presets().collect();
        let next = presets
            .iter()
            .position(|&(c, _)| c == current)
            .map_or(0, |i| (i + 1) % presets.len());
        if let Some(&(color, name)) = presets.get(next) {
            self.session.set_color(color, index, name);
        }
    }
}
