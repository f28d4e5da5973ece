//! Game session: active figure, gravity, locking, line clears, scoring and
//! the Running/Paused/GameOver state machine.

use crate::board::{Board, BoardError, Cell};
use crate::figure::{Figure, FigureGenerator, FigureLog, PieceKind};
use crate::scoring::{PointTable, Score, Speed};
use crate::theme::ColorTable;
use ratatui::style::Color;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Running,
    Paused,
    GameOver,
}

/// What a downward step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Figure dropped one row.
    Moved,
    /// Figure could not drop and was locked into the board.
    Locked { rows_cleared: usize },
    /// Session not running; nothing changed.
    Ignored,
}

/// Everything a session needs at construction.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub points: PointTable,
    pub speed: u32,
    pub top_points: u32,
    pub seed: Option<u64>,
    pub forced_kind: Option<PieceKind>,
    pub colors: ColorTable,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            points: PointTable::default(),
            speed: 1,
            top_points: 0,
            seed: None,
            forced_kind: None,
            colors: ColorTable::default(),
        }
    }
}

/// One board, one generator, at most one falling figure.
#[derive(Debug)]
pub struct GameSession {
    board: Board,
    generator: FigureGenerator,
    figure: Option<Figure>,
    colors: ColorTable,
    score: Score,
    speed: Speed,
    state: SessionState,
}

impl GameSession {
    pub fn new(config: SessionConfig) -> Self {
        let mut generator = FigureGenerator::new(config.seed);
        generator.set_forced(config.forced_kind);
        Self {
            board: Board::new(),
            generator,
            figure: None,
            colors: config.colors,
            score: Score::new(config.points, config.top_points),
            speed: Speed::new(config.speed),
            state: SessionState::NotStarted,
        }
    }

    /// Start a fresh game from any state. The record score is kept.
    pub fn play_game(&mut self) {
        self.board.reset();
        self.score.reset();
        self.speed.reset();
        self.generator.log_mut().clear();
        self.figure = None;
        self.state = SessionState::Running;
        self.spawn_figure();
    }

    /// Freeze the game; board and score are kept for [`Self::resume_game`].
    pub fn stop_game(&mut self) {
        if self.state == SessionState::Running {
            self.state = SessionState::Paused;
        }
    }

    pub fn resume_game(&mut self) {
        if self.state == SessionState::Paused {
            self.state = SessionState::Running;
        }
    }

    /// Replace the falling figure with a fresh one at the top of the board.
    /// Only acts while running. A spawn that overlaps locked cells ends the game
    /// and is not kept in the generated-figures log.
    pub fn spawn_figure(&mut self) {
        if self.state != SessionState::Running {
            return;
        }
        let figure = self.generator.random_figure(&self.colors);
        if self.fits(&figure.cells()) {
            self.figure = Some(figure);
        } else {
            self.generator.log_mut().pop_last();
            self.figure = None;
            self.state = SessionState::GameOver;
            self.give_points();
        }
    }

    #[inline]
    pub fn create_new_figure(&mut self) {
        self.spawn_figure();
    }

    fn fits(&self, cells: &[(i32, i32); 4]) -> bool {
        cells.iter().all(|&(r, c)| self.board.is_free(r, c))
    }

    fn running_figure(&self) -> Option<&Figure> {
        if self.state != SessionState::Running {
            return None;
        }
        self.figure.as_ref()
    }

    /// Gravity step. Called by the timer and by soft drop alike, so every
    /// successful step earns the same move points.
    pub fn move_down(&mut self) -> MoveOutcome {
        let Some(figure) = self.running_figure() else {
            return MoveOutcome::Ignored;
        };
        let below = figure.cells_at(1, 0, figure.rotation);
        if self.fits(&below) {
            if let Some(figure) = self.figure.as_mut() {
                figure.row += 1;
            }
            self.score.moves += 1;
            self.give_points();
            MoveOutcome::Moved
        } else {
            let rows_cleared = self.lock_figure();
            MoveOutcome::Locked { rows_cleared }
        }
    }

    /// Drop until the figure locks.
    pub fn hard_drop(&mut self) -> MoveOutcome {
        loop {
            match self.move_down() {
                MoveOutcome::Moved => {}
                outcome => return outcome,
            }
        }
    }

    pub fn move_left(&mut self) -> bool {
        self.shift(-1)
    }

    pub fn move_right(&mut self) -> bool {
        self.shift(1)
    }

    fn shift(&mut self, d_column: i32) -> bool {
        let Some(figure) = self.running_figure() else {
            return false;
        };
        if !self.fits(&figure.cells_at(0, d_column, figure.rotation)) {
            return false;
        }
        if let Some(figure) = self.figure.as_mut() {
            figure.column += d_column;
        }
        true
    }

    /// True if the next rotation fits at the current anchor.
    pub fn can_rotate(&self) -> bool {
        self.running_figure()
            .is_some_and(|f| self.fits(&f.cells_at(0, 0, f.next_rotation())))
    }

    /// Rotate clockwise in place. No wall kicks: a blocked rotation is dropped.
    pub fn rotate(&mut self) -> bool {
        if !self.can_rotate() {
            return false;
        }
        if let Some(figure) = self.figure.as_mut() {
            figure.rotation = figure.next_rotation();
        }
        true
    }

    /// Write the figure into the board, score it, clear rows, spawn the next one.
    fn lock_figure(&mut self) -> usize {
        let Some(figure) = self.figure.take() else {
            return 0;
        };
        for (row, column) in figure.cells() {
            // Every committed position passed `fits`, so each cell is on the board.
            let placed = usize::try_from(row)
                .ok()
                .zip(usize::try_from(column).ok())
                .is_some_and(|(row, column)| self.board.set(row, column, figure.kind, figure.color_index).is_ok());
            debug_assert!(placed, "locked cell ({row}, {column}) outside the board");
        }
        let color_name = self.colors.name(figure.color_index).to_string();
        self.generator.log_mut().update_last(&figure, &color_name);
        self.score.blocks += 1;
        let rows = self.check_row_completion();
        self.give_points();
        self.spawn_figure();
        rows
    }

    /// Clear every complete row in one pass; flat line award per row.
    pub fn check_row_completion(&mut self) -> usize {
        let cleared = self.board.clear_complete_rows().len();
        self.score.lines += cleared as u32;
        cleared
    }

    pub fn check_game_over(&self) -> bool {
        self.state == SessionState::GameOver
    }

    /// Refresh current points, the record and the speed level.
    pub fn give_points(&mut self) {
        self.score.give_points();
        self.speed.update(self.score.current());
    }

    pub fn set_speed(&mut self, s: u32) {
        self.speed.set_initial(s);
        self.speed.update(self.score.current());
    }

    /// Remap colour slot `index`.
    pub fn set_color(&mut self, color: Color, index: u8, name: impl Into<String>) {
        self.colors.set(index, color, name);
    }

    /// Force the kind of every following figure; `None` goes back to random.
    pub fn set_type(&mut self, kind: Option<PieceKind>) {
        self.generator.set_forced(kind);
    }

    // --- queries ---

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn cell(&self, row: usize, column: usize) -> Result<Cell, BoardError> {
        self.board.get(row, column)
    }

    /// Packed cell value (`type * 10 + colour`, 999 when empty).
    pub fn cell_value(&self, row: usize, column: usize) -> Result<u16, BoardError> {
        self.board.get(row, column).map(|c| c.code())
    }

    pub fn figure(&self) -> Option<&Figure> {
        self.figure.as_ref()
    }

    pub fn figure_type(&self) -> Option<PieceKind> {
        self.figure.as_ref().map(|f| f.kind)
    }

    pub fn figure_row(&self) -> Option<i32> {
        self.figure.as_ref().map(|f| f.row)
    }

    pub fn figure_column(&self) -> Option<i32> {
        self.figure.as_ref().map(|f| f.column)
    }

    pub fn figure_rotation(&self) -> Option<u8> {
        self.figure.as_ref().map(|f| f.rotation)
    }

    pub fn color_index(&self) -> Option<u8> {
        self.figure.as_ref().map(|f| f.color_index)
    }

    pub fn figure_color(&self) -> Option<Color> {
        self.color_index().map(|i| self.colors.color(i))
    }

    pub fn colors(&self) -> &ColorTable {
        &self.colors
    }

    pub fn forced_type(&self) -> Option<PieceKind> {
        self.generator.forced()
    }

    pub fn generated_figures(&self) -> &FigureLog {
        self.generator.log()
    }

    pub fn current_points(&self) -> u32 {
        self.score.current()
    }

    pub fn top_points(&self) -> u32 {
        self.score.top()
    }

    pub fn lines_cleared(&self) -> u32 {
        self.score.lines
    }

    pub fn speed_setting(&self) -> u32 {
        self.speed.initial()
    }

    pub fn speed_level(&self) -> u32 {
        self.speed.level()
    }

    pub fn tick_interval(&self) -> Duration {
        self.speed.tick_interval()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{COLUMNS, EMPTY_CODE, ROWS};

    fn session_with(kind: PieceKind) -> GameSession {
        let mut session = GameSession::new(SessionConfig {
            seed: Some(9),
            forced_kind: Some(kind),
            ..SessionConfig::default()
        });
        session.play_game();
        session
    }

    fn fill_row(session: &mut GameSession, row: usize, except: &[usize]) {
        for c in (0..COLUMNS).filter(|c| !except.contains(c)) {
            session.board.set(row, c, PieceKind::I, 1).unwrap();
        }
    }

    fn sorted_cells(session: &GameSession) -> Vec<(i32, i32)> {
        let mut cells = session.figure().unwrap().cells().to_vec();
        cells.sort_unstable();
        cells
    }

    #[test]
    fn test_new_game_is_empty() {
        let session = session_with(PieceKind::T);
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.current_points(), 0);
        for r in 0..ROWS {
            for c in 0..COLUMNS {
                assert_eq!(session.cell_value(r, c).unwrap(), EMPTY_CODE);
            }
        }
        assert_eq!(session.generated_figures().len(), 1);
        assert!(session.cell_value(ROWS, 0).is_err());
    }

    #[test]
    fn test_not_started_ignores_input() {
        let mut session = GameSession::new(SessionConfig::default());
        assert_eq!(session.state(), SessionState::NotStarted);
        assert_eq!(session.move_down(), MoveOutcome::Ignored);
        assert!(!session.move_left());
        assert!(!session.rotate());
        assert!(session.figure().is_none());
    }

    #[test]
    fn test_o_piece_drops_to_floor_and_locks() {
        let mut session = session_with(PieceKind::O);
        assert_eq!(sorted_cells(&session), vec![(0, 8), (0, 9), (1, 8), (1, 9)]);

        let mut steps = 0;
        let outcome = loop {
            match session.move_down() {
                MoveOutcome::Moved => steps += 1,
                other => break other,
            }
        };

        assert_eq!(outcome, MoveOutcome::Locked { rows_cleared: 0 });
        assert_eq!(steps, ROWS - 2);
        assert_eq!(session.board().filled_cells(), 4);
        for (r, c) in [(29, 8), (29, 9), (30, 8), (30, 9)] {
            assert_eq!(session.cell_value(r, c).unwrap(), 0);
        }
        let points = PointTable::default();
        assert_eq!(
            session.current_points(),
            steps as u32 * points.per_move + points.per_block
        );
        // A fresh figure is already falling from the top.
        assert_eq!(session.figure_row(), Some(0));
        assert_eq!(session.generated_figures().len(), 2);
    }

    #[test]
    fn test_lock_updates_last_log_entry() {
        let mut session = session_with(PieceKind::I);
        session.hard_drop();
        let first = session.generated_figures().iter().next().unwrap();
        assert_eq!(first.name(), "I");
        assert_eq!(first.row, ROWS as i32 - 1);
        assert_eq!(first.color_name, "Cyan");
    }

    #[test]
    fn test_move_left_stops_at_wall() {
        let mut session = session_with(PieceKind::O);
        while session.move_left() {}
        assert_eq!(session.figure_column(), Some(0));
        let before = session.figure().cloned();
        assert!(!session.move_left());
        assert_eq!(session.figure().cloned(), before);
    }

    #[test]
    fn test_move_right_stops_at_wall() {
        let mut session = session_with(PieceKind::I);
        while session.move_right() {}
        let max_col = session.figure().unwrap().cells().iter().map(|c| c.1).max();
        assert_eq!(max_col, Some(COLUMNS as i32 - 1));
    }

    #[test]
    fn test_horizontal_move_blocked_by_locked_cell() {
        let mut session = session_with(PieceKind::O);
        session.board.set(0, 10, PieceKind::Z, 4).unwrap();
        assert!(!session.move_right());
        assert_eq!(session.figure_column(), Some(8));
        assert!(session.move_left());
    }

    #[test]
    fn test_four_rotations_return_to_start() {
        for kind in PieceKind::ALL {
            let mut session = session_with(kind);
            for _ in 0..10 {
                session.move_down();
            }
            let start = sorted_cells(&session);
            for _ in 0..4 {
                assert!(session.rotate(), "{kind:?}");
            }
            assert_eq!(sorted_cells(&session), start, "{kind:?}");
        }
    }

    #[test]
    fn test_rotation_blocked_without_wall_kick() {
        let mut session = session_with(PieceKind::I);
        // Vertical I reaches one row above the anchor, which is off the board at spawn.
        assert!(!session.can_rotate());
        assert!(!session.rotate());
        assert_eq!(session.figure_rotation(), Some(0));

        session.move_down();
        session.move_down();
        session.board.set(3, 9, PieceKind::O, 0).unwrap();
        assert!(!session.can_rotate());
        session.board.clear_cell(3, 9).unwrap();
        assert!(session.rotate());
        assert_eq!(session.figure_rotation(), Some(1));
    }

    #[test]
    fn test_lock_completes_row_five() {
        let mut session = session_with(PieceKind::O);
        // Support under the O at row 6 and row 5 full except the O's columns.
        session.board.set(6, 8, PieceKind::J, 3).unwrap();
        session.board.set(6, 9, PieceKind::J, 3).unwrap();
        fill_row(&mut session, 5, &[8, 9]);

        let outcome = session.hard_drop();

        assert_eq!(outcome, MoveOutcome::Locked { rows_cleared: 1 });
        assert!(!session.board().is_row_complete(5));
        // The O's upper half dropped into row 5.
        assert_eq!(session.cell_value(5, 8).unwrap(), 0);
        assert_eq!(session.cell_value(5, 0).unwrap(), EMPTY_CODE);
        assert_eq!(session.lines_cleared(), 1);
        assert!(session.current_points() >= PointTable::default().per_line);
    }

    #[test]
    fn test_multi_row_clear_in_one_lock() {
        let mut session = session_with(PieceKind::O);
        fill_row(&mut session, 29, &[8, 9]);
        fill_row(&mut session, 30, &[8, 9]);
        session.board.set(28, 0, PieceKind::T, 6).unwrap();

        let outcome = session.hard_drop();

        assert_eq!(outcome, MoveOutcome::Locked { rows_cleared: 2 });
        assert_eq!(session.board().filled_cells(), 1);
        assert_eq!(session.cell_value(30, 0).unwrap(), 66);
        assert_eq!(session.lines_cleared(), 2);
        let points = PointTable::default();
        assert_eq!(
            session.current_points(),
            29 * points.per_move + points.per_block + 2 * points.per_line
        );
    }

    #[test]
    fn test_spawn_collision_is_game_over() {
        let mut session = session_with(PieceKind::T);
        session.figure = None;
        for c in 0..COLUMNS {
            session.board.set(0, c, PieceKind::L, 2).unwrap();
        }
        session.spawn_figure();
        assert!(session.check_game_over());
        assert!(session.figure().is_none());

        let filled = session.board().filled_cells();
        let points = session.current_points();
        assert_eq!(session.move_down(), MoveOutcome::Ignored);
        assert!(!session.move_left());
        assert!(!session.rotate());
        session.spawn_figure();
        assert_eq!(session.board().filled_cells(), filled);
        assert_eq!(session.current_points(), points);
        assert!(session.check_game_over());
    }

    #[test]
    fn test_stack_reaching_top_ends_game() {
        let mut session = session_with(PieceKind::O);
        let mut locks = 0;
        while !session.check_game_over() {
            if let MoveOutcome::Locked { .. } = session.hard_drop() {
                locks += 1;
            }
            assert!(locks < ROWS, "game never ended");
        }
        // 2-high O pieces stacked in the same columns: 15 fit, the 16th spawn overlaps.
        assert_eq!(locks, 15);
        assert!(session.top_points() >= session.current_points());
        // The spawn that did not fit is not logged.
        assert_eq!(session.generated_figures().len(), 15);
        assert!(session.generated_figures().iter().all(|g| g.row > 0));
    }

    #[test]
    fn test_play_game_resets_board_and_keeps_record() {
        let mut session = session_with(PieceKind::O);
        session.hard_drop();
        let record = session.top_points();
        assert!(record > 0);

        session.play_game();

        assert_eq!(session.board().filled_cells(), 0);
        assert_eq!(session.current_points(), 0);
        assert_eq!(session.top_points(), record);
        assert_eq!(session.generated_figures().len(), 1);
        assert_eq!(session.state(), SessionState::Running);
    }

    #[test]
    fn test_stop_and_resume() {
        let mut session = session_with(PieceKind::S);
        session.stop_game();
        assert_eq!(session.state(), SessionState::Paused);
        assert_eq!(session.move_down(), MoveOutcome::Ignored);
        assert!(!session.move_right());
        assert_eq!(session.figure_row(), Some(0));

        session.resume_game();
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.move_down(), MoveOutcome::Moved);
        assert_eq!(session.figure_row(), Some(1));
    }

    #[test]
    fn test_paused_session_keeps_its_figure() {
        let mut session = session_with(PieceKind::O);
        session.move_down();
        session.stop_game();
        let before = session.figure().cloned();
        let logged = session.generated_figures().len();

        session.create_new_figure();

        assert_eq!(session.figure().cloned(), before);
        assert_eq!(session.generated_figures().len(), logged);
        assert_eq!(session.state(), SessionState::Paused);
    }

    #[test]
    fn test_spawn_before_play_does_nothing() {
        let mut session = GameSession::new(SessionConfig {
            seed: Some(9),
            ..SessionConfig::default()
        });
        session.spawn_figure();
        assert_eq!(session.state(), SessionState::NotStarted);
        assert!(session.figure().is_none());
        assert!(session.generated_figures().is_empty());
    }

    #[test]
    fn test_speed_follows_score() {
        let mut session = GameSession::new(SessionConfig {
            points: PointTable {
                per_move: 0,
                per_line: 0,
                per_block: 600,
            },
            speed: 2,
            forced_kind: Some(PieceKind::O),
            ..SessionConfig::default()
        });
        session.play_game();
        let slow = session.tick_interval();
        session.hard_drop();
        session.hard_drop();
        assert_eq!(session.current_points(), 1_200);
        assert_eq!(session.speed_level(), 3);
        assert!(session.tick_interval() < slow);

        session.set_speed(7);
        assert_eq!(session.speed_setting(), 7);
        assert_eq!(session.speed_level(), 8);
    }

    #[test]
    fn test_set_color_repaints_kind() {
        let mut session = session_with(PieceKind::Z);
        session.set_color(Color::Rgb(9, 9, 9), PieceKind::Z.color_index(), "Soot");
        assert_eq!(session.figure_color(), Some(Color::Rgb(9, 9, 9)));
        session.hard_drop();
        let entry = session.generated_figures().iter().next().unwrap();
        assert_eq!(entry.color_name, "Soot");
    }

    #[test]
    fn test_set_type_controls_next_spawn() {
        let mut session = session_with(PieceKind::O);
        session.set_type(Some(PieceKind::T));
        session.create_new_figure();
        assert_eq!(session.figure_type(), Some(PieceKind::T));
        assert_eq!(session.forced_type(), Some(PieceKind::T));
        session.set_type(None);
        assert_eq!(session.forced_type(), None);
    }

    #[test]
    fn test_falling_figure_is_not_on_board() {
        let mut session = session_with(PieceKind::L);
        session.move_down();
        session.rotate();
        session.move_left();
        assert_eq!(session.board().filled_cells(), 0);
    }
}
