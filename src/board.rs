//! Logic board: fixed 31x19 grid of locked cells, row completion and compaction.

use crate::figure::PieceKind;
use std::collections::VecDeque;
use thiserror::Error;

/// Board height in cells.
pub const ROWS: usize = 31;
/// Board width in cells.
pub const COLUMNS: usize = 19;
/// Packed value reported for an empty cell.
pub const EMPTY_CODE: u16 = 999;

/// Single cell: either empty or part of a locked piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Locked { kind: PieceKind, color: u8 },
}

impl Cell {
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Packed `(type, colour)` value: `type * 10 + colour`, or [`EMPTY_CODE`].
    pub fn code(&self) -> u16 {
        match *self {
            Self::Empty => EMPTY_CODE,
            Self::Locked { kind, color } => u16::from(kind.code()) * 10 + u16::from(color % 10),
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        if code == EMPTY_CODE {
            return Some(Self::Empty);
        }
        let kind = PieceKind::from_code(u8::try_from(code / 10).ok()?)?;
        Some(Self::Locked {
            kind,
            color: (code % 10) as u8,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("cell ({row}, {column}) is outside the {ROWS}x{COLUMNS} board")]
    OutOfBounds { row: usize, column: usize },
}

type Row = [Cell; COLUMNS];

/// Grid of locked cells. `rows[0]` is the top row.
#[derive(Debug, Clone)]
pub struct Board {
    rows: VecDeque<Row>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            rows: (0..ROWS).map(|_| [Cell::Empty; COLUMNS]).collect(),
        }
    }

    /// Set every cell to empty.
    pub fn reset(&mut self) {
        for row in &mut self.rows {
            row.fill(Cell::Empty);
        }
    }

    fn check(row: usize, column: usize) -> Result<(), BoardError> {
        if row >= ROWS || column >= COLUMNS {
            return Err(BoardError::OutOfBounds { row, column });
        }
        Ok(())
    }

    pub fn get(&self, row: usize, column: usize) -> Result<Cell, BoardError> {
        Self::check(row, column)?;
        Ok(self.rows[row][column])
    }

    /// Write a locked cell.
    pub fn set(
        &mut self,
        row: usize,
        column: usize,
        kind: PieceKind,
        color: u8,
    ) -> Result<(), BoardError> {
        Self::check(row, column)?;
        self.rows[row][column] = Cell::Locked { kind, color };
        Ok(())
    }

    pub fn clear_cell(&mut self, row: usize, column: usize) -> Result<(), BoardError> {
        Self::check(row, column)?;
        self.rows[row][column] = Cell::Empty;
        Ok(())
    }

    /// True if `(row, column)` lies on the board and holds no locked cell.
    #[inline]
    pub fn is_free(&self, row: i32, column: i32) -> bool {
        if row < 0 || column < 0 {
            return false;
        }
        let (row, column) = (row as usize, column as usize);
        row < ROWS && column < COLUMNS && self.rows[row][column].is_empty()
    }

    pub fn is_row_complete(&self, row: usize) -> bool {
        self.rows
            .get(row)
            .is_some_and(|cells| cells.iter().all(|c| !c.is_empty()))
    }

    /// Remove `row`; rows above drop by one and a fresh empty row appears on top.
    pub fn clear_row(&mut self, row: usize) {
        if row >= ROWS {
            return;
        }
        self.rows.remove(row);
        self.rows.push_front([Cell::Empty; COLUMNS]);
    }

    /// Clear every complete row in one compaction pass.
    /// Returns the indices of the cleared rows as they were before compaction.
    pub fn clear_complete_rows(&mut self) -> Vec<usize> {
        let complete: Vec<usize> = (0..ROWS).filter(|&r| self.is_row_complete(r)).collect();
        if complete.is_empty() {
            return complete;
        }
        let mut index = 0;
        self.rows.retain(|_| {
            let keep = !complete.contains(&index);
            index += 1;
            keep
        });
        for _ in 0..complete.len() {
            self.rows.push_front([Cell::Empty; COLUMNS]);
        }
        complete
    }

    /// Number of non-empty cells.
    pub fn filled_cells(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|row| row.iter())
            .filter(|c| !c.is_empty())
            .count()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell; COLUMNS]> {
        self.rows.iter()
    }
}
