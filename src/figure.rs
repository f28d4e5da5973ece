//! Piece catalog: the seven tetrominoes, their rotation tables, the active
//! figure and the random generator that keeps a log of what it produced.

use crate::board::COLUMNS;
use crate::theme::ColorTable;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Most recent generated figures kept in the log.
pub const HISTORY_LIMIT: usize = 512;

/// Row every figure spawns at.
pub const SPAWN_ROW: i32 = 0;

/// Tetromino kinds, numbered by their wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    O = 0,
    I = 1,
    L = 2,
    J = 3,
    Z = 4,
    S = 5,
    T = 6,
}

type Offsets = [(i8, i8); 4];

// (row, column) offsets from the anchor, one entry per rotation, clockwise.
const O_ROT: [Offsets; 4] = [[(0, 0), (0, 1), (1, 0), (1, 1)]; 4];
const I_ROT: [Offsets; 4] = [
    [(0, -1), (0, 0), (0, 1), (0, 2)],
    [(-1, 0), (0, 0), (1, 0), (2, 0)],
    [(0, -1), (0, 0), (0, 1), (0, 2)],
    [(-1, 0), (0, 0), (1, 0), (2, 0)],
];
const L_ROT: [Offsets; 4] = [
    [(0, -1), (0, 0), (0, 1), (1, -1)],
    [(-1, 0), (0, 0), (1, 0), (-1, -1)],
    [(0, 1), (0, 0), (0, -1), (-1, 1)],
    [(1, 0), (0, 0), (-1, 0), (1, 1)],
];
const J_ROT: [Offsets; 4] = [
    [(0, -1), (0, 0), (0, 1), (1, 1)],
    [(-1, 0), (0, 0), (1, 0), (1, -1)],
    [(0, 1), (0, 0), (0, -1), (-1, -1)],
    [(1, 0), (0, 0), (-1, 0), (-1, 1)],
];
const Z_ROT: [Offsets; 4] = [
    [(0, -1), (0, 0), (1, 0), (1, 1)],
    [(-1, 1), (0, 1), (0, 0), (1, 0)],
    [(0, -1), (0, 0), (1, 0), (1, 1)],
    [(-1, 1), (0, 1), (0, 0), (1, 0)],
];
const S_ROT: [Offsets; 4] = [
    [(0, 0), (0, 1), (1, -1), (1, 0)],
    [(-1, 0), (0, 0), (0, 1), (1, 1)],
    [(0, 0), (0, 1), (1, -1), (1, 0)],
    [(-1, 0), (0, 0), (0, 1), (1, 1)],
];
const T_ROT: [Offsets; 4] = [
    [(0, -1), (0, 0), (0, 1), (1, 0)],
    [(-1, 0), (0, 0), (1, 0), (0, -1)],
    [(0, 1), (0, 0), (0, -1), (-1, 0)],
    [(1, 0), (0, 0), (-1, 0), (0, 1)],
];

impl PieceKind {
    pub const ALL: [Self; 7] = [
        Self::O,
        Self::I,
        Self::L,
        Self::J,
        Self::Z,
        Self::S,
        Self::T,
    ];

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::O => "O",
            Self::I => "I",
            Self::L => "L",
            Self::J => "J",
            Self::Z => "Z",
            Self::S => "S",
            Self::T => "T",
        }
    }

    /// Anchor column at spawn. Keeps every rotation-0 cell on the board.
    pub fn spawn_column(self) -> i32 {
        match self {
            Self::O => COLUMNS as i32 / 2 - 1,
            _ => COLUMNS as i32 / 2,
        }
    }

    /// Colour slot a figure of this kind is painted with.
    #[inline]
    pub fn color_index(self) -> u8 {
        self.code()
    }

    /// Next kind in catalog order, `None` after the last one.
    pub fn next(self) -> Option<Self> {
        Self::from_code(self.code() + 1)
    }

    fn table(self) -> &'static [Offsets; 4] {
        match self {
            Self::O => &O_ROT,
            Self::I => &I_ROT,
            Self::L => &L_ROT,
            Self::J => &J_ROT,
            Self::Z => &Z_ROT,
            Self::S => &S_ROT,
            Self::T => &T_ROT,
        }
    }
}

/// Offsets of the four cells for `kind` in `rotation` (taken mod 4).
#[inline]
pub fn rotation_offsets(kind: PieceKind, rotation: u8) -> &'static Offsets {
    &kind.table()[usize::from(rotation % 4)]
}

/// The falling figure: kind, anchor and rotation (0..4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Figure {
    pub kind: PieceKind,
    pub row: i32,
    pub column: i32,
    pub rotation: u8,
    pub color_index: u8,
}

impl Figure {
    pub fn spawn(kind: PieceKind) -> Self {
        Self {
            kind,
            row: SPAWN_ROW,
            column: kind.spawn_column(),
            rotation: 0,
            color_index: kind.color_index(),
        }
    }

    /// Absolute (row, column) of each cell.
    pub fn cells(&self) -> [(i32, i32); 4] {
        self.cells_at(0, 0, self.rotation)
    }

    /// Cells the figure would cover after shifting by (`d_row`, `d_column`) in `rotation`.
    pub fn cells_at(&self, d_row: i32, d_column: i32, rotation: u8) -> [(i32, i32); 4] {
        let offsets = rotation_offsets(self.kind, rotation);
        let mut out = [(0i32, 0i32); 4];
        for (i, (dr, dc)) in offsets.iter().enumerate() {
            out[i] = (
                self.row + d_row + i32::from(*dr),
                self.column + d_column + i32::from(*dc),
            );
        }
        out
    }

    #[inline]
    pub fn next_rotation(&self) -> u8 {
        (self.rotation + 1) % 4
    }
}

/// One line of the generated-figures log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFigure {
    pub kind: PieceKind,
    pub row: i32,
    pub column: i32,
    pub rotation: u8,
    pub color_name: String,
}

impl GeneratedFigure {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// Bounded, ordered log of generated figures. Oldest entries drop first.
#[derive(Debug, Clone, Default)]
pub struct FigureLog {
    entries: VecDeque<GeneratedFigure>,
}

impl FigureLog {
    pub fn push(&mut self, entry: GeneratedFigure) {
        if self.entries.len() == HISTORY_LIMIT {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Record where the latest figure ended up.
    pub fn update_last(&mut self, figure: &Figure, color_name: &str) {
        if let Some(last) = self.entries.back_mut() {
            last.row = figure.row;
            last.column = figure.column;
            last.rotation = figure.rotation;
            color_name.clone_into(&mut last.color_name);
        }
    }

    /// Drop the newest entry, e.g. a figure that never got on the board.
    pub fn pop_last(&mut self) -> Option<GeneratedFigure> {
        self.entries.pop_back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&GeneratedFigure> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &GeneratedFigure> + ExactSizeIterator {
        self.entries.iter()
    }
}

/// Picks the next figure uniformly at random, unless a kind is forced.
#[derive(Debug, Clone)]
pub struct FigureGenerator {
    rng: StdRng,
    forced: Option<PieceKind>,
    log: FigureLog,
}

impl FigureGenerator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            forced: None,
            log: FigureLog::default(),
        }
    }

    pub fn random_figure(&mut self, colors: &ColorTable) -> Figure {
        let kind = match self.forced {
            Some(kind) => kind,
            None => PieceKind::ALL[self.rng.gen_range(0..PieceKind::ALL.len())],
        };
        let figure = Figure::spawn(kind);
        self.log.push(GeneratedFigure {
            kind,
            row: figure.row,
            column: figure.column,
            rotation: figure.rotation,
            color_name: colors.name(figure.color_index).to_string(),
        });
        figure
    }

    /// Force every following figure to `kind`; `None` restores random picks.
    pub fn set_forced(&mut self, kind: Option<PieceKind>) {
        self.forced = kind;
    }

    pub fn forced(&self) -> Option<PieceKind> {
        self.forced
    }

    pub fn log(&self) -> &FigureLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut FigureLog {
        &mut self.log
    }
}
