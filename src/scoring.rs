//! Points per action and the fall-speed curve.

use std::time::Duration;

/// Highest speed a player can pick.
pub const MAX_SPEED_SETTING: u32 = 10;
/// Highest speed reachable through score progression.
pub const MAX_SPEED: u32 = 15;
/// Points needed for each automatic speed step.
pub const SPEED_STEP_POINTS: u32 = 1_000;

const BASE_TICK_MS: u64 = 700;
const TICK_STEP_MS: u64 = 45;
const MIN_TICK_MS: u64 = 60;

/// Award per successful downward step, per cleared row and per locked figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointTable {
    pub per_move: u32,
    pub per_line: u32,
    pub per_block: u32,
}

impl Default for PointTable {
    fn default() -> Self {
        Self {
            per_move: 1,
            per_line: 100,
            per_block: 10,
        }
    }
}

/// Action counters for the running game plus the session record.
#[derive(Debug, Clone, Default)]
pub struct Score {
    pub table: PointTable,
    pub moves: u32,
    pub lines: u32,
    pub blocks: u32,
    current: u32,
    top: u32,
}

impl Score {
    pub fn new(table: PointTable, top: u32) -> Self {
        Self {
            table,
            top,
            ..Self::default()
        }
    }

    /// Zero the counters for a new game. The record survives.
    pub fn reset(&mut self) {
        self.moves = 0;
        self.lines = 0;
        self.blocks = 0;
        self.current = 0;
    }

    /// Recompute current points from the counters and raise the record if beaten.
    pub fn give_points(&mut self) {
        let t = self.table;
        self.current = self
            .moves
            .saturating_mul(t.per_move)
            .saturating_add(self.lines.saturating_mul(t.per_line))
            .saturating_add(self.blocks.saturating_mul(t.per_block));
        if self.current > self.top {
            self.top = self.current;
        }
    }

    #[inline]
    pub fn current(&self) -> u32 {
        self.current
    }

    #[inline]
    pub fn top(&self) -> u32 {
        self.top
    }
}

/// Fall speed: the player's setting, raised one step every [`SPEED_STEP_POINTS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Speed {
    initial: u32,
    level: u32,
}

impl Default for Speed {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Speed {
    pub fn new(initial: u32) -> Self {
        let initial = initial.clamp(1, MAX_SPEED_SETTING);
        Self {
            initial,
            level: initial,
        }
    }

    pub fn set_initial(&mut self, s: u32) {
        *self = Self::new(s);
    }

    pub fn reset(&mut self) {
        self.level = self.initial;
    }

    /// Recompute the level for `points`.
    pub fn update(&mut self, points: u32) {
        self.level = (self.initial + points / SPEED_STEP_POINTS).min(MAX_SPEED);
    }

    #[inline]
    pub fn initial(&self) -> u32 {
        self.initial
    }

    #[inline]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Gravity interval the front-end timer should use.
    pub fn tick_interval(&self) -> Duration {
        let steps = u64::from(self.level.saturating_sub(1));
        let ms = BASE_TICK_MS
            .saturating_sub(steps * TICK_STEP_MS)
            .max(MIN_TICK_MS);
        Duration::from_millis(ms)
    }
}
